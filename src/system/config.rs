use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub rest_base_url: String,
    pub max_in_flight_requests: usize,
    pub request_timeout_secs: u64,
    /// Overrides the platform-derived default user agent.
    pub default_user_agent: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rest_base_url: "https://public-api.wordpress.com/".to_string(),
            max_in_flight_requests: 4,
            request_timeout_secs: 30,
            default_user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub cache_capacity: usize,
    pub max_image_bytes: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 64,
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    pub directory: String,
    /// Device language preference, e.g. `vi-VN` or `vi-VN,en;q=0.8`.
    pub preferred: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            directory: "locales".to_string(),
            preferred: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub flavor: String,
    /// Defaults to `configs/build.<flavor>.json`.
    pub config_path: Option<String>,
    /// Forces the debug flag regardless of the build file and compile profile.
    pub debug: Option<bool>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            flavor: "wordpress".to_string(),
            config_path: None,
            debug: None,
        }
    }
}

impl BuildSettings {
    pub fn resolved_config_path(&self) -> String {
        self.config_path
            .clone()
            .unwrap_or_else(|| format!("configs/build.{}.json", self.flavor))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: String,
    pub version_name: String,
    pub log: LogConfig,
    pub network: NetworkConfig,
    pub images: ImageConfig,
    pub locale: LocaleConfig,
    pub build: BuildSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            version_name: env!("CARGO_PKG_VERSION").to_string(),
            log: LogConfig::default(),
            network: NetworkConfig::default(),
            images: ImageConfig::default(),
            locale: LocaleConfig::default(),
            build: BuildSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        // Load environment files in order of priority
        let env_files = vec![
            "configs/.env.default".to_string(),
            format!("configs/.env.{}", environment),
            "configs/.env.local".to_string(),
        ];

        for env_file in env_files {
            if Path::new(&env_file).exists() {
                load_env_file(&env_file)?;
            }
        }

        let mut config = Self::load_from_dir("configs", &environment)?;
        config.load_from_env();

        Ok(config)
    }

    /// Reads `config.<environment>.json`, then `config.default.json`, from `dir`.
    /// Falls back to built-in defaults when neither exists.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P, environment: &str) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let candidates = [
            dir.join(format!("config.{}.json", environment)),
            dir.join("config.default.json"),
        ];

        for path in candidates.iter() {
            if path.exists() {
                let display = path.display().to_string();
                let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: display.clone(),
                    source,
                })?;
                let mut config: AppConfig = serde_json::from_str(&content)
                    .map_err(|source| ConfigError::Parse {
                        path: display,
                        source,
                    })?;

                // Environment always reflects the requested one, even from the default file
                config.environment = environment.to_string();
                return Ok(config);
            }
        }

        Ok(AppConfig {
            environment: environment.to_string(),
            ..AppConfig::default()
        })
    }

    fn load_from_env(&mut self) {
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.log.level = level;
        }

        if let Ok(url) = env::var("REST_BASE_URL") {
            self.network.rest_base_url = url;
        }
        if let Ok(max) = env::var("MAX_IN_FLIGHT_REQUESTS") {
            if let Ok(max) = max.parse::<usize>() {
                self.network.max_in_flight_requests = max;
            }
        }
        if let Ok(timeout) = env::var("REQUEST_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.network.request_timeout_secs = timeout;
            }
        }

        if let Ok(capacity) = env::var("IMAGE_CACHE_CAPACITY") {
            if let Ok(capacity) = capacity.parse::<usize>() {
                self.images.cache_capacity = capacity;
            }
        }

        if let Ok(locale) = env::var("APP_LOCALE") {
            self.locale.preferred = locale;
        }
        if let Ok(dir) = env::var("LOCALE_DIR") {
            self.locale.directory = dir;
        }

        if let Ok(flavor) = env::var("BUILD_FLAVOR") {
            self.build.flavor = flavor;
        }
        if let Ok(debug) = env::var("BUILD_DEBUG") {
            if let Ok(debug) = debug.parse::<bool>() {
                self.build.debug = Some(debug);
            }
        }
    }
}

fn load_env_file(path: &str) -> Result<(), ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim();

            // Remove quotes if present
            let value = if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                &value[1..value.len() - 1]
            } else {
                value
            };

            // Runs during single-threaded startup, before any worker is spawned
            unsafe {
                env::set_var(key, value);
            }
        }
    }

    Ok(())
}
