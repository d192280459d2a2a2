use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum BuildConfigError {
    #[error("Failed to read build config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse build config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A single flavor-specific build value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl BuildConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BuildConfigValue::Text(value) => Some(value),
            _ => None,
        }
    }

}

fn default_debug() -> bool {
    cfg!(debug_assertions)
}

/// Build-time values for the running flavor, grouped by component package.
///
/// The file is `configs/build.<flavor>.json`:
///
/// ```json
/// { "flavor": "wordpress", "debug": true,
///   "packages": { "org.example.blog": { "DEBUG_AUTOFILL_USERNAME": "demo" } } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub flavor: String,
    #[serde(default = "default_debug")]
    pub debug: bool,
    #[serde(default)]
    pub packages: HashMap<String, HashMap<String, BuildConfigValue>>,
}

impl BuildConfig {
    pub fn empty(flavor: &str) -> Self {
        Self {
            flavor: flavor.to_string(),
            debug: default_debug(),
            packages: HashMap::new(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BuildConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|source| BuildConfigError::Io {
            path: display.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| BuildConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Best effort: a missing or broken file yields an empty configuration.
    pub fn load_or_empty<P: AsRef<Path>>(path: P, flavor: &str) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No build config at {}, using empty values", path.display());
            return Self::empty(flavor);
        }

        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("⚠️  Ignoring build config: {}", e);
                Self::empty(flavor)
            }
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_value(mut self, package: &str, field: &str, value: BuildConfigValue) -> Self {
        self.packages
            .entry(package.to_string())
            .or_default()
            .insert(field.to_string(), value);
        self
    }

    pub fn read_value(&self, package: &str, field: &str) -> Option<&BuildConfigValue> {
        let value = self
            .packages
            .get(package)
            .and_then(|fields| fields.get(field));

        if value.is_none() {
            debug!(
                "Build config field {} not found for {} ({})",
                field, package, self.flavor
            );
        }

        value
    }

    /// String lookup that only answers in debug builds.
    pub fn read_string(&self, package: &str, field: &str) -> String {
        if !self.debug {
            return String::new();
        }

        match self.read_value(package, field).and_then(BuildConfigValue::as_str) {
            Some(value) if !value.is_empty() => {
                debug!("Auto-filled from build config: {}", field);
                value.to_string()
            }
            _ => String::new(),
        }
    }
}
