use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{Locale, LocaleError, LocaleRegistry};

/// Contents of one `<locale>.json` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Messages {
    pub messages: HashMap<String, String>,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub locale: String,
    pub version: String,
    pub last_updated: String,
    pub translators: Option<Vec<String>>,
}

impl Messages {
    pub fn get(&self, key: &str) -> Option<&String> {
        self.messages.get(key)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get_with_fallback(&self, key: &str, fallback_messages: &[&Messages]) -> Option<String> {
        std::iter::once(self)
            .chain(fallback_messages.iter().copied())
            .find_map(|messages| messages.get(key))
            .cloned()
    }
}

/// Reads locale files from a directory and keeps them cached.
#[derive(Debug)]
pub struct MessageLoader {
    base_path: PathBuf,
    cache: RwLock<HashMap<Locale, Messages>>,
    registry: LocaleRegistry,
}

impl MessageLoader {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            cache: RwLock::new(HashMap::new()),
            registry: LocaleRegistry::new(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn registry(&self) -> &LocaleRegistry {
        &self.registry
    }

    pub async fn load_locale(&self, locale: &Locale) -> Result<Messages, LocaleError> {
        if let Some(messages) = self.cache.read().await.get(locale) {
            return Ok(messages.clone());
        }

        let messages = self.load_from_file(locale).await?;
        debug!("Loaded {} messages for locale {}", messages.len(), locale);

        self.cache
            .write()
            .await
            .insert(locale.clone(), messages.clone());

        Ok(messages)
    }

    async fn load_from_file(&self, locale: &Locale) -> Result<Messages, LocaleError> {
        let file_path = self.base_path.join(format!("{}.json", locale.code()));

        let content = tokio::fs::read_to_string(&file_path).await.map_err(|e| {
            LocaleError::FileError(format!("Failed to read locale file {:?}: {}", file_path, e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            LocaleError::FileError(format!("Failed to parse locale file {:?}: {}", file_path, e))
        })
    }

    /// Loads every supported locale into the cache. Missing files are
    /// logged and skipped; returns how many locales are cached.
    pub async fn preload_all(&self) -> usize {
        let mut loaded = 0;
        for locale in self.registry.get_supported_locales() {
            match self.load_locale(locale).await {
                Ok(_) => loaded += 1,
                Err(e) => warn!("Failed to preload locale {}: {}", locale, e),
            }
        }
        loaded
    }

    /// Next load of every locale goes back to disk.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    /// Drops one cached locale and reads it again.
    pub async fn reload_locale(&self, locale: &Locale) -> Result<Messages, LocaleError> {
        self.cache.write().await.remove(locale);
        self.load_locale(locale).await
    }

    /// Locales with a file in the base directory.
    pub async fn get_available_locales(&self) -> Result<Vec<Locale>, LocaleError> {
        let mut available = Vec::new();
        if !self.base_path.exists() {
            return Ok(available);
        }

        let mut entries = tokio::fs::read_dir(&self.base_path).await.map_err(|e| {
            LocaleError::FileError(format!("Failed to read locale directory: {}", e))
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            LocaleError::FileError(format!("Failed to read directory entry: {}", e))
        })? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(locale) = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| Locale::parse(stem).ok())
                {
                    available.push(locale);
                }
            }
        }

        Ok(available)
    }
}

// Replaces `{name}` placeholders
pub(crate) fn interpolate_message(template: &str, params: &HashMap<String, String>) -> String {
    params.iter().fold(template.to_string(), |result, (key, value)| {
        result.replace(&format!("{{{}}}", key), value)
    })
}
