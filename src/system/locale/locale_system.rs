use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Supported locales - can be extended
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    En,    // English (default)
    Vi,    // Vietnamese
    Ja,    // Japanese
    Ko,    // Korean
    Zh,    // Chinese
}

impl Locale {
    /// Accepts language codes with an optional region (`en`, `en-US`, `pt_BR`)
    /// and English names.
    pub fn parse(locale_str: &str) -> Result<Self, LocaleError> {
        let language = super::extractor::language_code(locale_str);

        match language.as_str() {
            "en" | "english" => Ok(Locale::En),
            "vi" | "vietnamese" => Ok(Locale::Vi),
            "ja" | "japanese" => Ok(Locale::Ja),
            "ko" | "korean" => Ok(Locale::Ko),
            "zh" | "chinese" => Ok(Locale::Zh),
            _ => Err(LocaleError::UnsupportedLocale(locale_str.to_string())),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Vi => "vi",
            Locale::Ja => "ja",
            Locale::Ko => "ko",
            Locale::Zh => "zh",
        }
    }

    pub fn is_rtl(&self) -> bool {
        // Add RTL locales if needed in future
        false
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LocaleError {
    #[error("Unsupported locale: {0}")]
    UnsupportedLocale(String),
    #[error("Locale extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("Locale file error: {0}")]
    FileError(String),
}

#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    supported_locales: Vec<Locale>,
    default_locale: Locale,
    fallback_chain: HashMap<Locale, Vec<Locale>>,
}

impl LocaleRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            supported_locales: vec![
                Locale::En,
                Locale::Vi,
                // Add more as needed
            ],
            default_locale: Locale::En,
            fallback_chain: HashMap::new(),
        };

        registry.setup_fallback_chains();
        registry
    }

    fn setup_fallback_chains(&mut self) {
        // Every non-base locale falls back to English
        for locale in [Locale::Vi, Locale::Ja, Locale::Ko, Locale::Zh] {
            self.fallback_chain.insert(locale, vec![Locale::En]);
        }
    }

    pub fn is_supported(&self, locale: &Locale) -> bool {
        self.supported_locales.contains(locale)
    }

    pub fn get_supported_locales(&self) -> &[Locale] {
        &self.supported_locales
    }

    pub fn get_default_locale(&self) -> &Locale {
        &self.default_locale
    }

    pub fn get_fallback_chain(&self, locale: &Locale) -> Vec<Locale> {
        if locale == &self.default_locale {
            return Vec::new();
        }

        self.fallback_chain
            .get(locale)
            .cloned()
            .unwrap_or_else(|| vec![self.default_locale.clone()])
    }

    /// Unsupported locales resolve to the default.
    pub fn resolve_locale(&self, requested: &Locale) -> Locale {
        if self.is_supported(requested) {
            requested.clone()
        } else {
            self.default_locale.clone()
        }
    }

    pub fn add_locale(&mut self, locale: Locale, fallback_chain: Option<Vec<Locale>>) {
        if !self.supported_locales.contains(&locale) {
            self.supported_locales.push(locale.clone());
        }

        if let Some(chain) = fallback_chain {
            self.fallback_chain.insert(locale, chain);
        }
    }
}

impl Default for LocaleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parsing() {
        assert_eq!(Locale::parse("en").unwrap(), Locale::En);
        assert_eq!(Locale::parse("vi").unwrap(), Locale::Vi);
        assert_eq!(Locale::parse("EN").unwrap(), Locale::En);
        assert_eq!(Locale::parse("en-US").unwrap(), Locale::En);
        assert_eq!(Locale::parse("zh_CN").unwrap(), Locale::Zh);
        assert!(Locale::parse("invalid").is_err());
        assert!(Locale::parse("fr-FR").is_err());
    }

    #[test]
    fn test_locale_display() {
        assert_eq!(Locale::En.to_string(), "en");
        assert_eq!(Locale::Vi.to_string(), "vi");
        assert_eq!(format!("{}", Locale::Zh), "zh");
        assert_eq!(Locale::default(), Locale::En);
    }

    #[test]
    fn test_locale_registry() {
        let registry = LocaleRegistry::new();

        assert!(registry.is_supported(&Locale::En));
        assert!(registry.is_supported(&Locale::Vi));
        assert!(!registry.is_supported(&Locale::Ja));
        assert_eq!(registry.get_default_locale(), &Locale::En);

        assert_eq!(registry.get_fallback_chain(&Locale::Vi), vec![Locale::En]);
        assert!(registry.get_fallback_chain(&Locale::En).is_empty());
    }

    #[test]
    fn test_locale_resolution() {
        let mut registry = LocaleRegistry::new();

        assert_eq!(registry.resolve_locale(&Locale::Vi), Locale::Vi);
        assert_eq!(registry.resolve_locale(&Locale::Ko), Locale::En);

        registry.add_locale(Locale::Ko, None);
        assert_eq!(registry.resolve_locale(&Locale::Ko), Locale::Ko);
    }
}
