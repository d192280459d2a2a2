use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::loader::interpolate_message;
use super::{Locale, LocaleError, Messages, MessageLoader};

/// Display context bound to one locale.
///
/// A context is immutable once built; a language change produces a new one.
#[derive(Debug, Clone)]
pub struct LocalizedContext {
    locale: Locale,
    messages: Messages,
    fallbacks: Vec<Messages>,
    created_at: DateTime<Utc>,
}

impl LocalizedContext {
    /// Resolves `requested` against the loader's registry and loads its messages.
    /// The resolved locale's file is required; fallback files are best effort.
    pub async fn build(loader: &MessageLoader, requested: &Locale) -> Result<Self, LocaleError> {
        let locale = loader.registry().resolve_locale(requested);
        let messages = loader.load_locale(&locale).await?;

        let mut fallbacks = Vec::new();
        for fallback in loader.registry().get_fallback_chain(&locale) {
            match loader.load_locale(&fallback).await {
                Ok(messages) => fallbacks.push(messages),
                Err(e) => tracing::debug!("Skipping fallback locale {}: {}", fallback, e),
            }
        }

        Ok(Self {
            locale,
            messages,
            fallbacks,
            created_at: Utc::now(),
        })
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn is_rtl(&self) -> bool {
        self.locale.is_rtl()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn lookup(&self, key: &str) -> Option<String> {
        let fallbacks: Vec<&Messages> = self.fallbacks.iter().collect();
        self.messages.get_with_fallback(key, &fallbacks)
    }

    /// Missing keys render as `[key]`.
    pub fn text(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_else(|| format!("[{}]", key))
    }

    pub fn text_with_params(&self, key: &str, params: &HashMap<String, String>) -> String {
        match self.lookup(key) {
            Some(template) => interpolate_message(&template, params),
            None => format!("[{}]", key),
        }
    }
}
