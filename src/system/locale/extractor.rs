use once_cell::sync::Lazy;
use regex::Regex;

use super::{Locale, LocaleError, LocaleRegistry};

static LANGUAGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2,8}([-_][A-Za-z0-9]{1,8})*$").unwrap());

/// Resolves a device language preference against the supported locales.
///
/// Accepts a single tag (`vi-VN`, `pt_BR`) or an Accept-Language style list
/// (`ja-JP,vi;q=0.9,en;q=0.8`). The highest quality entry the registry
/// supports wins. Well-formed preferences naming nothing supported resolve
/// to the registry default; only empty or malformed ones are errors.
pub fn parse_locale_preference(
    preference: &str,
    registry: &LocaleRegistry,
) -> Result<Locale, LocaleError> {
    let preference = preference.trim();
    if preference.is_empty() {
        return Err(LocaleError::ExtractionFailed(
            "empty language preference".to_string(),
        ));
    }

    let mut locales: Vec<(String, f32)> = preference
        .split(',')
        .filter_map(|part| parse_locale_with_quality(part.trim()))
        .collect();

    if locales.is_empty() {
        return Err(LocaleError::ExtractionFailed(format!(
            "no valid language tag in {:?}",
            preference
        )));
    }

    // Sort by quality (highest first); the sort is stable so ties keep list order
    locales.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let supported = locales
        .iter()
        .filter_map(|(tag, _)| Locale::parse(tag).ok())
        .find(|locale| registry.is_supported(locale));

    Ok(supported.unwrap_or_else(|| registry.get_default_locale().clone()))
}

fn parse_locale_with_quality(part: &str) -> Option<(String, f32)> {
    let (tag, quality) = match part.split_once(";q=") {
        Some((tag, quality_str)) => (tag.trim(), quality_str.trim().parse::<f32>().unwrap_or(1.0)),
        None => (part, 1.0),
    };

    if !LANGUAGE_TAG.is_match(tag) || quality <= 0.0 {
        return None;
    }

    Some((tag.to_string(), quality))
}

/// Convert "en-US" to "en", "pt_BR" to "pt", etc.
pub fn language_code(tag: &str) -> String {
    let tag = tag.trim();
    match tag.split_once(['-', '_']) {
        Some((lang, _)) => lang.to_lowercase(),
        None => tag.to_lowercase(),
    }
}
