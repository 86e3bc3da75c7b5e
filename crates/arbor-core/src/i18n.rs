use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A string with per-locale translations.
///
/// The entry stored under the empty locale tag is the fallback returned when
/// no exact locale matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct I18nString {
    entries: BTreeMap<String, String>,
}

impl I18nString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a string that only has a fallback entry.
    pub fn with_fallback(text: impl Into<String>) -> Self {
        let mut s = Self::new();
        s.set_fallback(text);
        s
    }

    /// Insert or overwrite the entry for `locale`. An empty locale sets the fallback.
    pub fn set(&mut self, text: impl Into<String>, locale: &str) {
        self.entries.insert(locale.to_string(), text.into());
    }

    pub fn set_fallback(&mut self, text: impl Into<String>) {
        self.set(text, "");
    }

    /// Exact locale match, then the fallback, then the empty string.
    ///
    /// No language/territory negotiation happens: `zh_CN` never matches `zh`.
    pub fn match_locale(&self, locale: &str) -> &str {
        self.entries
            .get(locale)
            .or_else(|| self.entries.get(""))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn fallback(&self) -> Option<&str> {
        self.entries.get("").map(String::as_str)
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.entries.get(locale).map(String::as_str)
    }

    pub fn remove(&mut self, locale: &str) -> Option<String> {
        self.entries.remove(locale)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Locale entries other than the fallback, in locale order.
    pub fn localized(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|(locale, _)| !locale.is_empty())
            .map(|(locale, text)| (locale.as_str(), text.as_str()))
    }
}
