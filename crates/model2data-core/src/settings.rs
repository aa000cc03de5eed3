use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::identifier::strip_quotes;

/// A single column setting from a bracketed settings list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ColumnSetting {
    /// `pk` or `primary key`.
    PrimaryKey,
    NotNull,
    Null,
    Unique,
    Increment,
    /// `default: <value>`, value kept lowercase with quotes stripped.
    Default(String),
    /// `note: <text>`.
    Note(String),
    /// Any token not recognized above, lowercase and otherwise verbatim.
    Extension(String),
}

impl ColumnSetting {
    /// Parse one already-split settings token.
    ///
    /// Returns `None` for tokens that are empty after trimming.
    pub fn parse(token: &str) -> Option<Self> {
        let token = strip_quotes(token).to_lowercase();
        if token.is_empty() {
            return None;
        }

        if let Some((key, value)) = token.split_once(':') {
            let value = strip_quotes(value).to_string();
            match key.trim() {
                "default" => return Some(Self::Default(value)),
                "note" => return Some(Self::Note(value)),
                _ => {}
            }
        }

        let collapsed = token.split_whitespace().collect::<Vec<_>>().join(" ");
        Some(match collapsed.as_str() {
            "pk" | "primary key" => Self::PrimaryKey,
            "not null" => Self::NotNull,
            "null" => Self::Null,
            "unique" => Self::Unique,
            "increment" => Self::Increment,
            _ => Self::Extension(token),
        })
    }

    /// Lowercase token form of the setting.
    pub fn as_token(&self) -> String {
        match self {
            Self::PrimaryKey => "pk".to_string(),
            Self::NotNull => "not null".to_string(),
            Self::Null => "null".to_string(),
            Self::Unique => "unique".to_string(),
            Self::Increment => "increment".to_string(),
            Self::Default(value) => format!("default: {value}"),
            Self::Note(value) => format!("note: {value}"),
            Self::Extension(value) => value.clone(),
        }
    }
}

impl fmt::Display for ColumnSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_token())
    }
}

/// Insertion-ordered, duplicate-free set of column settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ColumnSettings(Vec<ColumnSetting>);

impl ColumnSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text between `[` and `]`: split on commas, strip quotes,
    /// trim, lowercase. Multi-word tokens stay one setting.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut settings = Self::new();
        let Some(raw) = raw else {
            return settings;
        };
        for token in raw.split(',') {
            if let Some(setting) = ColumnSetting::parse(token) {
                settings.insert(setting);
            }
        }
        settings
    }

    /// Insert a setting; returns `false` when it was already present.
    pub fn insert(&mut self, setting: ColumnSetting) -> bool {
        if self.0.contains(&setting) {
            return false;
        }
        self.0.push(setting);
        true
    }

    pub fn contains(&self, setting: &ColumnSetting) -> bool {
        self.0.contains(setting)
    }

    /// Check for a setting by its lowercase token (`"pk"`, `"not null"`, ...).
    pub fn contains_token(&self, token: &str) -> bool {
        ColumnSetting::parse(token).is_some_and(|setting| self.contains(&setting))
    }

    pub fn is_primary_key(&self) -> bool {
        self.contains(&ColumnSetting::PrimaryKey)
    }

    pub fn is_unique(&self) -> bool {
        self.contains(&ColumnSetting::Unique)
    }

    pub fn is_not_null(&self) -> bool {
        self.contains(&ColumnSetting::NotNull)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSetting> {
        self.0.iter()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.0.iter().map(ColumnSetting::as_token).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ColumnSetting> for ColumnSettings {
    fn from_iter<I: IntoIterator<Item = ColumnSetting>>(iter: I) -> Self {
        let mut settings = Self::new();
        for setting in iter {
            settings.insert(setting);
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_setting() {
        let settings = ColumnSettings::parse(Some("pk"));
        assert!(settings.is_primary_key());
        assert_eq!(settings.tokens(), vec!["pk"]);
    }

    #[test]
    fn keeps_multi_word_settings_whole() {
        let settings = ColumnSettings::parse(Some("pk, not null"));
        assert!(settings.contains_token("pk"));
        assert!(settings.contains_token("not null"));
        assert_eq!(settings.len(), 2);
    }

    #[test]
    fn strips_quotes_per_token() {
        let settings = ColumnSettings::parse(Some("'pk', 'not null'"));
        assert!(settings.is_primary_key());
        assert!(settings.is_not_null());
    }

    #[test]
    fn lowercases_tokens() {
        let settings = ColumnSettings::parse(Some("PK, NOT NULL, Custom Flag"));
        assert!(settings.is_primary_key());
        assert!(settings.is_not_null());
        assert_eq!(settings.tokens(), vec!["pk", "not null", "custom flag"]);
        assert!(
            settings
                .tokens()
                .iter()
                .all(|token| token.to_lowercase() == *token)
        );
    }

    #[test]
    fn empty_or_missing_settings_yield_nothing() {
        assert!(ColumnSettings::parse(None).is_empty());
        assert!(ColumnSettings::parse(Some("")).is_empty());
        assert!(ColumnSettings::parse(Some(" , ,")).is_empty());
    }

    #[test]
    fn recognizes_primary_key_spelling() {
        let settings = ColumnSettings::parse(Some("primary   key"));
        assert!(settings.is_primary_key());
    }

    #[test]
    fn parses_key_value_settings() {
        let settings = ColumnSettings::parse(Some("default: 'Active', note: 'shown in UI'"));
        assert!(settings.contains(&ColumnSetting::Default("active".to_string())));
        assert!(settings.contains(&ColumnSetting::Note("shown in ui".to_string())));
    }

    #[test]
    fn deduplicates_in_insertion_order() {
        let settings = ColumnSettings::parse(Some("unique, pk, unique, increment"));
        assert_eq!(settings.tokens(), vec!["unique", "pk", "increment"]);
    }
}
