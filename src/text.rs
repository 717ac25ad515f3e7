//! Language-tagged recipe text and the selector that resolves it
//!
//! Recipe replies carry names and instructions as small bundles keyed by
//! language code. A bare string is treated as already resolved.

use serde::{Deserialize, Serialize};

use crate::i18n::Language;

/// Display strings keyed by the supported languages
///
/// Keys outside the supported set are dropped on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pa: Option<String>,
}

impl LocalizedText {
    pub fn english(text: impl Into<String>) -> Self {
        Self {
            en: Some(text.into()),
            ..Self::default()
        }
    }

    /// Raw entry for a language, empty strings included
    pub fn get(&self, language: Language) -> Option<&str> {
        match language {
            Language::En => self.en.as_deref(),
            Language::Hi => self.hi.as_deref(),
            Language::Pa => self.pa.as_deref(),
        }
    }

    /// Non-empty English entry, if any
    pub fn english_text(&self) -> Option<&str> {
        self.en.as_deref().filter(|s| !s.is_empty())
    }

    /// Entry for `language`, then English, then the empty string
    pub fn select(&self, language: Language) -> &str {
        self.get(language)
            .filter(|s| !s.is_empty())
            .or_else(|| self.english_text())
            .unwrap_or("")
    }
}

/// Either a plain string or a [`LocalizedText`] bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Text {
    Plain(String),
    Localized(LocalizedText),
}

impl Text {
    pub fn select(&self, language: Language) -> &str {
        match self {
            Text::Plain(s) => s.as_str(),
            Text::Localized(bundle) => bundle.select(language),
        }
    }

    /// English form used for matching and identity
    pub fn english(&self) -> Option<&str> {
        match self {
            Text::Plain(s) => Some(s.as_str()),
            Text::Localized(bundle) => bundle.english_text(),
        }
    }

    /// A plain empty string carries no text; any bundle counts as present
    pub fn is_present(&self) -> bool {
        match self {
            Text::Plain(s) => !s.is_empty(),
            Text::Localized(_) => true,
        }
    }
}

impl From<LocalizedText> for Text {
    fn from(bundle: LocalizedText) -> Self {
        Text::Localized(bundle)
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Text::Plain(s.to_string())
    }
}

/// Resolve optional text for display; never fails, absent text is `""`
pub fn select(text: Option<&Text>, language: Language) -> &str {
    text.map(|t| t.select(language)).unwrap_or("")
}
