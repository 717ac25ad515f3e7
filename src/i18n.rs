//! Internationalization (i18n) support
//!
//! This module owns the closed set of display languages used both for recipe
//! text and for the CLI's own messages.
//! Supported languages: English (en), Hindi (hi), Punjabi (pa)
//!
//! When no language has been chosen yet, the locale is detected from the
//! system (LANG and friends).

use rust_i18n::set_locale;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use sys_locale::get_locale;

/// Supported display languages
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Pa,
}

impl Language {
    /// Language code as stored and as used by rust-i18n
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Pa => "pa",
        }
    }

    /// Display name in the language itself
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "हिन्दी",
            Language::Pa => "ਪੰਜਾਬੀ",
        }
    }

    pub fn all() -> &'static [Language] {
        &[Language::En, Language::Hi, Language::Pa]
    }

    /// Parse a language code, accepting region suffixes ("hi-IN", "pa_IN")
    pub fn from_code(code: &str) -> Option<Language> {
        let lang = code.trim().split(&['-', '_', '.'][..]).next()?;
        Language::all()
            .iter()
            .copied()
            .find(|l| l.code().eq_ignore_ascii_case(lang))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s).ok_or_else(|| {
            anyhow::anyhow!("{}", rust_i18n::t!("i18n.unsupported_language", code = s))
        })
    }
}

/// Initialize the CLI locale
///
/// Uses the preferred language when one has been persisted, otherwise the
/// system locale, falling back to English when that is not supported.
pub fn init_locale(preferred: Option<Language>) -> Language {
    let language = preferred.unwrap_or_else(detect_locale);
    set_locale(language.code());
    language
}

/// Detect the system locale and map it onto a supported language
pub fn detect_locale() -> Language {
    get_locale()
        .and_then(|locale| Language::from_code(&locale))
        .unwrap_or_default()
}
