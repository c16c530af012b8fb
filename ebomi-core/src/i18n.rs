use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Storage key of the persisted language preference.
pub const LANGUAGE_PREFERENCE_KEY: &str = "preferred-language";

pub const FALLBACK_LANGUAGE: LanguageCode = LanguageCode::En;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    En,
    Es,
    Fr,
    Pt,
    De,
    Ar,
    Zh,
    Hi,
    Ha,
    Ig,
    Yo,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 11] = [
        LanguageCode::En,
        LanguageCode::Es,
        LanguageCode::Fr,
        LanguageCode::Pt,
        LanguageCode::De,
        LanguageCode::Ar,
        LanguageCode::Zh,
        LanguageCode::Hi,
        LanguageCode::Ha,
        LanguageCode::Ig,
        LanguageCode::Yo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Es => "es",
            LanguageCode::Fr => "fr",
            LanguageCode::Pt => "pt",
            LanguageCode::De => "de",
            LanguageCode::Ar => "ar",
            LanguageCode::Zh => "zh",
            LanguageCode::Hi => "hi",
            LanguageCode::Ha => "ha",
            LanguageCode::Ig => "ig",
            LanguageCode::Yo => "yo",
        }
    }

    pub fn native_name(&self) -> &'static str {
        match self {
            LanguageCode::En => "English",
            LanguageCode::Es => "Español",
            LanguageCode::Fr => "Français",
            LanguageCode::Pt => "Português",
            LanguageCode::De => "Deutsch",
            LanguageCode::Ar => "العربية",
            LanguageCode::Zh => "中文",
            LanguageCode::Hi => "हिन्दी",
            LanguageCode::Ha => "Hausa",
            LanguageCode::Ig => "Igbo",
            LanguageCode::Yo => "Yorùbá",
        }
    }

    pub fn is_rtl(&self) -> bool {
        matches!(self, LanguageCode::Ar)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        // Browsers hand out tags like "pt-BR"; only the primary subtag matters here.
        let primary = normalized.split(['-', '_']).next().unwrap_or_default();
        LanguageCode::ALL
            .into_iter()
            .find(|code| code.as_str() == primary)
            .ok_or_else(|| format!("unsupported language: {s}"))
    }
}

/// Resolves a stored preference, falling back when it is absent or unknown.
pub fn resolve_language(stored: Option<&str>, fallback: LanguageCode) -> LanguageCode {
    stored
        .and_then(|value| value.parse().ok())
        .unwrap_or(fallback)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, language: LanguageCode, text: impl Into<String>) -> Self {
        self.0.insert(language.as_str().to_string(), text.into());
        self
    }

    pub fn get(&self, language: LanguageCode) -> Option<&str> {
        self.0
            .get(language.as_str())
            .map(String::as_str)
            .filter(|text| !text.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Localized text for `language`, else `base`.
    pub fn pick<'a>(&'a self, language: LanguageCode, base: &'a str) -> &'a str {
        self.get(language).unwrap_or(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_region_tags_and_rejects_unknown() {
        assert_eq!("pt-BR".parse::<LanguageCode>().unwrap(), LanguageCode::Pt);
        assert_eq!(" YO ".parse::<LanguageCode>().unwrap(), LanguageCode::Yo);
        assert!("xx".parse::<LanguageCode>().is_err());
    }

    #[test]
    fn resolve_falls_back_when_absent_or_unknown() {
        assert_eq!(resolve_language(None, FALLBACK_LANGUAGE), LanguageCode::En);
        assert_eq!(
            resolve_language(Some("klingon"), FALLBACK_LANGUAGE),
            LanguageCode::En
        );
        assert_eq!(
            resolve_language(Some("ha"), FALLBACK_LANGUAGE),
            LanguageCode::Ha
        );
    }

    #[test]
    fn pick_prefers_non_empty_translation() {
        let text = LocalizedText::new()
            .with(LanguageCode::Fr, "Service du Lundi")
            .with(LanguageCode::Es, "  ");
        assert_eq!(text.pick(LanguageCode::Fr, "Monday Service"), "Service du Lundi");
        assert_eq!(text.pick(LanguageCode::Es, "Monday Service"), "Monday Service");
        assert!(LanguageCode::Ar.is_rtl());
    }
}
