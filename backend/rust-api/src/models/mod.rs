use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod progress;

/// Display locale requested by the client. Arabic is the canonical language
/// of the association; Russian translations are optional per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ar,
    Ru,
}

impl Locale {
    /// Lenient parse for the `?locale=` query parameter. Anything that is
    /// not recognisably Russian falls back to Arabic.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.to_ascii_lowercase()) {
            Some(ref v) if v == "ru" || v == "rus" => Locale::Ru,
            _ => Locale::Ar,
        }
    }
}

/// Bilingual text pair. Every user-visible string in the catalog carries an
/// Arabic value and an optional Russian translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizedText {
    pub ar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ru: Option<String>,
}

impl LocalizedText {
    pub fn new(ar: impl Into<String>) -> Self {
        Self {
            ar: ar.into(),
            ru: None,
        }
    }

    pub fn bilingual(ar: impl Into<String>, ru: impl Into<String>) -> Self {
        Self {
            ar: ar.into(),
            ru: Some(ru.into()),
        }
    }

    /// Resolve for display: Russian when requested and present, Arabic
    /// otherwise.
    pub fn resolve(&self, locale: Locale) -> &str {
        match locale {
            Locale::Ru => self.ru.as_deref().unwrap_or(&self.ar),
            Locale::Ar => &self.ar,
        }
    }
}
