//! Bilingual resolution.
//!
//! Every localizable value stores a base-language (Chinese) value and an
//! optional English override. Reads for [`Lang::En`] use the override when it
//! is present and non-empty, otherwise fall back to the base value. Reads for
//! the base language always return the base value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Display language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// Base language (Chinese).
    #[default]
    Zh,
    /// English.
    En,
}

impl Lang {
    /// Language code as used in query strings and fixtures.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Zh => "zh",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zh" | "zh-cn" | "cn" => Ok(Self::Zh),
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            _ => Err(format!("Unknown language: {s}")),
        }
    }
}

/// Resolve a single localized value.
///
/// `En` reads the override when it is non-empty; every other read returns
/// `base`.
#[must_use]
pub fn resolve<'a>(lang: Lang, base: &'a str, override_en: Option<&'a str>) -> &'a str {
    match (lang, override_en) {
        (Lang::En, Some(en)) if !en.is_empty() => en,
        _ => base,
    }
}

/// Resolve a localized list. An empty English list falls back like an
/// absent one.
#[must_use]
pub fn resolve_list<'a>(
    lang: Lang,
    base: &'a [String],
    override_en: Option<&'a [String]>,
) -> &'a [String] {
    match (lang, override_en) {
        (Lang::En, Some(en)) if !en.is_empty() => en,
        _ => base,
    }
}

/// A text value with a base-language value and an optional English override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TextRepr", into = "TextRepr")]
pub struct LocalizedText {
    /// Base-language value.
    pub base: String,
    /// English override.
    pub en: Option<String>,
}

impl LocalizedText {
    /// Create a value with only a base-language entry.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            en: None,
        }
    }

    /// Attach an English override.
    #[must_use]
    pub fn with_en(mut self, en: impl Into<String>) -> Self {
        self.en = Some(en.into());
        self
    }

    /// Effective value for `lang`.
    #[must_use]
    pub fn resolve(&self, lang: Lang) -> &str {
        resolve(lang, &self.base, self.en.as_deref())
    }
}

impl From<&str> for LocalizedText {
    fn from(base: &str) -> Self {
        Self::new(base)
    }
}

/// Shorthand for a bilingual label.
#[must_use]
pub fn label(base: &str, en: &str) -> LocalizedText {
    LocalizedText::new(base).with_en(en)
}

/// A list of strings with a base-language list and an optional English list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ListRepr", into = "ListRepr")]
pub struct LocalizedList {
    /// Base-language entries.
    pub base: Vec<String>,
    /// English entries.
    pub en: Option<Vec<String>>,
}

impl LocalizedList {
    /// Create a list with only base-language entries.
    #[must_use]
    pub fn new(base: Vec<String>) -> Self {
        Self { base, en: None }
    }

    /// Attach English entries.
    #[must_use]
    pub fn with_en(mut self, en: Vec<String>) -> Self {
        self.en = Some(en);
        self
    }

    /// Effective entries for `lang`.
    #[must_use]
    pub fn resolve(&self, lang: Lang) -> &[String] {
        resolve_list(lang, &self.base, self.en.as_deref())
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TextRepr {
    Plain(String),
    Pair {
        zh: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        en: Option<String>,
    },
}

impl From<TextRepr> for LocalizedText {
    fn from(repr: TextRepr) -> Self {
        match repr {
            TextRepr::Plain(base) => Self { base, en: None },
            TextRepr::Pair { zh, en } => Self { base: zh, en },
        }
    }
}

impl From<LocalizedText> for TextRepr {
    fn from(text: LocalizedText) -> Self {
        match text.en {
            None => Self::Plain(text.base),
            Some(en) => Self::Pair {
                zh: text.base,
                en: Some(en),
            },
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ListRepr {
    Plain(Vec<String>),
    Pair {
        zh: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        en: Option<Vec<String>>,
    },
}

impl From<ListRepr> for LocalizedList {
    fn from(repr: ListRepr) -> Self {
        match repr {
            ListRepr::Plain(base) => Self { base, en: None },
            ListRepr::Pair { zh, en } => Self { base: zh, en },
        }
    }
}

impl From<LocalizedList> for ListRepr {
    fn from(list: LocalizedList) -> Self {
        match list.en {
            None => Self::Plain(list.base),
            Some(en) => Self::Pair {
                zh: list.base,
                en: Some(en),
            },
        }
    }
}
