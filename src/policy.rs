//! Provider selection.
//!
//! The [`Resolver`] decides, per call, which provider to invoke:
//! * `free` calls the free provider only.
//! * `paid` calls the paid provider only.
//! * `auto` calls the free provider and, only if that fails, the paid one.
//!
//! Explanations only ever reach the paid provider in `paid` mode with a
//! configured paid backend. Everything else, including a failed paid call,
//! produces a templated explanation built from the free translation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::SourceLanguage;
use crate::error::ShlokaError;
use crate::provider::{Provider, TranslationResult};

pub const PAID_NOTICE: &str =
    "Detailed commentary is available in paid mode when a paid provider is configured.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Free,
    Paid,
    #[default]
    Auto,
}

impl FromStr for Mode {
    type Err = ShlokaError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "paid" => Ok(Self::Paid),
            "auto" => Ok(Self::Auto),
            _ => Err(ShlokaError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Free => "free",
            Self::Paid => "paid",
            Self::Auto => "auto",
        })
    }
}

/// The explanation returned whenever the paid commentary is not used.
pub fn templated_explanation(translation: &str, language: &str) -> String {
    format!("Translation ({language}): {translation}\n\n{PAID_NOTICE}")
}

pub struct Resolver {
    free: Arc<dyn Provider>,
    paid: Arc<dyn Provider>,
    paid_available: bool,
    default_mode: Mode,
}

impl Resolver {
    pub fn new(free: Arc<dyn Provider>, paid: Arc<dyn Provider>, default_mode: Mode) -> Self {
        let paid_available = paid.is_configured();
        Self { free, paid, paid_available, default_mode }
    }

    pub fn paid_available(&self) -> bool {
        self.paid_available
    }

    pub fn default_mode(&self) -> Mode {
        self.default_mode
    }

    /// A request-supplied mode wins over the configured default.
    pub fn resolve_mode(&self, requested: Option<Mode>) -> Mode {
        requested.unwrap_or(self.default_mode)
    }

    /// Translates free text, letting the backend detect its language.
    pub fn translate(&self, text: &str, language: &str, mode: Option<Mode>) -> TranslationResult {
        self.translate_from(text, SourceLanguage::Detect, language, mode)
    }

    /// Translates a corpus verse, which is always Sanskrit.
    pub fn translate_verse(&self, text: &str, language: &str, mode: Option<Mode>) -> TranslationResult {
        self.translate_from(text, SourceLanguage::Sanskrit, language, mode)
    }

    fn translate_from(
        &self,
        text: &str,
        source: SourceLanguage,
        language: &str,
        mode: Option<Mode>,
    ) -> TranslationResult {
        match self.resolve_mode(mode) {
            Mode::Free => self.free.translate(text, source, language),
            Mode::Paid => self.paid.translate(text, source, language),
            Mode::Auto => {
                let result = self.free.translate(text, source, language);
                if result.is_success() {
                    return result;
                }
                debug!(
                    from = self.free.name(),
                    to = self.paid.name(),
                    reason = ?result.reason(),
                    "translation failed, falling back"
                );
                self.paid.translate(text, source, language)
            }
        }
    }

    pub fn explain(&self, text: &str, language: &str, mode: Option<Mode>) -> String {
        if text.is_empty() {
            return String::new();
        }
        if self.resolve_mode(mode) == Mode::Paid && self.paid_available {
            if let Some(explanation) = self.paid.explain(text, language) {
                return explanation;
            }
            debug!(provider = self.paid.name(), "explanation unavailable, using template");
        }
        let translation = self.translate(text, language, Some(Mode::Free));
        templated_explanation(translation.text(), language)
    }
}
