//! Provider adapters.
//!
//! A [`Provider`] wraps one family of translation backends behind a uniform
//! call signature. Provider failures never escape as errors: translation
//! failures are returned as [`TranslationResult::Failed`] values and a failed
//! explanation is simply `None`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::{BackendError, ChatBackend, SourceLanguage, TranslationBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Transport failure, timeout or unreadable response.
    ProviderUnreachable,
    /// A configured backend answered with a non-success status or an
    /// unusable body.
    ProviderRejected,
    /// No credential present for any backend of the provider.
    ProviderUnconfigured,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProviderUnreachable => "provider_unreachable",
            Self::ProviderRejected => "provider_rejected",
            Self::ProviderUnconfigured => "provider_unconfigured",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&BackendError> for FailureReason {
    fn from(e: &BackendError) -> Self {
        match e {
            BackendError::Unreachable(_) => Self::ProviderUnreachable,
            BackendError::Rejected(_) | BackendError::Malformed(_) => Self::ProviderRejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationResult {
    Translated(String),
    Failed {
        reason: FailureReason,
        detail: String,
        original: String,
    },
}

impl TranslationResult {
    pub fn failed(reason: FailureReason, detail: impl Into<String>, original: &str) -> Self {
        Self::Failed { reason, detail: detail.into(), original: original.to_string() }
    }

    fn from_backend(e: &BackendError, original: &str) -> Self {
        Self::failed(FailureReason::from(e), e.to_string(), original)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Translated(_))
    }

    /// The translation, or the untouched original text on failure.
    pub fn text(&self) -> &str {
        match self {
            Self::Translated(text) => text,
            Self::Failed { original, .. } => original,
        }
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::Translated(_) => None,
            Self::Failed { reason, .. } => Some(*reason),
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Translated(_) => None,
            Self::Failed { detail, .. } => Some(detail),
        }
    }
}

pub trait Provider: Send + Sync {
    /// Short label used in log fields.
    fn name(&self) -> &'static str;
    /// Whether at least one backend could be called at all.
    fn is_configured(&self) -> bool;
    fn translate(&self, text: &str, source: SourceLanguage, target_language: &str) -> TranslationResult;
    fn explain(&self, text: &str, target_language: &str) -> Option<String>;
}

// ------------- Free -------------

pub struct FreeProvider {
    backend: Box<dyn TranslationBackend>,
}

impl FreeProvider {
    pub fn new(backend: Box<dyn TranslationBackend>) -> Self {
        Self { backend }
    }
}

impl Provider for FreeProvider {
    fn name(&self) -> &'static str {
        "free"
    }
    fn is_configured(&self) -> bool {
        true
    }
    fn translate(&self, text: &str, source: SourceLanguage, target_language: &str) -> TranslationResult {
        match self.backend.translate(text, source, target_language) {
            Ok(translation) => TranslationResult::Translated(translation),
            Err(e) => {
                warn!(provider = self.name(), error = %e, "translation failed");
                TranslationResult::from_backend(&e, text)
            }
        }
    }
    fn explain(&self, _text: &str, _target_language: &str) -> Option<String> {
        None
    }
}

// ------------- Paid -------------

pub struct PaidProvider {
    translator: Option<Box<dyn TranslationBackend>>,
    llm: Option<Box<dyn ChatBackend>>,
}

impl PaidProvider {
    pub fn new(
        translator: Option<Box<dyn TranslationBackend>>,
        llm: Option<Box<dyn ChatBackend>>,
    ) -> Self {
        Self { translator, llm }
    }

    /// A paid provider with no backends; every call reports it is unconfigured.
    pub fn unconfigured() -> Self {
        Self::new(None, None)
    }
}

fn translation_prompt(text: &str, source: SourceLanguage, target_language: &str) -> String {
    let subject = match source {
        SourceLanguage::Sanskrit => "Sanskrit text",
        SourceLanguage::Detect => "text",
    };
    format!(
        "Translate the following {subject} into the language with code '{target_language}'. \
         Reply with the translation only, without notes or quotation marks.\n\n{text}"
    )
}

fn explanation_prompt(text: &str, target_language: &str) -> String {
    format!(
        "For the following Sanskrit text, give a literal translation followed by a short \
         commentary on its meaning. Write both in the language with code '{target_language}'.\n\n{text}"
    )
}

impl Provider for PaidProvider {
    fn name(&self) -> &'static str {
        "paid"
    }
    fn is_configured(&self) -> bool {
        self.translator.is_some() || self.llm.is_some()
    }
    fn translate(&self, text: &str, source: SourceLanguage, target_language: &str) -> TranslationResult {
        let mut last_failure = None;
        if let Some(translator) = &self.translator {
            match translator.translate(text, source, target_language) {
                Ok(translation) => return TranslationResult::Translated(translation),
                Err(e) => {
                    warn!(provider = self.name(), backend = "translate", error = %e, "falling through");
                    last_failure = Some(e);
                }
            }
        }
        if let Some(llm) = &self.llm {
            match llm.complete(&translation_prompt(text, source, target_language)) {
                Ok(reply) if !reply.trim().is_empty() => {
                    return TranslationResult::Translated(reply.trim().to_string());
                }
                Ok(_) => last_failure = Some(BackendError::Malformed("empty reply".into())),
                Err(e) => {
                    warn!(provider = self.name(), backend = "llm", error = %e, "translation failed");
                    last_failure = Some(e);
                }
            }
        }
        match last_failure {
            Some(e) => TranslationResult::from_backend(&e, text),
            None => TranslationResult::failed(
                FailureReason::ProviderUnconfigured,
                "no paid backend credential configured",
                text,
            ),
        }
    }
    fn explain(&self, text: &str, target_language: &str) -> Option<String> {
        let llm = self.llm.as_ref()?;
        match llm.complete(&explanation_prompt(text, target_language)) {
            Ok(reply) if !reply.trim().is_empty() => Some(reply.trim().to_string()),
            Ok(_) => {
                debug!(provider = self.name(), "empty explanation");
                None
            }
            Err(e) => {
                warn!(provider = self.name(), error = %e, "explanation failed");
                None
            }
        }
    }
}
