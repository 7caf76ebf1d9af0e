//! The shared service handed to the HTTP layer.
//!
//! [`StudyInterface`] owns the read-only corpus, the provider resolver and the
//! persistence sink. It runs the study orchestration and, when the request
//! names a user, records the session and attaches its id to the response.
//! Everything here is synchronous; callers on an async runtime should run it
//! on a blocking thread.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::backend::{ChatBackend, ChatCompletions, CloudTranslator, FreeTranslator, TranslationBackend};
use crate::corpus::Corpus;
use crate::error::Result;
use crate::persist::{Persistor, SessionRecord, UserProfile, UserUpdate};
use crate::policy::{Mode, Resolver};
use crate::provider::{FreeProvider, PaidProvider, TranslationResult};
use crate::settings::Settings;
use crate::study::{Study, StudyResponse};

pub const DEFAULT_LANGUAGE: &str = "en";

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudyRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub scripture: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// An absent or blank mode defers to the configured default.
pub fn parse_mode(mode: Option<&str>) -> Result<Option<Mode>> {
    match mode.map(str::trim) {
        None | Some("") => Ok(None),
        Some(m) => Ok(Some(m.parse()?)),
    }
}

/// Builds the free and paid providers from settings. A paid sub-backend is
/// only created when its credential is present.
pub fn resolver_from_settings(settings: &Settings) -> Result<Resolver> {
    let timeout = settings.timeout();
    let free = FreeProvider::new(Box::new(FreeTranslator::new(&settings.free.endpoint, timeout)?));
    let translator: Option<Box<dyn TranslationBackend>> = match settings.paid.translate_key() {
        Some(key) => Some(Box::new(CloudTranslator::new(
            &settings.paid.translate_endpoint,
            key,
            timeout,
        )?)),
        None => None,
    };
    let llm: Option<Box<dyn ChatBackend>> = match settings.paid.llm_key() {
        Some(key) => Some(Box::new(ChatCompletions::new(
            &settings.paid.llm_endpoint,
            key,
            &settings.paid.llm_model,
            timeout,
        )?)),
        None => None,
    };
    let resolver = Resolver::new(
        Arc::new(free),
        Arc::new(PaidProvider::new(translator, llm)),
        settings.mode,
    );
    info!(
        mode = %resolver.default_mode(),
        paid_available = resolver.paid_available(),
        timeout_secs = timeout.as_secs(),
        "providers ready"
    );
    Ok(resolver)
}

pub struct StudyInterface {
    study: Study,
    persistor: Persistor,
}

impl StudyInterface {
    pub fn new(corpus: Arc<Corpus>, resolver: Arc<Resolver>, persistor: Persistor) -> Self {
        Self { study: Study::new(corpus, resolver), persistor }
    }

    /// Runs a study and records it when a user is named. An unknown user
    /// fails the request before any provider is called.
    pub fn study(&self, request: &StudyRequest) -> Result<StudyResponse> {
        let mode = parse_mode(request.mode.as_deref())?;
        if let Some(user_id) = request.user_id {
            self.persistor.user(user_id)?;
        }
        let mut response = self.study.study(&request.prompt, &request.scripture, &request.language, mode);
        if let Some(user_id) = request.user_id {
            match self.persistor.record_session(user_id, &response) {
                Ok(session_id) => response.session_id = Some(session_id),
                Err(e) => {
                    warn!(user = user_id, error = %e, "session not recorded");
                    return Err(e);
                }
            }
        }
        Ok(response)
    }

    pub fn translate(&self, text: &str, language: &str, mode: Option<&str>) -> Result<TranslationResult> {
        let mode = parse_mode(mode)?;
        Ok(self.study.resolver().translate(text, language, mode))
    }

    pub fn explain(&self, text: &str, language: &str, mode: Option<&str>) -> Result<String> {
        let mode = parse_mode(mode)?;
        Ok(self.study.resolver().explain(text, language, mode))
    }

    pub fn corpus(&self) -> &Corpus {
        self.study.corpus()
    }

    pub fn paid_available(&self) -> bool {
        self.study.resolver().paid_available()
    }

    pub fn create_user(&self, name: &str, language: &str, scripture: Option<&str>) -> Result<UserProfile> {
        self.persistor.create_user(name, language, scripture)
    }

    pub fn user(&self, id: i64) -> Result<UserProfile> {
        self.persistor.user(id)
    }

    pub fn users(&self) -> Result<Vec<UserProfile>> {
        self.persistor.users()
    }

    pub fn update_user(&self, id: i64, update: &UserUpdate) -> Result<UserProfile> {
        self.persistor.update_user(id, update)
    }

    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.persistor.delete_user(id)
    }

    pub fn sessions(&self, user_id: i64) -> Result<Vec<SessionRecord>> {
        self.persistor.sessions(user_id)
    }
}
