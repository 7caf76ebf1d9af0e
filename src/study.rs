//! Study orchestration: corpus lookup, heuristic matching, translation and
//! explanation composed into one [`StudyResponse`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::corpus::{Corpus, VerseRecord};
use crate::policy::{Mode, Resolver};

/// A direct corpus match with its translation attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalMatch {
    pub id: String,
    pub sanskrit: String,
    pub source: String,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyResponse {
    pub scripture: String,
    pub prompt: String,
    pub found_local: Vec<LocalMatch>,
    pub heuristic_matches: Vec<VerseRecord>,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
}

pub struct Study {
    corpus: Arc<Corpus>,
    resolver: Arc<Resolver>,
}

impl Study {
    pub fn new(corpus: Arc<Corpus>, resolver: Arc<Resolver>) -> Self {
        Self { corpus, resolver }
    }

    pub fn study(
        &self,
        prompt: &str,
        scripture: &str,
        language: &str,
        mode: Option<Mode>,
    ) -> StudyResponse {
        let direct = if prompt.is_empty() { Vec::new() } else { self.corpus.search(prompt) };

        // only direct matches are translated, which bounds provider calls per request
        let found_local: Vec<LocalMatch> = direct
            .iter()
            .map(|record| {
                let result = self.resolver.translate_verse(&record.sanskrit, language, mode);
                LocalMatch {
                    id: record.id.clone(),
                    sanskrit: record.sanskrit.clone(),
                    source: record.source.clone(),
                    translation: result.text().to_string(),
                    translation_error: result.reason().map(|r| r.to_string()),
                }
            })
            .collect();

        let heuristic_matches: Vec<VerseRecord> = if direct.is_empty() {
            self.corpus.match_category(scripture).into_iter().cloned().collect()
        } else {
            Vec::new()
        };

        let subject = if !prompt.is_empty() {
            prompt
        } else {
            direct.first().map(|r| r.sanskrit.as_str()).unwrap_or("")
        };
        let explanation = self.resolver.explain(subject, language, mode);

        info!(
            scripture,
            language,
            mode = %self.resolver.resolve_mode(mode),
            direct = found_local.len(),
            heuristic = heuristic_matches.len(),
            "study composed"
        );
        StudyResponse {
            scripture: scripture.to_string(),
            prompt: prompt.to_string(),
            found_local,
            heuristic_matches,
            explanation,
            session_id: None,
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }
}
