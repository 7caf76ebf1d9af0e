//! Outbound translation and chat backends.
//!
//! Each backend is a thin blocking HTTP client behind a small trait, so the
//! providers built on top of them can be exercised with fakes. Every client is
//! built with an explicit request timeout.

use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;

use crate::error::{Result, ShlokaError};

/// Failure of a single outbound call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("unreachable: {0}")]
    Unreachable(String),
    #[error("rejected with status {0}")]
    Rejected(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Rejected(status.as_u16()),
            None if e.is_decode() => Self::Malformed(e.to_string()),
            None => Self::Unreachable(e.to_string()),
        }
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// What the caller knows about the language of the text it hands over.
///
/// Corpus verses are known to be Sanskrit. Free-text prompts may be Hindi,
/// Marathi or anything else written in Devanagari, so they are left to the
/// backend to detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    Sanskrit,
    Detect,
}

impl SourceLanguage {
    pub fn code(self) -> &'static str {
        match self {
            Self::Sanskrit => "sa",
            Self::Detect => "auto",
        }
    }
}

/// Turns text into text in the target language.
pub trait TranslationBackend: Send + Sync {
    fn translate(&self, text: &str, source: SourceLanguage, target_language: &str) -> BackendResult<String>;
}

/// Answers a single user prompt.
pub trait ChatBackend: Send + Sync {
    fn complete(&self, prompt: &str) -> BackendResult<String>;
}

fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ShlokaError::Config(format!("failed to create HTTP client: {e}")))
}

// ------------- Free -------------

/// The public, keyless Google translate endpoint.
pub struct FreeTranslator {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl FreeTranslator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self { endpoint: endpoint.into(), client: http_client(timeout)? })
    }
}

impl TranslationBackend for FreeTranslator {
    fn translate(&self, text: &str, source: SourceLanguage, target_language: &str) -> BackendResult<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source.code()),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ])
            .send()?;
        if !response.status().is_success() {
            return Err(BackendError::Rejected(response.status().as_u16()));
        }
        let body: Value = response.json()?;
        join_sentences(&body)
    }
}

/// The free endpoint answers with nested arrays; the first element holds one
/// `[translated, original, ...]` entry per sentence.
fn join_sentences(body: &Value) -> BackendResult<String> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| BackendError::Malformed("missing sentence list".into()))?;
    let joined: String = sentences
        .iter()
        .filter_map(|s| s.get(0).and_then(Value::as_str))
        .collect();
    if joined.trim().is_empty() {
        return Err(BackendError::Malformed("empty translation".into()));
    }
    Ok(joined)
}

// ------------- Paid -------------

/// Google Cloud Translation v2, keyed.
pub struct CloudTranslator {
    endpoint: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl CloudTranslator {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client: http_client(timeout)?,
        })
    }
}

impl TranslationBackend for CloudTranslator {
    fn translate(&self, text: &str, source: SourceLanguage, target_language: &str) -> BackendResult<String> {
        let mut request = json!({ "q": text, "target": target_language, "format": "text" });
        // v2 detects the language when `source` is absent
        if source == SourceLanguage::Sanskrit {
            request["source"] = json!(source.code());
        }
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()?;
        if !response.status().is_success() {
            return Err(BackendError::Rejected(response.status().as_u16()));
        }
        let body: Value = response.json()?;
        body.pointer("/data/translations/0/translatedText")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BackendError::Malformed("missing translatedText".into()))
    }
}

/// OpenAI-compatible chat completions endpoint.
pub struct ChatCompletions {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl ChatCompletions {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: http_client(timeout)?,
        })
    }
}

impl ChatBackend for ChatCompletions {
    fn complete(&self, prompt: &str) -> BackendResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
            }))
            .send()?;
        if !response.status().is_success() {
            return Err(BackendError::Rejected(response.status().as_u16()));
        }
        let body: Value = response.json()?;
        body.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BackendError::Malformed("missing message content".into()))
    }
}
