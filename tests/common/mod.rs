#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use shloka::backend::SourceLanguage;
use shloka::corpus::{default_records, Corpus};
use shloka::persist::{PersistenceMode, Persistor};
use shloka::policy::{Mode, Resolver};
use shloka::provider::{FailureReason, Provider, TranslationResult};
use shloka::interface::StudyInterface;
use shloka::study::Study;

/// A provider with a fixed behaviour that counts its calls.
pub struct FakeProvider {
    configured: bool,
    translation: Option<String>,
    explanation: Option<String>,
    translate_calls: AtomicUsize,
    explain_calls: AtomicUsize,
    sources: Mutex<Vec<SourceLanguage>>,
}

impl FakeProvider {
    /// Translates every text to `"<prefix>:<text>"`.
    pub fn translating(prefix: &str) -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            translation: Some(prefix.to_string()),
            explanation: None,
            translate_calls: AtomicUsize::new(0),
            explain_calls: AtomicUsize::new(0),
            sources: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            translation: None,
            explanation: None,
            translate_calls: AtomicUsize::new(0),
            explain_calls: AtomicUsize::new(0),
            sources: Mutex::new(Vec::new()),
        })
    }

    pub fn explaining(prefix: &str, explanation: &str) -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            translation: Some(prefix.to_string()),
            explanation: Some(explanation.to_string()),
            translate_calls: AtomicUsize::new(0),
            explain_calls: AtomicUsize::new(0),
            sources: Mutex::new(Vec::new()),
        })
    }

    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            configured: false,
            translation: None,
            explanation: None,
            translate_calls: AtomicUsize::new(0),
            explain_calls: AtomicUsize::new(0),
            sources: Mutex::new(Vec::new()),
        })
    }

    pub fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }

    pub fn explain_calls(&self) -> usize {
        self.explain_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.translate_calls() + self.explain_calls()
    }

    /// Source language of every translate call, in order.
    pub fn sources(&self) -> Vec<SourceLanguage> {
        self.sources.lock().unwrap().clone()
    }
}

impl Provider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }
    fn is_configured(&self) -> bool {
        self.configured
    }
    fn translate(&self, text: &str, source: SourceLanguage, _target_language: &str) -> TranslationResult {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        self.sources.lock().unwrap().push(source);
        match (&self.translation, self.configured) {
            (Some(prefix), true) => TranslationResult::Translated(format!("{prefix}:{text}")),
            (_, false) => TranslationResult::failed(FailureReason::ProviderUnconfigured, "no key", text),
            (None, true) => TranslationResult::failed(FailureReason::ProviderUnreachable, "down", text),
        }
    }
    fn explain(&self, _text: &str, _target_language: &str) -> Option<String> {
        self.explain_calls.fetch_add(1, Ordering::SeqCst);
        self.explanation.clone()
    }
}

pub fn corpus() -> Arc<Corpus> {
    Arc::new(Corpus::new(default_records()).expect("default corpus"))
}

pub fn resolver(free: &Arc<FakeProvider>, paid: &Arc<FakeProvider>, mode: Mode) -> Arc<Resolver> {
    let free: Arc<dyn Provider> = free.clone();
    let paid: Arc<dyn Provider> = paid.clone();
    Arc::new(Resolver::new(free, paid, mode))
}

pub fn study(free: &Arc<FakeProvider>, paid: &Arc<FakeProvider>) -> Study {
    Study::new(corpus(), resolver(free, paid, Mode::Auto))
}

pub fn interface(free: &Arc<FakeProvider>, paid: &Arc<FakeProvider>) -> StudyInterface {
    let persistor = Persistor::new(&PersistenceMode::InMemory).expect("in-memory db");
    StudyInterface::new(corpus(), resolver(free, paid, Mode::Auto), persistor)
}
