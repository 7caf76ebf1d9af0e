//! Shloka – a small study aid for Sanskrit verses.
//!
//! A user submits a verse or a prompt. The service looks it up in a local
//! scripture corpus, obtains translations and an explanation through a
//! pluggable provider, and records the interaction for the user.
//!
//! ## Modules
//! * [`corpus`] – The in-memory [`corpus::Corpus`] of [`corpus::VerseRecord`]s,
//!   seeded on first run, with substring search and category matching.
//! * [`backend`] – Blocking HTTP clients for the free translator, the paid
//!   translation API and the paid LLM chat API.
//! * [`provider`] – The free and paid [`provider::Provider`]s. Failures are
//!   values ([`provider::TranslationResult::Failed`]), never errors.
//! * [`policy`] – The [`policy::Resolver`] choosing providers per
//!   [`policy::Mode`] (`free`, `paid`, `auto`).
//! * [`study`] – Composes lookup, translation and explanation into a
//!   [`study::StudyResponse`].
//! * [`persist`] – SQLite storage for user profiles and session snapshots.
//! * [`interface`] – The shared [`interface::StudyInterface`] used by the server.
//! * [`server`] – The axum router.
//! * [`settings`] – Layered configuration through the `config` crate.
//!
//! ## Modes
//! `free` only uses the keyless translator. `paid` only uses the credentialed
//! backends. `auto` uses the free translator and falls back to the paid one
//! when it fails. Explanations from the paid LLM are only requested in `paid`
//! mode; every other case yields a templated explanation around the free
//! translation.
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use shloka::corpus::{default_records, Corpus};
//! use shloka::persist::{PersistenceMode, Persistor};
//! use shloka::policy::{Mode, Resolver};
//! use shloka::provider::{FreeProvider, PaidProvider};
//! use shloka::backend::{BackendResult, SourceLanguage, TranslationBackend};
//! use shloka::interface::{StudyInterface, StudyRequest};
//!
//! struct Echo;
//! impl TranslationBackend for Echo {
//!     fn translate(&self, text: &str, _source: SourceLanguage, _lang: &str) -> BackendResult<String> {
//!         Ok(format!("[{text}]"))
//!     }
//! }
//!
//! let corpus = Arc::new(Corpus::new(default_records()).unwrap());
//! let resolver = Resolver::new(
//!     Arc::new(FreeProvider::new(Box::new(Echo))),
//!     Arc::new(PaidProvider::unconfigured()),
//!     Mode::Auto,
//! );
//! let persistor = Persistor::new(&PersistenceMode::InMemory).unwrap();
//! let iface = StudyInterface::new(corpus, Arc::new(resolver), persistor);
//! let request: StudyRequest = serde_json::from_str(r#"{"prompt": "Gita 2.47", "scripture": "gita"}"#).unwrap();
//! let response = iface.study(&request).unwrap();
//! assert_eq!(response.found_local[0].id, "gita_2_47");
//! ```

pub mod backend;
pub mod corpus;
pub mod error;
pub mod interface;
pub mod persist;
pub mod policy;
pub mod provider;
pub mod server;
pub mod settings;
pub mod study;

pub use error::{Result, ShlokaError};
