use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShlokaError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Corpus error: {0}")]
    Corpus(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Unknown user: {0}")]
    UnknownUser(i64),
    #[error("Invalid mode '{0}', expected one of free, paid, auto")]
    InvalidMode(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Server error: {0}")]
    Server(String),
}

pub type Result<T> = std::result::Result<T, ShlokaError>;

// Helper conversions
impl From<rusqlite::Error> for ShlokaError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
impl From<serde_json::Error> for ShlokaError {
    fn from(e: serde_json::Error) -> Self { Self::Serialization(e.to_string()) }
}
impl From<config::ConfigError> for ShlokaError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<std::io::Error> for ShlokaError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
