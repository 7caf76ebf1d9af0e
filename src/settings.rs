//! Layered configuration: built-in defaults, an optional file, then
//! `SHLOKA__*` environment variables (`SHLOKA__PAID__LLM_API_KEY=...`).

use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::error::Result;
use crate::persist::PersistenceMode;
use crate::policy::Mode;

pub const DEFAULT_CONFIG_FILE: &str = "shloka";
pub const DEFAULT_DATABASE: &str = "shloka.db";

#[derive(Debug, Clone, Deserialize)]
pub struct FreeSettings {
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaidSettings {
    pub translate_endpoint: String,
    pub translate_api_key: Option<String>,
    pub llm_endpoint: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
}

impl PaidSettings {
    fn present(key: &Option<String>) -> Option<&str> {
        key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
    pub fn translate_key(&self) -> Option<&str> {
        Self::present(&self.translate_api_key)
    }
    pub fn llm_key(&self) -> Option<&str> {
        Self::present(&self.llm_api_key)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind: String,
    pub corpus_path: String,
    /// Blank keeps profiles and sessions in memory only.
    pub database_path: Option<String>,
    #[serde(deserialize_with = "mode_from_str")]
    pub mode: Mode,
    pub timeout_secs: u64,
    pub free: FreeSettings,
    pub paid: PaidSettings,
}

// accepts the same spellings as a request's `mode` field
fn mode_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Mode, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl Settings {
    /// Loads settings, reading `file` (any extension the config crate knows)
    /// when it exists.
    pub fn load(file: Option<&str>) -> Result<Self> {
        let builder = Config::builder()
            .set_default("bind", "127.0.0.1:8080")?
            .set_default("corpus_path", "scriptures.json")?
            .set_default("database_path", DEFAULT_DATABASE)?
            .set_default("mode", "auto")?
            .set_default("timeout_secs", 8_i64)?
            .set_default("free.endpoint", "https://translate.googleapis.com/translate_a/single")?
            .set_default(
                "paid.translate_endpoint",
                "https://translation.googleapis.com/language/translate/v2",
            )?
            .set_default("paid.llm_endpoint", "https://api.openai.com/v1/chat/completions")?
            .set_default("paid.llm_model", "gpt-4o-mini")?
            .add_source(File::with_name(file.unwrap_or(DEFAULT_CONFIG_FILE)).required(false))
            .add_source(Environment::with_prefix("SHLOKA").prefix_separator("__").separator("__"));
        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn persistence_mode(&self) -> PersistenceMode {
        PersistenceMode::from_path(self.database_path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShlokaError;
    use std::io::Write;

    #[test]
    fn defaults_without_file() {
        let settings = Settings::load(Some("definitely-not-a-config-file")).unwrap();
        assert_eq!(settings.mode, Mode::Auto);
        assert_eq!(settings.timeout(), Duration::from_secs(8));
        assert_eq!(settings.persistence_mode(), PersistenceMode::File(DEFAULT_DATABASE.into()));
        assert_eq!(settings.paid.llm_model, "gpt-4o-mini");
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "mode = \"paid\"\ndatabase_path = \"study.db\"\n[paid]\nllm_api_key = \"  \"\ntranslate_api_key = \"k\""
        )
        .unwrap();
        let settings = Settings::load(file.path().to_str()).unwrap();
        assert_eq!(settings.mode, Mode::Paid);
        assert_eq!(settings.persistence_mode(), PersistenceMode::File("study.db".into()));
        assert_eq!(settings.paid.llm_key(), None);
        assert_eq!(settings.paid.translate_key(), Some("k"));
    }

    #[test]
    fn blank_database_path_stays_in_memory() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "database_path = \"\"").unwrap();
        let settings = Settings::load(file.path().to_str()).unwrap();
        assert_eq!(settings.persistence_mode(), PersistenceMode::InMemory);
    }

    #[test]
    fn mode_is_read_case_insensitively() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "mode = \" PAID\"").unwrap();
        let settings = Settings::load(file.path().to_str()).unwrap();
        assert_eq!(settings.mode, Mode::Paid);

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "mode = \"premium\"").unwrap();
        assert!(matches!(Settings::load(file.path().to_str()), Err(ShlokaError::Config(_))));
    }
}
