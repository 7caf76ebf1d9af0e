use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shloka::corpus::Corpus;
use shloka::interface::{resolver_from_settings, StudyInterface};
use shloka::persist::Persistor;
use shloka::server::serve;
use shloka::settings::Settings;
use shloka::{Result, ShlokaError};

fn run() -> Result<()> {
    let config_file = std::env::var("SHLOKA_CONFIG").ok();
    let settings = Settings::load(config_file.as_deref())?;
    // a missing-and-unwritable or malformed corpus aborts startup
    let corpus = Arc::new(Corpus::load(&settings.corpus_path)?);
    let resolver = Arc::new(resolver_from_settings(&settings)?);
    let persistence = settings.persistence_mode();
    info!(?persistence, "opening profile store");
    let persistor = Persistor::new(&persistence)?;
    let interface = Arc::new(StudyInterface::new(corpus, resolver, persistor));

    // The blocking HTTP clients must be dropped outside the runtime, so main
    // keeps a handle to the interface until the runtime is gone.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| ShlokaError::Server(e.to_string()))?;
    runtime.block_on(serve(Arc::clone(&interface), &settings.bind))?;
    drop(runtime);
    info!("shut down");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    if let Err(e) = run() {
        error!(error = %e, "shloka stopped");
        std::process::exit(1);
    }
}
