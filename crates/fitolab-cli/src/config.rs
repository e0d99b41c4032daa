use fitolab_core::error::FitolabError;
use fitolab_core::store::JsonFileStore;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_DB: &str = "fitolab-db.json";

/// Log to stderr; RUST_LOG wins over --verbose.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "fitolab=debug,fitolab_core=debug"
    } else {
        "fitolab=info,fitolab_core=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub struct CliConfig {
    pub db_path: PathBuf,
}

impl CliConfig {
    pub fn new(db_path: PathBuf) -> Self {
        CliConfig { db_path }
    }

    pub fn open_store(&self) -> Result<JsonFileStore, FitolabError> {
        JsonFileStore::open(&self.db_path)
    }
}
