use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::SongListError;

pub const LOG_ENV: &str = "SONGLIST_LOG";

/// Logs go to a file, the terminal belongs to the ui. Without a file nothing is installed.
pub fn init(log_file: Option<&Path>) -> Result<(), SongListError> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let path = shellexpand::full(&path.to_string_lossy())
        .map_err(|e| SongListError::Logging(e.to_string()))?
        .into_owned();
    let file = File::create(&path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| SongListError::Logging(e.to_string()))
}
