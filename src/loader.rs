use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use tracing::{error, info, instrument, trace};

use crate::domain::SourceError;
use crate::parser::RecordParser;
use crate::source::Source;
use crate::table::{Record, Schema};

pub const LOADING_MESSAGE: &str = "Loading song list ...";
const EMPTY_MESSAGE: &str =
    "The song list is empty or could not be parsed. Check the sheet link and its contents.";

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Success,
    Failure(LoadFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadFailure {
    /// Network error or non-success status, carries the underlying detail.
    Transport(String),
    /// Nothing survived parsing.
    Empty,
}

impl LoadFailure {
    pub fn message(&self) -> String {
        match self {
            LoadFailure::Transport(detail) => format!(
                "Loading failed: {detail}. Check that the link is correct and published."
            ),
            LoadFailure::Empty => EMPTY_MESSAGE.to_string(),
        }
    }
}

/// Fetches once in the background. The receiver yields exactly one result.
pub fn spawn(source: Box<dyn Source>) -> Receiver<Result<String, SourceError>> {
    let (tx, rx) = mpsc::channel();
    rayon::spawn(move || {
        let start_time = Instant::now();
        let location = source.location();
        let result = source.fetch();
        info!(
            "Fetching {location} took {}ms",
            start_time.elapsed().as_millis()
        );
        if tx.send(result).is_err() {
            trace!("Receiver dropped before the fetch finished");
        }
    });
    rx
}

/// Maps a fetch result onto records or the reason the load failed.
#[instrument(level = "debug", skip_all, fields(columns = schema.len()))]
pub fn interpret(
    result: Result<String, SourceError>,
    parser: &dyn RecordParser,
    schema: &Schema,
) -> Result<Vec<Record>, LoadFailure> {
    let text = result.map_err(|e| {
        error!("Could not load the song list: {e}");
        LoadFailure::Transport(e.to_string())
    })?;
    let records = parser.parse(&text, schema);
    if records.is_empty() {
        Err(LoadFailure::Empty)
    } else {
        info!("Loaded {} songs", records.len());
        Ok(records)
    }
}
