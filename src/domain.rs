use std::io;
use std::path::PathBuf;

use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

pub const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vTdrMc1Yj5dp1ic_J7xBZxh9ypKhkO450u4973XnAlZ-JMvvDz2gKH4SQCrStQUOQbnB_s87fBUAU5T/pub?output=csv";
pub const DEFAULT_COLUMNS: [&str; 4] = ["songName", "artist", "language", "notes"];

pub const HELP_TEXT: &str = "\
Type              filter the song list
Esc               clear the search
Up/Down           move selection
PgUp/PgDown       move selection by a page
Home/End          first/last song
Left/Right        move the search cursor
Tab/Shift-Tab     focus a column header
Enter             sort by focused column (again to reverse)
F1..F9            sort by column 1..9
Mouse click       sort by clicked column
Ctrl-Y            copy selected song as csv
F10               this help
Ctrl-C/Ctrl-Q     quit";

#[derive(Debug, Error)]
pub enum SongListError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("could not set up logging: {0}")]
    Logging(String),
}

/// Why fetching the raw song list failed.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Where the song list comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLocation {
    Url(String),
    File(PathBuf),
}

#[derive(Debug, Clone, Setters)]
pub struct ViewerConfig {
    pub location: SourceLocation,
    pub columns: Vec<String>,
    pub strict: bool,
    pub event_poll_time: u64,
    pub log_file: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            location: SourceLocation::Url(DEFAULT_SHEET_URL.to_string()),
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            strict: false,
            event_poll_time: 100,
            log_file: None,
        }
    }
}

#[derive(Debug)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    FocusLeft,
    FocusRight,
    ClickFocused,
    ClickHeader(usize),
    SearchKey(KeyEvent),
    ClearSearch,
    CopyRow,
    Help,
    Exit,
    Resize(usize, usize),
    Loaded(Result<String, SourceError>),
}
