use std::io::stdout;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use tracing::{debug, info};

mod controller;
mod domain;
mod inputter;
mod loader;
mod logging;
mod model;
mod parser;
mod source;
mod table;
mod ui;

use controller::Controller;
use domain::{
    DEFAULT_COLUMNS, DEFAULT_SHEET_URL, Message, SongListError, SourceLocation, ViewerConfig,
};
use model::{Model, Status};
use ui::TableUI;

/// Search and sort a song list published as a csv spreadsheet export.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Published csv link of the song sheet
    #[arg(long, default_value = DEFAULT_SHEET_URL)]
    url: String,

    /// Read the song list from a local csv file instead of the url
    #[arg(long)]
    file: Option<PathBuf>,

    /// Column keys in sheet order, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_COLUMNS.map(String::from))]
    columns: Vec<String>,

    /// Use the quote aware csv parser
    #[arg(long)]
    strict: bool,

    /// Write logs to this file, filtered by SONGLIST_LOG
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

impl Cli {
    fn into_config(self) -> ViewerConfig {
        let location = match self.file {
            Some(path) => SourceLocation::File(path),
            None => SourceLocation::Url(self.url),
        };
        ViewerConfig::default()
            .location(location)
            .columns(self.columns)
            .strict(self.strict)
            .event_poll_time(self.poll_ms)
            .log_file(self.log_file)
    }
}

fn main() -> ExitCode {
    let cfg = Cli::parse().into_config();
    if let Err(e) = logging::init(cfg.log_file.as_deref()) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let result = run(&cfg);
    if let Err(e) = execute!(stdout(), DisableMouseCapture) {
        debug!("Could not disable mouse capture: {e}");
    }
    ratatui::restore();

    match result {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(cfg: &ViewerConfig) -> Result<(), SongListError> {
    let mut model = Model::init(cfg)?;
    let source = source::from_location(&cfg.location)?;
    info!("Loading song list from {}", source.location());
    let loads = loader::spawn(source);

    let mut ui = TableUI::new();
    let controller = Controller::new(cfg);

    let mut terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;
    let size = terminal.size()?;
    model.update(Message::Resize(size.width as usize, size.height as usize))?;

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        model.poll_load(&loads)?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model, &ui)? {
            model.update(message)?;
        };
    }

    Ok(())
}
