use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;
use tracing::{debug, info, trace};

use crate::domain::{Message, SongListError, SourceError, ViewerConfig};
use crate::inputter::Inputter;
use crate::loader::{self, LOADING_MESSAGE, LoadState};
use crate::parser::{CommaParser, CsvParser, RecordParser};
use crate::table::{self, Record, Schema, SortState};
use crate::ui::{INSTRUCTIONS_HEIGHT, SEARCH_HEIGHT, TABLE_CHROME_HEIGHT, TableView};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

/// The whole viewer state. Every change goes through [`Model::update`].
pub struct Model {
    pub status: Status,
    schema: Schema,
    parser: Box<dyn RecordParser>,
    records: Vec<Record>,
    sort: SortState,
    load_state: LoadState,
    status_message: Option<String>,
    view: Option<TableView>,
    input: Inputter,
    selected_row: usize,
    focused_column: usize,
    show_help: bool,
    page_size: usize,
    clipboard: Option<Clipboard>,
}

impl Model {
    pub fn init(config: &ViewerConfig) -> Result<Self, SongListError> {
        let schema = Schema::new(config.columns.iter().map(|c| c.trim().to_string()))
            .ok_or_else(|| SongListError::Config("at least one column is required".into()))?;
        let parser: Box<dyn RecordParser> = if config.strict {
            Box::new(CsvParser)
        } else {
            Box::new(CommaParser)
        };
        debug!("Schema: {:?}, strict parsing: {}", schema.keys(), config.strict);

        Ok(Self {
            status: Status::READY,
            schema,
            parser,
            records: Vec::new(),
            sort: SortState::default(),
            load_state: LoadState::Loading,
            status_message: Some(LOADING_MESSAGE.to_string()),
            view: None,
            input: Inputter::default(),
            selected_row: 0,
            focused_column: 0,
            show_help: false,
            page_size: 1,
            clipboard: None,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// `None` once loading succeeded, the status line is gone then.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// `None` until the table was rendered for the first time.
    pub fn table_view(&self) -> Option<&TableView> {
        self.view.as_ref()
    }

    pub fn search(&self) -> &Inputter {
        &self.input
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    pub fn selected_row(&self) -> usize {
        self.selected_row
    }

    pub fn focused_column(&self) -> usize {
        self.focused_column
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn update(&mut self, message: Message) -> Result<(), SongListError> {
        if self.show_help {
            match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.show_help = false,
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::Loaded(result) => self.loaded(result),
                _ => (),
            }
            return Ok(());
        }

        match message {
            Message::Quit => self.quit(),
            Message::MoveUp => self.move_selection_up(1),
            Message::MoveDown => self.move_selection_down(1),
            Message::MovePageUp => self.move_selection_up(self.page_size),
            Message::MovePageDown => self.move_selection_down(self.page_size),
            Message::MoveBeginning => self.selected_row = 0,
            Message::MoveEnd => self.selected_row = self.nrows().saturating_sub(1),
            Message::FocusLeft => self.move_focus(-1),
            Message::FocusRight => self.move_focus(1),
            Message::ClickFocused => self.click_header(self.focused_column),
            Message::ClickHeader(column) => self.click_header(column),
            Message::SearchKey(key) => self.search_key(key),
            Message::ClearSearch => {
                self.input.clear();
                self.handle_search();
            }
            Message::CopyRow => self.copy_selected_row(),
            Message::Help => self.show_help = true,
            Message::Exit => (),
            Message::Resize(width, height) => self.ui_resize(width, height),
            Message::Loaded(result) => self.loaded(result),
        }
        Ok(())
    }

    /// Applies the fetch result once it arrived. Returns `true` if one was applied.
    pub fn poll_load(
        &mut self,
        loads: &Receiver<Result<String, SourceError>>,
    ) -> Result<bool, SongListError> {
        match loads.try_recv() {
            Ok(result) => {
                self.update(Message::Loaded(result))?;
                Ok(true)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(false),
        }
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn loaded(&mut self, result: Result<String, SourceError>) {
        if self.load_state != LoadState::Loading {
            trace!("Ignoring a second load result");
            return;
        }
        match loader::interpret(result, self.parser.as_ref(), &self.schema) {
            Ok(records) => {
                self.records = records;
                self.load_state = LoadState::Success;
                self.status_message = None;
                self.render(self.records.clone());
            }
            Err(failure) => {
                // The table stays as it is, only the status line changes.
                self.status_message = Some(failure.message());
                self.load_state = LoadState::Failure(failure);
            }
        }
    }

    fn search_key(&mut self, key: KeyEvent) {
        if self.input.read(key) {
            self.handle_search();
        }
    }

    /// Filters the full record set with the current query and redraws.
    fn handle_search(&mut self) {
        let start_time = Instant::now();
        let filtered = table::filter(&self.records, &self.schema, self.input.get());
        trace!(
            "Filter {:?} kept {}/{} songs in {}ms",
            self.input.get(),
            filtered.len(),
            self.records.len(),
            start_time.elapsed().as_millis()
        );
        self.render(filtered);
    }

    fn click_header(&mut self, column: usize) {
        if column >= self.schema.len() {
            trace!("No column {column} to sort by");
            return;
        }
        self.sort.click(column);
        self.focused_column = column;
        debug!(
            "Sort by {:?}, direction {:+}",
            self.schema.key(column),
            self.sort.direction.sign()
        );
        self.handle_search();
    }

    /// Replaces the current view, sorted by the active sort state.
    fn render(&mut self, records: Vec<Record>) {
        let sorted = table::sort(&records, &self.sort);
        self.view = Some(TableView::render(sorted, &self.schema, &self.sort));
        self.selected_row = self.selected_row.min(self.nrows().saturating_sub(1));
    }

    fn nrows(&self) -> usize {
        self.view.as_ref().map(|v| v.rows().len()).unwrap_or(0)
    }

    fn selected_record(&self) -> Option<&Record> {
        self.view.as_ref()?.rows().get(self.selected_row)
    }

    fn move_selection_up(&mut self, size: usize) {
        self.selected_row = self.selected_row.saturating_sub(size);
    }

    fn move_selection_down(&mut self, size: usize) {
        self.selected_row = std::cmp::min(
            self.selected_row + size,
            self.nrows().saturating_sub(1),
        );
    }

    fn move_focus(&mut self, step: isize) {
        let ncolumns = self.schema.len() as isize;
        self.focused_column = (self.focused_column as isize + step).rem_euclid(ncolumns) as usize;
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        let chrome = (SEARCH_HEIGHT + INSTRUCTIONS_HEIGHT + TABLE_CHROME_HEIGHT) as usize;
        self.page_size = height.saturating_sub(chrome).max(1);
        trace!("UI was resized! w:{width}, h:{height}, page size {}", self.page_size);
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.contains('"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }

    /// The selected song as one csv line.
    pub fn selected_as_csv(&self) -> Option<String> {
        self.selected_record().map(|record| {
            record
                .values()
                .iter()
                .map(|v| Model::wrap_cell_content(v))
                .collect::<Vec<String>>()
                .join(",")
        })
    }

    fn copy_selected_row(&mut self) {
        let Some(row_content) = self.selected_as_csv() else {
            return;
        };
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    info!("No clipboard available: {e}");
                    return;
                }
            }
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            match clipboard.set_text(row_content) {
                Ok(_) => trace!("Copied song to clipboard."),
                Err(e) => trace!("Error copying to clipboard: {:?}", e),
            }
        }
    }
}
