use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Cell, Clear, HighlightSpacing, Paragraph, Row, Table, TableState, Wrap},
};

use crate::domain::HELP_TEXT;
use crate::loader::LoadState;
use crate::model::Model;
use crate::table::{Record, Schema, SortDirection, SortState};

pub const SORT_ASCENDING: &str = "▲";
pub const SORT_DESCENDING: &str = "▼";
pub const PLACEHOLDER_TEXT: &str = "No songs match the search.";

pub const SEARCH_HEIGHT: u16 = 3;
pub const STATUS_HEIGHT: u16 = 1;
pub const INSTRUCTIONS_HEIGHT: u16 = 1;
// Block border plus header row.
pub const TABLE_CHROME_HEIGHT: u16 = 3;
const COLUMN_SPACING: u16 = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum TableBody {
    Placeholder,
    Rows(Vec<Record>),
}

/// What the table shows: the drawn rows plus one sort glyph per column.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub body: TableBody,
    pub indicators: Vec<&'static str>,
}

impl TableView {
    /// Builds a fresh view from `records`, nothing of a previous view is kept.
    pub fn render(records: Vec<Record>, schema: &Schema, sort: &SortState) -> Self {
        let body = if records.is_empty() {
            TableBody::Placeholder
        } else {
            TableBody::Rows(records)
        };
        Self {
            body,
            indicators: Self::indicators(schema, Some(sort)),
        }
    }

    pub fn indicators(schema: &Schema, sort: Option<&SortState>) -> Vec<&'static str> {
        (0..schema.len())
            .map(|idx| match sort {
                Some(s) if s.column == idx => match s.direction {
                    SortDirection::Ascending => SORT_ASCENDING,
                    SortDirection::Descending => SORT_DESCENDING,
                },
                _ => "",
            })
            .collect()
    }

    pub fn rows(&self) -> &[Record] {
        match &self.body {
            TableBody::Rows(rows) => rows,
            TableBody::Placeholder => &[],
        }
    }
}

#[derive(Debug, Default)]
pub struct TableUI {
    table_state: TableState,
    header_cells: Vec<Rect>,
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a terminal position onto the header cell of a column.
    pub fn column_at(&self, x: u16, y: u16) -> Option<usize> {
        self.header_cells
            .iter()
            .position(|cell| cell.contains(Position::new(x, y)))
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let status_height = if model.status_message().is_some() {
            STATUS_HEIGHT
        } else {
            0
        };
        let [search_area, status_area, table_area, instructions_area] = Layout::vertical([
            Constraint::Length(SEARCH_HEIGHT),
            Constraint::Length(status_height),
            Constraint::Min(TABLE_CHROME_HEIGHT),
            Constraint::Length(INSTRUCTIONS_HEIGHT),
        ])
        .areas(frame.area());

        self.draw_search(model, frame, search_area);
        if let Some(message) = model.status_message() {
            let message = match model.load_state() {
                LoadState::Failure(_) => message.red(),
                _ => message.yellow(),
            };
            frame.render_widget(Paragraph::new(message), status_area);
        }
        self.draw_table(model, frame, table_area);
        frame.render_widget(Self::instructions(), instructions_area);

        if model.show_help() {
            Self::draw_help(frame);
        }
    }

    fn draw_search(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .title(Line::from(" Search ".bold()))
            .border_set(border::ROUNDED);
        let inner = block.inner(area);
        let input = model.search();
        frame.render_widget(Paragraph::new(input.get()).block(block), area);

        let before_curser: String = input.get().chars().take(input.curser_pos()).collect();
        let x = inner.x + Line::from(before_curser).width() as u16;
        if !model.show_help() {
            frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), inner.y));
        }
    }

    fn draw_table(&mut self, model: &Model, frame: &mut Frame, area: Rect) {
        let schema = model.schema();
        let view = model.table_view();
        let nrows = view.map(|v| v.rows().len()).unwrap_or(0);

        let sorted_by = schema.key(model.sort_state().column).unwrap_or_default();
        let title = Line::from(format!(" Songs ({nrows}), sorted by {sorted_by} ").bold());
        let block = Block::bordered()
            .title(title.centered())
            .border_set(border::THICK);
        let inner = block.inner(area);

        let widths = vec![Constraint::Fill(1); schema.len()];
        let header_line = Rect { height: 1, ..inner };
        self.header_cells = Layout::horizontal(widths.clone())
            .spacing(COLUMN_SPACING)
            .split(header_line)
            .to_vec();

        // Before the first render there are headers but no glyphs.
        let indicators = view
            .map(|v| v.indicators.clone())
            .unwrap_or_else(|| TableView::indicators(schema, None));
        let header = Row::new(schema.keys().iter().zip(indicators).enumerate().map(
            |(idx, (key, glyph))| {
                let style = if idx == model.focused_column() {
                    Style::new().bold().add_modifier(Modifier::UNDERLINED)
                } else {
                    Style::new().bold()
                };
                Cell::from(format!("{key} {glyph}")).style(style)
            },
        ))
        .style(Style::new().cyan());

        let rows = view
            .map(|v| v.rows())
            .unwrap_or(&[])
            .iter()
            .map(|record| {
                Row::new(
                    record
                        .values()
                        .iter()
                        .enumerate()
                        .map(|(idx, v)| Cell::from(v.as_str()).style(cell_style(idx, schema))),
                )
            });

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(COLUMN_SPACING)
            .highlight_spacing(HighlightSpacing::Never)
            .row_highlight_style(Style::new().reversed())
            .block(block);

        self.table_state
            .select(if nrows > 0 { Some(model.selected_row()) } else { None });
        frame.render_stateful_widget(table, area, &mut self.table_state);

        if let Some(TableBody::Placeholder) = view.map(|v| &v.body) {
            let placeholder_area = Rect {
                y: inner.y + 1,
                height: inner.height.saturating_sub(1).min(1),
                ..inner
            };
            frame.render_widget(
                Paragraph::new(PLACEHOLDER_TEXT.italic().dark_gray()).centered(),
                placeholder_area,
            );
        }
    }

    fn instructions() -> Line<'static> {
        Line::from(vec![
            " Sort ".into(),
            "<Enter/F1-F9/Click>".blue().bold(),
            " Column ".into(),
            "<Tab>".blue().bold(),
            " Copy ".into(),
            "<Ctrl-Y>".blue().bold(),
            " Help ".into(),
            "<F10>".blue().bold(),
            " Quit ".into(),
            "<Ctrl-C> ".blue().bold(),
        ])
        .centered()
    }

    fn draw_help(frame: &mut Frame) {
        let lines: Vec<Line> = HELP_TEXT.lines().map(|l| Line::from(Span::raw(l))).collect();
        let height = lines.len() as u16 + 2;
        let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 4;
        let [area] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(frame.area());
        let [area] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(area);
        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
            area,
        );
    }
}

/// The last column holds free-form notes and is drawn dimmed.
fn cell_style(column: usize, schema: &Schema) -> Style {
    if schema.len() > 1 && column + 1 == schema.len() {
        Style::new().dim()
    } else {
        Style::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Message, ViewerConfig};
    use ratatui::{Terminal, backend::TestBackend};

    fn schema() -> Schema {
        Schema::new(["title", "author", "lang", "note"]).unwrap()
    }

    fn record(values: [&str; 4]) -> Record {
        Record::from_values(&schema(), values.iter().map(|v| v.to_string()).collect()).unwrap()
    }

    fn screen(model: &Model, ui: &mut TableUI) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|f| ui.draw(model, f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn model() -> Model {
        let cfg = ViewerConfig::default().columns(schema().keys().to_vec());
        Model::init(&cfg).unwrap()
    }

    #[test]
    fn empty_records_render_placeholder() {
        let view = TableView::render(Vec::new(), &schema(), &SortState::default());
        assert_eq!(view.body, TableBody::Placeholder);
        assert!(view.rows().is_empty());
    }

    #[test]
    fn only_active_column_has_a_glyph() {
        let sort = SortState {
            column: 2,
            direction: SortDirection::Descending,
        };
        let view = TableView::render(vec![record(["a", "b", "c", "d"])], &schema(), &sort);
        assert_eq!(view.indicators, vec!["", "", SORT_DESCENDING, ""]);
        assert_eq!(view.rows().len(), 1);
    }

    #[test]
    fn headers_are_drawn_before_loading_finishes() {
        let model = model();
        let mut ui = TableUI::new();
        let text = screen(&model, &mut ui);
        assert!(text.contains("title"));
        assert!(text.contains("Loading song list"));
        assert!(!text.contains(SORT_ASCENDING));
    }

    #[test]
    fn loaded_rows_are_drawn_in_order() {
        let mut model = model();
        model
            .update(Message::Loaded(Ok("Zed,Amy,EN,\nAce,Bob,EN,\n".into())))
            .unwrap();
        let mut ui = TableUI::new();
        let text = screen(&model, &mut ui);
        let ace = text.find("Ace").unwrap();
        let zed = text.find("Zed").unwrap();
        assert!(ace < zed);
        assert!(text.contains(SORT_ASCENDING));
        assert!(!text.contains("Loading song list"));
    }

    #[test]
    fn header_clicks_map_to_columns() {
        let mut model = model();
        model
            .update(Message::Loaded(Ok("Zed,Amy,EN,\n".into())))
            .unwrap();
        let mut ui = TableUI::new();
        screen(&model, &mut ui);
        let first = ui.header_cells[0];
        let last = ui.header_cells[3];
        assert_eq!(ui.column_at(first.x, first.y), Some(0));
        assert_eq!(ui.column_at(last.x + 1, last.y), Some(3));
        assert_eq!(ui.column_at(first.x, first.y + 1), None);
    }

    #[test]
    fn placeholder_is_drawn_when_nothing_matches() {
        let mut model = model();
        model
            .update(Message::Loaded(Ok("Zed,Amy,EN,\n".into())))
            .unwrap();
        for c in "qqq".chars() {
            model
                .update(Message::SearchKey(ratatui::crossterm::event::KeyEvent::from(
                    ratatui::crossterm::event::KeyCode::Char(c),
                )))
                .unwrap();
        }
        let mut ui = TableUI::new();
        let text = screen(&model, &mut ui);
        assert!(text.contains(PLACEHOLDER_TEXT));
        assert!(!text.contains("Zed"));
    }

    #[test]
    fn notes_column_is_dimmed() {
        let mut model = model();
        model
            .update(Message::Loaded(Ok("Ace,Bob,EN,solo\nZed,Amy,EN,ballad\n".into())))
            .unwrap();
        let mut ui = TableUI::new();
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|f| ui.draw(&model, f)).unwrap();
        let buffer = terminal.backend().buffer();

        let find = |text: &str| {
            let first = text.chars().next().unwrap().to_string();
            (0..buffer.area.height)
                .flat_map(|y| (0..buffer.area.width).map(move |x| (x, y)))
                .find(|&(x, y)| {
                    x as usize + text.len() <= buffer.area.width as usize
                        && buffer[(x, y)].symbol() == first
                        && text.chars().enumerate().all(|(i, c)| {
                            buffer[(x + i as u16, y)].symbol() == c.to_string()
                        })
                })
                .unwrap()
        };
        assert!(buffer[find("ballad")].modifier.contains(Modifier::DIM));
        assert!(!buffer[find("Zed")].modifier.contains(Modifier::DIM));
        assert!(!buffer[find("Amy")].modifier.contains(Modifier::DIM));
    }
}
