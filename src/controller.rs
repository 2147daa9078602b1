use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::domain::{Message, SongListError, ViewerConfig};
use crate::model::Model;
use crate::ui::TableUI;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &ViewerConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    /// Waits up to the poll time for one terminal event.
    pub fn handle_event(&self, model: &Model, ui: &TableUI) -> Result<Option<Message>, SongListError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        let message = match event::read()? {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                Self::handle_key(key, model.show_help())
            }
            Event::Mouse(mouse) => Self::handle_mouse(mouse, ui),
            Event::Resize(width, height) => Some(Message::Resize(width as usize, height as usize)),
            _ => None,
        };
        Ok(message)
    }

    fn handle_key(key: KeyEvent, help_visible: bool) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c') | KeyCode::Char('q'), KeyModifiers::CONTROL) => Some(Message::Quit),
            _ if help_visible => Some(Message::Exit),
            (KeyCode::Char('y'), KeyModifiers::CONTROL) => Some(Message::CopyRow),
            (KeyCode::Esc, _) => Some(Message::ClearSearch),
            (KeyCode::Up, _) => Some(Message::MoveUp),
            (KeyCode::Down, _) => Some(Message::MoveDown),
            (KeyCode::PageUp, _) => Some(Message::MovePageUp),
            (KeyCode::PageDown, _) => Some(Message::MovePageDown),
            (KeyCode::Home, _) => Some(Message::MoveBeginning),
            (KeyCode::End, _) => Some(Message::MoveEnd),
            (KeyCode::Tab, _) => Some(Message::FocusRight),
            (KeyCode::BackTab, _) => Some(Message::FocusLeft),
            (KeyCode::Enter, _) => Some(Message::ClickFocused),
            (KeyCode::F(10), _) => Some(Message::Help),
            (KeyCode::F(n @ 1..=9), _) => Some(Message::ClickHeader(n as usize - 1)),
            _ => Some(Message::SearchKey(key)),
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    fn handle_mouse(mouse: MouseEvent, ui: &TableUI) -> Option<Message> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => ui
                .column_at(mouse.column, mouse.row)
                .map(Message::ClickHeader),
            MouseEventKind::ScrollDown => Some(Message::MoveDown),
            MouseEventKind::ScrollUp => Some(Message::MoveUp),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Option<Message> {
        Controller::handle_key(KeyEvent::new(code, modifiers), false)
    }

    #[test]
    fn printable_keys_edit_the_search() {
        assert!(matches!(
            press(KeyCode::Char('q'), KeyModifiers::NONE),
            Some(Message::SearchKey(_))
        ));
        assert!(matches!(
            press(KeyCode::Backspace, KeyModifiers::NONE),
            Some(Message::SearchKey(_))
        ));
    }

    #[test]
    fn function_keys_click_headers() {
        assert!(matches!(
            press(KeyCode::F(1), KeyModifiers::NONE),
            Some(Message::ClickHeader(0))
        ));
        assert!(matches!(
            press(KeyCode::F(4), KeyModifiers::NONE),
            Some(Message::ClickHeader(3))
        ));
        assert!(matches!(press(KeyCode::F(10), KeyModifiers::NONE), Some(Message::Help)));
    }

    #[test]
    fn control_chords() {
        assert!(matches!(press(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(Message::Quit)));
        assert!(matches!(press(KeyCode::Char('y'), KeyModifiers::CONTROL), Some(Message::CopyRow)));
        assert!(matches!(press(KeyCode::Esc, KeyModifiers::NONE), Some(Message::ClearSearch)));
    }

    #[test]
    fn any_key_closes_help() {
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert!(matches!(Controller::handle_key(key, true), Some(Message::Exit)));
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(matches!(Controller::handle_key(key, true), Some(Message::Quit)));
    }

    #[test]
    fn clicks_outside_headers_are_ignored() {
        let ui = TableUI::new();
        let mouse = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        };
        assert!(Controller::handle_mouse(mouse, &ui).is_none());
    }
}
