use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// One line editor backing the search bar. The cursor counts chars, not bytes.
#[derive(Debug, Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize,
}

impl Inputter {
    /// Applies an editing key, returns true if the text changed.
    pub fn read(&mut self, key: KeyEvent) -> bool {
        let changed = match (key.code, key.modifiers) {
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => {
                self.curser_pos = self.curser_pos.saturating_sub(1);
                false
            }
            (KeyCode::Right, _) => {
                if self.curser_pos < self.current_input.chars().count() {
                    self.curser_pos += 1;
                }
                false
            }
            (KeyCode::Char(chr), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                self.current_input.insert(self.bytepos(self.curser_pos), chr);
                self.curser_pos += 1;
                true
            }
            _ => false,
        };
        trace!("Search input {:?}, curser {}", self.current_input, self.curser_pos);
        changed
    }

    pub fn get(&self) -> &str {
        &self.current_input
    }

    pub fn curser_pos(&self) -> usize {
        self.curser_pos
    }

    pub fn clear(&mut self) {
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn backspace(&mut self) -> bool {
        if self.curser_pos == 0 {
            return false;
        }
        self.curser_pos -= 1;
        self.current_input.remove(self.bytepos(self.curser_pos));
        true
    }

    fn delete(&mut self) -> bool {
        if self.curser_pos >= self.current_input.chars().count() {
            return false;
        }
        self.current_input.remove(self.bytepos(self.curser_pos));
        true
    }

    fn bytepos(&self, char_pos: usize) -> usize {
        self.current_input
            .char_indices()
            .nth(char_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}
