//! Keyboard navigation over a [`ResultList`].
//!
//! Neither direction wraps straight around: stepping off either end lands on
//! "no selection" first, and only the next press re-enters the list.

use crate::results::ResultList;

/// Directional input understood by the navigator. Everything else is
/// [`Key::Other`] and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Other,
}

/// Where the selection stands relative to the current list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    Unselected,
    Selected(usize),
}

impl SelectionState {
    pub fn of(list: &ResultList) -> Self {
        match list.current() {
            _ if list.is_empty() => SelectionState::Empty,
            None => SelectionState::Unselected,
            Some(i) => SelectionState::Selected(i),
        }
    }
}

/// Selection after pressing Up in a list of `len` items.
pub fn up(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return current;
    }
    match current {
        None => Some(len - 1),
        Some(0) => None,
        Some(i) => Some(i - 1),
    }
}

/// Selection after pressing Down in a list of `len` items.
pub fn down(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return current;
    }
    match current {
        None => Some(0),
        Some(i) if i + 1 < len => Some(i + 1),
        Some(_) => None,
    }
}

impl ResultList {
    /// Apply a key press. Returns `true` if the selection moved.
    pub fn navigate(&mut self, key: Key) -> bool {
        let before = self.current();
        let after = match key {
            Key::Up => up(before, self.len()),
            Key::Down => down(before, self.len()),
            Key::Other => return false,
        };
        if after == before {
            return false;
        }
        // `up`/`down` only produce indices below `len`.
        self.select(after).is_ok()
    }
}
