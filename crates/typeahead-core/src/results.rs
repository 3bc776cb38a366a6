use crate::{Item, TypeaheadError};

/// The ordered suggestions from the most recent applied lookup, plus the
/// selected index into them.
///
/// `current` is `None` when nothing is selected and is always a valid index
/// into `items` otherwise.
#[derive(Debug, Clone, Default)]
pub struct ResultList {
    items: Vec<Item>,
    current: Option<usize>,
}

impl ResultList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a fresh list. The selection starts on the first item when
    /// `select_first` is set and there is one, and is empty otherwise.
    pub fn replace(&mut self, items: Vec<Item>, select_first: bool) {
        self.current = if select_first && !items.is_empty() {
            Some(0)
        } else {
            None
        };
        self.items = items;
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.current = None;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item_at(&self, index: usize) -> Result<&Item, TypeaheadError> {
        self.items.get(index).ok_or(TypeaheadError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// The currently selected item, if any.
    pub fn selected(&self) -> Option<&Item> {
        self.current.and_then(|i| self.items.get(i))
    }

    pub(crate) fn select(&mut self, index: Option<usize>) -> Result<(), TypeaheadError> {
        if let Some(i) = index {
            self.item_at(i)?;
        }
        self.current = index;
        Ok(())
    }
}
