/// Everything the UI can be asked to do, independent of which terminal
/// event asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// Append a character to the query.
    Input(char),
    /// Delete the last character of the query.
    Backspace,
    /// Clear the query, or quit if it is already empty.
    Escape,
    MoveUp,
    MoveDown,
    /// Choose the selected suggestion.
    Commit,
    /// Re-run the lookup for the current query.
    Retry,
    /// Drop the most recently chosen item from the extracts list.
    RemoveLastExtract,
    HoverAt(u16, u16),
    ClickAt(u16, u16),
    Resize(u16, u16),
    Tick,
    None,
}
