//! Change notifications emitted by the session.
//!
//! The presentation layer drains these after each request instead of the
//! model reaching into view state; the same drain-and-filter shape is
//! what the tests assert against.

use crate::value::ColumnType;

/// Events produced by session mutations, in application order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// One cell's value changed (edit, paste, undo or redo).
    CellChanged { row: usize, col: usize },

    /// A column was converted to a new type (or a conversion was undone).
    ColumnTypeChanged { col: usize, new_type: ColumnType },

    /// The table was replaced wholesale from a file load.
    TableReloaded,
}

/// Event sink for tests: collects drained events and filters by kind.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<ChangeEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = ChangeEvent>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn cells_changed(&self) -> Vec<(usize, usize)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ChangeEvent::CellChanged { row, col } => Some((*row, *col)),
                _ => None,
            })
            .collect()
    }

    pub fn columns_changed(&self) -> Vec<(usize, ColumnType)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ChangeEvent::ColumnTypeChanged { col, new_type } => Some((*col, *new_type)),
                _ => None,
            })
            .collect()
    }

    pub fn reload_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ChangeEvent::TableReloaded))
            .count()
    }
}
