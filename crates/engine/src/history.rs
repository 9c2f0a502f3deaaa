//! Bounded undo/redo log for table edits.

use feathergrid_core::CellRef;

use crate::column::Column;
use crate::value::CellValue;

/// How many edit records are retained. Oldest records are evicted first
/// once the log is full; evicted edits can no longer be undone.
pub const MAX_ENTRIES: usize = 30;

/// One cell's before/after values.
#[derive(Debug, Clone, PartialEq)]
pub struct CellChange {
    pub cell: CellRef,
    pub old: CellValue,
    pub new: CellValue,
}

/// A single undoable step.
///
/// A paste of many cells is one `Cells` record; a whole-column type
/// conversion is one `Column` record holding both column snapshots, so
/// either kind reverses in a single undo.
#[derive(Debug, Clone, PartialEq)]
pub enum EditRecord {
    Cells(Vec<CellChange>),
    Column {
        col: usize,
        before: Column,
        after: Column,
    },
}

/// Undo/redo stacks with a retention cap.
///
/// The boundary between the two stacks is the history cursor: everything
/// on the undo stack is behind it, everything on the redo stack ahead of
/// it. Recording a new edit discards the redo stack, so branched history
/// is never preserved.
#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<EditRecord>,
    redo_stack: Vec<EditRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record at the cursor. Anything redoable is discarded
    /// first; the oldest record is evicted past the cap.
    pub fn record(&mut self, record: EditRecord) {
        self.redo_stack.clear();
        self.undo_stack.push(record);
        if self.undo_stack.len() > MAX_ENTRIES {
            self.undo_stack.remove(0);
        }
    }

    /// Step the cursor back, handing the caller the record to reverse.
    /// No-op (`None`) when nothing is undoable.
    pub fn undo(&mut self) -> Option<EditRecord> {
        let record = self.undo_stack.pop()?;
        self.redo_stack.push(record.clone());
        Some(record)
    }

    /// Step the cursor forward, handing the caller the record to reapply.
    pub fn redo(&mut self) -> Option<EditRecord> {
        let record = self.redo_stack.pop()?;
        self.undo_stack.push(record.clone());
        Some(record)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Total records retained on both sides of the cursor.
    pub fn len(&self) -> usize {
        self.undo_stack.len() + self.redo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
