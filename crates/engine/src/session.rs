//! The editing session: the one open table, its history, and the change
//! events the shell drains after each request.
//!
//! All mutation goes through `Session` so every change is recorded
//! uniformly. Operations either fully succeed (and record history) or
//! fully fail leaving the table untouched. The `&mut self` discipline is
//! the concurrency model: an edit can never overlap a load or an
//! `export` snapshot.

use feathergrid_core::CellRef;

use crate::coerce;
use crate::column::Column;
use crate::error::{Error, Result};
use crate::events::ChangeEvent;
use crate::history::{CellChange, EditRecord, History};
use crate::search;
use crate::table::Table;
use crate::value::{CellValue, ColumnType};

/// Outcome of a whole-column conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub col: usize,
    pub from: ColumnType,
    pub to: ColumnType,
    /// Cells that produced a value in the target type.
    pub converted: usize,
    /// Rows whose value had no representation and became null.
    pub failed_rows: Vec<usize>,
}

impl ConversionReport {
    pub fn is_clean(&self) -> bool {
        self.failed_rows.is_empty()
    }
}

/// Outcome of a clipboard paste.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PasteOutcome {
    /// Cells written (after clipping and parsing).
    pub applied: usize,
    /// Cells dropped: outside the table, or text that did not parse.
    pub skipped: usize,
}

/// The single open file's editing state.
#[derive(Debug, Default)]
pub struct Session {
    table: Table,
    history: History,
    events: Vec<ChangeEvent>,
    dirty: bool,
}

impl Session {
    /// A session over an empty table (the welcome-screen state).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn get_cell(&self, row: usize, col: usize) -> Result<CellValue> {
        self.table.get_cell(row, col)
    }

    /// Edit one cell. Validates against the column type, records a
    /// single-cell edit, emits `CellChanged`. Writing the value already
    /// present records nothing.
    pub fn set_cell(&mut self, row: usize, col: usize, value: CellValue) -> Result<()> {
        if self.table.get_cell(row, col)? == value {
            return Ok(());
        }
        let old = self.table.set_cell(row, col, value.clone())?;
        self.history.record(EditRecord::Cells(vec![CellChange {
            cell: CellRef::new(row, col),
            old,
            new: value,
        }]));
        self.events.push(ChangeEvent::CellChanged { row, col });
        self.dirty = true;
        Ok(())
    }

    /// Edit one cell from raw editor input, coercing the text through the
    /// column's type first. Empty input clears the cell.
    pub fn set_cell_text(&mut self, row: usize, col: usize, raw: &str) -> Result<()> {
        // bounds first, so a bad reference reports as such
        self.table.get_cell(row, col)?;
        let column = self.table.column(col)?;
        let value = coerce::parse_text(raw, column.column_type()).ok_or_else(|| {
            Error::TypeMismatch {
                column: column.name.clone(),
                expected: column.column_type(),
                got: raw.to_string(),
            }
        })?;
        self.set_cell(row, col, value)
    }

    /// Apply a clipboard rectangle starting at `start`, row-major.
    /// Cells beyond the table edge and cells whose text does not parse
    /// are skipped; everything applied becomes ONE undoable step.
    pub fn paste(&mut self, start: CellRef, rows: &[Vec<String>]) -> PasteOutcome {
        let mut outcome = PasteOutcome::default();
        let mut changes = Vec::new();

        for (r_off, row_texts) in rows.iter().enumerate() {
            for (c_off, text) in row_texts.iter().enumerate() {
                let row = start.row + r_off;
                let col = start.col + c_off;
                let Ok(old) = self.table.get_cell(row, col) else {
                    outcome.skipped += 1;
                    continue;
                };
                let column_type = self
                    .table
                    .column_type(col)
                    .expect("column exists: get_cell succeeded");
                let Some(value) = coerce::parse_text(text, column_type) else {
                    outcome.skipped += 1;
                    continue;
                };
                if old == value {
                    continue;
                }
                // bounds and fit are already established
                self.table
                    .set_cell(row, col, value.clone())
                    .expect("paste target validated");
                changes.push(CellChange {
                    cell: CellRef::new(row, col),
                    old,
                    new: value,
                });
                self.events.push(ChangeEvent::CellChanged { row, col });
                outcome.applied += 1;
            }
        }

        if !changes.is_empty() {
            self.history.record(EditRecord::Cells(changes));
            self.dirty = true;
        }
        outcome
    }

    /// Convert a whole column to a new type, best-effort: cells with no
    /// representation in the target become null and are reported by row.
    /// The change is one undoable step. Identity conversion is a complete
    /// no-op; an unsupported pair fails up front without touching state.
    pub fn convert_column(&mut self, col: usize, new_type: ColumnType) -> Result<ConversionReport> {
        let column = self.table.column(col)?;
        let from = column.column_type();
        let mut report = ConversionReport {
            col,
            from,
            to: new_type,
            converted: 0,
            failed_rows: Vec::new(),
        };
        if from == new_type {
            return Ok(report);
        }
        if !coerce::supported(from, new_type) {
            return Err(Error::UnsupportedConversion {
                from,
                to: new_type,
            });
        }

        let mut values = Vec::with_capacity(column.len());
        for (row, value) in column.values().enumerate() {
            match coerce::coerce(&value, new_type)? {
                Some(converted) => {
                    if !converted.is_null() {
                        report.converted += 1;
                    }
                    values.push(converted);
                }
                None => {
                    report.failed_rows.push(row);
                    values.push(CellValue::Null);
                }
            }
        }

        let after = Column::from_values(column.name.clone(), new_type, values)?;
        let before = self.table.replace_column(col, after.clone())?;
        self.history.record(EditRecord::Column { col, before, after });
        self.events.push(ChangeEvent::ColumnTypeChanged { col, new_type });
        self.dirty = true;
        Ok(report)
    }

    /// Reverse the most recent edit. Returns false when there is nothing
    /// to undo (silent no-op).
    pub fn undo(&mut self) -> bool {
        let Some(record) = self.history.undo() else {
            return false;
        };
        match record {
            EditRecord::Cells(changes) => {
                // reverse application order, so overlapping edits unwind
                for change in changes.iter().rev() {
                    self.restore_cell(change.cell, change.old.clone());
                }
            }
            EditRecord::Column { col, before, .. } => self.restore_column(col, before),
        }
        self.dirty = true;
        true
    }

    /// Reapply the most recently undone edit.
    pub fn redo(&mut self) -> bool {
        let Some(record) = self.history.redo() else {
            return false;
        };
        match record {
            EditRecord::Cells(changes) => {
                for change in &changes {
                    self.restore_cell(change.cell, change.new.clone());
                }
            }
            EditRecord::Column { col, after, .. } => self.restore_column(col, after),
        }
        self.dirty = true;
        true
    }

    fn restore_cell(&mut self, cell: CellRef, value: CellValue) {
        // History is LIFO, so the column's type at this point is the one
        // the record was taken against.
        self.table
            .set_cell(cell.row, cell.col, value)
            .expect("history record references a live cell");
        self.events.push(ChangeEvent::CellChanged {
            row: cell.row,
            col: cell.col,
        });
    }

    fn restore_column(&mut self, col: usize, column: Column) {
        let new_type = column.column_type();
        self.table
            .replace_column(col, column)
            .expect("history record references a live column");
        self.events.push(ChangeEvent::ColumnTypeChanged { col, new_type });
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Replace the table wholesale (a fresh file load). A freshly loaded
    /// file has no history and no pending changes.
    pub fn load(&mut self, table: Table) {
        self.table = table;
        self.history.clear();
        self.events.push(ChangeEvent::TableReloaded);
        self.dirty = false;
    }

    /// Snapshot for the persistence adapter. The caller may hand this to
    /// a background save; the session keeps editing its own copy.
    pub fn export(&self) -> Table {
        self.table.clone()
    }

    /// Edits made since the last load or `mark_saved`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Drain the change notifications accumulated since the last drain.
    pub fn take_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn find_next(&self, needle: &str, after: Option<CellRef>) -> Option<CellRef> {
        search::find_next(&self.table, needle, after)
    }

    pub fn find_all(&self, needle: &str) -> Vec<CellRef> {
        search::find_all(&self.table, needle)
    }
}
