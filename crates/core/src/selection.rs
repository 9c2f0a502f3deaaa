use serde::{Deserialize, Serialize};

use crate::cell_ref::CellRef;

/// A rectangular cell range, stored normalized (start is the top-left
/// corner, end the bottom-right, both inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    start: CellRef,
    end: CellRef,
}

impl Selection {
    /// Build a selection from any two corners.
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    pub fn single(cell: CellRef) -> Self {
        Self { start: cell, end: cell }
    }

    pub fn start(&self) -> CellRef {
        self.start
    }

    pub fn end(&self) -> CellRef {
        self.end
    }

    pub fn n_rows(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    pub fn n_cols(&self) -> usize {
        self.end.col - self.start.col + 1
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        cell.row >= self.start.row
            && cell.row <= self.end.row
            && cell.col >= self.start.col
            && cell.col <= self.end.col
    }

    /// Iterate cells in row-major order (the clipboard convention).
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        let (start, end) = (self.start, self.end);
        (start.row..=end.row)
            .flat_map(move |row| (start.col..=end.col).map(move |col| CellRef::new(row, col)))
    }
}
