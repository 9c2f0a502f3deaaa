//! Case-insensitive cell search ("Find" / "Find Next").

use feathergrid_core::CellRef;

use crate::table::Table;

/// Find the first cell whose display string contains `needle`
/// (case-insensitive), scanning row-major strictly after `after`, wrapping
/// around to the start once. `None` for an empty needle or no match.
pub fn find_next(table: &Table, needle: &str, after: Option<CellRef>) -> Option<CellRef> {
    let (rows, cols) = (table.n_rows(), table.n_cols());
    if needle.is_empty() || rows == 0 || cols == 0 {
        return None;
    }
    let needle = needle.to_lowercase();
    let total = rows * cols;
    let start = match after {
        Some(cell) => cell.linear_index(cols) + 1,
        None => 0,
    };

    for offset in 0..total {
        let idx = (start + offset) % total;
        let cell = CellRef::new(idx / cols, idx % cols);
        if table
            .display(cell.row, cell.col)
            .to_lowercase()
            .contains(&needle)
        {
            return Some(cell);
        }
    }
    None
}

/// All matching cells in row-major order.
pub fn find_all(table: &Table, needle: &str) -> Vec<CellRef> {
    if needle.is_empty() {
        return Vec::new();
    }
    let needle = needle.to_lowercase();
    let mut hits = Vec::new();
    for row in 0..table.n_rows() {
        for col in 0..table.n_cols() {
            if table.display(row, col).to_lowercase().contains(&needle) {
                hits.push(CellRef::new(row, col));
            }
        }
    }
    hits
}
