//! Clipboard text interchange.
//!
//! The wire format is the common spreadsheet convention: row-major
//! rectangle, tabs between cells, newlines between rows, cells as their
//! display strings.

use feathergrid_core::Selection;
use feathergrid_engine::table::Table;

/// Encode a rectangular selection for the system clipboard.
/// Cells outside the table render as empty strings.
pub fn copy_range(table: &Table, selection: &Selection) -> String {
    let mut out = String::new();
    for row in selection.start().row..=selection.end().row {
        if row != selection.start().row {
            out.push('\n');
        }
        for col in selection.start().col..=selection.end().col {
            if col != selection.start().col {
                out.push('\t');
            }
            out.push_str(&table.display(row, col));
        }
    }
    out
}

/// Split clipboard text into a rectangle of cell strings.
///
/// Tolerates `\r\n` line endings and one trailing newline (most
/// spreadsheet applications append one). Returns no rows for empty text.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    let text = text.strip_suffix('\r').unwrap_or(text);
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .map(|line| {
            line.strip_suffix('\r')
                .unwrap_or(line)
                .split('\t')
                .map(str::to_string)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use feathergrid_core::CellRef;
    use feathergrid_engine::column::Column;
    use feathergrid_engine::value::{CellValue, ColumnType};

    fn table() -> Table {
        Table::new(vec![
            Column::from_values(
                "age",
                ColumnType::Integer,
                vec![CellValue::Int(1), CellValue::Int(2)],
            )
            .unwrap(),
            Column::from_values(
                "name",
                ColumnType::Text,
                vec![CellValue::Text("ada".into()), CellValue::Null],
            )
            .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_copy_full_table() {
        let table = table();
        let selection = Selection::new(CellRef::new(0, 0), CellRef::new(1, 1));
        assert_eq!(copy_range(&table, &selection), "1\tada\n2\t");
    }

    #[test]
    fn test_copy_single_cell() {
        let table = table();
        let selection = Selection::single(CellRef::new(0, 1));
        assert_eq!(copy_range(&table, &selection), "ada");
    }

    #[test]
    fn test_parse_plain_rectangle() {
        assert_eq!(
            parse("1\tada\n2\tgrace"),
            vec![
                vec!["1".to_string(), "ada".to_string()],
                vec!["2".to_string(), "grace".to_string()],
            ]
        );
    }

    #[test]
    fn test_parse_tolerates_crlf_and_trailing_newline() {
        assert_eq!(
            parse("a\tb\r\nc\td\r\n"),
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string(), "d".to_string()],
            ]
        );
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(parse("").is_empty());
        assert!(parse("\n").is_empty());
    }

    #[test]
    fn test_parse_keeps_empty_cells() {
        assert_eq!(
            parse("a\t\tc"),
            vec![vec!["a".to_string(), String::new(), "c".to_string()]]
        );
    }

    #[test]
    fn test_copy_parse_round_trip() {
        let table = table();
        let selection = Selection::new(CellRef::new(0, 0), CellRef::new(1, 1));
        let text = copy_range(&table, &selection);
        let parsed = parse(&text);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], vec!["1".to_string(), "ada".to_string()]);
        assert_eq!(parsed[1], vec!["2".to_string(), String::new()]);
    }
}
