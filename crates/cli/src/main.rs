// FeatherGrid CLI - headless table operations on Feather files

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use feathergrid_config::Settings;
use feathergrid_core::{CellRef, Selection};
use feathergrid_engine::session::Session;
use feathergrid_engine::table::Table;
use feathergrid_engine::value::ColumnType;
use feathergrid_io::{clipboard, feather};

use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "fgrid")]
#[command(about = "Feather table viewer/editor (CLI mode, headless)")]
#[command(version)]
struct Cli {
    /// Feather file to open (shorthand for `fgrid info <file>`)
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the table schema: column names, types, row and null counts
    Info {
        file: PathBuf,

        /// Machine-readable output
        #[arg(long)]
        json: bool,
    },

    /// Print the first rows, tab-separated, with a header line
    Head {
        file: PathBuf,

        /// Number of rows to print
        #[arg(short = 'n', long = "rows", default_value_t = 10)]
        rows: usize,
    },

    /// Edit one cell and save the file
    #[command(after_help = "\
Examples:
  fgrid set data.feather 0 age 42
  fgrid set data.feather 3 name 'Ada Lovelace' -o edited.feather
  fgrid set data.feather 1 2 '' # clear the cell")]
    Set {
        file: PathBuf,

        /// Row index (0-based)
        row: usize,

        /// Column name or 0-based index
        column: String,

        /// New value, parsed against the column's type; empty clears
        value: String,

        /// Write here instead of back to the input file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a column to a new type and save the file
    #[command(after_help = "\
Types: integer, float, text, boolean, datetime, categorical
Cells with no representation in the new type become null and are listed.")]
    Convert {
        file: PathBuf,

        /// Column name or 0-based index
        column: String,

        /// Target type
        #[arg(value_name = "TYPE")]
        new_type: String,

        /// Write here instead of back to the input file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the whole table as clipboard-style TSV on stdout
    Export { file: PathBuf },

    /// List cells containing the given text (case-insensitive)
    Search { file: PathBuf, needle: String },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let code = match cli.command {
        Some(command) => run_command(command),
        None => open_default(cli.file.as_deref()),
    };
    ExitCode::from(code)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_command(command: Commands) -> u8 {
    match command {
        Commands::Info { file, json } => cmd_info(&file, json),
        Commands::Head { file, rows } => cmd_head(&file, rows),
        Commands::Set {
            file,
            row,
            column,
            value,
            output,
        } => cmd_set(&file, row, &column, &value, output.as_deref()),
        Commands::Convert {
            file,
            column,
            new_type,
            output,
        } => cmd_convert(&file, &column, &new_type, output.as_deref()),
        Commands::Export { file } => cmd_export(&file),
        Commands::Search { file, needle } => cmd_search(&file, &needle),
    }
}

/// `fgrid [FILE]` with no subcommand: open and describe the file, or
/// start with an empty table when there is nothing to open. A file that
/// fails to load is a user-visible error, not a crash.
fn open_default(file: Option<&Path>) -> u8 {
    let Some(path) = file else {
        let settings = Settings::load();
        match settings.last_file {
            Some(last) => println!("no file given (last opened: {})", last.display()),
            None => println!("no file given; starting with an empty table"),
        }
        print_schema(&Table::empty());
        return EXIT_SUCCESS;
    };

    match feather::read(path) {
        Ok(table) => {
            let mut settings = Settings::load();
            settings.last_file = Some(path.to_path_buf());
            if let Err(e) = settings.save() {
                tracing::debug!("could not persist settings: {e}");
            }
            print_schema(&table);
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("error: cannot open {}: {e}", path.display());
            eprintln!("starting with an empty table");
            print_schema(&Table::empty());
            EXIT_IO
        }
    }
}

fn load(path: &Path) -> Result<Table, u8> {
    feather::read(path).map_err(|e| {
        eprintln!("error: cannot open {}: {e}", path.display());
        EXIT_IO
    })
}

fn save(path: &Path, table: &Table) -> Result<(), u8> {
    feather::write(path, table).map_err(|e| {
        eprintln!("error: cannot write {}: {e}", path.display());
        EXIT_IO
    })
}

fn print_schema(table: &Table) {
    println!("{} rows x {} columns", table.n_rows(), table.n_cols());
    for column in table.columns() {
        println!(
            "  {}  {}  ({} null)",
            column.name,
            column.column_type(),
            column.null_count()
        );
    }
}

fn cmd_info(file: &Path, json: bool) -> u8 {
    let table = match load(file) {
        Ok(table) => table,
        Err(code) => return code,
    };
    if json {
        let columns: Vec<serde_json::Value> = table
            .columns()
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name,
                    "type": c.column_type().as_str(),
                    "nulls": c.null_count(),
                })
            })
            .collect();
        let out = serde_json::json!({
            "rows": table.n_rows(),
            "columns": columns,
        });
        println!("{out}");
    } else {
        print_schema(&table);
    }
    EXIT_SUCCESS
}

fn cmd_head(file: &Path, rows: usize) -> u8 {
    let table = match load(file) {
        Ok(table) => table,
        Err(code) => return code,
    };
    println!("{}", header_line(&table));
    let limit = rows.min(table.n_rows());
    if limit > 0 {
        let selection = Selection::new(
            CellRef::new(0, 0),
            CellRef::new(limit - 1, table.n_cols().saturating_sub(1)),
        );
        println!("{}", clipboard::copy_range(&table, &selection));
    }
    EXIT_SUCCESS
}

fn cmd_set(file: &Path, row: usize, column: &str, value: &str, output: Option<&Path>) -> u8 {
    let table = match load(file) {
        Ok(table) => table,
        Err(code) => return code,
    };
    let col = match resolve_column(&table, column) {
        Ok(col) => col,
        Err(message) => {
            eprintln!("error: {message}");
            return EXIT_USAGE;
        }
    };

    let mut session = Session::new();
    session.load(table);
    if let Err(e) = session.set_cell_text(row, col, value) {
        eprintln!("error: {e}");
        return EXIT_ERROR;
    }

    let target = output.unwrap_or(file);
    if save(target, &session.export()).is_err() {
        return EXIT_IO;
    }
    println!(
        "set ({row}, {col}) = '{}' -> {}",
        session.table().display(row, col),
        target.display()
    );
    EXIT_SUCCESS
}

fn cmd_convert(file: &Path, column: &str, new_type: &str, output: Option<&Path>) -> u8 {
    let table = match load(file) {
        Ok(table) => table,
        Err(code) => return code,
    };
    let col = match resolve_column(&table, column) {
        Ok(col) => col,
        Err(message) => {
            eprintln!("error: {message}");
            return EXIT_USAGE;
        }
    };
    let new_type: ColumnType = match new_type.parse() {
        Ok(ty) => ty,
        Err(message) => {
            eprintln!("error: {message}");
            return EXIT_USAGE;
        }
    };

    let mut session = Session::new();
    session.load(table);
    let report = match session.convert_column(col, new_type) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_ERROR;
        }
    };

    let target = output.unwrap_or(file);
    if save(target, &session.export()).is_err() {
        return EXIT_IO;
    }
    println!(
        "converted column '{}' from {} to {}: {} cells",
        session.table().column(col).map(|c| c.name.as_str()).unwrap_or(column),
        report.from,
        report.to,
        report.converted
    );
    for row in &report.failed_rows {
        println!("  row {row}: no {} representation, now null", report.to);
    }
    EXIT_SUCCESS
}

fn cmd_export(file: &Path) -> u8 {
    let table = match load(file) {
        Ok(table) => table,
        Err(code) => return code,
    };
    if table.n_rows() > 0 && table.n_cols() > 0 {
        let selection = Selection::new(
            CellRef::new(0, 0),
            CellRef::new(table.n_rows() - 1, table.n_cols() - 1),
        );
        println!("{}", clipboard::copy_range(&table, &selection));
    }
    EXIT_SUCCESS
}

fn cmd_search(file: &Path, needle: &str) -> u8 {
    let table = match load(file) {
        Ok(table) => table,
        Err(code) => return code,
    };
    let mut session = Session::new();
    session.load(table);

    let hits = session.find_all(needle);
    for hit in &hits {
        println!(
            "({}, {}) {}: {}",
            hit.row,
            hit.col,
            session
                .table()
                .column(hit.col)
                .map(|c| c.name.as_str())
                .unwrap_or("?"),
            session.table().display(hit.row, hit.col)
        );
    }
    println!("{} match(es)", hits.len());
    EXIT_SUCCESS
}

/// Resolve a column given by name or by 0-based index.
fn resolve_column(table: &Table, column: &str) -> Result<usize, String> {
    if let Some(col) = table.column_index(column) {
        return Ok(col);
    }
    if let Ok(col) = column.parse::<usize>() {
        if col < table.n_cols() {
            return Ok(col);
        }
        return Err(format!(
            "column index {col} out of range (table has {} columns)",
            table.n_cols()
        ));
    }
    Err(format!("no column named '{column}'"))
}

fn header_line(table: &Table) -> String {
    table
        .columns()
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join("\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use feathergrid_engine::column::Column;
    use feathergrid_engine::value::CellValue;

    fn table() -> Table {
        Table::new(vec![
            Column::from_values("age", ColumnType::Integer, vec![CellValue::Int(1)]).unwrap(),
            Column::from_values("name", ColumnType::Text, vec![CellValue::Null]).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_column_by_name_then_index() {
        let table = table();
        assert_eq!(resolve_column(&table, "name"), Ok(1));
        assert_eq!(resolve_column(&table, "0"), Ok(0));
        assert!(resolve_column(&table, "2").is_err());
        assert!(resolve_column(&table, "salary").is_err());
    }

    #[test]
    fn test_header_line_is_tab_separated() {
        assert_eq!(header_line(&table()), "age\tname");
    }
}
