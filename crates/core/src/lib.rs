// Framework-agnostic grid position types shared by the engine, io and cli.

pub mod cell_ref;
pub mod selection;

pub use cell_ref::CellRef;
pub use selection::Selection;
