//! Vela driver
//!
//! Loads parsed programs from disk, resolves the modules they import
//! from search directories and renders diagnostics for the `vela` binary.

pub mod loader;
pub mod render;

pub use loader::{read_program, FileLoader, LoadError};
pub use render::{build_report, error_code, print_diagnostic, SourceCache};
