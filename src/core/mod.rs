//! Analysis core: everything that reads a document and derives structure from it.
//!
//! - [`address`] - A1 notation codec
//! - [`reader`] - cell snapshots, guarded range reads and writes
//! - [`references`] - reference tokens in formula text
//! - [`graph`] - precedents, dependents and evaluation order
//! - [`structure`] - input / intermediate / output classification
//! - [`diagnostics`] - error catalog, detection and explanations
//! - [`stats`] - aggregates, outliers and duplicates

pub mod address;
pub mod diagnostics;
pub mod graph;
pub mod reader;
pub mod references;
pub mod stats;
pub mod structure;

pub use address::{parse_address, parse_range, CellAddress, CellRange};
pub use graph::DependencyGraph;
pub use reader::{CellReader, CellWriter};
