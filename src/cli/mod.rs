//! CLI command handlers

pub mod commands;

pub use commands::{
    dependents, duplicates, errors, explain, formulas, outliers, precedents, read, stats,
    structure, watch,
};
