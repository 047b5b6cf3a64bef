use thiserror::Error;

pub type SheetResult<T> = Result<T, SheetError>;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Invalid cell address: '{0}'")]
    InvalidAddress(String),

    #[error("Invalid cell range: '{0}'")]
    InvalidRange(String),

    #[error("Cannot access cell {address}: {message}")]
    CellAccess { address: String, message: String },

    #[error("Range {range} is too large ({cells} cells, maximum {max})")]
    RangeTooLarge {
        range: String,
        cells: usize,
        max: usize,
    },

    #[error("Cell {0} does not contain a calculation error")]
    NotAnError(String),

    #[error("Sheet not found: {0}")]
    UnknownSheet(String),

    #[error("Document bridge error: {0}")]
    Bridge(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SheetError {
    /// Attach a cell address to a bridge failure.
    pub fn cell_access(address: impl Into<String>, message: impl std::fmt::Display) -> Self {
        SheetError::CellAccess {
            address: address.into(),
            message: message.to_string(),
        }
    }
}
