use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalescopeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid order date on row {row}: {value:?}")]
    InvalidDate { row: usize, value: String },

    #[error("Invalid {column} value on row {row}: {value:?}")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("No dataset configured. Pass --dataset <file>, run `salescope config set-dataset <file>`, or use --demo.")]
    NoDataset,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "spreadsheet")]
impl From<calamine::Error> for SalescopeError {
    fn from(e: calamine::Error) -> Self {
        SalescopeError::Spreadsheet(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SalescopeError>;
