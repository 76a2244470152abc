use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    /// A parameter was rejected before any computation started.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unsupported input (expected .csv or .xlsx): {}", .0.display())]
    UnsupportedInput(PathBuf),
}

pub type Result<T> = std::result::Result<T, NetworkError>;

impl NetworkError {
    pub(crate) fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        NetworkError::Io {
            source,
            path: path.into(),
        }
    }
}

// Allow `?` on std::io::Error by converting to NetworkError::Io with unknown path.
impl From<std::io::Error> for NetworkError {
    fn from(source: std::io::Error) -> Self {
        NetworkError::io(source, "<unknown>")
    }
}

impl From<zip::result::ZipError> for NetworkError {
    fn from(e: zip::result::ZipError) -> Self {
        NetworkError::Spreadsheet(e.to_string())
    }
}

impl From<quick_xml::Error> for NetworkError {
    fn from(e: quick_xml::Error) -> Self {
        NetworkError::Spreadsheet(format!("XML: {e}"))
    }
}
