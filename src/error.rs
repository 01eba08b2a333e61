use thiserror::Error;

#[derive(Error, Debug)]
pub enum BizError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("No rule for vendor: {0}")]
    UnknownRule(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BizError>;
