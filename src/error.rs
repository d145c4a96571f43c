use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Archive extraction failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing file: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("Failed to parse {context}: {message}")]
    Parse { context: String, message: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {message}")]
    Api { message: String },
}

impl RouteError {
    pub fn parse(context: impl Into<String>, message: impl ToString) -> Self {
        RouteError::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// True for errors raised while reading source data, as opposed to
    /// collaborator or configuration failures.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            RouteError::Parse { .. }
                | RouteError::Csv(_)
                | RouteError::Json(_)
                | RouteError::MissingField(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RouteError>;
