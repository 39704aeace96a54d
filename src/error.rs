use thiserror::Error;

use rinex::error::ParsingError;

/// Coarse classification of an [Error], following the pipeline stage
/// that is expected to raise it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Archive could not be reached or did not serve the file
    Download,
    /// One of the form fields is not usable
    InputParse,
    /// Downloaded file could not be turned into SNR series
    Extraction,
    /// Chart could not be produced or displayed
    Render,
    /// Invalid command line or configuration file
    Config,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid {field}: \"{value}\" is not an integer")]
    InvalidInteger { field: &'static str, value: String },

    #[error("invalid calendar date {0:04}-{1:02}-{2:02}")]
    InvalidDate(i32, i32, i32),

    #[error("invalid hour {0}: expecting a value between 0 and 23")]
    InvalidHour(i32),

    #[error("archive replied with HTTP status {0}")]
    HttpStatus(u16),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to store download: {0}")]
    Storage(std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RINEX parsing error: {0}")]
    Parsing(#[from] ParsingError),

    #[error("{0}: RINEX parser aborted")]
    ParserAborted(String),

    #[error("{0} is not an Observation RINEX")]
    NotObservation(String),

    #[error("observable \"{0}\" not found in file")]
    MissingObservable(String),

    #[error("failed to render chart: {0}")]
    Render(String),

    #[error("failed to open \"{0}\" with a web browser")]
    Browser(String),

    #[error("invalid selection policy: {0}")]
    Policy(String),

    #[error("invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid duration \"{0}\"")]
    InvalidDuration(String),
}

impl Error {
    /// Returns the [ErrorKind] of this [Error]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInteger { .. } | Self::InvalidDate(..) | Self::InvalidHour(_) => {
                ErrorKind::InputParse
            },
            Self::HttpStatus(_) | Self::Network(_) | Self::Storage(_) => ErrorKind::Download,
            Self::Io(_)
            | Self::Parsing(_)
            | Self::ParserAborted(_)
            | Self::NotObservation(_)
            | Self::MissingObservable(_) => ErrorKind::Extraction,
            Self::Render(_) | Self::Browser(_) => ErrorKind::Render,
            Self::Policy(_) | Self::Json(_) | Self::InvalidDuration(_) => ErrorKind::Config,
        }
    }
}
