use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Browser launch failed: {0}")]
    LaunchError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Fetch failed: {0}")]
    FetchError(String),

    #[error("Form data marker `{0}` not found in page")]
    MarkerNotFound(&'static str),

    #[error("Schema parse error: {0}")]
    ParseError(String),

    #[error("Not enough answers: {expected} questions but only {supplied} answers")]
    BindingError { expected: usize, supplied: usize },

    #[error("Generator error: {0}")]
    GeneratorError(String),

    #[error("CDP error: {0}")]
    CdpError(#[from] chromiumoxide::error::CdpError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
