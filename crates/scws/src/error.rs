use aes::cipher::block_padding::UnpadError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScwsError {
    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),

    #[error("Failed to resolve manifest: {0}")]
    Resolution(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid IV directive: {0}")]
    InvalidIv(String),

    #[error("Invalid AES-128 key length: {0} bytes")]
    InvalidKey(usize),

    #[error("Segment {0} is empty after download")]
    EmptySegment(usize),

    #[error("Pkcs7 unpad error")]
    UnpadError(#[from] UnpadError),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

impl ScwsError {
    pub(crate) fn missing<S: AsRef<str>>(what: S) -> Self {
        Self::Resolution(format!("{} not found", what.as_ref()))
    }
}

pub type ScwsResult<T> = Result<T, ScwsError>;
