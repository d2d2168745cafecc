use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinderError {
    #[error("GitHub token not provided or found in environment")]
    MissingToken,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("Missing response header: {0}")]
    MissingHeader(&'static str),

    #[error("Invalid value for response header {name}: {value:?}")]
    InvalidHeader { name: &'static str, value: String },

    #[error("Invalid base64 content: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Unsupported blob encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, FinderError>;
