use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("ARM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ARM API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("missing environment variable {0}")]
    MissingCredential(&'static str),

    #[error("status view references unknown VM {0}")]
    UnknownVm(String),

    #[error("malformed resource id: {0}")]
    MalformedResourceId(String),
}

pub type Result<T> = std::result::Result<T, Error>;
