use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("EC2 API error: {0}")]
    Api(String),

    #[error("caller identity has no account id")]
    MissingAccountId,

    #[error("described {kind} is missing {field}")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
