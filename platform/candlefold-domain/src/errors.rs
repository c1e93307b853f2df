use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to encode payload: {0}")]
    Encoding(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}
