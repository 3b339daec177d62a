use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the bridge.
///
/// Externally triggered variants (`MalformedRequest`, `SignatureMismatch`)
/// are mapped to per-request responses at the HTTP boundary and never
/// terminate the service. `Config` is fatal at startup.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("malformed request: {0}")]
    MalformedRequest(&'static str),
    #[error("signature mismatch: received {received}, tried {} candidates", .candidates.len())]
    SignatureMismatch {
        received: String,
        candidates: Vec<String>,
    },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("delivery error: {0}")]
    Delivery(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal error: {0}")]
    Internal(String),
}
