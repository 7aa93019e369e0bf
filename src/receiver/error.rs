use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("Slack request signing verification failed. Some headers are missing.")]
    MissingHeaders,
    #[error("Slack request signing verification failed. Timestamp is invalid.")]
    InvalidTimestamp,
    #[error("Slack request signing verification failed. Timestamp is too old.")]
    StaleTimestamp,
    #[error("Slack request signing verification failed. Signature mismatch.")]
    SignatureMismatch,
    #[error("Slack request signing verification failed. Unsupported signature version {0:?}.")]
    UnsupportedVersion(String),
    #[error("Failed to parse request body: {0}")]
    MalformedBody(String),
    #[error("Multiple acknowledgement error")]
    DoubleAcknowledgement,
    #[error("Event processing failed: {0}")]
    Processing(anyhow::Error),
}

impl ReceiverError {
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            ReceiverError::MissingHeaders
                | ReceiverError::InvalidTimestamp
                | ReceiverError::StaleTimestamp
                | ReceiverError::SignatureMismatch
                | ReceiverError::UnsupportedVersion(_)
        )
    }

    /// HTTP status the host integration answers with when handling fails.
    pub fn status_code(&self) -> u16 {
        match self {
            e if e.is_verification_failure() => 401,
            ReceiverError::MalformedBody(_) => 400,
            _ => 500,
        }
    }
}
