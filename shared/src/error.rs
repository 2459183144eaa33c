use thiserror::Error;

/// Every way a submission can fail. The `Display` text is the message
/// shown to the user; none of these are fatal to the session and none
/// of them discard the collected input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("No input selected. Choose an audio file or record some events first.")]
    NoInput,

    #[error("No events recorded. Tag at least one event before submitting.")]
    NoEvents,

    #[error("A prediction is already in progress.")]
    Busy,

    #[error("The server rejected the input: {0}")]
    Rejected(String),

    #[error("The prediction service failed (HTTP {0}). Try again later.")]
    Server(u16),

    #[error("The request timed out. The recording may be too large for the service.")]
    Timeout,

    #[error("Could not reach the prediction service: {0}")]
    Network(String),

    #[error("The service returned an unrecognized response: {0}")]
    InvalidResponse(String),

    #[error("Submission cancelled")]
    Cancelled,
}

impl PredictError {
    /// Pre-flight failures never produced a network call.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            PredictError::NoInput | PredictError::NoEvents | PredictError::Busy
        )
    }
}
