use thiserror::Error;

/// Failures the chat session can encounter. Every variant is caught at the
/// boundary where it occurs and turned into a transcript entry or an inline
/// panel; none of them terminate the session.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request could not be sent or no response was received.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The backend answered with a non-2xx status.
    #[error("backend returned status {0}")]
    HttpStatusFailure(u16),

    /// A streamed response body failed mid-read.
    #[error("stream read failure: {0}")]
    StreamReadFailure(String),

    /// The response JSON did not match any expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The visualization mount point does not exist (or no longer exists).
    #[error("mount point missing: {0}")]
    MountTargetMissing(String),
}
