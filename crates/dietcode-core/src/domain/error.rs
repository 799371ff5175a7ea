//! Domain-level error taxonomy for DietCode.
//!
//! Expected inability to proceed (no failed checks, low confidence, no
//! affected file) is not an error; see [`crate::domain::outcome::PipelineResult`].

/// DietCode domain errors.
#[derive(Debug, thiserror::Error)]
pub enum DietCodeError {
    /// A collaborator (source control, tool server, completion backend)
    /// could not be reached or reported a failure. The message is the
    /// collaborator's own, unmodified.
    #[error("{service} transport error: {message}")]
    Transport { service: String, message: String },

    /// The completion backend answered, but the answer is not a well-formed
    /// fix proposal.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DietCodeError {
    /// Build a transport error for the named collaborator.
    pub fn transport(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Build a malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }
}

/// Result type for DietCode domain operations.
pub type Result<T> = std::result::Result<T, DietCodeError>;
