// Error taxonomy shared by the use cases
use crate::domain::incident::ValidationError;
use crate::domain::session::AuthFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// Form input rejected before anything was written
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error("Please sign in to continue")]
    Unauthorized,

    /// A mutation for the same user is still in flight
    #[error("Another update is already in progress")]
    Busy,

    /// The document store or identity provider could not be reached or failed
    #[error("{message}")]
    Upstream {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl TrackerError {
    pub fn upstream(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Upstream {
            message: message.into(),
            source,
        }
    }
}
