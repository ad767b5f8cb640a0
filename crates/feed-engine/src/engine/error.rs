//! Engine error taxonomy
//!
//! A rejected-concurrent intent is NOT represented here: the controllers
//! treat it as a no-op returning the current state. Side-effect failures
//! never reach this type either; they are logged inside the dispatcher.

use feed_core::{DomainError, GatewayError};

/// User-visible message when a reaction toggle fails
pub const MSG_REACTION: &str = "Failed to update reaction. Please try again.";
/// User-visible message when a comment like fails
pub const MSG_COMMENT_LIKE: &str = "Failed to update like. Please try again.";
/// User-visible message when posting a comment fails
pub const MSG_COMMENT_CREATE: &str = "Failed to post comment. Please try again.";
/// User-visible message when editing a comment fails
pub const MSG_COMMENT_EDIT: &str = "Failed to edit comment. Please try again.";
/// User-visible message when deleting a comment fails
pub const MSG_COMMENT_DELETE: &str = "Failed to delete comment. Please try again.";
/// User-visible message when the comment list cannot be loaded
pub const MSG_COMMENT_LIST: &str = "Failed to load comments. Please try again.";

/// Engine-level error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The primary mutation failed remotely. Any speculative delta has
    /// already been rolled back; the action can be retried.
    #[error("{message}")]
    Remote {
        message: &'static str,
        #[source]
        source: GatewayError,
    },

    /// 403-equivalent from the collaborator API. Fatal for this action;
    /// retrying cannot succeed and nothing was speculatively changed.
    #[error("You are not allowed to do that.")]
    Authorization(#[source] GatewayError),

    /// Local validation rejected the input before anything left the client
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl EngineError {
    /// Wrap a gateway failure, routing authorization failures to their own
    /// fatal variant
    #[must_use]
    pub fn remote(message: &'static str, source: GatewayError) -> Self {
        if source.is_authorization() {
            Self::Authorization(source)
        } else {
            Self::Remote { message, source }
        }
    }

    /// Whether the user can meaningfully retry the action
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Remote { .. } => true,
            Self::Authorization(_) => false,
            // Validation errors retry after the user fixes the input
            Self::Domain(e) => e.is_validation(),
        }
    }

    /// The single message shown to the user for this failed action
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<EngineError> for feed_common::AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Remote { message, source } => {
                Self::ExternalService(format!("{message} ({source})"))
            }
            EngineError::Authorization(_) => Self::InsufficientPermissions,
            EngineError::Domain(e) => Self::Domain(e),
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
