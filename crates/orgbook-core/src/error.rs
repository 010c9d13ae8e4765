//! Error kinds surfaced by the directory, the compose host and the tree
//! builder.

use thiserror::Error;

/// Failure talking to the directory (or the authentication collaborator).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// No usable session. Recoverable through an interactive login.
    #[error("sign-in required: {0}")]
    AuthRequired(String),

    /// The directory call itself failed. Retryable by the user.
    #[error("directory request failed ({context}): {message}")]
    Upstream { context: String, message: String },
}

impl DirectoryError {
    pub fn upstream(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        DirectoryError::Upstream {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, DirectoryError::AuthRequired(_))
    }
}

/// The compose surface rejected a recipient hand-off.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("no compose surface is available")]
    Unavailable,

    #[error("compose surface rejected recipients: {0}")]
    Rejected(String),

    #[error("writing recipients failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a group record did not make it into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Display name is empty or has no `CODE<sep>label` shape.
    Unparseable,
    /// No category prefix (or keyword, in permissive mode) matches.
    NoCategory,
    /// The code is the category prefix itself.
    CategoryMarker,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::Unparseable => write!(f, "unparseable"),
            DropReason::NoCategory => write!(f, "no-category"),
            DropReason::CategoryMarker => write!(f, "category-marker"),
        }
    }
}
