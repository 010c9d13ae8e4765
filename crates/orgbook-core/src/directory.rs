//! Collaborator seams: where records come from, who signs in, and where
//! picked recipients go.

use crate::error::{DirectoryError, HostError};
use crate::types::{GroupRecord, Member, Recipient, RecipientKind, UserRecord};
use async_trait::async_trait;

/// Supplies flat directory records.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Short label for logs (`snapshot`, `graph`, …).
    fn name(&self) -> &str;

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, DirectoryError>;

    async fn list_group_members(&self, group_id: &str) -> Result<Vec<Member>, DirectoryError>;

    /// Only used to enrich search; callers treat failure as "no users".
    async fn list_all_users(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        Ok(Vec::new())
    }
}

/// Bearer token as handed to the directory.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(pub String);

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Fails with [`DirectoryError::AuthRequired`] when there is no session.
    async fn acquire_token(&self) -> Result<AccessToken, DirectoryError>;

    /// Establish a session interactively.
    async fn login(&self) -> Result<Account, DirectoryError>;
}

/// The compose surface (an email draft, a header block, …).
#[async_trait]
pub trait RecipientSink: Send + Sync {
    async fn add_recipients(
        &self,
        kind: RecipientKind,
        recipients: &[Recipient],
    ) -> Result<(), HostError>;
}
