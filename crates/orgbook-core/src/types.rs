//! Core record types for orgbook-core.
//!
//! This module defines the directory records that arrive from a
//! [`DirectorySource`](crate::directory::DirectorySource) ([`GroupRecord`],
//! [`UserRecord`]), the resolved [`Member`] snapshot attached to tree nodes,
//! and the [`Recipient`] values handed to a recipient sink.

use serde::{Deserialize, Deserializer, Serialize};

/// Directory objects may carry `null` where a string is expected.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One directory group, exactly as the directory reports it.
///
/// The display name usually carries an organizational code followed by a
/// label, e.g. `KCQS1010.青山教務處`. Records are never mutated after they
/// are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub display_name: String,
    #[serde(default)]
    pub mail: Option<String>,
}

impl GroupRecord {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            mail: None,
        }
    }

    pub fn with_mail(mut self, mail: impl Into<String>) -> Self {
        self.mail = Some(mail.into());
        self
    }
}

/// A directory user. Only used to enrich global search and to place people
/// under the node matching their department code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub display_name: String,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

impl UserRecord {
    /// Best deliverable address: `mail`, falling back to the UPN.
    pub fn email(&self) -> Option<&str> {
        self.mail
            .as_deref()
            .filter(|m| !m.is_empty())
            .or(self.user_principal_name.as_deref())
            .filter(|m| !m.is_empty())
    }
}

/// A person listed under a tree node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
}

impl Member {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            title: None,
            email: email.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl From<&UserRecord> for Member {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            name: user.display_name.clone(),
            title: user.job_title.clone().filter(|t| !t.is_empty()),
            email: user.email().unwrap_or_default().to_string(),
        }
    }
}

/// Header a recipient is added under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    To,
    Cc,
    Bcc,
}

impl std::fmt::Display for RecipientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipientKind::To => write!(f, "To"),
            RecipientKind::Cc => write!(f, "Cc"),
            RecipientKind::Bcc => write!(f, "Bcc"),
        }
    }
}

impl std::str::FromStr for RecipientKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "to" => Ok(RecipientKind::To),
            "cc" => Ok(RecipientKind::Cc),
            "bcc" => Ok(RecipientKind::Bcc),
            other => Err(format!("unknown recipient kind: {other}")),
        }
    }
}

/// A name/address pair as the compose surface receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub display_name: String,
    pub email: String,
}

impl From<&Member> for Recipient {
    fn from(member: &Member) -> Self {
        Self {
            display_name: member.name.clone(),
            email: member.email.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
