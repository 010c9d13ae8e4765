//! Recipient selection: the people picked so far, in pick order.

use crate::directory::RecipientSink;
use crate::error::HostError;
use crate::types::{Member, Recipient, RecipientKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The email is already selected (compared case-insensitively).
    Duplicate,
    /// Nothing to send to.
    NoEmail,
}

#[derive(Debug, Default, Clone)]
pub struct Selection {
    recipients: Vec<Recipient>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn contains_email(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.recipients
            .iter()
            .any(|r| r.email.to_lowercase() == email)
    }

    pub fn add(&mut self, member: &Member) -> AddOutcome {
        let email = member.email.trim();
        if email.is_empty() {
            return AddOutcome::NoEmail;
        }
        if self.contains_email(email) {
            return AddOutcome::Duplicate;
        }
        self.recipients.push(Recipient {
            display_name: member.name.clone(),
            email: email.to_string(),
        });
        tracing::debug!(email, total = self.recipients.len(), "recipient selected");
        AddOutcome::Added
    }

    /// Remove the entry at `index`; out-of-range indexes are ignored.
    pub fn remove(&mut self, index: usize) -> Option<Recipient> {
        (index < self.recipients.len()).then(|| self.recipients.remove(index))
    }

    pub fn clear(&mut self) {
        self.recipients.clear();
    }

    /// Hand the selection to `sink`. The selection is kept either way so a
    /// failed hand-off can be retried.
    pub async fn commit(
        &self,
        kind: RecipientKind,
        sink: &dyn RecipientSink,
    ) -> Result<usize, HostError> {
        if self.recipients.is_empty() {
            return Ok(0);
        }
        sink.add_recipients(kind, &self.recipients).await?;
        tracing::info!(%kind, count = self.recipients.len(), "recipients handed to compose surface");
        Ok(self.recipients.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
