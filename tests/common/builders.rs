//! Test builders: an in-memory directory, a recording sink, and terse
//! constructors for records and settings.
//!
//! These are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning
//! `Result`.

use async_trait::async_trait;
use orgbook_core::config::{Config, TreeConfig, TreeMode};
use orgbook_core::{
    DirectoryError, DirectorySource, GroupRecord, HostError, MatchPolicy, Member, Recipient,
    RecipientKind, RecipientSink, UserRecord,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

pub fn group(id: &str, display_name: &str) -> GroupRecord {
    GroupRecord::new(id, display_name)
}

/// `(id, displayName)` pairs to records.
pub fn groups(pairs: &[(&str, &str)]) -> Vec<GroupRecord> {
    pairs.iter().map(|(id, name)| group(id, name)).collect()
}

pub fn member(id: &str, name: &str, email: &str) -> Member {
    Member::new(id, name, email)
}

pub fn user(id: &str, name: &str, email: &str, department: &str) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        display_name: name.to_string(),
        mail: Some(email.to_string()).filter(|m| !m.is_empty()),
        user_principal_name: None,
        job_title: None,
        department: Some(department.to_string()).filter(|d| !d.is_empty()),
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// The default `[tree]` section, in inferred mode with `policy`.
pub fn inferred_settings(policy: MatchPolicy) -> TreeConfig {
    let mut settings = Config::defaults().tree;
    settings.mode = TreeMode::Inferred;
    settings.match_policy = policy;
    settings
}

pub fn outline_settings() -> TreeConfig {
    let mut settings = Config::defaults().tree;
    settings.mode = TreeMode::Outline;
    settings
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

/// In-memory [`DirectorySource`] that counts every call.
///
/// ```rust
/// let source = MemorySource::builder()
///     .group("g-team", "KCQS101001.教學組")
///     .members("g-team", vec![member("u1", "Keyu Chen", "keyu@kcis.test")])
///     .failing_members("g-broken")
///     .build();
/// ```
#[derive(Default)]
pub struct MemorySource {
    groups: Vec<GroupRecord>,
    members: HashMap<String, Vec<Member>>,
    users: Vec<UserRecord>,
    failing_members: HashSet<String>,
    groups_error: Option<DirectoryError>,
    users_error: Option<DirectoryError>,
    group_calls: AtomicUsize,
    member_calls: Mutex<HashMap<String, usize>>,
}

impl MemorySource {
    pub fn builder() -> MemorySourceBuilder {
        MemorySourceBuilder::default()
    }

    pub fn group_calls(&self) -> usize {
        self.group_calls.load(Ordering::SeqCst)
    }

    pub fn member_calls(&self, group_id: &str) -> usize {
        self.member_calls
            .lock()
            .unwrap()
            .get(group_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_member_calls(&self) -> usize {
        self.member_calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl DirectorySource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, DirectoryError> {
        self.group_calls.fetch_add(1, Ordering::SeqCst);
        match &self.groups_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.groups.clone()),
        }
    }

    async fn list_group_members(&self, group_id: &str) -> Result<Vec<Member>, DirectoryError> {
        *self
            .member_calls
            .lock()
            .unwrap()
            .entry(group_id.to_string())
            .or_default() += 1;
        if self.failing_members.contains(group_id) {
            return Err(DirectoryError::upstream("group members", "503 Service Unavailable"));
        }
        Ok(self.members.get(group_id).cloned().unwrap_or_default())
    }

    async fn list_all_users(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        match &self.users_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.users.clone()),
        }
    }
}

#[derive(Default)]
pub struct MemorySourceBuilder {
    source: MemorySource,
}

impl MemorySourceBuilder {
    pub fn group(mut self, id: &str, display_name: &str) -> Self {
        self.source.groups.push(group(id, display_name));
        self
    }

    pub fn groups(mut self, records: Vec<GroupRecord>) -> Self {
        self.source.groups.extend(records);
        self
    }

    pub fn members(mut self, group_id: &str, members: Vec<Member>) -> Self {
        self.source.members.insert(group_id.to_string(), members);
        self
    }

    pub fn user(mut self, user: UserRecord) -> Self {
        self.source.users.push(user);
        self
    }

    pub fn failing_members(mut self, group_id: &str) -> Self {
        self.source.failing_members.insert(group_id.to_string());
        self
    }

    pub fn groups_error(mut self, err: DirectoryError) -> Self {
        self.source.groups_error = Some(err);
        self
    }

    pub fn users_error(mut self, err: DirectoryError) -> Self {
        self.source.users_error = Some(err);
        self
    }

    pub fn build(self) -> MemorySource {
        self.source
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// [`RecipientSink`] that remembers every hand-off, or rejects them all.
#[derive(Default)]
pub struct RecordingSink {
    pub calls: Mutex<Vec<(RecipientKind, Vec<Recipient>)>>,
    pub reject: bool,
}

impl RecordingSink {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    pub fn emails(&self) -> Vec<(RecipientKind, Vec<String>)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(kind, rs)| (*kind, rs.iter().map(|r| r.email.clone()).collect()))
            .collect()
    }
}

#[async_trait]
impl RecipientSink for RecordingSink {
    async fn add_recipients(
        &self,
        kind: RecipientKind,
        recipients: &[Recipient],
    ) -> Result<(), HostError> {
        if self.reject {
            return Err(HostError::Rejected("draft is read-only".to_string()));
        }
        self.calls.lock().unwrap().push((kind, recipients.to_vec()));
        Ok(())
    }
}
