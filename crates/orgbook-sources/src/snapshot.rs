//! Offline directory snapshot.
//!
//! Groups come from a directory CSV export (`id,displayName,mail,...`),
//! members from a JSON object keyed by group id, users from an optional JSON
//! array. All three files are read once when the source is opened.

use async_trait::async_trait;
use orgbook_core::{DirectoryError, DirectorySource, GroupRecord, Member, UserRecord};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: invalid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("group export: {0}")]
    Csv(String),
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Parse a directory group export. A leading BOM is stripped, CRLF and LF
/// line endings are accepted, quoted fields may contain commas, line breaks
/// and `""` escapes. Columns are located by header name; `id` is required.
pub fn parse_groups_csv(text: &str) -> Result<Vec<GroupRecord>, SnapshotError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = read_records(text)?.into_iter();

    let (_, columns) = rows
        .next()
        .ok_or_else(|| SnapshotError::Csv("empty file".into()))?;
    let position = |name: &str| columns.iter().position(|c| c.trim() == name);
    let id_col = position("id").ok_or_else(|| SnapshotError::Csv("missing `id` column".into()))?;
    let name_col = position("displayName");
    let mail_col = position("mail");

    let mut records = Vec::new();
    for (line, cells) in rows {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| cells.get(i))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let Some(id) = cell(Some(id_col)) else {
            tracing::debug!(line, "group export row without id skipped");
            continue;
        };
        records.push(GroupRecord {
            id,
            display_name: cell(name_col).unwrap_or_default(),
            mail: cell(mail_col),
        });
    }
    Ok(records)
}

/// Split `text` into records of cells, each tagged with the line it starts
/// on. Line breaks inside quotes belong to the cell; blank lines are skipped.
fn read_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, SnapshotError> {
    let mut records = Vec::new();
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut line = 1usize;
    let mut start = 1usize;
    let mut chars = text.chars().peekable();

    let mut finish = |cells: &mut Vec<String>, current: &mut String, start: usize| {
        cells.push(std::mem::take(current));
        let record = std::mem::take(cells);
        if !(record.len() == 1 && record[0].trim().is_empty()) {
            records.push((start, record));
        }
    };

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => quoted = false,
            ('"', false) if current.is_empty() => quoted = true,
            (',', false) => cells.push(std::mem::take(&mut current)),
            ('\r', false) if chars.peek() == Some(&'\n') => {}
            ('\n', false) => {
                finish(&mut cells, &mut current, start);
                line += 1;
                start = line;
            }
            ('\n', true) => {
                current.push('\n');
                line += 1;
            }
            ('\r', true) if chars.peek() == Some(&'\n') => {}
            _ => current.push(c),
        }
    }
    if quoted {
        return Err(SnapshotError::Csv(format!("unterminated quote in record starting on line {start}")));
    }
    finish(&mut cells, &mut current, start);
    Ok(records)
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SnapshotSource {
    groups: Vec<GroupRecord>,
    members: HashMap<String, Vec<Member>>,
    users: Vec<UserRecord>,
}

impl SnapshotSource {
    pub fn new(
        groups: Vec<GroupRecord>,
        members: HashMap<String, Vec<Member>>,
        users: Vec<UserRecord>,
    ) -> Self {
        Self {
            groups,
            members,
            users,
        }
    }

    /// Read the snapshot files. A missing members file means "no members
    /// yet" (run `orgbook generate-snapshot`); a missing group export is an
    /// error.
    pub async fn open(
        groups_csv: &Path,
        members_json: &Path,
        users_json: Option<&Path>,
    ) -> Result<Self, SnapshotError> {
        let text = read(groups_csv).await?;
        let groups = parse_groups_csv(&text)?;

        let present = tokio::fs::try_exists(members_json)
            .await
            .map_err(|source| SnapshotError::Io {
                path: members_json.to_path_buf(),
                source,
            })?;
        let members = if present {
            parse_json(members_json, &read(members_json).await?)?
        } else {
            tracing::warn!(path = %members_json.display(), "members snapshot missing; groups will list no members");
            HashMap::new()
        };

        let users = match users_json {
            Some(path) => parse_json(path, &read(path).await?)?,
            None => Vec::new(),
        };

        tracing::info!(
            groups = groups.len(),
            member_groups = members.len(),
            users = users.len(),
            "snapshot opened"
        );
        Ok(Self::new(groups, members, users))
    }
}

async fn read(path: &Path) -> Result<String, SnapshotError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path, text: &str) -> Result<T, SnapshotError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    serde_json::from_str(text).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl DirectorySource for SnapshotSource {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, DirectoryError> {
        Ok(self.groups.clone())
    }

    async fn list_group_members(&self, group_id: &str) -> Result<Vec<Member>, DirectoryError> {
        Ok(self.members.get(group_id).cloned().unwrap_or_default())
    }

    async fn list_all_users(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        Ok(self.users.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
