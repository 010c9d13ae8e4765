//! Wire the configured directory backend.

use anyhow::Context;
use orgbook_core::config::{DirectoryConfig, SourceKind};
use orgbook_core::{Authenticator, DirectorySource};
use orgbook_sources::{EnvAuthenticator, GraphSource, SnapshotSource};
use std::sync::Arc;
use std::time::Duration;

/// The source to read from, plus the authenticator when it needs one.
#[derive(Clone)]
pub struct Directory {
    pub source: Arc<dyn DirectorySource>,
    pub auth: Option<Arc<dyn Authenticator>>,
}

pub async fn open_directory(settings: &DirectoryConfig) -> anyhow::Result<Directory> {
    match settings.source {
        SourceKind::Snapshot => {
            let source = SnapshotSource::open(
                &settings.groups_csv,
                &settings.members_json,
                settings.users_json.as_deref(),
            )
            .await
            .with_context(|| format!("opening snapshot {}", settings.groups_csv.display()))?;
            Ok(Directory {
                source: Arc::new(source),
                auth: None,
            })
        }
        SourceKind::Graph => {
            let auth: Arc<dyn Authenticator> = Arc::new(EnvAuthenticator::new(&settings.token_env));
            let source = GraphSource::new(
                &settings.graph_base_url,
                Arc::clone(&auth),
                Duration::from_secs(settings.timeout_secs),
            )
            .context("building directory client")?;
            tracing::info!(base_url = %settings.graph_base_url, token_env = %settings.token_env, "graph directory configured");
            Ok(Directory {
                source: Arc::new(source),
                auth: Some(auth),
            })
        }
    }
}
