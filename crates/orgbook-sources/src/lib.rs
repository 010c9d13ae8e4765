//! orgbook-sources: adapters behind the orgbook-core collaborator traits.
//!
//! Each adapter implements one of [`orgbook_core::DirectorySource`],
//! [`orgbook_core::Authenticator`] or [`orgbook_core::RecipientSink`]:
//!
//! - [`snapshot`]: group CSV export plus a members JSON map, read from disk
//! - [`graph`]: Microsoft Graph over HTTPS
//! - [`auth`]: bearer token taken from the environment
//! - [`sink`]: `To:`/`Cc:`/`Bcc:` header lines written to any writer
//!
//! [`generate`] derives demo member snapshots from a group export.

pub mod auth;
pub mod generate;
pub mod graph;
pub mod sink;
pub mod snapshot;

pub use auth::EnvAuthenticator;
pub use generate::{collect_group_ids, generate_snapshot, write_snapshot};
pub use graph::GraphSource;
pub use sink::HeaderSink;
pub use snapshot::{parse_groups_csv, SnapshotError, SnapshotSource};
