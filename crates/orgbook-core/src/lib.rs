//! orgbook-core: the organizational address book engine.
//!
//! - [`hierarchy`] infers a tree from coded group names
//! - [`outline`] builds a tree from a hand-curated outline and places users
//! - [`membership`] resolves group members lazily, once per group
//! - [`search`] flattens the tree into a keyword-searchable list
//! - [`selection`] keeps the picked recipients
//! - [`session`] owns all of the above for one running pane
//!
//! Directory access, sign-in and the compose surface sit behind the traits in
//! [`directory`].

pub mod config;
pub mod directory;
pub mod error;
pub mod hierarchy;
pub mod membership;
pub mod outline;
pub mod search;
pub mod selection;
pub mod session;
pub mod tree;
pub mod types;

pub use config::Config;
pub use directory::{AccessToken, Account, Authenticator, DirectorySource, RecipientSink};
pub use error::{DirectoryError, DropReason, HostError};
pub use hierarchy::{build_tree, BuildReport, Categories, CategoryRule, DroppedGroup, MatchPolicy};
pub use membership::{MemberRequest, MembershipResolver};
pub use search::{MatchKind, SearchHit, SearchIndex, SearchOutcome};
pub use selection::{AddOutcome, Selection};
pub use session::{InitSummary, Session};
pub use tree::{LoadState, Members, NodeId, NodeKind, OrgNode, OrgTree};
pub use types::{GroupRecord, Member, Recipient, RecipientKind, UserRecord};
