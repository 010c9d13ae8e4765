//! orgbook, an organizational address book.
//!
//! Browse a directory's group hierarchy, list the members of any unit,
//! search everyone by name, title or email, and hand picked people to a
//! compose surface as recipients. The binary exposes these layers as public
//! modules so the integration harnesses can drive them without a terminal.
//!
//! # Architecture
//!
//! ```text
//! DirectorySource ──► Session (tree, member cache, search, selection) ──► TUI / CLI
//!   snapshot | graph                                        │
//!                                                           └──► RecipientSink
//! ```

pub mod cli;
pub mod directory;

pub use directory::{open_directory, Directory};
