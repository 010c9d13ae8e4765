//! Configuration types for orgbook.
//!
//! [`Config::load`] reads `~/.config/orgbook/config.toml` (or an explicit
//! path), creating the default file on first run, and layers it over the
//! embedded defaults. [`Config::defaults`] returns the defaults without
//! touching the filesystem (useful in tests).
//!
//! Categories and outline entries are arrays of tables rather than maps so
//! that case-sensitive codes never end up as keys.

use crate::hierarchy::{Categories, CategoryRule, MatchPolicy};
use crate::outline::OutlineNode;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[directory]
source        = "snapshot"
groups_csv    = "data/exportGroups.csv"
members_json  = "data/orgMembers.generated.json"
graph_base_url = "https://graph.microsoft.com/v1.0"
token_env     = "ORGBOOK_TOKEN"
fetch_users   = true
timeout_secs  = 30

[tree]
mode           = "inferred"
match_policy   = "strict"
root_name      = "康橋通訊錄"
path_separator = " / "

[[tree.categories]]
prefix = "KCHC"
name   = "新竹校區"

[[tree.categories]]
prefix = "KCQS"
name   = "青山校區"

[[tree.categories]]
prefix = "NJ"
name   = "南京校區"

[[tree.categories]]
prefix = "KS"
name   = "康軒集團"

[[tree.categories]]
prefix = "K1"
name   = "康軒集團"

[[tree.categories]]
prefix = "KKC"
name   = "康橋幼兒園"

[[tree.outline]]
id   = "kangqiao"
name = "康橋學校"

[[tree.outline.children]]
id   = "kcqs"
name = "青山校區"

[[tree.outline.children.children]]
id   = "KCQS10"
name = "青山校長室"

[[tree.outline.children.children.children]]
id       = "KCQS100101"
name     = "青山校長室人會組"
group_id = "899b4fc4-1659-4666-8870-a1379977946a"

[[tree.outline.children.children]]
id   = "KCQS1010"
name = "青山教務處"

[[tree.outline.children.children.children]]
id       = "KCQS101001"
name     = "教學組"
group_id = "6d32df83-c5ad-4adf-bb36-c34f4c1193d2"

[[tree.outline.children.children.children]]
id       = "KCQS101002"
name     = "課研組"
group_id = "d3edc110-9105-4e45-b7d2-08a75f98c821"

[[tree.outline.children.children.children]]
id       = "KCQS101003"
name     = "課務組"
group_id = "1578e794-48bd-423e-87f4-20ad6cba7eb5"

[[tree.outline.children.children.children]]
id       = "KCQS101004"
name     = "招生組"
group_id = "2fcc5a35-542c-4ea0-ae76-82f708417b8e"

[[tree.outline.children]]
id   = "kccs"
name = "常熟校區"

[[tree.outline.children.children]]
id   = "KCCS701307"
name = "常熟招生處"

[[tree.outline.children.children.children]]
id       = "KCCS70130701"
name     = "招生一組"
group_id = "be034064-8fd3-4ea0-b144-617a7315089f"

[[tree.outline.children.children.children]]
id       = "KCCS70130702"
name     = "招生二組"
group_id = "9b8b1fe3-cb20-4187-a50b-0f4dd120e53a"

[ui]
tree_pane_width_pct = 35
theme               = "default"

[snapshot]
mail_domain       = "kcis.generated"
members_per_group = 3
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Snapshot,
    Graph,
}

/// `[directory]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_source")]
    pub source: SourceKind,
    #[serde(default = "default_groups_csv")]
    pub groups_csv: PathBuf,
    #[serde(default = "default_members_json")]
    pub members_json: PathBuf,
    #[serde(default)]
    pub users_json: Option<PathBuf>,
    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_fetch_users")]
    pub fetch_users: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_source() -> SourceKind { SourceKind::Snapshot }
fn default_groups_csv() -> PathBuf { PathBuf::from("data/exportGroups.csv") }
fn default_members_json() -> PathBuf { PathBuf::from("data/orgMembers.generated.json") }
fn default_graph_base_url() -> String { "https://graph.microsoft.com/v1.0".to_string() }
fn default_token_env() -> String { "ORGBOOK_TOKEN".to_string() }
fn default_fetch_users() -> bool { true }
fn default_timeout_secs() -> u64 { 30 }

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            groups_csv: default_groups_csv(),
            members_json: default_members_json(),
            users_json: None,
            graph_base_url: default_graph_base_url(),
            token_env: default_token_env(),
            fetch_users: default_fetch_users(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeMode {
    /// Infer the hierarchy from group codes.
    Inferred,
    /// Use `[[tree.outline]]` verbatim.
    Outline,
}

/// `[tree]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeConfig {
    #[serde(default = "default_mode")]
    pub mode: TreeMode,
    #[serde(default)]
    pub match_policy: MatchPolicy,
    #[serde(default = "default_root_name")]
    pub root_name: String,
    #[serde(default = "default_path_separator")]
    pub path_separator: String,
    #[serde(default)]
    pub categories: Vec<CategoryRule>,
    #[serde(default)]
    pub outline: Vec<OutlineNode>,
}

fn default_mode() -> TreeMode { TreeMode::Inferred }
fn default_root_name() -> String { "康橋通訊錄".to_string() }
fn default_path_separator() -> String { " / ".to_string() }

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            match_policy: MatchPolicy::default(),
            root_name: default_root_name(),
            path_separator: default_path_separator(),
            categories: Vec::new(),
            outline: Vec::new(),
        }
    }
}

impl TreeConfig {
    pub fn categories(&self) -> Categories {
        Categories::new(self.categories.clone())
    }
}

/// `[ui]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_tree_pane_width_pct")]
    pub tree_pane_width_pct: u16,
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_tree_pane_width_pct() -> u16 { 35 }
fn default_theme() -> String { "default".to_string() }

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tree_pane_width_pct: default_tree_pane_width_pct(),
            theme: default_theme(),
        }
    }
}

/// `[snapshot]` section, used by `generate-snapshot`.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_mail_domain")]
    pub mail_domain: String,
    #[serde(default = "default_members_per_group")]
    pub members_per_group: usize,
}

fn default_mail_domain() -> String { "kcis.generated".to_string() }
fn default_members_per_group() -> usize { 3 }

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            mail_domain: default_mail_domain(),
            members_per_group: default_members_per_group(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load `path` (or `~/.config/orgbook/config.toml`), layered on top of
    /// the built-in defaults. The default location is created with the
    /// built-in defaults if it does not exist; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (config_path(), false),
        };

        if !required && !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path.as_path()).required(required))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document layered over the defaults.
    pub fn from_toml_str(src: &str) -> anyhow::Result<Self> {
        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from_str(src, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self.tree.mode {
            TreeMode::Inferred if self.tree.categories.is_empty() => {
                anyhow::bail!("tree.mode = \"inferred\" needs at least one [[tree.categories]] entry")
            }
            TreeMode::Outline if self.tree.outline.is_empty() => {
                anyhow::bail!("tree.mode = \"outline\" needs at least one [[tree.outline]] entry")
            }
            _ => {}
        }
        if !(10..=90).contains(&self.ui.tree_pane_width_pct) {
            anyhow::bail!("ui.tree_pane_width_pct must be between 10 and 90");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("orgbook")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
