//! Colour theme for the orgbook pane.
//!
//! Themes are TOML files embedded with [`include_str!`] so the pane works
//! without any files on disk. Top-level categories are hashed to a stable
//! palette entry so each campus keeps its colour across sessions.

use config::{Config, File, FileFormat};
use orgbook_core::LoadState;
use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

const DEFAULT_THEME_SRC: &str = include_str!("themes/default.toml");
const GRUVBOX_DARK_THEME_SRC: &str = include_str!("themes/gruvbox_dark.toml");

// ---------------------------------------------------------------------------
// Raw (serde) types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawStyle {
    fg: Option<String>,
    bg: Option<String>,
    #[serde(default)]
    bold: bool,
    #[serde(default)]
    dim: bool,
    #[serde(default)]
    italic: bool,
    #[serde(default)]
    underlined: bool,
}

impl RawStyle {
    fn into_style(self) -> Style {
        let mut style = Style::default();
        if let Some(c) = self.fg.as_deref().and_then(parse_color) {
            style = style.fg(c);
        }
        if let Some(c) = self.bg.as_deref().and_then(parse_color) {
            style = style.bg(c);
        }
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.dim {
            style = style.add_modifier(Modifier::DIM);
        }
        if self.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.underlined {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        style
    }
}

#[derive(Debug, Deserialize)]
struct RawBorders {
    focused: RawStyle,
    command_bar: RawStyle,
    unfocused: RawStyle,
}

#[derive(Debug, Deserialize)]
struct RawTree {
    loading: RawStyle,
    failed: RawStyle,
    loaded: RawStyle,
    palette: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawMembers {
    title: RawStyle,
    email: RawStyle,
    path: RawStyle,
    selected: RawStyle,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    info: RawStyle,
    error: RawStyle,
}

#[derive(Debug, Deserialize)]
struct RawSearch {
    highlight: RawStyle,
}

#[derive(Debug, Deserialize)]
struct RawTheme {
    borders: RawBorders,
    tree: RawTree,
    members: RawMembers,
    status: RawStatus,
    search: RawSearch,
}

// ---------------------------------------------------------------------------
// Public Theme type
// ---------------------------------------------------------------------------

/// Pre-resolved styles; nothing is allocated at render time.
#[derive(Debug, Clone)]
pub struct Theme {
    pub border_focused: Style,
    pub border_command_bar: Style,
    pub border_unfocused: Style,

    pub node_loading: Style,
    pub node_failed: Style,
    pub node_loaded: Style,

    pub member_title: Style,
    pub member_email: Style,
    pub member_path: Style,
    /// Members already in the selection.
    pub member_selected: Style,

    pub status_info: Style,
    pub status_error: Style,

    /// Fuzzy search hits are drawn with this style.
    pub search_highlight: Style,

    category_palette: Vec<Color>,
}

impl Theme {
    pub fn load_default() -> Self {
        Self::from_toml_str(DEFAULT_THEME_SRC).expect("embedded default theme must be valid TOML")
    }

    pub fn load_gruvbox_dark() -> Self {
        Self::from_toml_str(GRUVBOX_DARK_THEME_SRC)
            .expect("embedded gruvbox dark theme must be valid TOML")
    }

    /// Resolve a theme by its configured name; unknown names fall back to the
    /// default theme.
    pub fn by_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "gruvbox" | "gruvbox_dark" | "gruvbox-dark" => Self::load_gruvbox_dark(),
            _ => Self::load_default(),
        }
    }

    /// Parse a theme from a TOML string. Unknown keys are ignored.
    pub fn from_toml_str(src: &str) -> anyhow::Result<Self> {
        let raw: RawTheme = Config::builder()
            .add_source(File::from_str(src, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        Ok(Self {
            border_focused: raw.borders.focused.into_style(),
            border_command_bar: raw.borders.command_bar.into_style(),
            border_unfocused: raw.borders.unfocused.into_style(),
            node_loading: raw.tree.loading.into_style(),
            node_failed: raw.tree.failed.into_style(),
            node_loaded: raw.tree.loaded.into_style(),
            member_title: raw.members.title.into_style(),
            member_email: raw.members.email.into_style(),
            member_path: raw.members.path.into_style(),
            member_selected: raw.members.selected.into_style(),
            status_info: raw.status.info.into_style(),
            status_error: raw.status.error.into_style(),
            search_highlight: raw.search.highlight.into_style(),
            category_palette: raw
                .tree
                .palette
                .iter()
                .filter_map(|s| parse_color(s))
                .collect(),
        })
    }

    pub fn border(&self, focused: bool) -> Style {
        if focused {
            self.border_focused
        } else {
            self.border_unfocused
        }
    }

    /// Stable colour for a top-level category name.
    pub fn category_style(&self, name: &str) -> Style {
        if self.category_palette.is_empty() {
            return Style::default().add_modifier(Modifier::BOLD);
        }
        let idx = stable_hash(name) % self.category_palette.len();
        Style::default()
            .fg(self.category_palette[idx])
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_style(&self, status: &LoadState) -> Style {
        match status {
            LoadState::NotLoaded => Style::default(),
            LoadState::Loading => self.node_loading,
            LoadState::Loaded { .. } => self.node_loaded,
            LoadState::Failed(_) => self.node_failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// djb2-style hash, stable across Rust versions and process restarts.
fn stable_hash(s: &str) -> usize {
    s.bytes()
        .fold(5381usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
}

/// Named terminal colours, `#rrggbb`, or `indexed:N`.
fn parse_color(s: &str) -> Option<Color> {
    match s.to_ascii_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "gray" | "grey" => Some(Color::Gray),
        "dark_gray" | "darkgray" | "dark_grey" | "darkgrey" => Some(Color::DarkGray),
        "light_red" => Some(Color::LightRed),
        "light_green" => Some(Color::LightGreen),
        "light_yellow" => Some(Color::LightYellow),
        "light_blue" => Some(Color::LightBlue),
        "light_magenta" => Some(Color::LightMagenta),
        "light_cyan" => Some(Color::LightCyan),
        "white" => Some(Color::White),
        s if s.starts_with('#') && s.len() == 7 => {
            let r = u8::from_str_radix(&s[1..3], 16).ok()?;
            let g = u8::from_str_radix(&s[3..5], 16).ok()?;
            let b = u8::from_str_radix(&s[5..7], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        s if s.starts_with("indexed:") => {
            let n: u8 = s["indexed:".len()..].parse().ok()?;
            Some(Color::Indexed(n))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
