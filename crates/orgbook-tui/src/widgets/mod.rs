//! Ratatui widgets for the orgbook pane.

pub mod command_bar;
pub mod help;
pub mod member_list;
pub mod org_tree;
pub mod query_bar;
pub mod selection_pane;
pub mod signin;
