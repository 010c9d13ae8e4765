//! orgbook TUI, the ratatui task pane.

pub mod app;
pub mod commands;
pub mod event;
pub mod theme;
pub mod widgets;

pub use app::{App, Services};

/// Run the pane until the user quits. Directory calls run on the runtime
/// behind `handle`; this must be called from outside that runtime.
pub fn run(
    config: &orgbook_core::Config,
    services: Services,
    handle: tokio::runtime::Handle,
) -> anyhow::Result<()> {
    App::new(config, services, handle).run()
}
