use anyhow::Context;
use clap::{Parser, Subcommand};
use orgbook::{cli, open_directory};
use orgbook_core::Config;
use orgbook_sources::HeaderSink;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "orgbook", about = "Organizational address book: browse, search, pick recipients")]
struct Cli {
    /// Write debug logs to /tmp/orgbook-debug.log (tail -f to inspect).
    #[arg(long, global = true)]
    debug: bool,

    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Interactive pane (default).
    Browse {
        /// File that committed recipient headers are appended to.
        #[arg(long, default_value = "orgbook-draft.txt")]
        draft: PathBuf,
    },
    /// Print the organization tree.
    Tree {
        /// Also list groups that could not be placed.
        #[arg(long)]
        dropped: bool,
    },
    /// Search every member by name, title or email.
    Search { keyword: String },
    /// List the members of a node, by code or id.
    Members { node: String },
    /// Write demo members for the configured groups.
    GenerateSnapshot {
        /// Defaults to `directory.members_json`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/orgbook-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("orgbook debug log started, tail -f /tmp/orgbook-debug.log");
    }

    let config = Config::load(cli.config.as_deref())?;
    let rt = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let directory = rt.block_on(open_directory(&config.directory))?;
    let source = directory.source.as_ref();
    let mut stdout = std::io::stdout().lock();

    match cli.command.unwrap_or(Cmd::Browse {
        draft: PathBuf::from("orgbook-draft.txt"),
    }) {
        Cmd::Browse { draft } => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&draft)
                .with_context(|| format!("opening draft {}", draft.display()))?;
            let services = orgbook_tui::Services {
                source: Arc::clone(&directory.source),
                auth: directory.auth.clone(),
                sink: Arc::new(HeaderSink::new(file)),
                fetch_users: config.directory.fetch_users,
            };
            drop(stdout);
            orgbook_tui::run(&config, services, rt.handle().clone())
        }
        Cmd::Tree { dropped } => {
            let session = rt.block_on(cli::open_session(&config, source))?;
            cli::print_tree(&session, &mut stdout, dropped)
        }
        Cmd::Search { keyword } => {
            let count = rt.block_on(async {
                let mut session = cli::open_session(&config, source).await?;
                cli::search(&mut session, source, &keyword, &mut stdout).await
            })?;
            eprintln!("{count} matches");
            Ok(())
        }
        Cmd::Members { node } => {
            rt.block_on(async {
                let mut session = cli::open_session(&config, source).await?;
                cli::members(&mut session, source, &node, &mut stdout).await
            })?;
            Ok(())
        }
        Cmd::GenerateSnapshot { out } => {
            let path = out.unwrap_or_else(|| config.directory.members_json.clone());
            let groups = rt.block_on(cli::generate(&config, source, &path))?;
            eprintln!("wrote {groups} groups to {}", path.display());
            Ok(())
        }
    }
}
