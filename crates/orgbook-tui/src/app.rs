//! Top-level application state and the main event loop.
//!
//! [`App::run`] sets up the terminal, builds the session, drives the
//! crossterm event loop, and tears everything down cleanly on exit or panic.
//!
//! The loop runs on the calling thread. Member fetches are spawned onto the
//! tokio runtime behind `handle` and report back over an unbounded channel
//! that the loop drains before each draw, so opening a slow group never
//! freezes the pane. Building the tree, signing in and committing are
//! short, user-initiated steps and block the loop with `Handle::block_on`.

use crate::{
    commands::Command,
    event::{self, AppEvent},
    theme::Theme,
    widgets::{
        command_bar::{CommandBar, CommandBarState},
        help::HelpPopup,
        member_list::{MemberList, MemberListState, MemberRow},
        org_tree::{OrgTreeState, OrgTreeView, TreeAction},
        query_bar::{QueryBar, QueryBarState, Status},
        selection_pane::{SelectionPane, SelectionPaneState},
        signin::SignInScreen,
    },
};
use crossterm::{
    event::{self as ct_event, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use orgbook_core::{
    config::{Config, UiConfig},
    AddOutcome, Authenticator, DirectoryError, DirectorySource, LoadState, MatchKind, Member,
    MemberRequest, NodeId, RecipientKind, RecipientSink, SearchOutcome, Session,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction as LayoutDir, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::Paragraph,
    Frame, Terminal,
};
use std::{io, sync::Arc, time::Duration};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Everything outside the pane the app talks to.
#[derive(Clone)]
pub struct Services {
    pub source: Arc<dyn DirectorySource>,
    /// `None` when the source needs no sign-in (snapshots).
    pub auth: Option<Arc<dyn Authenticator>>,
    pub sink: Arc<dyn RecipientSink>,
    pub fetch_users: bool,
}

/// Outcome of a background member fetch.
#[derive(Debug)]
struct FetchResult {
    group_id: String,
    outcome: Result<Vec<Member>, DirectoryError>,
}

// ---------------------------------------------------------------------------
// Focus + screen types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// The tree is being built.
    Loading,
    /// The directory could not be read; retry or sign in.
    SignIn { message: String },
    Browse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Tree,
    Members,
    Selection,
    Query,
    /// Vim-style `:` command line is active.
    Command,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub session: Session,
    pub screen: Screen,
    pub focus: Focus,
    /// Focus before entering command mode, restored on exit.
    pub prev_focus: Focus,
    pub tree: OrgTreeState,
    pub members: MemberListState,
    pub picked: SelectionPaneState,
    pub query: QueryBarState,
    pub command_bar: CommandBarState,
    pub theme: Theme,
    pub ui: UiConfig,
    pub show_help: bool,
    pub status: Option<Status>,
    /// Node whose members the list shows while browsing.
    pub shown_node: Option<NodeId>,
    /// Whether every group has been requested for the current search.
    pub search_primed: bool,
    /// Member fetches spawned and not yet drained.
    pub pending: usize,
    pub can_login: bool,
    pub quit: bool,
}

impl AppState {
    fn searching(&self) -> bool {
        !self.query.query.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    state: AppState,
    services: Services,
    handle: Handle,
    tx: UnboundedSender<FetchResult>,
    rx: UnboundedReceiver<FetchResult>,
}

impl App {
    pub fn new(config: &Config, services: Services, handle: Handle) -> Self {
        let (tx, rx) = unbounded_channel();
        let state = AppState {
            session: Session::new(config.tree.clone()),
            screen: Screen::Loading,
            focus: Focus::Tree,
            prev_focus: Focus::Tree,
            tree: OrgTreeState::default(),
            members: MemberListState::default(),
            picked: SelectionPaneState::default(),
            query: QueryBarState::default(),
            command_bar: CommandBarState::default(),
            theme: Theme::by_name(&config.ui.theme),
            ui: config.ui.clone(),
            show_help: false,
            status: None,
            shown_node: None,
            search_primed: false,
            pending: 0,
            can_login: services.auth.is_some(),
            quit: false,
        };
        App {
            state,
            services,
            handle,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Set up the terminal, run the event loop, and restore the terminal on exit.
    pub fn run(mut self) -> anyhow::Result<()> {
        install_panic_hook();

        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        // Always restore terminal, even if the loop returned an error
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        terminal.draw(|frame| draw(frame, &self.state))?;
        self.initialize();

        loop {
            self.drain_fetches();
            terminal.draw(|frame| draw(frame, &self.state))?;

            if self.state.quit {
                break;
            }

            if ct_event::poll(Duration::from_millis(16))? {
                match ct_event::read()? {
                    Event::Key(key) if key.kind == crossterm::event::KeyEventKind::Press => {
                        let raw = Event::Key(key);
                        // Use insert-mode mapping when a text widget is focused
                        let app_event = if is_insert_mode(self.state.focus) {
                            event::to_app_event_insert(raw)
                        } else {
                            event::to_app_event(raw)
                        };
                        if let Some(ev) = app_event {
                            tracing::debug!(focus = ?self.state.focus, event = ?ev, "key event");
                            self.handle(ev);
                        }
                    }
                    other => {
                        if let Some(ev) = event::to_app_event(other) {
                            self.handle(ev);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Directory
    // -----------------------------------------------------------------------

    /// (Re)build the tree. Failure switches to the sign-in screen.
    pub fn initialize(&mut self) {
        let s = &mut self.state;
        s.screen = Screen::Loading;
        let source = Arc::clone(&self.services.source);
        let result = self
            .handle
            .block_on(s.session.initialize(source.as_ref(), self.services.fetch_users));

        match result {
            Ok(summary) => {
                s.screen = Screen::Browse;
                s.tree.reset();
                s.shown_node = None;
                s.search_primed = false;
                s.members.set_rows("Members", Vec::new(), false);
                let mut text = format!("{} groups", summary.nodes);
                if summary.dropped > 0 {
                    text.push_str(&format!(" · {} skipped", summary.dropped));
                }
                s.status = Some(Status::info(text));
                if s.searching() {
                    self.refresh_search(false);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "directory unavailable");
                let message = if err.is_auth_required() && self.state.can_login {
                    format!("{err}. Press L to sign in.")
                } else {
                    err.to_string()
                };
                self.state.screen = Screen::SignIn { message };
            }
        }
    }

    fn login(&mut self) {
        let Some(auth) = self.services.auth.clone() else {
            self.state.status = Some(Status::error("this directory needs no sign-in"));
            return;
        };
        match self.handle.block_on(auth.login()) {
            Ok(account) => {
                tracing::info!(user = %account.username, "signed in");
                self.initialize();
                if self.state.screen == Screen::Browse {
                    self.state.status = Some(Status::info(format!("signed in as {}", account.username)));
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "sign-in failed");
                match self.state.screen {
                    Screen::Browse => self.state.status = Some(Status::error(err.to_string())),
                    _ => {
                        self.state.screen = Screen::SignIn {
                            message: err.to_string(),
                        }
                    }
                }
            }
        }
    }

    fn spawn_fetch(&mut self, group_id: String) {
        let source = Arc::clone(&self.services.source);
        let tx = self.tx.clone();
        self.state.pending += 1;
        tracing::debug!(group = %group_id, pending = self.state.pending, "member fetch spawned");
        self.handle.spawn(async move {
            let outcome = source.list_group_members(&group_id).await;
            let _ = tx.send(FetchResult { group_id, outcome });
        });
    }

    fn drain_fetches(&mut self) {
        while let Ok(result) = self.rx.try_recv() {
            self.apply_fetch(result);
        }
    }

    fn apply_fetch(&mut self, result: FetchResult) {
        let s = &mut self.state;
        s.pending = s.pending.saturating_sub(1);
        let FetchResult { group_id, outcome } = result;
        match s.session.complete_fetch(&group_id, outcome) {
            Ok(members) => {
                tracing::debug!(group = %group_id, count = members.len(), "members resolved");
            }
            Err(err) if err.is_auth_required() => {
                s.status = Some(Status::error("sign-in required, run :login"));
            }
            Err(err) => {
                s.status = Some(Status::error(err.to_string()));
            }
        }

        if s.searching() {
            self.refresh_search(true);
        } else if let Some(node) = s.shown_node {
            self.show_node(node, true);
        }
    }

    // -----------------------------------------------------------------------
    // Browsing
    // -----------------------------------------------------------------------

    fn open_node(&mut self, node: NodeId) {
        match self.state.session.open_node(node) {
            MemberRequest::Fetch(group) => self.spawn_fetch(group),
            MemberRequest::InFlight => {
                self.state.status = Some(Status::info("still loading…"));
            }
            MemberRequest::Ready(_) | MemberRequest::NoGroup => {}
        }
        if !self.state.searching() {
            self.show_node(node, false);
        }
    }

    fn show_node(&mut self, node: NodeId, keep_cursor: bool) {
        let s = &mut self.state;
        s.shown_node = Some(node);
        let tree = s.session.tree();
        let entry = tree.node(node);
        let rows: Vec<MemberRow> = s
            .session
            .members_of(node)
            .into_iter()
            .map(MemberRow::plain)
            .collect();

        s.members.placeholder = match &entry.status {
            LoadState::Loading => "Loading members…".to_string(),
            LoadState::Failed(msg) => format!("Could not load members: {msg} (r to retry)"),
            _ if entry.group_id.is_none() && !entry.is_leaf() => {
                "Pick a group below to list its members".to_string()
            }
            _ => "No members".to_string(),
        };
        let title = format!("{} ({})", entry.name, rows.len());
        s.members.set_rows(title, rows, keep_cursor);
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    fn refresh_search(&mut self, keep_cursor: bool) {
        if self.state.searching() && !self.state.search_primed {
            self.state.search_primed = true;
            let groups = self.state.session.request_unloaded();
            if !groups.is_empty() {
                self.state.status = Some(Status::info(format!("loading {} groups…", groups.len())));
            }
            for group in groups {
                self.spawn_fetch(group);
            }
        }

        let s = &mut self.state;
        let keyword = s.query.query.clone();
        match s.session.search(&keyword) {
            SearchOutcome::Browse => match s.shown_node {
                Some(node) => self.show_node(node, false),
                None => s.members.set_rows("Members", Vec::new(), false),
            },
            SearchOutcome::Hits(hits) => {
                let title = format!("Search \"{}\" ({})", keyword.trim(), hits.len());
                let rows = hits
                    .into_iter()
                    .map(|hit| MemberRow {
                        fuzzy: matches!(hit.kind, MatchKind::Fuzzy(_)),
                        member: hit.member,
                        path: Some(hit.path),
                    })
                    .collect();
                s.members.placeholder = if s.pending > 0 {
                    "Searching…".to_string()
                } else {
                    "No one matches".to_string()
                };
                s.members.set_rows(title, rows, keep_cursor);
            }
        }
    }

    fn leave_search(&mut self) {
        self.state.query.clear();
        self.refresh_search(false);
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    fn pick(&mut self, member: Member) {
        let s = &mut self.state;
        s.status = Some(match s.session.add_member(&member) {
            AddOutcome::Added => Status::info(format!("picked {}", member.name)),
            AddOutcome::Duplicate => Status::info(format!("{} is already picked", member.name)),
            AddOutcome::NoEmail => Status::error(format!("{} has no email address", member.name)),
        });
    }

    fn commit(&mut self, kind: RecipientKind) {
        if self.state.session.selection().is_empty() {
            self.state.status = Some(Status::info("nothing picked"));
            return;
        }
        let sink = Arc::clone(&self.services.sink);
        let s = &mut self.state;
        match self.handle.block_on(s.session.commit(kind, sink.as_ref())) {
            Ok(count) => {
                tracing::info!(%kind, count, "recipients committed");
                s.status = Some(Status::info(format!("added {count} to {kind}")));
                s.picked.clamp(0);
            }
            Err(err) => {
                tracing::warn!(%kind, error = %err, "commit failed");
                s.status = Some(Status::error(err.to_string()));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn handle(&mut self, event: AppEvent) {
        // Help popup intercepts all events; only close keys pass through.
        if self.state.show_help {
            if matches!(event, AppEvent::Char('?') | AppEvent::Escape | AppEvent::Quit) {
                tracing::debug!("help popup closed");
                self.state.show_help = false;
            }
            return;
        }

        match self.state.screen {
            Screen::Browse => {}
            Screen::Loading => {
                if event == AppEvent::Quit {
                    self.state.quit = true;
                }
                return;
            }
            Screen::SignIn { .. } => {
                match event {
                    AppEvent::Quit => self.state.quit = true,
                    AppEvent::Char('r') => self.initialize(),
                    AppEvent::Char('L') if self.state.can_login => self.login(),
                    _ => {}
                }
                return;
            }
        }

        // Command mode intercepts all events.
        if self.state.focus == Focus::Command {
            self.handle_command_bar(event);
            return;
        }

        let s = &mut self.state;
        match event {
            AppEvent::Char('?') if s.focus != Focus::Query => {
                tracing::debug!("help popup opened");
                s.show_help = true;
            }

            AppEvent::Char(':') if s.focus != Focus::Query => {
                tracing::debug!(prev_focus = ?s.focus, "entering command mode");
                s.prev_focus = s.focus;
                s.command_bar.clear();
                s.focus = Focus::Command;
            }

            AppEvent::Quit => {
                tracing::debug!("quit");
                s.quit = true;
            }

            AppEvent::Escape => {
                if s.focus == Focus::Query {
                    tracing::debug!("focus: Query -> Tree");
                    s.focus = Focus::Tree;
                    self.leave_search();
                }
            }

            // Tree -> Members -> Selection -> Query -> Tree
            AppEvent::FocusNext => {
                let next = match s.focus {
                    Focus::Tree => Focus::Members,
                    Focus::Members => Focus::Selection,
                    Focus::Selection => Focus::Query,
                    Focus::Query | Focus::Command => Focus::Tree,
                };
                tracing::debug!(from = ?s.focus, to = ?next, "focus cycle");
                s.focus = next;
            }

            AppEvent::QueryFocus => {
                tracing::debug!("focus -> Query");
                s.focus = Focus::Query;
            }

            // Terminal resize is handled automatically by ratatui
            AppEvent::Resize(_, _) => {}

            other => self.dispatch_to_focused(other),
        }
    }

    fn handle_command_bar(&mut self, event: AppEvent) {
        let s = &mut self.state;
        match event {
            AppEvent::Escape => {
                tracing::debug!("command bar cancelled");
                s.command_bar.clear();
                s.focus = s.prev_focus;
            }
            AppEvent::Enter => match Command::parse(&s.command_bar.input) {
                Ok(cmd) => {
                    tracing::debug!(command = ?cmd, "executing command");
                    s.command_bar.clear();
                    s.focus = s.prev_focus;
                    self.execute_command(cmd);
                }
                Err(msg) if msg.is_empty() => {
                    s.command_bar.clear();
                    s.focus = s.prev_focus;
                }
                Err(msg) => s.command_bar.error = Some(msg),
            },
            other => s.command_bar.handle(&other),
        }
    }

    fn execute_command(&mut self, cmd: Command) {
        match cmd {
            Command::Quit => self.state.quit = true,
            Command::Help => self.state.show_help = !self.state.show_help,
            Command::Theme(name) => self.state.theme = Theme::by_name(&name),
            Command::Commit(kind) => self.commit(kind),
            Command::Clear => {
                self.state.session.clear_selection();
                self.state.picked.clamp(0);
                self.state.status = Some(Status::info("selection cleared"));
            }
            Command::Reload => self.initialize(),
            Command::Login => self.login(),
        }
    }

    /// Route an event to the widget that owns the current focus.
    fn dispatch_to_focused(&mut self, event: AppEvent) {
        let s = &mut self.state;
        match s.focus {
            Focus::Tree => match s.tree.handle(&event, s.session.tree()) {
                Some(TreeAction::Open(node)) => self.open_node(node),
                Some(TreeAction::Reload(node)) => {
                    s.session.reload_node(node);
                    self.open_node(node);
                }
                None => {}
            },
            Focus::Members => {
                if let Some(member) = s.members.handle(&event) {
                    self.pick(member);
                }
            }
            Focus::Selection => {
                let len = s.session.selection().len();
                if let Some(index) = s.picked.handle(&event, len) {
                    if let Some(removed) = s.session.remove_recipient(index) {
                        s.status = Some(Status::info(format!("removed {}", removed.display_name)));
                    }
                    s.picked.clamp(s.session.selection().len());
                }
            }
            Focus::Query => {
                if event == AppEvent::Enter {
                    s.focus = Focus::Members;
                } else if s.query.handle(&event) {
                    self.refresh_search(false);
                }
            }
            Focus::Command => {} // handled before dispatch
        }
    }
}

/// Returns true when the current focus is on a text-input widget, meaning
/// alphabetic keys should produce characters rather than trigger shortcuts.
fn is_insert_mode(focus: Focus) -> bool {
    matches!(focus, Focus::Query | Focus::Command)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn draw(frame: &mut Frame, state: &AppState) {
    let area = frame.area();

    match &state.screen {
        Screen::Loading => {
            let y = area.y + area.height / 2;
            frame.render_widget(
                Paragraph::new(Line::from("Loading directory…").centered())
                    .style(Style::default().add_modifier(Modifier::DIM)),
                Rect { y, height: 1, ..area },
            );
            return;
        }
        Screen::SignIn { message } => {
            frame.render_widget(SignInScreen::new(message, state.can_login, &state.theme), area);
            return;
        }
        Screen::Browse => {}
    }

    // Vertical: body | 3-line query bar
    let vert = Layout::default()
        .direction(LayoutDir::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(3)])
        .split(area);

    let pct = state.ui.tree_pane_width_pct;
    let horiz = Layout::default()
        .direction(LayoutDir::Horizontal)
        .constraints([Constraint::Percentage(pct), Constraint::Fill(1)])
        .split(vert[0]);

    // Right column: member list above the selection
    let right = Layout::default()
        .direction(LayoutDir::Vertical)
        .constraints([Constraint::Fill(2), Constraint::Fill(1)])
        .split(horiz[1]);

    let tree = state.session.tree();
    let selection = state.session.selection();

    frame.render_widget(
        OrgTreeView::new(&state.tree, tree, state.focus == Focus::Tree, &state.theme),
        horiz[0],
    );
    frame.render_widget(
        MemberList::new(&state.members, selection, state.focus == Focus::Members, &state.theme),
        right[0],
    );
    frame.render_widget(
        SelectionPane::new(&state.picked, selection, state.focus == Focus::Selection, &state.theme),
        right[1],
    );
    frame.render_widget(
        QueryBar::new(&state.query, state.status.as_ref(), state.focus == Focus::Query, &state.theme),
        vert[1],
    );

    if state.show_help {
        frame.render_widget(HelpPopup::new(&state.theme), area);
    }

    // Command bar overlays the bottom row of the screen
    if state.focus == Focus::Command {
        let cmd_area = Rect {
            y: area.bottom() - 1,
            height: 1,
            ..area
        };
        frame.render_widget(CommandBar::new(&state.command_bar, &state.theme), cmd_area);
        let col = state.command_bar.cursor_col(cmd_area);
        frame.set_cursor_position((col, cmd_area.y));
        return;
    }

    if state.focus == Focus::Query {
        let qb = QueryBar::new(&state.query, None, true, &state.theme);
        frame.set_cursor_position(qb.cursor_position(vert[1]));
    }
}

// ---------------------------------------------------------------------------
// Terminal helpers
// ---------------------------------------------------------------------------

fn install_panic_hook() {
    let original = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original(info);
    }));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
