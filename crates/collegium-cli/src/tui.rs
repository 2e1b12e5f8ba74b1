//! Interactive grid.
//!
//! A search box above a table that grows as the selection nears the end
//! of the visible window. All page state lives in the [`GridSession`];
//! [`App`] only tracks what the user typed and where the cursor is, so a
//! query typed while records are still loading is applied the moment the
//! load finishes.

use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use collegium_core::config::GridConfig;
use collegium_core::{CollegiumConfig, CurrencyFormat};
use collegium_grid::{
    Applied, DataSource, GridSession, LoadHandle, LoadState, SortKey, SortSpec, SourceLocation,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use crate::columns::{Column, college_card};
use crate::commands::open_session;

/// Rows from the end of the window at which the next block is requested.
const PREFETCH_ROWS: usize = 3;

const TICK: Duration = Duration::from_millis(100);

// ============================================================================
// App state
// ============================================================================

/// State behind the interactive grid.
pub struct App {
    source: Arc<DataSource>,
    load: LoadHandle,
    grid: GridConfig,
    currency: CurrencyFormat,
    query: String,
    sort: Option<SortSpec>,
    session: Option<GridSession>,
    selected: usize,
    notice: Option<String>,
    // Set after a failed row request; cleared by the next key press.
    hold_requests: bool,
    quit: bool,
}

impl App {
    /// Create the app over `source`; records are not read until
    /// [`start_load`](Self::start_load).
    pub fn new(source: Arc<DataSource>, config: &CollegiumConfig) -> Self {
        let load = source.handle();
        Self {
            source,
            load,
            grid: config.grid.clone(),
            currency: config.display.currency_format(),
            query: String::new(),
            sort: None,
            session: None,
            selected: 0,
            notice: None,
            hold_requests: false,
            quit: false,
        }
    }

    /// Begin the one-time load in the background.
    pub fn start_load(&self) -> tokio::task::JoinHandle<()> {
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            if let Err(e) = source.load().await {
                tracing::warn!(error = %e, "Record load failed");
            }
        })
    }

    /// Search box contents.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Requested sort.
    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    /// Selected row in the visible window.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// The grid session, once records are loaded.
    pub fn session(&self) -> Option<&GridSession> {
        self.session.as_ref()
    }

    /// Current load progress.
    pub fn load_state(&self) -> LoadState {
        self.load.state()
    }

    /// Last row-request problem, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Returns `true` once the user asked to leave.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Pick up load completion and delivered rows, then prefetch if needed.
    pub fn tick(&mut self) {
        self.poll_load();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        while let Some(applied) = session.try_next_applied() {
            match applied {
                Applied::Rows { .. } => self.notice = None,
                Applied::Failed { error, .. } => {
                    self.notice = Some(format!("Could not load more rows: {error}"));
                    self.hold_requests = true;
                }
                Applied::Stale { .. } => {}
            }
        }
        self.clamp_selection();
        self.request_more_if_needed();
    }

    fn poll_load(&mut self) {
        if self.session.is_some() || !self.load.state().is_ready() {
            return;
        }
        let Ok(records) = self.source.loaded() else {
            return;
        };
        let mut session = open_session(records, &self.grid);
        session.set_query(self.query.clone());
        session.set_sort(self.sort);
        tracing::debug!(query = %self.query, "Grid session opened");
        self.session = Some(session);
        self.selected = 0;
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.hold_requests = false;
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        let page = self.grid.page_size.max(1) as isize;

        match key.code {
            KeyCode::Char('c') if control => self.quit = true,
            KeyCode::Esc if self.query.is_empty() => self.quit = true,
            KeyCode::Esc => {
                self.query.clear();
                self.apply_query();
            }
            KeyCode::Char(c) if !control && !c.is_control() => {
                self.query.push(c);
                self.apply_query();
            }
            KeyCode::Backspace => {
                if self.query.pop().is_some() {
                    self.apply_query();
                }
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-page),
            KeyCode::PageDown => self.move_selection(page),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.window_len().saturating_sub(1),
            KeyCode::Tab => {
                self.sort = next_sort(self.sort);
                self.apply_sort();
            }
            KeyCode::BackTab => {
                if let Some(spec) = self.sort.as_mut() {
                    spec.direction = spec.direction.flipped();
                    self.apply_sort();
                }
            }
            _ => {}
        }
        self.request_more_if_needed();
    }

    fn apply_query(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.set_query(self.query.clone()) {
                self.selected = 0;
            }
        }
    }

    fn apply_sort(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.set_sort(self.sort) {
                self.selected = 0;
            }
        }
    }

    fn window_len(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |session| session.view().window_len())
    }

    fn move_selection(&mut self, delta: isize) {
        let last = self.window_len().saturating_sub(1);
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.window_len().saturating_sub(1));
    }

    fn request_more_if_needed(&mut self) {
        if self.hold_requests {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let window = session.view().window_len();
        if window == 0 || session.view().is_complete() || self.selected + PREFETCH_ROWS < window {
            return;
        }
        if let Err(e) = session.request_next_block() {
            self.notice = Some(e.to_string());
        }
    }

    /// One-line summary under the table.
    pub fn status_line(&self) -> String {
        let mut line = match (self.load.state(), self.session.as_ref()) {
            (LoadState::Failed(reason), _) => format!("Could not load colleges: {reason}"),
            (_, None) => format!("Loading {}…", self.load.source()),
            (_, Some(session)) => {
                let view = session.view();
                let mut text = if view.total() == 0 {
                    "No colleges available".to_string()
                } else if view.matched() == 0 {
                    format!("No colleges match \"{}\"", self.query)
                } else {
                    format!(
                        "{} of {} shown ({} total)",
                        view.window_len(),
                        view.matched(),
                        view.total()
                    )
                };
                if let Some(spec) = view.sort() {
                    let arrow = sort_arrow(spec);
                    text.push_str(&format!(" · sorted by {}{arrow}", spec.key));
                }
                if session.pending() > 0 {
                    text.push_str(" · loading more…");
                }
                text
            }
        };
        if let Some(notice) = &self.notice {
            line.push_str(" · ");
            line.push_str(notice);
        }
        line
    }
}

fn next_sort(current: Option<SortSpec>) -> Option<SortSpec> {
    match current {
        None => Some(SortSpec::ascending(SortKey::ALL[0])),
        Some(spec) => SortKey::ALL
            .iter()
            .position(|key| *key == spec.key)
            .and_then(|i| SortKey::ALL.get(i + 1))
            .map(|&key| SortSpec {
                key,
                direction: spec.direction,
            }),
    }
}

fn sort_arrow(spec: SortSpec) -> &'static str {
    match spec.direction {
        collegium_grid::SortDirection::Ascending => " ▲",
        collegium_grid::SortDirection::Descending => " ▼",
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Draw the whole screen.
pub fn draw(frame: &mut Frame<'_>, app: &App, state: &mut TableState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let search = if app.query().is_empty() {
        Line::from(Span::styled(
            "Search by college name",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(app.query().to_string())
    };
    let search = Paragraph::new(search).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Search (Tab: sort, Shift-Tab: direction, Esc: clear/quit)"),
    );
    frame.render_widget(search, chunks[0]);

    match app.session() {
        Some(session) if session.view().window_len() > 0 => {
            let table = grid_table(session, app.sort(), &app.currency);
            state.select(Some(app.selected()));
            frame.render_stateful_widget(table, chunks[1], state);
        }
        _ => {
            state.select(None);
            let empty = Paragraph::new(app.status_line())
                .block(Block::default().borders(Borders::ALL).title("Colleges"));
            frame.render_widget(empty, chunks[1]);
        }
    }

    let status = Paragraph::new(Line::from(Span::styled(
        app.status_line(),
        Style::default().add_modifier(Modifier::DIM),
    )));
    frame.render_widget(status, chunks[2]);
}

fn grid_table<'a>(
    session: &'a GridSession,
    sort: Option<SortSpec>,
    currency: &CurrencyFormat,
) -> Table<'a> {
    let header = Row::new(Column::ALL.iter().map(|column| {
        let mut title = column.header().to_string();
        if let Some(spec) = sort.filter(|spec| Column::for_sort_key(spec.key) == *column) {
            title.push_str(sort_arrow(spec));
        }
        Cell::from(title)
    }))
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = session
        .view()
        .visible()
        .into_iter()
        .map(|record| {
            let card = college_card(record);
            let height = card.len().max(1) as u16;
            let last = card.len().saturating_sub(1);
            let card_lines: Vec<Line> = card
                .into_iter()
                .enumerate()
                .map(|(i, text)| {
                    if i == 0 {
                        Line::from(Span::styled(
                            text,
                            Style::default().add_modifier(Modifier::BOLD),
                        ))
                    } else if record.featured && i == last {
                        Line::from(Span::styled(text, Style::default().fg(Color::Yellow)))
                    } else {
                        Line::from(text)
                    }
                })
                .collect();
            let cells = Column::ALL.iter().map(|column| match column {
                Column::College => Cell::from(Text::from(card_lines.clone())),
                other => Cell::from(other.cell(record, currency)),
            });
            Row::new(cells).height(height)
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Min(24),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(13),
        Constraint::Length(20),
    ];
    Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Colleges"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
}

// ============================================================================
// Terminal loop
// ============================================================================

/// Run the interactive grid until the user quits.
///
/// Must be called from a multi-threaded tokio runtime via
/// `block_in_place`; row requests and the load run on that runtime.
pub fn run(config: &CollegiumConfig) -> Result<()> {
    let location = SourceLocation::parse(&config.data.source);
    let source = Arc::new(DataSource::new(location, config.data.fetch_timeout()));
    let mut app = App::new(source, config);
    app.start_load();

    let mut guard = TerminalGuard::default();
    guard.enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;

    let result = event_loop(&mut terminal, &mut app);

    guard.restore()?;
    result
}

/// Raw mode and alternate screen, undone on drop.
///
/// Each step is tracked on its own; drop undoes whatever `enter` got to,
/// including after a panic in the event loop.
#[derive(Debug, Default)]
struct TerminalGuard {
    raw: bool,
    alternate: bool,
}

impl TerminalGuard {
    fn enter(&mut self) -> std::io::Result<()> {
        enable_raw_mode()?;
        self.raw = true;
        crossterm::execute!(std::io::stdout(), EnterAlternateScreen)?;
        self.alternate = true;
        Ok(())
    }

    fn restore(&mut self) -> std::io::Result<()> {
        if self.alternate {
            self.alternate = false;
            crossterm::execute!(std::io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show)?;
        }
        if self.raw {
            self.raw = false;
            disable_raw_mode()?;
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.raw || self.alternate
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.is_active() {
            let _ = self.restore();
        }
    }
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let mut state = TableState::default();
    loop {
        app.tick();
        terminal.draw(|f| draw(f, app, &mut state))?;
        if app.should_quit() {
            return Ok(());
        }
        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
