// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod screen;

pub use screen::{FieldView, FormView, ListScreen, PageNav, Screen, TableView};

use anyhow::{Context, Result};
use backoffice_app::pagination::PageWindow;
use backoffice_app::rules::format_cents;
use backoffice_app::{
    ApiFailure, AppCommand, AppMode, AppState, Clients, ControllerEvent, DashboardSummary,
    ListSettings, Notice, NoticeKind, Payments, RequestId, Roles, Route, ScreenKind, Users,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use serde_json::Value;
use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::{Month, OffsetDateTime};
use tracing::{debug, warn};

pub trait AppRuntime {
    /// Runs one remote call to completion.
    fn execute(&mut self, route: &Route) -> Result<Value, ApiFailure>;

    fn current_year(&self) -> i32 {
        OffsetDateTime::now_utc().year()
    }

    /// Starts `route` and eventually posts its outcome to `tx`. The default
    /// runs inline; threaded runtimes override it.
    fn spawn_request(
        &mut self,
        screen: ScreenKind,
        request: RequestId,
        route: Route,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let outcome = self.execute(&route);
        tx.send(InternalEvent::Reply {
            screen,
            request,
            outcome,
        })
        .map_err(|_| anyhow::anyhow!("reply channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    Reply {
        screen: ScreenKind,
        request: RequestId,
        outcome: Result<Value, ApiFailure>,
    },
}

/// One list screen per resource.
#[derive(Debug)]
pub struct Screens {
    clients: ListScreen<Clients>,
    payments: ListScreen<Payments>,
    roles: ListScreen<Roles>,
    users: ListScreen<Users>,
}

impl Screens {
    pub fn new(settings: ListSettings) -> Self {
        Self {
            clients: ListScreen::new(settings),
            payments: ListScreen::new(settings),
            roles: ListScreen::new(settings),
            users: ListScreen::new(settings),
        }
    }

    pub fn get(&self, kind: ScreenKind) -> Option<&dyn Screen> {
        match kind {
            ScreenKind::Dashboard => None,
            ScreenKind::Clients => Some(&self.clients),
            ScreenKind::Payments => Some(&self.payments),
            ScreenKind::Roles => Some(&self.roles),
            ScreenKind::Users => Some(&self.users),
        }
    }

    pub fn get_mut(&mut self, kind: ScreenKind) -> Option<&mut dyn Screen> {
        match kind {
            ScreenKind::Dashboard => None,
            ScreenKind::Clients => Some(&mut self.clients),
            ScreenKind::Payments => Some(&mut self.payments),
            ScreenKind::Roles => Some(&mut self.roles),
            ScreenKind::Users => Some(&mut self.users),
        }
    }

    pub fn summary(&self, year: i32) -> DashboardSummary {
        DashboardSummary::compute(
            self.clients.controller().items(),
            self.payments.controller().items(),
            self.roles.controller().items(),
            self.users.controller().items(),
            year,
        )
    }

    fn teardown_all(&mut self) {
        for kind in ScreenKind::ALL {
            if let Some(screen) = self.get_mut(kind) {
                screen.teardown();
            }
        }
    }
}

#[derive(Debug)]
struct ViewData {
    screens: Screens,
    settings: ListSettings,
    year: i32,
    status_token: u64,
    status_kind: NoticeKind,
}

impl ViewData {
    fn new(settings: ListSettings, year: i32) -> Self {
        Self {
            screens: Screens::new(settings),
            settings,
            year,
            status_token: 0,
            status_kind: NoticeKind::Info,
        }
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    settings: ListSettings,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(settings, runtime.current_year());
    let (internal_tx, internal_rx) = mpsc::channel();

    load_all(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    view_data.screens.teardown_all();

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn load_all<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    for kind in ScreenKind::ALL {
        let Some(screen) = view_data.screens.get_mut(kind) else {
            continue;
        };
        let events = screen.load();
        apply_controller_events(state, runtime, view_data, tx, kind, events);
    }
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Reply {
                screen,
                request,
                outcome,
            } => {
                let Some(target) = view_data.screens.get_mut(screen) else {
                    continue;
                };
                let events = target.complete(request, outcome);
                apply_controller_events(state, runtime, view_data, tx, screen, events);
            }
        }
    }
}

fn apply_controller_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    screen: ScreenKind,
    events: Vec<ControllerEvent>,
) {
    let on_screen = state.active_screen == screen;
    let mut queue = VecDeque::from(events);
    while let Some(event) = queue.pop_front() {
        match event {
            ControllerEvent::Request(request, route) => {
                debug!(screen = screen.label(), %request, %route, "dispatching request");
                if let Err(error) = runtime.spawn_request(screen, request, route, tx.clone()) {
                    let detail = format!("request not started: {error:#}");
                    warn!(screen = screen.label(), %request, %detail, "spawn failed");
                    // The controller still counts the request as pending.
                    if let Some(target) = view_data.screens.get_mut(screen) {
                        let failure = ApiFailure::NoResponse { detail };
                        queue.extend(target.complete(request, Err(failure)));
                    }
                }
            }
            ControllerEvent::Confirm(_) if on_screen => {
                state.dispatch(AppCommand::Enter(AppMode::Confirm));
            }
            ControllerEvent::Notify(notice) => emit_notice(state, view_data, tx, notice),
            ControllerEvent::FormClosed if on_screen && state.mode == AppMode::Form => {
                state.dispatch(AppCommand::ExitToNav);
            }
            ControllerEvent::DetailLoaded if on_screen && state.mode == AppMode::Nav => {
                state.dispatch(AppCommand::Enter(AppMode::Detail));
            }
            ControllerEvent::Confirm(_)
            | ControllerEvent::FormClosed
            | ControllerEvent::DetailLoaded => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64, after: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(after);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_notice(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    notice: Notice,
) {
    state.dispatch(AppCommand::SetStatus(notice.message));
    view_data.status_kind = notice.kind;
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token, notice.duration);
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: NoticeKind,
    message: impl Into<String>,
) {
    let notice = Notice {
        kind,
        message: message.into(),
        duration: view_data.settings.alert_duration,
    };
    emit_notice(state, view_data, internal_tx, notice);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match state.mode {
        AppMode::Nav => return handle_nav_key(state, runtime, view_data, internal_tx, key),
        AppMode::Search => handle_search_key(state, view_data, key),
        AppMode::Form => handle_form_key(state, runtime, view_data, internal_tx, key),
        AppMode::Confirm => handle_confirm_key(state, runtime, view_data, internal_tx, key),
        AppMode::Detail => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                if let Some(screen) = view_data.screens.get_mut(state.active_screen) {
                    screen.close_detail();
                }
                state.dispatch(AppCommand::ExitToNav);
            }
        }
    }
    false
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab | KeyCode::Char('l') => {
            state.dispatch(AppCommand::NextScreen);
            return false;
        }
        KeyCode::BackTab | KeyCode::Char('h') => {
            state.dispatch(AppCommand::PrevScreen);
            return false;
        }
        KeyCode::Char(digit @ '1'..='5') => {
            let index = usize::from(digit as u8 - b'1');
            if let Some(screen) = ScreenKind::ALL.get(index) {
                state.dispatch(AppCommand::Goto(*screen));
            }
            return false;
        }
        KeyCode::Char('r') if state.active_screen == ScreenKind::Dashboard => {
            for kind in ScreenKind::ALL {
                if let Some(screen) = view_data.screens.get_mut(kind) {
                    let events = screen.refresh();
                    apply_controller_events(state, runtime, view_data, internal_tx, kind, events);
                }
            }
            emit_status(state, view_data, internal_tx, NoticeKind::Info, "refreshing");
            return false;
        }
        _ => {}
    }

    let kind = state.active_screen;
    let Some(screen) = view_data.screens.get_mut(kind) else {
        return false;
    };

    let mut nothing_selected = false;
    let events = match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            screen.move_cursor(1);
            Vec::new()
        }
        KeyCode::Char('k') | KeyCode::Up => {
            screen.move_cursor(-1);
            Vec::new()
        }
        KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
            screen.page(PageNav::Next);
            Vec::new()
        }
        KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
            screen.page(PageNav::Prev);
            Vec::new()
        }
        KeyCode::Char('g') | KeyCode::Home => {
            screen.page(PageNav::First);
            Vec::new()
        }
        KeyCode::Char('G') | KeyCode::End => {
            screen.page(PageNav::Last);
            Vec::new()
        }
        KeyCode::Char('/') => {
            state.dispatch(AppCommand::Enter(AppMode::Search));
            Vec::new()
        }
        KeyCode::Esc => {
            if !screen.search_term().is_empty() {
                screen.set_search_term(String::new());
            }
            Vec::new()
        }
        KeyCode::Char('r') => screen.refresh(),
        KeyCode::Char('a') => {
            screen.open_create();
            state.dispatch(AppCommand::Enter(AppMode::Form));
            Vec::new()
        }
        KeyCode::Char('e') => {
            if screen.open_edit_selected() {
                state.dispatch(AppCommand::Enter(AppMode::Form));
            } else {
                nothing_selected = true;
            }
            Vec::new()
        }
        KeyCode::Char('d') => screen.delete_selected(),
        KeyCode::Char('t') => screen.toggle_selected(),
        KeyCode::Enter => screen.show_selected(),
        _ => Vec::new(),
    };
    if nothing_selected {
        emit_status(state, view_data, internal_tx, NoticeKind::Info, "no row selected");
    }
    apply_controller_events(state, runtime, view_data, internal_tx, kind, events);
    false
}

fn handle_search_key(state: &mut AppState, view_data: &mut ViewData, key: KeyEvent) {
    let Some(screen) = view_data.screens.get_mut(state.active_screen) else {
        state.dispatch(AppCommand::ExitToNav);
        return;
    };
    match key.code {
        KeyCode::Enter => {
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Esc => {
            screen.set_search_term(String::new());
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Backspace => {
            let mut term = screen.search_term().to_owned();
            term.pop();
            screen.set_search_term(term);
        }
        KeyCode::Char(ch) => {
            let mut term = screen.search_term().to_owned();
            term.push(ch);
            screen.set_search_term(term);
        }
        _ => {}
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let kind = state.active_screen;
    let Some(screen) = view_data.screens.get_mut(kind) else {
        state.dispatch(AppCommand::ExitToNav);
        return;
    };
    let events = match key.code {
        KeyCode::Esc => {
            screen.close_form();
            state.dispatch(AppCommand::ExitToNav);
            Vec::new()
        }
        KeyCode::Tab | KeyCode::Down => {
            screen.focus_field(1);
            Vec::new()
        }
        KeyCode::BackTab | KeyCode::Up => {
            screen.focus_field(-1);
            Vec::new()
        }
        KeyCode::Enter => screen.submit(),
        KeyCode::Backspace => {
            screen.erase_char();
            Vec::new()
        }
        KeyCode::Char(ch) => {
            screen.type_char(ch);
            Vec::new()
        }
        _ => Vec::new(),
    };
    apply_controller_events(state, runtime, view_data, internal_tx, kind, events);
}

fn handle_confirm_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let accepted = match key.code {
        KeyCode::Char('y') | KeyCode::Enter => true,
        KeyCode::Char('n') | KeyCode::Esc => false,
        _ => return,
    };
    let kind = state.active_screen;
    state.dispatch(AppCommand::ExitToNav);
    let Some(screen) = view_data.screens.get_mut(kind) else {
        return;
    };
    let events = screen.resolve_confirmation(accepted);
    apply_controller_events(state, runtime, view_data, internal_tx, kind, events);
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let selected = ScreenKind::ALL
        .iter()
        .position(|screen| *screen == state.active_screen)
        .unwrap_or(0);
    let titles = ScreenKind::ALL
        .iter()
        .map(|screen| tab_title(*screen, view_data))
        .collect::<Vec<String>>();
    let tabs = Tabs::new(titles)
        .block(Block::default().title("backoffice").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    match view_data.screens.get(state.active_screen) {
        Some(screen) => render_list(frame, layout[1], state, screen),
        None => {
            let summary = view_data.screens.summary(view_data.year);
            let body = Paragraph::new(render_dashboard_text(&summary))
                .block(Block::default().borders(Borders::ALL).title("dashboard"));
            frame.render_widget(body, layout[1]);
        }
    }

    let status_color = match (&state.status_line, view_data.status_kind) {
        (Some(_), NoticeKind::Error) => Color::Red,
        (Some(_), NoticeKind::Success) => Color::Green,
        _ => Color::Yellow,
    };
    let status_widget = Paragraph::new(status_text(state))
        .style(Style::default().fg(status_color))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_widget, layout[2]);

    let Some(screen) = view_data.screens.get(state.active_screen) else {
        return;
    };
    match state.mode {
        AppMode::Form => {
            if let Some(form) = screen.form() {
                let area = centered_rect(60, 60, frame.area());
                frame.render_widget(Clear, area);
                let widget = Paragraph::new(render_form_text(&form)).block(
                    Block::default()
                        .title(form.title.as_str())
                        .borders(Borders::ALL)
                        .style(Style::default().fg(Color::Cyan)),
                );
                frame.render_widget(widget, area);
            }
        }
        AppMode::Confirm => {
            if let Some(prompt) = screen.confirm_prompt() {
                let area = centered_rect(50, 25, frame.area());
                frame.render_widget(Clear, area);
                let widget = Paragraph::new(format!("{}\n\ny confirm | n cancel", prompt.body))
                    .wrap(Wrap { trim: true })
                    .block(
                        Block::default()
                            .title(prompt.title.as_str())
                            .borders(Borders::ALL)
                            .style(Style::default().fg(Color::Yellow)),
                    );
                frame.render_widget(widget, area);
            }
        }
        AppMode::Detail => {
            if let Some(detail) = screen.detail() {
                let area = centered_rect(60, 50, frame.area());
                frame.render_widget(Clear, area);
                let widget = Paragraph::new(render_detail_text(&detail)).block(
                    Block::default()
                        .title("detail")
                        .borders(Borders::ALL)
                        .style(Style::default().fg(Color::Cyan)),
                );
                frame.render_widget(widget, area);
            }
        }
        AppMode::Nav | AppMode::Search => {}
    }
}

fn tab_title(screen: ScreenKind, view_data: &ViewData) -> String {
    match view_data.screens.get(screen) {
        Some(list) => {
            let table = list.table();
            if table.loading && table.total == 0 {
                format!("{} (..)", screen.label())
            } else {
                format!("{} ({})", screen.label(), table.total)
            }
        }
        None => screen.label().to_owned(),
    }
}

fn render_list(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, screen: &dyn Screen) {
    let table = screen.table();
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let search = Paragraph::new(search_line(&table, state.mode == AppMode::Search));
    frame.render_widget(search, parts[0]);

    let widths = vec![Constraint::Min(6); table.columns.len().max(1)];
    let header = Row::new(table.columns.iter().map(|column| {
        Cell::from(*column).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let rows = table.rows.iter().enumerate().map(|(index, row)| {
        let mut style = Style::default();
        if !row.active {
            style = style.fg(Color::DarkGray);
        }
        if row.busy {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if index == table.cursor {
            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        }
        Row::new(row.cells.iter().map(|cell| Cell::from(cell.as_str()))).style(style)
    });
    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(state.active_screen, &table))
                .borders(Borders::ALL),
        );
    frame.render_widget(widget, parts[1]);

    let pages = Paragraph::new(page_bar_text(&table.window));
    frame.render_widget(pages, parts[2]);
}

fn search_line(table: &TableView, editing: bool) -> String {
    let cursor = if editing { "_" } else { "" };
    format!("/ {}{cursor}", table.search_term)
}

fn table_title(screen: ScreenKind, table: &TableView) -> String {
    let mut title = if table.search_term.is_empty() {
        format!("{} {}", screen.label(), table.total)
    } else {
        format!("{} {}/{}", screen.label(), table.matched, table.total)
    };
    if table.loading {
        title.push_str(" loading");
    }
    if let Some(error) = &table.load_error {
        title.push_str(" | ");
        title.push_str(error);
    }
    title
}

fn page_bar_text(window: &PageWindow) -> String {
    let mut parts = Vec::new();
    if window.has_prev() {
        parts.push("«".to_owned());
    }
    if window.show_first_jump() {
        parts.push("1".to_owned());
        if window.start_page > 2 {
            parts.push("…".to_owned());
        }
    }
    for page in window.pages() {
        if page == window.current_page {
            parts.push(format!("[{page}]"));
        } else {
            parts.push(page.to_string());
        }
    }
    if window.show_last_jump() {
        if window.end_page + 1 < window.total_pages {
            parts.push("…".to_owned());
        }
        parts.push(window.total_pages.to_string());
    }
    if window.has_next() {
        parts.push("»".to_owned());
    }
    parts.join(" ")
}

fn render_form_text(form: &FormView) -> String {
    let mut lines = Vec::new();
    if let Some(error) = &form.general_error {
        lines.push(format!("! {error}"));
        lines.push(String::new());
    }
    for field in &form.fields {
        let marker = if field.focused { ">" } else { " " };
        lines.push(format!("{marker} {}: {}", field.label, field.value));
        if let Some(error) = &field.error {
            lines.push(format!("    {error}"));
        }
    }
    lines.push(String::new());
    let footer = if form.saving {
        "saving..."
    } else if form.submit_disabled {
        "tab next | esc cancel"
    } else {
        "tab next | enter save | esc cancel"
    };
    lines.push(footer.to_owned());
    lines.join("\n")
}

fn render_detail_text(detail: &[(&'static str, String)]) -> String {
    let width = detail
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);
    detail
        .iter()
        .map(|(label, value)| format!("{label:<width$}  {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_dashboard_text(summary: &DashboardSummary) -> String {
    let mut lines = vec!["records".to_owned()];
    for (label, counts) in [
        ("clients", summary.clients),
        ("payments", summary.payments),
        ("roles", summary.roles),
        ("users", summary.users),
    ] {
        lines.push(format!(
            "  {label:<9} {:>5} active {:>5} inactive",
            counts.active, counts.inactive
        ));
    }

    lines.push(String::new());
    lines.push(format!("payments {}", summary.year));
    for (number, cents) in (1..=12_u8).zip(summary.monthly_cents) {
        let month = Month::try_from(number)
            .map(|month| month.to_string())
            .unwrap_or_default();
        lines.push(format!("  {month:<9} {:>12}", format_cents(cents)));
    }
    lines.push(format!(
        "  {:<9} {:>12}",
        "total",
        format_cents(summary.year_total_cents())
    ));

    lines.push(String::new());
    lines.push("users per role".to_owned());
    if summary.users_per_role.is_empty() {
        lines.push("  none".to_owned());
    }
    for (role, count) in &summary.users_per_role {
        lines.push(format!("  {role:<12} {count:>5}"));
    }
    lines.join("\n")
}

fn status_text(state: &AppState) -> String {
    let mode = match state.mode {
        AppMode::Nav => "NAV",
        AppMode::Search => "SEARCH",
        AppMode::Form => "FORM",
        AppMode::Confirm => "CONFIRM",
        AppMode::Detail => "DETAIL",
    };
    let hints = match state.mode {
        AppMode::Nav => "tab/1-5 screen | j/k row | n/p g/G page | / search | a e d t | enter open | r | q",
        AppMode::Search => "type to filter | enter keep | esc clear",
        AppMode::Form => "tab field | enter save | esc cancel",
        AppMode::Confirm => "y confirm | n cancel",
        AppMode::Detail => "esc close",
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InternalEvent, ViewData, handle_key_event, load_all,
        page_bar_text, process_internal_events, render, render_dashboard_text, status_text,
    };
    use backoffice_app::pagination::paginate;
    use backoffice_app::{
        ApiFailure, AppMode, AppState, DashboardSummary, HttpMethod, ListSettings, NoticeKind,
        RequestId, Route, ScreenKind, Transport,
    };
    use backoffice_testkit::{MemoryApi, OfficeFaker};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use serde_json::Value;
    use std::sync::mpsc::{self, Receiver, Sender};

    struct TestRuntime {
        api: MemoryApi,
        refuse_spawns: bool,
    }

    impl AppRuntime for TestRuntime {
        fn execute(&mut self, route: &Route) -> Result<Value, ApiFailure> {
            self.api.send(route)
        }

        fn current_year(&self) -> i32 {
            2026
        }

        fn spawn_request(
            &mut self,
            screen: ScreenKind,
            request: RequestId,
            route: Route,
            tx: Sender<InternalEvent>,
        ) -> anyhow::Result<()> {
            if self.refuse_spawns {
                anyhow::bail!("worker pool exhausted");
            }
            let outcome = self.execute(&route);
            tx.send(InternalEvent::Reply {
                screen,
                request,
                outcome,
            })
            .map_err(|_| anyhow::anyhow!("reply channel closed"))
        }
    }

    struct Harness {
        state: AppState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: Sender<InternalEvent>,
        rx: Receiver<InternalEvent>,
    }

    impl Harness {
        fn new(clients: usize, payments: usize, users: usize) -> Self {
            let api = MemoryApi::new(OfficeFaker::new(11).dataset(clients, payments, users));
            let (tx, rx) = mpsc::channel();
            let mut harness = Self {
                state: AppState::starting_on(ScreenKind::Clients),
                runtime: TestRuntime {
                    api,
                    refuse_spawns: false,
                },
                view_data: ViewData::new(ListSettings::default(), 2026),
                tx,
                rx,
            };
            load_all(
                &mut harness.state,
                &mut harness.runtime,
                &mut harness.view_data,
                &harness.tx,
            );
            harness.settle();
            harness
        }

        fn settle(&mut self) {
            process_internal_events(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                &self.rx,
            );
        }

        fn press(&mut self, code: KeyCode) -> bool {
            let quit = handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, KeyModifiers::NONE),
            );
            self.settle();
            quit
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn clients(&self) -> super::TableView {
            self.view_data
                .screens
                .get(ScreenKind::Clients)
                .expect("clients screen")
                .table()
        }
    }

    #[test]
    fn startup_loads_every_list() {
        let harness = Harness::new(12, 5, 3);
        let table = harness.clients();
        assert_eq!(table.total, 12);
        assert_eq!(table.rows.len(), 10);
        let roles = harness
            .view_data
            .screens
            .get(ScreenKind::Roles)
            .expect("roles")
            .table();
        assert_eq!(roles.total, 4);
        assert_eq!(harness.runtime.api.count(HttpMethod::Get, "/users"), 1);
    }

    #[test]
    fn paging_keys_move_through_the_list() {
        let mut harness = Harness::new(25, 0, 0);
        harness.press(KeyCode::Char('n'));
        assert_eq!(harness.clients().window.current_page, 2);
        harness.press(KeyCode::Char('G'));
        assert_eq!(harness.clients().window.current_page, 3);
        assert_eq!(harness.clients().rows.len(), 5);
        harness.press(KeyCode::Char('g'));
        assert_eq!(harness.clients().window.current_page, 1);
    }

    #[test]
    fn search_mode_filters_as_you_type() {
        let mut harness = Harness::new(12, 0, 0);
        let first_name = harness.clients().rows[0].cells[1].clone();
        harness.press(KeyCode::Char('/'));
        assert_eq!(harness.state.mode, AppMode::Search);
        harness.type_text(&first_name);
        let table = harness.clients();
        assert!(table.matched >= 1);
        assert!(table.rows.iter().all(|row| row.cells[1] == first_name));

        harness.press(KeyCode::Esc);
        assert_eq!(harness.state.mode, AppMode::Nav);
        assert_eq!(harness.clients().matched, 12);
    }

    #[test]
    fn create_form_saves_and_returns_to_nav() {
        let mut harness = Harness::new(3, 0, 0);
        harness.press(KeyCode::Char('a'));
        assert_eq!(harness.state.mode, AppMode::Form);

        harness.type_text("Ana Torres");
        harness.press(KeyCode::Tab);
        harness.type_text("ana@example.com");
        harness.press(KeyCode::Tab);
        harness.type_text("5512345678");
        harness.press(KeyCode::Tab);
        harness.type_text("Calle Madero 12");
        harness.press(KeyCode::Enter);

        assert_eq!(harness.state.mode, AppMode::Nav);
        assert_eq!(harness.clients().total, 4);
        assert_eq!(harness.state.status_line.as_deref(), Some("client created"));
        assert_eq!(harness.runtime.api.count(HttpMethod::Post, "/clients"), 1);
    }

    #[test]
    fn invalid_form_stays_open_without_network() {
        let mut harness = Harness::new(3, 0, 0);
        harness.press(KeyCode::Char('a'));
        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.mode, AppMode::Form);
        assert_eq!(harness.runtime.api.count(HttpMethod::Post, "/clients"), 0);

        harness.press(KeyCode::Esc);
        assert_eq!(harness.state.mode, AppMode::Nav);
        assert!(
            harness
                .view_data
                .screens
                .get(ScreenKind::Clients)
                .expect("clients")
                .form()
                .is_none()
        );
    }

    #[test]
    fn toggle_asks_first_then_patches() {
        let mut harness = Harness::new(3, 0, 0);
        harness.press(KeyCode::Char('t'));
        assert_eq!(harness.state.mode, AppMode::Confirm);
        assert_eq!(harness.runtime.api.calls().len(), 4);

        harness.press(KeyCode::Char('n'));
        assert_eq!(harness.state.mode, AppMode::Nav);
        assert_eq!(harness.runtime.api.calls().len(), 4);

        let before = harness.clients().rows[0].active;
        harness.press(KeyCode::Char('t'));
        harness.press(KeyCode::Char('y'));
        assert_eq!(harness.clients().rows[0].active, !before);
    }

    #[test]
    fn unstarted_toggle_releases_the_row() {
        let mut harness = Harness::new(3, 0, 0);
        let before = harness.clients().rows[0].active;
        harness.runtime.refuse_spawns = true;
        harness.press(KeyCode::Char('t'));
        harness.press(KeyCode::Char('y'));

        assert!(!harness.clients().rows[0].busy);
        assert_eq!(harness.view_data.status_kind, NoticeKind::Error);
        assert_eq!(harness.runtime.api.calls().len(), 4);

        harness.runtime.refuse_spawns = false;
        harness.press(KeyCode::Char('t'));
        assert_eq!(harness.state.mode, AppMode::Confirm);
        harness.press(KeyCode::Char('y'));
        assert_eq!(harness.clients().rows[0].active, !before);
    }

    #[test]
    fn unstarted_save_leaves_the_form_editable() {
        let mut harness = Harness::new(3, 0, 0);
        harness.press(KeyCode::Char('a'));
        harness.type_text("Ana Torres");
        harness.press(KeyCode::Tab);
        harness.type_text("ana@example.com");
        harness.press(KeyCode::Tab);
        harness.type_text("5512345678");
        harness.runtime.refuse_spawns = true;
        harness.press(KeyCode::Enter);

        assert_eq!(harness.state.mode, AppMode::Form);
        let form = harness
            .view_data
            .screens
            .get(ScreenKind::Clients)
            .and_then(|screen| screen.form())
            .expect("form stays open");
        assert!(!form.saving);
        assert!(!form.submit_disabled);
        assert!(form.general_error.is_some());

        harness.runtime.refuse_spawns = false;
        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.mode, AppMode::Nav);
        assert_eq!(harness.clients().total, 4);
    }

    #[test]
    fn enter_opens_detail_and_esc_closes_it() {
        let mut harness = Harness::new(3, 0, 0);
        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.mode, AppMode::Detail);
        harness.press(KeyCode::Esc);
        assert_eq!(harness.state.mode, AppMode::Nav);
    }

    #[test]
    fn number_keys_jump_between_screens() {
        let mut harness = Harness::new(1, 0, 0);
        harness.press(KeyCode::Char('5'));
        assert_eq!(harness.state.active_screen, ScreenKind::Users);
        harness.press(KeyCode::Char('1'));
        assert_eq!(harness.state.active_screen, ScreenKind::Dashboard);
        assert!(harness.press(KeyCode::Char('q')));
    }

    #[test]
    fn stale_status_clear_is_ignored() {
        let mut harness = Harness::new(1, 0, 0);
        harness.press(KeyCode::Char('3'));
        harness.press(KeyCode::Char('e'));
        assert_eq!(harness.state.status_line.as_deref(), Some("no row selected"));

        let stale = harness.view_data.status_token - 1;
        harness
            .tx
            .send(InternalEvent::ClearStatus { token: stale })
            .expect("send");
        harness.settle();
        assert!(harness.state.status_line.is_some());

        let current = harness.view_data.status_token;
        harness
            .tx
            .send(InternalEvent::ClearStatus { token: current })
            .expect("send");
        harness.settle();
        assert_eq!(harness.state.status_line, None);
    }

    #[test]
    fn page_bar_marks_current_and_elides() {
        assert_eq!(page_bar_text(&paginate(120, 5, 10, 3)), "« 1 … 4 [5] 6 … 12 »");
        assert_eq!(page_bar_text(&paginate(12, 1, 10, 5)), "[1] 2 »");
        assert_eq!(page_bar_text(&paginate(0, 1, 10, 5)), "[1]");
    }

    #[test]
    fn dashboard_text_lists_counts_and_months() {
        let data = OfficeFaker::new(4).dataset(5, 10, 3);
        let summary =
            DashboardSummary::compute(&data.clients, &data.payments, &data.roles, &data.users, 2026);
        let text = render_dashboard_text(&summary);
        assert!(text.contains("payments 2026"));
        assert!(text.contains("January"));
        assert!(text.contains("December"));
        assert!(text.contains("users per role"));
    }

    #[test]
    fn status_text_shows_mode_and_message() {
        let mut state = AppState::default();
        assert!(status_text(&state).starts_with("NAV | "));
        state.status_line = Some("client created".to_owned());
        state.mode = AppMode::Form;
        assert!(status_text(&state).starts_with("FORM | client created | "));
    }

    #[test]
    fn render_draws_every_screen() -> anyhow::Result<()> {
        let mut harness = Harness::new(12, 8, 4);
        let mut terminal = Terminal::new(TestBackend::new(100, 30))?;
        for _ in 0..5 {
            terminal.draw(|frame| render(frame, &harness.state, &harness.view_data))?;
            harness.press(KeyCode::Tab);
        }
        harness.press(KeyCode::Char('2'));
        harness.press(KeyCode::Char('a'));
        terminal.draw(|frame| render(frame, &harness.state, &harness.view_data))?;
        Ok(())
    }
}
