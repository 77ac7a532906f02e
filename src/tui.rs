use std::io;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;

use crate::cli::{self, PromptCommand};
use crate::core::client::QueueClient;
use crate::core::error::JwError;
use crate::core::event::PollEvent;
use crate::core::job::JobState;
use crate::core::launcher::JobLauncher;
use crate::core::poller::StatusPoller;
use crate::core::row::{build_rows, format_columns, header_line, now_epoch, state_tag, DisplayRow};

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, JwError> {
        enable_raw_mode().map_err(|e| JwError::Terminal {
            message: e.to_string(),
        })?;
        let mut stdout = io::stdout();
        stdout
            .execute(EnterAlternateScreen)
            .map_err(|e| JwError::Terminal {
                message: e.to_string(),
            })?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

#[derive(Debug)]
struct AppState {
    server: String,
    interval_label: String,
    input: String,
    log: Vec<String>,
    rows: Vec<DisplayRow>,
    last_updated: Option<String>,
    last_error: Option<String>,
    should_quit: bool,
    scroll_offset: usize,
    view_lines: usize,
    tick: u64,
}

impl AppState {
    fn new(server: &str, interval: Duration) -> Self {
        let mut log = Vec::new();
        log.push("Welcome to jw. Type 'help' for commands.".to_string());
        Self {
            server: server.to_string(),
            interval_label: interval_label(interval),
            input: String::new(),
            log,
            rows: Vec::new(),
            last_updated: None,
            last_error: None,
            should_quit: false,
            scroll_offset: 0,
            view_lines: 1,
            tick: 0,
        }
    }

    fn push_log(&mut self, line: impl Into<String>) {
        const MAX_LINES: usize = 200;
        if self.log.len() >= MAX_LINES {
            let drain_count = self.log.len().saturating_sub(MAX_LINES - 1);
            self.log.drain(0..drain_count);
        }
        self.log.push(line.into());
    }

    fn state_counts(&self) -> (usize, usize, usize) {
        let mut queued = 0;
        let mut running = 0;
        let mut finished = 0;
        for row in &self.rows {
            match row.state {
                JobState::Queued => queued += 1,
                JobState::Running => running += 1,
                JobState::Finished => finished += 1,
            }
        }
        (queued, running, finished)
    }

    fn set_view_lines(&mut self, lines: usize) {
        self.view_lines = lines.max(1);
        self.clamp_scroll();
    }

    fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    fn scroll_down(&mut self, lines: usize) {
        let max_scroll = self.max_scroll();
        self.scroll_offset = (self.scroll_offset + lines).min(max_scroll);
    }

    fn scroll_top(&mut self) {
        self.scroll_offset = 0;
    }

    fn scroll_bottom(&mut self) {
        self.scroll_offset = self.max_scroll();
    }

    fn max_scroll(&self) -> usize {
        self.rows.len().saturating_sub(self.view_lines)
    }

    fn clamp_scroll(&mut self) {
        let max_scroll = self.max_scroll();
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }
    }
}

pub fn run(server: &str, interval: Duration) -> Result<(), JwError> {
    let client = QueueClient::new(server)?;
    let (event_tx, event_rx) = mpsc::channel::<PollEvent>();
    let mut poller = StatusPoller::new(client.clone(), interval, event_tx.clone());
    let launcher = JobLauncher::new(client, event_tx);

    let _guard = TerminalGuard::enter()?;
    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| JwError::Terminal {
        message: e.to_string(),
    })?;

    let mut app = AppState::new(server, interval);
    poller.fire();

    loop {
        while let Ok(poll_event) = event_rx.try_recv() {
            match poll_event {
                PollEvent::Status(map) => {
                    poller.complete();
                    app.rows = build_rows(&map, now_epoch());
                    app.last_updated =
                        Some(chrono::Local::now().format("%H:%M:%S").to_string());
                    app.last_error = None;
                    app.clamp_scroll();
                }
                PollEvent::PollFailed(message) => {
                    poller.complete();
                    app.last_error = Some(message);
                }
                PollEvent::JobStarted(id) => {
                    app.push_log(format!("started job #{id}"));
                    poller.fire();
                }
                PollEvent::StartFailed(message) => {
                    app.push_log(format!("start-job failed: {message}"));
                }
            }
        }

        poller.tick();

        let size = terminal.size().map_err(|e| JwError::Terminal {
            message: e.to_string(),
        })?;
        let table_height = size.height.saturating_sub(13).max(4) as usize;
        app.set_view_lines(table_height.saturating_sub(3).max(1));

        app.tick = app.tick.wrapping_add(1);

        terminal
            .draw(|frame| {
                let layout = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(5),
                        Constraint::Min(4),
                        Constraint::Length(5),
                        Constraint::Length(3),
                    ])
                    .split(frame.size());

                frame.render_widget(render_header(&app, &poller), layout[0]);
                frame.render_widget(render_jobs(&app, layout[1].height as usize), layout[1]);
                frame.render_widget(render_log(&app, layout[2].height as usize), layout[2]);

                let input = Paragraph::new(app.input.as_str())
                    .block(Block::default().title("Command").borders(Borders::ALL))
                    .wrap(Wrap { trim: false });
                frame.render_widget(input, layout[3]);
                frame.set_cursor(layout[3].x + 1 + app.input.len() as u16, layout[3].y + 1);
            })
            .map_err(|e| JwError::Terminal {
                message: e.to_string(),
            })?;

        if event::poll(Duration::from_millis(50)).map_err(|e| JwError::Terminal {
            message: e.to_string(),
        })? {
            if let Event::Key(key) = event::read().map_err(|e| JwError::Terminal {
                message: e.to_string(),
            })? {
                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.should_quit = true;
                    }
                    KeyCode::Char(ch) => {
                        app.input.push(ch);
                    }
                    KeyCode::Backspace => {
                        app.input.pop();
                    }
                    KeyCode::Enter => {
                        let line = app.input.trim().to_string();
                        app.input.clear();
                        if !line.is_empty() {
                            handle_line(&mut app, &line, &mut poller, &launcher);
                        }
                    }
                    KeyCode::PageUp => {
                        let step = app.view_lines.saturating_sub(1).max(1);
                        app.scroll_up(step);
                    }
                    KeyCode::PageDown => {
                        let step = app.view_lines.saturating_sub(1).max(1);
                        app.scroll_down(step);
                    }
                    KeyCode::Up => {
                        app.scroll_up(1);
                    }
                    KeyCode::Down => {
                        app.scroll_down(1);
                    }
                    KeyCode::Home => {
                        app.scroll_top();
                    }
                    KeyCode::End => {
                        app.scroll_bottom();
                    }
                    KeyCode::Esc => {
                        app.should_quit = true;
                    }
                    _ => {}
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_line(
    app: &mut AppState,
    line: &str,
    poller: &mut StatusPoller,
    launcher: &JobLauncher,
) {
    app.push_log(format!(">> {line}"));

    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
        app.should_quit = true;
        return;
    }

    if line.eq_ignore_ascii_case("clear") {
        app.log.clear();
        return;
    }

    if line.eq_ignore_ascii_case("help") {
        app.push_log("Commands:".to_string());
        app.push_log("  start    - enqueue a new job on the server".to_string());
        app.push_log("  refresh  - poll the server right now".to_string());
        app.push_log("  clear / quit".to_string());
        return;
    }

    match cli::parse_line(line) {
        Ok(PromptCommand::Start) => {
            app.push_log("requesting a new job".to_string());
            launcher.trigger();
        }
        Ok(PromptCommand::Refresh) => {
            poller.fire();
        }
        Err(err) => {
            // clap errors span several lines; the first one is enough here
            let brief = err.lines().next().unwrap_or("invalid command").to_string();
            app.push_log(format!("error: {brief}"));
        }
    }
}

fn render_header(app: &AppState, poller: &StatusPoller) -> Paragraph<'static> {
    let (queued, running, finished) = app.state_counts();
    let updated = match &app.last_updated {
        Some(stamp) => stamp.clone(),
        None => "never".to_string(),
    };
    let spinner = if poller.in_flight() {
        SPINNER[(app.tick as usize) % SPINNER.len()]
    } else {
        ' '
    };

    let mut text = vec![
        Line::from(Span::raw(format!(
            "Server: {}   polling every {}",
            app.server, app.interval_label
        ))),
        Line::from(vec![
            Span::raw(format!("Updated {updated} {spinner}  ")),
            Span::styled(
                format!("{queued} queued"),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("  "),
            Span::styled(
                format!("{running} running"),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("  "),
            Span::styled(
                format!("{finished} finished"),
                Style::default().fg(Color::Green),
            ),
        ]),
    ];
    if let Some(error) = &app.last_error {
        text.push(Line::from(Span::styled(
            format!("stale: {error}"),
            Style::default().fg(Color::Red),
        )));
    }

    Paragraph::new(text)
        .block(Block::default().title("jw").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

fn render_jobs(app: &AppState, height: usize) -> Paragraph<'static> {
    let max_lines = height.saturating_sub(3).max(1);
    let start = app.scroll_offset.min(app.rows.len());
    let end = (start + max_lines).min(app.rows.len());

    let mut lines = Vec::with_capacity(end - start + 1);
    lines.push(Line::from(Span::styled(
        header_line(),
        Style::default().add_modifier(Modifier::BOLD),
    )));

    if app.rows.is_empty() {
        lines.push(Line::from(Span::styled(
            "(no jobs)",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        for row in &app.rows[start..end] {
            lines.push(line_for_row(row));
        }
    }

    Paragraph::new(lines)
        .block(Block::default().title("Jobs").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
}

fn line_for_row(row: &DisplayRow) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{:<9} ", state_tag(row.state)),
            state_style(row.state),
        ),
        Span::raw(format_columns(row)),
    ])
}

fn state_style(state: JobState) -> Style {
    match state {
        JobState::Queued => Style::default().fg(Color::Yellow),
        JobState::Running => Style::default().fg(Color::Cyan),
        JobState::Finished => Style::default().fg(Color::Green),
    }
}

fn render_log(app: &AppState, height: usize) -> Paragraph<'static> {
    let max_lines = height.saturating_sub(2).max(1);
    let start = app.log.len().saturating_sub(max_lines);
    let lines: Vec<Line> = app.log[start..]
        .iter()
        .map(|line| Line::from(line.clone()))
        .collect();

    Paragraph::new(lines)
        .block(Block::default().title("Activity").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
}

fn interval_label(interval: Duration) -> String {
    if interval.subsec_millis() == 0 {
        format!("{}s", interval.as_secs())
    } else {
        format!("{}ms", interval.as_millis())
    }
}
