//! インタラクティブレンダラー（ratatui + crossterm）
//!
//! 全サーバーのパネルを設定順にグリッド表示し、ラウンド完了通知と
//! 内部tickの両方で再描画する。終了キー（q / Esc / Ctrl+C）は
//! SIGINTと同じ [`ShutdownSignal`] を発火させ、スケジューラと
//! 協調して停止する。
//!
//! 描画本体は専用タスクが所有する。`render_round` は共有の
//! UI状態を差し替えて通知するだけで、端末には触れない。

use super::{RenderError, Renderer};
use crate::shutdown::ShutdownSignal;
use crate::types::{ProbeOutcome, ProbeStatus, RoundSnapshot, ServerDescriptor, ServerStatus, TokenUsage};
use async_trait::async_trait;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

/// 再描画tick間隔
const TICK: Duration = Duration::from_millis(250);

/// 描画タスクと共有するUI状態
struct UiState {
    round: u64,
    view: Vec<ServerStatus>,
    delay: Option<Duration>,
    next_round_at: Option<Instant>,
}

/// インタラクティブレンダラー
pub struct InteractiveRenderer {
    state: Arc<Mutex<UiState>>,
    refreshed: Arc<Notify>,
    delay: Option<Duration>,
    ui_task: Option<JoinHandle<io::Result<()>>>,
}

impl InteractiveRenderer {
    /// 端末をセットアップし、描画タスクを起動する
    ///
    /// `delay` は継続モードのラウンド間隔（カウントダウン表示用）。
    pub fn new(
        shutdown: ShutdownSignal,
        descriptors: &[ServerDescriptor],
        delay: Option<Duration>,
    ) -> Self {
        let state = Arc::new(Mutex::new(UiState {
            round: 0,
            view: descriptors
                .iter()
                .map(|d| ServerStatus::new(d.clone()))
                .collect(),
            delay,
            next_round_at: None,
        }));
        let refreshed = Arc::new(Notify::new());

        let ui_task = tokio::spawn(ui_loop(
            Arc::clone(&state),
            Arc::clone(&refreshed),
            shutdown,
        ));

        Self {
            state,
            refreshed,
            delay,
            ui_task: Some(ui_task),
        }
    }
}

#[async_trait]
impl Renderer for InteractiveRenderer {
    fn is_interactive(&self) -> bool {
        true
    }

    async fn render_round(
        &mut self,
        round: u64,
        _snapshot: &RoundSnapshot,
        view: &[ServerStatus],
    ) -> Result<(), RenderError> {
        {
            let mut state = self.state.lock().await;
            state.round = round;
            state.view = view.to_vec();
            state.next_round_at = self.delay.map(|d| Instant::now() + d);
        }
        self.refreshed.notify_one();
        Ok(())
    }

    /// 描画タスクの終了を待ち、端末を復元する
    ///
    /// タスクはシャットダウン要求で抜けるため、ワンショット実行では
    /// ユーザーの終了キー（またはSIGINT）まで表示が残る。
    async fn close(&mut self) -> Result<(), RenderError> {
        if let Some(task) = self.ui_task.take() {
            task.await
                .map_err(|e| RenderError::TaskFailed(e.to_string()))??;
        }
        Ok(())
    }
}

/// 描画・入力ループ（端末を排他所有する）
async fn ui_loop(
    state: Arc<Mutex<UiState>>,
    refreshed: Arc<Notify>,
    shutdown: ShutdownSignal,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(TICK);

    loop {
        {
            let state = state.lock().await;
            terminal.draw(|frame| draw(frame, &state))?;
        }

        tokio::select! {
            _ = shutdown.wait() => break,
            _ = ticker.tick() => {}
            _ = refreshed.notified() => {}
            maybe_event = events.next() => {
                if let Some(Ok(Event::Key(key))) = maybe_event {
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => shutdown.request(),
                            KeyCode::Char('c')
                                if key.modifiers.contains(KeyModifiers::CONTROL) =>
                            {
                                shutdown.request()
                            }
                            _ => {}
                        }
                    }
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn draw(frame: &mut Frame, state: &UiState) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    frame.render_widget(header(state), layout[0]);
    draw_server_grid(frame, state, layout[1]);
    frame.render_widget(footer(state), layout[2]);
}

fn header(state: &UiState) -> Paragraph<'static> {
    let title = if state.round > 0 {
        format!("MODEL SERVER TESTING - ROUND {}", state.round)
    } else {
        "MODEL SERVER TESTING".to_string()
    };
    Paragraph::new(Line::from(Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL))
}

fn footer(state: &UiState) -> Paragraph<'static> {
    let status = footer_label(state, Instant::now());
    let help = "Press 'q' to quit";
    Paragraph::new(Line::from(vec![
        Span::styled(status, Style::default().fg(Color::Yellow)),
        Span::raw("   "),
        Span::styled(help, Style::default().add_modifier(Modifier::DIM)),
    ]))
    .block(Block::default().borders(Borders::ALL))
}

fn draw_server_grid(frame: &mut Frame, state: &UiState, area: Rect) {
    let count = state.view.len();
    if count == 0 {
        return;
    }
    let (rows, cols) = grid_dims(count);

    let row_constraints = vec![Constraint::Ratio(1, rows as u32); rows];
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    for (i, status) in state.view.iter().enumerate() {
        let row = i / cols;
        let col = i % cols;
        let col_constraints = vec![Constraint::Ratio(1, cols as u32); cols];
        let col_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(col_constraints)
            .split(row_areas[row]);
        frame.render_widget(server_panel(status), col_areas[col]);
    }
}

fn server_panel(status: &ServerStatus) -> Paragraph<'_> {
    let d = &status.descriptor;
    let (label, color) = status_label(status);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} | {}", d.server, d.api_base),
            Style::default().add_modifier(Modifier::DIM),
        )),
        Line::from(format!("Model: {}", d.model)),
        Line::from(Span::styled(
            format!("Status: {label}"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ];

    if let Some(outcome) = &status.last_outcome {
        lines.push(Line::from(format!(
            "Time: {:.2}s  At: {}",
            outcome.duration.as_secs_f64(),
            outcome.issued_at.format("%H:%M:%S")
        )));
        if outcome.status.is_success() {
            lines.push(Line::from(format!("Tokens: {}", tokens_label(outcome))));
        } else if let Some(detail) = &outcome.error_detail {
            lines.push(Line::from(Span::styled(
                truncate(detail, 60),
                Style::default().fg(Color::Red),
            )));
        }
    }

    lines.push(Line::from(format!(
        "Fails: {}  OK: {}/{}",
        status.consecutive_failures, status.total_successes, status.total_rounds
    )));

    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default().borders(Borders::ALL).title(Span::styled(
                format!(" {} ", d.shortname),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
        )
}

/// サーバー数からグリッドの行列数を決める
fn grid_dims(count: usize) -> (usize, usize) {
    match count {
        0 => (1, 1),
        1 | 2 => (1, count),
        3 | 4 => (2, 2),
        5 | 6 => (2, 3),
        7..=9 => (3, 3),
        n => (n.div_ceil(3), 3),
    }
}

fn status_label(status: &ServerStatus) -> (&'static str, Color) {
    match status.last_outcome.as_ref().map(|o| o.status) {
        None => ("WAITING", Color::Gray),
        Some(ProbeStatus::Success) => ("SUCCESS", Color::Green),
        Some(ProbeStatus::Timeout) => ("TIMEOUT", Color::Yellow),
        Some(ProbeStatus::ConnectionError) => ("CONNECTION ERROR", Color::Red),
        Some(ProbeStatus::AuthError) => ("AUTH ERROR", Color::Red),
        Some(ProbeStatus::ProtocolError) => ("PROTOCOL ERROR", Color::Magenta),
    }
}

/// トークン数の表示ラベル（欠落は0ではなく `?`）
fn tokens_label(outcome: &ProbeOutcome) -> String {
    match outcome.tokens {
        Some(TokenUsage::Known(n)) => n.to_string(),
        Some(TokenUsage::Unknown) | None => "?".to_string(),
    }
}

fn footer_label(state: &UiState, now: Instant) -> String {
    if state.round == 0 {
        return "Running first probe round...".to_string();
    }
    match (state.delay, state.next_round_at) {
        (Some(delay), Some(at)) => {
            let remaining = at.saturating_duration_since(now);
            if remaining.is_zero() {
                "Probing...".to_string()
            } else {
                let total = delay.as_secs_f64().max(f64::EPSILON);
                let percent = ((1.0 - remaining.as_secs_f64() / total) * 100.0)
                    .clamp(0.0, 100.0) as usize;
                let filled = percent / 5;
                format!(
                    "NEXT ROUND: {}s remaining [{}{}] {}%",
                    remaining.as_secs(),
                    "=".repeat(filled),
                    " ".repeat(20 - filled),
                    percent
                )
            }
        }
        _ => "Round complete.".to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{prefix}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn grid_matches_server_count() {
        assert_eq!(grid_dims(1), (1, 1));
        assert_eq!(grid_dims(2), (1, 2));
        assert_eq!(grid_dims(4), (2, 2));
        assert_eq!(grid_dims(6), (2, 3));
        assert_eq!(grid_dims(9), (3, 3));
        assert_eq!(grid_dims(10), (4, 3));
        assert_eq!(grid_dims(12), (4, 3));
    }

    #[test]
    fn grid_always_fits_every_server() {
        for n in 1..40 {
            let (rows, cols) = grid_dims(n);
            assert!(rows * cols >= n, "grid {rows}x{cols} too small for {n}");
        }
    }

    #[test]
    fn unknown_tokens_show_question_mark() {
        let outcome = ProbeOutcome::success(
            "a",
            Utc::now(),
            Duration::from_millis(10),
            TokenUsage::Unknown,
        );
        assert_eq!(tokens_label(&outcome), "?");

        let outcome = ProbeOutcome::success(
            "a",
            Utc::now(),
            Duration::from_millis(10),
            TokenUsage::Known(42),
        );
        assert_eq!(tokens_label(&outcome), "42");
    }

    #[test]
    fn footer_counts_down_between_rounds() {
        let now = Instant::now();
        let state = UiState {
            round: 2,
            view: vec![],
            delay: Some(Duration::from_secs(10)),
            next_round_at: Some(now + Duration::from_secs(5)),
        };
        let label = footer_label(&state, now);
        assert!(label.contains("remaining"), "got: {label}");
        assert!(label.contains("50%"), "got: {label}");
    }

    #[test]
    fn footer_before_first_round() {
        let state = UiState {
            round: 0,
            view: vec![],
            delay: None,
            next_round_at: None,
        };
        assert!(footer_label(&state, Instant::now()).contains("first probe round"));
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("0123456789", 8), "01234...");
    }
}
