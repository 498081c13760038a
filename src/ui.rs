// Terminal front end: draws the field and forwards keys and mouse clicks to it
// Owns one Field per round and stops forwarding once the round is over

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use std::error::Error;
use std::io;
use std::time::Duration;
use tracing::{info, warn};
use unicode_width::UnicodeWidthStr;

use crate::palette::Palette;
use minegrid::config::{Config, save_config};
use minegrid::error::FieldError;
use minegrid::field::{CellView, ClickOutcome, Field, RoundState};
use minegrid::grid::Coord;

// Runtime UI variables for one session
#[derive(Debug, Default)]
struct UiState {
    cursor: Coord,
    board_rect: Option<Rect>,
    confirm_restart: bool, // first F2 during a live round only arms the restart
    showing_result: bool,
    message: Option<String>,
}

impl UiState {
    fn reset_after_new_round(&mut self) {
        self.cursor = (0, 0);
        self.confirm_restart = false;
        self.showing_result = false;
        self.message = None;
    }

    /// Grid coordinate under a terminal cell; each board cell is two columns wide
    fn cell_at(&self, column: u16, row: u16) -> Option<Coord> {
        let r = self.board_rect?;
        let (x0, y0) = (r.x + 1, r.y + 1);
        if column < x0 || row < y0 {
            return None;
        }
        Some((((column - x0) / 2) as usize, (row - y0) as usize))
    }
}

fn new_round(cfg: &Config) -> Result<Field, FieldError> {
    let (w, h, n) = cfg.difficulty.params();
    info!("new {} round: {}x{} with {} mines", cfg.difficulty.name(), w, h, n);
    Field::new(w, h, n)
}

/// Forward a click to the field while the round is live
fn forward_click(field: &mut Field, ui: &mut UiState, pos: Coord, flagging: bool) {
    if field.state() != RoundState::Playing {
        return;
    }
    ui.confirm_restart = false;
    match field.click(pos, flagging) {
        Ok(ClickOutcome::Lost(_)) | Ok(ClickOutcome::Won) => ui.showing_result = true,
        Ok(_) => ui.message = None,
        Err(e) => {
            warn!("click at {:?} rejected: {}", pos, e);
            ui.message = Some(e.to_string());
        }
    }
}

/// Key-row label naming the number key of the current preset
fn difficulty_label(cfg: &Config) -> String {
    format!("Difficulty [{}]", cfg.difficulty.to_index() + 1)
}

fn step_cursor(field: &Field, ui: &mut UiState, dx: isize, dy: isize) {
    let nx = (ui.cursor.0 as isize + dx).clamp(0, field.width() as isize - 1) as usize;
    let ny = (ui.cursor.1 as isize + dy).clamp(0, field.height() as isize - 1) as usize;
    ui.cursor = (nx, ny);
}

pub fn run(cfg: &mut Config) -> Result<(), Box<dyn Error>> {
    let mut field = new_round(cfg)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, cfg, &mut field);

    save_config(cfg);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    cfg: &mut Config,
    field: &mut Field,
) -> Result<(), Box<dyn Error>> {
    let palette = Palette::detect();
    let mut ui = UiState::default();
    let tick_rate = Duration::from_millis(200);

    loop {
        terminal.draw(|f| draw(f, field, &mut ui, cfg, &palette))?;

        if !event::poll(tick_rate)? {
            continue;
        }
        match event::read()? {
            Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) => {
                if ui.showing_result {
                    match code {
                        KeyCode::Enter | KeyCode::Char('y') | KeyCode::F(2) => {
                            *field = new_round(cfg)?;
                            ui.reset_after_new_round();
                        }
                        // keep looking at the finished board
                        KeyCode::Esc | KeyCode::Char('n') => ui.showing_result = false,
                        _ => {}
                    }
                    continue;
                }
                match code {
                    KeyCode::Esc => break,
                    KeyCode::F(2) => {
                        let live = field.is_initialized() && field.state() == RoundState::Playing;
                        if live && !ui.confirm_restart {
                            ui.confirm_restart = true;
                            ui.message = Some("Press F2 again to restart".to_string());
                        } else {
                            *field = new_round(cfg)?;
                            ui.reset_after_new_round();
                        }
                    }
                    KeyCode::Char(c @ '1'..='4') => {
                        let index = c as usize - '1' as usize;
                        match cfg.select(index) {
                            Ok(()) => {
                                save_config(cfg);
                                *field = new_round(cfg)?;
                                ui.reset_after_new_round();
                            }
                            Err(e) => ui.message = Some(e.to_string()),
                        }
                    }
                    KeyCode::Char('a') | KeyCode::Char('A') => {
                        cfg.ascii_icons = !cfg.ascii_icons;
                        save_config(cfg);
                    }
                    KeyCode::Left => step_cursor(field, &mut ui, -1, 0),
                    KeyCode::Right => step_cursor(field, &mut ui, 1, 0),
                    KeyCode::Up => step_cursor(field, &mut ui, 0, -1),
                    KeyCode::Down => step_cursor(field, &mut ui, 0, 1),
                    KeyCode::Char(' ') | KeyCode::Enter => {
                        let pos = ui.cursor;
                        forward_click(field, &mut ui, pos, false);
                    }
                    KeyCode::Char('f') | KeyCode::Char('F') => {
                        let pos = ui.cursor;
                        forward_click(field, &mut ui, pos, true);
                    }
                    _ => {}
                }
            }
            Event::Mouse(MouseEvent { kind, column, row, .. }) if !ui.showing_result => {
                let flagging = match kind {
                    MouseEventKind::Down(MouseButton::Left) => false,
                    MouseEventKind::Down(MouseButton::Right) => true,
                    _ => continue,
                };
                if let Some(pos) = ui.cell_at(column, row) {
                    if field.grid().contains(pos) {
                        ui.cursor = pos;
                    }
                    // anything past the board edge is dropped by the field itself
                    forward_click(field, &mut ui, pos, flagging);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn draw<B: Backend>(
    f: &mut Frame<B>,
    field: &Field,
    ui: &mut UiState,
    cfg: &Config,
    palette: &Palette,
) {
    let size = f.size();
    let min_w = ((field.width() * 2) as u16 + 3).max(60);
    let min_h = field.height() as u16 + 8;
    if size.width < min_w || size.height < min_h {
        let warn_lines = vec![
            Spans::from(Span::raw("Terminal size too small.")),
            Spans::from(Span::raw(format!("Minimum required: {} x {}", min_w, min_h))),
        ];
        let warn = Paragraph::new(Text::from(warn_lines))
            .block(Block::default().borders(Borders::ALL).title("Resize Terminal"))
            .alignment(Alignment::Center);
        f.render_widget(Clear, size);
        let area = center_rect(40u16.min(size.width), 4u16.min(size.height), size);
        f.render_widget(warn, area);
        ui.board_rect = None;
        return;
    }

    // layout: top key row, center board, bottom status
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(4), Constraint::Length(3)].as_ref())
        .split(size);

    let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let mut keys = vec![Span::raw(" ")];
    let difficulty_label = difficulty_label(cfg);
    let key_items = [
        ("F2", "New"),
        ("1-4", difficulty_label.as_str()),
        ("Space", "Reveal"),
        ("F", "Flag"),
        ("A", "ASCII"),
    ];
    for (i, (k, label)) in key_items.iter().enumerate() {
        if i > 0 {
            keys.push(Span::raw("   "));
        }
        keys.push(Span::styled(k.to_string(), key_style));
        keys.push(Span::raw(format!(": {}", label)));
    }
    let menu = Paragraph::new(Spans::from(keys)).block(Block::default().borders(Borders::ALL));
    f.render_widget(menu, chunks[0]);

    // status row: counter and round state on the left, Esc: Exit on the right
    let state_text = match field.state() {
        RoundState::Playing => "",
        RoundState::Lost => "Boom!",
        RoundState::Won => "Cleared!",
    };
    let mut left_text = format!(" Mines: {}   {}", field.remaining_flags(), state_text);
    if let Some(msg) = &ui.message {
        left_text.push_str("   ");
        left_text.push_str(msg);
    }
    let inner_w = chunks[2].width.saturating_sub(2) as usize;
    let right_w = "Esc: Exit ".width();
    let pad = inner_w.saturating_sub(left_text.as_str().width() + right_w).max(1);
    let status = Paragraph::new(Spans::from(vec![
        Span::raw(left_text),
        Span::raw(" ".repeat(pad)),
        Span::styled("Esc", key_style),
        Span::raw(": Exit "),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, chunks[2]);

    // board
    let (g_hidden, g_flag, g_mine, g_wrong) = if cfg.ascii_icons {
        ("#", "F", "*", "X")
    } else {
        ("■", "⚑", "☼", "✗")
    };
    let board_w = (field.width() * 2) as u16 + 3;
    let board_area = center_rect(board_w, field.height() as u16 + 2, chunks[1]);
    ui.board_rect = Some(board_area);
    let mut lines = Vec::with_capacity(field.height());
    for y in 0..field.height() {
        let mut spans = Vec::with_capacity(field.width() + 1);
        for x in 0..field.width() {
            let view = field.view((x, y)).unwrap_or(CellView::Hidden);
            let base = Style::default().bg(palette.board_bg()).fg(Color::Black);
            let (glyph, mut style) = match view {
                CellView::Hidden => (g_hidden.to_string(), base.fg(palette.hidden_bg())),
                CellView::Flagged => (g_flag.to_string(), base.fg(Color::Red)),
                CellView::Revealed(0) => (" ".to_string(), base),
                CellView::Revealed(n) => {
                    let style = base.fg(palette.number(n)).add_modifier(Modifier::BOLD);
                    (n.to_string(), style)
                }
                CellView::Mine => (g_mine.to_string(), base),
                CellView::WrongFlag => (g_wrong.to_string(), base.fg(Color::Red)),
                CellView::Detonated => (g_mine.to_string(), base.bg(palette.target_bg())),
            };
            if ui.cursor == (x, y) && field.state() == RoundState::Playing {
                style = style.bg(palette.cursor_bg());
            }
            spans.push(Span::styled(format!(" {}", glyph), style));
        }
        spans.push(Span::styled(" ", Style::default().bg(palette.board_bg())));
        lines.push(Spans::from(spans));
    }
    let board = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(cfg.difficulty.name())
            .title_alignment(Alignment::Center),
    );
    f.render_widget(board, board_area);

    if ui.showing_result {
        let won = field.state() == RoundState::Won;
        let rb = bottom_centered_block(44, 6, size);
        f.render_widget(Clear, rb);
        let lines = vec![
            Spans::from(Span::raw("")),
            Spans::from(Span::raw(if won { "Field cleared, you win!" } else { "You hit a mine." })),
            Spans::from(Span::raw("Enter: new round    Esc: view board")),
        ];
        let p = Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(if won { "Success" } else { "Failure" }),
            )
            .alignment(Alignment::Center);
        f.render_widget(p, rb);
    }
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn bottom_centered_block(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + r.height.saturating_sub(height);
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
