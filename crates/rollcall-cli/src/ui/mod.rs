//! Kiosk rendering. Orchestrates all panes.

pub mod detail;
pub mod sheet;

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, Mode};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let sheet = &app.sheet;
  let left = Span::styled(
    format!(" rollcall  {}  {}", sheet.service, sheet.date),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );

  let mut right = vec![Span::styled(
    format!("{}/{} present ", sheet.present_count(), sheet.rows().len()),
    Style::default().fg(Color::White),
  )];
  if app.locked {
    right.insert(
      0,
      Span::styled(
        " LOCKED ",
        Style::default()
          .fg(Color::Black)
          .bg(Color::Red)
          .add_modifier(Modifier::BOLD),
      ),
    );
  }

  let used: usize = left.content.chars().count()
    + right.iter().map(|s| s.content.chars().count()).sum::<usize>();
  let pad = usize::from(area.width).saturating_sub(used);

  let mut spans = vec![left, Span::raw(" ".repeat(pad))];
  spans.extend(right);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
    .split(area);

  sheet::draw(f, cols[0], app);
  detail::draw(f, cols[1], app);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match app.mode {
    Mode::Filter => ("SEARCH", "Type to filter  Esc clear  Enter done".to_string()),
    Mode::Remark => ("REMARK", format!("{}_  Enter save  Esc cancel", app.remark_draft)),
    Mode::Browse => (
      "CHECK-IN",
      "↑↓/jk move  Space toggle  v verse  r remark  / search  q quit".to_string(),
    ),
  };

  let status = if app.has_pending() {
    "Saving…".to_string()
  } else if app.status_msg.is_empty() || app.mode == Mode::Remark {
    hints
  } else {
    app.status_msg.clone()
  };

  let line = Line::from(vec![
    Span::styled(
      format!(" {mode_label} "),
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {status}"), Style::default().fg(Color::Gray)),
  ]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
