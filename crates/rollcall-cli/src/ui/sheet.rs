//! Check-in list pane, left panel.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use rollcall_core::{analytics::VisitStatus, sheet::SheetRow};

use crate::app::{App, Mode};

/// Render the sheet rows into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let rows = app.filtered_rows();
  let total = app.sheet.rows().len();

  let title = if app.filter.is_empty() {
    format!(" Roster ({total}) ")
  } else {
    format!(" Roster ({}/{total}) ", rows.len())
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let items: Vec<ListItem> = rows.iter().copied().map(item).collect();

  let mut inner = block.inner(area);
  f.render_widget(block, area);

  if (app.mode == Mode::Filter || !app.filter.is_empty()) && inner.height > 2 {
    let filter_area = Rect {
      x:      inner.x,
      y:      inner.y + inner.height - 1,
      width:  inner.width,
      height: 1,
    };
    inner.height -= 1;

    let text = if app.mode == Mode::Filter {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let mut state = ListState::default();
  state.select((!rows.is_empty()).then_some(app.cursor));

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}

fn item(row: &SheetRow) -> ListItem<'static> {
  let (mark, mark_style) = if row.present {
    ("[x] ", Style::default().fg(Color::Green))
  } else {
    ("[ ] ", Style::default().fg(Color::DarkGray))
  };
  let tag_color = match row.status() {
    VisitStatus::New => Color::Magenta,
    VisitStatus::FirstVisit | VisitStatus::SecondVisit => Color::Yellow,
    VisitStatus::Regular => Color::DarkGray,
  };

  let mut spans = vec![
    Span::styled(mark, mark_style),
    Span::raw(row.subject.full_name.clone()),
    Span::styled(
      format!("  {}", row.status().label()),
      Style::default().fg(tag_color),
    ),
  ];
  if row.memory_verse {
    spans.push(Span::styled("  ✝", Style::default().fg(Color::Cyan)));
  }
  ListItem::new(Line::from(spans))
}
