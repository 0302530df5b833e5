//! Detail pane for the row under the cursor, right panel.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};
use rollcall_core::sheet::SheetRow;

use crate::app::App;

/// Render the detail pane into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(row) = app.cursor_row() else {
    let block = Block::default()
      .title(" Detail ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
      Paragraph::new("No one matches.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  };

  let block = Block::default()
    .title(format!(" {} ", row.subject.display_name()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines = fields(row);
  lines.push(Line::from(""));
  lines.push(Line::from(vec![
    Span::styled(
      format!("{} new", app.sheet.new_arrivals().count()),
      Style::default().fg(Color::Magenta),
    ),
    Span::raw("  "),
    Span::styled(
      format!("{} regular", app.sheet.regulars().count()),
      Style::default().fg(Color::DarkGray),
    ),
  ]));

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn fields(row: &SheetRow) -> Vec<Line<'static>> {
  let s = &row.subject;
  let yes_no = |b: bool| if b { "yes" } else { "no" };

  let mut pairs: Vec<(&str, String)> = vec![
    ("Name", s.full_name.clone()),
    ("Status", row.status().label().to_owned()),
    ("Visits", row.visits.to_string()),
    ("Present", yes_no(row.present).to_owned()),
  ];
  if row.seen_today {
    pairs.push(("Also", "checked in at another service today".to_owned()));
  }
  pairs.push(("Verse", yes_no(row.memory_verse).to_owned()));
  if let Some(r) = &row.remarks {
    pairs.push(("Remarks", r.clone()));
  }
  if let Some(g) = &s.group {
    pairs.push(("Group", g.clone()));
  }
  if let Some(b) = s.birthday {
    pairs.push(("Birthday", b.format("%B %d").to_string()));
  }
  if let Some(c) = &s.contact_number {
    pairs.push(("Contact", c.clone()));
  }

  pairs
    .into_iter()
    .map(|(label, value)| {
      Line::from(vec![
        Span::styled(
          format!("{label:<10}"),
          Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
      ])
    })
    .collect()
}
