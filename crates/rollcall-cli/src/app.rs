//! Kiosk state machine and event dispatcher.
//!
//! Every edit lands on the [`CheckInSheet`] first so the screen updates at
//! once. The resulting change is parked in `pending` until the event loop has
//! redrawn, then [`App::flush`] sends it to the server and either reloads the
//! sheet or rolls the row back.

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use rollcall_core::{
  presence::{PresenceFilter, Service},
  sheet::{CheckInSheet, PendingChange, SheetRow},
  subject::SubjectKind,
};

use crate::client::ApiClient;

// ─── Mode ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  /// Moving through the sheet.
  Browse,
  /// Typing a search query.
  Filter,
  /// Typing a remark for the row under the cursor.
  Remark,
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Quit,
}

// ─── App ──────────────────────────────────────────────────────────────────────

pub struct App {
  pub mode:         Mode,
  pub kind:         SubjectKind,
  pub sheet:        CheckInSheet,
  /// Whether the server's attendance lock was on at the last reload.
  pub locked:       bool,
  pub filter:       String,
  /// Cursor position within the *filtered* rows.
  pub cursor:       usize,
  pub remark_draft: String,
  pub status_msg:   String,
  /// An edit shown on the sheet but not yet sent.
  pending:          Option<PendingChange>,
  client:           ApiClient,
}

impl App {
  pub fn new(client: ApiClient, kind: SubjectKind, date: NaiveDate, service: Service) -> Self {
    Self {
      mode: Mode::Browse,
      kind,
      sheet: CheckInSheet::build(date, service, &[], &[]),
      locked: false,
      filter: String::new(),
      cursor: 0,
      remark_draft: String::new(),
      status_msg: String::new(),
      pending: None,
      client,
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Re-read the roster, its full history and the lock from the server.
  pub async fn reload(&mut self) -> anyhow::Result<()> {
    let roster = self.client.list_subjects(self.kind).await?;
    let filter = PresenceFilter { kind: Some(self.kind), ..PresenceFilter::default() };
    let history = self.client.list_presence(&filter).await?;
    self.locked = self.client.is_locked().await?;
    self.sheet.reconcile(&roster, &history);
    self.clamp_cursor();
    Ok(())
  }

  /// Send the parked edit, if any.
  pub async fn flush(&mut self) {
    let Some(change) = self.pending.take() else {
      return;
    };
    match self.client.apply(&change.mutation).await {
      Ok(()) => {
        if let Err(e) = self.reload().await {
          self.status_msg = format!("Saved, but reload failed: {e}");
        }
      }
      Err(e) => {
        let name = self
          .sheet
          .row(change.subject_id)
          .map(|r| r.subject.full_name.clone())
          .unwrap_or_default();
        self.sheet.revert(change);
        self.status_msg = format!("Not saved for {name}: {e}");
      }
    }
  }

  pub fn has_pending(&self) -> bool { self.pending.is_some() }

  // ── Filtered rows ─────────────────────────────────────────────────────────

  /// Rows matching the search query, best match first. With no query the
  /// sheet's name order is kept.
  pub fn filtered_rows(&self) -> Vec<&SheetRow> {
    filter_rows(self.sheet.rows(), &self.filter)
  }

  pub fn cursor_row(&self) -> Option<&SheetRow> {
    self.filtered_rows().get(self.cursor).copied()
  }

  fn clamp_cursor(&mut self) {
    let len = self.filtered_rows().len();
    self.cursor = self.cursor.min(len.saturating_sub(1));
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Flow::Quit;
    }
    match self.mode {
      Mode::Filter => self.handle_filter_key(key),
      Mode::Remark => self.handle_remark_key(key),
      Mode::Browse => return self.handle_browse_key(key),
    }
    Flow::Continue
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Browse;
        self.filter.clear();
        self.cursor = 0;
      }
      KeyCode::Enter => self.mode = Mode::Browse,
      KeyCode::Backspace => {
        self.filter.pop();
        self.cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.cursor = 0;
      }
      _ => {}
    }
  }

  fn handle_remark_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Browse;
        self.remark_draft.clear();
      }
      KeyCode::Enter => {
        self.mode = Mode::Browse;
        let text = std::mem::take(&mut self.remark_draft);
        if let Some(id) = self.cursor_row().map(|r| r.subject.subject_id) {
          let result = self.sheet.set_remarks(id, text);
          self.stage(result);
        }
      }
      KeyCode::Backspace => {
        self.remark_draft.pop();
      }
      KeyCode::Char(c) => self.remark_draft.push(c),
      _ => {}
    }
  }

  fn handle_browse_key(&mut self, key: KeyEvent) -> Flow {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,

      KeyCode::Down | KeyCode::Char('j') => {
        if self.cursor + 1 < self.filtered_rows().len() {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.cursor = self.cursor.saturating_sub(1);
      }

      KeyCode::Char(' ') | KeyCode::Enter => {
        if let Some(id) = self.cursor_row().map(|r| r.subject.subject_id) {
          let result = self.sheet.toggle(id);
          self.stage(result);
        }
      }
      KeyCode::Char('v') => {
        if let Some((id, recited)) = self
          .cursor_row()
          .map(|r| (r.subject.subject_id, r.memory_verse))
        {
          let result = self.sheet.set_verse(id, !recited);
          self.stage(result);
        }
      }
      KeyCode::Char('r') => {
        let Some(row) = self.cursor_row().cloned() else {
          return Flow::Continue;
        };
        if row.present {
          self.remark_draft = row.remarks.unwrap_or_default();
          self.mode = Mode::Remark;
        } else {
          self.status_msg = format!("{} is not checked in", row.subject.full_name);
        }
      }
      KeyCode::Char('/') => {
        self.mode = Mode::Filter;
        self.filter.clear();
        self.cursor = 0;
      }
      _ => {}
    }
    Flow::Continue
  }

  /// Park a sheet edit for [`App::flush`], or report why it was refused.
  fn stage(&mut self, result: rollcall_core::Result<PendingChange>) {
    match result {
      Ok(change) => {
        self.status_msg.clear();
        self.pending = Some(change);
      }
      Err(e) => self.status_msg = e.to_string(),
    }
  }
}

/// Fuzzy-match `query` against each row's full name, nickname and group.
fn filter_rows<'a>(rows: &'a [SheetRow], query: &str) -> Vec<&'a SheetRow> {
  if query.is_empty() {
    return rows.iter().collect();
  }
  let matcher = SkimMatcherV2::default();
  let mut scored: Vec<(i64, &SheetRow)> = rows
    .iter()
    .filter_map(|row| {
      let s = &row.subject;
      [Some(s.full_name.as_str()), s.nickname.as_deref(), s.group.as_deref()]
        .into_iter()
        .flatten()
        .filter_map(|text| matcher.fuzzy_match(text, query))
        .max()
        .map(|score| (score, row))
    })
    .collect();
  scored.sort_by(|a, b| b.0.cmp(&a.0));
  scored.into_iter().map(|(_, row)| row).collect()
}
