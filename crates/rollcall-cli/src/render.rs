//! Plain-text rendering for the one-shot report subcommands.

use std::fmt::Write as _;

use rollcall_core::{
  analytics::{
    DateBucket, FollowUp, Tally, Tier, Trend, follow_up::FOLLOW_UP_WINDOW,
  },
  staff::LoginEvent,
  subject::Subject,
};

use crate::client::{BadgeReport, DateReport};

const BAR_WIDTH: usize = 40;

pub fn follow_up(result: &FollowUp) -> String {
  let mut out = String::new();
  match result {
    FollowUp::InsufficientHistory { recent_dates } => {
      let _ = writeln!(
        out,
        "Not enough history yet: {} session(s) recorded, {FOLLOW_UP_WINDOW} needed.",
        recent_dates.len()
      );
    }
    FollowUp::Evaluated { window, absentees } => {
      let dates: Vec<String> = window.iter().map(|d| d.to_string()).collect();
      let _ = writeln!(out, "Missed all of {}", dates.join(", "));
      if absentees.is_empty() {
        let _ = writeln!(out, "  Everyone attended at least once.");
      }
      for s in absentees {
        let contact = s.contact_number.as_deref().unwrap_or("no contact number");
        let _ = writeln!(out, "  {:<28} {contact}", s.full_name);
      }
    }
  }
  out
}

pub fn tally(tally: &Tally) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "New arrivals ({})", tally.new_arrivals().count());
  for e in tally.new_arrivals() {
    let _ = writeln!(out, "  {:<28} {}", e.full_name, e.status.label());
  }
  let _ = writeln!(out, "Regulars ({})", tally.regulars().count());
  for e in tally.regulars() {
    let _ = writeln!(out, "  {:<28} {} visits", e.full_name, e.visits);
  }
  out
}

/// One horizontal bar per date, scaled against the window maximum.
pub fn trend(trend: &Trend) -> String {
  if trend.buckets.is_empty() {
    return "No attendance recorded yet.\n".into();
  }
  let mut out = String::new();
  for b in &trend.buckets {
    let width = usize::from(trend.percent(b)) * BAR_WIDTH / 100;
    let _ = writeln!(out, "{}  {:<BAR_WIDTH$}  {}", b.date, "█".repeat(width), b.count);
  }
  out
}

pub fn badges(report: &BadgeReport) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{}  [{}]", report.full_name, report.status.label());
  let _ = writeln!(
    out,
    "  visits {}  verses {}  streak {}",
    report.stats.total_visits, report.stats.verses_recited, report.stats.streak_weeks
  );
  for b in &report.badges {
    let tier = match b.tier {
      Tier::Locked => "locked",
      Tier::Bronze => "bronze",
      Tier::Silver => "silver",
      Tier::Gold => "gold",
    };
    let _ = writeln!(out, "  {:<7} {:<20} {}", tier, b.title, b.description);
  }
  out
}

pub fn date_summaries(buckets: &[DateBucket]) -> String {
  if buckets.is_empty() {
    return "No attendance recorded yet.\n".into();
  }
  let mut out = String::new();
  for b in buckets {
    let _ = writeln!(out, "{}  {:>4} present", b.date, b.count);
  }
  out
}

pub fn attendees(report: &DateReport) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{}: {} present", report.date, report.attendees.len());
  for a in &report.attendees {
    let group = a.group.as_deref().unwrap_or("");
    let _ = writeln!(out, "  {:<28} {group}", a.full_name);
  }
  out
}

pub fn birthdays(celebrants: &[Subject]) -> String {
  if celebrants.is_empty() {
    return "No birthdays this month.\n".into();
  }
  let mut out = String::new();
  for s in celebrants {
    if let Some(day) = s.birthday {
      let _ = writeln!(out, "{}  {}", day.format("%b %d"), s.full_name);
    }
  }
  out
}

pub fn logins(events: &[LoginEvent]) -> String {
  let mut out = String::new();
  for e in events {
    let _ = writeln!(
      out,
      "{}  {:<16} {}",
      e.login_at.format("%Y-%m-%d %H:%M"),
      e.username,
      e.role
    );
  }
  out
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, Utc};
  use rollcall_core::{
    analytics::{self, SubjectStats, VisitStatus},
    subject::{NewSubject, SubjectKind},
  };
  use uuid::Uuid;

  use super::*;

  fn d(day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2026, 3, day).unwrap() }

  fn subject(name: &str) -> Subject {
    NewSubject::new(SubjectKind::Student, name).into_subject(Uuid::new_v4(), Utc::now())
  }

  #[test]
  fn insufficient_history_is_not_an_empty_list() {
    let out = follow_up(&FollowUp::InsufficientHistory { recent_dates: vec![d(1)] });
    assert!(out.contains("Not enough history"));

    let out = follow_up(&FollowUp::Evaluated {
      window:    [d(15), d(8), d(1)],
      absentees: vec![],
    });
    assert!(out.contains("Everyone attended"));
  }

  #[test]
  fn absentees_are_listed_with_contact() {
    let mut ana = subject("Ana Cruz");
    ana.contact_number = Some("0917".into());
    let out = follow_up(&FollowUp::Evaluated {
      window:    [d(15), d(8), d(1)],
      absentees: vec![ana],
    });
    assert!(out.contains("Ana Cruz"));
    assert!(out.contains("0917"));
  }

  #[test]
  fn trend_bars_scale_to_max() {
    let t = Trend {
      buckets: vec![
        DateBucket { date: d(1), count: 5 },
        DateBucket { date: d(8), count: 10 },
      ],
      max:     10,
    };
    let out = trend(&t);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0].matches('█').count(), BAR_WIDTH / 2);
    assert_eq!(lines[1].matches('█').count(), BAR_WIDTH);
  }

  #[test]
  fn badges_show_tier_and_title() {
    let stats = SubjectStats { total_visits: 1, verses_recited: 0, streak_weeks: 1 };
    let report = BadgeReport {
      full_name: "Ana".into(),
      status: VisitStatus::FirstVisit,
      stats,
      badges: analytics::achievement::badges(&stats).to_vec(),
    };
    let out = badges(&report);
    assert!(out.contains("1st VISIT"));
    assert!(out.contains("bronze"));
    assert!(out.contains("locked"));
  }
}
