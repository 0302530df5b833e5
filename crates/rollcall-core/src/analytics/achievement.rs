//! Achievement ranker: turns per-subject counters into tiered badges.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::presence::PresenceRecord;

// ─── Tiers ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
  Locked,
  Bronze,
  Silver,
  Gold,
}

/// Minimum counts for each tier of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ladder {
  pub bronze: usize,
  pub silver: usize,
  pub gold:   usize,
}

impl Ladder {
  /// Highest tier whose threshold `count` meets.
  pub fn rank(&self, count: usize) -> Tier {
    if count >= self.gold {
      Tier::Gold
    } else if count >= self.silver {
      Tier::Silver
    } else if count >= self.bronze {
      Tier::Bronze
    } else {
      Tier::Locked
    }
  }
}

// ─── Metrics ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
  Attendance,
  Verses,
  Streak,
}

impl Metric {
  pub const ALL: [Metric; 3] = [Self::Attendance, Self::Verses, Self::Streak];

  pub fn ladder(self) -> Ladder {
    match self {
      Self::Attendance => Ladder { bronze: 1, silver: 3, gold: 10 },
      Self::Verses => Ladder { bronze: 1, silver: 5, gold: 10 },
      Self::Streak => Ladder { bronze: 2, silver: 4, gold: 8 },
    }
  }

  pub fn rank(self, count: usize) -> Tier { self.ladder().rank(count) }

  /// Badge title. A locked badge shows the gold title as the goal.
  pub fn title(self, tier: Tier) -> &'static str {
    match (self, tier) {
      (Self::Attendance, Tier::Bronze) => "First Step",
      (Self::Attendance, Tier::Silver) => "Regular",
      (Self::Attendance, _) => "Rising Star",
      (Self::Verses, Tier::Bronze) => "Student",
      (Self::Verses, Tier::Silver) => "Scholar",
      (Self::Verses, _) => "Bible Champ",
      (Self::Streak, Tier::Bronze) => "Warming Up",
      (Self::Streak, Tier::Silver) => "On Fire",
      (Self::Streak, _) => "Unstoppable",
    }
  }

  pub fn description(self, tier: Tier) -> &'static str {
    match (self, tier) {
      (Self::Attendance, Tier::Gold) => "10+ Visits",
      (Self::Attendance, _) => "Attendance",
      (Self::Verses, Tier::Gold) => "10 Verses",
      (Self::Verses, _) => "Bible Verse",
      (Self::Streak, Tier::Gold) => "8 Weeks!",
      (Self::Streak, _) => "Streak",
    }
  }
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// How the streak counter is derived from a subject's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakRule {
  /// `min(total_visits, history_len)`, which always equals the total visit
  /// count. Kept for parity with existing badge awards.
  #[default]
  Legacy,
  /// Length of the unbroken run of attended sessions, counted back from the
  /// most recent session held.
  Consecutive,
}

/// The three counters badges are ranked on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectStats {
  pub total_visits:   usize,
  pub verses_recited: usize,
  pub streak_weeks:   usize,
}

impl SubjectStats {
  /// Compute stats from one subject's presence `history`.
  ///
  /// `session_dates` are the dates any session was held (see
  /// [`super::session_dates`]); only [`StreakRule::Consecutive`] reads them.
  pub fn from_history(
    history: &[PresenceRecord],
    session_dates: &[NaiveDate],
    rule: StreakRule,
  ) -> Self {
    let attended: BTreeSet<NaiveDate> = history.iter().map(|r| r.date).collect();
    let total_visits = attended.len();
    let verses_recited = history.iter().filter(|r| r.memory_verse).count();

    let streak_weeks = match rule {
      StreakRule::Legacy => total_visits.min(history.len()),
      StreakRule::Consecutive => {
        let mut held: Vec<NaiveDate> = session_dates.to_vec();
        held.sort_unstable_by(|a, b| b.cmp(a));
        held.dedup();
        held
          .iter()
          .take_while(|d| attended.contains(*d))
          .count()
      }
    };

    Self { total_visits, verses_recited, streak_weeks }
  }

  pub fn count(&self, metric: Metric) -> usize {
    match metric {
      Metric::Attendance => self.total_visits,
      Metric::Verses => self.verses_recited,
      Metric::Streak => self.streak_weeks,
    }
  }
}

// ─── Badges ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
  pub metric:      Metric,
  pub tier:        Tier,
  pub title:       String,
  pub description: String,
}

impl Badge {
  pub fn for_count(metric: Metric, count: usize) -> Self {
    let tier = metric.rank(count);
    Self {
      metric,
      tier,
      title: metric.title(tier).to_owned(),
      description: metric.description(tier).to_owned(),
    }
  }

  pub fn unlocked(&self) -> bool { self.tier != Tier::Locked }
}

/// Attendance, verse and streak badges, in that order.
pub fn badges(stats: &SubjectStats) -> [Badge; 3] {
  Metric::ALL.map(|m| Badge::for_count(m, stats.count(m)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::analytics::{fixtures::*, session_dates};

  #[test]
  fn tiers_never_decrease() {
    for metric in Metric::ALL {
      let mut last = Tier::Locked;
      for count in 0..=20 {
        let tier = metric.rank(count);
        assert!(tier >= last, "{metric:?} dropped at {count}");
        last = tier;
      }
    }
  }

  #[test]
  fn tier_boundaries() {
    for metric in Metric::ALL {
      assert_eq!(metric.rank(0), Tier::Locked);
    }
    assert_eq!(Metric::Attendance.rank(10), Tier::Gold);
    assert_eq!(Metric::Verses.rank(10), Tier::Gold);
    assert_eq!(Metric::Streak.rank(8), Tier::Gold);
    assert_eq!(Metric::Streak.rank(1), Tier::Locked);
    assert_eq!(Metric::Attendance.rank(3), Tier::Silver);
    assert_eq!(Metric::Verses.rank(4), Tier::Bronze);
  }

  #[test]
  fn label_table() {
    let b = Badge::for_count(Metric::Attendance, 1);
    assert_eq!((b.title.as_str(), b.description.as_str()), ("First Step", "Attendance"));
    let b = Badge::for_count(Metric::Attendance, 12);
    assert_eq!((b.title.as_str(), b.description.as_str()), ("Rising Star", "10+ Visits"));
    let b = Badge::for_count(Metric::Verses, 5);
    assert_eq!((b.title.as_str(), b.description.as_str()), ("Scholar", "Bible Verse"));
    let b = Badge::for_count(Metric::Streak, 8);
    assert_eq!((b.title.as_str(), b.description.as_str()), ("Unstoppable", "8 Weeks!"));

    let locked = Badge::for_count(Metric::Streak, 0);
    assert!(!locked.unlocked());
    assert_eq!((locked.title.as_str(), locked.description.as_str()), ("Unstoppable", "Streak"));
  }

  #[test]
  fn legacy_streak_equals_total_visits() {
    let a = student("Ana");
    // Attended weeks 1, 2 and 5 out of 5.
    let history = vec![
      with_verse(present(&a, sunday(1))),
      present(&a, sunday(2)),
      present(&a, sunday(5)),
    ];
    let held: Vec<_> = (1..=5).map(sunday).collect();

    let stats = SubjectStats::from_history(&history, &held, StreakRule::Legacy);
    assert_eq!(stats.total_visits, 3);
    assert_eq!(stats.verses_recited, 1);
    assert_eq!(stats.streak_weeks, 3);
  }

  #[test]
  fn consecutive_streak_stops_at_first_gap() {
    let a = student("Ana");
    let b = student("Ben");
    let mut records = vec![
      present(&a, sunday(1)),
      present(&a, sunday(3)),
      present(&a, sunday(4)),
    ];
    // Ben keeps week 2 on the session calendar.
    records.push(present(&b, sunday(2)));
    let held = session_dates(&records);
    let ana: Vec<_> = records
      .iter()
      .filter(|r| r.subject_id == a.subject_id)
      .cloned()
      .collect();

    let stats = SubjectStats::from_history(&ana, &held, StreakRule::Consecutive);
    assert_eq!(stats.streak_weeks, 2);
  }

  #[test]
  fn badges_in_metric_order() {
    let stats = SubjectStats { total_visits: 3, verses_recited: 0, streak_weeks: 9 };
    let [attendance, verses, streak] = badges(&stats);
    assert_eq!(attendance.tier, Tier::Silver);
    assert_eq!(verses.tier, Tier::Locked);
    assert_eq!(streak.tier, Tier::Gold);
  }
}
