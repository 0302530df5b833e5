//! Trend aggregator: per-date presence counts for the attendance chart.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::presence::PresenceRecord;

/// Number of most recent dates shown on the chart.
pub const DEFAULT_TREND_WINDOW: usize = 5;

/// Present count on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBucket {
  pub date:  NaiveDate,
  pub count: usize,
}

/// Every date with at least one record, ascending.
pub fn date_buckets(records: &[PresenceRecord]) -> Vec<DateBucket> {
  let mut grouped: BTreeMap<NaiveDate, usize> = BTreeMap::new();
  for r in records {
    *grouped.entry(r.date).or_default() += 1;
  }
  grouped
    .into_iter()
    .map(|(date, count)| DateBucket { date, count })
    .collect()
}

/// The display window of a trend chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trend {
  /// Ascending by date.
  pub buckets: Vec<DateBucket>,
  /// Largest count in `buckets`, never less than 1.
  pub max:     usize,
}

impl Trend {
  /// Bar height of `bucket` on a 0–100 scale.
  pub fn percent(&self, bucket: &DateBucket) -> u8 {
    let pct = bucket.count.min(self.max) * 100 / self.max;
    u8::try_from(pct).unwrap_or(100)
  }
}

/// The last `window` date buckets and their normalising maximum.
pub fn trend(records: &[PresenceRecord], window: usize) -> Trend {
  let mut buckets = date_buckets(records);
  let skip = buckets.len().saturating_sub(window);
  buckets.drain(..skip);
  let max = buckets.iter().map(|b| b.count).max().unwrap_or(0).max(1);
  Trend { buckets, max }
}
