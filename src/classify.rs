//! Maps a resource's remaining validity onto an urgency tier.

use chrono::{DateTime, Utc};
use std::fmt;

/// Warning threshold used when the caller does not configure one.
pub const DEFAULT_THRESHOLD_DAYS: u32 = 15;

/// Spans at or below this many days mean "no date was ever resolved".
///
/// This is the most negative whole-day span a signed 64-bit nanosecond
/// duration can hold, which is what an unset timestamp subtracted from the
/// present collapses to.
pub const NEVER_RESOLVED_DAYS: i64 = -106_751;

const SECONDS_PER_DAY: i64 = 86_400;

/// Urgency tiers, ordered from most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
  LookupFailed,
  Expired,
  ExpiringSoon,
  Healthy,
}

impl Tier {
  #[must_use]
  pub const fn label(self) -> &'static str {
    match self {
      Self::LookupFailed => "lookup failed",
      Self::Expired => "expired",
      Self::ExpiringSoon => "expiring soon",
      Self::Healthy => "healthy",
    }
  }
}

impl fmt::Display for Tier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Result of classifying one date against one reference time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
  pub tier: Tier,
  /// Whole days left, rounded down. `None` when the lookup failed.
  pub days_remaining: Option<i64>,
  pub message: String,
}

/// Whole days between `now` and `target`, rounded toward negative infinity.
#[must_use]
pub fn days_until(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
  (target - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Classifies `target` relative to `now`.
///
/// `reason` is only used to render the message of a failed lookup.
#[must_use]
pub fn classify(
  target: Option<DateTime<Utc>>,
  now: DateTime<Utc>,
  threshold_days: u32,
  reason: Option<&str>,
) -> Classification {
  let failed = || Classification {
    tier: Tier::LookupFailed,
    days_remaining: None,
    message: format!(
      "lookup failed: {}",
      reason.unwrap_or("no expiry date available")
    ),
  };

  let Some(target) = target else {
    return failed();
  };
  let days = days_until(target, now);
  if days <= NEVER_RESOLVED_DAYS {
    return failed();
  }

  // Display magnitude truncates toward zero, unlike `days`.
  let shown = (target - now).num_days().unsigned_abs();
  let (tier, message) = if days < 0 {
    (Tier::Expired, format!("expired {shown} days ago"))
  } else if days < i64::from(threshold_days) {
    (Tier::ExpiringSoon, format!("expiring in {shown} days"))
  } else {
    (Tier::Healthy, format!("{shown} days remaining"))
  };

  Classification {
    tier,
    days_remaining: Some(days),
    message,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, TimeZone};

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
  }

  fn in_days(days: i64) -> Option<DateTime<Utc>> {
    Some(now() + Duration::days(days))
  }

  #[test]
  fn test_threshold_boundaries() {
    let t = 15;
    assert_eq!(classify(in_days(15), now(), t, None).tier, Tier::Healthy);
    assert_eq!(
      classify(in_days(14), now(), t, None).tier,
      Tier::ExpiringSoon
    );
    assert_eq!(classify(in_days(0), now(), t, None).tier, Tier::ExpiringSoon);
    assert_eq!(classify(in_days(-1), now(), t, None).tier, Tier::Expired);
  }

  #[test]
  fn test_partial_days_round_down() {
    let target = now() + Duration::days(14) + Duration::hours(23);
    let c = classify(Some(target), now(), 15, None);
    assert_eq!(c.days_remaining, Some(14));
    assert_eq!(c.tier, Tier::ExpiringSoon);

    let just_past = now() - Duration::minutes(5);
    let c = classify(Some(just_past), now(), 15, None);
    assert_eq!(c.days_remaining, Some(-1));
    assert_eq!(c.tier, Tier::Expired);
    assert_eq!(c.message, "expired 0 days ago");
  }

  #[test]
  fn test_absent_date_is_lookup_failed() {
    for t in [0, 1, 15, 365, u32::MAX] {
      let c = classify(None, now(), t, Some("connection refused"));
      assert_eq!(c.tier, Tier::LookupFailed);
      assert_eq!(c.days_remaining, None);
      assert_eq!(c.message, "lookup failed: connection refused");
    }
  }

  #[test]
  fn test_never_resolved_sentinel_is_not_expired() {
    let epoch_zero = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();
    let c = classify(Some(epoch_zero), now(), 15, None);
    assert_eq!(c.tier, Tier::LookupFailed);

    let c = classify(in_days(NEVER_RESOLVED_DAYS), now(), 15, None);
    assert_eq!(c.tier, Tier::LookupFailed);
    let c = classify(in_days(NEVER_RESOLVED_DAYS + 1), now(), 15, None);
    assert_eq!(c.tier, Tier::Expired);
  }

  #[test]
  fn test_monotonic_in_target_date() {
    for t in [0_u32, 1, 15, 30] {
      let mut previous = Tier::Healthy;
      for days in (-40..=40).rev() {
        let tier = classify(in_days(days), now(), t, None).tier;
        assert!(
          tier <= previous,
          "tier rose from {previous:?} to {tier:?} at {days} days (t={t})"
        );
        previous = tier;
      }
    }
  }

  #[test]
  fn test_zero_threshold_never_warns() {
    assert_eq!(classify(in_days(0), now(), 0, None).tier, Tier::Healthy);
  }

  #[test]
  fn test_messages() {
    assert_eq!(
      classify(in_days(20), now(), 15, None).message,
      "20 days remaining"
    );
    assert_eq!(
      classify(in_days(3), now(), 15, None).message,
      "expiring in 3 days"
    );
    assert_eq!(
      classify(in_days(-7), now(), 15, None).message,
      "expired 7 days ago"
    );
  }
}
