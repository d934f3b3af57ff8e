use chrono::{DateTime, Utc};

use crate::models::Eligibility;

/// Minimum days between two donations
pub const ELIGIBILITY_WINDOW_DAYS: i64 = 90;

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days from `then` to `now`, rounded down
///
/// A date in the future yields a negative count.
#[inline]
pub fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Check whether a donor may give blood at `now`
///
/// No recorded donation means eligible. Otherwise the donor is eligible once
/// `window_days` whole days have elapsed, and `days_remaining` is
/// `window_days - elapsed` until then.
pub fn check_eligibility(
    last_donation: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window_days: i64,
) -> Eligibility {
    let Some(last) = last_donation else {
        return Eligibility {
            eligible: true,
            days_remaining: 0,
            days_since_last_donation: None,
        };
    };

    let elapsed = days_since(last, now);

    if elapsed >= window_days {
        Eligibility {
            eligible: true,
            days_remaining: 0,
            days_since_last_donation: Some(elapsed),
        }
    } else {
        Eligibility {
            eligible: false,
            days_remaining: window_days - elapsed,
            days_since_last_donation: Some(elapsed),
        }
    }
}
