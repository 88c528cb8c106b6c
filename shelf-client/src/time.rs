use std::fmt;

use crate::api::Time;

const MINUTES_IN_HOUR: i64 = 60;
const MINUTES_IN_DAY: i64 = 24 * MINUTES_IN_HOUR;

/// How long ago a comment was written, as shown next to it
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Age {
    JustNow,
    /// Rounded down to tens, never below 10
    Minutes(i64),
    Hours(i64),
    Days(i64),
}

pub fn relative_age(created_at: Time, now: Time) -> Age {
    let minutes = (now - created_at).num_minutes();
    if minutes < 1 {
        // also covers clocks that are slightly ahead of ours
        Age::JustNow
    } else if minutes < MINUTES_IN_HOUR {
        Age::Minutes(std::cmp::max(10, minutes / 10 * 10))
    } else if minutes < MINUTES_IN_DAY {
        Age::Hours(minutes / MINUTES_IN_HOUR)
    } else {
        Age::Days(minutes / MINUTES_IN_DAY)
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Age::JustNow => f.write_str("just now"),
            Age::Minutes(m) => write!(f, "{m} minutes ago"),
            Age::Hours(1) => f.write_str("1 hour ago"),
            Age::Hours(h) => write!(f, "{h} hours ago"),
            Age::Days(1) => f.write_str("1 day ago"),
            Age::Days(d) => write!(f, "{d} days ago"),
        }
    }
}
