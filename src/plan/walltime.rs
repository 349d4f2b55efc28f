use std::fmt;
use std::ops::Mul;
use std::str::FromStr;

use crate::error::InputError;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// A wall clock time limit, normalised to whole seconds
///
/// Parsed from the formats sbatch accepts for `--time`:
///
/// | text      | meaning                   |
/// | --------- | ------------------------- |
/// | `D-H:M:S` | days, hours, mins, secs   |
/// | `D-H:M`   | days, hours, mins         |
/// | `D-H`     | days, hours               |
/// | `H:M:S`   | hours, mins, secs         |
/// | `M:S`     | mins, secs                |
/// | `M`       | mins                      |
///
/// A day count of zero is treated as if no day count was given, so `0-45` is
/// 45 minutes (like `45`) and not 45 hours. Existing job scripts rely on this.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct WallTime {
    seconds: u64,
}

impl WallTime {
    pub fn from_secs(seconds: u64) -> WallTime {
        WallTime { seconds }
    }

    pub fn as_secs(&self) -> u64 {
        self.seconds
    }

    /// Split into (days, hours, minutes, seconds)
    pub fn parts(&self) -> (u64, u64, u64, u64) {
        let seconds = self.as_secs();
        let days = seconds / DAY;
        let rest = seconds % DAY;
        (days, rest / HOUR, (rest % HOUR) / MINUTE, rest % MINUTE)
    }
}

impl FromStr for WallTime {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let malformed = |reason: &str| InputError::MalformedDuration(text.to_string(), reason.to_string());

        let (days, clock) = match text.split_once('-') {
            Some((days, clock)) => {
                let days = parse_field(days).ok_or_else(|| malformed("day count must be a whole number"))?;
                (days, clock)
            }
            None => (0, text),
        };

        let fields = clock
            .split(':')
            .map(parse_field)
            .collect::<Option<Vec<u64>>>()
            .ok_or_else(|| malformed("time fields must be whole numbers"))?;

        let (hours, minutes, seconds) = match (days > 0, fields.as_slice()) {
            (_, [h, m, s]) => (*h, *m, *s),
            (true, [h, m]) => (*h, *m, 0),
            (true, [h]) => (*h, 0, 0),
            (false, [m, s]) => (0, *m, *s),
            (false, [m]) => (0, *m, 0),
            _ => return Err(malformed("expected at most three ':' separated fields")),
        };

        days.checked_mul(DAY)
            .and_then(|total| total.checked_add(hours.checked_mul(HOUR)?))
            .and_then(|total| total.checked_add(minutes.checked_mul(MINUTE)?))
            .and_then(|total| total.checked_add(seconds))
            .map(WallTime::from_secs)
            .ok_or_else(|| malformed("too large"))
    }
}

fn parse_field(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Renders `D-HH:MM:SS` when there's at least one whole day, `HH:MM:SS` otherwise
impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (days, hours, minutes, seconds) = self.parts();
        if days > 0 {
            write!(f, "{}-{:02}:{:02}:{:02}", days, hours, minutes, seconds)
        } else {
            write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds)
        }
    }
}

impl Mul<u64> for WallTime {
    type Output = WallTime;

    fn mul(self, batches: u64) -> WallTime {
        WallTime::from_secs(self.as_secs().saturating_mul(batches))
    }
}
