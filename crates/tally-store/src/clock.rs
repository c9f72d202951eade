//! Server clock used to resolve `FieldValue::ServerTimestamp`

use chrono::{DateTime, Duration, DurationRound, SecondsFormat, Utc};
use std::sync::Mutex;

/// Wall clock truncated to microseconds that never repeats or goes back
///
/// Two writes in the same microsecond get distinct, ordered stamps, so
/// "order by createdAt" is total within one store.
#[derive(Debug)]
pub struct ServerClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl ServerClock {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let tick = Duration::microseconds(1);
        let wall = Utc::now();
        let wall = wall.duration_trunc(tick).unwrap_or(wall);

        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let stamp = match *last {
            Some(prev) if wall <= prev => prev + tick,
            _ => wall,
        };
        *last = Some(stamp);
        stamp
    }

    /// `now()` in the wire form stored in documents
    pub fn now_rfc3339(&self) -> String {
        format_timestamp(self.now())
    }
}

impl Default for ServerClock {
    fn default() -> Self {
        Self::new()
    }
}

/// RFC 3339, UTC, fixed microsecond precision; sorts lexicographically
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
