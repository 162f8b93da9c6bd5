//! Trading session calendar: IANA-timezone-aware close detection.
//!
//! Session classification works on explicit wall-clock boundaries in the
//! exchange's timezone, never on string-formatted timestamps.

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown IANA timezone {0:?}")]
    UnknownTimezone(String),

    #[error("invalid close time {0:?}, expected HH:MM")]
    InvalidCloseTime(String),
}

/// Wall-clock session close for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCalendar {
    tz: Tz,
    close: NaiveTime,
}

impl SessionCalendar {
    pub fn new(tz: Tz, close: NaiveTime) -> Self {
        Self { tz, close }
    }

    /// Parse from config strings, e.g. `("America/New_York", "16:00")`.
    pub fn parse(tz_name: &str, close_time: &str) -> Result<Self, SessionError> {
        let tz: Tz = tz_name
            .parse()
            .map_err(|_| SessionError::UnknownTimezone(tz_name.to_string()))?;
        let close = NaiveTime::parse_from_str(close_time, "%H:%M")
            .map_err(|_| SessionError::InvalidCloseTime(close_time.to_string()))?;
        Ok(Self { tz, close })
    }

    /// True if the instant falls at or after the session close for its
    /// trading day, in the exchange's local wall clock.
    pub fn at_or_after_close(&self, ts: DateTime<Utc>) -> bool {
        ts.with_timezone(&self.tz).time() >= self.close
    }
}
