use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::LinearScale;
use crate::core::primitives::{datetime_to_unix_millis, unix_millis_to_datetime};
use crate::error::{ChartError, ChartResult};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Linear mapping from a UTC time interval onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScale {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    linear: LinearScale,
}

impl TimeScale {
    /// Creates a scale over `[start, end]`; an empty interval is widened to one day.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        range_start: f64,
        range_end: f64,
    ) -> ChartResult<Self> {
        if end < start {
            return Err(ChartError::InvalidData(
                "time scale end must not precede start".to_owned(),
            ));
        }
        let (start, end) = if end == start {
            match start.checked_add_signed(Duration::days(1)) {
                Some(end) => (start, end),
                None => (start - Duration::days(1), start),
            }
        } else {
            (start, end)
        };
        let linear = LinearScale::new(datetime_to_unix_millis(start), datetime_to_unix_millis(end))?
            .with_range(range_start, range_end)?;
        Ok(Self { start, end, linear })
    }

    #[must_use]
    pub fn domain(self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start, self.end)
    }

    #[must_use]
    pub fn map(self, time: DateTime<Utc>) -> f64 {
        self.linear.map(datetime_to_unix_millis(time))
    }

    pub fn invert(self, pixel: f64) -> ChartResult<DateTime<Utc>> {
        let millis = self.linear.invert(pixel)?;
        unix_millis_to_datetime(millis)
            .ok_or_else(|| ChartError::InvalidData("pixel maps outside time range".to_owned()))
    }

    #[must_use]
    pub fn contains(self, time: DateTime<Utc>) -> bool {
        time >= self.start && time <= self.end
    }

    /// Day-aligned ticks, stepping 1, 2, 7, 14, 30, 90 or 365 days to stay near `count`.
    #[must_use]
    pub fn ticks(self, count: usize) -> Vec<DateTime<Utc>> {
        let span_days = (datetime_to_unix_millis(self.end) - datetime_to_unix_millis(self.start))
            / MILLIS_PER_DAY;
        let target = span_days / count.max(1) as f64;
        let step_days = [1_i64, 2, 7, 14, 30, 90, 365]
            .into_iter()
            .find(|step| *step as f64 >= target)
            .unwrap_or_else(|| 365 * (target / 365.0).ceil() as i64);
        let step = Duration::days(step_days);

        let Some(midnight) = self.start.date_naive().and_hms_opt(0, 0, 0) else {
            return Vec::new();
        };
        let mut cursor = midnight.and_utc();
        if cursor < self.start {
            let Some(next) = cursor.checked_add_signed(Duration::days(1)) else {
                return Vec::new();
            };
            cursor = next;
        }
        let mut out = Vec::new();
        while cursor <= self.end {
            out.push(cursor);
            match cursor.checked_add_signed(step) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        out
    }
}
