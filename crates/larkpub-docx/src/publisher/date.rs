//! Report date computation.

use chrono::{DateTime, Days, FixedOffset, Utc};

/// Calendar day before `now` at `offset`, formatted `YYYY.MM.DD`.
#[must_use]
pub fn report_date(now: DateTime<Utc>, offset: FixedOffset) -> String {
    let today = now.with_timezone(&offset).date_naive();
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    yesterday.format("%Y.%m.%d").to_string()
}
