//! Calendar helpers anchored to the server's local day boundary

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Today's date in server-local time
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Instant at which `date` begins in server-local time
pub fn start_of_local_day(date: NaiveDate) -> DateTime<Utc> {
    local_to_utc(date.and_time(chrono::NaiveTime::MIN))
}

/// Last millisecond of `date` in server-local time
pub fn end_of_local_day(date: NaiveDate) -> DateTime<Utc> {
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN));
    local_to_utc(end)
}

fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Inside a DST gap; treat the wall time as UTC-offset-free
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}
