use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::America::Argentina::Buenos_Aires;

/// RFC 3339 timestamp in local farm time, used for `created_at`.
pub fn current_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    Buenos_Aires
        .from_utc_datetime(&instant.naive_utc())
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}
