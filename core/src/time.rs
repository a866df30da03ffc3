//! Time related utils.

use crate::Error;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Utc;

/// DateTime is the alias for chrono::DateTime<Utc>.
pub type DateTime = chrono::DateTime<Utc>;

/// Timestamp forms accepted in `st` and `se`, keyed by their exact length.
///
/// - 20: `2022-03-01T08:12:34Z`
/// - 17: `2022-03-01T08:12Z`
/// - 10: `2022-03-01`
const SAS_TIMESTAMP_FORMATS: [(usize, &str); 2] =
    [(20, "%Y-%m-%dT%H:%M:%SZ"), (17, "%Y-%m-%dT%H:%MZ")];

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into RFC3339: `2022-03-13T07:20:04Z`
pub fn format_rfc3339(t: DateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parse a SAS timestamp in one of its three fixed-length forms.
///
/// Date-only values are taken as midnight UTC.
pub fn parse_sas_timestamp(s: &str) -> crate::Result<DateTime> {
    if s.len() == 10 {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| Error::request_invalid(format!("invalid date {s:?}")).with_source(e))?;
        return Ok(date.and_time(chrono::NaiveTime::default()).and_utc());
    }

    let Some((_, format)) = SAS_TIMESTAMP_FORMATS
        .iter()
        .find(|(len, _)| *len == s.len())
    else {
        return Err(Error::request_invalid(format!(
            "timestamp {s:?} must be 20, 17 or 10 characters long"
        )));
    };

    NaiveDateTime::parse_from_str(s, format)
        .map(|t| t.and_utc())
        .map_err(|e| Error::request_invalid(format!("invalid timestamp {s:?}")).with_source(e))
}
