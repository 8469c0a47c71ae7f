//! Resolves the server's configured timezone to a UTC offset.
//!
//! Timestamps are stored in UTC; pages that show dates convert them with the
//! offset returned here.

use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// Look up the current UTC offset for an IANA timezone name such as
/// "America/Sao_Paulo".
///
/// Returns [None] if the name is not a known timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}
