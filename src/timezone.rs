//! Resolving the server's configured timezone.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// The current UTC offset of `canonical_timezone`, e.g. "America/Sao_Paulo".
///
/// Returns `None` if the name is not a canonical timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's date in `canonical_timezone`.
///
/// # Errors
///
/// Returns [Error::InvalidTimezoneError] if the timezone is unknown.
pub fn current_local_date(canonical_timezone: &str) -> Result<Date, Error> {
    let offset = get_local_offset(canonical_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {canonical_timezone}");
        Error::InvalidTimezoneError(canonical_timezone.to_owned())
    })?;

    Ok(OffsetDateTime::now_utc().to_offset(offset).date())
}

#[cfg(test)]
mod timezone_tests {
    use time::{OffsetDateTime, UtcOffset};

    use crate::Error;

    use super::{current_local_date, get_local_offset};

    #[test]
    fn utc_has_zero_offset() {
        assert_eq!(get_local_offset("Etc/UTC"), Some(UtcOffset::UTC));
    }

    #[test]
    fn unknown_timezone_has_no_offset() {
        assert_eq!(get_local_offset("Terra/Média"), None);
    }

    #[test]
    fn current_local_date_in_utc() {
        assert_eq!(
            current_local_date("Etc/UTC"),
            Ok(OffsetDateTime::now_utc().date())
        );
    }

    #[test]
    fn current_local_date_rejects_unknown_timezone() {
        assert_eq!(
            current_local_date("Terra/Média"),
            Err(Error::InvalidTimezoneError("Terra/Média".to_owned()))
        );
    }
}
