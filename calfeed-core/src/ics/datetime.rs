//! Date-time token resolution.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::ics::tree::Parameter;

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// A resolved date-time property value.
#[derive(Debug, Clone, PartialEq)]
pub enum DateTimeValue {
    /// Trailing `Z`, or a TZID that could not be resolved
    Utc(DateTime<Utc>),
    /// Local time in a known zone, offset computed for that instant
    Zoned(DateTime<Tz>),
    /// No zone information at all
    Floating(NaiveDateTime),
    /// All-day value (`VALUE=DATE` or a bare `YYYYMMDD`)
    Date(NaiveDate),
}

impl DateTimeValue {
    /// Absolute instant, interpreting floating values and dates in `floating_tz`.
    pub fn to_utc(&self, floating_tz: Tz) -> DateTime<Utc> {
        match self {
            DateTimeValue::Utc(dt) => *dt,
            DateTimeValue::Zoned(dt) => dt.with_timezone(&Utc),
            DateTimeValue::Floating(naive) => localize(floating_tz, *naive)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| naive.and_utc()),
            DateTimeValue::Date(date) => {
                let midnight = date.and_time(NaiveTime::MIN);
                localize(floating_tz, midnight)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|| midnight.and_utc())
            }
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, DateTimeValue::Date(_))
    }
}

/// Resolve a token of the form `[;]TZID=<id>:<digits>T<digits>[Z]`.
///
/// Any leading `;`-delimited parameter block is split off the trailing value.
/// Returns `None` only when the value itself is not a date or date-time.
pub fn resolve(token: &str) -> Option<DateTimeValue> {
    let (param_block, value) = match token.rsplit_once(':') {
        Some((params, value)) => (params, value),
        None => ("", token),
    };

    let params: Vec<Parameter> = param_block
        .split(';')
        .filter_map(|p| p.split_once('='))
        .map(|(name, value)| Parameter::single(name, value.trim_matches('"')))
        .collect();

    resolve_with_params(&params, value)
}

/// Resolve a value given the parameters already split off its property line.
pub fn resolve_with_params(params: &[Parameter], value: &str) -> Option<DateTimeValue> {
    let value = value.trim();
    let tzid = params
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case("TZID"))
        .and_then(|p| p.first());
    let is_date = params.iter().any(|p| {
        p.name.eq_ignore_ascii_case("VALUE") && p.first().is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
    });

    if is_date || (value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit())) {
        return NaiveDate::parse_from_str(value.get(..8)?, DATE_FORMAT)
            .ok()
            .map(DateTimeValue::Date);
    }

    let (digits, is_utc) = match value.strip_suffix(['Z', 'z']) {
        Some(digits) => (digits, true),
        None => (value, false),
    };
    let naive = NaiveDateTime::parse_from_str(digits, DATE_TIME_FORMAT).ok()?;

    if is_utc {
        return Some(DateTimeValue::Utc(naive.and_utc()));
    }

    match tzid {
        Some(id) => Some(resolve_zoned(id, naive)),
        None => Some(DateTimeValue::Floating(naive)),
    }
}

fn resolve_zoned(tzid: &str, naive: NaiveDateTime) -> DateTimeValue {
    let zoned = lookup_zone(tzid).and_then(|tz| localize(tz, naive));

    match zoned {
        Some(dt) => DateTimeValue::Zoned(dt),
        None => {
            tracing::debug!(tzid, "unknown timezone id, treating value as UTC");
            DateTimeValue::Utc(naive.and_utc())
        }
    }
}

/// Look up an IANA zone, tolerating the `/vendor/prefix/Area/City` form some
/// producers emit.
fn lookup_zone(tzid: &str) -> Option<Tz> {
    let tzid = tzid.trim().trim_matches('"');
    if let Ok(tz) = tzid.parse::<Tz>() {
        return Some(tz);
    }

    let segments: Vec<&str> = tzid.split('/').filter(|s| !s.is_empty()).collect();
    (1..segments.len())
        .rev()
        .map(|start| segments[segments.len() - start..].join("/"))
        .find_map(|candidate| candidate.parse::<Tz>().ok())
}

/// Pin a local wall-clock time to an instant in `tz`.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times inside a
/// spring-forward gap are shifted forward by the gap.
fn localize(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Offset;

    #[test]
    fn test_denver_summer_uses_daylight_offset() {
        let value = resolve("TZID=America/Denver:20250601T090000").unwrap();
        match &value {
            DateTimeValue::Zoned(dt) => {
                assert_eq!(dt.offset().fix().local_minus_utc(), -6 * 3600);
                assert_eq!(dt.to_rfc3339(), "2025-06-01T09:00:00-06:00");
            }
            other => panic!("Expected zoned value, got {:?}", other),
        }
        assert_eq!(
            value.to_utc(Tz::UTC),
            Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_denver_winter_uses_standard_offset() {
        let Some(DateTimeValue::Zoned(dt)) = resolve(";TZID=America/Denver:20250115T090000") else {
            panic!("Expected zoned value");
        };
        assert_eq!(dt.to_rfc3339(), "2025-01-15T09:00:00-07:00");
    }

    #[test]
    fn test_trailing_z_is_utc() {
        assert_eq!(
            resolve("20250101T120000Z"),
            Some(DateTimeValue::Utc(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_no_zone_is_floating() {
        let value = resolve("20250101T120000").unwrap();
        assert!(matches!(value, DateTimeValue::Floating(_)));

        let berlin: Tz = "Europe/Berlin".parse().unwrap();
        assert_eq!(
            value.to_utc(berlin),
            Utc.with_ymd_and_hms(2025, 1, 1, 11, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_unknown_zone_falls_back_to_utc() {
        assert_eq!(
            resolve("TZID=Mars/Olympus_Mons:20250601T090000"),
            Some(DateTimeValue::Utc(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_vendor_prefixed_zone_is_resolved() {
        let value = resolve("TZID=/mozilla.org/20050126_1/Europe/Paris:20250701T100000").unwrap();
        assert_eq!(
            value.to_utc(Tz::UTC),
            Utc.with_ymd_and_hms(2025, 7, 1, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_gap_time_is_shifted_forward() {
        // 02:30 does not exist in New York on 2025-03-09
        let value = resolve("TZID=America/New_York:20250309T023000").unwrap();
        assert_eq!(
            value.to_utc(Tz::UTC),
            Utc.with_ymd_and_hms(2025, 3, 9, 7, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_ambiguous_time_takes_earlier_instant() {
        let value = resolve("TZID=America/New_York:20251102T013000").unwrap();
        assert_eq!(
            value.to_utc(Tz::UTC),
            Utc.with_ymd_and_hms(2025, 11, 2, 5, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_date_values() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(resolve("20250101"), Some(DateTimeValue::Date(expected)));
        assert_eq!(resolve("VALUE=DATE:20250101"), Some(DateTimeValue::Date(expected)));
        assert!(resolve("20250101").unwrap().is_all_day());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(resolve("tomorrow"), None);
        assert_eq!(resolve("TZID=UTC:2025-01-01"), None);
    }
}
