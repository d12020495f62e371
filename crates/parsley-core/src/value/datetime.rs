//! DateTime and Duration domain literals (spec §3, §4.8, §6).

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeKind {
    Date,
    Time,
    DateTime,
}

impl DateTimeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
        }
    }
}

/// `@YYYY-MM-DD[THH:MM[:SS]]` literal (spec §6). Components are stored
/// directly rather than behind a single `chrono` type so a bare `date` or
/// `time` literal does not need to fabricate the other half.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub nanosecond: u32,
    /// UTC offset in seconds, if the literal carried a timezone.
    pub timezone_offset_seconds: Option<i32>,
    pub kind: DateTimeKind,
}

impl DateTime {
    #[must_use]
    pub fn date(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
            nanosecond: 0,
            timezone_offset_seconds: None,
            kind: DateTimeKind::Date,
        }
    }

    #[must_use]
    pub fn time(hour: u32, minute: u32, second: u32) -> Self {
        Self {
            year: 0,
            month: 0,
            day: 0,
            hour,
            minute,
            second,
            nanosecond: 0,
            timezone_offset_seconds: None,
            kind: DateTimeKind::Time,
        }
    }

    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn datetime(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            nanosecond: 0,
            timezone_offset_seconds: None,
            kind: DateTimeKind::DateTime,
        }
    }

    fn naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    fn naive_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_nano_opt(self.hour, self.minute, self.second, self.nanosecond)
    }

    fn naive_datetime(&self) -> Option<NaiveDateTime> {
        Some(NaiveDateTime::new(self.naive_date()?, self.naive_time()?))
    }

    /// `.weekday` (spec §4.8): full English weekday name.
    #[must_use]
    pub fn weekday(&self) -> Option<&'static str> {
        Some(match self.naive_date()?.weekday() {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        })
    }

    /// `.unix` / `.timestamp`: seconds since the Unix epoch, UTC.
    #[must_use]
    pub fn unix(&self) -> Option<i64> {
        let naive = match self.kind {
            DateTimeKind::Time => return None,
            _ => self.naive_datetime()?,
        };
        let offset = self.timezone_offset_seconds.unwrap_or(0);
        Some(naive.and_utc().timestamp() - i64::from(offset))
    }

    /// `.iso`: ISO-8601 text, matching the kind the literal was parsed as.
    #[must_use]
    pub fn iso(&self) -> Option<String> {
        match self.kind {
            DateTimeKind::Date => Some(self.naive_date()?.format("%Y-%m-%d").to_string()),
            DateTimeKind::Time => Some(self.naive_time()?.format("%H:%M:%S").to_string()),
            DateTimeKind::DateTime => {
                let naive = self.naive_datetime()?;
                match self.timezone_offset_seconds {
                    Some(offset) => {
                        let tz = chrono::FixedOffset::east_opt(offset)?;
                        Some(tz.from_utc_datetime(&naive).to_rfc3339())
                    }
                    None => Some(naive.format("%Y-%m-%dT%H:%M:%S").to_string()),
                }
            }
        }
    }

    #[must_use]
    pub fn day_of_year(&self) -> Option<u32> {
        Some(self.naive_date()?.ordinal())
    }

    #[must_use]
    pub fn week(&self) -> Option<u32> {
        Some(self.naive_date()?.iso_week().week())
    }
}

/// Calendar-aware duration: months and seconds are added separately so
/// `@1mo` stays meaningful across months of different lengths (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration {
    pub months: i64,
    pub seconds: i64,
}

impl Duration {
    #[must_use]
    pub const fn from_seconds(seconds: i64) -> Self {
        Self { months: 0, seconds }
    }

    #[must_use]
    pub const fn from_months(months: i64) -> Self {
        Self { months, seconds: 0 }
    }

    /// Approximates months using a 30-day average; exact calendar math
    /// requires an anchor date, which a bare `Duration` value does not
    /// carry.
    #[must_use]
    pub const fn total_seconds(&self) -> i64 {
        self.seconds + self.months * 30 * 86_400
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_of_known_date() {
        let dt = DateTime::date(2024, 1, 1);
        assert_eq!(dt.weekday(), Some("Monday"));
    }

    #[test]
    fn iso_formats_date_only() {
        let dt = DateTime::date(2024, 3, 5);
        assert_eq!(dt.iso().as_deref(), Some("2024-03-05"));
    }

    #[test]
    fn unix_is_none_for_bare_time() {
        let t = DateTime::time(10, 30, 0);
        assert_eq!(t.unix(), None);
    }

    #[test]
    fn duration_total_seconds_combines_months_and_seconds() {
        let d = Duration {
            months: 1,
            seconds: 60,
        };
        assert_eq!(d.total_seconds(), 30 * 86_400 + 60);
    }
}
