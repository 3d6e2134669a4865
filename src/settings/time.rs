use std::{fmt::Display, str::FromStr};

use chrono::Timelike;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the user writes reminder targets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "24-hour")]
    #[value(name = "24-hour")]
    TwentyFourHour,
    #[serde(rename = "12-hour")]
    #[value(name = "12-hour")]
    TwelveHour,
}

impl Display for TimeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeFormat::TwentyFourHour => write!(f, "24-hour"),
            TimeFormat::TwelveHour => write!(f, "12-hour"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Period {
    #[serde(rename = "AM")]
    #[value(name = "AM", alias = "am")]
    Am,
    #[serde(rename = "PM")]
    #[value(name = "PM", alias = "pm")]
    Pm,
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Am => write!(f, "AM"),
            Period::Pm => write!(f, "PM"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeOfDayError {
    #[error("expected a time written as HH:MM, got {0:?}")]
    Malformed(String),
    #[error("{input:?} is not a valid {format} time")]
    OutOfRange { input: String, format: TimeFormat },
}

/// A minute of the day. Always stored in 24-hour form, [Display] renders the canonical `HH:MM`
/// string that reminders are compared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Truncates any chrono time down to its minute.
    pub fn of(time: &impl Timelike) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Parses user input written in `format`. `period` is only consulted for 12-hour input.
    pub fn parse(input: &str, format: TimeFormat, period: Period) -> Result<Self, TimeOfDayError> {
        let (hour, minute) = split_hh_mm(input)?;
        let out_of_range = || TimeOfDayError::OutOfRange {
            input: input.to_owned(),
            format,
        };

        if minute > 59 {
            return Err(out_of_range());
        }

        let hour = match format {
            TimeFormat::TwentyFourHour if hour < 24 => hour,
            TimeFormat::TwelveHour if (1..=12).contains(&hour) => match period {
                Period::Pm if hour < 12 => hour + 12,
                Period::Am if hour == 12 => 0,
                _ => hour,
            },
            _ => return Err(out_of_range()),
        };

        Ok(Self { hour, minute })
    }

    /// Splits the time into a 12-hour clock reading.
    pub fn to_twelve_hour(self) -> (u8, u8, Period) {
        let period = if self.hour < 12 { Period::Am } else { Period::Pm };
        let hour = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        (hour, self.minute, period)
    }

    /// Renders the time the way a user would type it in `format`.
    pub fn display_in(self, format: TimeFormat) -> String {
        match format {
            TimeFormat::TwentyFourHour => self.to_string(),
            TimeFormat::TwelveHour => {
                let (hour, minute, period) = self.to_twelve_hour();
                format!("{hour:02}:{minute:02} {period}")
            }
        }
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeOfDay::parse(s, TimeFormat::TwentyFourHour, Period::Am)
    }
}

fn split_hh_mm(input: &str) -> Result<(u8, u8), TimeOfDayError> {
    let malformed = || TimeOfDayError::Malformed(input.to_owned());
    let (hour, minute) = input.trim().split_once(':').ok_or_else(malformed)?;

    let parse_part = |part: &str| {
        if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        part.parse::<u8>().map_err(|_| malformed())
    };

    Ok((parse_part(hour)?, parse_part(minute)?))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::{Period, TimeFormat, TimeOfDay, TimeOfDayError};

    #[test]
    fn test_twelve_hour_conversion() {
        let morning = TimeOfDay::parse("09:00", TimeFormat::TwelveHour, Period::Am).unwrap();
        assert_eq!(morning.to_string(), "09:00");

        let evening = TimeOfDay::parse("09:00", TimeFormat::TwelveHour, Period::Pm).unwrap();
        assert_eq!(evening.to_string(), "21:00");

        let midnight = TimeOfDay::parse("12:30", TimeFormat::TwelveHour, Period::Am).unwrap();
        assert_eq!(midnight.to_string(), "00:30");

        let noon = TimeOfDay::parse("12:30", TimeFormat::TwelveHour, Period::Pm).unwrap();
        assert_eq!(noon.to_string(), "12:30");
    }

    #[test]
    fn test_period_ignored_for_twenty_four_hour() {
        let time = TimeOfDay::parse("09:15", TimeFormat::TwentyFourHour, Period::Pm).unwrap();
        assert_eq!(time.to_string(), "09:15");
    }

    #[test]
    fn test_every_minute_survives_twelve_hour_round_trip() {
        for hour in 0..24 {
            for minute in 0..60 {
                let original = format!("{hour:02}:{minute:02}");
                let time: TimeOfDay = original.parse().unwrap();

                let (twelve_hour, minute, period) = time.to_twelve_hour();
                let back = TimeOfDay::parse(
                    &format!("{twelve_hour:02}:{minute:02}"),
                    TimeFormat::TwelveHour,
                    period,
                )
                .unwrap();

                assert_eq!(back.to_string(), original);
            }
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            "24:00".parse::<TimeOfDay>(),
            Err(TimeOfDayError::OutOfRange { .. })
        ));
        assert!(matches!(
            "10:60".parse::<TimeOfDay>(),
            Err(TimeOfDayError::OutOfRange { .. })
        ));
        assert!(matches!(
            TimeOfDay::parse("00:30", TimeFormat::TwelveHour, Period::Am),
            Err(TimeOfDayError::OutOfRange { .. })
        ));
        assert!(matches!(
            TimeOfDay::parse("13:00", TimeFormat::TwelveHour, Period::Pm),
            Err(TimeOfDayError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_rejects_malformed() {
        for input in ["", "0900", "9:", ":30", "ab:cd", "09:00:00", "-1:30", "123:00"] {
            assert_eq!(
                input.parse::<TimeOfDay>(),
                Err(TimeOfDayError::Malformed(input.to_owned())),
                "{input:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_accepts_single_digit_hour() {
        assert_eq!("9:05".parse::<TimeOfDay>().unwrap().to_string(), "09:05");
        assert_eq!(" 17:00 ".parse::<TimeOfDay>().unwrap().to_string(), "17:00");
    }

    #[test]
    fn test_of_truncates_seconds() {
        let time = NaiveTime::from_hms_opt(9, 0, 59).unwrap();
        assert_eq!(TimeOfDay::of(&time), TimeOfDay::new(9, 0).unwrap());
    }

    #[test]
    fn test_display_in_twelve_hour() {
        let time: TimeOfDay = "00:05".parse().unwrap();
        assert_eq!(time.display_in(TimeFormat::TwelveHour), "12:05 AM");
        let time: TimeOfDay = "13:45".parse().unwrap();
        assert_eq!(time.display_in(TimeFormat::TwelveHour), "01:45 PM");
    }
}
