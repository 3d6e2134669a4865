use std::fmt::Display;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::time::{Period, TimeFormat, TimeOfDay, TimeOfDayError};

pub const DEFAULT_CLOCK_IN: &str = "09:00";
pub const DEFAULT_CLOCK_OUT: &str = "17:00";
pub const LOCAL_TIMEZONE: &str = "Local";

/// One of the two daily targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKind {
    ClockIn,
    ClockOut,
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 2] = [ReminderKind::ClockIn, ReminderKind::ClockOut];

    pub fn title(&self) -> &'static str {
        match self {
            ReminderKind::ClockIn => "Clock In Reminder",
            ReminderKind::ClockOut => "Clock Out Reminder",
        }
    }

    pub fn message(&self, time: TimeOfDay) -> String {
        match self {
            ReminderKind::ClockIn => format!("It's time to clock in! ({time})"),
            ReminderKind::ClockOut => format!("It's time to clock out! ({time})"),
        }
    }
}

impl Display for ReminderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderKind::ClockIn => write!(f, "clock-in"),
            ReminderKind::ClockOut => write!(f, "clock-out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} time: {source}")]
pub struct ValidationError {
    pub kind: ReminderKind,
    #[source]
    pub source: TimeOfDayError,
}

/// Everything that survives a restart. Field names follow the on-disk format, every field is
/// optional in the file and falls back to [Settings::default].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "clock_in_time")]
    pub clock_in: String,
    #[serde(rename = "clock_out_time")]
    pub clock_out: String,
    pub reminder_count: u64,
    #[serde(rename = "is_running")]
    pub running: bool,
    #[serde(rename = "time_format")]
    pub format: TimeFormat,
    pub timezone: String,
    #[serde(rename = "clock_in_ampm")]
    pub clock_in_period: Period,
    #[serde(rename = "clock_out_ampm")]
    pub clock_out_period: Period,
    /// Minute the clock-in reminder last fired, in the configured timezone.
    #[serde(rename = "last_clock_in_fired", skip_serializing_if = "Option::is_none")]
    pub clock_in_fired: Option<NaiveDateTime>,
    #[serde(rename = "last_clock_out_fired", skip_serializing_if = "Option::is_none")]
    pub clock_out_fired: Option<NaiveDateTime>,
    /// Last date that moved `reminder_count`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_counted_date: Option<NaiveDate>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clock_in: DEFAULT_CLOCK_IN.into(),
            clock_out: DEFAULT_CLOCK_OUT.into(),
            reminder_count: 0,
            running: false,
            format: TimeFormat::TwentyFourHour,
            timezone: LOCAL_TIMEZONE.into(),
            clock_in_period: Period::Am,
            clock_out_period: Period::Pm,
            clock_in_fired: None,
            clock_out_fired: None,
            last_counted_date: None,
        }
    }
}

impl Settings {
    /// Resolves the configured target into its canonical 24-hour form.
    pub fn target(&self, kind: ReminderKind) -> Result<TimeOfDay, ValidationError> {
        let (input, period) = match kind {
            ReminderKind::ClockIn => (&self.clock_in, self.clock_in_period),
            ReminderKind::ClockOut => (&self.clock_out, self.clock_out_period),
        };
        TimeOfDay::parse(input, self.format, period)
            .map_err(|source| ValidationError { kind, source })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for kind in ReminderKind::ALL {
            self.target(kind)?;
        }
        Ok(())
    }

    /// Copies the user-facing configuration from `other`. The counter, the running flag and the
    /// firing history are left untouched since they belong to the scheduler.
    pub fn apply_configuration(&mut self, other: &Settings) {
        self.clock_in.clone_from(&other.clock_in);
        self.clock_out.clone_from(&other.clock_out);
        self.format = other.format;
        self.timezone.clone_from(&other.timezone);
        self.clock_in_period = other.clock_in_period;
        self.clock_out_period = other.clock_out_period;
    }

    pub fn last_fired(&self, kind: ReminderKind) -> Option<NaiveDateTime> {
        match kind {
            ReminderKind::ClockIn => self.clock_in_fired,
            ReminderKind::ClockOut => self.clock_out_fired,
        }
    }

    pub fn set_last_fired(&mut self, kind: ReminderKind, minute: NaiveDateTime) {
        match kind {
            ReminderKind::ClockIn => self.clock_in_fired = Some(minute),
            ReminderKind::ClockOut => self.clock_out_fired = Some(minute),
        }
    }
}

/// A named, reusable pair of targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(rename = "clock_in_time")]
    pub clock_in: String,
    #[serde(rename = "clock_out_time")]
    pub clock_out: String,
    #[serde(rename = "time_format", default)]
    pub format: TimeFormat,
    #[serde(rename = "clock_in_ampm", default, skip_serializing_if = "Option::is_none")]
    pub clock_in_period: Option<Period>,
    #[serde(rename = "clock_out_ampm", default, skip_serializing_if = "Option::is_none")]
    pub clock_out_period: Option<Period>,
}

impl Preset {
    /// Captures the targets of `settings`. Periods are kept only for 12-hour presets.
    pub fn from_settings(settings: &Settings) -> Self {
        let twelve_hour = settings.format == TimeFormat::TwelveHour;
        Self {
            clock_in: settings.clock_in.clone(),
            clock_out: settings.clock_out.clone(),
            format: settings.format,
            clock_in_period: twelve_hour.then_some(settings.clock_in_period),
            clock_out_period: twelve_hour.then_some(settings.clock_out_period),
        }
    }

    pub fn apply_to(&self, settings: &mut Settings) {
        settings.clock_in.clone_from(&self.clock_in);
        settings.clock_out.clone_from(&self.clock_out);
        settings.format = self.format;
        if let Some(period) = self.clock_in_period {
            settings.clock_in_period = period;
        }
        if let Some(period) = self.clock_out_period {
            settings.clock_out_period = period;
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut settings = Settings::default();
        self.apply_to(&mut settings);
        settings.validate()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::settings::time::{Period, TimeFormat, TimeOfDayError};

    use super::{Preset, ReminderKind, Settings, ValidationError};

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "clock_in_time": "08:30", "reminder_count": 4 }"#).unwrap();

        assert_eq!(
            settings,
            Settings {
                clock_in: "08:30".into(),
                reminder_count: 4,
                ..Settings::default()
            }
        );
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "clock_in_time": "09:00",
                "clock_out_time": "17:00",
                "reminder_count": 0,
                "is_running": false,
                "time_format": "24-hour",
                "timezone": "Local",
                "clock_in_ampm": "AM",
                "clock_out_ampm": "PM",
            })
        );
    }

    #[test]
    fn test_firing_history_round_trips() {
        let minute = NaiveDate::from_ymd_opt(2018, 7, 4)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut settings = Settings {
            last_counted_date: Some(minute.date()),
            ..Settings::default()
        };
        settings.set_last_fired(ReminderKind::ClockIn, minute);

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["last_clock_in_fired"], "2018-07-04T09:00:00");
        assert_eq!(json["last_counted_date"], "2018-07-04");
        assert!(json.get("last_clock_out_fired").is_none());

        let loaded: Settings = serde_json::from_value(json).unwrap();
        assert_eq!(loaded.last_fired(ReminderKind::ClockIn), Some(minute));
        assert_eq!(loaded.last_fired(ReminderKind::ClockOut), None);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_targets_in_twelve_hour_format() {
        let settings = Settings {
            clock_in: "09:00".into(),
            clock_out: "05:30".into(),
            format: TimeFormat::TwelveHour,
            ..Settings::default()
        };

        assert_eq!(settings.target(ReminderKind::ClockIn).unwrap().to_string(), "09:00");
        assert_eq!(settings.target(ReminderKind::ClockOut).unwrap().to_string(), "17:30");
    }

    #[test]
    fn test_validate_names_the_broken_target() {
        let settings = Settings {
            clock_out: "25:00".into(),
            ..Settings::default()
        };

        let error = settings.validate().unwrap_err();
        assert_eq!(
            error,
            ValidationError {
                kind: ReminderKind::ClockOut,
                source: TimeOfDayError::OutOfRange {
                    input: "25:00".into(),
                    format: TimeFormat::TwentyFourHour,
                },
            }
        );
    }

    #[test]
    fn test_apply_configuration_keeps_counter() {
        let mut current = Settings {
            reminder_count: 12,
            running: true,
            ..Settings::default()
        };
        current.set_last_fired(
            ReminderKind::ClockIn,
            NaiveDate::from_ymd_opt(2018, 7, 4)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        );
        let update = Settings {
            clock_in: "07:45".into(),
            timezone: "Europe/Kyiv".into(),
            reminder_count: 0,
            running: false,
            ..Settings::default()
        };

        current.apply_configuration(&update);

        assert_eq!(current.clock_in, "07:45");
        assert_eq!(current.timezone, "Europe/Kyiv");
        assert_eq!(current.reminder_count, 12);
        assert!(current.running);
        assert!(current.last_fired(ReminderKind::ClockIn).is_some());
    }

    #[test]
    fn test_preset_keeps_periods_only_for_twelve_hour() {
        let twenty_four = Preset::from_settings(&Settings::default());
        assert_eq!(twenty_four.clock_in_period, None);
        assert!(!serde_json::to_string(&twenty_four).unwrap().contains("ampm"));

        let twelve = Preset::from_settings(&Settings {
            format: TimeFormat::TwelveHour,
            clock_out_period: Period::Am,
            ..Settings::default()
        });
        assert_eq!(twelve.clock_in_period, Some(Period::Am));
        assert_eq!(twelve.clock_out_period, Some(Period::Am));
    }

    #[test]
    fn test_preset_apply_to() {
        let preset = Preset {
            clock_in: "08:00".into(),
            clock_out: "04:00".into(),
            format: TimeFormat::TwelveHour,
            clock_in_period: None,
            clock_out_period: Some(Period::Pm),
        };
        let mut settings = Settings {
            reminder_count: 3,
            ..Settings::default()
        };

        preset.apply_to(&mut settings);

        assert_eq!(settings.format, TimeFormat::TwelveHour);
        assert_eq!(settings.target(ReminderKind::ClockIn).unwrap().to_string(), "08:00");
        assert_eq!(settings.target(ReminderKind::ClockOut).unwrap().to_string(), "16:00");
        assert_eq!(settings.reminder_count, 3);
    }
}
