use ansi_term::Colour;
use chrono::{DateTime, FixedOffset, TimeDelta};
use chrono_tz::Tz;
use clap::Parser;

use crate::{
    scheduler::tracker::next_event,
    settings::{
        entities::{ReminderKind, Settings, ValidationError, LOCAL_TIMEZONE},
        time::{Period, TimeFormat, TimeOfDay},
    },
};

#[derive(Debug, Parser)]
pub struct SetCommand {
    #[arg(long, help = "Clock-in time written as HH:MM")]
    clock_in: Option<String>,
    #[arg(long, help = "Clock-out time written as HH:MM")]
    clock_out: Option<String>,
    #[arg(long, value_enum, help = "How clock-in and clock-out times are written")]
    format: Option<TimeFormat>,
    #[arg(long, value_enum, help = "AM or PM for the clock-in time in 12-hour format")]
    clock_in_period: Option<Period>,
    #[arg(long, value_enum, help = "AM or PM for the clock-out time in 12-hour format")]
    clock_out_period: Option<Period>,
    #[arg(
        long,
        help = "\"Local\" or an IANA name such as Europe/Kyiv. Unknown names fall back to local time"
    )]
    timezone: Option<String>,
}

impl SetCommand {
    pub fn is_empty(&self) -> bool {
        self.clock_in.is_none()
            && self.clock_out.is_none()
            && self.format.is_none()
            && self.clock_in_period.is_none()
            && self.clock_out_period.is_none()
            && self.timezone.is_none()
    }

    /// Applies the given options on top of `settings` and validates the result.
    pub fn apply(self, settings: &mut Settings) -> Result<(), ValidationError> {
        let mut updated = settings.clone();
        if let Some(clock_in) = self.clock_in {
            updated.clock_in = clock_in.trim().to_owned();
        }
        if let Some(clock_out) = self.clock_out {
            updated.clock_out = clock_out.trim().to_owned();
        }
        if let Some(format) = self.format {
            updated.format = format;
        }
        if let Some(period) = self.clock_in_period {
            updated.clock_in_period = period;
        }
        if let Some(period) = self.clock_out_period {
            updated.clock_out_period = period;
        }
        if let Some(timezone) = self.timezone {
            updated.timezone = timezone.trim().to_owned();
        }

        updated.validate()?;
        *settings = updated;
        Ok(())
    }
}

pub fn is_known_timezone(timezone: &str) -> bool {
    timezone.eq_ignore_ascii_case(LOCAL_TIMEZONE) || timezone.parse::<Tz>().is_ok()
}

/// Formats a countdown as `HH:MM:SS`. Negative values show as zero.
pub fn format_countdown(remaining: TimeDelta) -> String {
    let seconds = remaining.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds % 3600 / 60,
        seconds % 60
    )
}

pub fn print_status(settings: &Settings, service_alive: bool, now: DateTime<FixedOffset>) {
    let state = match (settings.running, service_alive) {
        (true, true) => Colour::Green.bold().paint("running"),
        (true, false) => Colour::Yellow.bold().paint("enabled, service not running"),
        (false, _) => Colour::Red.bold().paint("stopped"),
    };
    println!("Reminders:     {state}");

    for kind in ReminderKind::ALL {
        let label = match kind {
            ReminderKind::ClockIn => "Clock in:     ",
            ReminderKind::ClockOut => "Clock out:    ",
        };
        match settings.target(kind) {
            Ok(time) => println!("{label} {}", time.display_in(settings.format)),
            Err(e) => println!("{label} {}", Colour::Red.paint(e.to_string())),
        }
    }

    let now = now.naive_local();
    match next_event(settings, now) {
        Some((kind, time)) => println!(
            "Next:          {kind} at {} in {}",
            TimeOfDay::of(&time).display_in(settings.format),
            Colour::Cyan.paint(format_countdown(time - now))
        ),
        None => println!("Next:          {}", Colour::Red.paint("invalid time format")),
    }

    println!("Format:        {}", settings.format);
    if is_known_timezone(&settings.timezone) {
        println!("Timezone:      {}", settings.timezone);
    } else {
        println!(
            "Timezone:      {} {}",
            settings.timezone,
            Colour::Yellow.paint("(unknown, using local time)")
        );
    }
    println!(
        "Reminder days: {}",
        Colour::Cyan.bold().paint(settings.reminder_count.to_string())
    );
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use clap::Parser;

    use crate::settings::{
        entities::{ReminderKind, Settings},
        time::TimeFormat,
    };

    use super::{format_countdown, is_known_timezone, SetCommand};

    fn parse(args: &[&str]) -> SetCommand {
        SetCommand::parse_from(std::iter::once("set").chain(args.iter().copied()))
    }

    #[test]
    fn test_set_twelve_hour() {
        let mut settings = Settings::default();
        parse(&[
            "--clock-in",
            "08:00",
            "--clock-out",
            "04:30",
            "--format",
            "12-hour",
            "--clock-out-period",
            "PM",
        ])
        .apply(&mut settings)
        .unwrap();

        assert_eq!(settings.format, TimeFormat::TwelveHour);
        assert_eq!(settings.target(ReminderKind::ClockIn).unwrap().to_string(), "08:00");
        assert_eq!(settings.target(ReminderKind::ClockOut).unwrap().to_string(), "16:30");
    }

    #[test]
    fn test_invalid_set_leaves_settings_untouched() {
        let mut settings = Settings::default();

        let result = parse(&["--clock-in", "07:00", "--clock-out", "17:00", "--format", "12-hour"])
            .apply(&mut settings);

        assert_eq!(result.unwrap_err().kind, ReminderKind::ClockOut);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_is_empty() {
        assert!(parse(&[]).is_empty());
        assert!(!parse(&["--timezone", "UTC"]).is_empty());
    }

    #[test]
    fn test_known_timezones() {
        assert!(is_known_timezone("Local"));
        assert!(is_known_timezone("America/New_York"));
        assert!(!is_known_timezone("Invalid/Zone"));
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(TimeDelta::seconds(0)), "00:00:00");
        assert_eq!(
            format_countdown(TimeDelta::hours(26) + TimeDelta::seconds(61)),
            "26:01:01"
        );
        assert_eq!(format_countdown(TimeDelta::seconds(-5)), "00:00:00");
    }
}
