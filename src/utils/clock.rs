use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, Utc};
use chrono_tz::Tz;
use tokio::time::Instant;
use tracing::debug;

use crate::settings::entities::LOCAL_TIMEZONE;

/// Represents an entity responsible for providing dates across application. This can allow it to
/// be used for testing
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    fn instant(&self) -> Instant;

    async fn sleep(&self, duration: Duration);

    /// Current wall-clock time as seen in `timezone`. See [in_timezone].
    fn now_in(&self, timezone: &str) -> DateTime<FixedOffset> {
        in_timezone(self.time(), timezone)
    }
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Converts `time` into `timezone`, which is either [LOCAL_TIMEZONE] or an IANA name. Anything
/// that can't be resolved falls back to local time.
pub fn in_timezone(time: DateTime<Utc>, timezone: &str) -> DateTime<FixedOffset> {
    let timezone = timezone.trim();
    if timezone.is_empty() || timezone.eq_ignore_ascii_case(LOCAL_TIMEZONE) {
        return time.with_timezone(&Local).fixed_offset();
    }

    match timezone.parse::<Tz>() {
        Ok(tz) => time.with_timezone(&tz).fixed_offset(),
        Err(e) => {
            debug!("Unknown timezone {timezone:?}, falling back to local time: {e}");
            time.with_timezone(&Local).fixed_offset()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, TimeZone, Timelike, Utc};

    use super::in_timezone;

    #[test]
    fn test_named_timezone() {
        let time = Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2018, 7, 4)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        );

        let kyiv = in_timezone(time, "Europe/Kyiv");
        assert_eq!(kyiv.hour(), 15);
        assert_eq!(kyiv, time);

        let utc = in_timezone(time, "UTC");
        assert_eq!(utc.hour(), 12);
    }

    #[test]
    fn test_invalid_timezone_falls_back_to_local() {
        let time = Utc::now();
        let expected = time.with_timezone(&Local).fixed_offset();

        assert_eq!(in_timezone(time, "Invalid/Zone"), expected);
        assert_eq!(in_timezone(time, "Invalid/Zone").offset(), expected.offset());
        assert_eq!(in_timezone(time, "local").offset(), expected.offset());
        assert_eq!(in_timezone(time, "").offset(), expected.offset());
    }
}
