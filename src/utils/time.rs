use std::time::Duration;

use chrono::Timelike;

/// Time left until the next minute starts.
pub fn until_next_minute(time: &impl Timelike) -> Duration {
    // Leap seconds are reported as nanoseconds past 1_000_000_000.
    let elapsed = Duration::from_secs(time.second().into())
        + Duration::from_nanos(time.nanosecond().min(999_999_999).into());
    Duration::from_secs(60).saturating_sub(elapsed)
}
