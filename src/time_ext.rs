use std::time::Duration as StdDuration;
use time::OffsetDateTime;

pub(crate) trait TimeDurationExt {
    /// Negative durations are clamped to zero.
    fn to_std_duration(self) -> StdDuration;
}

impl TimeDurationExt for time::Duration {
    fn to_std_duration(self) -> StdDuration {
        match self.is_negative() {
            true => StdDuration::ZERO,
            false => StdDuration::from_nanos(
                self.whole_nanoseconds().try_into().unwrap_or(u64::MAX),
            ),
        }
    }
}

pub(crate) trait OffsetDateTimeExt {
    /// Seconds since the unix epoch, including the sub-second part.
    fn unix_timestamp_f64(self) -> f64;
}

impl OffsetDateTimeExt for OffsetDateTime {
    fn unix_timestamp_f64(self) -> f64 {
        self.unix_timestamp_nanos() as f64 / 1_000_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;

    #[test]
    fn negative_durations_clamp_to_zero() {
        assert_that(time::Duration::seconds(-5).to_std_duration()).is_equal_to(StdDuration::ZERO);
    }

    #[test]
    fn positive_durations_are_kept() {
        assert_that(time::Duration::milliseconds(1500).to_std_duration())
            .is_equal_to(StdDuration::from_millis(1500));
    }

    #[test]
    fn fractional_unix_timestamp() {
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
            + time::Duration::milliseconds(500);
        assert_that(at.unix_timestamp_f64()).is_equal_to(1_700_000_000.5);
    }
}
