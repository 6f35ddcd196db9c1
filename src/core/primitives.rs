pub const SECONDS_PER_MINUTE: i64 = 60;

/// Floors a UTC second timestamp to the start of its minute.
///
/// `None` when the minute start is not representable as `i64`.
#[must_use]
pub fn minute_bucket(timestamp: i64) -> Option<i64> {
    timestamp.checked_sub(timestamp.rem_euclid(SECONDS_PER_MINUTE))
}
