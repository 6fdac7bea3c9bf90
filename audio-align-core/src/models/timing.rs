use chrono::TimeDelta;

/// Resolution of originating-time arithmetic: 100 ns.
pub const TICK: TimeDelta = TimeDelta::nanoseconds(100);

pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Whole ticks in `duration`, truncated toward zero. Saturates on overflow.
pub fn to_ticks(duration: TimeDelta) -> i64 {
    match duration.num_nanoseconds() {
        Some(nanos) => nanos / 100,
        None if duration < TimeDelta::zero() => i64::MIN / 100,
        None => i64::MAX / 100,
    }
}

pub fn from_ticks(ticks: i64) -> TimeDelta {
    TimeDelta::nanoseconds(ticks.saturating_mul(100))
}

/// Build a duration from (possibly fractional) milliseconds, rounded to the nearest tick.
pub fn from_millis_f64(millis: f64) -> TimeDelta {
    from_ticks((millis * 10_000.0).round() as i64)
}
