//! Funding schedule helpers shared by the venue adapters.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

/// Interval assumed when a venue gives no interval information at all.
pub const DEFAULT_FUNDING_INTERVAL_HOURS: f64 = 8.0;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Replaces a non-finite, zero or negative interval with the default.
pub fn sanitize_interval_hours(hours: f64) -> f64 {
    if hours.is_finite() && hours > 0.0 {
        hours
    } else {
        DEFAULT_FUNDING_INTERVAL_HOURS
    }
}

/// Next funding instant `>= now` on a schedule of fixed slots counted from
/// 00:00 UTC. The last partial slot of the day ends at the next midnight, so
/// any interval of a day or longer settles at midnight.
pub fn next_slot_boundary(now: DateTime<Utc>, interval_hours: f64) -> DateTime<Utc> {
    let interval_ms = ((sanitize_interval_hours(interval_hours) * 3_600_000.0).round() as i64)
        .clamp(1, MILLIS_PER_DAY);
    let midnight = Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::default()));
    let elapsed_ms = (now - midnight).num_milliseconds();

    let slots = (elapsed_ms + interval_ms - 1).div_euclid(interval_ms);
    let boundary_ms = slots * interval_ms;
    if boundary_ms >= MILLIS_PER_DAY {
        midnight + Duration::days(1)
    } else {
        midnight + Duration::milliseconds(boundary_ms)
    }
}

pub fn timestamp_millis_to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

pub fn timestamp_secs_to_utc(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, s).unwrap()
    }

    #[test]
    fn test_sanitize_interval() {
        assert_eq!(sanitize_interval_hours(4.0), 4.0);
        assert_eq!(sanitize_interval_hours(0.0), DEFAULT_FUNDING_INTERVAL_HOURS);
        assert_eq!(sanitize_interval_hours(-1.0), DEFAULT_FUNDING_INTERVAL_HOURS);
        assert_eq!(sanitize_interval_hours(f64::NAN), DEFAULT_FUNDING_INTERVAL_HOURS);
    }

    #[test]
    fn test_eight_hour_slots() {
        assert_eq!(next_slot_boundary(at(5, 30, 0), 8.0), at(8, 0, 0));
        assert_eq!(next_slot_boundary(at(8, 0, 1), 8.0), at(16, 0, 0));
    }

    #[test]
    fn test_boundary_itself_is_returned() {
        assert_eq!(next_slot_boundary(at(16, 0, 0), 8.0), at(16, 0, 0));
        assert_eq!(next_slot_boundary(at(0, 0, 0), 8.0), at(0, 0, 0));
    }

    #[test]
    fn test_wraps_to_next_midnight() {
        let next = next_slot_boundary(at(23, 10, 0), 8.0);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_hourly_slots() {
        assert_eq!(next_slot_boundary(at(13, 0, 30), 1.0), at(14, 0, 0));
    }

    #[test]
    fn test_uneven_interval_ends_at_midnight() {
        // 5h slots: 00, 05, 10, 15, 20, then the day ends.
        let next = next_slot_boundary(at(21, 0, 0), 5.0);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_oversized_interval_settles_at_midnight() {
        let next_midnight = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();
        assert_eq!(next_slot_boundary(at(3, 0, 0), 1e20), next_midnight);
        assert_eq!(next_slot_boundary(at(23, 59, 59), 48.0), next_midnight);
        assert_eq!(next_slot_boundary(at(0, 0, 0), 1e20), at(0, 0, 0));
    }

    #[test]
    fn test_invalid_interval_uses_default() {
        assert_eq!(next_slot_boundary(at(1, 0, 0), 0.0), at(8, 0, 0));
    }

    #[test]
    fn test_timestamp_conversions() {
        assert_eq!(timestamp_millis_to_utc(1_710_028_800_000), Some(at(0, 0, 0)));
        assert_eq!(timestamp_secs_to_utc(1_710_028_800), Some(at(0, 0, 0)));
        assert_eq!(timestamp_secs_to_utc(i64::MAX), None);
    }
}
