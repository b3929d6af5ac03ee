//! The boundary predicate gating every call into [`crate::apply_at_boundary`]
//! (§4.7). Applying off-boundary would let two proposals land inside the
//! same minute; this is the only thing that makes "at most one applied or
//! rejected per boundary" true.

use chrono::{TimeZone, Utc};
use mm_types::Ms;

/// `true` iff `now_ms` falls in the grace window immediately after a
/// boundary minute: `(utcMinute % boundaryMinutes == 0) && (utcSecond <
/// graceSeconds)`. A malformed `now_ms` (out of `chrono`'s representable
/// range) is never a boundary.
pub fn is_at_boundary(now_ms: Ms, boundary_minutes: i64, grace_seconds: i64) -> bool {
    if boundary_minutes <= 0 || grace_seconds <= 0 {
        return false;
    }
    let dt = match Utc.timestamp_millis_opt(now_ms).single() {
        Some(dt) => dt,
        None => return false,
    };
    let minute = dt.format("%M").to_string().parse::<i64>().unwrap_or(-1);
    let second = dt.format("%S").to_string().parse::<i64>().unwrap_or(-1);
    minute % boundary_minutes == 0 && second < grace_seconds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms_at(h: u32, m: u32, s: u32) -> Ms {
        Utc.with_ymd_and_hms(2026, 1, 1, h, m, s).unwrap().timestamp_millis()
    }

    #[test]
    fn inside_grace_window_on_boundary_minute_is_true() {
        assert!(is_at_boundary(ms_at(12, 5, 10), 5, 30));
        assert!(is_at_boundary(ms_at(12, 0, 0), 5, 30));
    }

    #[test]
    fn past_grace_window_is_false() {
        assert!(!is_at_boundary(ms_at(12, 5, 45), 5, 30));
    }

    #[test]
    fn non_boundary_minute_is_false() {
        assert!(!is_at_boundary(ms_at(12, 6, 5), 5, 30));
    }

    #[test]
    fn boundary_minutes_not_dividing_sixty_still_checked_modulo() {
        // 7 doesn't divide 60 evenly, but the predicate itself is just modulo
        // arithmetic; config validation is responsible for rejecting such values.
        assert!(is_at_boundary(ms_at(12, 14, 5), 7, 30));
        assert!(!is_at_boundary(ms_at(12, 13, 5), 7, 30));
    }
}
