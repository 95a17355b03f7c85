//! Slot clock: maps wall-clock time onto the 48 half-hour slots of a day.
//!
//! Slot `i` covers the local window `[i*30min, (i+1)*30min)`; slot 0 starts
//! at midnight. All computations happen in a concrete timezone so that a
//! schedule's slots follow its own local day.

use chrono::{DateTime, TimeDelta, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::time::{Timestamp, parse_timezone};

/// Number of slots tiling one calendar day.
pub const SLOTS_PER_DAY: usize = 48;

/// Length of one slot, in minutes.
pub const MINUTES_PER_SLOT: u32 = 30;

/// Index of the slot containing `now`, in `now`'s own timezone.
#[must_use]
pub fn current_slot_index<Z: TimeZone>(now: &DateTime<Z>) -> usize {
    let minutes = now.hour() * 60 + now.minute();
    (minutes / MINUTES_PER_SLOT) as usize % SLOTS_PER_DAY
}

/// Start of the slot containing `now`.
#[must_use]
pub fn slot_start<Z: TimeZone>(now: &DateTime<Z>) -> DateTime<Z> {
    // Leap seconds are reported as nanosecond >= 1e9.
    let into_slot = TimeDelta::minutes(i64::from(now.minute() % MINUTES_PER_SLOT))
        + TimeDelta::seconds(i64::from(now.second()))
        + TimeDelta::nanoseconds(i64::from(now.nanosecond() % 1_000_000_000));
    now.clone() - into_slot
}

/// First slot boundary strictly after `now`.
///
/// This is the start of slot `(current_slot_index(now) + 1) % 48`, on the
/// next calendar day when the current slot is the last one. Working in
/// absolute time keeps the result on a local half-hour boundary across DST
/// transitions, which always happen on such a boundary.
#[must_use]
pub fn next_slot_boundary<Z: TimeZone>(now: &DateTime<Z>) -> DateTime<Z> {
    slot_start(now) + TimeDelta::minutes(i64::from(MINUTES_PER_SLOT))
}

/// Slot arithmetic bound to a process-wide default timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotClock {
    default_zone: Tz,
}

impl Default for SlotClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl SlotClock {
    #[must_use]
    pub fn new(default_zone: Tz) -> Self {
        Self { default_zone }
    }

    #[must_use]
    pub fn default_zone(&self) -> Tz {
        self.default_zone
    }

    /// Zone a schedule runs in: its own when set, the default otherwise.
    ///
    /// Schedules validate their timezone on construction, so an unparsable
    /// name only shows up for hand-built values and falls back to the default.
    #[must_use]
    pub fn zone(&self, timezone: Option<&str>) -> Tz {
        timezone
            .and_then(|name| parse_timezone(name).ok())
            .unwrap_or(self.default_zone)
    }

    /// Slot index of `now` in `zone`.
    #[must_use]
    pub fn current_slot(&self, now: Timestamp, zone: Tz) -> usize {
        current_slot_index(&now.with_timezone(&zone))
    }

    /// Start of the slot containing `now` in `zone`, as UTC.
    #[must_use]
    pub fn slot_start(&self, now: Timestamp, zone: Tz) -> Timestamp {
        slot_start(&now.with_timezone(&zone)).with_timezone(&Utc)
    }

    /// Next local slot boundary after `now` in `zone`, as UTC.
    #[must_use]
    pub fn next_boundary(&self, now: Timestamp, zone: Tz) -> Timestamp {
        next_slot_boundary(&now.with_timezone(&zone)).with_timezone(&Utc)
    }

    /// Earliest next boundary over the default zone and `zones`.
    #[must_use]
    pub fn earliest_boundary<I>(&self, now: Timestamp, zones: I) -> Timestamp
    where
        I: IntoIterator<Item = Tz>,
    {
        zones
            .into_iter()
            .map(|zone| self.next_boundary(now, zone))
            .fold(self.next_boundary(now, self.default_zone), Timestamp::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn utc(h: u32, m: u32, s: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn should_map_every_minute_of_a_slot_to_that_slot() {
        for slot in 0..SLOTS_PER_DAY {
            let start = u32::try_from(slot).unwrap() * MINUTES_PER_SLOT;
            for offset in 0..MINUTES_PER_SLOT {
                let minutes = start + offset;
                let now = utc(minutes / 60, minutes % 60, 59);
                assert_eq!(current_slot_index(&now), slot, "minute {minutes}");
            }
        }
    }

    #[test]
    fn should_return_slot_zero_at_midnight() {
        assert_eq!(current_slot_index(&utc(0, 0, 0)), 0);
    }

    #[test]
    fn should_return_last_slot_just_before_midnight() {
        assert_eq!(current_slot_index(&utc(23, 59, 59)), 47);
    }

    #[test]
    fn should_return_slot_16_at_eight_oclock() {
        assert_eq!(current_slot_index(&utc(8, 0, 0)), 16);
        assert_eq!(current_slot_index(&utc(7, 59, 59)), 15);
    }

    #[test]
    fn should_return_next_half_hour_as_next_boundary() {
        assert_eq!(next_slot_boundary(&utc(8, 10, 30)), utc(8, 30, 0));
        assert_eq!(next_slot_boundary(&utc(8, 45, 0)), utc(9, 0, 0));
    }

    #[test]
    fn should_advance_when_now_is_exactly_on_a_boundary() {
        assert_eq!(next_slot_boundary(&utc(8, 30, 0)), utc(9, 0, 0));
    }

    #[test]
    fn should_roll_over_to_next_day_from_last_slot() {
        let next = next_slot_boundary(&utc(23, 40, 0));
        let expected = NaiveDate::from_ymd_opt(2026, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(next, expected);
    }

    #[test]
    fn should_always_return_strictly_later_aligned_boundary() {
        let mut now = utc(0, 0, 0);
        for _ in 0..(24 * 60 / 7) {
            let next = next_slot_boundary(&now);
            assert!(next > now);
            assert_eq!(next.minute() % MINUTES_PER_SLOT, 0);
            assert_eq!(next.second(), 0);
            assert_eq!(next.nanosecond(), 0);
            assert_eq!(
                current_slot_index(&next),
                (current_slot_index(&now) + 1) % SLOTS_PER_DAY
            );
            now += TimeDelta::minutes(7) + TimeDelta::milliseconds(13);
        }
    }

    #[test]
    fn should_compute_slot_in_schedule_timezone() {
        let clock = SlotClock::default();
        // 07:15 UTC is 08:15 in Paris during winter time.
        let now = NaiveDate::from_ymd_opt(2026, 1, 10)
            .unwrap()
            .and_hms_opt(7, 15, 0)
            .unwrap()
            .and_utc();
        assert_eq!(clock.current_slot(now, Tz::UTC), 14);
        assert_eq!(clock.current_slot(now, Tz::Europe__Paris), 16);
    }

    #[test]
    fn should_stay_on_local_boundaries_for_quarter_hour_offsets() {
        let clock = SlotClock::default();
        let now = utc(10, 5, 0);
        let next = clock.next_boundary(now, Tz::Asia__Kathmandu);
        let local = next.with_timezone(&Tz::Asia__Kathmandu);
        assert_eq!(local.minute() % MINUTES_PER_SLOT, 0);
        assert!(next > now);
        // Kathmandu is UTC+05:45, so its boundaries fall on :15 and :45 UTC.
        assert_eq!(next, utc(10, 15, 0));
    }

    #[test]
    fn should_cross_dst_gap_onto_a_local_boundary() {
        let clock = SlotClock::default();
        // 2026-03-29 01:45 CET = 00:45 UTC; clocks jump from 02:00 to 03:00.
        let now = NaiveDate::from_ymd_opt(2026, 3, 29)
            .unwrap()
            .and_hms_opt(0, 45, 0)
            .unwrap()
            .and_utc();
        let next = clock.next_boundary(now, Tz::Europe__Paris);
        let local = next.with_timezone(&Tz::Europe__Paris);
        assert_eq!((local.hour(), local.minute()), (3, 0));
    }

    #[test]
    fn should_pick_earliest_boundary_across_zones() {
        let clock = SlotClock::default();
        let now = utc(10, 5, 0);
        let next = clock.earliest_boundary(now, [Tz::Asia__Kathmandu, Tz::Europe__Paris]);
        assert_eq!(next, utc(10, 15, 0));
        assert_eq!(clock.earliest_boundary(now, []), utc(10, 30, 0));
    }

    #[test]
    fn should_fall_back_to_default_zone() {
        let clock = SlotClock::new(Tz::Europe__Berlin);
        assert_eq!(clock.zone(None), Tz::Europe__Berlin);
        assert_eq!(clock.zone(Some("nowhere")), Tz::Europe__Berlin);
        assert_eq!(clock.zone(Some("Asia/Tokyo")), Tz::Asia__Tokyo);
    }

    #[test]
    fn should_truncate_to_slot_start() {
        let clock = SlotClock::default();
        assert_eq!(clock.slot_start(utc(13, 47, 12), Tz::UTC), utc(13, 30, 0));
    }
}
