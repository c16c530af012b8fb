use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};

use super::models::ScheduleSlot;
use super::synthesizer::local_midnight;

/// First slot, in schedule order, airing at `now`.
pub fn current_program(schedule: &[ScheduleSlot], now: DateTime<Utc>) -> Option<&ScheduleSlot> {
    schedule.iter().find(|slot| slot.is_airing(now))
}

/// Slot with the earliest start strictly after `now`.
pub fn next_program(schedule: &[ScheduleSlot], now: DateTime<Utc>) -> Option<&ScheduleSlot> {
    schedule
        .iter()
        .filter(|slot| slot.start_time > now)
        .min_by_key(|slot| slot.start_time)
}

/// Like [`next_program`], wrapping to the first slot once the window is exhausted.
pub fn next_program_or_wrap(schedule: &[ScheduleSlot], now: DateTime<Utc>) -> Option<&ScheduleSlot> {
    next_program(schedule, now).or_else(|| schedule.first())
}

/// Guide listing for one local calendar day: slots starting that day and
/// slots overlapping it from either side.
pub fn programs_for_day<'a, Tz: TimeZone>(
    schedule: &'a [ScheduleSlot],
    day: NaiveDate,
    zone: &Tz,
) -> Vec<&'a ScheduleSlot> {
    let reference = zone.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN));
    let day_start = local_midnight(&reference, day);
    let day_end = day
        .checked_add_days(Days::new(1))
        .map(|next| local_midnight(&reference, next))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    schedule
        .iter()
        .filter(|slot| slot.start_time < day_end && slot.end_time > day_start)
        .collect()
}

/// Countdown label used by the guide: "Now", "in 2h 5m" or "in 45m".
pub fn time_until(slot: &ScheduleSlot, now: DateTime<Utc>) -> String {
    let remaining = slot.start_time - now;
    if remaining <= chrono::Duration::zero() {
        return "Now".to_string();
    }
    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    if hours > 0 {
        format!("in {hours}h {minutes}m")
    } else {
        format!("in {minutes}m")
    }
}

/// Clock time label in the channel zone, e.g. "9:30 PM".
pub fn format_program_time<Tz: TimeZone>(instant: DateTime<Utc>, zone: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.with_timezone(zone).format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{VideoCategory, VideoRecord};
    use crate::schedule::synthesize_week;
    use chrono::FixedOffset;

    fn sample_week() -> (Vec<ScheduleSlot>, DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        let videos = vec![
            VideoRecord::new("a", "Podcast", VideoCategory::Podcast, "/a.mp4")
                .with_display_date("1 January 2024"),
            VideoRecord::new("b", "Service", VideoCategory::Sermon, "/b.mp4")
                .with_display_date("2 January 2024"),
        ];
        (synthesize_week(&videos, &now), now)
    }

    #[test]
    fn gap_between_programs_has_no_current() {
        let (week, now) = sample_week();
        assert!(current_program(&week, now).is_none());
        let next = next_program(&week, now).unwrap();
        assert_eq!(next.slot_id, "b-0-1");
        assert_eq!(time_until(next, now), "in 14h 30m");
    }

    #[test]
    fn end_of_window_wraps_to_first_slot() {
        let (week, _) = sample_week();
        let after = week.last().unwrap().end_time;
        assert!(next_program(&week, after).is_none());
        assert_eq!(next_program_or_wrap(&week, after).unwrap().slot_id, "a-0-0");
    }

    #[test]
    fn day_listing_includes_overlapping_slots() {
        let (week, _) = sample_week();
        let day = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        let listing = programs_for_day(&week, day, &Utc);
        let ids: Vec<_> = listing.iter().map(|slot| slot.slot_id.as_str()).collect();
        assert_eq!(ids, vec!["a-1-0", "b-1-1"]);

        let shifted = FixedOffset::east_opt(3600).unwrap();
        // 23:00 UTC on the 10th is midnight in the +01:00 zone, so the
        // previous day's "b" (22:30-24:00 UTC) overlaps the start.
        let listing = programs_for_day(&week, day, &shifted);
        assert_eq!(listing.first().unwrap().slot_id, "b-0-1");
    }

    #[test]
    fn countdown_labels() {
        let (week, now) = sample_week();
        let slot = &week[0];
        assert_eq!(time_until(slot, now), "Now");
        let later = slot.start_time - chrono::Duration::minutes(45);
        assert_eq!(time_until(slot, later), "in 45m");
        assert_eq!(
            format_program_time(week[1].start_time, &Utc),
            "10:30 PM"
        );
    }
}
