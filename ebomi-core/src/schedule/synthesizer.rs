use std::collections::HashSet;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use tracing::debug;

use crate::catalog::{display_date_key, VideoRecord, MAX_DURATION_MINUTES};

use super::models::ScheduleSlot;

pub const SCHEDULE_DAYS: u8 = 7;
pub const MINUTES_PER_DAY: u64 = 24 * 60;

/// Builds the rolling seven-day timetable starting at the local midnight of
/// `now`.
///
/// Every day airs the whole catalog once, oldest display date first, with the
/// slack of the day split evenly between consecutive airings. When the
/// catalog does not fit in a day the gap is zero and airings run past
/// midnight into the next day.
pub fn synthesize_week<Tz: TimeZone>(videos: &[VideoRecord], now: &DateTime<Tz>) -> Vec<ScheduleSlot> {
    if videos.is_empty() {
        return Vec::new();
    }

    let mut ordered: Vec<&VideoRecord> = videos.iter().collect();
    ordered.sort_by_key(|video| display_date_key(&video.display_date));

    let durations: Vec<u32> = ordered
        .iter()
        .map(|video| video.duration_minutes.clamp(1, MAX_DURATION_MINUTES))
        .collect();
    let total: u64 = durations.iter().map(|minutes| u64::from(*minutes)).sum();
    let spacing = gap_minutes(total, ordered.len());

    let first_day = now.date_naive();
    let mut slots = Vec::with_capacity(ordered.len() * usize::from(SCHEDULE_DAYS));
    for day_index in 0..SCHEDULE_DAYS {
        let Some(day) = first_day.checked_add_days(Days::new(u64::from(day_index))) else {
            break;
        };
        let day_start = local_midnight(now, day);
        let mut offset_minutes = 0.0_f64;
        for (index, (video, duration)) in ordered.iter().zip(&durations).enumerate() {
            let start = day_start + Duration::milliseconds((offset_minutes * 60_000.0).round() as i64);
            slots.push(ScheduleSlot::for_video(video, day_index, index, start, *duration));
            offset_minutes += f64::from(*duration);
            if index + 1 < ordered.len() {
                offset_minutes += spacing;
            }
        }
    }

    let mut seen = HashSet::with_capacity(slots.len());
    slots.retain(|slot| {
        seen.insert((
            slot.video_id.clone(),
            slot.start_time.timestamp_millis(),
            slot.end_time.timestamp_millis(),
        ))
    });
    slots.sort_by_key(|slot| slot.start_time);

    debug!(
        target: "schedule",
        videos = videos.len(),
        slots = slots.len(),
        daily_minutes = total,
        gap_minutes = spacing,
        "week synthesized"
    );
    slots
}

/// Minutes between consecutive airings. Clamped at zero when the catalog
/// overflows a day.
pub fn gap_minutes(total_minutes: u64, videos: usize) -> f64 {
    if videos < 2 || total_minutes >= MINUTES_PER_DAY {
        return 0.0;
    }
    (MINUTES_PER_DAY - total_minutes) as f64 / (videos - 1) as f64
}

pub(crate) fn local_midnight<Tz: TimeZone>(now: &DateTime<Tz>, day: NaiveDate) -> DateTime<Utc> {
    let naive = day.and_time(NaiveTime::MIN);
    match now.timezone().from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Midnight skipped by a DST jump: fall back to the current offset.
        None => {
            let offset = i64::from(now.offset().fix().local_minus_utc());
            Utc.from_utc_datetime(&naive) - Duration::seconds(offset)
        }
    }
}
