use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::catalog::Catalog;

use super::locator::{current_program, next_program_or_wrap, programs_for_day};
use super::models::ScheduleSlot;
use super::synthesizer::synthesize_week;

/// Catalog plus channel zone. Every query re-synthesizes the week from the
/// instant it is asked about, so answers never depend on an earlier call.
#[derive(Debug, Clone)]
pub struct ProgramGuide {
    catalog: Arc<Catalog>,
    zone: FixedOffset,
}

impl ProgramGuide {
    pub fn new(catalog: Arc<Catalog>, zone: FixedOffset) -> Self {
        Self { catalog, zone }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn week(&self, now: DateTime<Utc>) -> Vec<ScheduleSlot> {
        synthesize_week(self.catalog.videos(), &now.with_timezone(&self.zone))
    }

    pub fn current(&self, now: DateTime<Utc>) -> Option<ScheduleSlot> {
        current_program(&self.week(now), now).cloned()
    }

    pub fn next(&self, now: DateTime<Utc>) -> Option<ScheduleSlot> {
        next_program_or_wrap(&self.week(now), now).cloned()
    }

    pub fn day(&self, now: DateTime<Utc>, day: NaiveDate) -> Vec<ScheduleSlot> {
        programs_for_day(&self.week(now), day, &self.zone)
            .into_iter()
            .cloned()
            .collect()
    }

    /// What should air at `now`: the current slot, otherwise the next one
    /// (wrapping at the end of the window). A slot that just finished early
    /// is passed as `finished` and never chosen again for the same airing.
    pub fn resolve(&self, now: DateTime<Utc>, finished: Option<&ScheduleSlot>) -> Option<ScheduleSlot> {
        let week = self.week(now);
        let is_finished = |slot: &ScheduleSlot| {
            finished.is_some_and(|done| {
                done.video_id == slot.video_id && done.start_time == slot.start_time
            })
        };
        week.iter()
            .find(|slot| slot.is_airing(now) && !is_finished(slot))
            .or_else(|| {
                week.iter()
                    .filter(|slot| slot.start_time > now && !is_finished(slot))
                    .min_by_key(|slot| slot.start_time)
            })
            .or_else(|| week.first())
            .cloned()
    }
}
