use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::catalog::{VideoCategory, VideoRecord};
use crate::i18n::{LanguageCode, LocalizedText};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramKind {
    Worship,
    Teaching,
    Sermon,
}

impl ProgramKind {
    pub fn from_category(category: VideoCategory) -> Self {
        match category {
            VideoCategory::Praise => ProgramKind::Worship,
            VideoCategory::Podcast => ProgramKind::Teaching,
            _ => ProgramKind::Sermon,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramKind::Worship => "worship",
            ProgramKind::Teaching => "teaching",
            ProgramKind::Sermon => "sermon",
        }
    }
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One airing of a catalog video inside the rolling week.
///
/// `slot_id` is `{video_id}-{day_index}-{index_within_day}` and only stable
/// for a given synthesis instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSlot {
    pub slot_id: String,
    pub video_id: String,
    pub title: String,
    pub title_localized: LocalizedText,
    pub thumbnail: Option<String>,
    pub kind: ProgramKind,
    pub day_index: u8,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl ScheduleSlot {
    pub(crate) fn for_video(
        video: &VideoRecord,
        day_index: u8,
        index_within_day: usize,
        start_time: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Self {
        Self {
            slot_id: format!("{}-{}-{}", video.id, day_index, index_within_day),
            video_id: video.id.clone(),
            title: video.title.clone(),
            title_localized: video.title_localized.clone(),
            thumbnail: video.thumbnail.clone(),
            kind: ProgramKind::from_category(video.category),
            day_index,
            start_time,
            end_time: start_time + Duration::minutes(i64::from(duration_minutes)),
            duration_minutes,
        }
    }

    pub fn is_airing(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now < self.end_time
    }

    pub fn title_in(&self, language: LanguageCode) -> &str {
        self.title_localized.pick(language, &self.title)
    }
}
