use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::i18n::{LanguageCode, LocalizedText};

use super::media::MediaSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCategory {
    Sermon,
    Praise,
    Podcast,
    Interview,
    Testimony,
}

impl VideoCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoCategory::Sermon => "sermon",
            VideoCategory::Praise => "praise",
            VideoCategory::Podcast => "podcast",
            VideoCategory::Interview => "interview",
            VideoCategory::Testimony => "testimony",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VideoCategory::Sermon => "Sermon",
            VideoCategory::Praise => "Praise & Worship",
            VideoCategory::Podcast => "Podcast",
            VideoCategory::Interview => "Interviews",
            VideoCategory::Testimony => "Testimonies",
        }
    }
}

impl fmt::Display for VideoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sermon" => Ok(VideoCategory::Sermon),
            "praise" => Ok(VideoCategory::Praise),
            "podcast" => Ok(VideoCategory::Podcast),
            "interview" => Ok(VideoCategory::Interview),
            "testimony" => Ok(VideoCategory::Testimony),
            other => Err(format!("unknown video category: {other}")),
        }
    }
}

/// Longest programme the guide will schedule: the whole rolling week.
pub const MAX_DURATION_MINUTES: u32 = 7 * 24 * 60;

/// Keyword lookup used when a catalog entry carries no explicit duration.
pub fn infer_duration_minutes(title: &str, category: VideoCategory) -> u32 {
    let lower = title.to_lowercase();
    if lower.contains("fire on the altar")
        || lower.contains("prayer rally")
        || lower.contains("service")
    {
        return 90;
    }
    match category {
        VideoCategory::Podcast => 45,
        VideoCategory::Praise => 30,
        _ => 60,
    }
}

/// Entry as written in the catalog file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CatalogEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub title_localized: LocalizedText,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub description_localized: LocalizedText,
    pub category: VideoCategory,
    pub url: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub preacher: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub title_localized: LocalizedText,
    pub description: Option<String>,
    pub description_localized: LocalizedText,
    pub category: VideoCategory,
    pub url: String,
    pub display_date: String,
    pub duration_minutes: u32,
    pub thumbnail: Option<String>,
    pub preacher: Option<String>,
    pub featured: bool,
}

impl VideoRecord {
    /// Record with the duration inferred from title and category.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: VideoCategory,
        url: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let duration_minutes = infer_duration_minutes(&title, category);
        Self {
            id: id.into(),
            title,
            title_localized: LocalizedText::default(),
            description: None,
            description_localized: LocalizedText::default(),
            category,
            url: url.into(),
            display_date: String::new(),
            duration_minutes,
            thumbnail: None,
            preacher: None,
            featured: false,
        }
    }

    pub fn with_display_date(mut self, date: impl Into<String>) -> Self {
        self.display_date = date.into();
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub(crate) fn from_entry(entry: CatalogEntry) -> Self {
        let mut record = Self::new(entry.id, entry.title, entry.category, entry.url)
            .with_display_date(entry.date);
        if let Some(minutes) = entry.duration_minutes.filter(|minutes| *minutes > 0) {
            record = record.with_duration(minutes);
        }
        Self {
            title_localized: entry.title_localized,
            description: entry.description,
            description_localized: entry.description_localized,
            thumbnail: entry.thumbnail,
            preacher: entry.preacher,
            featured: entry.featured,
            ..record
        }
    }

    pub fn title_in(&self, language: LanguageCode) -> &str {
        self.title_localized.pick(language, &self.title)
    }

    pub fn description_in(&self, language: LanguageCode) -> Option<&str> {
        self.description_localized
            .get(language)
            .or(self.description.as_deref())
    }

    pub fn media(&self) -> MediaSource {
        MediaSource::classify(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_durations() {
        assert_eq!(infer_duration_minutes("Monday Service", VideoCategory::Sermon), 90);
        assert_eq!(
            infer_duration_minutes("FIRE ON THE ALTAR day 3", VideoCategory::Praise),
            90
        );
        assert_eq!(infer_duration_minutes("Prayer Rally", VideoCategory::Podcast), 90);
        assert_eq!(infer_duration_minutes("Podcast", VideoCategory::Podcast), 45);
        assert_eq!(infer_duration_minutes("Hallelujah", VideoCategory::Praise), 30);
        assert_eq!(infer_duration_minutes("My story", VideoCategory::Testimony), 60);
    }

    #[test]
    fn explicit_duration_wins_over_keywords() {
        let entry: CatalogEntry = toml::from_str(
            r#"
            id = "a"
            title = "Sunday Service"
            category = "sermon"
            url = "/videos/a.mp4"
            duration_minutes = 120
            "#,
        )
        .unwrap();
        assert_eq!(VideoRecord::from_entry(entry).duration_minutes, 120);
    }
}
