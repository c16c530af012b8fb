mod dates;
mod media;
mod models;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

pub use dates::{display_date_key, parse_display_date};
pub use media::MediaSource;
pub use models::{infer_duration_minutes, VideoCategory, VideoRecord, MAX_DURATION_MINUTES};

use models::CatalogEntry;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        source: toml::de::Error,
        path: PathBuf,
    },
    #[error("catalog entry #{index} has an empty id")]
    EmptyId { index: usize },
    #[error("duplicate video id in catalog: {0}")]
    DuplicateId(String),
    #[error("video {0} has no playable url")]
    EmptyUrl(String),
    #[error("video {id} lasts {minutes} minutes, more than the {max} a week holds")]
    DurationOutOfRange { id: String, minutes: u32, max: u32 },
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    videos: Vec<CatalogEntry>,
}

/// Ordered, validated list of videos available for the programme guide.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    videos: Vec<VideoRecord>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(videos: Vec<VideoRecord>) -> CatalogResult<Self> {
        let mut index = HashMap::with_capacity(videos.len());
        for (position, video) in videos.iter().enumerate() {
            if video.id.trim().is_empty() {
                return Err(CatalogError::EmptyId { index: position });
            }
            if video.url.trim().is_empty() {
                return Err(CatalogError::EmptyUrl(video.id.clone()));
            }
            if video.duration_minutes > MAX_DURATION_MINUTES {
                return Err(CatalogError::DurationOutOfRange {
                    id: video.id.clone(),
                    minutes: video.duration_minutes,
                    max: MAX_DURATION_MINUTES,
                });
            }
            if index.insert(video.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(video.id.clone()));
            }
        }
        Ok(Self { videos, index })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str, path: &Path) -> CatalogResult<Self> {
        let file: CatalogFile = toml::from_str(content).map_err(|source| CatalogError::Parse {
            source,
            path: path.to_path_buf(),
        })?;
        Self::new(file.videos.into_iter().map(VideoRecord::from_entry).collect())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        let catalog = Self::from_toml_str(&content, path)?;
        info!(
            target: "catalog",
            path = %path.display(),
            videos = catalog.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&VideoRecord> {
        self.index.get(id).map(|position| &self.videos[*position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoRecord> {
        self.videos.iter()
    }

    pub fn videos(&self) -> &[VideoRecord] {
        &self.videos
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    pub fn by_category(&self, category: VideoCategory) -> impl Iterator<Item = &VideoRecord> {
        self.videos
            .iter()
            .filter(move |video| video.category == category)
    }

    pub fn total_minutes(&self) -> u64 {
        self.videos
            .iter()
            .map(|video| u64::from(video.duration_minutes))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[videos]]
id = "fb-monday-service-2025-12-08"
title = "Monday Service"
category = "sermon"
url = "https://www.facebook.com/plugins/video.php?href=x"
date = "8th December 2025"

[[videos]]
id = "podcast-1"
title = "Podcast"
category = "podcast"
url = "/videos/podcast-1.mp4"
date = "March 15, 2024"
title_localized = { fr = "Podcast", yo = "Pọ́díkàsì" }
"#;

    #[test]
    fn loads_and_indexes_entries() {
        let catalog = Catalog::from_toml_str(SAMPLE, Path::new("inline")).unwrap();
        assert_eq!(catalog.len(), 2);
        let podcast = catalog.get("podcast-1").unwrap();
        assert_eq!(podcast.duration_minutes, 45);
        assert_eq!(
            podcast.title_in(crate::i18n::LanguageCode::Yo),
            "Pọ́díkàsì"
        );
        assert_eq!(catalog.by_category(VideoCategory::Sermon).count(), 1);
        assert_eq!(catalog.total_minutes(), 135);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let videos = vec![
            VideoRecord::new("a", "One", VideoCategory::Sermon, "/a.mp4"),
            VideoRecord::new("a", "Two", VideoCategory::Praise, "/b.mp4"),
        ];
        assert!(matches!(
            Catalog::new(videos),
            Err(CatalogError::DuplicateId(id)) if id == "a"
        ));
    }

    #[test]
    fn rejects_missing_url_and_id() {
        let videos = vec![VideoRecord::new("a", "One", VideoCategory::Sermon, " ")];
        assert!(matches!(Catalog::new(videos), Err(CatalogError::EmptyUrl(_))));
        let videos = vec![VideoRecord::new("", "One", VideoCategory::Sermon, "/a.mp4")];
        assert!(matches!(
            Catalog::new(videos),
            Err(CatalogError::EmptyId { index: 0 })
        ));
    }

    #[test]
    fn rejects_durations_longer_than_a_week() {
        let videos = vec![
            VideoRecord::new("a", "One", VideoCategory::Sermon, "/a.mp4").with_duration(3_000_000_000),
        ];
        assert!(matches!(
            Catalog::new(videos),
            Err(CatalogError::DurationOutOfRange { id, minutes: 3_000_000_000, .. }) if id == "a"
        ));

        let content = "[[videos]]\nid = \"x\"\ntitle = \"X\"\ncategory = \"sermon\"\nurl = \"/x.mp4\"\nduration_minutes = 10081\n";
        assert!(matches!(
            Catalog::from_toml_str(content, Path::new("inline")),
            Err(CatalogError::DurationOutOfRange { minutes: 10081, .. })
        ));
    }

    #[test]
    fn unknown_category_fails_to_parse() {
        let content = "[[videos]]\nid = \"x\"\ntitle = \"X\"\ncategory = \"news\"\nurl = \"/x.mp4\"\n";
        assert!(matches!(
            Catalog::from_toml_str(content, Path::new("inline")),
            Err(CatalogError::Parse { .. })
        ));
    }
}
