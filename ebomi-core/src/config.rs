use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EbomiConfig {
    pub site: SiteSection,
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub status: StatusSection,
    #[serde(default)]
    pub playback: PlaybackSection,
    #[serde(default)]
    pub providers: ProvidersSection,
    #[serde(default)]
    pub live_events: Vec<LiveEventEntry>,
    #[serde(default)]
    pub i18n: I18nSection,
}

impl EbomiConfig {
    pub fn resolve_path<P: AsRef<Path>>(&self, candidate: P) -> PathBuf {
        let path = candidate.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.paths.base_dir).join(path)
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.resolve_path(&self.paths.catalog)
    }

    pub fn storage_path(&self) -> PathBuf {
        self.resolve_path(&self.paths.storage)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteSection {
    pub name: String,
    /// Offset of the channel's broadcast clock, e.g. `+01:00` for Jos.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl SiteSection {
    pub fn time_zone(&self) -> Result<FixedOffset> {
        self.utc_offset
            .parse::<FixedOffset>()
            .map_err(|err| ConfigError::Invalid {
                field: "site.utc_offset",
                reason: format!("{}: {err}", self.utc_offset),
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
    #[serde(default = "default_catalog_path")]
    pub catalog: String,
    #[serde(default = "default_storage_path")]
    pub storage: String,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            catalog: default_catalog_path(),
            storage: default_storage_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMode {
    /// Poll a remote stream-status endpoint.
    Endpoint,
    /// Check the live providers directly from this process.
    Providers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusSection {
    #[serde(default = "default_status_mode")]
    pub mode: StatusMode,
    #[serde(default = "default_status_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl StatusSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }
}

impl Default for StatusSection {
    fn default() -> Self {
        Self {
            mode: default_status_mode(),
            endpoint: default_status_endpoint(),
            poll_interval_seconds: default_poll_interval(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackSection {
    #[serde(default = "default_intro_asset")]
    pub intro_asset: String,
    /// Length of the bumper; only used when no real player reports its end.
    #[serde(default = "default_intro_duration")]
    pub intro_duration_seconds: u64,
    #[serde(default)]
    pub skip_intro: bool,
    #[serde(default = "default_max_player_failures")]
    pub max_player_failures: u32,
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval_seconds: u64,
    #[serde(default = "default_checkpoint_freshness")]
    pub checkpoint_freshness_hours: i64,
    #[serde(default)]
    pub analytics_enabled: bool,
}

impl PlaybackSection {
    /// How long a saved position stays resumable; must be a positive number of hours.
    pub fn checkpoint_freshness(&self) -> Result<chrono::Duration> {
        chrono::Duration::try_hours(self.checkpoint_freshness_hours)
            .filter(|freshness| *freshness > chrono::Duration::zero())
            .ok_or_else(|| ConfigError::Invalid {
                field: "playback.checkpoint_freshness_hours",
                reason: format!(
                    "{} is not a positive number of hours",
                    self.checkpoint_freshness_hours
                ),
            })
    }
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self {
            intro_asset: default_intro_asset(),
            intro_duration_seconds: default_intro_duration(),
            skip_intro: false,
            max_player_failures: default_max_player_failures(),
            checkpoint_interval_seconds: default_checkpoint_interval(),
            checkpoint_freshness_hours: default_checkpoint_freshness(),
            analytics_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersSection {
    #[serde(default)]
    pub facebook: FacebookSection,
    #[serde(default)]
    pub youtube: YouTubeSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacebookSection {
    #[serde(default)]
    pub page_id: String,
    #[serde(default)]
    pub video_id: Option<String>,
    /// Manual switch flipped by the media team while a Facebook broadcast runs.
    #[serde(default)]
    pub live: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeSection {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_youtube_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub live: bool,
}

impl Default for YouTubeSection {
    fn default() -> Self {
        Self {
            channel_id: String::new(),
            api_key: None,
            api_base: default_youtube_api_base(),
            video_id: None,
            live: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveEventEntry {
    pub id: String,
    pub title: String,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct I18nSection {
    #[serde(default = "default_fallback_language")]
    pub fallback_language: String,
}

impl Default for I18nSection {
    fn default() -> Self {
        Self {
            fallback_language: default_fallback_language(),
        }
    }
}

fn default_utc_offset() -> String {
    "+01:00".to_string()
}

fn default_base_dir() -> String {
    ".".to_string()
}

fn default_catalog_path() -> String {
    "configs/catalog.toml".to_string()
}

fn default_storage_path() -> String {
    "data/preferences.sqlite".to_string()
}

fn default_status_mode() -> StatusMode {
    StatusMode::Endpoint
}

fn default_status_endpoint() -> String {
    "http://127.0.0.1:3000/api/stream-status".to_string()
}

fn default_poll_interval() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    10
}

fn default_intro_asset() -> String {
    "/ebomitvintro.mp4".to_string()
}

fn default_intro_duration() -> u64 {
    12
}

fn default_max_player_failures() -> u32 {
    3
}

fn default_checkpoint_interval() -> u64 {
    5
}

fn default_checkpoint_freshness() -> i64 {
    24
}

fn default_youtube_api_base() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_fallback_language() -> String {
    "en".to_string()
}

pub fn load_ebomi_config<P: AsRef<Path>>(path: P) -> Result<EbomiConfig> {
    load_toml(path)
}

pub(crate) fn load_toml<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}
