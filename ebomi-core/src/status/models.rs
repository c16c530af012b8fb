use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiveProvider {
    #[serde(rename = "facebook")]
    Facebook,
    #[serde(rename = "youtube")]
    YouTube,
}

impl LiveProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiveProvider::Facebook => "facebook",
            LiveProvider::YouTube => "youtube",
        }
    }
}

impl fmt::Display for LiveProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live broadcast ready to embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveFeed {
    pub provider: LiveProvider,
    pub provider_stream_id: String,
    pub embed_url: String,
}

impl LiveFeed {
    pub fn youtube(video_id: impl Into<String>) -> Self {
        let video_id = video_id.into();
        Self {
            provider: LiveProvider::YouTube,
            embed_url: format!("https://www.youtube.com/embed/{video_id}?autoplay=1"),
            provider_stream_id: video_id,
        }
    }

    pub fn facebook(page_url: impl Into<String>) -> Self {
        let page_url = page_url.into();
        let encoded: String = url::form_urlencoded::byte_serialize(page_url.as_bytes()).collect();
        Self {
            provider: LiveProvider::Facebook,
            embed_url: format!(
                "https://www.facebook.com/plugins/video.php?href={encoded}&show_text=false&autoplay=true"
            ),
            provider_stream_id: page_url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusSourceKind {
    #[serde(rename = "facebook", alias = "providerA")]
    Facebook,
    #[serde(rename = "youtube", alias = "providerB")]
    YouTube,
    #[serde(rename = "prerecorded")]
    Prerecorded,
    #[default]
    #[serde(rename = "none")]
    None,
}

/// Body of the stream-status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStatus {
    pub is_live: bool,
    #[serde(default)]
    pub source: StatusSourceKind,
    #[serde(default, alias = "facebookUrl", alias = "youtubeUrl", skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_video_id: Option<String>,
    #[serde(default, alias = "nextLiveTime", skip_serializing_if = "Option::is_none")]
    pub next_live_at: Option<DateTime<Utc>>,
}

impl StreamStatus {
    pub fn live(feed: &LiveFeed) -> Self {
        let (source, youtube_video_id) = match feed.provider {
            LiveProvider::Facebook => (StatusSourceKind::Facebook, None),
            LiveProvider::YouTube => (
                StatusSourceKind::YouTube,
                Some(feed.provider_stream_id.clone()),
            ),
        };
        Self {
            is_live: true,
            source,
            embed_url: Some(feed.embed_url.clone()),
            youtube_video_id,
            next_live_at: None,
        }
    }

    pub fn prerecorded(next_live_at: Option<DateTime<Utc>>) -> Self {
        Self {
            is_live: false,
            source: StatusSourceKind::Prerecorded,
            embed_url: None,
            youtube_video_id: None,
            next_live_at,
        }
    }

    /// Reads the report into a poll outcome. A live flag without a usable
    /// provider or embed is not trusted.
    pub fn outcome(&self) -> PollOutcome {
        if !self.is_live {
            return PollOutcome::Offline;
        }
        match self.source {
            StatusSourceKind::YouTube => {
                let video_id = self
                    .youtube_video_id
                    .clone()
                    .or_else(|| self.embed_url.as_deref().and_then(youtube_id_from_url));
                match (video_id, self.embed_url.as_deref()) {
                    (Some(id), _) => PollOutcome::Live(LiveFeed::youtube(id)),
                    (None, Some(url)) => PollOutcome::Live(LiveFeed {
                        provider: LiveProvider::YouTube,
                        provider_stream_id: url.to_string(),
                        embed_url: url.to_string(),
                    }),
                    (None, None) => PollOutcome::Degraded("youtube live without a video".into()),
                }
            }
            StatusSourceKind::Facebook => match self.embed_url.as_deref() {
                Some(url) if url.contains("/plugins/video.php") => PollOutcome::Live(LiveFeed {
                    provider: LiveProvider::Facebook,
                    provider_stream_id: url.to_string(),
                    embed_url: url.to_string(),
                }),
                Some(url) => PollOutcome::Live(LiveFeed::facebook(url)),
                None => PollOutcome::Degraded("facebook live without a url".into()),
            },
            StatusSourceKind::Prerecorded | StatusSourceKind::None => {
                PollOutcome::Degraded("live flag without a provider".into())
            }
        }
    }
}

fn youtube_id_from_url(raw: &str) -> Option<String> {
    match crate::catalog::MediaSource::classify(raw) {
        crate::catalog::MediaSource::YouTube { video_id } => Some(video_id),
        _ => None,
    }
}

/// Result of one status poll as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Live(LiveFeed),
    Offline,
    /// Endpoint answered but the answer is unusable.
    Degraded(String),
    /// Endpoint could not be reached at all.
    Unreachable(String),
}

impl PollOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            PollOutcome::Live(_) => "live",
            PollOutcome::Offline => "offline",
            PollOutcome::Degraded(_) => "degraded",
            PollOutcome::Unreachable(_) => "unreachable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_endpoint_body_with_aliases() {
        let status: StreamStatus = serde_json::from_str(
            r#"{"isLive":true,"source":"providerB","youtubeUrl":"https://www.youtube.com/watch?v=live42"}"#,
        )
        .unwrap();
        assert_eq!(status.source, StatusSourceKind::YouTube);
        assert_eq!(status.outcome(), PollOutcome::Live(LiveFeed::youtube("live42")));

        let status: StreamStatus = serde_json::from_str(
            r#"{"isLive":false,"source":"prerecorded","nextLiveTime":"2024-03-24T09:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(status.outcome(), PollOutcome::Offline);
        assert!(status.next_live_at.is_some());
    }

    #[test]
    fn facebook_page_url_becomes_plugin_embed() {
        let status = StreamStatus {
            is_live: true,
            source: StatusSourceKind::Facebook,
            embed_url: Some("https://www.facebook.com/ebomi/live".into()),
            youtube_video_id: None,
            next_live_at: None,
        };
        let PollOutcome::Live(feed) = status.outcome() else {
            panic!("expected live outcome");
        };
        assert_eq!(feed.provider, LiveProvider::Facebook);
        assert!(feed
            .embed_url
            .starts_with("https://www.facebook.com/plugins/video.php?href=https%3A%2F%2Fwww.facebook.com%2Febomi%2Flive"));
    }

    #[test]
    fn live_without_provider_is_degraded() {
        let status: StreamStatus = serde_json::from_str(r#"{"isLive":true}"#).unwrap();
        assert!(matches!(status.outcome(), PollOutcome::Degraded(_)));
    }
}
