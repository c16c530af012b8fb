use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::{FacebookSection, LiveEventEntry, ProvidersSection, YouTubeSection};

use super::error::{StatusError, StatusResult};
use super::models::{LiveFeed, LiveProvider, StreamStatus};
use super::source::StatusSource;

/// One provider's answer to "are you live".
#[async_trait]
pub trait LiveCheck: Send + Sync {
    fn provider(&self) -> LiveProvider;

    async fn check(&self) -> StatusResult<Option<LiveFeed>>;
}

/// Facebook has no public live lookup without a page token, so it is driven
/// by the operator toggle.
#[derive(Debug, Clone)]
pub struct FacebookLiveCheck {
    page_id: String,
    video_id: Option<String>,
    live: bool,
}

impl FacebookLiveCheck {
    pub fn from_config(section: &FacebookSection) -> Self {
        Self {
            page_id: section.page_id.clone(),
            video_id: section.video_id.clone(),
            live: section.live,
        }
    }

    fn page_url(&self) -> String {
        match &self.video_id {
            Some(video_id) => format!("https://www.facebook.com/{}/videos/{video_id}", self.page_id),
            None => format!("https://www.facebook.com/{}/live", self.page_id),
        }
    }
}

#[async_trait]
impl LiveCheck for FacebookLiveCheck {
    fn provider(&self) -> LiveProvider {
        LiveProvider::Facebook
    }

    async fn check(&self) -> StatusResult<Option<LiveFeed>> {
        if self.live && !self.page_id.is_empty() {
            Ok(Some(LiveFeed::facebook(self.page_url())))
        } else {
            Ok(None)
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    video_id: Option<String>,
}

/// YouTube Data API live search, with the operator toggle as a fallback.
#[derive(Debug, Clone)]
pub struct YouTubeLiveCheck {
    client: reqwest::Client,
    api_base: String,
    channel_id: String,
    api_key: Option<String>,
    toggle_live: bool,
    toggle_video_id: Option<String>,
}

impl YouTubeLiveCheck {
    pub fn from_config(section: &YouTubeSection, timeout: Duration) -> StatusResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: section.api_base.trim_end_matches('/').to_string(),
            channel_id: section.channel_id.clone(),
            api_key: section.api_key.clone().filter(|key| !key.is_empty()),
            toggle_live: section.live,
            toggle_video_id: section.video_id.clone().filter(|id| !id.is_empty()),
        })
    }

    fn search_url(&self, api_key: &str) -> StatusResult<Url> {
        let raw = format!("{}/search", self.api_base);
        let mut url = Url::parse(&raw).map_err(|err| StatusError::InvalidEndpoint {
            endpoint: raw.clone(),
            reason: err.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("part", "snippet")
            .append_pair("channelId", &self.channel_id)
            .append_pair("eventType", "live")
            .append_pair("type", "video")
            .append_pair("key", api_key);
        Ok(url)
    }

    async fn search_live(&self, api_key: &str) -> StatusResult<Option<String>> {
        let response = self.client.get(self.search_url(api_key)?).send().await?;
        if !response.status().is_success() {
            return Err(StatusError::Provider {
                provider: LiveProvider::YouTube,
                reason: format!("search answered {}", response.status()),
            });
        }
        let body: SearchResponse = serde_json::from_str(&response.text().await?)?;
        Ok(body
            .items
            .into_iter()
            .find_map(|item| item.id.video_id.filter(|id| !id.is_empty())))
    }
}

#[async_trait]
impl LiveCheck for YouTubeLiveCheck {
    fn provider(&self) -> LiveProvider {
        LiveProvider::YouTube
    }

    async fn check(&self) -> StatusResult<Option<LiveFeed>> {
        if let (false, Some(api_key)) = (self.channel_id.is_empty(), self.api_key.as_deref()) {
            match self.search_live(api_key).await {
                Ok(Some(video_id)) => return Ok(Some(LiveFeed::youtube(video_id))),
                Ok(None) => {}
                Err(err) => warn!(target: "status.providers", error = %err, "youtube live search failed"),
            }
        }
        if self.toggle_live {
            if let Some(video_id) = &self.toggle_video_id {
                return Ok(Some(LiveFeed::youtube(video_id.clone())));
            }
        }
        Ok(None)
    }
}

/// Resolves status locally by asking providers in priority order.
pub struct ProviderChain {
    checks: Vec<Arc<dyn LiveCheck>>,
    live_events: Vec<LiveEventEntry>,
}

impl ProviderChain {
    pub fn new(checks: Vec<Arc<dyn LiveCheck>>, live_events: Vec<LiveEventEntry>) -> Self {
        Self {
            checks,
            live_events,
        }
    }

    /// Facebook first, then YouTube.
    pub fn from_config(
        providers: &ProvidersSection,
        live_events: &[LiveEventEntry],
        timeout: Duration,
    ) -> StatusResult<Self> {
        let checks: Vec<Arc<dyn LiveCheck>> = vec![
            Arc::new(FacebookLiveCheck::from_config(&providers.facebook)),
            Arc::new(YouTubeLiveCheck::from_config(&providers.youtube, timeout)?),
        ];
        Ok(Self::new(checks, live_events.to_vec()))
    }

    pub fn resolve_at(&self, feed: Option<LiveFeed>, now: DateTime<Utc>) -> StreamStatus {
        match feed {
            Some(feed) => StreamStatus::live(&feed),
            None => StreamStatus::prerecorded(
                next_live_event(&self.live_events, now).map(|event| event.scheduled_at),
            ),
        }
    }
}

#[async_trait]
impl StatusSource for ProviderChain {
    async fn fetch(&self) -> StatusResult<StreamStatus> {
        let mut found = None;
        for check in &self.checks {
            match check.check().await {
                Ok(Some(feed)) => {
                    found = Some(feed);
                    break;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        target: "status.providers",
                        provider = %check.provider(),
                        error = %err,
                        "provider check failed, treating as not live"
                    );
                }
            }
        }
        if let Some(feed) = &found {
            debug!(target: "status.providers", provider = %feed.provider, "live feed found");
        }
        Ok(self.resolve_at(found, Utc::now()))
    }
}

/// Earliest configured live event strictly after `now`.
pub fn next_live_event(events: &[LiveEventEntry], now: DateTime<Utc>) -> Option<&LiveEventEntry> {
    events
        .iter()
        .filter(|event| event.scheduled_at > now)
        .min_by_key(|event| event.scheduled_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{PollOutcome, StatusSourceKind};
    use chrono::TimeZone;

    struct Fixed(LiveProvider, StatusResult<Option<LiveFeed>>);

    #[async_trait]
    impl LiveCheck for Fixed {
        fn provider(&self) -> LiveProvider {
            self.0
        }

        async fn check(&self) -> StatusResult<Option<LiveFeed>> {
            match &self.1 {
                Ok(feed) => Ok(feed.clone()),
                Err(_) => Err(StatusError::Provider {
                    provider: self.0,
                    reason: "boom".into(),
                }),
            }
        }
    }

    fn event(id: &str, at: DateTime<Utc>) -> LiveEventEntry {
        LiveEventEntry {
            id: id.into(),
            title: id.into(),
            scheduled_at: at,
            description: None,
        }
    }

    #[tokio::test]
    async fn facebook_wins_ties() {
        let facebook = LiveFeed::facebook("https://www.facebook.com/ebomi/live");
        let chain = ProviderChain::new(
            vec![
                Arc::new(Fixed(LiveProvider::Facebook, Ok(Some(facebook.clone())))),
                Arc::new(Fixed(LiveProvider::YouTube, Ok(Some(LiveFeed::youtube("yt"))))),
            ],
            Vec::new(),
        );
        assert_eq!(chain.poll().await, PollOutcome::Live(facebook));
    }

    #[tokio::test]
    async fn provider_error_counts_as_not_live() {
        let chain = ProviderChain::new(
            vec![
                Arc::new(Fixed(
                    LiveProvider::Facebook,
                    Err(StatusError::Provider {
                        provider: LiveProvider::Facebook,
                        reason: "boom".into(),
                    }),
                )),
                Arc::new(Fixed(LiveProvider::YouTube, Ok(Some(LiveFeed::youtube("yt"))))),
            ],
            Vec::new(),
        );
        assert_eq!(chain.poll().await, PollOutcome::Live(LiveFeed::youtube("yt")));
    }

    #[test]
    fn offline_status_carries_next_event() {
        let now = Utc.with_ymd_and_hms(2025, 3, 26, 12, 0, 0).unwrap();
        let sunday = Utc.with_ymd_and_hms(2025, 3, 30, 9, 0, 0).unwrap();
        let wednesday = Utc.with_ymd_and_hms(2025, 3, 26, 18, 0, 0).unwrap();
        let past = Utc.with_ymd_and_hms(2025, 3, 23, 9, 0, 0).unwrap();
        let chain = ProviderChain::new(
            Vec::new(),
            vec![event("sunday", sunday), event("wednesday", wednesday), event("old", past)],
        );
        let status = chain.resolve_at(None, now);
        assert_eq!(status.source, StatusSourceKind::Prerecorded);
        assert_eq!(status.next_live_at, Some(wednesday));
    }

    #[tokio::test]
    async fn youtube_toggle_without_api_key() {
        let section = YouTubeSection {
            channel_id: "UC123".into(),
            api_key: None,
            api_base: "https://www.googleapis.com/youtube/v3".into(),
            video_id: Some("manual".into()),
            live: true,
        };
        let check = YouTubeLiveCheck::from_config(&section, Duration::from_secs(1)).unwrap();
        assert_eq!(check.check().await.unwrap(), Some(LiveFeed::youtube("manual")));
        let url = check.search_url("k").unwrap();
        assert!(url.as_str().contains("eventType=live"));
        assert!(url.as_str().contains("channelId=UC123"));
    }
}
