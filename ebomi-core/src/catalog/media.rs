use serde::Serialize;
use url::Url;

const DIRECT_EXTENSIONS: &[&str] = &["mp4", "m4v", "webm", "mov", "m3u8", "mpd"];

/// How a catalog url is played back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaSource {
    /// File or stream the player drives itself; its playhead is observable.
    Direct { url: String },
    YouTube { video_id: String },
    FacebookPlugin { url: String },
    OtherEmbed { url: String },
}

impl MediaSource {
    pub fn classify(raw: &str) -> Self {
        let raw = raw.trim();
        let Ok(parsed) = Url::parse(raw) else {
            // Site-relative paths such as "/ebomitvintro.mp4".
            return MediaSource::Direct {
                url: raw.to_string(),
            };
        };
        let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
        if let Some(video_id) = youtube_video_id(&parsed, &host) {
            return MediaSource::YouTube { video_id };
        }
        if host.ends_with("facebook.com") {
            return MediaSource::FacebookPlugin {
                url: raw.to_string(),
            };
        }
        let is_direct = parsed
            .path()
            .rsplit('.')
            .next()
            .map(|ext| DIRECT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_direct {
            MediaSource::Direct {
                url: raw.to_string(),
            }
        } else {
            MediaSource::OtherEmbed {
                url: raw.to_string(),
            }
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, MediaSource::Direct { .. })
    }

    /// Url handed to the player. Without analytics, YouTube is served from
    /// the no-cookie domain.
    pub fn player_url(&self, analytics_enabled: bool) -> String {
        match self {
            MediaSource::Direct { url }
            | MediaSource::FacebookPlugin { url }
            | MediaSource::OtherEmbed { url } => url.clone(),
            MediaSource::YouTube { video_id } => {
                let host = if analytics_enabled {
                    "www.youtube.com"
                } else {
                    "www.youtube-nocookie.com"
                };
                format!(
                    "https://{host}/embed/{video_id}?autoplay=0&controls=1&rel=0&modestbranding=1&playsinline=1&fs=0"
                )
            }
        }
    }
}

fn youtube_video_id(url: &Url, host: &str) -> Option<String> {
    let id = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if host.ends_with("youtube.com") || host.ends_with("youtube-nocookie.com") {
        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("embed") | Some("live") | Some("shorts") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };
    id.filter(|value| !value.is_empty())
}
