use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Storage key of the resume record.
pub const CHECKPOINT_KEY: &str = "ebomi_tv_playback_state";

/// Last known playhead of a directly playable video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackCheckpoint {
    pub content_id: String,
    pub position_seconds: f64,
    pub saved_at_epoch_ms: i64,
}

impl PlaybackCheckpoint {
    pub fn new(content_id: impl Into<String>, position_seconds: f64, saved_at: DateTime<Utc>) -> Self {
        Self {
            content_id: content_id.into(),
            position_seconds: position_seconds.max(0.0),
            saved_at_epoch_ms: saved_at.timestamp_millis(),
        }
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.saved_at_epoch_ms)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now.timestamp_millis() - self.saved_at_epoch_ms < max_age.num_milliseconds()
    }

    /// Resume position for `content_id`, if this record applies to it.
    pub fn resume_position(&self, content_id: &str, now: DateTime<Utc>, max_age: Duration) -> Option<f64> {
        (self.content_id == content_id && self.is_fresh(now, max_age) && self.position_seconds > 0.0)
            .then_some(self.position_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn freshness_window_is_exclusive() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let window = Duration::hours(24);
        let stale = PlaybackCheckpoint::new("x", 120.0, now - Duration::hours(25));
        let fresh = PlaybackCheckpoint::new("x", 120.0, now - Duration::hours(1));
        let edge = PlaybackCheckpoint::new("x", 120.0, now - window);
        assert_eq!(stale.resume_position("x", now, window), None);
        assert_eq!(fresh.resume_position("x", now, window), Some(120.0));
        assert_eq!(fresh.resume_position("y", now, window), None);
        assert!(!edge.is_fresh(now, window));
    }

    #[test]
    fn wire_format_uses_camel_case() {
        let checkpoint: PlaybackCheckpoint = serde_json::from_str(
            r#"{"contentId":"fb-1","positionSeconds":42.5,"savedAtEpochMs":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(checkpoint.content_id, "fb-1");
        assert_eq!(checkpoint.position_seconds, 42.5);
        assert!(checkpoint.saved_at().is_some());
    }
}
