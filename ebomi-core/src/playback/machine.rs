use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::MediaSource;
use crate::config::EbomiConfig;
use crate::error::Result;
use crate::schedule::{ProgramGuide, ScheduleSlot};
use crate::status::{LiveFeed, PollOutcome};

use super::checkpoint::PlaybackCheckpoint;

/// Why the intro bumper is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntroReason {
    Startup,
    ProgramBoundary,
    LiveEnded,
    PlayerError,
    ContentEnded,
    Retry,
    /// Viewer lost connectivity; the bumper loops until it comes back.
    Offline,
    Reconnected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PlaybackState {
    AwaitingStatus,
    ShowingIntro {
        reason: IntroReason,
    },
    ShowingLive {
        feed: LiveFeed,
    },
    ShowingScheduled {
        slot: ScheduleSlot,
        media: MediaSource,
        boundary: DateTime<Utc>,
        resume_at: Option<f64>,
    },
    NoProgramme,
    ContentUnavailable {
        slot: ScheduleSlot,
        boundary: DateTime<Utc>,
    },
}

impl PlaybackState {
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackState::AwaitingStatus => "awaiting_status",
            PlaybackState::ShowingIntro { .. } => "showing_intro",
            PlaybackState::ShowingLive { .. } => "showing_live",
            PlaybackState::ShowingScheduled { .. } => "showing_scheduled",
            PlaybackState::NoProgramme => "no_programme",
            PlaybackState::ContentUnavailable { .. } => "content_unavailable",
        }
    }

    /// Instant at which the schedule must be re-evaluated, if any.
    pub fn boundary(&self) -> Option<DateTime<Utc>> {
        match self {
            PlaybackState::ShowingScheduled { boundary, .. }
            | PlaybackState::ContentUnavailable { boundary, .. } => Some(*boundary),
            _ => None,
        }
    }

    /// Video whose playhead should be checkpointed.
    pub fn checkpoint_target(&self) -> Option<&str> {
        match self {
            PlaybackState::ShowingScheduled { slot, media, .. } if media.is_direct() => {
                Some(slot.video_id.as_str())
            }
            _ => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, PlaybackState::ShowingLive { .. })
    }

    /// Url the player should load for this state.
    pub fn player_url(&self, settings: &PlaybackSettings) -> Option<String> {
        match self {
            PlaybackState::ShowingIntro { .. } => Some(settings.intro_asset.clone()),
            PlaybackState::ShowingLive { feed } => Some(feed.embed_url.clone()),
            PlaybackState::ShowingScheduled { media, .. } => {
                Some(media.player_url(settings.analytics_enabled))
            }
            _ => None,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::ShowingIntro { reason } => write!(f, "intro ({reason:?})"),
            PlaybackState::ShowingLive { feed } => write!(f, "live on {}", feed.provider),
            PlaybackState::ShowingScheduled { slot, .. } => {
                write!(f, "scheduled {} until {}", slot.slot_id, slot.end_time)
            }
            PlaybackState::ContentUnavailable { slot, .. } => {
                write!(f, "content unavailable for {}", slot.slot_id)
            }
            other => f.write_str(other.label()),
        }
    }
}

/// Signals reported by whatever renders the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    IntroFinished,
    IntroFailed,
    PlayerError(String),
    ContentEnded,
    RetryRequested,
    ConnectivityLost,
    ConnectivityRestored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Poll(PollOutcome),
    BoundaryReached,
    Player(PlayerEvent),
}

#[derive(Debug, Clone)]
pub struct PlaybackSettings {
    pub intro_asset: String,
    pub intro_duration: Duration,
    pub skip_intro: bool,
    pub max_player_failures: u32,
    pub checkpoint_interval: Duration,
    pub checkpoint_freshness: chrono::Duration,
    pub poll_interval: Duration,
    pub analytics_enabled: bool,
}

impl PlaybackSettings {
    pub fn from_config(config: &EbomiConfig) -> Result<Self> {
        let playback = &config.playback;
        Ok(Self {
            intro_asset: playback.intro_asset.clone(),
            intro_duration: Duration::from_secs(playback.intro_duration_seconds),
            skip_intro: playback.skip_intro,
            max_player_failures: playback.max_player_failures.max(1),
            checkpoint_interval: Duration::from_secs(playback.checkpoint_interval_seconds.max(1)),
            checkpoint_freshness: playback.checkpoint_freshness()?,
            poll_interval: config.status.poll_interval(),
            analytics_enabled: playback.analytics_enabled,
        })
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            intro_asset: "/ebomitvintro.mp4".to_string(),
            intro_duration: Duration::from_secs(12),
            skip_intro: false,
            max_player_failures: 3,
            checkpoint_interval: Duration::from_secs(5),
            checkpoint_freshness: chrono::Duration::hours(24),
            poll_interval: Duration::from_secs(30),
            analytics_enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SlotKey {
    video_id: String,
    start_time: DateTime<Utc>,
}

impl SlotKey {
    fn of(slot: &ScheduleSlot) -> Self {
        Self {
            video_id: slot.video_id.clone(),
            start_time: slot.start_time,
        }
    }
}

/// Pure transition core. Every event is judged against the state at the
/// moment it is handled; events that no longer apply are dropped.
#[derive(Debug)]
pub struct PlaybackMachine {
    guide: ProgramGuide,
    settings: PlaybackSettings,
    state: PlaybackState,
    failing: Option<(SlotKey, u32)>,
    suppressed_feed: Option<LiveFeed>,
    finished: Option<ScheduleSlot>,
    checkpoint: Option<PlaybackCheckpoint>,
}

impl PlaybackMachine {
    pub fn new(guide: ProgramGuide, settings: PlaybackSettings) -> Self {
        Self {
            guide,
            settings,
            state: PlaybackState::AwaitingStatus,
            failing: None,
            suppressed_feed: None,
            finished: None,
            checkpoint: None,
        }
    }

    /// Resume record offered to the first matching scheduled video.
    pub fn offer_checkpoint(&mut self, checkpoint: Option<PlaybackCheckpoint>) {
        self.checkpoint = checkpoint;
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn guide(&self) -> &ProgramGuide {
        &self.guide
    }

    pub fn into_state(self) -> PlaybackState {
        self.state
    }

    /// Applies one event. Returns true when the state should be presented
    /// again, which includes restarting the looping offline bumper.
    pub fn handle(&mut self, event: PlaybackEvent, now: DateTime<Utc>) -> bool {
        let before = self.state.clone();
        let repaint = match event {
            PlaybackEvent::Poll(outcome) => self.on_poll(outcome, now),
            PlaybackEvent::BoundaryReached => self.on_boundary(now),
            PlaybackEvent::Player(player) => self.on_player(player, now),
        };
        if repaint {
            info!(
                target: "playback",
                from = before.label(),
                to = self.state.label(),
                state = %self.state,
                "playback transition"
            );
        }
        repaint
    }

    fn on_poll(&mut self, outcome: PollOutcome, now: DateTime<Utc>) -> bool {
        match outcome {
            PollOutcome::Live(feed) if self.suppressed_feed.as_ref() == Some(&feed) => {
                debug!(target: "playback", provider = %feed.provider, "ignoring suppressed live feed");
                self.on_not_live(now)
            }
            PollOutcome::Live(feed) => {
                self.suppressed_feed = None;
                if matches!(&self.state, PlaybackState::ShowingLive { feed: current } if *current == feed) {
                    return false;
                }
                self.failing = None;
                self.set(PlaybackState::ShowingLive { feed })
            }
            PollOutcome::Offline => {
                self.suppressed_feed = None;
                self.on_not_live(now)
            }
            PollOutcome::Degraded(reason) => {
                debug!(target: "playback", %reason, "degraded status treated as not live");
                self.on_not_live(now)
            }
            PollOutcome::Unreachable(reason) => {
                // A dead status endpoint says nothing about the viewer's own link.
                if self.is_offline() {
                    return false;
                }
                debug!(target: "playback", %reason, "status unreachable, keeping pre-recorded programming");
                self.on_not_live(now)
            }
        }
    }

    fn on_not_live(&mut self, now: DateTime<Utc>) -> bool {
        match &self.state {
            PlaybackState::AwaitingStatus => self.enter_intro(IntroReason::Startup, now),
            PlaybackState::ShowingLive { .. } => self.enter_intro(IntroReason::LiveEnded, now),
            PlaybackState::ShowingIntro {
                reason: IntroReason::Offline,
            } => self.enter_intro(IntroReason::Reconnected, now),
            _ => false,
        }
    }

    fn on_boundary(&mut self, now: DateTime<Utc>) -> bool {
        match self.state.boundary() {
            Some(boundary) if boundary <= now => {
                if matches!(self.state, PlaybackState::ContentUnavailable { .. }) {
                    self.failing = None;
                }
                self.enter_intro(IntroReason::ProgramBoundary, now)
            }
            _ => false,
        }
    }

    fn on_player(&mut self, event: PlayerEvent, now: DateTime<Utc>) -> bool {
        match event {
            PlayerEvent::IntroFinished => match &self.state {
                PlaybackState::ShowingIntro {
                    reason: IntroReason::Offline,
                } => true,
                PlaybackState::ShowingIntro { .. } => self.resolve_scheduled(now),
                _ => false,
            },
            PlayerEvent::IntroFailed => match &self.state {
                PlaybackState::ShowingIntro {
                    reason: IntroReason::Offline,
                } => false,
                PlaybackState::ShowingIntro { reason } => {
                    debug!(target: "playback", ?reason, "intro failed to load, passing through");
                    self.resolve_scheduled(now)
                }
                _ => false,
            },
            PlayerEvent::PlayerError(reason) => match &self.state {
                PlaybackState::ShowingScheduled { slot, .. } => {
                    let key = SlotKey::of(slot);
                    let count = match &self.failing {
                        Some((failing, count)) if *failing == key => count + 1,
                        _ => 1,
                    };
                    warn!(
                        target: "playback",
                        slot = %slot.slot_id,
                        failures = count,
                        %reason,
                        "scheduled content failed to play"
                    );
                    self.failing = Some((key, count));
                    self.enter_intro(IntroReason::PlayerError, now)
                }
                PlaybackState::ShowingLive { feed } => {
                    warn!(target: "playback", provider = %feed.provider, %reason, "live embed failed to play");
                    self.suppressed_feed = Some(feed.clone());
                    self.enter_intro(IntroReason::PlayerError, now)
                }
                _ => false,
            },
            PlayerEvent::ContentEnded => match &self.state {
                PlaybackState::ShowingScheduled { slot, .. } => {
                    self.finished = Some(slot.clone());
                    self.enter_intro(IntroReason::ContentEnded, now)
                }
                _ => false,
            },
            PlayerEvent::RetryRequested => {
                self.failing = None;
                self.suppressed_feed = None;
                match self.state {
                    PlaybackState::ContentUnavailable { .. } | PlaybackState::NoProgramme => {
                        self.enter_intro(IntroReason::Retry, now)
                    }
                    _ => false,
                }
            }
            PlayerEvent::ConnectivityLost => {
                if self.is_offline() {
                    return false;
                }
                warn!(target: "playback", "viewer offline, looping intro");
                self.enter_intro(IntroReason::Offline, now)
            }
            PlayerEvent::ConnectivityRestored => {
                if !self.is_offline() {
                    return false;
                }
                self.enter_intro(IntroReason::Reconnected, now)
            }
        }
    }

    fn is_offline(&self) -> bool {
        matches!(
            self.state,
            PlaybackState::ShowingIntro {
                reason: IntroReason::Offline
            }
        )
    }

    fn enter_intro(&mut self, reason: IntroReason, now: DateTime<Utc>) -> bool {
        if self.settings.skip_intro && reason != IntroReason::Offline {
            return self.resolve_scheduled(now);
        }
        self.set(PlaybackState::ShowingIntro { reason })
    }

    /// Current programme, else the next one (wrapping), else the empty state.
    fn resolve_scheduled(&mut self, now: DateTime<Utc>) -> bool {
        let finished = self.finished.take();
        let Some(slot) = self.guide.resolve(now, finished.as_ref()) else {
            return self.set(PlaybackState::NoProgramme);
        };
        let exhausted = matches!(
            &self.failing,
            Some((key, count)) if *key == SlotKey::of(&slot) && *count >= self.settings.max_player_failures
        );
        if exhausted {
            let boundary = slot.end_time;
            return self.set(PlaybackState::ContentUnavailable { slot, boundary });
        }
        let Some(media) = self.guide.catalog().get(&slot.video_id).map(|video| video.media()) else {
            return self.set(PlaybackState::NoProgramme);
        };
        let resume_at = if media.is_direct() {
            self.take_resume_position(&slot.video_id, now)
        } else {
            None
        };
        let boundary = slot.end_time;
        self.set(PlaybackState::ShowingScheduled {
            slot,
            media,
            boundary,
            resume_at,
        })
    }

    fn take_resume_position(&mut self, video_id: &str, now: DateTime<Utc>) -> Option<f64> {
        let position = self.checkpoint.as_ref().and_then(|checkpoint| {
            checkpoint.resume_position(video_id, now, self.settings.checkpoint_freshness)
        });
        if position.is_some() {
            self.checkpoint = None;
        }
        position
    }

    fn set(&mut self, state: PlaybackState) -> bool {
        self.state = state;
        true
    }
}
