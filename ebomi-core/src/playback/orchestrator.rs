use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::status::{LivePoller, PollOutcome, StatusSource};
use crate::storage::PreferenceStore;

use super::checkpoint::PlaybackCheckpoint;
use super::error::{PlaybackError, PlaybackResult};
use super::machine::{PlaybackEvent, PlaybackMachine, PlaybackState, PlayerEvent};

/// Wall-clock source for schedule lookups.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall time pinned to `start` and advanced by the tokio clock, so paused
/// runtimes and simulations see a consistent schedule.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredClock {
    start: DateTime<Utc>,
    anchor: Instant,
}

impl AnchoredClock {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            anchor: Instant::now(),
        }
    }
}

impl Clock for AnchoredClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.anchor.elapsed()).unwrap_or(chrono::Duration::zero());
        self.start + elapsed
    }
}

/// Whatever puts the state on screen.
pub trait PlaybackSink: Send {
    fn show(&mut self, state: &PlaybackState);

    /// Playhead of the directly played video, when known.
    fn position_seconds(&mut self) -> Option<f64> {
        None
    }
}

#[derive(Debug)]
enum Command {
    Player(PlayerEvent),
    Shutdown,
}

/// Cloneable handle used by the player to report events and by the owner to
/// stop the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl OrchestratorHandle {
    pub fn send(&self, event: PlayerEvent) -> PlaybackResult<()> {
        self.commands
            .send(Command::Player(event))
            .map_err(|_| PlaybackError::ChannelClosed)
    }

    pub fn intro_finished(&self) -> PlaybackResult<()> {
        self.send(PlayerEvent::IntroFinished)
    }

    pub fn intro_failed(&self) -> PlaybackResult<()> {
        self.send(PlayerEvent::IntroFailed)
    }

    pub fn player_error(&self, reason: impl Into<String>) -> PlaybackResult<()> {
        self.send(PlayerEvent::PlayerError(reason.into()))
    }

    pub fn content_ended(&self) -> PlaybackResult<()> {
        self.send(PlayerEvent::ContentEnded)
    }

    pub fn retry(&self) -> PlaybackResult<()> {
        self.send(PlayerEvent::RetryRequested)
    }

    pub fn connectivity_lost(&self) -> PlaybackResult<()> {
        self.send(PlayerEvent::ConnectivityLost)
    }

    pub fn connectivity_restored(&self) -> PlaybackResult<()> {
        self.send(PlayerEvent::ConnectivityRestored)
    }

    pub fn shutdown(&self) -> PlaybackResult<()> {
        self.commands
            .send(Command::Shutdown)
            .map_err(|_| PlaybackError::ChannelClosed)
    }
}

/// Async driver around [`PlaybackMachine`]. Poll outcomes, the programme
/// boundary, player events and checkpoint ticks all go through one select
/// loop, so transitions never race.
pub struct PlaybackOrchestrator<S: PlaybackSink> {
    machine: PlaybackMachine,
    source: Arc<dyn StatusSource>,
    store: Arc<dyn PreferenceStore>,
    sink: S,
    clock: Arc<dyn Clock>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl<S: PlaybackSink> PlaybackOrchestrator<S> {
    pub fn new(
        machine: PlaybackMachine,
        source: Arc<dyn StatusSource>,
        store: Arc<dyn PreferenceStore>,
        sink: S,
    ) -> (Self, OrchestratorHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            machine,
            source,
            store,
            sink,
            clock: Arc::new(SystemClock),
            commands: rx,
        };
        (orchestrator, OrchestratorHandle { commands: tx })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &PlaybackState {
        self.machine.state()
    }

    /// Runs until shutdown is requested or every handle is dropped, then
    /// returns the final state. The poller task is aborted on the way out.
    pub async fn run(mut self) -> PlaybackState {
        let checkpoint = match self.store.load_checkpoint() {
            Ok(checkpoint) => checkpoint,
            Err(err) => {
                warn!(target: "playback", error = %err, "could not read playback checkpoint");
                None
            }
        };
        self.machine.offer_checkpoint(checkpoint);

        let settings = self.machine.settings().clone();
        let (poll_tx, mut poll_rx) = mpsc::channel::<PollOutcome>(8);
        let poller = LivePoller::new(self.source.clone(), settings.poll_interval).spawn(poll_tx);
        let mut checkpoint_tick = interval(settings.checkpoint_interval);
        checkpoint_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(target: "playback", "orchestrator started");
        self.sink.show(self.machine.state());

        loop {
            let boundary = self.boundary_deadline();
            let checkpointing = self.machine.state().checkpoint_target().is_some();
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    None | Some(Command::Shutdown) => break,
                    Some(Command::Player(event)) => self.on_player(event, &poller),
                },
                outcome = poll_rx.recv() => match outcome {
                    Some(outcome) => self.apply(PlaybackEvent::Poll(outcome)),
                    None => {
                        warn!(target: "playback", "status poller stopped unexpectedly");
                        break;
                    }
                },
                _ = wait_for(boundary) => self.apply(PlaybackEvent::BoundaryReached),
                _ = checkpoint_tick.tick(), if checkpointing => self.save_checkpoint(),
            }
        }

        poller.abort();
        info!(target: "playback", state = self.machine.state().label(), "orchestrator stopped");
        self.machine.into_state()
    }

    fn on_player(&mut self, event: PlayerEvent, poller: &crate::status::PollerHandle) {
        match event {
            PlayerEvent::ConnectivityRestored => {
                debug!(target: "playback", "connectivity restored, polling now");
                poller.poll_now();
                self.apply(PlaybackEvent::Player(PlayerEvent::ConnectivityRestored));
            }
            PlayerEvent::RetryRequested => {
                poller.poll_now();
                self.apply(PlaybackEvent::Player(PlayerEvent::RetryRequested));
            }
            PlayerEvent::ContentEnded => {
                if self.machine.state().checkpoint_target().is_some() {
                    if let Err(err) = self.store.clear_checkpoint() {
                        warn!(target: "playback", error = %err, "could not clear playback checkpoint");
                    }
                }
                self.apply(PlaybackEvent::Player(PlayerEvent::ContentEnded));
            }
            other => self.apply(PlaybackEvent::Player(other)),
        }
    }

    fn apply(&mut self, event: PlaybackEvent) {
        let now = self.clock.now();
        if self.machine.handle(event, now) {
            self.sink.show(self.machine.state());
        }
    }

    fn boundary_deadline(&self) -> Option<Instant> {
        let boundary = self.machine.state().boundary()?;
        let remaining = (boundary - self.clock.now()).to_std().unwrap_or_default();
        Some(Instant::now() + remaining)
    }

    fn save_checkpoint(&mut self) {
        let Some(content_id) = self.machine.state().checkpoint_target().map(str::to_string) else {
            return;
        };
        let Some(position) = self.sink.position_seconds() else {
            return;
        };
        let checkpoint = PlaybackCheckpoint::new(content_id, position, self.clock.now());
        match self.store.save_checkpoint(&checkpoint) {
            Ok(()) => debug!(
                target: "playback",
                content_id = %checkpoint.content_id,
                position = checkpoint.position_seconds,
                "checkpoint saved"
            ),
            Err(err) => warn!(target: "playback", error = %err, "could not save playback checkpoint"),
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
