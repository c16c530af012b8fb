mod checkpoint;
mod error;
mod machine;
mod orchestrator;

pub use checkpoint::{PlaybackCheckpoint, CHECKPOINT_KEY};
pub use error::{PlaybackError, PlaybackResult};
pub use machine::{
    IntroReason, PlaybackEvent, PlaybackMachine, PlaybackSettings, PlaybackState, PlayerEvent,
};
pub use orchestrator::{
    AnchoredClock, Clock, OrchestratorHandle, PlaybackOrchestrator, PlaybackSink, SystemClock,
};
