pub mod catalog;
pub mod config;
pub mod error;
pub mod i18n;
pub mod playback;
pub mod schedule;
mod sqlite;
pub mod status;
pub mod storage;

pub use catalog::{
    display_date_key, infer_duration_minutes, parse_display_date, Catalog, CatalogError,
    CatalogResult, MediaSource, VideoCategory, VideoRecord, MAX_DURATION_MINUTES,
};
pub use config::{
    load_ebomi_config, EbomiConfig, FacebookSection, I18nSection, LiveEventEntry, PathsSection,
    PlaybackSection, ProvidersSection, SiteSection, StatusMode, StatusSection, YouTubeSection,
};
pub use error::{ConfigError, Result};
pub use i18n::{
    resolve_language, LanguageCode, LocalizedText, FALLBACK_LANGUAGE, LANGUAGE_PREFERENCE_KEY,
};
pub use playback::{
    AnchoredClock, Clock, IntroReason, OrchestratorHandle, PlaybackCheckpoint, PlaybackError,
    PlaybackEvent, PlaybackMachine, PlaybackOrchestrator, PlaybackResult, PlaybackSettings,
    PlaybackSink, PlaybackState, PlayerEvent, SystemClock, CHECKPOINT_KEY,
};
pub use schedule::{
    current_program, format_program_time, next_program, next_program_or_wrap, programs_for_day,
    synthesize_week, time_until, ProgramGuide, ProgramKind, ScheduleSlot,
};
pub use status::{
    status_source_from_config, HttpStatusSource, LiveFeed, LivePoller, LiveProvider, PollOutcome,
    PollerHandle, ProviderChain, StatusError, StatusResult, StatusSource, StatusSourceKind,
    StreamStatus,
};
pub use storage::{
    MemoryPreferenceStore, PreferenceStore, SqlitePreferenceStore, SqlitePreferenceStoreBuilder,
    StorageError, StorageResult,
};
