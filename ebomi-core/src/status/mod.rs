mod error;
mod models;
mod poller;
mod providers;
mod source;

use std::sync::Arc;

pub use error::{StatusError, StatusResult};
pub use models::{LiveFeed, LiveProvider, PollOutcome, StatusSourceKind, StreamStatus};
pub use poller::{LivePoller, PollerHandle};
pub use providers::{
    next_live_event, FacebookLiveCheck, LiveCheck, ProviderChain, YouTubeLiveCheck,
};
pub use source::{HttpStatusSource, StatusSource};

use crate::config::{EbomiConfig, StatusMode};

/// Status source selected by `status.mode`.
pub fn status_source_from_config(config: &EbomiConfig) -> StatusResult<Arc<dyn StatusSource>> {
    let source: Arc<dyn StatusSource> = match config.status.mode {
        StatusMode::Endpoint => Arc::new(HttpStatusSource::from_config(&config.status)?),
        StatusMode::Providers => Arc::new(ProviderChain::from_config(
            &config.providers,
            &config.live_events,
            config.status.request_timeout(),
        )?),
    };
    Ok(source)
}
