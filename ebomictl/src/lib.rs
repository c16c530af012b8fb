use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ebomi_core::{
    format_program_time, load_ebomi_config, next_program_or_wrap, parse_display_date,
    resolve_language, status_source_from_config, time_until, AnchoredClock, Catalog, Clock,
    EbomiConfig, LanguageCode, PlaybackCheckpoint, PlaybackMachine, PlaybackOrchestrator,
    PlaybackSettings, PlaybackSink, PlaybackState, PollOutcome, PreferenceStore, ProgramGuide,
    ScheduleSlot, SqlitePreferenceStore, SystemClock, VideoCategory, VideoRecord,
    FALLBACK_LANGUAGE,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ebomi_core::ConfigError),
    #[error("catalog error: {0}")]
    Catalog(#[from] ebomi_core::CatalogError),
    #[error("status error: {0}")]
    Status(#[from] ebomi_core::StatusError),
    #[error("storage error: {0}")]
    Storage(#[from] ebomi_core::StorageError),
    #[error("playback error: {0}")]
    Playback(#[from] ebomi_core::PlaybackError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid argument: {0}")]
    Invalid(String),
}

#[derive(Parser, Debug)]
#[command(author, version, about = "EBOMI TV programme guide and playback control", long_about = None)]
pub struct Cli {
    /// Path to the main ebomi.toml
    #[arg(long, default_value = "configs/ebomi.toml")]
    pub config: PathBuf,
    /// Catalog file (overrides paths.catalog)
    #[arg(long)]
    pub catalog: Option<PathBuf>,
    /// Preference database (overrides paths.storage)
    #[arg(long)]
    pub storage: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Programme guide for one day of the synthesized week
    Guide(GuideArgs),
    /// What is airing now and what comes next
    Now(NowArgs),
    /// Poll the live status source once
    Status,
    #[command(subcommand)]
    Catalog(CatalogCommands),
    #[command(subcommand)]
    Checkpoint(CheckpointCommands),
    #[command(subcommand)]
    Language(LanguageCommands),
    /// Run the playback orchestrator headless and log every transition
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
pub struct GuideArgs {
    /// Local calendar day (YYYY-MM-DD); defaults to today in the channel zone
    #[arg(long)]
    pub day: Option<NaiveDate>,
    /// Title language; defaults to the stored preference
    #[arg(long)]
    pub language: Option<LanguageCode>,
    /// Instant the week is synthesized from (RFC 3339)
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub struct NowArgs {
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
    #[arg(long)]
    pub language: Option<LanguageCode>,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// List catalog entries with their scheduled durations
    List(CatalogListArgs),
    /// Check the catalog loads and report entries needing attention
    Validate,
}

#[derive(Args, Debug, Default)]
pub struct CatalogListArgs {
    /// Only list one category: sermon, praise, podcast, interview or testimony
    #[arg(long)]
    pub category: Option<VideoCategory>,
    #[arg(long)]
    pub language: Option<LanguageCode>,
}

#[derive(Subcommand, Debug)]
pub enum CheckpointCommands {
    Show,
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum LanguageCommands {
    Show,
    Set {
        /// Language code, e.g. en, fr, ha
        code: LanguageCode,
    },
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Start the simulated clock at this instant instead of wall time
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
    /// Stop after this many seconds
    #[arg(long, default_value_t = 60)]
    pub duration_seconds: u64,
}

pub fn run(cli: Cli) -> Result<()> {
    let context = AppContext::new(&cli)?;

    match &cli.command {
        Commands::Guide(args) => {
            let report = context.guide(args)?;
            render(&report, cli.format)?;
        }
        Commands::Now(args) => {
            let report = context.now(args)?;
            render(&report, cli.format)?;
        }
        Commands::Status => {
            let report = block_on(context.status())??;
            render(&report, cli.format)?;
        }
        Commands::Catalog(CatalogCommands::List(args)) => {
            let report = context.catalog_list(args)?;
            render(&report, cli.format)?;
        }
        Commands::Catalog(CatalogCommands::Validate) => {
            let report = context.catalog_validate()?;
            render(&report, cli.format)?;
        }
        Commands::Checkpoint(CheckpointCommands::Show) => {
            let report = context.checkpoint_show()?;
            render(&report, cli.format)?;
        }
        Commands::Checkpoint(CheckpointCommands::Clear) => {
            let report = context.checkpoint_clear()?;
            render(&report, cli.format)?;
        }
        Commands::Language(LanguageCommands::Show) => {
            let report = context.language_show()?;
            render(&report, cli.format)?;
        }
        Commands::Language(LanguageCommands::Set { code }) => {
            let report = context.language_set(*code)?;
            render(&report, cli.format)?;
        }
        Commands::Watch(args) => {
            let report = block_on(context.watch(args))??;
            render(&report, cli.format)?;
        }
    }

    Ok(())
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

fn render<T>(value: &T, format: OutputFormat) -> Result<()>
where
    T: Serialize + DisplayFallback,
{
    match format {
        OutputFormat::Text => {
            println!("{}", value.display());
            Ok(())
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{}", json);
            Ok(())
        }
    }
}

trait DisplayFallback {
    fn display(&self) -> String;
}

struct AppContext {
    config: EbomiConfig,
    catalog_path: PathBuf,
    storage_path: PathBuf,
}

impl AppContext {
    fn new(cli: &Cli) -> Result<Self> {
        let config = load_ebomi_config(&cli.config)?;
        let catalog_path = cli
            .catalog
            .clone()
            .unwrap_or_else(|| config.catalog_path());
        let storage_path = cli
            .storage
            .clone()
            .unwrap_or_else(|| config.storage_path());
        Ok(Self {
            config,
            catalog_path,
            storage_path,
        })
    }

    fn program_guide(&self) -> Result<ProgramGuide> {
        let catalog = Catalog::load(&self.catalog_path)?;
        let zone = self.config.site.time_zone()?;
        Ok(ProgramGuide::new(Arc::new(catalog), zone))
    }

    fn open_store(&self) -> Result<SqlitePreferenceStore> {
        let store = SqlitePreferenceStore::builder()
            .path(&self.storage_path)
            .create_if_missing(true)
            .build()?;
        store.initialize()?;
        Ok(store)
    }

    fn fallback_language(&self) -> LanguageCode {
        resolve_language(Some(&self.config.i18n.fallback_language), FALLBACK_LANGUAGE)
    }

    /// Explicit choice, else the stored preference when a database exists.
    fn language(&self, requested: Option<LanguageCode>) -> Result<LanguageCode> {
        if let Some(language) = requested {
            return Ok(language);
        }
        if !self.storage_path.exists() {
            return Ok(self.fallback_language());
        }
        Ok(self.open_store()?.language(self.fallback_language())?)
    }

    fn guide(&self, args: &GuideArgs) -> Result<GuideReport> {
        let guide = self.program_guide()?;
        let now = args.at.unwrap_or_else(Utc::now);
        let language = self.language(args.language)?;
        let day = args
            .day
            .unwrap_or_else(|| now.with_timezone(&guide.zone()).date_naive());
        let programmes = guide
            .day(now, day)
            .iter()
            .map(|slot| GuideEntry::from_slot(slot, &guide, language, now))
            .collect();
        Ok(GuideReport {
            day,
            zone: guide.zone().to_string(),
            language,
            programmes,
        })
    }

    fn now(&self, args: &NowArgs) -> Result<NowReport> {
        let guide = self.program_guide()?;
        let now = args.at.unwrap_or_else(Utc::now);
        let language = self.language(args.language)?;
        let week = guide.week(now);
        let current = guide
            .current(now)
            .map(|slot| GuideEntry::from_slot(&slot, &guide, language, now));
        let next = next_program_or_wrap(&week, now)
            .map(|slot| GuideEntry::from_slot(slot, &guide, language, now));
        Ok(NowReport { at: now, current, next })
    }

    async fn status(&self) -> Result<StatusReport> {
        let source = status_source_from_config(&self.config)?;
        let outcome = source.poll().await;
        Ok(StatusReport::from_outcome(&outcome))
    }

    fn catalog_list(&self, args: &CatalogListArgs) -> Result<CatalogList> {
        let catalog = Catalog::load(&self.catalog_path)?;
        let language = self.language(args.language)?;
        let videos: Vec<&VideoRecord> = match args.category {
            Some(category) => catalog.by_category(category).collect(),
            None => catalog.iter().collect(),
        };
        let total_minutes = videos
            .iter()
            .map(|video| u64::from(video.duration_minutes))
            .sum();
        let rows = videos
            .into_iter()
            .map(|video| CatalogRow {
                id: video.id.clone(),
                title: video.title_in(language).to_string(),
                description: video.description_in(language).map(str::to_string),
                category: video.category.as_str(),
                duration_minutes: video.duration_minutes,
                display_date: video.display_date.clone(),
                direct: video.media().is_direct(),
            })
            .collect();
        Ok(CatalogList { rows, total_minutes })
    }

    fn catalog_validate(&self) -> Result<CatalogValidation> {
        let catalog = Catalog::load(&self.catalog_path)?;
        let undated = catalog
            .iter()
            .filter(|video| parse_display_date(&video.display_date).is_none())
            .map(|video| video.id.clone())
            .collect();
        let direct = catalog.iter().filter(|video| video.media().is_direct()).count();
        Ok(CatalogValidation {
            path: self.catalog_path.display().to_string(),
            videos: catalog.len(),
            direct,
            embedded: catalog.len() - direct,
            total_minutes: catalog.total_minutes(),
            undated,
        })
    }

    fn checkpoint_show(&self) -> Result<CheckpointReport> {
        let checkpoint = self.open_store()?.load_checkpoint()?;
        let freshness = PlaybackSettings::from_config(&self.config)?.checkpoint_freshness;
        let fresh = checkpoint
            .as_ref()
            .is_some_and(|checkpoint| checkpoint.is_fresh(Utc::now(), freshness));
        Ok(CheckpointReport { checkpoint, fresh })
    }

    fn checkpoint_clear(&self) -> Result<ClearReport> {
        let cleared = self.open_store()?.clear_checkpoint()?;
        Ok(ClearReport { cleared })
    }

    fn language_show(&self) -> Result<LanguageReport> {
        let language = self.open_store()?.language(self.fallback_language())?;
        Ok(LanguageReport::from(language))
    }

    fn language_set(&self, language: LanguageCode) -> Result<LanguageReport> {
        self.open_store()?.set_language(language)?;
        info!(target: "ebomictl", language = %language, "language preference saved");
        Ok(LanguageReport::from(language))
    }

    async fn watch(&self, args: &WatchArgs) -> Result<WatchReport> {
        let guide = self.program_guide()?;
        let settings = PlaybackSettings::from_config(&self.config)?;
        let intro_duration = settings.intro_duration;
        let source = status_source_from_config(&self.config)?;
        let store: Arc<dyn PreferenceStore> = Arc::new(self.open_store()?);
        let clock: Arc<dyn Clock> = match args.at {
            Some(start) => Arc::new(AnchoredClock::starting_at(start)),
            None => Arc::new(SystemClock),
        };

        let (states_tx, mut states_rx) = mpsc::unbounded_channel();
        let sink = HeadlessSink::new(states_tx);
        let machine = PlaybackMachine::new(guide, settings);
        let (orchestrator, handle) = PlaybackOrchestrator::new(machine, source, store, sink);
        let task = tokio::spawn(orchestrator.with_clock(clock.clone()).run());

        let mut transitions = Vec::new();
        let mut intro_deadline: Option<Instant> = None;
        let stop = sleep(Duration::from_secs(args.duration_seconds));
        tokio::pin!(stop);

        loop {
            tokio::select! {
                state = states_rx.recv() => {
                    let Some(state) = state else { break };
                    info!(target: "ebomictl", state = state.label(), "{state}");
                    intro_deadline = matches!(state, PlaybackState::ShowingIntro { .. })
                        .then(|| Instant::now() + intro_duration);
                    transitions.push(Transition {
                        at: clock.now(),
                        state: state.label(),
                        detail: state.to_string(),
                    });
                }
                _ = wait_for(intro_deadline) => {
                    intro_deadline = None;
                    debug!(target: "ebomictl", "intro finished");
                    handle.intro_finished()?;
                }
                _ = &mut stop => break,
            }
        }

        // The orchestrator may already be gone if every sender dropped.
        let _ = handle.shutdown();
        let final_state = task
            .await
            .map_err(|err| AppError::Invalid(format!("orchestrator task failed: {err}")))?;
        Ok(WatchReport {
            transitions,
            final_state: final_state.to_string(),
        })
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Stands in for a video element: reports every state and advances a
/// simulated playhead while scheduled media is on screen.
struct HeadlessSink {
    states: mpsc::UnboundedSender<PlaybackState>,
    playing_since: Option<(Instant, f64)>,
}

impl HeadlessSink {
    fn new(states: mpsc::UnboundedSender<PlaybackState>) -> Self {
        Self {
            states,
            playing_since: None,
        }
    }
}

impl PlaybackSink for HeadlessSink {
    fn show(&mut self, state: &PlaybackState) {
        self.playing_since = match state {
            PlaybackState::ShowingScheduled { resume_at, .. } => {
                Some((Instant::now(), resume_at.unwrap_or(0.0)))
            }
            _ => None,
        };
        let _ = self.states.send(state.clone());
    }

    fn position_seconds(&mut self) -> Option<f64> {
        self.playing_since
            .map(|(since, offset)| offset + since.elapsed().as_secs_f64())
    }
}

#[derive(Debug, Serialize)]
struct GuideEntry {
    slot_id: String,
    video_id: String,
    title: String,
    kind: &'static str,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    starts: String,
    ends: String,
    countdown: String,
    airing: bool,
}

impl GuideEntry {
    fn from_slot(
        slot: &ScheduleSlot,
        guide: &ProgramGuide,
        language: LanguageCode,
        now: DateTime<Utc>,
    ) -> Self {
        let zone = guide.zone();
        Self {
            slot_id: slot.slot_id.clone(),
            video_id: slot.video_id.clone(),
            title: slot.title_in(language).to_string(),
            kind: slot.kind.as_str(),
            start_time: slot.start_time,
            end_time: slot.end_time,
            starts: format_program_time(slot.start_time, &zone),
            ends: format_program_time(slot.end_time, &zone),
            countdown: time_until(slot, now),
            airing: slot.is_airing(now),
        }
    }

    fn line(&self) -> String {
        let marker = if self.airing { "*" } else { " " };
        format!(
            "{marker} {:>8} - {:<8} | {} | {} ({})",
            self.starts, self.ends, self.kind, self.title, self.countdown
        )
    }
}

#[derive(Debug, Serialize)]
struct GuideReport {
    day: NaiveDate,
    zone: String,
    language: LanguageCode,
    programmes: Vec<GuideEntry>,
}

impl DisplayFallback for GuideReport {
    fn display(&self) -> String {
        let mut lines = vec![format!("Guide for {} (UTC{})", self.day, self.zone)];
        if self.programmes.is_empty() {
            lines.push("No programmes scheduled".to_string());
        }
        lines.extend(self.programmes.iter().map(GuideEntry::line));
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
struct NowReport {
    at: DateTime<Utc>,
    current: Option<GuideEntry>,
    next: Option<GuideEntry>,
}

impl DisplayFallback for NowReport {
    fn display(&self) -> String {
        let current = self
            .current
            .as_ref()
            .map(GuideEntry::line)
            .unwrap_or_else(|| "  nothing airing".to_string());
        let next = self
            .next
            .as_ref()
            .map(GuideEntry::line)
            .unwrap_or_else(|| "  nothing scheduled".to_string());
        format!("Now:\n{current}\nNext:\n{next}")
    }
}

#[derive(Debug, Serialize)]
struct StatusReport {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl StatusReport {
    fn from_outcome(outcome: &PollOutcome) -> Self {
        let (provider, embed_url, detail) = match outcome {
            PollOutcome::Live(feed) => (
                Some(feed.provider.to_string()),
                Some(feed.embed_url.clone()),
                None,
            ),
            PollOutcome::Offline => (None, None, None),
            PollOutcome::Degraded(reason) | PollOutcome::Unreachable(reason) => {
                (None, None, Some(reason.clone()))
            }
        };
        Self {
            outcome: outcome.label(),
            provider,
            embed_url,
            detail,
        }
    }
}

impl DisplayFallback for StatusReport {
    fn display(&self) -> String {
        match (&self.provider, &self.embed_url, &self.detail) {
            (Some(provider), Some(url), _) => format!("LIVE on {provider}: {url}"),
            (_, _, Some(detail)) => format!("{}: {detail}", self.outcome),
            _ => "Not live; pre-recorded programming".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CatalogRow {
    id: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    category: &'static str,
    duration_minutes: u32,
    display_date: String,
    direct: bool,
}

#[derive(Debug, Serialize)]
struct CatalogList {
    rows: Vec<CatalogRow>,
    total_minutes: u64,
}

impl DisplayFallback for CatalogList {
    fn display(&self) -> String {
        if self.rows.is_empty() {
            return "Catalog is empty".to_string();
        }
        let mut lines: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let mut line = format!(
                    "{} | {} | {} | {}m | {}{}",
                    row.id,
                    row.title,
                    row.category,
                    row.duration_minutes,
                    if row.display_date.is_empty() { "-" } else { row.display_date.as_str() },
                    if row.direct { " | direct" } else { "" }
                );
                if let Some(description) = &row.description {
                    line.push_str(&format!("\n    {description}"));
                }
                line
            })
            .collect();
        lines.push(format!("Total: {} minutes", self.total_minutes));
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
struct CatalogValidation {
    path: String,
    videos: usize,
    direct: usize,
    embedded: usize,
    total_minutes: u64,
    /// Entries whose display date cannot be parsed; they air first.
    undated: Vec<String>,
}

impl DisplayFallback for CatalogValidation {
    fn display(&self) -> String {
        let mut lines = vec![
            format!("{}: {} videos ok", self.path, self.videos),
            format!("  direct: {}, embedded: {}", self.direct, self.embedded),
            format!("  daily programming: {} minutes", self.total_minutes),
        ];
        if self.total_minutes > 24 * 60 {
            lines.push("  warning: programming exceeds one day, slots will overlap".to_string());
        }
        for id in &self.undated {
            lines.push(format!("  warning: {id} has no parseable date"));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
struct CheckpointReport {
    checkpoint: Option<PlaybackCheckpoint>,
    fresh: bool,
}

impl DisplayFallback for CheckpointReport {
    fn display(&self) -> String {
        match &self.checkpoint {
            None => "No playback checkpoint".to_string(),
            Some(checkpoint) => {
                let saved = checkpoint
                    .saved_at()
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                format!(
                    "{} at {:.1}s (saved {saved}, {})",
                    checkpoint.content_id,
                    checkpoint.position_seconds,
                    if self.fresh { "fresh" } else { "stale" }
                )
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ClearReport {
    cleared: bool,
}

impl DisplayFallback for ClearReport {
    fn display(&self) -> String {
        if self.cleared {
            "Checkpoint cleared".to_string()
        } else {
            "No checkpoint to clear".to_string()
        }
    }
}

#[derive(Debug, Serialize)]
struct LanguageReport {
    code: LanguageCode,
    native_name: &'static str,
    rtl: bool,
}

impl From<LanguageCode> for LanguageReport {
    fn from(code: LanguageCode) -> Self {
        Self {
            code,
            native_name: code.native_name(),
            rtl: code.is_rtl(),
        }
    }
}

impl DisplayFallback for LanguageReport {
    fn display(&self) -> String {
        let direction = if self.rtl { "rtl" } else { "ltr" };
        format!("{} ({}, {direction})", self.code, self.native_name)
    }
}

#[derive(Debug, Serialize)]
struct Transition {
    at: DateTime<Utc>,
    state: &'static str,
    detail: String,
}

#[derive(Debug, Serialize)]
struct WatchReport {
    transitions: Vec<Transition>,
    final_state: String,
}

impl DisplayFallback for WatchReport {
    fn display(&self) -> String {
        let mut lines: Vec<String> = self
            .transitions
            .iter()
            .map(|transition| format!("{} {}", transition.at.to_rfc3339(), transition.detail))
            .collect();
        lines.push(format!("Stopped in: {}", self.final_state));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn prepare_test_context() -> (TempDir, AppContext) {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let catalog = Path::new(env!("CARGO_MANIFEST_DIR")).join("../configs/catalog.toml");
        let config_path = root.join("ebomi.toml");
        fs::write(
            &config_path,
            format!(
                "[site]\nname = \"EBOMI TV\"\nutc_offset = \"+01:00\"\n\n[paths]\nbase_dir = \"{}\"\ncatalog = \"{}\"\nstorage = \"data/preferences.sqlite\"\n\n[i18n]\nfallback_language = \"fr\"\n",
                root.display(),
                catalog.display()
            ),
        )
        .unwrap();
        let cli = Cli::try_parse_from(["ebomictl", "--config", config_path.to_str().unwrap(), "status"])
            .unwrap();
        let context = AppContext::new(&cli).unwrap();
        (temp, context)
    }

    #[test]
    fn parses_catalog_list_filters() {
        let cli = Cli::try_parse_from([
            "ebomictl", "catalog", "list", "--category", "sermon", "--language", "fr",
        ])
        .unwrap();
        match cli.command {
            Commands::Catalog(CatalogCommands::List(args)) => {
                assert_eq!(args.category, Some(VideoCategory::Sermon));
                assert_eq!(args.language, Some(LanguageCode::Fr));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::try_parse_from([
            "ebomictl",
            "--format",
            "json",
            "guide",
            "--day",
            "2025-12-10",
            "--language",
            "ha",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Guide(args) => {
                assert_eq!(args.day, NaiveDate::from_ymd_opt(2025, 12, 10));
                assert_eq!(args.language, Some(LanguageCode::Ha));
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["ebomictl", "language", "set", "yo"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Language(LanguageCommands::Set { code: LanguageCode::Yo })
        ));
        assert!(Cli::try_parse_from(["ebomictl", "language", "set", "klingon"]).is_err());
    }

    #[test]
    fn guide_lists_the_requested_day() {
        let (_temp, context) = prepare_test_context();
        let at = Utc.with_ymd_and_hms(2025, 12, 10, 8, 0, 0).unwrap();
        let report = context
            .guide(&GuideArgs {
                day: NaiveDate::from_ymd_opt(2025, 12, 11),
                language: None,
                at: Some(at),
            })
            .unwrap();
        assert!(!report.programmes.is_empty());
        assert_eq!(report.language, LanguageCode::Fr);
        assert!(report
            .programmes
            .windows(2)
            .all(|pair| pair[0].start_time <= pair[1].start_time));
        assert!(report.programmes.iter().all(|entry| !entry.airing));
        let rendered = report.display();
        assert!(rendered.starts_with("Guide for 2025-12-11"));
    }

    #[test]
    fn now_reports_current_and_next() {
        let (_temp, context) = prepare_test_context();
        let at = Utc.with_ymd_and_hms(2025, 12, 10, 8, 0, 0).unwrap();
        let report = context
            .now(&NowArgs {
                at: Some(at),
                language: Some(LanguageCode::En),
            })
            .unwrap();
        let next = report.next.expect("fixture week always has a next slot");
        assert!(next.start_time > at);
        if let Some(current) = &report.current {
            assert!(current.airing);
            assert_eq!(current.countdown, "Now");
        }
    }

    #[test]
    fn language_preference_round_trips_through_storage() {
        let (_temp, context) = prepare_test_context();
        assert_eq!(context.language(None).unwrap(), LanguageCode::Fr);
        assert_eq!(context.language_show().unwrap().code, LanguageCode::Fr);

        let report = context.language_set(LanguageCode::Ar).unwrap();
        assert!(report.rtl);
        assert_eq!(context.language(None).unwrap(), LanguageCode::Ar);
        assert_eq!(context.language(Some(LanguageCode::Ig)).unwrap(), LanguageCode::Ig);
    }

    #[test]
    fn checkpoint_show_and_clear() {
        let (_temp, context) = prepare_test_context();
        assert!(context.checkpoint_show().unwrap().checkpoint.is_none());
        assert!(!context.checkpoint_clear().unwrap().cleared);

        context
            .open_store()
            .unwrap()
            .save_checkpoint(&PlaybackCheckpoint::new("clip", 30.0, Utc::now()))
            .unwrap();
        let report = context.checkpoint_show().unwrap();
        assert!(report.fresh);
        assert_eq!(report.checkpoint.unwrap().content_id, "clip");
        assert!(context.checkpoint_clear().unwrap().cleared);
    }

    #[test]
    fn catalog_validation_summarises_fixture() {
        let (_temp, context) = prepare_test_context();
        let report = context.catalog_validate().unwrap();
        assert_eq!(report.videos, 8);
        assert_eq!(report.direct, 2);
        assert_eq!(report.embedded, 6);
        assert!(report.undated.is_empty());
        let list = context.catalog_list(&CatalogListArgs::default()).unwrap();
        assert_eq!(list.rows.len(), 8);
        assert_eq!(list.total_minutes, report.total_minutes);
    }

    #[test]
    fn catalog_list_filters_by_category_and_carries_descriptions() {
        let (_temp, context) = prepare_test_context();
        let args = CatalogListArgs {
            category: Some(VideoCategory::Podcast),
            language: Some(LanguageCode::En),
        };
        let list = context.catalog_list(&args).unwrap();
        assert_eq!(list.rows.len(), 2);
        assert!(list.rows.iter().all(|row| row.category == "podcast"));
        assert!(list
            .rows
            .iter()
            .all(|row| row.description.as_deref() == Some("In His Presence")));
        let podcast_minutes: u64 = list.rows.iter().map(|row| u64::from(row.duration_minutes)).sum();
        assert_eq!(list.total_minutes, podcast_minutes);
        assert!(list.display().contains("\n    In His Presence"));
    }

    #[test]
    fn status_report_text_for_each_outcome() {
        let offline = StatusReport::from_outcome(&PollOutcome::Offline);
        assert_eq!(offline.display(), "Not live; pre-recorded programming");
        let down = StatusReport::from_outcome(&PollOutcome::Unreachable("refused".into()));
        assert_eq!(down.display(), "unreachable: refused");
        let live = StatusReport::from_outcome(&PollOutcome::Live(ebomi_core::LiveFeed::youtube("abc")));
        assert!(live.display().starts_with("LIVE on youtube"));
    }

    #[tokio::test(start_paused = true)]
    async fn headless_sink_advances_playhead_only_for_scheduled_media() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = HeadlessSink::new(tx);
        sink.show(&PlaybackState::AwaitingStatus);
        assert_eq!(sink.position_seconds(), None);
        assert_eq!(rx.recv().await, Some(PlaybackState::AwaitingStatus));

        let guide = ProgramGuide::new(
            Arc::new(
                Catalog::new(vec![ebomi_core::VideoRecord::new(
                    "clip",
                    "Clip",
                    ebomi_core::VideoCategory::Podcast,
                    "/videos/clip.mp4",
                )])
                .unwrap(),
            ),
            chrono::FixedOffset::east_opt(0).unwrap(),
        );
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 10, 0).unwrap();
        let slot = guide.current(now).unwrap();
        sink.show(&PlaybackState::ShowingScheduled {
            media: ebomi_core::MediaSource::classify("/videos/clip.mp4"),
            boundary: slot.end_time,
            slot,
            resume_at: Some(100.0),
        });
        tokio::time::advance(Duration::from_secs(5)).await;
        let position = sink.position_seconds().unwrap();
        assert!((105.0..106.0).contains(&position));
    }
}
