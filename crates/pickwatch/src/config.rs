// Configuration loading (config/pickwatch.toml) and the session's
// configuration collaborator: settings plus plan/queue persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::Database;
use crate::draft::player::Player;
use crate::plan::DraftPlan;
use crate::provider::sleeper::SLEEPER_API_URL;
use crate::valuation::adp::ScoringFormat;

pub const CONFIG_FILE: &str = "pickwatch.toml";

/// Built-in copy of `defaults/pickwatch.toml`, used to seed a per-user
/// config directory when the working directory has none.
const DEFAULT_CONFIG: &str = include_str!("../defaults/pickwatch.toml");

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// pickwatch.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub sync: SyncConfig,
    pub clock: ClockConfig,
    pub provider: ProviderConfig,
    /// Resolved against the config base directory when relative.
    pub db_path: String,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    league: LeagueConfig,
    #[serde(default)]
    sync: SyncConfig,
    #[serde(default)]
    clock: ClockConfig,
    #[serde(default)]
    provider: ProviderConfig,
    #[serde(default)]
    database: DatabaseConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeagueConfig {
    #[serde(default)]
    pub league_id: Option<String>,
    #[serde(default)]
    pub draft_id: Option<String>,
    /// `standard`, `half_ppr` or `ppr`. Unset falls back to Half-PPR.
    #[serde(default)]
    pub scoring_format: Option<String>,
    /// 1-based slot, used when the provider does not publish the order.
    #[serde(default)]
    pub draft_position: Option<u32>,
    #[serde(default)]
    pub tracked_username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_refresh_timeout_ms")]
    pub refresh_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            poll_interval_ms: default_poll_interval_ms(),
            refresh_timeout_ms: default_refresh_timeout_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_refresh_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_pick_seconds")]
    pub pick_seconds: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            pick_seconds: default_pick_seconds(),
        }
    }
}

fn default_pick_seconds() -> u32 {
    crate::timer::DEFAULT_PICK_SECONDS
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Optional local catalog snapshot, used instead of `players/nfl`.
    #[serde(default)]
    pub catalog_csv: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            catalog_csv: None,
        }
    }
}

fn default_base_url() -> String {
    SLEEPER_API_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    20_000
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "pickwatch.db".into()
}

// ---------------------------------------------------------------------------
// Resolved session settings
// ---------------------------------------------------------------------------

/// What a draft session needs from configuration, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub league_id: Option<String>,
    pub draft_id: Option<String>,
    pub scoring_format: ScoringFormat,
    pub draft_position: Option<u32>,
    pub tracked_username: Option<String>,
    pub poll_interval: Duration,
    pub refresh_timeout: Duration,
    pub pick_seconds: u32,
    pub catalog_csv: Option<PathBuf>,
}

impl SessionSettings {
    /// Settings for a draft id with every default applied.
    pub fn for_draft(draft_id: &str) -> Self {
        SessionSettings {
            league_id: None,
            draft_id: Some(draft_id.to_string()),
            scoring_format: ScoringFormat::default(),
            draft_position: None,
            tracked_username: None,
            poll_interval: Duration::from_millis(default_poll_interval_ms()),
            refresh_timeout: Duration::from_millis(default_refresh_timeout_ms()),
            pick_seconds: default_pick_seconds(),
            catalog_csv: None,
        }
    }
}

impl Config {
    /// Scoring format, degrading to Half-PPR with a warning when unset.
    pub fn scoring_format(&self) -> ScoringFormat {
        match self.league.scoring_format.as_deref().and_then(ScoringFormat::parse) {
            Some(format) => format,
            None => {
                warn!(
                    "league.scoring_format is not set; defaulting to {}",
                    ScoringFormat::default()
                );
                ScoringFormat::default()
            }
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            league_id: non_empty(&self.league.league_id),
            draft_id: non_empty(&self.league.draft_id),
            scoring_format: self.scoring_format(),
            draft_position: self.league.draft_position,
            tracked_username: non_empty(&self.league.tracked_username),
            poll_interval: Duration::from_millis(self.sync.poll_interval_ms),
            refresh_timeout: Duration::from_millis(self.sync.refresh_timeout_ms),
            pick_seconds: self.clock.pick_seconds,
            catalog_csv: self.provider.catalog_csv.as_ref().map(PathBuf::from),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.provider.request_timeout_ms)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/pickwatch.toml` relative to `base_dir`.
///
/// Does not copy defaults; see [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let db_path = if file.database.path == ":memory:" || Path::new(&file.database.path).is_absolute() {
        file.database.path
    } else {
        base_dir.join(&file.database.path).display().to_string()
    };

    let mut provider = file.provider;
    if let Some(csv) = provider.catalog_csv.take().filter(|s| !s.trim().is_empty()) {
        provider.catalog_csv = Some(if Path::new(&csv).is_absolute() {
            csv
        } else {
            base_dir.join(csv).display().to_string()
        });
    }

    let config = Config {
        league: file.league,
        sync: file.sync,
        clock: file.clock,
        provider,
        db_path,
    };

    validate(&config)?;
    Ok(config)
}

/// Copy any missing files from `defaults/` into `config/`. Returns the files
/// that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);
        if target.exists() {
            continue;
        }
        std::fs::copy(&path, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {}: {e}", path.display()),
        })?;
        copied.push(target);
    }
    Ok(copied)
}

/// Where configuration lives: the working directory when it carries
/// `config/` or `defaults/`, otherwise the per-user config directory.
pub fn resolve_base_dir() -> Result<PathBuf, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if cwd.join("config").exists() || cwd.join("defaults").exists() {
        return Ok(cwd);
    }

    let dirs = directories::ProjectDirs::from("", "", "pickwatch").ok_or_else(|| {
        ConfigError::DefaultsCopyError {
            message: "no home directory available for per-user config".into(),
        }
    })?;
    let base = dirs.config_dir().to_path_buf();
    seed_user_config(&base)?;
    Ok(base)
}

/// Write the built-in defaults into `<base>/config/` if nothing is there yet.
fn seed_user_config(base: &Path) -> Result<(), ConfigError> {
    let config_dir = base.join("config");
    let target = config_dir.join(CONFIG_FILE);
    if target.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(&config_dir)
        .and_then(|_| std::fs::write(&target, DEFAULT_CONFIG))
        .map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to write {}: {e}", target.display()),
        })?;
    info!("Seeded default configuration at {}", target.display());
    Ok(())
}

/// Resolve the base directory, seed defaults and load.
pub fn load_config() -> Result<Config, ConfigError> {
    let base = resolve_base_dir()?;
    for copied in seed_defaults(&base) {
        info!("Copied default config to {}", copied.display());
    }
    load_config_from(&base)
}

/// Best-effort `ensure_config_files`: a failed copy is logged and loading
/// goes on with whatever `config/` already holds.
fn seed_defaults(base: &Path) -> Vec<PathBuf> {
    match ensure_config_files(base) {
        Ok(copied) => copied,
        Err(e) => {
            warn!("Could not seed default config: {}", e);
            Vec::new()
        }
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;
    if non_empty(&league.league_id).is_none() && non_empty(&league.draft_id).is_none() {
        return Err(ConfigError::invalid(
            "league.league_id",
            "set league.league_id or league.draft_id",
        ));
    }

    if let Some(pos) = league.draft_position {
        if !(1..=32).contains(&pos) {
            return Err(ConfigError::invalid(
                "league.draft_position",
                format!("must be between 1 and 32, got {pos}"),
            ));
        }
    }

    if let Some(raw) = non_empty(&league.scoring_format) {
        if ScoringFormat::parse(&raw).is_none() {
            return Err(ConfigError::invalid(
                "league.scoring_format",
                format!("unknown scoring format '{raw}' (use standard, half_ppr or ppr)"),
            ));
        }
    }

    let positive: &[(&str, u64)] = &[
        ("sync.poll_interval_ms", config.sync.poll_interval_ms),
        ("sync.refresh_timeout_ms", config.sync.refresh_timeout_ms),
        ("clock.pick_seconds", u64::from(config.clock.pick_seconds)),
        ("provider.request_timeout_ms", config.provider.request_timeout_ms),
    ];
    for (name, val) in positive {
        if *val == 0 {
            return Err(ConfigError::invalid(name, "must be > 0"));
        }
    }

    if config.provider.base_url.trim().is_empty() {
        return Err(ConfigError::invalid("provider.base_url", "must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Configuration collaborator
// ---------------------------------------------------------------------------

/// Supplies session settings and persists the plan and queue per draft.
pub trait ConfigProvider: Send + Sync {
    fn settings(&self) -> &SessionSettings;

    fn load_plan(&self, draft_id: &str) -> anyhow::Result<Option<DraftPlan>>;

    fn save_plan(&mut self, draft_id: &str, plan: &DraftPlan) -> anyhow::Result<()>;

    fn load_queue(&self, draft_id: &str) -> anyhow::Result<Vec<Player>>;

    fn save_queue(&mut self, draft_id: &str, queue: &[Player]) -> anyhow::Result<()>;
}

fn plan_key(draft_id: &str) -> String {
    format!("plan:{draft_id}")
}

fn queue_key(draft_id: &str) -> String {
    format!("queue:{draft_id}")
}

/// Settings from `pickwatch.toml`, persistence in SQLite.
pub struct StoredConfig {
    settings: SessionSettings,
    db: Database,
}

impl StoredConfig {
    pub fn new(config: &Config, db: Database) -> Self {
        StoredConfig {
            settings: config.session_settings(),
            db,
        }
    }
}

impl ConfigProvider for StoredConfig {
    fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    fn load_plan(&self, draft_id: &str) -> anyhow::Result<Option<DraftPlan>> {
        match self.db.load_state(&plan_key(draft_id))? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn save_plan(&mut self, draft_id: &str, plan: &DraftPlan) -> anyhow::Result<()> {
        self.db.save_state(&plan_key(draft_id), &serde_json::to_value(plan)?)
    }

    fn load_queue(&self, draft_id: &str) -> anyhow::Result<Vec<Player>> {
        match self.db.load_state(&queue_key(draft_id))? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_queue(&mut self, draft_id: &str, queue: &[Player]) -> anyhow::Result<()> {
        let key = queue_key(draft_id);
        if queue.is_empty() {
            self.db.delete_state(&key)?;
            return Ok(());
        }
        self.db.save_state(&key, &serde_json::to_value(queue)?)
    }
}

/// In-memory collaborator for tests and throwaway sessions.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    settings: SessionSettings,
    plans: HashMap<String, DraftPlan>,
    queues: HashMap<String, Vec<Player>>,
}

impl MemoryConfig {
    pub fn new(settings: SessionSettings) -> Self {
        MemoryConfig {
            settings,
            plans: HashMap::new(),
            queues: HashMap::new(),
        }
    }

    pub fn with_queue(mut self, draft_id: &str, queue: Vec<Player>) -> Self {
        self.queues.insert(draft_id.to_string(), queue);
        self
    }

    pub fn with_plan(mut self, draft_id: &str, plan: DraftPlan) -> Self {
        self.plans.insert(draft_id.to_string(), plan);
        self
    }
}

impl ConfigProvider for MemoryConfig {
    fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    fn load_plan(&self, draft_id: &str) -> anyhow::Result<Option<DraftPlan>> {
        Ok(self.plans.get(draft_id).cloned())
    }

    fn save_plan(&mut self, draft_id: &str, plan: &DraftPlan) -> anyhow::Result<()> {
        self.plans.insert(draft_id.to_string(), plan.clone());
        Ok(())
    }

    fn load_queue(&self, draft_id: &str) -> anyhow::Result<Vec<Player>> {
        Ok(self.queues.get(draft_id).cloned().unwrap_or_default())
    }

    fn save_queue(&mut self, draft_id: &str, queue: &[Player]) -> anyhow::Result<()> {
        self.queues.insert(draft_id.to_string(), queue.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
