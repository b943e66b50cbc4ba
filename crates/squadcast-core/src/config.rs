// Configuration loading and parsing (app.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::Fixture;
use crate::scoring::transfers::FixtureSignal;

/// Environment variable that overrides `anthropic_api_key`.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const DEFAULT_DB_FILE: &str = "squadcast.db";

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

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub stats_api: StatsApiConfig,
    pub llm: LlmConfig,
    pub squad: SquadConfig,
    pub predictions: PredictionsConfig,
    pub transfers: TransfersConfig,
    pub credentials: CredentialsConfig,
    pub db_path: PathBuf,
}

// ---------------------------------------------------------------------------
// app.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire app.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AppFile {
    server: ServerConfig,
    stats_api: StatsApiConfig,
    llm: LlmConfig,
    squad: SquadConfig,
    predictions: PredictionsConfig,
    #[serde(default)]
    transfers: TransfersConfig,
    #[serde(default)]
    database: DatabaseSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsApiConfig {
    /// Root of the statistics API, without a trailing slash.
    pub base_url: String,
    pub photo_base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    /// Budget for the structured analysis endpoints.
    pub max_tokens: u32,
    /// Budget for free-form chat replies.
    pub chat_max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SquadConfig {
    /// Starting bank, tenths of a unit.
    pub budget: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionsConfig {
    pub horizon: usize,
    pub differential_max_ownership: f64,
}

/// Which fixture signal the transfer scorer uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureSignalMode {
    #[default]
    Constant,
    NextFixture,
}

impl FixtureSignalMode {
    /// Bind the mode to the fixture list it needs.
    pub fn signal<'a>(&self, fixtures: &'a [Fixture], gameweek: u32) -> FixtureSignal<'a> {
        match self {
            FixtureSignalMode::Constant => FixtureSignal::Constant,
            FixtureSignalMode::NextFixture => FixtureSignal::NextFixture { fixtures, gameweek },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransfersConfig {
    #[serde(default)]
    pub fixture_signal: FixtureSignalMode,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub anthropic_api_key: Option<String>,
}

impl CredentialsConfig {
    /// The API key to use: `ANTHROPIC_API_KEY` if set and non-empty,
    /// otherwise the one from credentials.toml.
    pub fn api_key(&self) -> Option<String> {
        pick_api_key(
            std::env::var(API_KEY_ENV).ok(),
            self.anthropic_api_key.clone(),
        )
    }
}

/// `env` wins over `file`; blank values count as unset.
fn pick_api_key(env: Option<String>, file: Option<String>) -> Option<String> {
    let usable = |key: &String| !key.trim().is_empty();
    env.filter(usable).or_else(|| file.filter(usable))
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/app.toml` and (optionally)
/// `config/credentials.toml`, both relative to the given `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- app.toml (required) ---
    let app_path = config_dir.join("app.toml");
    let app_text = read_file(&app_path)?;
    let app: AppFile = toml::from_str(&app_text).map_err(|e| ConfigError::ParseError {
        path: app_path.clone(),
        source: e,
    })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let db_path = app.database.path.unwrap_or_else(default_db_path);

    let config = Config {
        server: app.server,
        stats_api: app.stats_api,
        llm: app.llm,
        squad: app.squad,
        predictions: app.predictions,
        transfers: app.transfers,
        credentials,
        db_path,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

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

        // create_new never clobbers an edited config file.
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Loads config relative to the current working directory, copying default
/// config files first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// `<platform data dir>/squadcast.db`, or the working directory when the
/// platform has no home directory.
fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "squadcast")
        .map(|dirs| dirs.data_dir().join(DEFAULT_DB_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validation(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(validation("server.port", "must be greater than 0"));
    }

    let api = &config.stats_api;
    for (name, url) in [
        ("stats_api.base_url", &api.base_url),
        ("stats_api.photo_base_url", &api.photo_base_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(validation(
                name,
                format!("must be an http(s) URL, got {url:?}"),
            ));
        }
    }
    if api.timeout_secs == 0 {
        return Err(validation("stats_api.timeout_secs", "must be greater than 0"));
    }

    if config.llm.model.trim().is_empty() {
        return Err(validation("llm.model", "must not be empty"));
    }
    let token_fields: &[(&str, u32)] = &[
        ("llm.max_tokens", config.llm.max_tokens),
        ("llm.chat_max_tokens", config.llm.chat_max_tokens),
    ];
    for (name, val) in token_fields {
        if *val == 0 {
            return Err(validation(name, "must be > 0"));
        }
    }

    if config.squad.budget == 0 {
        return Err(validation("squad.budget", "must be greater than 0"));
    }

    if config.predictions.horizon == 0 {
        return Err(validation("predictions.horizon", "must be > 0"));
    }
    let own = config.predictions.differential_max_ownership;
    if !(0.0..=100.0).contains(&own) {
        return Err(validation(
            "predictions.differential_max_ownership",
            format!("must be between 0 and 100 inclusive, got {own}"),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
