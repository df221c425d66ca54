//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use voicegate_voice::{SttRuntimeConfig, TtsRuntimeConfig};

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Speech (cloning and voice design) runtime.
    #[serde(default)]
    pub tts: TtsRuntimeConfig,

    /// Transcription runtime.
    #[serde(default)]
    pub stt: SttRuntimeConfig,

    /// Voice manifest location.
    #[serde(default)]
    pub voices: VoicesConfig,

    /// Per-client request limits.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared API key. Unset or empty disables authentication.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ServerConfig {
    /// The configured API key, if authentication is enabled.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoicesConfig {
    /// Directory holding `voices.json` and the reference recordings.
    #[serde(default = "default_voices_dir")]
    pub directory: PathBuf,
}

/// Fixed-window rate limit applied to every client.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    #[serde(default = "default_rate_limit_requests")]
    pub requests: u32,

    /// Window length in seconds.
    #[serde(default = "default_rate_limit_window")]
    pub window_seconds: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "voicegate_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8001
}

fn default_voices_dir() -> PathBuf {
    PathBuf::from("voices")
}

fn default_rate_limit_requests() -> u32 {
    10
}

fn default_rate_limit_window() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
        }
    }
}

impl Default for VoicesConfig {
    fn default() -> Self {
        Self {
            directory: default_voices_dir(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: default_rate_limit_requests(),
            window_seconds: default_rate_limit_window(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    /// A required setting is absent.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A setting is present but out of range.
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `VOICEGATE_HOST`, `VOICEGATE_PORT`, `VOICEGATE_API_KEY` override `server.*`
/// - `VOICEGATE_TTS_BINARY`, `VOICEGATE_TTS_BASE_MODEL_PATH`,
///   `VOICEGATE_TTS_VOICE_DESIGN_MODEL_PATH`, `VOICEGATE_TTS_LANGUAGE` override `tts.*`
/// - `VOICEGATE_STT_BINARY`, `VOICEGATE_STT_MODEL_NAME`, `VOICEGATE_STT_DEVICE`,
///   `VOICEGATE_STT_COMPUTE_TYPE`, `VOICEGATE_STT_BEAM_SIZE`, `VOICEGATE_STT_BEST_OF`,
///   `VOICEGATE_STT_VAD_FILTER` override `stt.*`
/// - `VOICEGATE_VOICES_DIR` overrides `voices.directory`
/// - `VOICEGATE_RATE_LIMIT_REQUESTS`, `VOICEGATE_RATE_LIMIT_WINDOW_SECONDS`
///   override `rate_limit.*`
/// - `VOICEGATE_LOG_LEVEL` overrides `logging.level`
/// - `VOICEGATE_LOG_JSON` overrides `logging.json` (true/false, 1/0, yes/no)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, an
/// override does not parse, or the resulting configuration is invalid.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(path, |var| std::env::var(var).ok())
}

/// Same as [`load_config`] with an explicit environment lookup.
pub fn load_config_with<F>(path: Option<&str>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, &env)?;
    config.validate()?;
    Ok(config)
}

fn parse_var<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Env { var, value }),
    }
}

fn apply_env_overrides<F>(config: &mut Config, env: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = env("VOICEGATE_HOST") {
        config.server.host = parse_var("VOICEGATE_HOST", host)?;
    }
    if let Some(port) = env("VOICEGATE_PORT") {
        config.server.port = parse_var("VOICEGATE_PORT", port)?;
    }
    if let Some(key) = env("VOICEGATE_API_KEY") {
        config.server.api_key = Some(key);
    }

    if let Some(binary) = env("VOICEGATE_TTS_BINARY") {
        config.tts.runtime_binary = binary.into();
    }
    if let Some(path) = env("VOICEGATE_TTS_BASE_MODEL_PATH") {
        config.tts.base_model_path = path.into();
    }
    if let Some(path) = env("VOICEGATE_TTS_VOICE_DESIGN_MODEL_PATH") {
        config.tts.voice_design_model_path = path.into();
    }
    if let Some(language) = env("VOICEGATE_TTS_LANGUAGE") {
        config.tts.language = language;
    }

    if let Some(binary) = env("VOICEGATE_STT_BINARY") {
        config.stt.runtime_binary = binary.into();
    }
    if let Some(model) = env("VOICEGATE_STT_MODEL_NAME") {
        config.stt.model_name = model;
    }
    if let Some(device) = env("VOICEGATE_STT_DEVICE") {
        config.stt.device = device;
    }
    if let Some(compute_type) = env("VOICEGATE_STT_COMPUTE_TYPE") {
        config.stt.compute_type = compute_type;
    }
    if let Some(beam_size) = env("VOICEGATE_STT_BEAM_SIZE") {
        config.stt.beam_size = parse_var("VOICEGATE_STT_BEAM_SIZE", beam_size)?;
    }
    if let Some(best_of) = env("VOICEGATE_STT_BEST_OF") {
        config.stt.best_of = parse_var("VOICEGATE_STT_BEST_OF", best_of)?;
    }
    if let Some(vad) = env("VOICEGATE_STT_VAD_FILTER") {
        config.stt.vad_filter = parse_bool("VOICEGATE_STT_VAD_FILTER", vad)?;
    }

    if let Some(dir) = env("VOICEGATE_VOICES_DIR") {
        config.voices.directory = dir.into();
    }

    if let Some(requests) = env("VOICEGATE_RATE_LIMIT_REQUESTS") {
        config.rate_limit.requests = parse_var("VOICEGATE_RATE_LIMIT_REQUESTS", requests)?;
    }
    if let Some(window) = env("VOICEGATE_RATE_LIMIT_WINDOW_SECONDS") {
        config.rate_limit.window_seconds =
            parse_var("VOICEGATE_RATE_LIMIT_WINDOW_SECONDS", window)?;
    }

    if let Some(level) = env("VOICEGATE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env("VOICEGATE_LOG_JSON") {
        config.logging.json = parse_bool("VOICEGATE_LOG_JSON", json)?;
    }

    Ok(())
}

impl Config {
    /// Checks required settings and ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tts.base_model_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing("tts.base_model_path"));
        }
        if self.tts.voice_design_model_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing("tts.voice_design_model_path"));
        }
        if self.rate_limit.requests == 0 {
            return Err(ConfigError::Invalid {
                field: "rate_limit.requests",
                reason: "must be at least 1",
            });
        }
        if self.rate_limit.window_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "rate_limit.window_seconds",
                reason: "must be at least 1",
            });
        }
        if self.stt.beam_size == 0 {
            return Err(ConfigError::Invalid {
                field: "stt.beam_size",
                reason: "must be at least 1",
            });
        }
        if self.stt.best_of == 0 {
            return Err(ConfigError::Invalid {
                field: "stt.best_of",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}
