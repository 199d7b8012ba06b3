use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::vocabulary::{Vocabulary, VocabularyError};
use crate::slots::fuzzy::{
    MatchThresholds, DEFAULT_CONFIDENT_THRESHOLD, DEFAULT_TENTATIVE_THRESHOLD,
};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub menu: MenuConfig,
    pub matching: MatchingConfig,
    pub extraction: ExtractionConfig,
    pub llm: LlmConfig,
    pub transcription: TranscriptionConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Default)]
pub struct MenuConfig {
    /// Vocabulary file (TOML or JSON). The built-in menu is used when unset.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug)]
pub struct MatchingConfig {
    pub confident_threshold: u8,
    pub tentative_threshold: u8,
}

#[derive(Clone, Copy, Debug)]
pub struct ExtractionConfig {
    pub strategy: ExtractionStrategy,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct TranscriptionConfig {
    pub enabled: bool,
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    RuleBased,
    Llm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub menu_path: Option<PathBuf>,
    pub extraction_strategy: Option<ExtractionStrategy>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://kiosk.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            menu: MenuConfig::default(),
            matching: MatchingConfig {
                confident_threshold: DEFAULT_CONFIDENT_THRESHOLD,
                tentative_threshold: DEFAULT_TENTATIVE_THRESHOLD,
            },
            extraction: ExtractionConfig { strategy: ExtractionStrategy::RuleBased },
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            transcription: TranscriptionConfig {
                enabled: false,
                api_key: None,
                base_url: "https://api.openai.com".to_string(),
                model: "whisper-1".to_string(),
                timeout_secs: 60,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for ExtractionStrategy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rule_based" | "rules" => Ok(Self::RuleBased),
            "llm" => Ok(Self::Llm),
            other => Err(ConfigError::Validation(format!(
                "unsupported extraction strategy `{other}` (expected rule_based|llm)"
            ))),
        }
    }
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuleBased => "rule_based",
            Self::Llm => "llm",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl MenuConfig {
    pub fn load_vocabulary(&self) -> Result<Vocabulary, VocabularyError> {
        match &self.path {
            Some(path) => Vocabulary::from_path(path),
            None => Ok(Vocabulary::kiosk_default()),
        }
    }
}

impl MatchingConfig {
    pub fn thresholds(&self) -> MatchThresholds {
        MatchThresholds {
            confident: self.confident_threshold,
            tentative: self.tentative_threshold,
        }
    }
}

impl LlmConfig {
    /// Base URL of the OpenAI-compatible endpoint for the configured provider.
    pub fn endpoint_base(&self) -> &str {
        match (&self.base_url, self.provider) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, LlmProvider::OpenAi) => "https://api.openai.com",
            (None, LlmProvider::Ollama) => "http://localhost:11434",
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("kiosk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(menu) = patch.menu {
            if let Some(path) = menu.path {
                self.menu.path = Some(path);
            }
        }

        if let Some(matching) = patch.matching {
            if let Some(confident) = matching.confident_threshold {
                self.matching.confident_threshold = confident;
            }
            if let Some(tentative) = matching.tentative_threshold {
                self.matching.tentative_threshold = tentative;
            }
        }

        if let Some(extraction) = patch.extraction {
            if let Some(strategy) = extraction.strategy {
                self.extraction.strategy = strategy;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(transcription) = patch.transcription {
            if let Some(enabled) = transcription.enabled {
                self.transcription.enabled = enabled;
            }
            if let Some(stt_api_key_value) = transcription.api_key {
                self.transcription.api_key = Some(secret_value(stt_api_key_value));
            }
            if let Some(base_url) = transcription.base_url {
                self.transcription.base_url = base_url;
            }
            if let Some(model) = transcription.model {
                self.transcription.model = model;
            }
            if let Some(timeout_secs) = transcription.timeout_secs {
                self.transcription.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("KIOSK_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("KIOSK_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("KIOSK_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("KIOSK_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("KIOSK_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("KIOSK_MENU_PATH") {
            self.menu.path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("KIOSK_MATCHING_CONFIDENT_THRESHOLD") {
            self.matching.confident_threshold =
                parse_u8("KIOSK_MATCHING_CONFIDENT_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("KIOSK_MATCHING_TENTATIVE_THRESHOLD") {
            self.matching.tentative_threshold =
                parse_u8("KIOSK_MATCHING_TENTATIVE_THRESHOLD", &value)?;
        }

        if let Some(value) = read_env("KIOSK_EXTRACTION_STRATEGY") {
            self.extraction.strategy = value.parse()?;
        }

        if let Some(value) = read_env("KIOSK_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("KIOSK_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("KIOSK_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("KIOSK_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("KIOSK_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("KIOSK_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("KIOSK_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("KIOSK_LLM_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("KIOSK_TRANSCRIPTION_ENABLED") {
            self.transcription.enabled = parse_bool("KIOSK_TRANSCRIPTION_ENABLED", &value)?;
        }
        if let Some(value) = read_env("KIOSK_TRANSCRIPTION_API_KEY") {
            self.transcription.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("KIOSK_TRANSCRIPTION_BASE_URL") {
            self.transcription.base_url = value;
        }
        if let Some(value) = read_env("KIOSK_TRANSCRIPTION_MODEL") {
            self.transcription.model = value;
        }
        if let Some(value) = read_env("KIOSK_TRANSCRIPTION_TIMEOUT_SECS") {
            self.transcription.timeout_secs =
                parse_u64("KIOSK_TRANSCRIPTION_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("KIOSK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("KIOSK_SERVER_PORT") {
            self.server.port = parse_u16("KIOSK_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("KIOSK_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("KIOSK_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("KIOSK_LOGGING_LEVEL").or_else(|| read_env("KIOSK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("KIOSK_LOGGING_FORMAT").or_else(|| read_env("KIOSK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(menu_path) = overrides.menu_path {
            self.menu.path = Some(menu_path);
        }
        if let Some(strategy) = overrides.extraction_strategy {
            self.extraction.strategy = strategy;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_menu(&self.menu)?;
        validate_matching(&self.matching)?;
        if self.extraction.strategy == ExtractionStrategy::Llm {
            validate_llm(&self.llm)?;
        }
        validate_transcription(&self.transcription)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("kiosk.toml"), PathBuf::from("config/kiosk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_menu(menu: &MenuConfig) -> Result<(), ConfigError> {
    if let Some(path) = &menu.path {
        if !path.exists() {
            return Err(ConfigError::Validation(format!(
                "menu.path `{}` does not exist",
                path.display()
            )));
        }
    }
    Ok(())
}

fn validate_matching(matching: &MatchingConfig) -> Result<(), ConfigError> {
    let valid = matching.tentative_threshold > 0
        && matching.tentative_threshold <= matching.confident_threshold
        && matching.confident_threshold <= 100;
    if !valid {
        return Err(ConfigError::Validation(
            "matching thresholds must satisfy 0 < tentative_threshold <= confident_threshold <= 100"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    match llm.provider {
        LlmProvider::OpenAi => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for the openai provider".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for ollama provider".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_transcription(transcription: &TranscriptionConfig) -> Result<(), ConfigError> {
    if !transcription.enabled {
        return Ok(());
    }

    let missing_key = transcription
        .api_key
        .as_ref()
        .map(|value| value.expose_secret().trim().is_empty())
        .unwrap_or(true);
    if missing_key {
        return Err(ConfigError::Validation(
            "transcription.api_key is required when transcription is enabled".to_string(),
        ));
    }

    let base_url = transcription.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "transcription.base_url must start with http:// or https://".to_string(),
        ));
    }

    if transcription.timeout_secs == 0 || transcription.timeout_secs > 600 {
        return Err(ConfigError::Validation(
            "transcription.timeout_secs must be in range 1..=600".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.parse::<u8>().map_err(|_| invalid_override(key, value))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    menu: Option<MenuPatch>,
    matching: Option<MatchingPatch>,
    extraction: Option<ExtractionPatch>,
    llm: Option<LlmPatch>,
    transcription: Option<TranscriptionPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MenuPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct MatchingPatch {
    confident_threshold: Option<u8>,
    tentative_threshold: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtractionPatch {
    strategy: Option<ExtractionStrategy>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct TranscriptionPatch {
    enabled: Option<bool>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
