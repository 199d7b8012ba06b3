use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use kiosk_core::config::{AppConfig, LoadOptions};
use toml::Value;

use crate::commands::CommandResult;

struct Field {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult::success("config", lines.join("\n"))
}

fn effective_fields(config: &AppConfig) -> Vec<Field> {
    let field = |key_path: &'static str, value: String, env_keys: &'static [&'static str]| {
        Field { key_path, value, env_keys }
    };

    vec![
        field("database.url", config.database.url.clone(), &["KIOSK_DATABASE_URL"]),
        field(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["KIOSK_DATABASE_MAX_CONNECTIONS"],
        ),
        field(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["KIOSK_DATABASE_TIMEOUT_SECS"],
        ),
        field(
            "menu.path",
            config
                .menu
                .path
                .as_ref()
                .map_or_else(|| "<built-in>".to_string(), |path| path.display().to_string()),
            &["KIOSK_MENU_PATH"],
        ),
        field(
            "matching.confident_threshold",
            config.matching.confident_threshold.to_string(),
            &["KIOSK_MATCHING_CONFIDENT_THRESHOLD"],
        ),
        field(
            "matching.tentative_threshold",
            config.matching.tentative_threshold.to_string(),
            &["KIOSK_MATCHING_TENTATIVE_THRESHOLD"],
        ),
        field(
            "extraction.strategy",
            config.extraction.strategy.as_str().to_string(),
            &["KIOSK_EXTRACTION_STRATEGY"],
        ),
        field("llm.provider", format!("{:?}", config.llm.provider), &["KIOSK_LLM_PROVIDER"]),
        field("llm.model", config.llm.model.clone(), &["KIOSK_LLM_MODEL"]),
        field("llm.base_url", config.llm.endpoint_base().to_string(), &["KIOSK_LLM_BASE_URL"]),
        field("llm.api_key", redact(config.llm.api_key.is_some()), &["KIOSK_LLM_API_KEY"]),
        field(
            "transcription.enabled",
            config.transcription.enabled.to_string(),
            &["KIOSK_TRANSCRIPTION_ENABLED"],
        ),
        field(
            "transcription.base_url",
            config.transcription.base_url.clone(),
            &["KIOSK_TRANSCRIPTION_BASE_URL"],
        ),
        field(
            "transcription.model",
            config.transcription.model.clone(),
            &["KIOSK_TRANSCRIPTION_MODEL"],
        ),
        field(
            "transcription.api_key",
            redact(config.transcription.api_key.is_some()),
            &["KIOSK_TRANSCRIPTION_API_KEY"],
        ),
        field(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["KIOSK_SERVER_BIND_ADDRESS"],
        ),
        field("server.port", config.server.port.to_string(), &["KIOSK_SERVER_PORT"]),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["KIOSK_LOGGING_LEVEL", "KIOSK_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["KIOSK_LOGGING_FORMAT", "KIOSK_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    ["kiosk.toml", "config/kiosk.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact(present: bool) -> String {
    let shown = if present { "<redacted>" } else { "<unset>" };
    shown.to_string()
}
