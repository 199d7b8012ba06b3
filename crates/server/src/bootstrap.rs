use std::sync::Arc;

use kiosk_agent::{
    DisabledTranscriber, Extractor, LlmExtractor, OpenAiCompatibleClient, OrderRuntime,
    RuleBasedExtractor, Transcriber, WhisperTranscriber,
};
use kiosk_core::config::{AppConfig, ConfigError, ExtractionStrategy};
use kiosk_core::{SlotResolver, VocabularyError};
use kiosk_db::{connect_with_settings, migrations, DbPool, OrderRepository, SqlOrderRepository};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runtime: Arc<OrderRuntime>,
    pub orders: Arc<dyn OrderRepository>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("menu vocabulary could not be loaded: {0}")]
    Vocabulary(#[from] VocabularyError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("{collaborator} client could not be built: {message}")]
    Collaborator { collaborator: &'static str, message: String },
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        strategy = config.extraction.strategy.as_str(),
        "starting application bootstrap"
    );

    let runtime = Arc::new(build_runtime(&config)?);

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let orders: Arc<dyn OrderRepository> = Arc::new(SqlOrderRepository::new(db_pool.clone()));
    Ok(Application { config, db_pool, runtime, orders })
}

/// Wires the extractor and transcriber selected by `config`.
pub fn build_runtime(config: &AppConfig) -> Result<OrderRuntime, BootstrapError> {
    let vocabulary = Arc::new(config.menu.load_vocabulary()?);
    info!(
        event_name = "system.bootstrap.vocabulary_loaded",
        correlation_id = "bootstrap",
        source = %config
            .menu
            .path
            .as_ref()
            .map_or_else(|| "built-in".to_string(), |path| path.display().to_string()),
        mains = vocabulary.mains().len(),
        "menu vocabulary loaded"
    );
    let resolver = SlotResolver::new(vocabulary, config.matching.thresholds());

    let extractor: Arc<dyn Extractor> = match config.extraction.strategy {
        ExtractionStrategy::RuleBased => Arc::new(RuleBasedExtractor::new(resolver)),
        ExtractionStrategy::Llm => {
            let client = OpenAiCompatibleClient::from_config(&config.llm).map_err(|error| {
                BootstrapError::Collaborator { collaborator: "llm", message: error.to_string() }
            })?;
            Arc::new(LlmExtractor::new(Arc::new(client), resolver))
        }
    };

    let transcriber: Arc<dyn Transcriber> = if config.transcription.enabled {
        let whisper = WhisperTranscriber::from_config(&config.transcription).map_err(|error| {
            BootstrapError::Collaborator {
                collaborator: "transcription",
                message: error.to_string(),
            }
        })?;
        Arc::new(whisper)
    } else {
        Arc::new(DisabledTranscriber)
    };

    Ok(OrderRuntime::new(extractor, transcriber))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use kiosk_core::config::{
        AppConfig, ConfigOverrides, ExtractionStrategy, LlmProvider, LoadOptions,
    };

    use crate::bootstrap::{bootstrap_with_config, build_runtime, Application, BootstrapError};

    fn overrides(database_url: &str) -> ConfigOverrides {
        ConfigOverrides {
            database_url: Some(database_url.to_string()),
            ..ConfigOverrides::default()
        }
    }

    async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?).await
    }

    #[tokio::test]
    async fn bootstrap_wires_rule_based_runtime_and_store() {
        let app = bootstrap(LoadOptions {
            overrides: overrides("sqlite::memory:"),
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed with defaults");

        assert_eq!(app.runtime.strategy(), "rule_based");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'orders'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("orders table is available after bootstrap");
        assert_eq!(table_count, 1);

        assert!(app.orders.list_recent(5).await.expect("list").is_empty());
        app.db_pool.close().await;
    }

    #[test]
    fn runtime_follows_extraction_strategy() {
        let mut config = AppConfig::load(LoadOptions {
            overrides: overrides("sqlite::memory:"),
            ..LoadOptions::default()
        })
        .expect("default config");
        config.extraction.strategy = ExtractionStrategy::Llm;
        config.llm.provider = LlmProvider::Ollama;

        let runtime = build_runtime(&config).expect("ollama client builds without a key");
        assert_eq!(runtime.strategy(), "llm");
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_unreadable_menu_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"mains = [").expect("write broken menu");

        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                menu_path: Some(file.path().to_path_buf()),
                ..overrides("sqlite::memory:")
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(matches!(result, Err(BootstrapError::Vocabulary(_))));
    }
}
