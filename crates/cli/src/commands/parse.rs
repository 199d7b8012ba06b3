use std::sync::Arc;

use kiosk_core::config::{AppConfig, LoadOptions};
use kiosk_core::SlotResolver;

use crate::commands::CommandResult;

pub fn run(text: &str, json: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "parse",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let vocabulary = match config.menu.load_vocabulary() {
        Ok(vocabulary) => vocabulary,
        Err(error) => {
            return CommandResult::failure(
                "parse",
                "menu_vocabulary",
                format!("menu could not be loaded: {error}"),
                3,
            );
        }
    };

    let resolver = SlotResolver::new(Arc::new(vocabulary), config.matching.thresholds());
    let result = resolver.resolve(text);

    if json {
        return match serde_json::to_string(&result) {
            Ok(output) => CommandResult::document(output),
            Err(error) => CommandResult::failure("parse", "serialization", error.to_string(), 4),
        };
    }

    let message = if result.missing.is_empty() {
        result.summary
    } else {
        let missing: Vec<&str> = result.missing.iter().map(|slot| slot.as_str()).collect();
        format!("{} (missing: {})", result.summary, missing.join(", "))
    };
    CommandResult::success("parse", message)
}
