mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{EngineSettings, ServerSettings, Settings};

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct containing the server and engine configurations
pub fn load_config() -> Result<Settings, ConfigError> {
    // A double-underscore separator keeps multi-word keys such as
    // `engine.outbound_queue_capacity` addressable from the environment
    // (`ENGINE__OUTBOUND_QUEUE_CAPACITY`); `try_parsing` converts the string
    // values env vars arrive as into the typed fields.
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::default().separator("__").try_parsing(true));

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();

    Ok(Settings {
        server: ServerSettings {
            host: partial
                .server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: partial
                .server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
        },
        engine: EngineSettings {
            outbound_queue_capacity: partial
                .engine
                .as_ref()
                .and_then(|e| e.outbound_queue_capacity)
                .unwrap_or(default.engine.outbound_queue_capacity),
            log_level: partial
                .engine
                .as_ref()
                .and_then(|e| e.log_level.clone())
                .unwrap_or(default.engine.log_level),
        },
    })
}

#[cfg(test)]
mod tests;
