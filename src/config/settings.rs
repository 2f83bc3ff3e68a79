use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for both the listener and the broadcast engine.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub engine: EngineSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the WebSocket listener will bind to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the broadcast engine.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineSettings {
    /// Bound on each session's outbound queue. When a session falls this far
    /// behind, newer updates for it are dropped rather than blocking fan-out.
    pub outbound_queue_capacity: usize,
    pub log_level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled
/// using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub engine: Option<PartialEngineSettings>,
}

/// Partial server settings.
#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Partial engine settings.
#[derive(Debug, Deserialize)]
pub struct PartialEngineSettings {
    pub outbound_queue_capacity: Option<usize>,
    pub log_level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            engine: EngineSettings {
                outbound_queue_capacity: 256,
                log_level: "info".to_string(),
            },
        }
    }
}
