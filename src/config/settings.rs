use serde::Deserialize;

use crate::broker::DEFAULT_TOPICS;

/// Top-level configuration settings for the application.
///
/// Includes settings for the listener, the message broker and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub log: LogSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the server will bind to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the broker.
///
/// Caps concurrent connections and lists the topics that exist at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    pub max_connections: usize,
    pub topics: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Every field is optional; `resolve` fills the gaps from the defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub max_connections: Option<usize>,
    pub topics: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl PartialSettings {
    /// Fill every missing value from `Settings::default()`.
    pub fn resolve(self) -> Settings {
        let defaults = Settings::default();
        Settings {
            server: match self.server {
                Some(partial) => partial.merge(defaults.server),
                None => defaults.server,
            },
            broker: match self.broker {
                Some(partial) => partial.merge(defaults.broker),
                None => defaults.broker,
            },
            log: match self.log {
                Some(partial) => partial.merge(defaults.log),
                None => defaults.log,
            },
        }
    }
}

impl PartialServerSettings {
    fn merge(self, defaults: ServerSettings) -> ServerSettings {
        ServerSettings {
            host: self.host.unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
        }
    }
}

impl PartialBrokerSettings {
    fn merge(self, defaults: BrokerSettings) -> BrokerSettings {
        BrokerSettings {
            max_connections: self.max_connections.unwrap_or(defaults.max_connections),
            topics: self.topics.unwrap_or(defaults.topics),
        }
    }
}

impl PartialLogSettings {
    fn merge(self, defaults: LogSettings) -> LogSettings {
        LogSettings {
            level: self.level.unwrap_or(defaults.level),
        }
    }
}

impl Settings {
    /// `host:port` the listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Provides default values for `Settings`.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8092,
            },
            broker: BrokerSettings {
                max_connections: 1000,
                topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}
