//! HTTP listener configuration, layered defaults + prefixed environment

use serde::Deserialize;

/// Where a service binds
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Load from `<PREFIX>_HOST` / `<PREFIX>_PORT`, falling back to
    /// `0.0.0.0:<default_port>`.
    pub fn load(prefix: &str, default_port: u16) -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", i64::from(default_port))?
            .add_source(::config::Environment::with_prefix(prefix).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
