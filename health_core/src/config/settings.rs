use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub application: ApplicationConfig,
    pub checks: CheckConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Identity reported in the `application` block of every health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub name: String,
    /// Empty means "ask the operating system".
    pub hostname: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Run checks in parallel instead of one after another.
    pub concurrent: bool,
    /// Per-check timeout for the built-in checks; 0 disables it.
    pub timeout_ms: u64,
    pub memory_threshold_percent: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "health-server".to_string(),
            hostname: String::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            concurrent: false,
            timeout_ms: 5000,
            memory_threshold_percent: 95.0,
        }
    }
}

impl AppConfig {
    /// Defaults, then `config.toml` when present, then `APP_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Path::new("config.toml");
        Self::load_from(path.exists().then_some(path))
    }

    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if let Some(file) = file {
            builder = builder.add_source(File::from(file));
        }

        // APP_CHECKS__TIMEOUT_MS=250 -> checks.timeout_ms
        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.application.name.trim().is_empty() {
            return Err(ConfigError::Message(
                "Application name cannot be empty".to_string(),
            ));
        }

        let threshold = self.checks.memory_threshold_percent;
        if !(threshold > 0.0 && threshold <= 100.0) {
            return Err(ConfigError::Message(format!(
                "Memory threshold must be within (0, 100], got {}",
                threshold
            )));
        }

        if self.checks.timeout_ms == 0 {
            tracing::warn!("Check timeout disabled - a hung check will block health reports");
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
