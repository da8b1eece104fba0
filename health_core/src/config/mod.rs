pub mod settings;

pub use settings::{AppConfig, ApplicationConfig, CheckConfig, ServerConfig};
