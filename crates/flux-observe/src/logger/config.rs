use std::{env, io::IsTerminal};

use crate::logger::{error::LoggerError, format::LoggerFormat};

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `info` or `flux_ingest=debug,info`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}

impl LoggerConfig {
    /// Defaults overridden by `<prefix>_LOG_FORMAT` and `<prefix>_LOG_LEVEL`.
    pub fn from_env(prefix: &str) -> Result<Self, LoggerError> {
        Self::from_lookup(prefix, |key| env::var(key).ok())
    }

    fn from_lookup(
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LoggerError> {
        let mut cfg = Self::default();
        if let Some(format) = lookup(&format!("{prefix}_LOG_FORMAT")) {
            cfg.format = format.parse()?;
        }
        if let Some(level) = lookup(&format!("{prefix}_LOG_LEVEL")) {
            cfg.level = level;
        }
        if cfg.format != LoggerFormat::Text {
            cfg.use_color = false;
        }
        Ok(cfg)
    }
}
