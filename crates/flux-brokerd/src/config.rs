use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};

use flux_ingest::{IngestConfig, InstanceConfig};
use flux_model::UserId;
use flux_observe::LoggerConfig;

const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";

/// Daemon settings, read from `FLUX_*` environment variables.
///
/// - `FLUX_HTTP_ADDR` - listen address (default `127.0.0.1:8080`)
/// - `FLUX_OWNER_UID` - instance owner (default: the daemon's uid)
/// - `FLUX_BATCH_TIMEOUT_MS` - ingest batch window (default 10)
/// - `FLUX_GENERATOR_ID` - job id generator (default 0)
/// - `FLUX_LOG_FORMAT`, `FLUX_LOG_LEVEL` - see [`LoggerConfig::from_env`]
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub http_addr: SocketAddr,
    pub instance: InstanceConfig,
    pub logger: LoggerConfig,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        let logger = LoggerConfig::from_env("FLUX")?;
        let mut cfg = Self::from_lookup(|key| env::var(key).ok())?;
        cfg.logger = logger;
        Ok(cfg)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let http_addr = lookup("FLUX_HTTP_ADDR")
            .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string())
            .parse()
            .context("FLUX_HTTP_ADDR")?;

        let owner_userid = match parse::<UserId>(&lookup, "FLUX_OWNER_UID")? {
            Some(uid) => uid,
            // SAFETY: getuid has no preconditions and cannot fail.
            None => unsafe { libc::getuid() },
        };

        let mut ingest = IngestConfig::default();
        if let Some(ms) = parse::<u64>(&lookup, "FLUX_BATCH_TIMEOUT_MS")? {
            ingest.batch_timeout = Duration::from_millis(ms);
        }
        if let Some(id) = parse::<u16>(&lookup, "FLUX_GENERATOR_ID")? {
            ingest.generator_id = id;
        }

        Ok(Self {
            http_addr,
            instance: InstanceConfig {
                owner_userid,
                ingest,
            },
            logger: LoggerConfig::default(),
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|v| v.trim().parse::<T>().with_context(|| format!("{key}={v}")))
        .transpose()
}
