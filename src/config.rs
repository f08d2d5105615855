use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::http::request::ReadLimits;
use crate::server::DispatchStrategy;

pub const DEFAULT_PORT: u16 = 2222;

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum LogSink {
    #[default]
    Stdout,
    Stderr,
    File(PathBuf),
}

impl From<String> for LogSink {
    fn from(s: String) -> Self {
        match s.as_str() {
            "stdout" | "-" => LogSink::Stdout,
            "stderr" => LogSink::Stderr,
            _ => LogSink::File(PathBuf::from(s)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_address: IpAddr,
    pub port: u16,
    pub dispatch: DispatchStrategy,
    pub log_sink: LogSink,
    pub log_level: String,
    #[serde(with = "crate::http::request::millis")]
    pub poll_interval: Duration,
    pub limits: ReadLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            dispatch: DispatchStrategy::default(),
            log_sink: LogSink::default(),
            log_level: "info".to_string(),
            poll_interval: Duration::from_millis(1000),
            limits: ReadLimits::default(),
        }
    }
}

impl Config {
    /// Defaults, then the YAML file named by `CONFIG`, then `PORT`, `BIND`,
    /// `DISPATCH`, `LOG_SINK` and `LOG_LEVEL` from the environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = match var("CONFIG") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(port) = var("PORT") {
            cfg.port = port.parse().with_context(|| format!("invalid PORT {port:?}"))?;
        }
        if let Some(bind) = var("BIND") {
            cfg.bind_address = bind.parse().with_context(|| format!("invalid BIND {bind:?}"))?;
        }
        if let Some(dispatch) = var("DISPATCH") {
            cfg.dispatch = dispatch.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(sink) = var("LOG_SINK") {
            cfg.log_sink = LogSink::from(sink);
        }
        if let Some(level) = var("LOG_LEVEL") {
            cfg.log_level = level;
        }

        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}
