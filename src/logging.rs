//! Log subscriber setup.
//!
//! Forked workers inherit the sink; their lines may interleave.

use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::LogSink;

pub fn init(sink: &LogSink, level: &str) -> anyhow::Result<()> {
    let level = Level::from_str(level).with_context(|| format!("invalid log level {level:?}"))?;

    let writer = match sink {
        LogSink::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogSink::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogSink::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
    };

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level)
        .with_writer(writer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}
