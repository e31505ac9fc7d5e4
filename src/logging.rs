//! Log output.
//!
//! Messages go to stderr unless a log file is given. Without a level flag the
//! level defaults to warnings, and `RUST_LOG` may override it. A log format
//! such as `{timestamp} {level} {message}` replaces env_logger's own layout.

use crate::config::Template;
use anyhow::{Context, Result};
use env_logger::{Builder, Target, WriteStyle};
use log::{LevelFilter, Record};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

const PLACEHOLDERS: &[&str] = &["timestamp", "level", "target", "message"];

/// The layout of a log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogFormat(Template);

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let template: Template = s.parse()?;
        if let Some(unknown) = template.columns().find(|c| !PLACEHOLDERS.contains(c)) {
            return Err(format!(
                "unknown placeholder '{{{unknown}}}', expected one of {}",
                PLACEHOLDERS
                    .iter()
                    .map(|p| format!("{{{p}}}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        Ok(LogFormat(template))
    }
}

impl LogFormat {
    fn line(&self, timestamp: &str, record: &Record<'_>) -> String {
        let level = record.level().to_string();
        let message = record.args().to_string();
        self.0.render_with(|placeholder| match placeholder {
            "timestamp" => Some(timestamp),
            "level" => Some(level.as_str()),
            "target" => Some(record.target()),
            "message" => Some(message.as_str()),
            _ => None,
        })
    }
}

pub fn init(
    level: Option<LevelFilter>,
    logfile: Option<&Path>,
    format: Option<LogFormat>,
) -> Result<()> {
    let mut builder = Builder::new();
    match level {
        Some(level) => {
            builder.filter_level(level);
        }
        None => {
            builder.filter_level(LevelFilter::Warn).parse_default_env();
        }
    }

    if let Some(format) = format {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp().to_string();
            writeln!(buf, "{}", format.line(&timestamp, record))
        });
    }

    if let Some(path) = logfile {
        let file = File::options()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder
            .target(Target::Pipe(Box::new(file)))
            .write_style(WriteStyle::Never);
    }

    builder
        .try_init()
        .with_context(|| "Failed to initialise logging")
}
