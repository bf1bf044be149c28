use std::thread;

use log::{Level, Metadata, Record};
use simplelog::SharedLogger;
use tokio::sync::mpsc::Sender;

use crate::handlers::tg_logs::LogMessage;

/// Forwards records to the telegram log chat. Errors always go through;
/// lower levels only when the record carries a `tg = true` key-value flag.
#[derive(Debug)]
pub(crate) struct TgLogger {
    sender: Sender<LogMessage>,
    config: Config,
}

impl TgLogger {
    pub(crate) fn new(sx: Sender<LogMessage>, config: Config) -> Box<Self> {
        Box::new(Self { sender: sx, config })
    }

    fn forced(record: &Record) -> bool {
        record
            .key_values()
            .get("tg".into())
            .and_then(|v| v.to_bool())
            .unwrap_or(false)
    }
}

impl log::Log for TgLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Error
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) && !Self::forced(record) {
            return;
        }
        let text = record.args().to_string();
        if self.config.ignores.iter().any(|i| text.contains(i)) {
            return;
        }
        let msg = LogMessage::record(
            record.level(),
            text,
            record.target(),
            record.file(),
            record.line(),
        );
        thread::scope(|s| {
            s.spawn(|| {
                let _ = self.sender.blocking_send(msg);
            });
        });
    }

    fn flush(&self) {}
}

impl SharedLogger for TgLogger {
    fn level(&self) -> log::LevelFilter {
        // lets flagged info records reach log(), enabled() still caps the rest
        log::LevelFilter::Info
    }

    fn config(&self) -> Option<&simplelog::Config> {
        None
    }

    fn as_log(self: Box<Self>) -> Box<dyn log::Log> {
        Box::new(*self)
    }
}

/// Substrings that should never be forwarded, e.g. polling noise
/// when two dev instances fight over getUpdates.
#[derive(Debug, Default, Clone)]
pub(crate) struct Config {
    ignores: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct ConfigBuilder(Config);

impl ConfigBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_ignore(mut self, pattern: &str) -> Self {
        self.0.ignores.push(pattern.to_string());
        self
    }

    pub(crate) fn build(self) -> Config {
        self.0
    }
}
