use std::fmt::Display;

use log::Level;
use teloxide::{
    payloads::SendMessageSetters,
    requests::Requester,
    types::{ChatId, ParseMode},
    utils::markdown::code_block_with_lang,
    Bot,
};
use tokio::sync::mpsc::Receiver;

use common::LogError;

pub(crate) async fn start_tg_logs_job(bot: Bot, chat_id: ChatId, mut rx: Receiver<LogMessage>) {
    while let Some(text) = rx.recv().await {
        bot.send_message(chat_id, text.to_string())
            .parse_mode(ParseMode::MarkdownV2)
            .await
            .log_error_msg("failed to send log");
    }
}

/// One record formatted for the log chat. Rendered as a code block, so
/// the text needs no markdown escaping.
#[derive(Debug)]
pub(crate) struct LogMessage(String);

impl LogMessage {
    pub(crate) fn record(
        level: Level,
        s: impl Into<String>,
        target: &str,
        file: Option<&str>,
        line: Option<u32>,
    ) -> Self {
        let mut msg = format!("[{level}] {}\n        at {target}", s.into());
        if let Some(file) = file {
            msg += &format!(": {file}");
            if let Some(line) = line {
                msg += &format!(":{line}");
            }
        }
        Self(msg)
    }
}

impl Display for LogMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        code_block_with_lang(&self.0, "log").fmt(f)
    }
}
