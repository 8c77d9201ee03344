//! `ntfy-e2e subscribe`.

use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::client::{NtfyClient, Subscription};
use crate::config::Config;
use crate::error::Error;
use crate::message::{Message, SubscribeOptions};

/// Arguments of one subscribe invocation.
#[derive(Debug, Clone, Default)]
pub struct SubscribeArgs {
    /// Topic name, `host/topic` or full URL.
    pub topic: String,
    /// Print cached messages and exit instead of streaming.
    pub poll: bool,
    /// Print the JSON lines as received.
    pub raw: bool,
    /// Return cached messages since a Unix time, duration, ID or `all`.
    pub since: Option<String>,
    /// Also return scheduled messages.
    pub scheduled: bool,
    /// `username[:password]`, overrides the configured user.
    pub user: Option<String>,
}

impl SubscribeArgs {
    /// Query filters carried by these arguments.
    pub fn options(&self) -> SubscribeOptions {
        SubscribeOptions {
            since: self.since.clone(),
            scheduled: self.scheduled,
        }
    }
}

/// One output line for a message event.
///
/// Encrypted bodies are printed as-is with an `[encrypted] ` prefix; this
/// tool does not decrypt.
pub fn format_message(message: &Message) -> String {
    let body = message.message.as_deref().unwrap_or_default();
    let body = if message.is_encrypted() {
        format!("[encrypted] {}", body)
    } else {
        body.to_string()
    };

    match &message.title {
        Some(title) if !message.is_encrypted() => format!("{}: {}", title, body),
        _ => body,
    }
}

/// Writes every line of `subscription` to `out` until the server closes it.
///
/// Lines that are not UTF-8 or (outside raw mode) not message JSON are
/// logged and skipped. Other read errors end the stream.
pub fn print_stream(subscription: &mut Subscription, raw: bool, out: &mut impl Write) -> Result<()> {
    while let Some(line) = subscription.next_raw() {
        let line = match line {
            Ok(line) => line,
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                log::warn!("Skipping undecodable line: {}", e);
                continue;
            }
            Err(e) => return Err(e).context("Subscription stream failed"),
        };

        if raw {
            writeln!(out, "{}", line)?;
            continue;
        }

        match serde_json::from_str::<Message>(&line) {
            Ok(message) if message.is_message() => writeln!(out, "{}", format_message(&message))?,
            Ok(_) => {}
            Err(e) => log::warn!("Skipping unparsable line ({}): {}", e, line),
        }
    }
    Ok(())
}

/// Runs `ntfy-e2e subscribe`.
pub fn run(config: &Config, args: &SubscribeArgs) -> Result<()> {
    let mut config = config.clone();
    if args.user.is_some() {
        config.user = args.user.clone();
    }
    let client = NtfyClient::from_config(&config)?;
    let topic_url = client.topic_url(&args.topic);
    let options = args.options();
    let mut out = io::stdout().lock();

    if args.poll {
        let messages = client
            .poll_with(&args.topic, &options)
            .with_context(|| format!("Failed to poll {}", topic_url))?;
        for message in &messages {
            if args.raw {
                writeln!(out, "{}", serde_json::to_string(message)?)?;
            } else {
                writeln!(out, "{}", format_message(message))?;
            }
        }
        return Ok(());
    }

    let mut subscription = client
        .subscribe_with(&args.topic, &options)
        .with_context(|| format!("Failed to subscribe to {}", topic_url))?;
    log::info!("Subscribed to {}", subscription.topic_url());

    print_stream(&mut subscription, args.raw, &mut out)?;

    log::info!("Server closed the subscription to {}", topic_url);
    Ok(())
}
