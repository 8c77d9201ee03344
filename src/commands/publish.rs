//! `ntfy-e2e publish`.
//!
//! ```bash
//! # Plain
//! ntfy-e2e publish --title "Backup" --tags warning mytopic "Backup failed"
//!
//! # Encrypted (title and tags move inside the envelope)
//! NTFY_PASSWORD=hunter2 ntfy-e2e publish --title "Backup" mytopic "Backup failed"
//! ```

use anyhow::{Context, Result};

use crate::client::NtfyClient;
use crate::config::Config;
use crate::message::{Message, MessagePayload, Priority, PublishOptions};

/// Arguments of one publish invocation.
#[derive(Debug, Clone, Default)]
pub struct PublishArgs {
    /// Topic name, `host/topic` or full URL.
    pub topic: String,
    /// Message body.
    pub message: String,
    /// Overrides the configured password.
    pub password: Option<String>,
    /// Notification title.
    pub title: Option<String>,
    /// Message priority.
    pub priority: Option<Priority>,
    /// Comma-separated tags.
    pub tags: Option<String>,
    /// URL opened on click.
    pub click: Option<String>,
    /// Scheduled delivery.
    pub delay: Option<String>,
    /// Notification icon URL.
    pub icon: Option<String>,
    /// External attachment URL.
    pub attach: Option<String>,
    /// Attachment file name.
    pub filename: Option<String>,
    /// Also send to this e-mail address.
    pub email: Option<String>,
    /// Render the body as Markdown.
    pub markdown: bool,
    /// Do not cache the message server-side.
    pub no_cache: bool,
    /// Do not forward the message to Firebase.
    pub no_firebase: bool,
    /// `username[:password]`, overrides the configured user.
    pub user: Option<String>,
}

impl PublishArgs {
    /// Publish options carried by these arguments.
    pub fn options(&self) -> PublishOptions {
        PublishOptions {
            title: self.title.clone(),
            priority: self.priority,
            tags: self.tags.as_deref().map(split_tags).unwrap_or_default(),
            click: self.click.clone(),
            delay: self.delay.clone(),
            icon: self.icon.clone(),
            attach: self.attach.clone(),
            filename: self.filename.clone(),
            email: self.email.clone(),
            markdown: self.markdown,
            no_cache: self.no_cache,
            no_firebase: self.no_firebase,
            extra_headers: Vec::new(),
        }
    }
}

/// Splits `a, b,,c` into `["a", "b", "c"]`.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Publishes with `client`, encrypting when a non-empty password is given.
///
/// # Errors
///
/// Returns an error if the payload cannot be serialized or the publish fails.
pub fn publish_with(
    client: &NtfyClient,
    args: &PublishArgs,
    password: Option<&str>,
) -> Result<Message> {
    let options = args.options();
    let topic_url = client.topic_url(&args.topic);

    match password.filter(|p| !p.is_empty()) {
        Some(password) => {
            if options.attach.is_some() || options.filename.is_some() || options.markdown {
                log::warn!("Attachments and Markdown are not sent with encrypted messages");
            }
            let payload = serde_json::to_string(&MessagePayload::new(&args.message, &options))?;
            client
                .publish_encrypted(
                    &args.topic,
                    &payload,
                    password.as_bytes(),
                    &options.transport_only(),
                )
                .with_context(|| format!("Failed to publish encrypted message to {}", topic_url))
        }
        None => client
            .publish(&args.topic, args.message.as_str(), &options)
            .with_context(|| format!("Failed to publish to {}", topic_url)),
    }
}

/// Runs `ntfy-e2e publish` and prints the server's message as JSON.
pub fn run(config: &Config, args: &PublishArgs) -> Result<()> {
    let mut config = config.clone();
    if args.user.is_some() {
        config.user = args.user.clone();
    }
    let client = NtfyClient::from_config(&config)?;
    let password = args.password.as_deref().or(config.password.as_deref());

    let message = publish_with(&client, args, password)?;
    log::info!("Published message {} to {}", message.id, message.topic);
    println!("{}", serde_json::to_string(&message)?);
    Ok(())
}
