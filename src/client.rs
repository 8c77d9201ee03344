//! HTTP client for publishing to and subscribing from ntfy topics.
//!
//! This module provides the [`NtfyClient`] struct which handles all HTTP
//! communication with an ntfy server:
//!
//! - `POST {topic}` publishes a plain or encrypted message
//! - `GET {topic}/trigger` publishes through a GET request
//! - `GET {topic}/json` opens a newline-delimited JSON stream
//! - `GET {topic}/json?poll=1` returns cached messages and closes
//!
//! Requests are sent once. A non-2xx status becomes [`Error::Status`] and
//! is never retried here.

use std::fmt;
use std::io::{BufRead, BufReader, Lines, Read};
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};

use crate::config::Config;
use crate::constants;
use crate::error::{Error, Result};
use crate::jwe::EnvelopeBuilder;
use crate::kdf;
use crate::message::{
    Message, PublishOptions, SubscribeOptions, ENCRYPTION_HEADER, ENCRYPTION_JWE,
};
use crate::topic::{endpoint, expand_topic_url, short_topic_url};

/// Credentials sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// `Authorization: Basic ...`.
    Basic {
        /// User name.
        user: String,
        /// Password; `None` sends an empty one.
        password: Option<String>,
    },
}

impl Auth {
    /// Parses `username[:password]`. Only the first `:` separates.
    pub fn from_user_spec(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((user, password)) => Self::Basic {
                user: user.to_string(),
                password: Some(password.to_string()),
            },
            None => Self::Basic {
                user: spec.to_string(),
                password: None,
            },
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::Basic { user, .. } => write!(f, "Basic({}, <redacted>)", user),
        }
    }
}

/// Client for one ntfy server (plus any full topic URLs it is handed).
pub struct NtfyClient {
    client: Client,
    stream_client: Client,
    default_host: String,
    auth: Option<Auth>,
    envelopes: EnvelopeBuilder,
}

impl fmt::Debug for NtfyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NtfyClient")
            .field("default_host", &self.default_host)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl NtfyClient {
    /// Creates a client that expands bare topic names against `default_host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(default_host: impl Into<String>) -> Result<Self> {
        Self::with_timeout(default_host, constants::HTTP_REQUEST_TIMEOUT)
    }

    /// Like [`new`](Self::new) with a custom timeout for publish and poll.
    pub fn with_timeout(default_host: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(constants::CONNECT_TIMEOUT)
            .build()?;

        // No overall deadline: the subscription body never ends on its own.
        let stream_client = Client::builder()
            .timeout(None::<Duration>)
            .connect_timeout(constants::CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            stream_client,
            default_host: default_host.into(),
            auth: None,
            envelopes: EnvelopeBuilder::new(),
        })
    }

    /// Creates a client from loaded configuration.
    ///
    /// A configured user wins over a token.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Self::with_timeout(config.default_host.clone(), config.request_timeout())?;
        let client = client.with_token(config.token.clone());
        Ok(match config.user.as_deref().filter(|u| !u.is_empty()) {
            Some(spec) => client.with_auth(Some(Auth::from_user_spec(spec))),
            None => client,
        })
    }

    /// Sends `Authorization: Bearer <token>` on every request.
    pub fn with_token(self, token: Option<String>) -> Self {
        self.with_auth(token.filter(|t| !t.is_empty()).map(Auth::Bearer))
    }

    /// Sends `auth` on every request, replacing earlier credentials.
    pub fn with_auth(mut self, auth: Option<Auth>) -> Self {
        self.auth = auth;
        self
    }

    /// Host used for bare topic names.
    pub fn default_host(&self) -> &str {
        &self.default_host
    }

    /// Full URL for `topic`.
    pub fn topic_url(&self, topic: &str) -> String {
        expand_topic_url(topic, &self.default_host)
    }

    /// Publishes `body` as a plain-text message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server rejects it, or the
    /// reply is not a message.
    pub fn publish(
        &self,
        topic: &str,
        body: impl Into<String>,
        options: &PublishOptions,
    ) -> Result<Message> {
        let topic_url = self.topic_url(topic);
        log::debug!("{} Publishing message", short_topic_url(&topic_url));

        let request = self.client.post(&topic_url).body(body.into());
        self.send_publish(request, options)
    }

    /// Encrypts `plaintext` for `topic` and publishes the envelope.
    ///
    /// The key is derived from `password` and the *expanded* topic URL, so a
    /// subscriber has to use the same URL spelling to decrypt.
    ///
    /// # Errors
    ///
    /// Returns an error if derivation or encryption fails, or for any
    /// transport error [`publish`](Self::publish) returns.
    pub fn publish_encrypted(
        &self,
        topic: &str,
        plaintext: &str,
        password: &[u8],
        options: &PublishOptions,
    ) -> Result<Message> {
        let topic_url = self.topic_url(topic);
        let key = kdf::derive_key(password, &topic_url)?;
        let envelope = self.envelopes.build(plaintext, key.as_ref())?;

        log::debug!(
            "{} Publishing encrypted message ({} bytes plaintext)",
            short_topic_url(&topic_url),
            plaintext.len()
        );

        let request = self
            .client
            .post(&topic_url)
            .header(ENCRYPTION_HEADER, ENCRYPTION_JWE)
            .body(envelope);
        self.send_publish(request, options)
    }

    /// Publishes `body` through `GET {topic}/trigger`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub fn trigger(
        &self,
        topic: &str,
        body: impl Into<String>,
        options: &PublishOptions,
    ) -> Result<()> {
        let topic_url = self.topic_url(topic);
        log::debug!("{} Triggering message", short_topic_url(&topic_url));

        let request = self
            .client
            .get(endpoint(&topic_url, "trigger"))
            .body(body.into());
        let request = self.authorize(apply_options(request, options));
        check_status(request.send()?)?;
        Ok(())
    }

    /// Opens a live subscription to `topic`.
    ///
    /// The returned [`Subscription`] blocks between arrivals and never ends
    /// on its own while the server keeps the connection open. Reconnecting
    /// means calling `subscribe` again.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub fn subscribe(&self, topic: &str) -> Result<Subscription> {
        self.subscribe_with(topic, &SubscribeOptions::default())
    }

    /// [`subscribe`](Self::subscribe) with `since`/`scheduled` filters.
    pub fn subscribe_with(&self, topic: &str, options: &SubscribeOptions) -> Result<Subscription> {
        let topic_url = self.topic_url(topic);
        let stream_url = endpoint(&topic_url, "json");
        log::debug!("{} Listening to {}", short_topic_url(&topic_url), stream_url);

        let request = self
            .stream_client
            .get(&stream_url)
            .query(&options.query());
        let request = self.authorize(request);
        let response = check_status(request.send()?)?;

        Ok(Subscription::new(topic_url, response))
    }

    /// Fetches the cached messages of `topic` without staying subscribed.
    ///
    /// Only `message` events are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server rejects it, or a
    /// line is not a message.
    pub fn poll(&self, topic: &str) -> Result<Vec<Message>> {
        self.poll_with(topic, &SubscribeOptions::default())
    }

    /// [`poll`](Self::poll) with `since`/`scheduled` filters.
    pub fn poll_with(&self, topic: &str, options: &SubscribeOptions) -> Result<Vec<Message>> {
        let topic_url = self.topic_url(topic);
        log::debug!("{} Polling from topic", short_topic_url(&topic_url));

        let request = self
            .client
            .get(endpoint(&topic_url, "json"))
            .query(&[("poll", "1")])
            .query(&options.query());
        let response = check_status(self.authorize(request).send()?)?;

        let mut messages = Vec::new();
        for message in Subscription::new(topic_url, response) {
            let message = message?;
            if message.is_message() {
                messages.push(message);
            }
        }
        Ok(messages)
    }

    fn send_publish(&self, request: RequestBuilder, options: &PublishOptions) -> Result<Message> {
        let request = self.authorize(apply_options(request, options));
        let response = check_status(request.send()?)?;
        let body = response.text()?;
        Ok(serde_json::from_str(body.trim())?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(Auth::Bearer(token)) => request.bearer_auth(token),
            Some(Auth::Basic { user, password }) => request.basic_auth(user, password.as_ref()),
            None => request,
        }
    }
}

fn apply_options(mut request: RequestBuilder, options: &PublishOptions) -> RequestBuilder {
    for (name, value) in options.headers() {
        request = request.header(name, value);
    }
    request
}

/// Passes successful responses through, turns the rest into [`Error::Status`].
fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = String::new();
    // Best effort; the status alone is still worth reporting.
    if let Err(e) = response
        .take(constants::MAX_ERROR_BODY_BYTES as u64)
        .read_to_string(&mut body)
    {
        log::debug!("Could not read {} error body: {}", status, e);
    }

    Err(Error::Status {
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

/// Live stream of events from one topic.
///
/// Iterating yields one [`Message`] per non-empty line, including `open`
/// and `keepalive` events. Use [`Message::is_message`] to keep only
/// notifications.
pub struct Subscription {
    topic_url: String,
    lines: Lines<BufReader<Box<dyn Read + Send>>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic_url", &self.topic_url)
            .finish_non_exhaustive()
    }
}

impl Subscription {
    fn new(topic_url: String, response: Response) -> Self {
        Self::from_reader(topic_url, response)
    }

    /// Subscription over any newline-delimited JSON source.
    pub fn from_reader(topic_url: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        let reader: Box<dyn Read + Send> = Box::new(reader);
        Self {
            topic_url: topic_url.into(),
            lines: BufReader::new(reader).lines(),
        }
    }

    /// Topic URL this subscription listens on.
    pub fn topic_url(&self) -> &str {
        &self.topic_url
    }

    /// Next non-empty line, unparsed. `None` when the server closed the stream.
    pub fn next_raw(&mut self) -> Option<Result<String>> {
        loop {
            match self.lines.next()? {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => {
                    log::trace!("{} Line received: {}", short_topic_url(&self.topic_url), line);
                    return Some(Ok(line));
                }
                Err(e) => return Some(Err(Error::Io(e))),
            }
        }
    }
}

impl Iterator for Subscription {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.next_raw()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e)),
        };
        Some(serde_json::from_str(&line).map_err(Error::from))
    }
}
