//! Message types for publishing and for the JSON subscription stream.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request header marking the body as a compact JWE envelope.
pub const ENCRYPTION_HEADER: &str = "Encryption";

/// Value of [`ENCRYPTION_HEADER`] for envelopes built by [`crate::jwe`].
pub const ENCRYPTION_JWE: &str = "jwe";

/// Stream event type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Event {
    /// Subscription established.
    Open,
    /// Connection keepalive, carries no content.
    Keepalive,
    /// A published notification.
    #[default]
    Message,
    /// Server asks the client to poll (instant delivery relays).
    PollRequest,
    /// Event type this client does not know.
    Unknown(String),
}

impl From<String> for Event {
    fn from(s: String) -> Self {
        match s.as_str() {
            "open" => Self::Open,
            "keepalive" => Self::Keepalive,
            "message" => Self::Message,
            "poll_request" => Self::PollRequest,
            _ => Self::Unknown(s),
        }
    }
}

impl From<Event> for String {
    fn from(event: Event) -> Self {
        match event {
            Event::Open => "open".to_string(),
            Event::Keepalive => "keepalive".to_string(),
            Event::Message => "message".to_string(),
            Event::PollRequest => "poll_request".to_string(),
            Event::Unknown(s) => s,
        }
    }
}

/// Attachment metadata on a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name.
    pub name: String,
    /// MIME type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Unix time the attachment expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
    /// Download URL.
    pub url: String,
}

/// One event from a topic, as returned by publish and the JSON stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Random message ID.
    #[serde(default)]
    pub id: String,
    /// Unix time in seconds.
    #[serde(default)]
    pub time: i64,
    /// Unix time the message expires from the server cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
    /// Event type.
    #[serde(default)]
    pub event: Event,
    /// Topic name (without host).
    #[serde(default)]
    pub topic: String,
    /// Notification title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Message body. For encrypted messages this is the envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Priority 1 (min) to 5 (max).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// Tags / emoji shortcodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// URL opened when the notification is tapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click: Option<String>,
    /// Notification icon URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Attachment metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Empty for UTF-8, `base64` for binary bodies, `jwe` for envelopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl Message {
    /// Whether this is a notification (as opposed to open/keepalive).
    pub fn is_message(&self) -> bool {
        self.event == Event::Message
    }

    /// Whether the body is an encrypted envelope.
    pub fn is_encrypted(&self) -> bool {
        self.encoding.as_deref() == Some(ENCRYPTION_JWE)
    }
}

/// Message priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// 1
    Min = 1,
    /// 2
    Low = 2,
    /// 3
    Default = 3,
    /// 4
    High = 4,
    /// 5, also spelled `urgent`.
    Max = 5,
}

/// Priority string was neither 1-5 nor a known name.
#[derive(Debug, Error)]
#[error("Invalid priority '{0}': expected 1-5, min, low, default, high, max or urgent")]
pub struct InvalidPriority(pub String);

impl Priority {
    /// Numeric level sent on the wire.
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Priority from a numeric level.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Min),
            2 => Some(Self::Low),
            3 => Some(Self::Default),
            4 => Some(Self::High),
            5 => Some(Self::Max),
            _ => None,
        }
    }
}

impl FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "min" => Ok(Self::Min),
            "2" | "low" => Ok(Self::Low),
            "3" | "default" => Ok(Self::Default),
            "4" | "high" => Ok(Self::High),
            "5" | "max" | "urgent" => Ok(Self::Max),
            _ => Err(InvalidPriority(s.to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Optional metadata for a publish request, sent as HTTP headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Notification title.
    pub title: Option<String>,
    /// Priority.
    pub priority: Option<Priority>,
    /// Tags / emoji shortcodes.
    pub tags: Vec<String>,
    /// URL to open on click.
    pub click: Option<String>,
    /// Scheduled delivery (`30m`, `tomorrow 10am`, unix time, ...).
    pub delay: Option<String>,
    /// Icon URL.
    pub icon: Option<String>,
    /// Attachment URL.
    pub attach: Option<String>,
    /// Attachment file name.
    pub filename: Option<String>,
    /// Forward to this e-mail address.
    pub email: Option<String>,
    /// Render the body as Markdown.
    pub markdown: bool,
    /// Do not cache the message server-side.
    pub no_cache: bool,
    /// Do not forward the message to Firebase.
    pub no_firebase: bool,
    /// Additional raw headers.
    pub extra_headers: Vec<(String, String)>,
}

impl PublishOptions {
    /// Options as `(header, value)` pairs, in a stable order.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        let mut push = |name: &str, value: Option<String>| {
            if let Some(value) = value {
                headers.push((name.to_string(), value));
            }
        };

        push("Title", self.title.clone());
        push("Priority", self.priority.map(|p| p.to_string()));
        push("Tags", (!self.tags.is_empty()).then(|| self.tags.join(",")));
        push("Click", self.click.clone());
        push("Delay", self.delay.clone());
        push("Icon", self.icon.clone());
        push("Attach", self.attach.clone());
        push("Filename", self.filename.clone());
        push("Email", self.email.clone());
        push("Markdown", self.markdown.then(|| "yes".to_string()));
        push("Cache", self.no_cache.then(|| "no".to_string()));
        push("Firebase", self.no_firebase.then(|| "no".to_string()));

        headers.extend(self.extra_headers.iter().cloned());
        headers
    }

    /// Options that must stay readable by the server when the body is
    /// encrypted. Display metadata moves into [`MessagePayload`] instead.
    pub fn transport_only(&self) -> Self {
        Self {
            delay: self.delay.clone(),
            email: self.email.clone(),
            no_cache: self.no_cache,
            no_firebase: self.no_firebase,
            extra_headers: self.extra_headers.clone(),
            ..Self::default()
        }
    }
}

/// Filters for subscribe and poll, sent as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Return cached messages since a Unix time, a duration (`10m`), a
    /// message ID, or `all`.
    pub since: Option<String>,
    /// Also return scheduled messages that are not delivered yet.
    pub scheduled: bool,
}

impl SubscribeOptions {
    /// Options as `(param, value)` pairs.
    pub fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(since) = &self.since {
            query.push(("since".to_string(), since.clone()));
        }
        if self.scheduled {
            query.push(("scheduled".to_string(), "1".to_string()));
        }
        query
    }
}

/// JSON plaintext of an encrypted message.
///
/// Title, tags and friends travel inside the envelope so the server never
/// sees them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Message body.
    pub message: String,
    /// Notification title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Priority 1-5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// Tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Click URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click: Option<String>,
    /// Icon URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl MessagePayload {
    /// Payload for `message` carrying the display metadata of `options`.
    pub fn new(message: impl Into<String>, options: &PublishOptions) -> Self {
        Self {
            message: message.into(),
            title: options.title.clone(),
            priority: options.priority.map(Priority::level),
            tags: options.tags.clone(),
            click: options.click.clone(),
            icon: options.icon.clone(),
        }
    }
}
