//! Topic addressing.
//!
//! A topic can be given as a full URL (`https://ntfy.example.com/alerts`),
//! as `host/topic` (`ntfy.example.com/alerts`, which gets `https://`), or
//! as a bare name (`alerts`, which lives on the default host).

/// Public ntfy instance, used when no host is configured.
pub const DEFAULT_HOST: &str = "https://ntfy.sh";

/// Expand `topic` into a full topic URL.
///
/// The expanded URL is also the key-derivation salt input, so publisher and
/// subscriber must expand the same way.
pub fn expand_topic_url(topic: &str, default_host: &str) -> String {
    if topic.starts_with("http://") || topic.starts_with("https://") {
        topic.to_string()
    } else if topic.contains('/') {
        format!("https://{}", topic)
    } else {
        format!("{}/{}", default_host.trim_end_matches('/'), topic)
    }
}

/// Topic URL without the scheme, for log lines.
pub fn short_topic_url(topic_url: &str) -> &str {
    topic_url
        .strip_prefix("https://")
        .or_else(|| topic_url.strip_prefix("http://"))
        .unwrap_or(topic_url)
}

/// Append a path segment (`json`, `trigger`, ...) to a topic URL.
pub(crate) fn endpoint(topic_url: &str, segment: &str) -> String {
    format!("{}/{}", topic_url.trim_end_matches('/'), segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url_unchanged() {
        assert_eq!(
            expand_topic_url("https://ntfy.sh/mysecret", DEFAULT_HOST),
            "https://ntfy.sh/mysecret"
        );
        assert_eq!(
            expand_topic_url("http://localhost:8080/test", DEFAULT_HOST),
            "http://localhost:8080/test"
        );
    }

    #[test]
    fn test_host_and_topic_gets_https() {
        assert_eq!(
            expand_topic_url("myhost.lan/alerts", DEFAULT_HOST),
            "https://myhost.lan/alerts"
        );
    }

    #[test]
    fn test_bare_topic_uses_default_host() {
        assert_eq!(expand_topic_url("mytopic", DEFAULT_HOST), "https://ntfy.sh/mytopic");
        assert_eq!(
            expand_topic_url("mytopic", "https://ntfy.example.com/"),
            "https://ntfy.example.com/mytopic"
        );
    }

    #[test]
    fn test_short_topic_url() {
        assert_eq!(short_topic_url("https://ntfy.sh/mytopic"), "ntfy.sh/mytopic");
        assert_eq!(short_topic_url("http://localhost/a"), "localhost/a");
        assert_eq!(short_topic_url("ntfy.sh/x"), "ntfy.sh/x");
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(endpoint("https://ntfy.sh/mytopic", "json"), "https://ntfy.sh/mytopic/json");
        assert_eq!(
            endpoint("https://ntfy.sh/mytopic/", "trigger"),
            "https://ntfy.sh/mytopic/trigger"
        );
    }
}
