//! Push delivery configuration loaded from environment variables.

use std::time::Duration;

/// Default location of the VAPID private key, relative to the working directory.
const DEFAULT_KEY_PATH: &str = "../vapid_private.pem";

/// Default VAPID subscriber contact.
const DEFAULT_SUBJECT: &str = "xsuportal@example.com";

/// Configuration for the notifier and its push dispatcher.
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// PEM file holding the VAPID EC private key.
    pub vapid_private_key_path: String,
    /// Contact placed in the VAPID `sub` claim.
    pub subject: String,
    /// Number of dispatch worker tasks.
    pub workers: usize,
    /// Capacity of the dispatch queue. Jobs beyond this are dropped.
    pub queue_capacity: usize,
    /// Time-to-live the push service should keep undelivered messages.
    pub ttl_secs: u32,
    /// Idle connections kept per push service host.
    pub max_idle_per_host: usize,
    /// Timeout for a single push request.
    pub request_timeout: Duration,
    /// Memoize audiences and subscriptions until an explicit reset.
    pub cache_enabled: bool,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            vapid_private_key_path: DEFAULT_KEY_PATH.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            workers: 16,
            queue_capacity: 1024,
            ttl_secs: 0,
            max_idle_per_host: 100,
            request_timeout: Duration::from_secs(10),
            cache_enabled: true,
        }
    }
}

impl PushConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// Unparseable values fall back to the default with a warning.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `VAPID_PRIVATE_KEY_PATH`    | `../vapid_private.pem`  |
    /// | `WEBPUSH_SUBJECT`           | `xsuportal@example.com` |
    /// | `PUSH_WORKERS`              | `16`                    |
    /// | `PUSH_QUEUE_CAPACITY`       | `1024`                  |
    /// | `PUSH_TTL_SECS`             | `0`                     |
    /// | `PUSH_MAX_IDLE_PER_HOST`    | `100`                   |
    /// | `PUSH_REQUEST_TIMEOUT_SECS` | `10`                    |
    /// | `NOTIFIER_CACHE_ENABLED`    | `true`                  |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            vapid_private_key_path: std::env::var("VAPID_PRIVATE_KEY_PATH")
                .unwrap_or(defaults.vapid_private_key_path),
            subject: std::env::var("WEBPUSH_SUBJECT").unwrap_or(defaults.subject),
            workers: env_parse("PUSH_WORKERS", defaults.workers).max(1),
            queue_capacity: env_parse("PUSH_QUEUE_CAPACITY", defaults.queue_capacity).max(1),
            ttl_secs: env_parse("PUSH_TTL_SECS", defaults.ttl_secs),
            max_idle_per_host: env_parse("PUSH_MAX_IDLE_PER_HOST", defaults.max_idle_per_host),
            request_timeout: Duration::from_secs(env_parse(
                "PUSH_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
            cache_enabled: env_parse("NOTIFIER_CACHE_ENABLED", defaults.cache_enabled),
        }
    }

    /// The `sub` claim value. Bare addresses get a `mailto:` prefix.
    pub fn subject_claim(&self) -> String {
        if self.subject.starts_with("mailto:") || self.subject.starts_with("https:") {
            self.subject.clone()
        } else {
            format!("mailto:{}", self.subject)
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
