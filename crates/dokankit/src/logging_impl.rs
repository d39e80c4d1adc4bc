//! Logging helpers for dokankit
//!
//! The dispatcher emits `tracing` events at the driver boundary. File names
//! come straight from user-space callers, so every path goes through
//! [`LogConfig`] before it reaches a subscriber.
//!
//! # Log Levels
//!
//! - **WARN**: Illegal paths, contained backend panics
//! - **INFO**: Mount and unmount notifications
//! - **DEBUG**: One event per dispatched request
//! - **TRACE**: Matcher decisions during enumeration
//!
//! # Security
//!
//! - Paths are summarized by default; full paths need an explicit opt-in
//! - Control characters are escaped so crafted file names cannot forge log
//!   lines
//! - Path segments that look like credentials are redacted even when full
//!   paths are enabled

use std::borrow::Cow;
use std::collections::HashSet;

use crate::path::NormalizedPath;

/// Configuration for logging behavior
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to log full paths instead of a summary (default: false)
    pub log_full_paths: bool,

    /// Whether to redact path segments that look like secrets (default: true)
    pub redact_sensitive: bool,

    /// Maximum length of logged values before truncation (default: 200)
    pub max_value_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_full_paths: false,
            redact_sensitive: true,
            max_value_length: 200,
        }
    }
}

impl LogConfig {
    /// Create a new log configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Log full paths (UNSAFE)
    ///
    /// # Warning
    ///
    /// File names can carry user data. Only use in trusted debugging
    /// environments.
    pub fn unsafe_log_paths(mut self) -> Self {
        self.log_full_paths = true;
        self
    }

    /// Disable redaction of secret-looking path segments (UNSAFE)
    pub fn unsafe_disable_redaction(mut self) -> Self {
        self.redact_sensitive = false;
        self
    }

    /// Set maximum length for logged values
    pub fn max_value_length(mut self, len: usize) -> Self {
        self.max_value_length = len;
        self
    }

    /// Render a normalized path for a log event.
    pub fn format_path(&self, path: &NormalizedPath) -> String {
        self.format_raw_path(path.as_str())
    }

    /// Render a raw, possibly illegal, path for a log event.
    pub fn format_raw_path(&self, raw: &str) -> String {
        if !self.log_full_paths {
            let segments = raw
                .split(['/', '\\'])
                .filter(|s| !s.is_empty())
                .count();
            return format!("[path: {} segments, {} bytes]", segments, raw.len());
        }

        let redacted = if self.redact_sensitive {
            raw.split('/')
                .map(|segment| {
                    if is_likely_secret(segment) {
                        "[REDACTED]"
                    } else {
                        segment
                    }
                })
                .collect::<Vec<_>>()
                .join("/")
        } else {
            raw.to_string()
        };

        let sanitized = sanitize_for_log(&redacted);
        self.truncate(&sanitized).into_owned()
    }

    /// Truncate value if it exceeds max length
    ///
    /// Handles UTF-8 char boundaries properly to avoid panics on multi-byte chars.
    fn truncate<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if value.len() <= self.max_value_length {
            Cow::Borrowed(value)
        } else {
            let mut end = self.max_value_length;
            while end > 0 && !value.is_char_boundary(end) {
                end -= 1;
            }
            Cow::Owned(format!(
                "{}...[truncated {} bytes]",
                &value[..end],
                value.len() - end
            ))
        }
    }
}

/// Check if a path segment looks like a credential (API key prefixes, JWTs,
/// long high-entropy tokens).
fn is_likely_secret(value: &str) -> bool {
    let trimmed = value.trim();

    if trimmed.matches('.').count() == 2 {
        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.iter().all(|p| p.len() > 10 && is_base64_like(p)) {
            return true;
        }
    }

    let prefixes = [
        "sk-", "pk-", "sk_live_", "sk_test_", "ghp_", "gho_", "ghs_", "xoxb-", "xoxp-", "AKIA",
        "eyJ",
    ];
    for prefix in prefixes {
        if trimmed.starts_with(prefix) && trimmed.len() > prefix.len() + 10 {
            return true;
        }
    }

    trimmed.len() >= 32 && is_high_entropy(trimmed)
}

fn is_base64_like(s: &str) -> bool {
    s.chars().all(|c| {
        c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=' || c == '_' || c == '-'
    })
}

/// High ratio of unique chars suggests random data
fn is_high_entropy(s: &str) -> bool {
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return false;
    }

    let unique: HashSet<char> = s.chars().collect();
    let ratio = unique.len() as f64 / s.len() as f64;
    ratio > 0.5 && unique.len() > 15
}

/// Escape characters that could be used for log injection.
pub fn sanitize_for_log(input: &str) -> String {
    input
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .chars()
        .filter(|c| !c.is_control() || *c == ' ')
        .collect()
}
