//! Rate-limit classification of downstream error messages.
//!
//! Providers signal throttling inside free-text error bodies, so
//! classification is substring-based. When the message carries an explicit
//! "try again in Ns" hint we honor it; otherwise a fixed 5s wait applies.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

/// Wait applied when a rate-limit error carries no usable retry hint.
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(5);

/// Case-sensitive markers that identify a throttling response.
const RATE_LIMIT_MARKERS: &[&str] = &[
    "Rate limit reached",
    "rate_limit_exceeded",
    "429",
    "Too Many Requests",
];

static RE_RETRY_AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"try again in (\d+\.?\d*)s").unwrap());

/// Classification of a downstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Provider asked us to slow down; wait this long before retrying.
    RateLimited { wait: Duration },
    /// Anything else — handled with exponential backoff.
    Generic,
}

/// Classifies a raw downstream error message.
pub fn classify(message: &str) -> ErrorClass {
    if RATE_LIMIT_MARKERS.iter().any(|m| message.contains(m)) {
        ErrorClass::RateLimited {
            wait: extract_wait(message).unwrap_or(DEFAULT_RATE_LIMIT_WAIT),
        }
    } else {
        ErrorClass::Generic
    }
}

/// Extracts a "try again in <N>s" hint (N may be fractional) as a Duration.
fn extract_wait(message: &str) -> Option<Duration> {
    let caps = RE_RETRY_AFTER.captures(message)?;
    let secs: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(Duration::from_millis((secs * 1000.0) as u64))
}
