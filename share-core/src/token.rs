//! Time-window access tokens for share
//!
//! Uses stateless, minute-granular tokens:
//! - Token = first 16 hex chars of SHA-256(secret ++ "YYYYMMDDHHMM")
//! - The current minute and the five preceding minutes are all accepted
//!
//! Anyone holding the secret can mint a token, and a token can be replayed
//! for the rest of its window. This is a low-assurance gate for a trusted
//! front-end, not real authentication.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, DurationRound, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Number of hex characters kept from the digest
pub const TOKEN_LEN: usize = 16;

/// Oldest accepted minute, relative to now
const WINDOW_START_OFFSET: i64 = -5;

/// Header carrying the token
pub const TOKEN_HEADER: &str = "X-API-Token";

/// Query parameter carrying the token when the header is absent
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Message returned to clients on rejection
pub const REJECTION_MESSAGE: &str = "Invalid or expired token";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Shared secret must not be empty")]
    EmptySecret,
}

/// Process-wide shared secret used as hash input
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self(secret))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(***)")
    }
}

/// A UTC instant truncated to the minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeWindow(DateTime<Utc>);

impl TimeWindow {
    /// Truncate an instant to its minute
    pub fn containing(instant: DateTime<Utc>) -> Self {
        // Truncation only fails for instants near the representable limits
        let minute = instant
            .duration_trunc(Duration::minutes(1))
            .unwrap_or(instant);
        Self(minute)
    }

    /// Shift by whole minutes, rolling over hours, days, months and years
    pub fn offset_minutes(self, minutes: i64) -> Self {
        Self(self.0 + Duration::minutes(minutes))
    }

    /// Fixed-width `YYYYMMDDHHMM` form fed into the hash
    pub fn key(&self) -> String {
        self.0.format("%Y%m%d%H%M").to_string()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real UTC clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for tests and tooling
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Outcome of validating a presented token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenDecision {
    Allowed,
    Rejected,
}

impl TokenDecision {
    pub fn is_allowed(self) -> bool {
        self == TokenDecision::Allowed
    }
}

/// Derive the token for one minute window
pub fn derive_token(secret: &SharedSecret, window: TimeWindow) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_str().as_bytes());
    hasher.update(window.key().as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(TOKEN_LEN);
    digest
}

/// Pick the presented token: header first, then query parameter
pub fn presented_token<'a>(header: Option<&'a str>, query: Option<&'a str>) -> Option<&'a str> {
    header.filter(|h| !h.is_empty()).or(query)
}

/// Derives and checks time-window tokens
#[derive(Clone)]
pub struct TokenAuthority {
    secret: SharedSecret,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}

impl TokenAuthority {
    /// Create an authority backed by the system clock
    pub fn new(secret: SharedSecret) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: SharedSecret, clock: Arc<dyn Clock>) -> Self {
        Self { secret, clock }
    }

    /// The minute window containing the clock's current time
    pub fn current_window(&self) -> TimeWindow {
        TimeWindow::containing(self.clock.now())
    }

    /// Tokens accepted right now: this minute and the five before it
    pub fn current_valid_tokens(&self) -> HashSet<String> {
        let current = self.current_window();
        (WINDOW_START_OFFSET..=0)
            .map(|offset| derive_token(&self.secret, current.offset_minutes(offset)))
            .collect()
    }

    /// Token for the current minute, as a front-end sharing the secret would send
    pub fn issue(&self) -> String {
        derive_token(&self.secret, self.current_window())
    }

    /// Check a presented token against the current window
    pub fn validate(&self, presented: Option<&str>) -> TokenDecision {
        match presented {
            Some(token) if !token.is_empty() && self.current_valid_tokens().contains(token) => {
                TokenDecision::Allowed
            }
            _ => TokenDecision::Rejected,
        }
    }
}
