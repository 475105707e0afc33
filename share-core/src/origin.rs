//! Origin/referer/host allow-list
//!
//! Substring matching on client-controlled headers is trivially spoofable.
//! Treat this as a perimeter filter against casual hotlinking; the token
//! check is the actual gate.

/// Default domain the front-end is served from
pub const DEFAULT_ALLOWED_DOMAIN: &str = "share.syrins.tech";

/// Where deflected requests are redirected
pub const DEFAULT_DECOY_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Path that bypasses the guard
pub const HEALTH_PATH: &str = "/health";

/// Host substrings treated as local development
const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginDecision {
    Proceed,
    Deflect,
}

#[derive(Debug, Clone)]
pub struct OriginGuard {
    allowed_domain: String,
    exempt_path: String,
}

impl Default for OriginGuard {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_DOMAIN)
    }
}

impl OriginGuard {
    /// An empty `allowed_domain` deflects every non-local request; config
    /// loading refuses one.
    pub fn new(allowed_domain: impl Into<String>) -> Self {
        Self {
            allowed_domain: allowed_domain.into(),
            exempt_path: HEALTH_PATH.to_string(),
        }
    }

    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    /// Decide from the request path and the Origin, Referer and Host headers.
    /// Absent headers are passed as empty strings.
    pub fn check(&self, path: &str, origin: &str, referer: &str, host: &str) -> OriginDecision {
        if path == self.exempt_path {
            return OriginDecision::Proceed;
        }

        if LOCAL_HOSTS.iter().any(|local| host.contains(local)) {
            return OriginDecision::Proceed;
        }

        // An empty domain would match everything
        if self.allowed_domain.is_empty() {
            return OriginDecision::Deflect;
        }

        let domain = self.allowed_domain.as_str();
        if origin.contains(domain) || referer.contains(domain) || host.contains(domain) {
            OriginDecision::Proceed
        } else {
            OriginDecision::Deflect
        }
    }
}
