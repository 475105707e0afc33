//! Shared server state
//!
//! Everything here is read-only after startup, so it is shared as a plain
//! `Arc` with no locking.

use std::sync::Arc;

use share_core::{ContentRoot, FileCatalog, OriginGuard, ServerConfig, SharedSecret, TokenAuthority};

pub type SharedState = Arc<AppState>;

/// Shared application state
pub struct AppState {
    /// Time-window token checker
    pub tokens: TokenAuthority,

    /// Origin/referer/host allow-list
    pub guard: OriginGuard,

    /// Redirect target for deflected requests
    pub decoy_url: String,

    /// Image and text enumeration
    pub catalog: FileCatalog,

    /// Serving boundary for single images
    pub images: ContentRoot,

    /// Serving boundary for single text files
    pub text: ContentRoot,
}

impl AppState {
    pub fn new(tokens: TokenAuthority, config: &ServerConfig) -> Self {
        let images_dir = config.images_dir();
        let text_dir = config.text_dir();

        Self {
            tokens,
            guard: OriginGuard::new(config.allowed_domain.clone()),
            decoy_url: config.decoy_url.clone(),
            catalog: FileCatalog::new(&config.base_dir, &images_dir, &text_dir),
            images: ContentRoot::new(images_dir),
            text: ContentRoot::new(text_dir),
        }
    }

    /// State backed by the system clock
    pub fn from_config(secret: SharedSecret, config: &ServerConfig) -> Self {
        Self::new(TokenAuthority::new(secret), config)
    }
}
