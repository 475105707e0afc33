//! share-core: Shared library for the share file API
//!
//! This crate provides:
//! - Time-window token derivation and validation
//! - Origin/referer/host allow-list
//! - Filesystem catalog of images and text files
//! - Path-safe content resolution
//! - Configuration loading

pub mod catalog;
pub mod config;
pub mod content;
pub mod origin;
pub mod token;

pub use catalog::{FileCatalog, FileExtensionSet, TextEntry};
pub use config::{Config, ConfigError, ServerConfig};
pub use content::{ContentError, ContentRoot};
pub use origin::{OriginDecision, OriginGuard};
pub use token::{Clock, FixedClock, SharedSecret, SystemClock, TokenAuthority, TokenDecision};

/// Default HTTP port for share-server
pub const DEFAULT_PORT: u16 = 945;
