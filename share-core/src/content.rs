//! Safe resolution of client-supplied paths against a serving root
//!
//! Every failure, whether the path escapes the root or simply does not
//! exist, surfaces to clients as the same "not found". The variants here
//! exist for logging only.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Empty path")]
    Empty,

    #[error("Path is not relative or contains parent segments: {0}")]
    InvalidPath(String),

    #[error("Path resolves outside the root: {0}")]
    OutsideRoot(String),

    #[error("Not a regular file: {0}")]
    NotAFile(String),

    #[error("File not found: {0}")]
    NotFound(String),
}

/// A directory that bounds what may be served
#[derive(Debug, Clone)]
pub struct ContentRoot {
    root: PathBuf,
}

impl ContentRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve `requested` to a canonical file path strictly inside the root
    ///
    /// Any `..` segment is rejected outright, even one that would stay inside the root.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, ContentError> {
        if requested.is_empty() {
            return Err(ContentError::Empty);
        }

        let relative = Path::new(requested);
        let mut clean = PathBuf::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(ContentError::InvalidPath(requested.to_string()));
                }
            }
        }
        if clean.as_os_str().is_empty() {
            return Err(ContentError::Empty);
        }

        let root = self
            .root
            .canonicalize()
            .map_err(|_| ContentError::NotFound(requested.to_string()))?;

        // Canonicalizing follows symlinks, so a link pointing out of the root is caught here
        let resolved = root
            .join(&clean)
            .canonicalize()
            .map_err(|_| ContentError::NotFound(requested.to_string()))?;

        if !resolved.starts_with(&root) {
            return Err(ContentError::OutsideRoot(requested.to_string()));
        }

        if !resolved.is_file() {
            return Err(ContentError::NotAFile(requested.to_string()));
        }

        Ok(resolved)
    }
}
