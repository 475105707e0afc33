//! Filesystem catalog of shared images and text files
//!
//! Listings are built fresh on every call by walking the root directories.
//! Nothing is cached; an unchanged tree always yields the same entries in the
//! same order (traversal is sorted by file name).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

/// URL prefix under which text files are served
pub const TEXT_URL_PREFIX: &str = "/api/text/";

/// Default image extensions
pub const IMAGE_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".svg", ".webp", ".avif", ".heic",
];

/// Default text extensions
pub const TEXT_EXTENSIONS: &[&str] = &[
    ".txt", ".md", ".js", ".ts", ".tsx", ".jsx", ".json", ".css", ".html", ".py", ".sh", ".yml",
    ".yaml",
];

/// Case-insensitive suffix allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExtensionSet {
    suffixes: Vec<String>,
}

impl FileExtensionSet {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn images() -> Self {
        Self::new(IMAGE_EXTENSIONS)
    }

    pub fn text() -> Self {
        Self::new(TEXT_EXTENSIONS)
    }

    /// Whether the lowercased file name ends with one of the suffixes
    pub fn matches(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        self.suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }
}

/// A listed text file with its content inlined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEntry {
    pub path: String,
    pub content: String,
}

/// Enumerates the two shared roots
#[derive(Debug, Clone)]
pub struct FileCatalog {
    base_dir: PathBuf,
    images_root: PathBuf,
    text_root: PathBuf,
    image_exts: FileExtensionSet,
    text_exts: FileExtensionSet,
}

impl FileCatalog {
    /// Catalog with the default extension sets
    pub fn new(base_dir: impl Into<PathBuf>, images_root: impl Into<PathBuf>, text_root: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            images_root: images_root.into(),
            text_root: text_root.into(),
            image_exts: FileExtensionSet::images(),
            text_exts: FileExtensionSet::text(),
        }
    }

    pub fn with_extensions(mut self, image_exts: FileExtensionSet, text_exts: FileExtensionSet) -> Self {
        self.image_exts = image_exts;
        self.text_exts = text_exts;
        self
    }

    pub fn images_root(&self) -> &Path {
        &self.images_root
    }

    pub fn text_root(&self) -> &Path {
        &self.text_root
    }

    /// URL paths of every image, relative to the base directory
    pub fn list_images(&self) -> Vec<String> {
        matching_files(&self.images_root, &self.image_exts)
            .into_iter()
            .map(|file| format!("/{}", url_path(&self.image_relative(&file))))
            .collect()
    }

    /// Every readable text file with its content.
    ///
    /// Files that cannot be read as UTF-8 are logged and skipped.
    pub fn list_text_files(&self) -> Vec<TextEntry> {
        matching_files(&self.text_root, &self.text_exts)
            .into_iter()
            .filter_map(|file| {
                let relative = file.strip_prefix(&self.text_root).ok()?.to_path_buf();
                match std::fs::read_to_string(&file) {
                    Ok(content) => Some(TextEntry {
                        path: format!("{}{}", TEXT_URL_PREFIX, url_path(&relative)),
                        content,
                    }),
                    Err(e) => {
                        tracing::warn!("Error reading {}: {}", file.display(), e);
                        None
                    }
                }
            })
            .collect()
    }

    pub fn count_images(&self) -> usize {
        matching_files(&self.images_root, &self.image_exts).len()
    }

    /// Matching text files, whether or not their content is readable
    pub fn count_text_files(&self) -> usize {
        matching_files(&self.text_root, &self.text_exts).len()
    }

    fn image_relative(&self, file: &Path) -> PathBuf {
        if let Ok(relative) = file.strip_prefix(&self.base_dir) {
            return relative.to_path_buf();
        }

        // Images root lives outside the base directory; expose it under its own name
        let inner = file.strip_prefix(&self.images_root).unwrap_or(file);
        match self.images_root.file_name() {
            Some(name) => Path::new(name).join(inner),
            None => inner.to_path_buf(),
        }
    }
}

/// Regular files under `root` whose names match `exts`, in sorted traversal order.
/// A missing root yields nothing.
fn matching_files(root: &Path, exts: &FileExtensionSet) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Error accessing entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_str().is_some_and(|name| exts.matches(name)))
        .map(|entry| entry.into_path())
        .collect()
}

/// Forward-slash form of a relative path
fn url_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
