//! # Image Resolution
//!
//! Maps an image reference from the report (remote URL or local path) to a
//! file on disk. Resolution never touches the network: remote images are
//! expected to have been fetched into a content-addressed cache beforehand,
//! under `<cache_dir>/<sha256(url) hex><ext>`.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::image_loader::ALLOWED_EXTENSIONS;

const DEFAULT_EXTENSION: &str = ".jpg";

/// Turns an image reference into a local file, if one is available.
pub trait ImageResolver {
    fn resolve(&self, source: &str) -> Option<PathBuf>;
}

impl<F> ImageResolver for F
where
    F: Fn(&str) -> Option<PathBuf>,
{
    fn resolve(&self, source: &str) -> Option<PathBuf> {
        self(source)
    }
}

/// Resolves against a download cache and a list of local search directories.
#[derive(Debug, Clone)]
pub struct LocalImageResolver {
    cache_dir: Option<PathBuf>,
    search_dirs: Vec<PathBuf>,
}

impl Default for LocalImageResolver {
    fn default() -> Self {
        Self {
            cache_dir: Some(std::env::temp_dir().join("inspectpdf-images")),
            search_dirs: vec![PathBuf::from("."), PathBuf::from("images")],
        }
    }
}

impl LocalImageResolver {
    /// A resolver with no cache and no search directories.
    pub fn empty() -> Self {
        Self {
            cache_dir: None,
            search_dirs: Vec::new(),
        }
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    fn resolve_remote(&self, url: &str) -> Option<PathBuf> {
        let dir = self.cache_dir.as_ref()?;
        let path = dir.join(cache_file_name(url));
        if path.is_file() {
            Some(path)
        } else {
            log::debug!("no cached copy of {} at {}", url, path.display());
            None
        }
    }

    fn resolve_local(&self, source: &str) -> Option<PathBuf> {
        let path = Path::new(source);
        if path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }
        let relative = source.trim_start_matches("./").trim_start_matches('/');
        self.search_dirs
            .iter()
            .map(|dir| dir.join(relative))
            .find(|candidate| candidate.is_file())
    }
}

impl ImageResolver for LocalImageResolver {
    fn resolve(&self, source: &str) -> Option<PathBuf> {
        let source = source.trim();
        if source.is_empty() {
            return None;
        }
        if is_remote(source) {
            self.resolve_remote(source)
        } else {
            self.resolve_local(source)
        }
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Cache file name for a remote URL: hex SHA-256 of the URL plus the
/// extension taken from the URL path (`.jpg` when unknown).
pub fn cache_file_name(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("{}{}", hex::encode(digest), url_extension(url))
}

fn url_extension(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let Some((_, path)) = path.split_once('/') else {
        return DEFAULT_EXTENSION.to_string();
    };
    let file = path.rsplit('/').next().unwrap_or_default();
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
                format!(".{}", ext)
            } else {
                DEFAULT_EXTENSION.to_string()
            }
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}
