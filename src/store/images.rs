use crate::error::Result;
use log::{debug, warn};
use reqwest::Url;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Local directory holding downloaded recipe images.
///
/// Callers only ever see file names; every name is resolved against the configured
/// directory, so stored names stay valid whatever the working directory is.
#[derive(Debug, Clone)]
pub struct ImageCache {
    dir: PathBuf,
}

impl ImageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path of a cached file. Only the last component of `name` is used.
    pub fn path(&self, name: &str) -> PathBuf {
        match Path::new(name).file_name() {
            Some(file_name) => self.dir.join(file_name),
            None => self.dir.join(name),
        }
    }

    /// Write `bytes` downloaded from `url` and return the new file's name.
    ///
    /// Never overwrites: when the derived name is taken a unique prefix is added.
    pub fn store(&self, url: &str, bytes: &[u8]) -> Result<String> {
        fs::create_dir_all(&self.dir)?;

        let mut name = file_name_for(url);
        if self.dir.join(&name).exists() {
            name = format!("{}-{}", Uuid::new_v4().simple(), name);
        }

        let path = self.dir.join(&name);
        fs::write(&path, bytes)?;
        debug!("Cached {} bytes from {} at {}", bytes.len(), url, path.display());
        Ok(name)
    }

    /// Remove a cached file by name. Missing files are fine, other failures are only logged.
    pub fn remove(&self, name: &str) {
        let path = self.path(name);
        match fs::remove_file(&path) {
            Ok(()) => debug!("Removed cached image {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Cached image {} already gone", path.display())
            }
            Err(e) => warn!("Could not remove cached image {}: {}", path.display(), e),
        }
    }
}

/// File name for an image URL: the last path segment when it carries a known image
/// extension, otherwise a generated `<uuid>.jpg`.
pub fn file_name_for(url: &str) -> String {
    let segment = Url::parse(url).ok().and_then(|parsed| {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
    });

    let sanitized = segment.map(|segment| {
        segment
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>()
    });

    match sanitized {
        Some(name) if has_image_extension(&name) && !name.starts_with('.') => name,
        _ => format!("{}.jpg", Uuid::new_v4().simple()),
    }
}

fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
