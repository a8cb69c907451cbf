//! Flat-file storage for screenshots, narration clips and sound effects

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

pub const SCREENSHOT_PATTERN: &str = "*.png";
pub const AUDIO_PATTERN: &str = "*.mp3";

/// Working directory shared by the capture loop, the tools and the player
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Open the directory, creating it if it does not exist yet
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// `prefix_YYYYmmdd_HHMMSS.ext` inside the storage dir
    pub fn timestamped(&self, prefix: &str, ext: &str) -> PathBuf {
        self.dir.join(timestamped_name(prefix, ext))
    }

    /// Delete the oldest files matching `pattern` until only `keep` remain
    pub fn prune(&self, pattern: &str, keep: usize) -> Result<usize> {
        let files = self.matching_by_age(pattern)?;
        let excess = files.len().saturating_sub(keep);

        for (path, _) in files.iter().take(excess) {
            debug!("Removing old file: {}", path.display());
            fs::remove_file(path)?;
        }

        Ok(excess)
    }

    /// Newest-first list of at most `count` files matching `pattern`
    pub fn latest(&self, pattern: &str, count: usize) -> Result<Vec<PathBuf>> {
        let files = self.matching_by_age(pattern)?;
        Ok(files
            .into_iter()
            .rev()
            .take(count)
            .map(|(path, _)| path)
            .collect())
    }

    /// Oldest-first list of regular files directly inside the dir
    fn matching_by_age(&self, pattern: &str) -> Result<Vec<(PathBuf, SystemTime)>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let name = entry.file_name();
            if !glob_match::glob_match(pattern, &name.to_string_lossy()) {
                continue;
            }

            let modified = entry.metadata()?.modified()?;
            files.push((path, modified));
        }

        // Name breaks ties; timestamped names sort chronologically
        files.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(files)
    }
}

pub fn timestamped_name(prefix: &str, ext: &str) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S"),
        ext
    )
}

/// Turn a sound effect title into a cache-safe file stem
pub fn sanitize_filename(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    // Each whitespace run becomes one underscore, leading and trailing runs included
    let mut safe = String::with_capacity(kept.len());
    let mut in_run = false;
    for c in kept.chars() {
        if c.is_whitespace() {
            if !in_run {
                safe.push('_');
            }
            in_run = true;
        } else {
            safe.push(c);
            in_run = false;
        }
    }

    safe.chars().take(50).collect::<String>().to_lowercase()
}

/// An image read from disk, ready to inline into a model request
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub mime_type: &'static str,
    pub data: String,
}

pub fn encode_image(path: &Path) -> Result<EncodedImage> {
    let bytes = fs::read(path)?;
    Ok(EncodedImage {
        mime_type: image_mime_type(path),
        data: STANDARD.encode(bytes),
    })
}

fn image_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/png",
    }
}
