//! Filesystem collaborators of the batch: video classification, folder
//! scanning and the rename primitive.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ts", "m2ts", "3gp",
    "ogv", "vob",
];

/// What the batch needs from the filesystem. [`LocalFiles`] is the real one;
/// tests substitute their own.
pub trait MediaFiles {
    fn is_video(&self, path: &Path) -> bool;
    fn exists(&self, path: &Path) -> bool;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFiles;

impl MediaFiles for LocalFiles {
    fn is_video(&self, path: &Path) -> bool {
        is_video_path(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}

pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

pub fn is_video_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

/// Lists the video files directly inside `folder`, sorted. Subdirectories
/// are not entered. A read error ends the scan with whatever was found.
pub fn scan_folder(folder: &Path) -> Vec<PathBuf> {
    let mut videos = Vec::new();

    let entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read folder {}: {}", folder.display(), e);
            return videos;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Stopped scanning {}: {}", folder.display(), e);
                break;
            }
        };
        let path = entry.path();
        if path.is_file() && is_video_path(&path) {
            videos.push(path);
        }
    }

    videos.sort();
    debug!("Found {} video files in {}", videos.len(), folder.display());
    videos
}

/// Runs [`scan_folder`] on the blocking pool; the caller gets the list back
/// and feeds it to the batch itself.
pub async fn scan_folder_blocking(folder: PathBuf) -> Result<Vec<PathBuf>> {
    tokio::task::spawn_blocking(move || scan_folder(&folder))
        .await
        .context("Folder scan task failed")
}

/// Expands command-line arguments: directories are scanned, files are kept
/// as given.
pub async fn collect_paths(inputs: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            paths.extend(scan_folder_blocking(input).await?);
        } else {
            paths.push(input);
        }
    }
    Ok(paths)
}
