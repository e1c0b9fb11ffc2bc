use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MetadataSource {
    ImageExif,
    Video,
    ImageModified,
    FileModified,
}

/// Why a reader could not produce a record for a file.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("not an image file")]
    NotAnImageFile,
    #[error("not a video file")]
    NotAVideoFile,
    #[error("invalid EXIF data: {0}")]
    InvalidExifData(String),
    #[error("no EXIF timestamp")]
    NoExifTimestamp,
    #[error("invalid EXIF timestamp: {0}")]
    InvalidExifTimestamp(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl Timestamp {
    pub fn from_local(date: &DateTime<Local>) -> Self {
        Self {
            year: date.year().max(0) as u32,
            month: date.month(),
            day: date.day(),
            hour: date.hour(),
            minute: date.minute(),
            second: date.second(),
        }
    }

    pub fn file_modified(path: &Path) -> Result<Self> {
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .with_context(|| format!("Failed to read modification time: {}", path.display()))?;
        Ok(Self::from_local(&DateTime::<Local>::from(modified)))
    }
}

/// Everything a file name template can draw from, except `Folder` and `Seq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub source: MetadataSource,
    pub ext: String,
    pub height: u32,
    pub timestamp: Timestamp,
    pub artist: String,
    pub make: String,
    pub model: String,
}

impl MediaMetadata {
    /// Record built from the file system alone.
    pub fn from_file_modified(path: &Path) -> Result<Self> {
        Ok(Self {
            source: MetadataSource::FileModified,
            ext: file_extension(path),
            height: 0,
            timestamp: Timestamp::file_modified(path)?,
            artist: String::new(),
            make: String::new(),
            model: String::new(),
        })
    }

    pub fn height_label(&self) -> String {
        format!("{}px", self.height)
    }
}

pub fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub(crate) fn normalize(value: Option<String>) -> String {
    value
        .map(|v| v.trim_matches(|c: char| c.is_whitespace() || c == '\0').to_string())
        .unwrap_or_default()
}
