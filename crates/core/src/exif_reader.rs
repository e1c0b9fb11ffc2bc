use crate::metadata::{normalize, MediaMetadata, MetadataError, MetadataSource, Timestamp};
use exif::{Exif, In, Reader, Tag, Value};
use image::{ImageFormat, ImageReader};
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Tried in this order, first parseable value wins.
const TIMESTAMP_TAGS: &[Tag] = &[Tag::DateTimeDigitized, Tag::DateTimeOriginal, Tag::DateTime];

const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"heim", b"heis", b"hevc", b"hevx", b"hevm", b"hevs", b"mif1", b"msf1",
];

/// What the decoder learned about a file that turned out to be an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub height: u32,
    pub ext: String,
    /// The format can carry an EXIF block at all.
    pub exif_container: bool,
}

impl ImageInfo {
    /// Record for an image whose EXIF carries no usable timestamp.
    pub fn with_modified_time(&self, path: &Path) -> anyhow::Result<MediaMetadata> {
        Ok(MediaMetadata {
            source: MetadataSource::ImageModified,
            ext: self.ext.clone(),
            height: self.height,
            timestamp: Timestamp::file_modified(path)?,
            artist: String::new(),
            make: String::new(),
            model: String::new(),
        })
    }
}

pub fn open_image(path: &Path) -> Result<ImageInfo, MetadataError> {
    if is_heif(path) {
        let height = read_exif(path)
            .ok()
            .and_then(|exif| exif_height(&exif))
            .unwrap_or_else(|| {
                debug!("No pixel height in EXIF of {}, using 0", path.display());
                0
            });
        return Ok(ImageInfo {
            height,
            ext: extension_or(path, "heic"),
            exif_container: true,
        });
    }

    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|_| MetadataError::NotAnImageFile)?;
    let format = reader.format().ok_or(MetadataError::NotAnImageFile)?;
    let (_, height) = reader
        .into_dimensions()
        .map_err(|_| MetadataError::NotAnImageFile)?;

    let fallback_ext = format.extensions_str().first().copied().unwrap_or_default();
    Ok(ImageInfo {
        height,
        ext: extension_or(path, fallback_ext),
        exif_container: matches!(
            format,
            ImageFormat::Jpeg | ImageFormat::Tiff | ImageFormat::Png | ImageFormat::WebP
        ),
    })
}

pub fn read_image_metadata(path: &Path, info: &ImageInfo) -> Result<MediaMetadata, MetadataError> {
    if !info.exif_container {
        return Err(MetadataError::NoExifTimestamp);
    }
    let exif = read_exif(path)?;

    let mut first_raw = None;
    let mut timestamp = None;
    for tag in TIMESTAMP_TAGS {
        let Some(raw) = ascii_value(&exif, *tag) else {
            continue;
        };
        if let Some(parsed) = parse_exif_timestamp(&raw) {
            timestamp = Some(parsed);
            break;
        }
        first_raw.get_or_insert(raw);
    }

    let timestamp = match (timestamp, first_raw) {
        (Some(ts), _) => ts,
        (None, Some(raw)) => return Err(MetadataError::InvalidExifTimestamp(raw)),
        (None, None) => return Err(MetadataError::NoExifTimestamp),
    };

    Ok(MediaMetadata {
        source: MetadataSource::ImageExif,
        ext: info.ext.clone(),
        height: info.height,
        timestamp,
        artist: normalize(ascii_value(&exif, Tag::Artist)),
        make: normalize(ascii_value(&exif, Tag::Make)),
        model: normalize(ascii_value(&exif, Tag::Model)),
    })
}

/// Parses `YYYY:MM:DD hh:mm:ss` anywhere in the value.
/// The year may have 2 to 4 digits, every other field 1 or 2.
pub fn parse_exif_timestamp(input: &str) -> Option<Timestamp> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"([0-9]{2,4}):([0-9]{1,2}):([0-9]{1,2}) ([0-9]{1,2}):([0-9]{1,2}):([0-9]{1,2})")
            .expect("timestamp pattern is valid")
    });

    let caps = pattern.captures(input.trim())?;
    let field = |index: usize| caps.get(index)?.as_str().parse::<u32>().ok();
    Some(Timestamp {
        year: field(1)?,
        month: field(2)?,
        day: field(3)?,
        hour: field(4)?,
        minute: field(5)?,
        second: field(6)?,
    })
}

fn read_exif(path: &Path) -> Result<Exif, MetadataError> {
    let file = File::open(path).map_err(|err| MetadataError::InvalidExifData(err.to_string()))?;
    let mut buf = BufReader::new(file);
    Reader::new()
        .read_from_container(&mut buf)
        .map_err(|err| match err {
            exif::Error::NotFound(_) | exif::Error::NotSupported(_) => {
                MetadataError::NoExifTimestamp
            }
            other => MetadataError::InvalidExifData(other.to_string()),
        })
}

fn ascii_value(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).to_string()),
        _ => None,
    }
}

fn exif_height(exif: &Exif) -> Option<u32> {
    [Tag::PixelYDimension, Tag::ImageLength]
        .into_iter()
        .find_map(|tag| exif.get_field(tag, In::PRIMARY)?.value.get_uint(0))
}

fn is_heif(path: &Path) -> bool {
    let mut header = [0u8; 12];
    let Ok(mut file) = File::open(path) else {
        return false;
    };
    if file.read_exact(&mut header).is_err() {
        return false;
    }
    &header[4..8] == b"ftyp" && HEIF_BRANDS.iter().any(|brand| &header[8..12] == *brand)
}

fn extension_or(path: &Path, fallback: &str) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_string())
        .unwrap_or_else(|| fallback.to_string())
}
