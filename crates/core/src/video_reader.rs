use crate::metadata::{file_extension, MediaMetadata, MetadataError, MetadataSource, Timestamp};
use serde::Deserialize;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use tracing::warn;

const FFPROBE: &str = "ffprobe";

/// Demuxers that turn plain text into a "video" stream.
const TEXT_FORMATS: &[&str] = &["tty"];

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    height: Option<u32>,
    #[serde(default)]
    disposition: Disposition,
}

#[derive(Debug, Default, Deserialize)]
struct Disposition {
    #[serde(default)]
    attached_pic: u8,
}

pub fn ffprobe_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        let found = Command::new(FFPROBE)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success());
        if !found {
            warn!("ffprobe was not found, video files can not be inspected");
        }
        found
    })
}

pub fn read_video_metadata(path: &Path) -> Result<MediaMetadata, MetadataError> {
    if !ffprobe_available() {
        return Err(MetadataError::NotAVideoFile);
    }

    let output = Command::new(FFPROBE)
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|_| MetadataError::NotAVideoFile)?;
    if !output.status.success() {
        return Err(MetadataError::NotAVideoFile);
    }

    let height = parse_video_height(&output.stdout).ok_or(MetadataError::NotAVideoFile)?;
    let timestamp = Timestamp::file_modified(path).map_err(|_| MetadataError::NotAVideoFile)?;

    Ok(MediaMetadata {
        source: MetadataSource::Video,
        ext: file_extension(path),
        height,
        timestamp,
        artist: String::new(),
        make: String::new(),
        model: String::new(),
    })
}

/// Height of the last real video stream in ffprobe JSON output.
/// Cover art attached to audio files does not count.
fn parse_video_height(json: &[u8]) -> Option<u32> {
    let probe: ProbeOutput = serde_json::from_slice(json).ok()?;
    let format_name = probe
        .format
        .as_ref()
        .and_then(|format| format.format_name.as_deref())
        .unwrap_or_default();
    if TEXT_FORMATS.contains(&format_name) {
        return None;
    }

    probe
        .streams
        .iter()
        .filter(|stream| stream.codec_type.as_deref() == Some("video"))
        .filter(|stream| stream.disposition.attached_pic == 0)
        .last()
        .map(|stream| stream.height.unwrap_or(0))
}
