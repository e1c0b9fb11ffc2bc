use crate::decision::{BulkChoice, DecisionCache, DecisionCategory, Prompt};
use crate::exif_reader::{open_image, read_image_metadata, ImageInfo};
use crate::metadata::{file_extension, MediaMetadata, MetadataError};
use crate::video_reader::read_video_metadata;
use anyhow::Result;
use std::path::Path;
use tracing::{debug, info, warn};

/// Extensions treated as videos even when their container can not be read.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "3gp"];

#[derive(Debug)]
pub enum Resolution {
    Resolved(MediaMetadata),
    Skip(SkipReason),
    /// The file could not be read, the run goes on.
    Failed(String),
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotMedia,
    DeclinedExiflessImage,
    DeclinedUnreadableVideo,
}

enum Step {
    Resolved(MediaMetadata),
    TryNext,
    Skip(SkipReason),
    Failed(String),
    Abort,
}

#[derive(Debug, Clone, Copy)]
enum Strategy {
    ImageExif,
    VideoContainer,
    UnreadableVideo,
    ExiflessImage,
}

const STRATEGIES: [Strategy; 4] = [
    Strategy::ImageExif,
    Strategy::VideoContainer,
    Strategy::UnreadableVideo,
    Strategy::ExiflessImage,
];

/// What earlier strategies found out about the file.
#[derive(Debug, Default)]
struct Findings {
    /// Set when the file is an image without a usable timestamp.
    exifless_image: Option<ImageInfo>,
    not_an_image: bool,
    not_a_video: bool,
}

pub struct MetadataResolver<'a> {
    decisions: &'a mut DecisionCache,
    prompt: &'a mut dyn Prompt,
}

impl<'a> MetadataResolver<'a> {
    pub fn new(decisions: &'a mut DecisionCache, prompt: &'a mut dyn Prompt) -> Self {
        Self { decisions, prompt }
    }

    pub fn resolve(&mut self, path: &Path) -> Result<Resolution> {
        let mut findings = Findings::default();
        for strategy in STRATEGIES {
            match self.attempt(strategy, path, &mut findings)? {
                Step::TryNext => continue,
                Step::Resolved(meta) => return Ok(Resolution::Resolved(meta)),
                Step::Skip(reason) => return Ok(Resolution::Skip(reason)),
                Step::Failed(reason) => return Ok(Resolution::Failed(reason)),
                Step::Abort => return Ok(Resolution::Abort),
            }
        }
        debug!("{} is neither an image nor a video file", path.display());
        Ok(Resolution::Skip(SkipReason::NotMedia))
    }

    fn attempt(&mut self, strategy: Strategy, path: &Path, findings: &mut Findings) -> Result<Step> {
        match strategy {
            Strategy::ImageExif => Ok(image_exif(path, findings)),
            Strategy::VideoContainer => {
                if !findings.not_an_image {
                    return Ok(Step::TryNext);
                }
                match read_video_metadata(path) {
                    Ok(meta) => Ok(Step::Resolved(meta)),
                    Err(_) => {
                        findings.not_a_video = true;
                        Ok(Step::TryNext)
                    }
                }
            }
            Strategy::UnreadableVideo => {
                if !findings.not_a_video {
                    return Ok(Step::TryNext);
                }
                if !has_video_extension(path) {
                    return Ok(Step::Skip(SkipReason::NotMedia));
                }
                warn!("{} is a video file, but it can not be opened", path.display());
                let message = format!("Process file time stamp {}?", path.display());
                let choice =
                    self.decisions
                        .decide(DecisionCategory::UnreadableVideo, &message, self.prompt)?;
                match choice {
                    BulkChoice::Abort => Ok(Step::Abort),
                    choice if choice.accepts() => {
                        Ok(file_time_step(MediaMetadata::from_file_modified(path)))
                    }
                    _ => Ok(Step::Skip(SkipReason::DeclinedUnreadableVideo)),
                }
            }
            Strategy::ExiflessImage => {
                let Some(image) = findings.exifless_image.take() else {
                    return Ok(Step::TryNext);
                };
                info!("{} does not contain a usable timestamp in EXIF", path.display());
                let message = format!(
                    "Use file modification time for {}, which has no EXIF timestamp?",
                    path.display()
                );
                let choice =
                    self.decisions
                        .decide(DecisionCategory::ExiflessImage, &message, self.prompt)?;
                match choice {
                    BulkChoice::Abort => Ok(Step::Abort),
                    choice if choice.accepts() => Ok(file_time_step(image.with_modified_time(path))),
                    _ => Ok(Step::Skip(SkipReason::DeclinedExiflessImage)),
                }
            }
        }
    }
}

fn image_exif(path: &Path, findings: &mut Findings) -> Step {
    let image = match open_image(path) {
        Ok(image) => image,
        Err(_) => {
            findings.not_an_image = true;
            return Step::TryNext;
        }
    };

    match read_image_metadata(path, &image) {
        Ok(meta) => Step::Resolved(meta),
        Err(err) => {
            if let MetadataError::InvalidExifData(reason) = &err {
                warn!("Could not read EXIF data from {}: {reason}", path.display());
            } else {
                debug!("{}: {err}", path.display());
            }
            findings.exifless_image = Some(image);
            Step::TryNext
        }
    }
}

fn file_time_step(record: Result<MediaMetadata>) -> Step {
    match record {
        Ok(meta) => Step::Resolved(meta),
        Err(err) => Step::Failed(format!("{err:#}")),
    }
}

pub fn has_video_extension(path: &Path) -> bool {
    let ext = file_extension(path);
    VIDEO_EXTENSIONS
        .iter()
        .any(|video| video.eq_ignore_ascii_case(&ext))
}

#[cfg(test)]
mod tests {
    use super::{file_time_step, has_video_extension, MetadataResolver, Resolution, SkipReason, Step};
    use crate::decision::test_support::ScriptedPrompt;
    use crate::decision::{BulkChoice, DecisionCache};
    use crate::exif_reader::test_support::write_jpeg_with_exif;
    use crate::exif_reader::open_image;
    use crate::metadata::{MediaMetadata, MetadataSource};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const DATE_TIME: u16 = 0x0132;
    const MAKE: u16 = 0x010F;

    fn resolve(path: &Path, cache: &mut DecisionCache, prompt: &mut ScriptedPrompt) -> Resolution {
        MetadataResolver::new(cache, prompt)
            .resolve(path)
            .expect("resolve")
    }

    #[test]
    fn exif_image_resolves_without_prompting() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("a.jpg");
        write_jpeg_with_exif(&path, 40, &[(DATE_TIME, "2014:05:09 10:00:00")]);

        let mut cache = DecisionCache::new();
        let mut prompt = ScriptedPrompt::default();
        let Resolution::Resolved(meta) = resolve(&path, &mut cache, &mut prompt) else {
            panic!("expected a record");
        };
        assert_eq!(meta.source, MetadataSource::ImageExif);
        assert_eq!(meta.height, 40);
        assert!(prompt.asked.is_empty());
    }

    #[test]
    fn exifless_image_uses_modified_time_when_accepted() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("b.jpg");
        write_jpeg_with_exif(&path, 24, &[(MAKE, "PENTAX")]);

        let mut cache = DecisionCache::new();
        let mut prompt = ScriptedPrompt::new(&[BulkChoice::Yes]);
        let Resolution::Resolved(meta) = resolve(&path, &mut cache, &mut prompt) else {
            panic!("expected a record");
        };
        assert_eq!(meta.source, MetadataSource::ImageModified);
        assert_eq!(meta.height, 24);
        assert_eq!(meta.ext, "jpg");
        assert_eq!(prompt.asked.len(), 1);
    }

    #[test]
    fn exifless_image_is_skipped_when_declined() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("b.jpg");
        write_jpeg_with_exif(&path, 24, &[(MAKE, "PENTAX")]);

        let mut cache = DecisionCache::new();
        let mut prompt = ScriptedPrompt::new(&[BulkChoice::Never]);
        for _ in 0..2 {
            let resolution = resolve(&path, &mut cache, &mut prompt);
            assert!(matches!(
                resolution,
                Resolution::Skip(SkipReason::DeclinedExiflessImage)
            ));
        }
        assert_eq!(prompt.asked.len(), 1);
    }

    #[test]
    fn unreadable_video_always_uses_file_time_without_asking_again() {
        let temp = tempdir().expect("tempdir");
        let first = temp.path().join("clip1.mp4");
        let second = temp.path().join("clip2.MOV");
        let third = temp.path().join("clip3.3gp");
        for path in [&first, &second, &third] {
            fs::write(path, b"definitely not a container").expect("write");
        }

        let mut cache = DecisionCache::new();
        let mut prompt = ScriptedPrompt::new(&[BulkChoice::Always]);
        for path in [&first, &second, &third] {
            let Resolution::Resolved(meta) = resolve(path, &mut cache, &mut prompt) else {
                panic!("expected a record for {}", path.display());
            };
            assert_eq!(meta.source, MetadataSource::FileModified);
            assert_eq!(meta.height_label(), "0px");
        }
        assert_eq!(prompt.asked.len(), 1);
        assert!(prompt.asked[0].contains("clip1.mp4"));
    }

    #[test]
    fn unreadable_video_abort_stops() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("clip.mp4");
        fs::write(&path, b"broken").expect("write");

        let mut cache = DecisionCache::new();
        let mut prompt = ScriptedPrompt::new(&[BulkChoice::Abort]);
        assert!(matches!(
            resolve(&path, &mut cache, &mut prompt),
            Resolution::Abort
        ));
    }

    #[test]
    fn other_files_are_skipped_silently() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("notes.txt");
        fs::write(&path, b"hello").expect("write");

        let mut cache = DecisionCache::new();
        let mut prompt = ScriptedPrompt::new(&[BulkChoice::Always]);
        assert!(matches!(
            resolve(&path, &mut cache, &mut prompt),
            Resolution::Skip(SkipReason::NotMedia)
        ));
        assert!(prompt.asked.is_empty());
    }

    #[test]
    fn vanished_file_fails_instead_of_stopping() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("a.jpg");
        write_jpeg_with_exif(&path, 10, &[(MAKE, "PENTAX")]);
        let image = open_image(&path).expect("image");
        fs::remove_file(&path).expect("remove");

        let step = file_time_step(image.with_modified_time(&path));
        assert!(matches!(step, Step::Failed(reason) if reason.contains("a.jpg")));
        let step = file_time_step(MediaMetadata::from_file_modified(&path));
        assert!(matches!(step, Step::Failed(_)));
    }

    #[test]
    fn video_extension_set_is_fixed() {
        assert!(has_video_extension(Path::new("a.mp4")));
        assert!(has_video_extension(Path::new("a.MOV")));
        assert!(has_video_extension(Path::new("a.3gp")));
        assert!(!has_video_extension(Path::new("a.mkv")));
        assert!(!has_video_extension(Path::new("mp4")));
    }
}
