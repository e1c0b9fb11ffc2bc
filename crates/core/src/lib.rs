mod collision;
mod config;
mod decision;
mod exif_reader;
mod metadata;
mod renamer;
mod resolver;
mod sanitize;
mod template;
mod video_reader;
mod walker;

pub use collision::{CollisionError, CollisionResolver};
pub use config::{config_path, load_config, load_config_from, AppConfig};
pub use decision::{Aborted, BulkChoice, DecisionCache, DecisionCategory, LinePrompt, Prompt};
pub use metadata::{MediaMetadata, MetadataError, MetadataSource, Timestamp};
pub use renamer::{run_rename, FailedFile, RenameEvent, RenameOptions, RenameSummary};
pub use resolver::{MetadataResolver, Resolution, SkipReason, VIDEO_EXTENSIONS};
pub use template::{
    format_filename, parse_template, validate_template, Field, NameContext, TemplateError, TemplatePart,
    DEFAULT_TEMPLATE, FIELD_NAMES,
};
pub use walker::{collect_folders, FolderBatch};
