use crate::collision::CollisionResolver;
use crate::decision::{Aborted, DecisionCache, Prompt};
use crate::resolver::{MetadataResolver, Resolution};
use crate::template::{
    append_extension, parse_template, render_stem, NameContext, TemplatePart, DEFAULT_TEMPLATE,
};
use crate::walker::{collect_folders, FolderBatch};
use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub inputs: Vec<PathBuf>,
    pub template: String,
    pub sequence_start: u64,
    pub recursive: bool,
    pub include_hidden: bool,
    pub dry_run: bool,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            template: DEFAULT_TEMPLATE.to_string(),
            sequence_start: 1,
            recursive: false,
            include_hidden: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct RenameSummary {
    /// Renamed, or would have been renamed in a dry run.
    pub processed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: Vec<FailedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameEvent<'a> {
    FolderStarted(&'a Path),
    Renamed { from: &'a Path, to: &'a Path },
    FolderFinished(&'a Path),
}

/// Walks every input and renames media files one at a time.
///
/// Returns [`Aborted`] as the error when the user chose to abort at a prompt.
pub fn run_rename(
    options: &RenameOptions,
    decisions: &mut DecisionCache,
    prompt: &mut dyn Prompt,
    mut on_event: impl FnMut(RenameEvent<'_>),
) -> Result<RenameSummary> {
    let parts = parse_template(&options.template)?;
    let mut summary = RenameSummary::default();
    let mut collisions = CollisionResolver::new();
    let mut resolver = MetadataResolver::new(decisions, prompt);

    for input in &options.inputs {
        if !input.exists() {
            warn!("Input does not exist: {}", input.display());
            summary.failed.push(FailedFile {
                path: input.clone(),
                reason: "Input does not exist".to_string(),
            });
            continue;
        }

        for folder in collect_folders(input, options.recursive, options.include_hidden) {
            on_event(RenameEvent::FolderStarted(&folder.path));
            process_folder(
                &folder,
                options,
                &parts,
                &mut resolver,
                &mut collisions,
                &mut summary,
                &mut on_event,
            )?;
            on_event(RenameEvent::FolderFinished(&folder.path));
        }
    }

    Ok(summary)
}

fn process_folder(
    folder: &FolderBatch,
    options: &RenameOptions,
    parts: &[TemplatePart],
    resolver: &mut MetadataResolver<'_>,
    collisions: &mut CollisionResolver,
    summary: &mut RenameSummary,
    on_event: &mut impl FnMut(RenameEvent<'_>),
) -> Result<()> {
    let folder_name = folder.folder_name();
    let seq_width = folder.seq_width();
    let mut seq = options.sequence_start;

    for file in &folder.files {
        let metadata = match resolver.resolve(file)? {
            Resolution::Resolved(metadata) => metadata,
            Resolution::Skip(reason) => {
                debug!("Skipping {}: {reason:?}", file.display());
                summary.skipped += 1;
                continue;
            }
            Resolution::Failed(reason) => {
                warn!("Failed to read {}: {reason}", file.display());
                summary.failed.push(FailedFile {
                    path: file.clone(),
                    reason,
                });
                continue;
            }
            Resolution::Abort => return Err(Aborted.into()),
        };

        let context = NameContext {
            folder: &folder_name,
            seq,
            seq_width,
        };
        seq += 1;

        let stem = render_stem(parts, &metadata, &context);
        let new_name = append_extension(stem.clone(), &metadata.ext);
        if stem.is_empty() || new_name == "." || new_name == ".." {
            warn!("Format string produced no usable name for {}", file.display());
            summary.failed.push(FailedFile {
                path: file.clone(),
                reason: "Format string produced an empty file name".to_string(),
            });
            continue;
        }

        let candidate = file.with_file_name(&new_name);
        if candidate == *file {
            debug!(
                "Skipping {}, it already has the correct file name",
                file.display()
            );
            summary.unchanged += 1;
            continue;
        }

        let target = match collisions.resolve(&candidate, file) {
            Ok(target) => target,
            Err(err) => {
                warn!("{err}");
                summary.failed.push(FailedFile {
                    path: file.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
        };
        if target == *file {
            debug!("Skipping {}, it already has a suffixed name", file.display());
            summary.unchanged += 1;
            continue;
        }

        if !options.dry_run {
            if let Err(err) = fs::rename(file, &target) {
                warn!("Failed to rename {}: {err}", file.display());
                summary.failed.push(FailedFile {
                    path: file.clone(),
                    reason: format!("Failed to rename file: {err}"),
                });
                continue;
            }
        } else {
            collisions.record_dry_run(file, &target);
        }

        summary.processed += 1;
        on_event(RenameEvent::Renamed {
            from: file,
            to: &target,
        });
    }

    Ok(())
}
