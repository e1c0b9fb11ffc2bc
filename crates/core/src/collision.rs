use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollisionError {
    #[error("No free file name left for {0}")]
    Exhausted(PathBuf),
    #[error("Path has no file name: {0}")]
    NoFileName(PathBuf),
}

/// Finds a free target path by adding `_1`, `_2`, ... before the extension.
///
/// The file being renamed never blocks its own name, so a file that already
/// carries a suffixed name keeps it on the next run.
///
/// A dry run mirrors the renames it skips: targets handed out are reserved and
/// the names their files would vacate are released.
#[derive(Debug, Default)]
pub struct CollisionResolver {
    reserved: HashSet<PathBuf>,
    released: HashSet<PathBuf>,
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, candidate: &Path, source: &Path) -> Result<PathBuf, CollisionError> {
        if !self.is_taken(candidate, source) {
            return Ok(candidate.to_path_buf());
        }

        let file_name = candidate
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| CollisionError::NoFileName(candidate.to_path_buf()))?;
        let (base, ext) = match file_name.rfind('.') {
            Some(index) => file_name.split_at(index),
            None => (file_name.as_str(), ""),
        };
        let parent = candidate.parent().unwrap_or_else(|| Path::new(""));

        let mut n = 1u64;
        loop {
            let next = parent.join(format!("{base}_{n}{ext}"));
            if !self.is_taken(&next, source) {
                return Ok(next);
            }
            n = n
                .checked_add(1)
                .ok_or_else(|| CollisionError::Exhausted(candidate.to_path_buf()))?;
        }
    }

    /// Records a rename that was not performed on disk.
    pub fn record_dry_run(&mut self, from: &Path, to: &Path) {
        self.released.insert(from.to_path_buf());
        self.reserved.insert(to.to_path_buf());
    }

    fn is_taken(&self, path: &Path, source: &Path) -> bool {
        if path == source {
            return false;
        }
        self.reserved.contains(path) || (path.exists() && !self.released.contains(path))
    }
}
