use crate::sanitize::is_hidden_name;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Files of one directory, processed together with one sequence counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderBatch {
    pub path: PathBuf,
    /// Sorted by file name, hidden files already removed unless included.
    pub files: Vec<PathBuf>,
    /// Every regular file in the directory, hidden ones too.
    pub file_count: usize,
}

impl FolderBatch {
    /// Digits needed to print the directory's file count.
    pub fn seq_width(&self) -> usize {
        self.file_count.max(1).to_string().len()
    }

    pub fn folder_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Directories below `root` in sorted order, or a single batch for a file root.
///
/// Directories that can not be read are logged and left out.
pub fn collect_folders(root: &Path, recursive: bool, include_hidden: bool) -> Vec<FolderBatch> {
    if root.is_file() {
        let parent = root.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        return vec![FolderBatch {
            path: parent,
            files: vec![root.to_path_buf()],
            file_count: 1,
        }];
    }

    let walker = WalkDir::new(root)
        .max_depth(if recursive { usize::MAX } else { 0 })
        .sort_by_file_name();

    let mut folders = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|entry| include_hidden || !is_hidden_entry(entry))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable directory entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(folder) = read_folder(entry.path(), include_hidden) {
            folders.push(folder);
        }
    }

    folders
}

fn read_folder(dir: &Path, include_hidden: bool) -> Option<FolderBatch> {
    let mut files = Vec::new();
    let mut file_count = 0usize;

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Skipping unreadable directory {}: {err}", dir.display());
            return None;
        }
    };
    for entry in entries {
        let Ok(entry) = entry else {
            warn!("Failed to read an entry in {}", dir.display());
            continue;
        };
        let Ok(file_type) = entry.file_type() else {
            warn!("Failed to read file type: {}", entry.path().display());
            continue;
        };
        if !file_type.is_file() {
            continue;
        }
        file_count += 1;

        if !include_hidden && is_hidden_name(&entry.file_name().to_string_lossy()) {
            continue;
        }
        files.push(entry.path());
    }
    files.sort();

    Some(FolderBatch {
        path: dir.to_path_buf(),
        files,
        file_count,
    })
}

/// The walk root itself is never hidden, the user named it explicitly.
fn is_hidden_entry(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && is_hidden_name(&entry.file_name().to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::{collect_folders, read_folder, FolderBatch};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn names(batch: &FolderBatch) -> Vec<String> {
        batch
            .files
            .iter()
            .map(|p| p.file_name().expect("name").to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn top_level_only_without_recursion() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("photos");
        fs::create_dir_all(root.join("nested")).expect("mkdir");
        fs::write(root.join("b.jpg"), b"x").expect("write");
        fs::write(root.join("a.jpg"), b"x").expect("write");
        fs::write(root.join("nested").join("c.jpg"), b"x").expect("write");

        let folders = collect_folders(&root, false, false);
        assert_eq!(folders.len(), 1);
        assert_eq!(names(&folders[0]), vec!["a.jpg", "b.jpg"]);
        assert_eq!(folders[0].folder_name(), "photos");
    }

    #[test]
    fn recursion_visits_nested_directories_in_order() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().to_path_buf();
        fs::create_dir_all(root.join("b")).expect("mkdir");
        fs::create_dir_all(root.join("a").join("deep")).expect("mkdir");
        fs::write(root.join("a").join("deep").join("x.jpg"), b"x").expect("write");

        let folders = collect_folders(&root, true, false);
        let paths: Vec<PathBuf> = folders.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                root.clone(),
                root.join("a"),
                root.join("a").join("deep"),
                root.join("b")
            ]
        );
    }

    #[test]
    fn hidden_entries_are_skipped_unless_included() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("album");
        fs::create_dir_all(root.join(".cache").join("inner")).expect("mkdir");
        fs::write(root.join(".DS_Store"), b"x").expect("write");
        fs::write(root.join("a.jpg"), b"x").expect("write");

        let folders = collect_folders(&root, true, false);
        assert_eq!(folders.len(), 1);
        assert_eq!(names(&folders[0]), vec!["a.jpg"]);
        assert_eq!(folders[0].file_count, 2);

        let folders = collect_folders(&root, true, true);
        assert_eq!(folders.len(), 3);
        assert_eq!(names(&folders[0]), vec![".DS_Store", "a.jpg"]);
    }

    #[test]
    fn unreadable_directory_is_left_out() {
        let temp = tempdir().expect("tempdir");
        assert!(read_folder(&temp.path().join("gone"), false).is_none());

        let root = temp.path().join("album");
        fs::create_dir_all(&root).expect("mkdir");
        fs::write(root.join("a.jpg"), b"x").expect("write");
        assert!(collect_folders(&temp.path().join("gone"), true, false).is_empty());
        assert_eq!(collect_folders(&root, true, false).len(), 1);
    }

    #[test]
    fn sequence_width_follows_file_count() {
        let batch = |file_count| FolderBatch {
            path: PathBuf::from("/x"),
            files: Vec::new(),
            file_count,
        };
        assert_eq!(batch(0).seq_width(), 1);
        assert_eq!(batch(9).seq_width(), 1);
        assert_eq!(batch(10).seq_width(), 2);
        assert_eq!(batch(120).seq_width(), 3);
    }

    #[test]
    fn file_root_is_its_own_batch() {
        let temp = tempdir().expect("tempdir");
        let file = temp.path().join("a.jpg");
        fs::write(&file, b"x").expect("write");

        let folders = collect_folders(&file, false, false);
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].path, temp.path());
        assert_eq!(folders[0].files, vec![file]);
        assert_eq!(folders[0].seq_width(), 1);
    }
}
