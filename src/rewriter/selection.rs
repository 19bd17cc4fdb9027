//! Selection of the files a rewrite pass works on.

use std::{
    io,
    path::{Component, Path, PathBuf},
};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::{
    rewriter::{ChangeSet, FileStatus},
    Error, Result,
};

/// Extension of compiled class files.
pub(crate) const CLASS_EXTENSION: &str = "class";

/// Files to process and outputs to delete, relative to the input root.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Selection {
    /// Class files to load, rewrite and write
    pub classes: Vec<PathBuf>,
    /// Inputs whose outputs must disappear
    pub removed: Vec<PathBuf>,
    /// Selected regular files without the class extension
    pub ignored: usize,
    /// Whether the whole input root was selected
    pub full_rebuild: bool,
}

/// Selects the work for `changes` against `input_root`.
///
/// # Errors
/// Returns [`crate::Error::Configuration`] for change-set paths outside `input_root` and
/// [`crate::Error::Io`] if the tree cannot be walked or an existing changed file cannot be
/// inspected. Added or changed paths that no longer exist are skipped.
pub(crate) fn select(input_root: &Path, changes: &ChangeSet) -> Result<Selection> {
    if changes.is_full_rebuild() {
        return walk(input_root);
    }

    let mut selection = Selection::default();
    for (path, status) in changes.iter() {
        let relative = relative_to(input_root, path)?;
        match status {
            FileStatus::Removed => selection.removed.push(relative),
            FileStatus::Unchanged => {}
            FileStatus::Added | FileStatus::Changed => {
                let absolute = input_root.join(&relative);
                let metadata = match std::fs::symlink_metadata(&absolute) {
                    Ok(metadata) => metadata,
                    Err(error) if error.kind() == io::ErrorKind::NotFound => {
                        debug!("Skipping missing {}", absolute.display());
                        continue;
                    }
                    Err(error) => return Err(Error::io(&absolute, error)),
                };
                if metadata.file_type().is_symlink() {
                    warn!("Skipping symbolic link {}", absolute.display());
                } else if metadata.is_file() {
                    selection.push_file(relative);
                }
            }
        }
    }
    Ok(selection)
}

fn walk(input_root: &Path) -> Result<Selection> {
    let mut selection = Selection {
        full_rebuild: true,
        ..Selection::default()
    };

    for entry in WalkDir::new(input_root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|error| {
            let path = error
                .path()
                .map_or_else(|| input_root.to_path_buf(), Path::to_path_buf);
            Error::io(path, io::Error::from(error))
        })?;

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            warn!("Skipping symbolic link {}", entry.path().display());
        } else if file_type.is_file() {
            let relative = entry
                .path()
                .strip_prefix(input_root)
                .map_err(|_| {
                    Error::Error(format!(
                        "Walked '{}' outside of '{}'",
                        entry.path().display(),
                        input_root.display()
                    ))
                })?
                .to_path_buf();
            selection.push_file(relative);
        }
    }
    Ok(selection)
}

impl Selection {
    fn push_file(&mut self, relative: PathBuf) {
        if is_class_file(&relative) {
            self.classes.push(relative);
        } else {
            self.ignored += 1;
        }
    }
}

/// Returns `true` if `path` has the class file extension.
pub(crate) fn is_class_file(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == CLASS_EXTENSION)
}

/// Resolves a change-set path to a path relative to `input_root`.
fn relative_to(input_root: &Path, path: &Path) -> Result<PathBuf> {
    let relative = if path.is_absolute() {
        path.strip_prefix(input_root).map_err(|_| {
            Error::Configuration(format!(
                "'{}' is not below the input root '{}'",
                path.display(),
                input_root.display()
            ))
        })?
    } else {
        path
    };

    if relative.as_os_str().is_empty()
        || !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(Error::Configuration(format!(
            "'{}' does not name a file below the input root '{}'",
            path.display(),
            input_root.display()
        )));
    }
    Ok(relative.to_path_buf())
}

/// Binary class name of a class file at `relative`: separators become dots, the extension is
/// dropped.
///
/// # Errors
/// Returns [`crate::Error::ClassNotFound`] if the path is not valid UTF-8.
pub(crate) fn binary_class_name(relative: &Path) -> Result<String> {
    let stem = relative.with_extension("");
    let mut segments = Vec::new();
    for component in stem.components() {
        let Some(segment) = component.as_os_str().to_str() else {
            return Err(Error::ClassNotFound(relative.display().to_string()));
        };
        segments.push(segment);
    }
    Ok(segments.join("."))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn full_rebuild_walks_every_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "com/app/Main.class");
        touch(dir.path(), "com/app/Main$1.class");
        touch(dir.path(), "META-INF/app.kotlin_module");
        fs::create_dir_all(dir.path().join("empty")).unwrap();

        let selection = select(dir.path(), &ChangeSet::new()).unwrap();
        assert!(selection.full_rebuild);
        assert_eq!(
            selection.classes,
            vec![
                PathBuf::from("com/app/Main$1.class"),
                PathBuf::from("com/app/Main.class")
            ]
        );
        assert_eq!(selection.ignored, 1);
        assert!(selection.removed.is_empty());
    }

    #[test]
    fn incremental_selects_by_status() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "A.class");
        touch(dir.path(), "B.class");
        touch(dir.path(), "notes.txt");
        fs::create_dir_all(dir.path().join("pkg")).unwrap();

        let changes: ChangeSet = [
            (dir.path().join("A.class"), FileStatus::Changed),
            (PathBuf::from("B.class"), FileStatus::Unchanged),
            (PathBuf::from("notes.txt"), FileStatus::Added),
            (PathBuf::from("pkg"), FileStatus::Changed),
            (PathBuf::from("Gone.class"), FileStatus::Removed),
        ]
        .into_iter()
        .collect();

        let selection = select(dir.path(), &changes).unwrap();
        assert!(!selection.full_rebuild);
        assert_eq!(selection.classes, vec![PathBuf::from("A.class")]);
        assert_eq!(selection.removed, vec![PathBuf::from("Gone.class")]);
        assert_eq!(selection.ignored, 1);
    }

    #[test]
    fn paths_outside_root_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();

        for path in [
            other.path().join("A.class"),
            PathBuf::from("../A.class"),
        ] {
            let changes: ChangeSet = [(path, FileStatus::Changed)].into_iter().collect();
            assert!(matches!(
                select(dir.path(), &changes),
                Err(Error::Configuration(_))
            ));
        }
    }

    #[test]
    fn missing_changed_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "com/lib/a/Screen.class");

        let changes: ChangeSet = [
            ("com/lib/a/Screen.class", FileStatus::Changed),
            ("com/lib/a/Vanished.class", FileStatus::Added),
            ("com/lib/a/Gone.class", FileStatus::Changed),
        ]
        .into_iter()
        .collect();

        let selection = select(dir.path(), &changes).unwrap();
        assert_eq!(
            selection.classes,
            vec![PathBuf::from("com/lib/a/Screen.class")]
        );
        assert_eq!(selection.ignored, 0);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Real.class");
        std::os::unix::fs::symlink(dir.path().join("Real.class"), dir.path().join("Link.class"))
            .unwrap();

        let selection = select(dir.path(), &ChangeSet::new()).unwrap();
        assert_eq!(selection.classes, vec![PathBuf::from("Real.class")]);

        let changes: ChangeSet = [("Link.class", FileStatus::Changed)].into_iter().collect();
        assert!(select(dir.path(), &changes).unwrap().classes.is_empty());
    }

    #[test]
    fn class_names_from_paths() {
        assert_eq!(
            binary_class_name(Path::new("com/app/R$string.class")).unwrap(),
            "com.app.R$string"
        );
        assert_eq!(binary_class_name(Path::new("Main.class")).unwrap(), "Main");
        assert!(is_class_file(Path::new("a/B.class")));
        assert!(!is_class_file(Path::new("a/B.classes")));
        assert!(!is_class_file(Path::new("class")));
    }
}
