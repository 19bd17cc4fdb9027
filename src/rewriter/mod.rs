//! Incremental rewriting of a class directory.
//!
//! A [`crate::Rewriter`] applies a [`crate::RenameTable`] to the class files of an input
//! directory and writes the results to an output directory. It only touches what the
//! [`crate::ChangeSet`] of an invocation names:
//!
//! - An empty change set rebuilds everything below the input root
//! - `Removed` entries delete their output
//! - `Added` and `Changed` entries are rewritten
//! - `Unchanged` entries are ignored
//!
//! Only files with the `class` extension are rewritten; other files are counted and left
//! alone. The output of a class is `<output root>/<relative input path>`.
//!
//! # Failure Policy
//!
//! The first load, rewrite or I/O failure aborts the pass and is returned. Outputs written
//! before the failure stay in place, so a failed invocation has to be followed by a full
//! rebuild.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rembed::{ChangeSet, FileStatus, RenameTable, Rewriter, RewriterConfig};
//!
//! let table = RenameTable::build(["com.lib.a", "com.lib.b"], "com.app");
//! let rewriter = Rewriter::new(RewriterConfig::default());
//!
//! let mut changes = ChangeSet::new();
//! changes.insert("com/lib/a/Screen.class", FileStatus::Changed);
//!
//! let report = rewriter.apply("build/classes", &changes, &table, "build/embedded")?;
//! println!("Rewrote {} classes", report.rewritten.len());
//! # Ok::<(), rembed::Error>(())
//! ```

mod changes;
mod config;
mod selection;

pub use changes::{ChangeSet, FileStatus};
pub use config::RewriterConfig;

use std::{
    io,
    path::{Path, PathBuf},
};

use log::{debug, info};
use rayon::prelude::*;

use crate::{
    classfile::class_path_in,
    classpath::ClassPath,
    rename::{rewrite_class, RenameTable},
    Error, Result,
};
use selection::{binary_class_name, select};

/// Summary of one rewrite pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Binary names of the rewritten classes, sorted
    pub rewritten: Vec<String>,
    /// Output files deleted for removed inputs
    pub deleted: Vec<PathBuf>,
    /// Symbolic references that were retargeted
    pub renamed_references: usize,
    /// Selected files skipped for not being class files
    pub ignored: usize,
    /// Whether the pass rebuilt the whole input root
    pub full_rebuild: bool,
}

impl RewriteReport {
    /// Folds the report of another pass into this one.
    pub fn merge(&mut self, other: RewriteReport) {
        self.rewritten.extend(other.rewritten);
        self.rewritten.sort_unstable();
        self.deleted.extend(other.deleted);
        self.renamed_references += other.renamed_references;
        self.ignored += other.ignored;
        self.full_rebuild &= other.full_rebuild;
    }
}

/// Applies rename tables to class directories.
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    config: RewriterConfig,
}

impl Rewriter {
    /// Creates a rewriter with the given configuration.
    #[must_use]
    pub fn new(config: RewriterConfig) -> Self {
        Rewriter { config }
    }

    /// The configuration of this rewriter.
    #[must_use]
    pub fn config(&self) -> &RewriterConfig {
        &self.config
    }

    /// Rewrites the files `changes` selects below `input_root` into `output_root`.
    ///
    /// # Arguments
    /// * `input_root` - Directory of compiled classes, laid out by package
    /// * `changes` - Staleness of the input files; empty for a full rebuild
    /// * `table` - Class renames to apply
    /// * `output_root` - Directory receiving the rewritten classes
    ///
    /// # Errors
    /// - [`crate::Error::Configuration`] for change-set paths outside `input_root`, or if one
    ///   root contains the other
    /// - [`crate::Error::ClassLoad`] for class files that cannot be loaded
    /// - [`crate::Error::Rewrite`] for classes the table cannot be applied to
    /// - [`crate::Error::Io`] for walk, read, write or delete failures
    pub fn apply(
        &self,
        input_root: impl AsRef<Path>,
        changes: &ChangeSet,
        table: &RenameTable,
        output_root: impl AsRef<Path>,
    ) -> Result<RewriteReport> {
        let input_root = input_root.as_ref();
        let output_root = output_root.as_ref();
        ensure_separate(input_root, output_root)?;

        let selection = select(input_root, changes)?;
        info!(
            "Rewriting {}: {} classes, {} removed, {} ignored{}",
            input_root.display(),
            selection.classes.len(),
            selection.removed.len(),
            selection.ignored,
            if selection.full_rebuild {
                " (full rebuild)"
            } else {
                ""
            }
        );

        if selection.full_rebuild && self.config.clean_on_full_rebuild {
            clean_directory(output_root)?;
        }

        let mut deleted = Vec::new();
        for relative in &selection.removed {
            let output = output_root.join(relative);
            if remove_output(&output)? {
                debug!("Deleted {}", output.display());
                deleted.push(output);
            }
        }

        let classpath = ClassPath::new(input_root).verify_names(self.config.verify_class_names);
        let process = |relative: &PathBuf| -> Result<(String, usize)> {
            self.process(&classpath, relative, table, output_root)
        };
        let results = if self.config.parallel {
            selection
                .classes
                .par_iter()
                .map(process)
                .collect::<Result<Vec<_>>>()?
        } else {
            selection
                .classes
                .iter()
                .map(process)
                .collect::<Result<Vec<_>>>()?
        };

        let renamed_references: usize = results.iter().map(|(_, renamed)| renamed).sum();
        let mut rewritten: Vec<String> = results.into_iter().map(|(name, _)| name).collect();
        rewritten.sort_unstable();

        info!(
            "Rewrote {} classes into {}, {} references renamed",
            rewritten.len(),
            output_root.display(),
            renamed_references
        );

        Ok(RewriteReport {
            rewritten,
            deleted,
            renamed_references,
            ignored: selection.ignored,
            full_rebuild: selection.full_rebuild,
        })
    }

    /// Loads, rewrites and writes one class. Returns its binary name and renamed references.
    fn process(
        &self,
        classpath: &ClassPath,
        relative: &Path,
        table: &RenameTable,
        output_root: &Path,
    ) -> Result<(String, usize)> {
        let input = classpath.root().join(relative);
        let name = binary_class_name(relative).map_err(|error| error.into_class_load(&input))?;

        let mut class = classpath.load(&name)?;
        let renamed = rewrite_class(&mut class, table)?;
        let data = class.to_bytes().map_err(|error| error.into_rewrite(&name))?;

        let output = class_path_in(output_root, &name.replace('.', "/"));
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|error| Error::io(parent, error))?;
        }
        std::fs::write(&output, data).map_err(|error| Error::io(&output, error))?;

        debug!("Rewrote {} ({} references renamed)", name, renamed);
        Ok((name, renamed))
    }
}

/// Fails if the roots are the same directory or one lies below the other.
pub(crate) fn ensure_separate(input_root: &Path, output_root: &Path) -> Result<()> {
    let input = resolve(input_root)?;
    let output = resolve(output_root)?;
    if input.starts_with(&output) || output.starts_with(&input) {
        return Err(Error::Configuration(format!(
            "Output '{}' overlaps input '{}'",
            output_root.display(),
            input_root.display()
        )));
    }
    Ok(())
}

/// Absolute form of `path`, with links resolved for the part that exists.
fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|error| Error::io(path, error))?;
    for ancestor in absolute.ancestors() {
        if let Ok(resolved) = ancestor.canonicalize() {
            return Ok(match absolute.strip_prefix(ancestor) {
                Ok(missing) if !missing.as_os_str().is_empty() => resolved.join(missing),
                _ => resolved,
            });
        }
    }
    Ok(absolute)
}

/// Removes a file, returning `false` if it did not exist.
fn remove_output(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(error) => Err(Error::io(path, error)),
    }
}

/// Removes everything inside `directory`, keeping the directory itself.
pub(crate) fn clean_directory(directory: &Path) -> Result<()> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(Error::io(directory, error)),
    };

    for entry in entries {
        let entry = entry.map_err(|error| Error::io(directory, error))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|error| Error::io(&path, error))?;
        let removed = if file_type.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        removed.map_err(|error| Error::io(&path, error))?;
    }

    debug!("Cleaned {}", directory.display());
    Ok(())
}
