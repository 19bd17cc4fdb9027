//! The accessor class embedding transform.
//!
//! An [`crate::Embedder`] is the build-facing entry point: it validates the package names of
//! an embedding, builds the rename table once, and processes every directory input of a build
//! invocation into one shared output directory.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rembed::{ChangeSet, DirectoryInput, EmbedConfig, Embedder, Invocation};
//!
//! let config = EmbedConfig::new(["com.lib.a", "com.lib.b"], "com.app")?;
//! let embedder = Embedder::new(config);
//!
//! let invocation = Invocation {
//!     inputs: vec![DirectoryInput::new("build/classes", ChangeSet::new())],
//!     output: "build/embedded".into(),
//! };
//! let report = embedder.transform(&invocation)?;
//! println!("{}: {} classes", embedder.name(), report.rewritten.len());
//! # Ok::<(), rembed::Error>(())
//! ```

use std::path::PathBuf;

use log::info;

use crate::{
    rename::RenameTable,
    rewriter::{clean_directory, ensure_separate, ChangeSet, RewriteReport, Rewriter, RewriterConfig},
    Error, Result,
};

/// Name under which the transform registers with the build.
pub const TRANSFORM_NAME: &str = "fatAarRTransform";

/// Validated package names of an embedding, plus the rewrite configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedConfig {
    library_packages: Vec<String>,
    target_package: String,
    /// Configuration of the rewrite passes
    pub rewriter: RewriterConfig,
}

impl EmbedConfig {
    /// Validates the packages of an embedding.
    ///
    /// # Arguments
    /// * `library_packages` - Dot-separated packages of the embedded libraries, may be empty
    /// * `target_package` - Dot-separated package of the consuming module
    ///
    /// # Errors
    /// Returns [`crate::Error::Configuration`] if a package is empty or not a sequence of Java
    /// identifiers separated by dots.
    pub fn new<I, S>(library_packages: I, target_package: &str) -> Result<EmbedConfig>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        validate_package(target_package)
            .map_err(|reason| Error::Configuration(format!("target package {reason}")))?;

        let library_packages: Vec<String> = library_packages.into_iter().map(Into::into).collect();
        for package in &library_packages {
            validate_package(package)
                .map_err(|reason| Error::Configuration(format!("library package {reason}")))?;
        }

        Ok(EmbedConfig {
            library_packages,
            target_package: target_package.to_string(),
            rewriter: RewriterConfig::default(),
        })
    }

    /// Replaces the rewrite configuration.
    #[must_use]
    pub fn with_rewriter(mut self, rewriter: RewriterConfig) -> Self {
        self.rewriter = rewriter;
        self
    }

    /// Packages whose accessor classes are replaced.
    #[must_use]
    pub fn library_packages(&self) -> &[String] {
        &self.library_packages
    }

    /// Package whose accessor classes remain.
    #[must_use]
    pub fn target_package(&self) -> &str {
        &self.target_package
    }
}

fn validate_package(package: &str) -> std::result::Result<(), String> {
    if package.is_empty() {
        return Err("must not be empty".to_string());
    }

    for segment in package.split('.') {
        let mut chars = segment.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
            && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
        if !valid {
            return Err(format!(
                "'{package}' has invalid segment '{segment}', expected dot-separated identifiers"
            ));
        }
    }
    Ok(())
}

/// One directory of compiled classes and its staleness information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryInput {
    /// Root of the class directory
    pub root: PathBuf,
    /// Changes below `root`; empty for a full rebuild
    pub changes: ChangeSet,
}

impl DirectoryInput {
    /// Creates a directory input.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, changes: ChangeSet) -> Self {
        DirectoryInput {
            root: root.into(),
            changes,
        }
    }
}

/// The inputs and output location of one build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Class directories to process
    pub inputs: Vec<DirectoryInput>,
    /// Directory receiving every rewritten class
    pub output: PathBuf,
}

/// Embeds library accessor classes into the accessor classes of a consuming module.
#[derive(Debug, Clone)]
pub struct Embedder {
    config: EmbedConfig,
    table: RenameTable,
}

impl Embedder {
    /// Creates the transform, building its rename table.
    #[must_use]
    pub fn new(config: EmbedConfig) -> Self {
        let table = RenameTable::build(&config.library_packages, &config.target_package);
        Embedder { config, table }
    }

    /// The transform name, `fatAarRTransform`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        TRANSFORM_NAME
    }

    /// The configuration this transform was created with.
    #[must_use]
    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    /// The rename table applied to every class.
    #[must_use]
    pub fn table(&self) -> &RenameTable {
        &self.table
    }

    /// Processes every input of `invocation` into its output directory.
    ///
    /// When every input is a full rebuild and cleaning is enabled, the output directory is
    /// emptied once before the first input is processed. Inputs are processed in order and the
    /// first failure aborts the invocation.
    ///
    /// # Errors
    /// Returns [`crate::Error::Configuration`] before touching the output if it overlaps an
    /// input root, and the errors of [`Rewriter::apply`] for the first failing input.
    pub fn transform(&self, invocation: &Invocation) -> Result<RewriteReport> {
        let full_rebuild = invocation
            .inputs
            .iter()
            .all(|input| input.changes.is_full_rebuild());
        info!(
            "{}: {} inputs into {}{}",
            TRANSFORM_NAME,
            invocation.inputs.len(),
            invocation.output.display(),
            if full_rebuild { " (full rebuild)" } else { "" }
        );

        for input in &invocation.inputs {
            ensure_separate(&input.root, &invocation.output)?;
        }
        if full_rebuild && self.config.rewriter.clean_on_full_rebuild {
            clean_directory(&invocation.output)?;
        }

        // Inputs share the output, so a pass must not clean what an earlier one wrote
        let rewriter = Rewriter::new(RewriterConfig {
            clean_on_full_rebuild: false,
            ..self.config.rewriter
        });

        let mut report = RewriteReport {
            full_rebuild: true,
            ..RewriteReport::default()
        };
        for input in &invocation.inputs {
            report.merge(rewriter.apply(
                &input.root,
                &input.changes,
                &self.table,
                &invocation.output,
            )?);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_packages() {
        let config = EmbedConfig::new(["com.lib.a", "com.lib_b.$gen"], "com.app").unwrap();
        assert_eq!(config.library_packages(), ["com.lib.a", "com.lib_b.$gen"]);
        assert_eq!(config.target_package(), "com.app");
        assert!(EmbedConfig::new(Vec::<String>::new(), "app").is_ok());
    }

    #[test]
    fn invalid_packages() {
        for target in ["", "com..app", "com/app", ".com", "com.app.", "com.1app", "com app"] {
            assert!(
                matches!(
                    EmbedConfig::new(["com.lib"], target),
                    Err(Error::Configuration(_))
                ),
                "accepted target {target:?}"
            );
        }
        assert!(matches!(
            EmbedConfig::new(["com.lib", ""], "com.app"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn embedder_builds_table() {
        let embedder = Embedder::new(EmbedConfig::new(["com.lib.a"], "com.app").unwrap());
        assert_eq!(embedder.name(), "fatAarRTransform");
        assert_eq!(embedder.table().len(), 23);
        assert_eq!(
            embedder.table().get("com/lib/a/R$style"),
            Some("com/app/R$style")
        );
    }
}
