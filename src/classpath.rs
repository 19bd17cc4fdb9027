//! Resolution of binary class names against a class directory.
//!
//! A [`crate::ClassPath`] is rooted at a directory laid out by package, the way a compiler
//! emits classes: `com.app.Main` lives at `<root>/com/app/Main.class`. It is shared by the
//! worker threads of one rewrite pass, so resolved locations are kept in a concurrent cache.

use std::path::{Path, PathBuf};

use dashmap::DashMap;

use crate::{
    classfile::{class_path_in, ClassFile},
    Error, Result,
};

/// A directory of compiled classes.
#[derive(Debug)]
pub struct ClassPath {
    root: PathBuf,
    verify_names: bool,
    /// Binary name to resolved `.class` file
    resolved: DashMap<String, PathBuf>,
}

impl ClassPath {
    /// Creates a class path rooted at `root`.
    ///
    /// Loaded classes are checked to declare the name they were loaded as.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ClassPath {
            root: root.into(),
            verify_names: true,
            resolved: DashMap::new(),
        }
    }

    /// Enables or disables the declared-name check of [`ClassPath::load`].
    #[must_use]
    pub fn verify_names(mut self, verify: bool) -> Self {
        self.verify_names = verify;
        self
    }

    /// The directory this class path resolves against.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the binary name `class_name` (e.g. `com.app.R$string`) to its `.class` file.
    ///
    /// # Errors
    /// Returns [`crate::Error::ClassNotFound`] if the name is not a well-formed binary name or
    /// no such file exists.
    pub fn find(&self, class_name: &str) -> Result<PathBuf> {
        if let Some(path) = self.resolved.get(class_name) {
            return Ok(path.clone());
        }

        if class_name.is_empty()
            || class_name.contains('/')
            || class_name.contains('\\')
            || class_name.split('.').any(str::is_empty)
        {
            return Err(Error::ClassNotFound(class_name.to_string()));
        }

        let path = class_path_in(&self.root, &class_name.replace('.', "/"));
        if !path.is_file() {
            return Err(Error::ClassNotFound(class_name.to_string()));
        }

        self.resolved.insert(class_name.to_string(), path.clone());
        Ok(path)
    }

    /// Loads the class `class_name` into a class file model.
    ///
    /// # Errors
    /// Returns [`crate::Error::ClassLoad`] wrapping the cause: the class is not found, cannot
    /// be parsed, or declares a different name than `class_name`.
    pub fn load(&self, class_name: &str) -> Result<ClassFile> {
        let path = match self.find(class_name) {
            Ok(path) => path,
            Err(error) => {
                let missing = class_path_in(&self.root, &class_name.replace('.', "/"));
                return Err(error.into_class_load(missing));
            }
        };

        let class = ClassFile::from_file(&path).map_err(|error| error.into_class_load(&path))?;

        if self.verify_names {
            let declared = class
                .binary_name()
                .map_err(|error| error.into_class_load(&path))?;
            if declared != class_name {
                return Err(Error::NameMismatch {
                    expected: class_name.to_string(),
                    declared,
                }
                .into_class_load(&path));
            }
        }

        Ok(class)
    }
}
