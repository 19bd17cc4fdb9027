//! The class rename table and the accessor class names it maps.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

use log::warn;
use strum::IntoEnumIterator;

use crate::{classfile::mutf8, rename::ResourceCategory};

/// Internal name of a resource accessor class: `<package in slash form>/R$<category>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessorClassName(String);

impl AccessorClassName {
    /// Builds the accessor name for a dot-separated `package` and a `category`.
    ///
    /// The default package (an empty string) yields `R$<category>`.
    #[must_use]
    pub fn new(package: &str, category: ResourceCategory) -> Self {
        if package.is_empty() {
            AccessorClassName(format!("R${category}"))
        } else {
            AccessorClassName(format!("{}/R${}", package.replace('.', "/"), category))
        }
    }

    /// The internal name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessorClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<AccessorClassName> for String {
    fn from(name: AccessorClassName) -> String {
        name.0
    }
}

/// A mapping from old to new internal class names.
///
/// Lookups are single-step: a name is replaced by its value, which is not looked up again.
/// The table never holds an entry mapping a name onto itself, so applying it to a class that
/// only references already-renamed names changes nothing.
///
/// # Examples
///
/// ```rust
/// use rembed::rename::RenameTable;
///
/// let table = RenameTable::build(["com.lib.a", "com.lib.b"], "com.app");
/// assert_eq!(table.len(), 2 * 23);
/// assert_eq!(table.get("com/lib/a/R$string"), Some("com/app/R$string"));
/// assert_eq!(table.get("com/other/R$string"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RenameTable {
    /// Entries sorted by source name
    entries: BTreeMap<String, String>,
    /// The same entries in modified UTF-8, as stored in class files
    encoded: HashMap<Vec<u8>, Vec<u8>>,
}

impl RenameTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps every accessor class of every library package onto the accessor class of the same
    /// category in `target_package`.
    ///
    /// Packages are dot-separated. A library package equal to `target_package` contributes
    /// nothing. No validation is performed; see [`crate::EmbedConfig::new`].
    ///
    /// # Arguments
    /// * `library_packages` - Packages whose accessor classes disappear
    /// * `target_package` - Package whose accessor classes replace them
    #[must_use]
    pub fn build<I, S>(library_packages: I, target_package: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = RenameTable::new();
        for package in library_packages {
            let package = package.as_ref();
            if package == target_package {
                warn!("Library package '{package}' is the target package, skipping");
                continue;
            }

            for category in ResourceCategory::iter() {
                table.insert(
                    AccessorClassName::new(package, category),
                    AccessorClassName::new(target_package, category),
                );
            }
        }
        table
    }

    /// Adds or replaces the mapping `from -> to`.
    ///
    /// Returns `false`, leaving the table unchanged, if `from` equals `to`.
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) -> bool {
        let (from, to) = (from.into(), to.into());
        if from == to {
            return false;
        }

        self.encoded.insert(mutf8::encode(&from), mutf8::encode(&to));
        self.entries.insert(from, to);
        true
    }

    /// The new name for the internal name `name`, if it is renamed.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Like [`RenameTable::get`], on names in modified UTF-8.
    #[must_use]
    pub fn get_encoded(&self, name: &[u8]) -> Option<&[u8]> {
        self.encoded.get(name).map(Vec::as_slice)
    }

    /// Returns `true` if `name` is renamed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table renames nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(from, to)` sorted by `from`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(from, to)| (from.as_str(), to.as_str()))
    }
}

impl<F, T> FromIterator<(F, T)> for RenameTable
where
    F: Into<String>,
    T: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (F, T)>>(iter: I) -> Self {
        let mut table = RenameTable::new();
        for (from, to) in iter {
            table.insert(from, to);
        }
        table
    }
}
