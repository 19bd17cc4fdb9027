//! Raw byte access for class files.
//!
//! This module abstracts over where class file bytes come from and provides the primitives the
//! class file model is parsed with.
//!
//! # Key Components
//!
//! ## Core Types
//! - [`crate::file::File`] - Owned handle to the bytes of one class file
//! - [`crate::file::Backend`] - Trait for different data sources (disk files, memory buffers)
//!
//! ## Parsing Infrastructure
//! - [`crate::file::parser::Parser`] - Cursor-based big-endian reader
//! - [`crate::file::io`] - Bounds-checked read/write helpers
//!
//! ## Backend Implementations
//! - `Physical` - Memory-mapped file backend for disk access
//! - `Memory` - In-memory buffer backend
//!
//! # Examples
//!
//! ```rust,no_run
//! use rembed::File;
//!
//! let file = File::from_file("build/classes/com/app/Main.class")?;
//! assert!(file.data().starts_with(&[0xCA, 0xFE, 0xBA, 0xBE]));
//! # Ok::<(), rembed::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! Every backend is `Send + Sync`; a [`crate::file::File`] can be moved to a worker thread.

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::path::Path;

use crate::{Error, Result};
use memory::Memory;
use physical::Physical;

/// Backend trait for file data sources.
///
/// This trait abstracts over the source of class file data, allowing for both in-memory and
/// on-disk representations. All implementations must be thread-safe.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// The raw bytes of a single class file.
///
/// `File` does not interpret its contents; see [`crate::ClassFile`] for the parsed model.
pub struct File {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
}

impl File {
    /// Memory-maps the file at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped and
    /// [`crate::Error::Empty`] if it has no content.
    pub fn from_file(path: impl AsRef<Path>) -> Result<File> {
        Self::load(Physical::new(path)?)
    }

    /// Wraps an in-memory buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] if `data` is empty.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        Self::load(Memory::new(data))
    }

    fn load<T: Backend + 'static>(backend: T) -> Result<File> {
        if backend.len() == 0 {
            return Err(Error::Empty);
        }

        Ok(File {
            data: Box::new(backend),
        })
    }

    /// Returns the entire file content.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Returns a bounds-checked sub-slice of the file.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the file.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the file holds no bytes. Never the case for a loaded file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_mem_rejects_empty() {
        assert!(matches!(File::from_mem(Vec::new()), Err(Error::Empty)));
    }

    #[test]
    fn from_file_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Empty.class");
        std::fs::write(&path, b"").unwrap();

        assert!(matches!(File::from_file(&path), Err(Error::Empty)));
    }

    #[test]
    fn from_mem_exposes_data() {
        let file = File::from_mem(vec![0xCA, 0xFE, 0xBA, 0xBE]).unwrap();
        assert_eq!(file.len(), 4);
        assert!(!file.is_empty());
        assert_eq!(file.data_slice(2, 2).unwrap(), &[0xBA, 0xBE]);
    }
}
