// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![warn(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # rembed
//!
//! Retargets resource accessor classes in compiled JVM bytecode, so that several Android
//! library modules merged into one distributable archive share the accessor classes of the
//! consuming module.
//!
//! Each Android module compiles against its own generated accessor classes (`R$string`,
//! `R$drawable`, ...). Once libraries are embedded into a consumer, only the consumer's
//! accessor classes are generated, so every reference a library makes to its own accessor
//! classes has to point at the consumer's instead. Field and method names stay as they are;
//! only the owning class changes.
//!
//! ## Features
//!
//! - **🗺️ Rename tables** - One entry per library package and resource category
//! - **🔍 Complete class file model** - Parse, inspect, mutate and write class files, with
//!   byte-identical round trips
//! - **🎯 Precise renaming** - Class names are substituted at every class-naming site
//!   (constants, descriptors, generic signatures, local variables, annotations), string
//!   literals are never touched
//! - **⚡ Incremental** - Only added and changed files are reprocessed, outputs of removed
//!   files are deleted
//! - **🧵 Parallel** - Files are processed on the rayon thread pool
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rembed::prelude::*;
//!
//! let config = EmbedConfig::new(["com.lib.a", "com.lib.b"], "com.app")?;
//! let embedder = Embedder::new(config);
//!
//! let report = embedder.transform(&Invocation {
//!     inputs: vec![DirectoryInput::new("build/classes", ChangeSet::new())],
//!     output: "build/embedded".into(),
//! })?;
//! println!("Rewrote {} classes", report.rewritten.len());
//! # Ok::<(), rembed::Error>(())
//! ```
//!
//! ### Rewriting a Single Class
//!
//! ```rust,no_run
//! use rembed::{rename::rewrite_bytes, RenameTable};
//!
//! let table = RenameTable::build(["com.lib.a"], "com.app");
//! let original = std::fs::read("build/classes/com/lib/a/Screen.class")?;
//! let rewritten = rewrite_bytes(&original, &table)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`classfile`] - Class file model: constant pool, members, attributes, descriptors
//! - [`rename`] - Resource categories, rename tables and their application to classes
//! - [`rewriter`] - Change-set driven rewriting of a class directory
//! - [`ClassPath`] - Name based class lookup below a directory
//! - [`Embedder`] - Validated multi-input transform for one build invocation
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! Progress is reported through the [`log`](https://docs.rs/log) facade: one `info` record per
//! pass, `debug` records per written or deleted file, `warn` for skipped symbolic links and
//! attribute contents that do not parse, `trace` for every renamed reference. No logger is
//! installed by the library.
//!
//! ## Standards Compliance
//!
//! Class files are handled as described by chapter 4 of the **Java Virtual Machine
//! Specification** (Java SE 21 edition), including every constant pool kind up to
//! `CONSTANT_Package`.
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//! cargo +nightly fuzz run classfile --release
//! ```

#[macro_use]
pub(crate) mod error;

/// Raw byte sources and the big-endian primitives class files are read and written with
pub mod file;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use rembed::prelude::*;
///
/// let table = RenameTable::build(["com.lib.a"], "com.app");
/// let report = Rewriter::default().apply("in", &ChangeSet::new(), &table, "out")?;
/// # Ok::<(), rembed::Error>(())
/// ```
pub mod prelude;

/// Parsing, inspection and serialization of JVM class files
///
/// # Key Types
///
/// - [`classfile::ClassFile`] - A complete class file
/// - [`classfile::ConstantPool`] - The symbolic reference table
/// - [`classfile::SymbolSite`] - A class-naming reference inside a class file
pub mod classfile;

/// Resource accessor class names and rename tables
pub mod rename;

/// Incremental, change-set driven rewriting of class directories
pub mod rewriter;

mod classpath;
mod embed;

/// `rembed` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `rembed` Error type
pub use error::Error;

pub use classfile::ClassFile;
pub use classpath::ClassPath;
pub use embed::{DirectoryInput, EmbedConfig, Embedder, Invocation, TRANSFORM_NAME};
pub use rename::{RenameTable, ResourceCategory};
pub use rewriter::{ChangeSet, FileStatus, RewriteReport, Rewriter, RewriterConfig};

/// Provides access to low-level file and memory parsing utilities.
///
/// # Example
///
/// ```rust
/// use rembed::Parser;
///
/// let mut parser = Parser::new(&[0x00, 0x34]);
/// assert_eq!(parser.read_be::<u16>()?, 52);
/// # Ok::<(), rembed::Error>(())
/// ```
pub use file::{parser::Parser, File};
