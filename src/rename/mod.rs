//! Renaming of resource accessor classes.
//!
//! When library modules are merged into one consumer module, only the consumer keeps generated
//! accessor classes (`R$string`, `R$drawable`, ...). This module builds the table that maps
//! every library accessor class onto the consumer's accessor class of the same category, and
//! applies such a table to class files.
//!
//! # Key Components
//!
//! - [`crate::rename::ResourceCategory`] - The closed set of resource categories
//! - [`crate::rename::AccessorClassName`] - `<package>/R$<category>` in internal form
//! - [`crate::rename::RenameTable`] - Old to new internal class names
//! - [`crate::rename::rewrite_class`] - Applies a table to a [`crate::ClassFile`]
//!
//! # Examples
//!
//! ```rust
//! use rembed::{
//!     classfile::ClassFile,
//!     rename::{rewrite_class, RenameTable},
//! };
//!
//! let table = RenameTable::build(["com.lib.a"], "com.app");
//!
//! let mut class = ClassFile::new("com/lib/a/Screen", Some("java/lang/Object"))?;
//! class.constant_pool.add_field_ref("com/lib/a/R$string", "title", "I")?;
//!
//! assert_eq!(rewrite_class(&mut class, &table)?, 1);
//! assert!(class.class_references()?.contains("com/app/R$string"));
//! # Ok::<(), rembed::Error>(())
//! ```

mod category;
mod remapper;
mod table;

pub use category::ResourceCategory;
pub use remapper::{rewrite_bytes, rewrite_class};
pub use table::{AccessorClassName, RenameTable};
