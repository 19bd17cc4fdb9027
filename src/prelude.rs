//! # rembed Prelude
//!
//! This module provides a convenient prelude for the most commonly used types from the rembed
//! library. Import this module to get quick access to the essential types for rewriting
//! accessor class references.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all rembed operations
pub use crate::Error;

/// The result type used throughout rembed
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Build-facing transform and its inputs
pub use crate::{DirectoryInput, EmbedConfig, Embedder, Invocation};

/// Directory rewriting
pub use crate::{ChangeSet, FileStatus, RewriteReport, Rewriter, RewriterConfig};

/// Rename tables
pub use crate::rename::{
    rewrite_bytes, rewrite_class, AccessorClassName, RenameTable, ResourceCategory,
};

// ================================================================================================
// Class Files
// ================================================================================================

/// Class file model
pub use crate::classfile::{
    Attribute, ClassAccessFlags, ClassFile, Constant, ConstantPool, Member, MemberAccessFlags,
    SymbolKind,
};

/// Class lookup
pub use crate::ClassPath;

/// Low-level file parsing utilities
pub use crate::{File, Parser};
