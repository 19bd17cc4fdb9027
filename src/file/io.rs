//! Low-level big-endian I/O helpers for class file structures.
//!
//! Every multi-byte quantity in a class file (`u2`, `u4`, constant pool numbers) is stored in
//! big-endian byte order. This module provides the [`crate::file::io::ClassIO`] trait that ties a
//! primitive to its byte representation, plus bounds-checked helpers to read and write such
//! primitives at an offset inside a byte slice.
//!
//! # Key Components
//!
//! - [`crate::file::io::ClassIO`] - Conversion between primitives and their raw bytes
//! - [`crate::file::io::read_be`] / [`crate::file::io::read_be_at`] - Bounds-checked reads
//! - [`crate::file::io::write_be`] / [`crate::file::io::write_be_at`] - Bounds-checked writes
//! - [`crate::file::io::write_bytes_at`] - Copy a raw byte run into a buffer
//!
//! # Examples
//!
//! ```rust
//! use rembed::file::io::{read_be_at, write_be_at};
//!
//! let mut buffer = [0u8; 6];
//! let mut offset = 0;
//! write_be_at::<u32>(&mut buffer, &mut offset, 0xCAFE_BABE)?;
//! write_be_at::<u16>(&mut buffer, &mut offset, 52)?;
//!
//! let mut offset = 0;
//! assert_eq!(read_be_at::<u32>(&buffer, &mut offset)?, 0xCAFE_BABE);
//! assert_eq!(read_be_at::<u16>(&buffer, &mut offset)?, 52);
//! # Ok::<(), rembed::Error>(())
//! ```

use crate::Result;

/// Trait for primitives that can be read from and written to class file bytes.
///
/// Implemented for the unsigned integer widths used by the class file format (`u1`, `u2`,
/// `u4`, `u8` in JVMS notation) and their signed counterparts.
pub trait ClassIO: Sized {
    /// The fixed-size byte array backing this primitive.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Builds the value from big-endian bytes.
    fn from_be_bytes(bytes: Self::Bytes) -> Self;

    /// Returns the big-endian byte representation of the value.
    fn to_be_bytes(self) -> Self::Bytes;
}

macro_rules! impl_class_io {
    ($($ty:ty => $len:expr),* $(,)?) => {
        $(
            impl ClassIO for $ty {
                type Bytes = [u8; $len];

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                fn to_be_bytes(self) -> Self::Bytes {
                    <$ty>::to_be_bytes(self)
                }
            }
        )*
    };
}

impl_class_io! {
    u8 => 1,
    i8 => 1,
    u16 => 2,
    i16 => 2,
    u32 => 4,
    i32 => 4,
    u64 => 8,
    i64 => 8,
}

/// Reads a big-endian value from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is too short.
pub fn read_be<T: ClassIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_be_at(data, &mut offset)
}

/// Reads a big-endian value at `offset` and advances `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit inside `data`.
pub fn read_be_at<T: ClassIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_bounds_error!());
    };
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;

    Ok(T::from_be_bytes(read))
}

/// Writes a big-endian value to the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is too short.
pub fn write_be<T: ClassIO>(data: &mut [u8], value: T) -> Result<()> {
    let mut offset = 0_usize;
    write_be_at(data, &mut offset, value)
}

/// Writes a big-endian value at `offset` and advances `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit inside `data`.
pub fn write_be_at<T: ClassIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let bytes = value.to_be_bytes();
    write_bytes_at(data, offset, bytes.as_ref())
}

/// Copies `bytes` into `data` at `offset` and advances `offset` past them.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the run does not fit inside `data`.
pub fn write_bytes_at(data: &mut [u8], offset: &mut usize, bytes: &[u8]) -> Result<()> {
    let Some(end) = offset.checked_add(bytes.len()) else {
        return Err(out_of_bounds_error!());
    };
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    data[*offset..end].copy_from_slice(bytes);
    *offset = end;

    Ok(())
}
