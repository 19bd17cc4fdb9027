//! The constant pool of a class file (JVMS §4.4).
//!
//! The constant pool is the symbolic reference table of a class: every class, field, method,
//! descriptor and string literal the bytecode refers to is named here, and everything else in
//! the class file points into it by a one-based `u2` index. It is therefore the unit of
//! mutation when retargeting references from one class to another.
//!
//! # Key Components
//!
//! - [`crate::classfile::ConstantTag`] - The tag byte identifying each entry kind
//! - [`crate::classfile::Constant`] - A single decoded entry
//! - [`crate::classfile::ConstantPool`] - The indexed table, with lookup, interning and
//!   serialization
//!
//! # Index Layout
//!
//! Index `0` is never valid. `CONSTANT_Long` and `CONSTANT_Double` occupy two slots, the second
//! of which is unusable. Both reserved slots are stored as [`crate::classfile::Constant::Unusable`]
//! so that vector positions equal pool indices.

use std::collections::HashMap;

use strum::FromRepr;

use crate::{
    classfile::mutf8,
    file::{
        io::{write_be_at, write_bytes_at},
        parser::Parser,
    },
    Error, Result,
};

/// Largest value the `constant_pool_count` field can hold.
pub const MAX_CONSTANT_POOL_COUNT: usize = u16::MAX as usize;

/// Tag byte of a constant pool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, strum::Display)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum ConstantTag {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    FieldRef = 9,
    MethodRef = 10,
    InterfaceMethodRef = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    Dynamic = 17,
    InvokeDynamic = 18,
    Module = 19,
    Package = 20,
}

/// A decoded constant pool entry.
///
/// Numeric constants keep their raw bits so that floating point values serialize back
/// unchanged, including NaN payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Constant {
    /// Modified UTF-8 bytes, kept undecoded
    Utf8(Vec<u8>),
    Integer(u32),
    Float(u32),
    Long(u64),
    Double(u64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    FieldRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    MethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    MethodHandle {
        reference_kind: u8,
        reference_index: u16,
    },
    MethodType {
        descriptor_index: u16,
    },
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    Module {
        name_index: u16,
    },
    Package {
        name_index: u16,
    },
    /// Slot `0` and the slot following a `Long` or `Double`
    Unusable,
}

impl Constant {
    /// The tag written for this entry, `None` for [`Constant::Unusable`].
    #[must_use]
    pub fn tag(&self) -> Option<ConstantTag> {
        let tag = match self {
            Constant::Utf8(_) => ConstantTag::Utf8,
            Constant::Integer(_) => ConstantTag::Integer,
            Constant::Float(_) => ConstantTag::Float,
            Constant::Long(_) => ConstantTag::Long,
            Constant::Double(_) => ConstantTag::Double,
            Constant::Class { .. } => ConstantTag::Class,
            Constant::String { .. } => ConstantTag::String,
            Constant::FieldRef { .. } => ConstantTag::FieldRef,
            Constant::MethodRef { .. } => ConstantTag::MethodRef,
            Constant::InterfaceMethodRef { .. } => ConstantTag::InterfaceMethodRef,
            Constant::NameAndType { .. } => ConstantTag::NameAndType,
            Constant::MethodHandle { .. } => ConstantTag::MethodHandle,
            Constant::MethodType { .. } => ConstantTag::MethodType,
            Constant::Dynamic { .. } => ConstantTag::Dynamic,
            Constant::InvokeDynamic { .. } => ConstantTag::InvokeDynamic,
            Constant::Module { .. } => ConstantTag::Module,
            Constant::Package { .. } => ConstantTag::Package,
            Constant::Unusable => return None,
        };
        Some(tag)
    }

    /// Number of pool slots the entry occupies.
    #[must_use]
    pub fn slots(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }

    fn read(parser: &mut Parser) -> Result<Constant> {
        let tag = parser.read_be::<u8>()?;
        let Some(tag) = ConstantTag::from_repr(tag) else {
            return Err(malformed_error!(
                "Unknown constant pool tag {} at offset {}",
                tag,
                parser.pos() - 1
            ));
        };

        let constant = match tag {
            ConstantTag::Utf8 => {
                let length = parser.read_be::<u16>()?;
                Constant::Utf8(parser.read_bytes(usize::from(length))?.to_vec())
            }
            ConstantTag::Integer => Constant::Integer(parser.read_be()?),
            ConstantTag::Float => Constant::Float(parser.read_be()?),
            ConstantTag::Long => Constant::Long(parser.read_be()?),
            ConstantTag::Double => Constant::Double(parser.read_be()?),
            ConstantTag::Class => Constant::Class {
                name_index: parser.read_be()?,
            },
            ConstantTag::String => Constant::String {
                string_index: parser.read_be()?,
            },
            ConstantTag::FieldRef => Constant::FieldRef {
                class_index: parser.read_be()?,
                name_and_type_index: parser.read_be()?,
            },
            ConstantTag::MethodRef => Constant::MethodRef {
                class_index: parser.read_be()?,
                name_and_type_index: parser.read_be()?,
            },
            ConstantTag::InterfaceMethodRef => Constant::InterfaceMethodRef {
                class_index: parser.read_be()?,
                name_and_type_index: parser.read_be()?,
            },
            ConstantTag::NameAndType => Constant::NameAndType {
                name_index: parser.read_be()?,
                descriptor_index: parser.read_be()?,
            },
            ConstantTag::MethodHandle => Constant::MethodHandle {
                reference_kind: parser.read_be()?,
                reference_index: parser.read_be()?,
            },
            ConstantTag::MethodType => Constant::MethodType {
                descriptor_index: parser.read_be()?,
            },
            ConstantTag::Dynamic => Constant::Dynamic {
                bootstrap_method_attr_index: parser.read_be()?,
                name_and_type_index: parser.read_be()?,
            },
            ConstantTag::InvokeDynamic => Constant::InvokeDynamic {
                bootstrap_method_attr_index: parser.read_be()?,
                name_and_type_index: parser.read_be()?,
            },
            ConstantTag::Module => Constant::Module {
                name_index: parser.read_be()?,
            },
            ConstantTag::Package => Constant::Package {
                name_index: parser.read_be()?,
            },
        };

        Ok(constant)
    }

    fn size(&self) -> usize {
        match self {
            Constant::Unusable => 0,
            Constant::Utf8(bytes) => 3 + bytes.len(),
            Constant::Class { .. }
            | Constant::String { .. }
            | Constant::MethodType { .. }
            | Constant::Module { .. }
            | Constant::Package { .. } => 3,
            Constant::MethodHandle { .. } => 4,
            Constant::Integer(_)
            | Constant::Float(_)
            | Constant::FieldRef { .. }
            | Constant::MethodRef { .. }
            | Constant::InterfaceMethodRef { .. }
            | Constant::NameAndType { .. }
            | Constant::Dynamic { .. }
            | Constant::InvokeDynamic { .. } => 5,
            Constant::Long(_) | Constant::Double(_) => 9,
        }
    }

    fn write(&self, data: &mut [u8], offset: &mut usize) -> Result<()> {
        let Some(tag) = self.tag() else {
            return Ok(());
        };
        write_be_at(data, offset, tag as u8)?;

        match self {
            Constant::Unusable => {}
            Constant::Utf8(bytes) => {
                let length = u16::try_from(bytes.len())
                    .map_err(|_| malformed_error!("Utf8 constant longer than 65535 bytes"))?;
                write_be_at(data, offset, length)?;
                write_bytes_at(data, offset, bytes)?;
            }
            Constant::Integer(value) | Constant::Float(value) => {
                write_be_at(data, offset, *value)?;
            }
            Constant::Long(value) | Constant::Double(value) => {
                write_be_at(data, offset, *value)?;
            }
            Constant::Class { name_index: index }
            | Constant::String {
                string_index: index,
            }
            | Constant::MethodType {
                descriptor_index: index,
            }
            | Constant::Module { name_index: index }
            | Constant::Package { name_index: index } => {
                write_be_at(data, offset, *index)?;
            }
            Constant::FieldRef {
                class_index: first,
                name_and_type_index: second,
            }
            | Constant::MethodRef {
                class_index: first,
                name_and_type_index: second,
            }
            | Constant::InterfaceMethodRef {
                class_index: first,
                name_and_type_index: second,
            }
            | Constant::NameAndType {
                name_index: first,
                descriptor_index: second,
            }
            | Constant::Dynamic {
                bootstrap_method_attr_index: first,
                name_and_type_index: second,
            }
            | Constant::InvokeDynamic {
                bootstrap_method_attr_index: first,
                name_and_type_index: second,
            } => {
                write_be_at(data, offset, *first)?;
                write_be_at(data, offset, *second)?;
            }
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            } => {
                write_be_at(data, offset, *reference_kind)?;
                write_be_at(data, offset, *reference_index)?;
            }
        }

        Ok(())
    }
}

/// The indexed constant pool of one class file.
///
/// Utf8 entries are additionally indexed by content so that [`ConstantPool::intern_utf8`] can
/// reuse an existing entry instead of growing the pool.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    /// Entries by pool index; position 0 is always [`Constant::Unusable`]
    entries: Vec<Constant>,
    /// First index of every distinct Utf8 value
    utf8_lookup: HashMap<Vec<u8>, u16>,
}

impl ConstantPool {
    /// Creates an empty pool, holding only the reserved slot `0`.
    #[must_use]
    pub fn new() -> Self {
        ConstantPool {
            entries: vec![Constant::Unusable],
            utf8_lookup: HashMap::new(),
        }
    }

    /// Parses `constant_pool_count` followed by the pool entries.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for a zero count, unknown tags or a Long/Double in
    /// the last slot, and [`crate::Error::OutOfBounds`] for truncated data.
    pub fn parse(parser: &mut Parser) -> Result<Self> {
        let count = usize::from(parser.read_be::<u16>()?);
        if count == 0 {
            return Err(malformed_error!("Constant pool count must be at least 1"));
        }

        let mut pool = ConstantPool {
            entries: Vec::with_capacity(count),
            utf8_lookup: HashMap::new(),
        };
        pool.entries.push(Constant::Unusable);

        while pool.entries.len() < count {
            let index = pool.entries.len();
            let constant = Constant::read(parser)?;
            let slots = constant.slots();
            if index + slots > count {
                return Err(malformed_error!(
                    "Constant {} at index {} overruns the pool of {} slots",
                    constant.tag().map_or_else(String::new, |tag| tag.to_string()),
                    index,
                    count
                ));
            }

            if let Constant::Utf8(bytes) = &constant {
                pool.utf8_lookup
                    .entry(bytes.clone())
                    .or_insert(index as u16);
            }
            pool.entries.push(constant);
            if slots == 2 {
                pool.entries.push(Constant::Unusable);
            }
        }

        Ok(pool)
    }

    /// The `constant_pool_count` value: number of slots including the reserved slot `0`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the pool holds no entries besides the reserved slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Iterates `(index, constant)` over every usable entry.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, constant)| !matches!(constant, Constant::Unusable))
            .map(|(index, constant)| (index as u16, constant))
    }

    /// Returns the entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for index `0`, indices past the pool and the
    /// unusable second slot of a Long/Double.
    pub fn get(&self, index: u16) -> Result<&Constant> {
        match self.entries.get(usize::from(index)) {
            Some(Constant::Unusable) | None => {
                Err(malformed_error!("Invalid constant pool index {}", index))
            }
            Some(constant) => Ok(constant),
        }
    }

    /// Returns the raw modified UTF-8 bytes of the Utf8 entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry is missing or not a Utf8 entry.
    pub fn utf8(&self, index: u16) -> Result<&[u8]> {
        match self.get(index)? {
            Constant::Utf8(bytes) => Ok(bytes),
            other => Err(malformed_error!(
                "Constant pool index {} is {:?}, expected Utf8",
                index,
                other.tag()
            )),
        }
    }

    /// Returns the decoded string of the Utf8 entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry is missing, not a Utf8 entry or not
    /// valid modified UTF-8.
    pub fn utf8_str(&self, index: u16) -> Result<String> {
        mutf8::decode(self.utf8(index)?)
    }

    /// Returns the internal name (e.g. `com/app/R$string`) of the Class entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the entry is not a Class entry or its name is
    /// not a valid Utf8 entry.
    pub fn class_name(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8_str(*name_index),
            other => Err(malformed_error!(
                "Constant pool index {} is {:?}, expected Class",
                index,
                other.tag()
            )),
        }
    }

    /// Replaces the entry at `index` with one occupying the same number of slots.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` is invalid or the slot count differs.
    pub fn set(&mut self, index: u16, constant: Constant) -> Result<()> {
        let current = self.get(index)?;
        if current.slots() != constant.slots() {
            return Err(malformed_error!(
                "Cannot replace {:?} at index {} with {:?}",
                current.tag(),
                index,
                constant.tag()
            ));
        }

        if let Constant::Utf8(old) = current {
            if self.utf8_lookup.get(old) == Some(&index) {
                let old = old.clone();
                self.utf8_lookup.remove(&old);
            }
        }
        if let Constant::Utf8(bytes) = &constant {
            self.utf8_lookup.entry(bytes.clone()).or_insert(index);
        }
        self.entries[usize::from(index)] = constant;
        Ok(())
    }

    /// Appends `constant` and returns its index.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if the pool would exceed 65535 slots,
    /// and [`crate::Error::Malformed`] when appending [`Constant::Unusable`].
    pub fn push(&mut self, constant: Constant) -> Result<u16> {
        if matches!(constant, Constant::Unusable) {
            return Err(malformed_error!("Cannot append an unusable constant"));
        }

        let index = self.entries.len();
        if index + constant.slots() > MAX_CONSTANT_POOL_COUNT {
            return Err(Error::ConstantPoolOverflow(MAX_CONSTANT_POOL_COUNT));
        }

        let slots = constant.slots();
        if let Constant::Utf8(bytes) = &constant {
            self.utf8_lookup.entry(bytes.clone()).or_insert(index as u16);
        }
        self.entries.push(constant);
        if slots == 2 {
            self.entries.push(Constant::Unusable);
        }

        Ok(index as u16)
    }

    /// Returns the index of a Utf8 entry holding exactly `bytes`, appending one if needed.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if a new entry does not fit.
    pub fn intern_utf8(&mut self, bytes: &[u8]) -> Result<u16> {
        if let Some(&index) = self.utf8_lookup.get(bytes) {
            return Ok(index);
        }
        if bytes.len() > usize::from(u16::MAX) {
            return Err(malformed_error!("Utf8 constant longer than 65535 bytes"));
        }
        self.push(Constant::Utf8(bytes.to_vec()))
    }

    /// Interns `value` as a Utf8 entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if a new entry does not fit.
    pub fn add_utf8(&mut self, value: &str) -> Result<u16> {
        self.intern_utf8(&mutf8::encode(value))
    }

    fn find_or_push(&mut self, constant: Constant) -> Result<u16> {
        if let Some(position) = self.entries.iter().position(|existing| *existing == constant) {
            return Ok(position as u16);
        }
        self.push(constant)
    }

    /// Adds (or reuses) a Class entry for the internal name `name`.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if new entries do not fit.
    pub fn add_class(&mut self, name: &str) -> Result<u16> {
        let name_index = self.add_utf8(name)?;
        self.find_or_push(Constant::Class { name_index })
    }

    /// Adds (or reuses) a String literal entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if new entries do not fit.
    pub fn add_string(&mut self, value: &str) -> Result<u16> {
        let string_index = self.add_utf8(value)?;
        self.find_or_push(Constant::String { string_index })
    }

    /// Adds (or reuses) a NameAndType entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if new entries do not fit.
    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name_index = self.add_utf8(name)?;
        let descriptor_index = self.add_utf8(descriptor)?;
        self.find_or_push(Constant::NameAndType {
            name_index,
            descriptor_index,
        })
    }

    /// Adds (or reuses) a Fieldref entry for `owner.name:descriptor`.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if new entries do not fit.
    pub fn add_field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.add_class(owner)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.find_or_push(Constant::FieldRef {
            class_index,
            name_and_type_index,
        })
    }

    /// Adds (or reuses) a Methodref entry for `owner.name descriptor`.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if new entries do not fit.
    pub fn add_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.add_class(owner)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.find_or_push(Constant::MethodRef {
            class_index,
            name_and_type_index,
        })
    }

    /// Adds (or reuses) a MethodType entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if new entries do not fit.
    pub fn add_method_type(&mut self, descriptor: &str) -> Result<u16> {
        let descriptor_index = self.add_utf8(descriptor)?;
        self.find_or_push(Constant::MethodType { descriptor_index })
    }

    /// Serialized size in bytes, including the two-byte count.
    #[must_use]
    pub fn size(&self) -> usize {
        2 + self.entries.iter().map(Constant::size).sum::<usize>()
    }

    /// Writes the count and every entry at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is too small.
    pub fn write(&self, data: &mut [u8], offset: &mut usize) -> Result<()> {
        write_be_at(data, offset, self.entries.len() as u16)?;
        for constant in &self.entries {
            constant.write(data, offset)?;
        }
        Ok(())
    }
}
