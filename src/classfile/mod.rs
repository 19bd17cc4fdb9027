//! In-memory model of a compiled JVM class file (JVMS §4).
//!
//! [`crate::classfile::ClassFile`] parses every structure of a class file into owned values,
//! allows the symbolic references in it to be inspected and retargeted, and serializes the
//! result back. Parsing followed by serialization without modification reproduces the input
//! byte for byte.
//!
//! # Architecture
//!
//! - [`crate::classfile::ConstantPool`] - The symbolic reference table, including interning
//! - [`crate::classfile::Member`] - Field and method declarations
//! - [`crate::classfile::Attribute`] - Raw attributes, plus the walker locating class-naming
//!   constant pool indices inside them
//! - [`crate::classfile::remap_symbol`] - Grammar-aware substitution of class names inside
//!   descriptors and generic signatures
//! - [`crate::classfile::mutf8`] - The modified UTF-8 encoding of Utf8 entries
//!
//! # Symbol Sites
//!
//! Every position in a class file that names a class through a Utf8 entry is a *symbol site*,
//! enumerated by [`crate::classfile::ClassFile::symbol_sites`]. Sites are addressed by
//! [`crate::classfile::SymbolLocation`] and retargeted with
//! [`crate::classfile::ClassFile::set_symbol_index`], so a rename never edits a Utf8 entry that
//! might be shared with an unrelated string literal.
//!
//! # Examples
//!
//! ```rust
//! use rembed::classfile::{ClassFile, MemberAccessFlags};
//!
//! let mut class = ClassFile::new("com/app/Main", Some("java/lang/Object"))?;
//! class.add_field(MemberAccessFlags::STATIC, "title", "Lcom/app/R$string;")?;
//!
//! let bytes = class.to_bytes()?;
//! let parsed = ClassFile::parse(&bytes)?;
//! assert_eq!(parsed.this_class_name()?, "com/app/Main");
//! assert!(parsed.class_references()?.contains("com/app/R$string"));
//! # Ok::<(), rembed::Error>(())
//! ```

mod access;
mod attribute;
mod constant;
mod descriptor;
mod member;
pub mod mutf8;

pub use access::{ClassAccessFlags, MemberAccessFlags};
pub use attribute::{Attribute, SymbolSlot};
pub use constant::{Constant, ConstantPool, ConstantTag, MAX_CONSTANT_POOL_COUNT};
pub use descriptor::{remap_symbol, SymbolKind};
pub use member::Member;

use std::{
    cell::RefCell,
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use crate::{
    file::{io::write_be_at, parser::Parser, File},
    Error, Result,
};

/// The `magic` item opening every class file.
pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;

/// Major version written by [`ClassFile::new`] (Java 8).
pub const DEFAULT_MAJOR_VERSION: u16 = 52;

/// The declaration that owns an attribute table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeOwner {
    /// The class itself
    Class,
    /// The field at this position of [`ClassFile::fields`]
    Field(usize),
    /// The method at this position of [`ClassFile::methods`]
    Method(usize),
}

/// Where a class-naming Utf8 index is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolLocation {
    /// The name of a Class entry, or the descriptor of a NameAndType or MethodType entry
    Constant(u16),
    /// The descriptor of the field at this position
    FieldDescriptor(usize),
    /// The descriptor of the method at this position
    MethodDescriptor(usize),
    /// A `u2` inside an attribute's content
    Attribute {
        /// Declaration owning the attribute table
        owner: AttributeOwner,
        /// Position of the attribute in that table
        attribute: usize,
        /// Byte offset of the index within the attribute content
        offset: usize,
    },
}

impl SymbolLocation {
    /// Returns `true` for slots inside attribute contents.
    #[must_use]
    pub fn is_attribute(&self) -> bool {
        matches!(self, SymbolLocation::Attribute { .. })
    }
}

/// A class-naming Utf8 reference: where it is stored and how the text encodes names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolSite {
    /// Storage of the Utf8 index
    pub location: SymbolLocation,
    /// Textual shape of the referenced Utf8 entry
    pub kind: SymbolKind,
}

/// A parsed class file.
#[derive(Debug, Clone)]
pub struct ClassFile {
    /// Minor version number
    pub minor_version: u16,
    /// Major version number
    pub major_version: u16,
    /// The symbolic reference table
    pub constant_pool: ConstantPool,
    /// Class access and property flags
    pub access_flags: ClassAccessFlags,
    /// Index of the Class entry naming this class
    pub this_class: u16,
    /// Index of the Class entry naming the superclass, `0` for `java/lang/Object`
    pub super_class: u16,
    /// Indices of the Class entries naming the direct superinterfaces
    pub interfaces: Vec<u16>,
    /// Declared fields
    pub fields: Vec<Member>,
    /// Declared methods
    pub methods: Vec<Member>,
    /// Class attributes
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Loads a class file from disk through a memory-mapped backend.
    ///
    /// # Arguments
    /// * `path` - Path of the `.class` file
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, [`crate::Error::Empty`]
    /// for empty files and the errors of [`ClassFile::parse`] otherwise.
    pub fn from_file(path: impl AsRef<Path>) -> Result<ClassFile> {
        let file = File::from_file(path)?;
        ClassFile::parse(file.data())
    }

    /// Parses a class file held in memory.
    ///
    /// # Errors
    /// See [`ClassFile::parse`].
    pub fn from_mem(data: Vec<u8>) -> Result<ClassFile> {
        let file = File::from_mem(data)?;
        ClassFile::parse(file.data())
    }

    /// Parses a class file from a byte slice.
    ///
    /// # Errors
    /// - [`crate::Error::Empty`] for empty input
    /// - [`crate::Error::NotSupported`] if the input does not start with the class file magic
    /// - [`crate::Error::OutOfBounds`] for truncated input
    /// - [`crate::Error::Malformed`] for invalid structures or trailing bytes
    pub fn parse(data: &[u8]) -> Result<ClassFile> {
        if data.is_empty() {
            return Err(Error::Empty);
        }

        let mut parser = Parser::new(data);
        if data.len() < 4 || parser.read_be::<u32>()? != CLASS_MAGIC {
            return Err(Error::NotSupported);
        }

        let minor_version = parser.read_be::<u16>()?;
        let major_version = parser.read_be::<u16>()?;
        let constant_pool = ConstantPool::parse(&mut parser)?;
        let access_flags = ClassAccessFlags::from_bits_retain(parser.read_be()?);
        let this_class = parser.read_be::<u16>()?;
        let super_class = parser.read_be::<u16>()?;

        let interface_count = parser.read_be::<u16>()?;
        let mut interfaces = Vec::with_capacity(usize::from(interface_count));
        for _ in 0..interface_count {
            interfaces.push(parser.read_be::<u16>()?);
        }

        let fields = Member::parse_table(&mut parser)?;
        let methods = Member::parse_table(&mut parser)?;
        let attributes = Attribute::parse_table(&mut parser)?;

        if parser.has_more_data() {
            return Err(malformed_error!(
                "{} trailing bytes after the class file",
                parser.remaining()
            ));
        }

        Ok(ClassFile {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Creates an empty public class.
    ///
    /// # Arguments
    /// * `name` - Internal name of the class, e.g. `com/app/Main`
    /// * `super_class` - Internal name of the superclass, `None` only for `java/lang/Object`
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if the names do not fit the pool.
    pub fn new(name: &str, super_class: Option<&str>) -> Result<ClassFile> {
        let mut constant_pool = ConstantPool::new();
        let this_class = constant_pool.add_class(name)?;
        let super_class = match super_class {
            Some(super_name) => constant_pool.add_class(super_name)?,
            None => 0,
        };

        Ok(ClassFile {
            minor_version: 0,
            major_version: DEFAULT_MAJOR_VERSION,
            constant_pool,
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        })
    }

    /// Internal name of this class, e.g. `com/app/Main`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `this_class` is not a valid Class entry.
    pub fn this_class_name(&self) -> Result<String> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Binary name of this class, e.g. `com.app.Main`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `this_class` is not a valid Class entry.
    pub fn binary_name(&self) -> Result<String> {
        Ok(self.this_class_name()?.replace('/', "."))
    }

    /// Internal name of the superclass, `None` if the class has none.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `super_class` is not a valid Class entry.
    pub fn super_class_name(&self) -> Result<Option<String>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.class_name(self.super_class).map(Some)
    }

    /// Internal names of the direct superinterfaces, in declaration order.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if an interface is not a valid Class entry.
    pub fn interface_names(&self) -> Result<Vec<String>> {
        self.interfaces
            .iter()
            .map(|&index| self.constant_pool.class_name(index))
            .collect()
    }

    /// Every internal class name referenced from a symbol site, sorted.
    ///
    /// Array descriptors contribute their element class. Attribute sites that do not follow
    /// their grammar are skipped.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a site does not resolve or a constant or member
    /// descriptor does not follow its grammar.
    pub fn class_references(&self) -> Result<BTreeSet<String>> {
        let names = RefCell::new(BTreeSet::new());
        let record = |name: &[u8]| -> Option<&'static [u8]> {
            names.borrow_mut().insert(name.to_vec());
            None
        };

        for site in self.symbol_sites()? {
            let index = self.symbol_index(site.location)?;
            match remap_symbol(site.kind, self.constant_pool.utf8(index)?, &record) {
                Err(_) if site.location.is_attribute() => {}
                result => {
                    result?;
                }
            }
        }

        names
            .into_inner()
            .iter()
            .map(|name| mutf8::decode(name))
            .collect()
    }

    /// Enumerates every class-naming Utf8 reference of the class.
    ///
    /// The list covers Class names, NameAndType and MethodType descriptors, field and method
    /// descriptors and every slot reported by [`Attribute::symbol_slots`] for class, field and
    /// method attributes.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if an attribute name does not resolve or a walked
    /// attribute layout is invalid.
    pub fn symbol_sites(&self) -> Result<Vec<SymbolSite>> {
        let mut sites = Vec::new();

        for (index, constant) in self.constant_pool.iter() {
            let kind = match constant {
                Constant::Class { .. } => SymbolKind::ClassName,
                Constant::NameAndType { .. } | Constant::MethodType { .. } => {
                    SymbolKind::Descriptor
                }
                _ => continue,
            };
            sites.push(SymbolSite {
                location: SymbolLocation::Constant(index),
                kind,
            });
        }

        for position in 0..self.fields.len() {
            sites.push(SymbolSite {
                location: SymbolLocation::FieldDescriptor(position),
                kind: SymbolKind::Descriptor,
            });
        }
        for position in 0..self.methods.len() {
            sites.push(SymbolSite {
                location: SymbolLocation::MethodDescriptor(position),
                kind: SymbolKind::Descriptor,
            });
        }

        let owners = std::iter::once((AttributeOwner::Class, &self.attributes))
            .chain(
                self.fields
                    .iter()
                    .enumerate()
                    .map(|(position, field)| (AttributeOwner::Field(position), &field.attributes)),
            )
            .chain(self.methods.iter().enumerate().map(|(position, method)| {
                (AttributeOwner::Method(position), &method.attributes)
            }));

        for (owner, attributes) in owners {
            for (attribute, entry) in attributes.iter().enumerate() {
                for slot in entry.symbol_slots(&self.constant_pool)? {
                    sites.push(SymbolSite {
                        location: SymbolLocation::Attribute {
                            owner,
                            attribute,
                            offset: slot.offset,
                        },
                        kind: slot.kind,
                    });
                }
            }
        }

        Ok(sites)
    }

    /// Reads the Utf8 index stored at `location`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `location` does not address a symbol site of this
    /// class.
    pub fn symbol_index(&self, location: SymbolLocation) -> Result<u16> {
        match location {
            SymbolLocation::Constant(index) => match self.constant_pool.get(index)? {
                Constant::Class { name_index } => Ok(*name_index),
                Constant::NameAndType {
                    descriptor_index, ..
                }
                | Constant::MethodType { descriptor_index } => Ok(*descriptor_index),
                other => Err(malformed_error!(
                    "Constant pool index {} is {:?}, which names no class",
                    index,
                    other.tag()
                )),
            },
            SymbolLocation::FieldDescriptor(position) => {
                Ok(member(&self.fields, position)?.descriptor_index)
            }
            SymbolLocation::MethodDescriptor(position) => {
                Ok(member(&self.methods, position)?.descriptor_index)
            }
            SymbolLocation::Attribute {
                owner,
                attribute,
                offset,
            } => self.attribute(owner, attribute)?.index_at(offset),
        }
    }

    /// Stores the Utf8 index `utf8_index` at `location`.
    ///
    /// Only the referencing slot changes; the previously referenced Utf8 entry stays in the
    /// pool untouched.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `location` does not address a symbol site of this
    /// class or `utf8_index` is not a Utf8 entry.
    pub fn set_symbol_index(&mut self, location: SymbolLocation, utf8_index: u16) -> Result<()> {
        self.constant_pool.utf8(utf8_index)?;

        match location {
            SymbolLocation::Constant(index) => {
                let updated = match self.constant_pool.get(index)? {
                    Constant::Class { .. } => Constant::Class {
                        name_index: utf8_index,
                    },
                    Constant::NameAndType { name_index, .. } => Constant::NameAndType {
                        name_index: *name_index,
                        descriptor_index: utf8_index,
                    },
                    Constant::MethodType { .. } => Constant::MethodType {
                        descriptor_index: utf8_index,
                    },
                    other => {
                        return Err(malformed_error!(
                            "Constant pool index {} is {:?}, which names no class",
                            index,
                            other.tag()
                        ))
                    }
                };
                self.constant_pool.set(index, updated)
            }
            SymbolLocation::FieldDescriptor(position) => {
                member_mut(&mut self.fields, position)?.descriptor_index = utf8_index;
                Ok(())
            }
            SymbolLocation::MethodDescriptor(position) => {
                member_mut(&mut self.methods, position)?.descriptor_index = utf8_index;
                Ok(())
            }
            SymbolLocation::Attribute {
                owner,
                attribute,
                offset,
            } => self
                .attribute_mut(owner, attribute)?
                .set_index_at(offset, utf8_index),
        }
    }

    fn attribute(&self, owner: AttributeOwner, position: usize) -> Result<&Attribute> {
        let attributes = match owner {
            AttributeOwner::Class => &self.attributes,
            AttributeOwner::Field(field) => &member(&self.fields, field)?.attributes,
            AttributeOwner::Method(method) => &member(&self.methods, method)?.attributes,
        };
        attributes
            .get(position)
            .ok_or_else(|| malformed_error!("No attribute at position {}", position))
    }

    fn attribute_mut(&mut self, owner: AttributeOwner, position: usize) -> Result<&mut Attribute> {
        let attributes = match owner {
            AttributeOwner::Class => &mut self.attributes,
            AttributeOwner::Field(field) => &mut member_mut(&mut self.fields, field)?.attributes,
            AttributeOwner::Method(method) => {
                &mut member_mut(&mut self.methods, method)?.attributes
            }
        };
        attributes
            .get_mut(position)
            .ok_or_else(|| malformed_error!("No attribute at position {}", position))
    }

    /// Creates an attribute named `name`, interning the name in the constant pool.
    ///
    /// The attribute is not attached; push it onto the table of its owner.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if the name does not fit the pool.
    pub fn new_attribute(&mut self, name: &str, info: Vec<u8>) -> Result<Attribute> {
        Ok(Attribute {
            name_index: self.constant_pool.add_utf8(name)?,
            info,
        })
    }

    /// Appends a class attribute.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if the name does not fit the pool.
    pub fn add_attribute(&mut self, name: &str, info: Vec<u8>) -> Result<()> {
        let attribute = self.new_attribute(name, info)?;
        self.attributes.push(attribute);
        Ok(())
    }

    /// Appends a direct superinterface.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if the name does not fit the pool.
    pub fn add_interface(&mut self, name: &str) -> Result<()> {
        let index = self.constant_pool.add_class(name)?;
        self.interfaces.push(index);
        Ok(())
    }

    /// Declares a field and returns it for further attributes.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if the strings do not fit the pool.
    pub fn add_field(
        &mut self,
        access_flags: MemberAccessFlags,
        name: &str,
        descriptor: &str,
    ) -> Result<&mut Member> {
        let member = self.new_member(access_flags, name, descriptor)?;
        self.fields.push(member);
        let position = self.fields.len() - 1;
        member_mut(&mut self.fields, position)
    }

    /// Declares a method and returns it for further attributes.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolOverflow`] if the strings do not fit the pool.
    pub fn add_method(
        &mut self,
        access_flags: MemberAccessFlags,
        name: &str,
        descriptor: &str,
    ) -> Result<&mut Member> {
        let member = self.new_member(access_flags, name, descriptor)?;
        self.methods.push(member);
        let position = self.methods.len() - 1;
        member_mut(&mut self.methods, position)
    }

    fn new_member(
        &mut self,
        access_flags: MemberAccessFlags,
        name: &str,
        descriptor: &str,
    ) -> Result<Member> {
        Ok(Member {
            access_flags,
            name_index: self.constant_pool.add_utf8(name)?,
            descriptor_index: self.constant_pool.add_utf8(descriptor)?,
            attributes: Vec::new(),
        })
    }

    /// Serialized size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        // magic, versions
        8 + self.constant_pool.size()
            // access_flags, this_class, super_class, interfaces_count
            + 8
            + self.interfaces.len() * 2
            + Member::table_size(&self.fields)
            + Member::table_size(&self.methods)
            + Attribute::table_size(&self.attributes)
    }

    /// Serializes the class file.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a table or entry exceeds the size its length
    /// field can express.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut data = vec![0u8; self.size()];
        let mut offset = 0;

        write_be_at(&mut data, &mut offset, CLASS_MAGIC)?;
        write_be_at(&mut data, &mut offset, self.minor_version)?;
        write_be_at(&mut data, &mut offset, self.major_version)?;
        self.constant_pool.write(&mut data, &mut offset)?;
        write_be_at(&mut data, &mut offset, self.access_flags.bits())?;
        write_be_at(&mut data, &mut offset, self.this_class)?;
        write_be_at(&mut data, &mut offset, self.super_class)?;

        let interface_count = u16::try_from(self.interfaces.len())
            .map_err(|_| malformed_error!("More than 65535 interfaces"))?;
        write_be_at(&mut data, &mut offset, interface_count)?;
        for &interface in &self.interfaces {
            write_be_at(&mut data, &mut offset, interface)?;
        }

        Member::write_table(&self.fields, &mut data, &mut offset)?;
        Member::write_table(&self.methods, &mut data, &mut offset)?;
        Attribute::write_table(&self.attributes, &mut data, &mut offset)?;

        debug_assert_eq!(offset, data.len());
        Ok(data)
    }

    /// Path of this class below a class directory `root`: `root/<internal name>.class`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `this_class` is not a valid Class entry.
    pub fn output_path(&self, root: impl AsRef<Path>) -> Result<PathBuf> {
        Ok(class_path_in(root.as_ref(), &self.this_class_name()?))
    }

    /// Serializes the class into `root/<internal name>.class`, creating parent directories and
    /// replacing any existing file. Returns the written path.
    ///
    /// # Errors
    /// Returns [`crate::Error::Io`] if a directory or the file cannot be written.
    pub fn write_to_file(&self, root: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.output_path(root)?;
        let data = self.to_bytes()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| Error::io(parent, error))?;
        }
        std::fs::write(&path, data).map_err(|error| Error::io(&path, error))?;
        Ok(path)
    }
}

/// Location of the class with internal name `name` below `root`.
pub(crate) fn class_path_in(root: &Path, name: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    let mut segments = name.split('/').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_some() {
            path.push(segment);
        } else {
            path.push(format!("{segment}.class"));
        }
    }
    path
}

fn member(members: &[Member], position: usize) -> Result<&Member> {
    members
        .get(position)
        .ok_or_else(|| malformed_error!("No member at position {}", position))
}

fn member_mut(members: &mut [Member], position: usize) -> Result<&mut Member> {
    members
        .get_mut(position)
        .ok_or_else(|| malformed_error!("No member at position {}", position))
}
