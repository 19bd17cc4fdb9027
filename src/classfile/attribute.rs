//! Attributes of classes, fields, methods and code (JVMS §4.7).
//!
//! Attributes are kept as raw bytes. The few layouts that carry class names through constant
//! pool indices are walked by [`crate::classfile::Attribute::symbol_slots`], which reports the
//! byte offset of every such index so it can be patched in place without re-encoding the
//! attribute.
//!
//! # Walked Layouts
//!
//! | Attribute | Slots |
//! |-----------|-------|
//! | `Signature` | signature |
//! | `Code` | slots of nested attributes |
//! | `LocalVariableTable` | descriptor of each entry |
//! | `LocalVariableTypeTable` | signature of each entry |
//! | `Record` | descriptor and nested attributes of each component |
//! | `Runtime{Visible,Invisible}Annotations` | annotation and element value descriptors |
//! | `Runtime{Visible,Invisible}ParameterAnnotations` | same, per parameter |
//! | `AnnotationDefault` | element value descriptors |
//!
//! Annotation attributes with an invalid layout contribute no slots and are left as they are.
//! Every other walked layout has to match its attribute length exactly.

use log::warn;

use crate::{
    classfile::{ConstantPool, SymbolKind},
    file::{
        io::{write_be_at, write_bytes_at},
        parser::Parser,
    },
    Result,
};

/// Maximum nesting of annotations and attributes accepted while walking.
const MAX_ATTRIBUTE_DEPTH: usize = 64;

/// A raw attribute: the constant pool index of its name and its undecoded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Index of the Utf8 entry naming the attribute
    pub name_index: u16,
    /// Attribute content, excluding the six byte header
    pub info: Vec<u8>,
}

/// Location of a `u2` constant pool index inside [`Attribute::info`] that names classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolSlot {
    /// Byte offset of the index within the attribute content
    pub offset: usize,
    /// How the referenced Utf8 entry encodes class names
    pub kind: SymbolKind,
}

impl Attribute {
    /// Parses an `attributes_count` followed by that many attributes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the data is truncated.
    pub fn parse_table(parser: &mut Parser) -> Result<Vec<Attribute>> {
        let count = parser.read_be::<u16>()?;
        let mut attributes = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let name_index = parser.read_be::<u16>()?;
            let length = parser.read_be::<u32>()? as usize;
            let info = parser.read_bytes(length)?.to_vec();
            attributes.push(Attribute { name_index, info });
        }
        Ok(attributes)
    }

    /// Serialized size of an attribute table, including the count.
    #[must_use]
    pub fn table_size(attributes: &[Attribute]) -> usize {
        2 + attributes
            .iter()
            .map(|attribute| 6 + attribute.info.len())
            .sum::<usize>()
    }

    /// Writes an attribute table at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is too small and
    /// [`crate::Error::Malformed`] if the table or an attribute exceeds its length field.
    pub fn write_table(attributes: &[Attribute], data: &mut [u8], offset: &mut usize) -> Result<()> {
        let count = u16::try_from(attributes.len())
            .map_err(|_| malformed_error!("More than 65535 attributes"))?;
        write_be_at(data, offset, count)?;
        for attribute in attributes {
            let length = u32::try_from(attribute.info.len())
                .map_err(|_| malformed_error!("Attribute larger than 4 GiB"))?;
            write_be_at(data, offset, attribute.name_index)?;
            write_be_at(data, offset, length)?;
            write_bytes_at(data, offset, &attribute.info)?;
        }
        Ok(())
    }

    /// Returns the decoded attribute name.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the name is not a valid Utf8 entry.
    pub fn name(&self, pool: &ConstantPool) -> Result<String> {
        pool.utf8_str(self.name_index)
    }

    /// Lists every class-naming constant pool index stored in this attribute.
    ///
    /// Attributes whose layout does not carry class names return an empty list.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the attribute name cannot be resolved or a walked
    /// layout does not match the attribute length.
    pub fn symbol_slots(&self, pool: &ConstantPool) -> Result<Vec<SymbolSlot>> {
        let mut walker = SlotWalker {
            pool,
            parser: Parser::new(&self.info),
            slots: Vec::new(),
            depth: 0,
        };
        walker.attribute(pool.utf8(self.name_index)?, self.info.len())?;
        Ok(walker.slots)
    }

    /// Reads the `u2` stored at `offset` in the attribute content.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `offset` is outside the content.
    pub fn index_at(&self, offset: usize) -> Result<u16> {
        let mut offset = offset;
        crate::file::io::read_be_at(&self.info, &mut offset)
    }

    /// Overwrites the `u2` stored at `offset` in the attribute content.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `offset` is outside the content.
    pub fn set_index_at(&mut self, offset: usize, index: u16) -> Result<()> {
        let mut offset = offset;
        write_be_at(&mut self.info, &mut offset, index)
    }
}

struct SlotWalker<'a> {
    pool: &'a ConstantPool,
    parser: Parser<'a>,
    slots: Vec<SymbolSlot>,
    depth: usize,
}

impl SlotWalker<'_> {
    fn slot(&mut self, kind: SymbolKind) -> Result<()> {
        let offset = self.parser.pos();
        self.parser.read_be::<u16>()?;
        self.slots.push(SymbolSlot { offset, kind });
        Ok(())
    }

    fn skip(&mut self, length: usize) -> Result<()> {
        self.parser.advance_by(length)
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_ATTRIBUTE_DEPTH {
            return Err(malformed_error!(
                "Attribute nesting exceeds {}",
                MAX_ATTRIBUTE_DEPTH
            ));
        }
        Ok(())
    }

    /// Walks one attribute whose content starts at the current position.
    fn attribute(&mut self, name: &[u8], length: usize) -> Result<()> {
        let end = self.parser.calc_end_position(length)?;
        self.enter()?;

        match name {
            b"Signature" => self.slot(SymbolKind::Signature)?,
            b"Code" => self.code()?,
            b"LocalVariableTable" => self.local_variables(SymbolKind::Descriptor)?,
            b"LocalVariableTypeTable" => self.local_variables(SymbolKind::Signature)?,
            b"Record" => self.record()?,
            b"RuntimeVisibleAnnotations" | b"RuntimeInvisibleAnnotations" => {
                self.tolerant(name, end, Self::annotations)?;
            }
            b"RuntimeVisibleParameterAnnotations" | b"RuntimeInvisibleParameterAnnotations" => {
                self.tolerant(name, end, |walker| {
                    let parameters = walker.parser.read_be::<u8>()?;
                    for _ in 0..parameters {
                        walker.annotations()?;
                    }
                    Ok(())
                })?;
            }
            b"AnnotationDefault" => self.tolerant(name, end, Self::element_value)?,
            _ => self.parser.seek(end)?,
        }

        self.depth -= 1;
        if self.parser.pos() != end {
            return Err(malformed_error!(
                "Attribute '{}' content does not match its length {}",
                String::from_utf8_lossy(name),
                length
            ));
        }
        Ok(())
    }

    /// Runs `walk` over content ending at `end`. An invalid layout drops the slots found so far
    /// and skips the content.
    fn tolerant<F>(&mut self, name: &[u8], end: usize, walk: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let slots = self.slots.len();
        let depth = self.depth;

        let walked = walk(self).and_then(|()| {
            if self.parser.pos() == end {
                Ok(())
            } else {
                Err(malformed_error!("Content does not match its length"))
            }
        });
        if let Err(error) = walked {
            warn!(
                "Skipping malformed '{}' attribute: {}",
                String::from_utf8_lossy(name),
                error
            );
            self.slots.truncate(slots);
            self.depth = depth;
            self.parser.seek(end)?;
        }
        Ok(())
    }

    fn nested_attributes(&mut self) -> Result<()> {
        let pool = self.pool;
        let count = self.parser.read_be::<u16>()?;
        for _ in 0..count {
            let name_index = self.parser.read_be::<u16>()?;
            let length = self.parser.read_be::<u32>()? as usize;
            let name = pool.utf8(name_index)?;
            self.attribute(name, length)?;
        }
        Ok(())
    }

    fn code(&mut self) -> Result<()> {
        // max_stack, max_locals
        self.skip(4)?;
        let code_length = self.parser.read_be::<u32>()? as usize;
        self.skip(code_length)?;
        let exception_table_length = usize::from(self.parser.read_be::<u16>()?);
        self.skip(exception_table_length * 8)?;
        self.nested_attributes()
    }

    fn local_variables(&mut self, kind: SymbolKind) -> Result<()> {
        let count = self.parser.read_be::<u16>()?;
        for _ in 0..count {
            // start_pc, length, name_index
            self.skip(6)?;
            self.slot(kind)?;
            // index
            self.skip(2)?;
        }
        Ok(())
    }

    fn record(&mut self) -> Result<()> {
        let count = self.parser.read_be::<u16>()?;
        for _ in 0..count {
            // name_index
            self.skip(2)?;
            self.slot(SymbolKind::Descriptor)?;
            self.nested_attributes()?;
        }
        Ok(())
    }

    fn annotations(&mut self) -> Result<()> {
        let count = self.parser.read_be::<u16>()?;
        for _ in 0..count {
            self.annotation()?;
        }
        Ok(())
    }

    fn annotation(&mut self) -> Result<()> {
        self.enter()?;
        self.slot(SymbolKind::Descriptor)?;
        let pairs = self.parser.read_be::<u16>()?;
        for _ in 0..pairs {
            // element_name_index
            self.skip(2)?;
            self.element_value()?;
        }
        self.depth -= 1;
        Ok(())
    }

    fn element_value(&mut self) -> Result<()> {
        let tag = self.parser.read_be::<u8>()?;
        match tag {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => self.skip(2),
            b'e' => {
                self.slot(SymbolKind::Descriptor)?;
                // const_name_index
                self.skip(2)
            }
            b'c' => self.slot(SymbolKind::Descriptor),
            b'@' => self.annotation(),
            b'[' => {
                self.enter()?;
                let values = self.parser.read_be::<u16>()?;
                for _ in 0..values {
                    self.element_value()?;
                }
                self.depth -= 1;
                Ok(())
            }
            other => Err(malformed_error!(
                "Unknown element value tag '{}'",
                char::from(other)
            )),
        }
    }
}
