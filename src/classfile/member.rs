//! Fields and methods (JVMS §4.5, §4.6).
//!
//! Both share the same layout: access flags, name, descriptor and an attribute table.

use crate::{
    classfile::{Attribute, MemberAccessFlags},
    file::{io::write_be_at, parser::Parser},
    Result,
};

/// A field or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Access and property flags
    pub access_flags: MemberAccessFlags,
    /// Index of the Utf8 entry holding the simple name
    pub name_index: u16,
    /// Index of the Utf8 entry holding the field or method descriptor
    pub descriptor_index: u16,
    /// Attributes such as `Code`, `Signature` and annotations
    pub attributes: Vec<Attribute>,
}

impl Member {
    /// Parses a `u2` count followed by that many members.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the data is truncated.
    pub fn parse_table(parser: &mut Parser) -> Result<Vec<Member>> {
        let count = parser.read_be::<u16>()?;
        let mut members = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            members.push(Member {
                access_flags: MemberAccessFlags::from_bits_retain(parser.read_be()?),
                name_index: parser.read_be()?,
                descriptor_index: parser.read_be()?,
                attributes: Attribute::parse_table(parser)?,
            });
        }
        Ok(members)
    }

    /// Serialized size of a member table, including the count.
    #[must_use]
    pub fn table_size(members: &[Member]) -> usize {
        2 + members
            .iter()
            .map(|member| 6 + Attribute::table_size(&member.attributes))
            .sum::<usize>()
    }

    /// Writes a member table at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is too small and
    /// [`crate::Error::Malformed`] if a count does not fit its field.
    pub fn write_table(members: &[Member], data: &mut [u8], offset: &mut usize) -> Result<()> {
        let count = u16::try_from(members.len())
            .map_err(|_| malformed_error!("More than 65535 members"))?;
        write_be_at(data, offset, count)?;
        for member in members {
            write_be_at(data, offset, member.access_flags.bits())?;
            write_be_at(data, offset, member.name_index)?;
            write_be_at(data, offset, member.descriptor_index)?;
            Attribute::write_table(&member.attributes, data, offset)?;
        }
        Ok(())
    }
}
