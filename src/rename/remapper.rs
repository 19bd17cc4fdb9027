//! Applies a [`crate::rename::RenameTable`] to class files.
//!
//! Every symbol site of the class is resolved to its Utf8 text, rewritten according to the
//! grammar of the site, and on change pointed at a Utf8 entry holding the new text. The new
//! entry is interned, so an existing entry with the same text is reused. Entries that were
//! referenced before are never edited, which keeps string literals that happen to spell a
//! renamed class intact.
//!
//! Constant pool entries and member descriptors must follow their grammar. Signatures,
//! local variable types and annotation values that do not are left as they are.

use std::collections::HashMap;

use log::{trace, warn};

use crate::{
    classfile::{remap_symbol, ClassFile, SymbolKind},
    rename::RenameTable,
    Result,
};

/// Retargets every symbolic class reference of `class` found in `table`.
///
/// Returns the number of symbol sites that now reference a different Utf8 entry. A second
/// application of the same table returns `0`.
///
/// # Errors
/// Returns [`crate::Error::Rewrite`] naming the class if a constant or member descriptor is
/// malformed or the constant pool cannot hold the new names.
pub fn rewrite_class(class: &mut ClassFile, table: &RenameTable) -> Result<usize> {
    if table.is_empty() {
        return Ok(0);
    }

    remap(class, table).map_err(|error| {
        let name = class
            .binary_name()
            .unwrap_or_else(|_| format!("<this_class #{}>", class.this_class));
        error.into_rewrite(name)
    })
}

/// Parses `data`, applies `table` and serializes the result.
///
/// Classes without references to renamed names are returned byte-identical.
///
/// # Errors
/// Returns the parse errors of [`ClassFile::parse`] and the errors of [`rewrite_class`].
pub fn rewrite_bytes(data: &[u8], table: &RenameTable) -> Result<Vec<u8>> {
    let mut class = ClassFile::parse(data)?;
    if rewrite_class(&mut class, table)? == 0 {
        return Ok(data.to_vec());
    }
    class.to_bytes()
}

fn remap(class: &mut ClassFile, table: &RenameTable) -> Result<usize> {
    let lookup = |name: &[u8]| table.get_encoded(name);
    // (kind, old Utf8) -> new Utf8, None if unchanged
    let mut memo: HashMap<(SymbolKind, u16), Option<u16>> = HashMap::new();
    let mut renamed = 0;

    for site in class.symbol_sites()? {
        let index = class.symbol_index(site.location)?;

        let target = match memo.get(&(site.kind, index)) {
            Some(&target) => target,
            None => {
                let replacement =
                    match remap_symbol(site.kind, class.constant_pool.utf8(index)?, &lookup) {
                        Ok(replacement) => replacement,
                        // Attribute contents are not checked by the class loader
                        Err(error) if site.location.is_attribute() => {
                            warn!("Leaving {:?} untouched: {}", site.location, error);
                            continue;
                        }
                        Err(error) => return Err(error),
                    };
                let target = match replacement {
                    Some(text) => Some(class.constant_pool.intern_utf8(&text)?),
                    None => None,
                };
                memo.insert((site.kind, index), target);
                target
            }
        };

        if let Some(new_index) = target {
            trace!(
                "{:?}: #{} -> #{} ({:?})",
                site.location,
                index,
                new_index,
                site.kind
            );
            class.set_symbol_index(site.location, new_index)?;
            renamed += 1;
        }
    }

    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classfile::{Constant, MemberAccessFlags},
        test::sample_class,
        Error,
    };

    fn scenario_table() -> RenameTable {
        RenameTable::build(["com.lib.a", "com.lib.b"], "com.app")
    }

    #[test]
    fn renames_every_site() {
        let mut class = sample_class();
        let renamed = rewrite_class(&mut class, &scenario_table()).unwrap();
        // Fieldref owner, array class, field descriptor, field signature, local variable,
        // annotation class literal
        assert_eq!(renamed, 6);

        let references = class.class_references().unwrap();
        for expected in [
            "com/app/R$string",
            "com/app/R$drawable",
            "com/app/R$layout",
            "com/app/R$id",
            "com/app/R$color",
            "com/other/R$string",
            "com/lib/a/Greeter",
        ] {
            assert!(references.contains(expected), "missing {expected}");
        }
        assert!(!references.iter().any(|name| name.starts_with("com/lib/a/R$")));
        assert!(!references.iter().any(|name| name.starts_with("com/lib/b/R$")));
    }

    #[test]
    fn string_literals_are_untouched() {
        let mut class = sample_class();
        rewrite_class(&mut class, &scenario_table()).unwrap();

        let literal = class
            .constant_pool
            .iter()
            .find_map(|(_, constant)| match constant {
                Constant::String { string_index } => Some(*string_index),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            class.constant_pool.utf8_str(literal).unwrap(),
            "com/lib/a/R$string"
        );
    }

    #[test]
    fn second_pass_is_a_noop() {
        let table = scenario_table();
        let once = rewrite_bytes(&sample_class().to_bytes().unwrap(), &table).unwrap();
        let twice = rewrite_bytes(&once, &table).unwrap();
        assert_eq!(once, twice);

        let mut class = ClassFile::parse(&once).unwrap();
        assert_eq!(rewrite_class(&mut class, &table).unwrap(), 0);
    }

    #[test]
    fn unrelated_class_is_byte_identical() {
        let mut class = ClassFile::new("com/other/Plain", Some("java/lang/Object")).unwrap();
        class
            .add_field(MemberAccessFlags::STATIC, "label", "Lcom/other/R$string;")
            .unwrap();
        let bytes = class.to_bytes().unwrap();

        assert_eq!(rewrite_bytes(&bytes, &scenario_table()).unwrap(), bytes);
    }

    #[test]
    fn shared_descriptor_is_renamed_once_per_site() {
        let mut class = ClassFile::new("com/app/Main", Some("java/lang/Object")).unwrap();
        class
            .add_field(MemberAccessFlags::STATIC, "a", "Lcom/lib/a/R$string;")
            .unwrap();
        class
            .add_field(MemberAccessFlags::STATIC, "b", "Lcom/lib/a/R$string;")
            .unwrap();

        assert_eq!(rewrite_class(&mut class, &scenario_table()).unwrap(), 2);
        assert_eq!(class.fields[0].descriptor_index, class.fields[1].descriptor_index);
        assert_eq!(
            class
                .constant_pool
                .utf8(class.fields[0].descriptor_index)
                .unwrap(),
            b"Lcom/app/R$string;"
        );
    }

    #[test]
    fn malformed_descriptor_is_a_rewrite_error() {
        let mut class = ClassFile::new("com/app/Broken", Some("java/lang/Object")).unwrap();
        class
            .add_field(MemberAccessFlags::STATIC, "x", "Lcom/lib/a/R$string")
            .unwrap();

        match rewrite_class(&mut class, &scenario_table()) {
            Err(Error::Rewrite { class, source }) => {
                assert_eq!(class, "com.app.Broken");
                assert!(matches!(*source, Error::Malformed { .. }));
            }
            other => panic!("Expected Rewrite, got {other:?}"),
        }
    }

    #[test]
    fn malformed_signature_is_left_alone() {
        let mut class = ClassFile::new("com/app/Odd", Some("java/lang/Object")).unwrap();
        class
            .constant_pool
            .add_field_ref("com/lib/a/R$string", "title", "I")
            .unwrap();
        let garbage = class.constant_pool.add_utf8("garbage!").unwrap();
        let signature = class
            .new_attribute("Signature", garbage.to_be_bytes().to_vec())
            .unwrap();
        class
            .add_field(MemberAccessFlags::PRIVATE, "odd", "Ljava/lang/Object;")
            .unwrap()
            .attributes
            .push(signature);
        let bytes = class.to_bytes().unwrap();

        let rewritten = rewrite_bytes(&bytes, &scenario_table()).unwrap();
        let rewritten = ClassFile::parse(&rewritten).unwrap();
        let references = rewritten.class_references().unwrap();
        assert!(references.contains("com/app/R$string"));
        assert!(!references.contains("com/lib/a/R$string"));
        assert_eq!(
            rewritten.fields[0].attributes[0].index_at(0).unwrap(),
            garbage
        );
    }

    #[test]
    fn empty_table_changes_nothing() {
        let mut class = sample_class();
        assert_eq!(rewrite_class(&mut class, &RenameTable::new()).unwrap(), 0);
    }
}
