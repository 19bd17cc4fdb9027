//! Rewriting of compiler output.
//!
//! `tests/samples/embedding/classes` holds `javac --release 8 -g` output of the sources in
//! `tests/samples/embedding/src`: two libraries (`com.lib.a`, `com.lib.b`), an unrelated
//! package with its own accessor class (`com.other`) and the consumer (`com.app`). The classes
//! carry StackMapTable, InnerClasses, BootstrapMethods, LocalVariableTypeTable and Long/Double
//! constants.

mod common;

use std::{fs, path::PathBuf};

use common::class_file;
use rembed::{prelude::*, Result};
use walkdir::WalkDir;

const SAMPLES_DIR: &str = "tests/samples/embedding/classes";

fn samples() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(SAMPLES_DIR)
}

fn table() -> RenameTable {
    RenameTable::build(["com.lib.a", "com.lib.b"], "com.app")
}

// Helper function to list every compiled sample class
fn sample_files() -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(samples())
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|extension| extension == "class"))
        .collect();
    files.sort();
    files
}

// Helper function to rewrite one sample class in memory
fn rewritten(name: &str) -> Result<ClassFile> {
    let original = fs::read(class_file(&samples(), name))?;
    ClassFile::parse(&rewrite_bytes(&original, &table())?)
}

// Helper function to resolve the owners of every field reference named `field`
fn field_owners(class: &ClassFile, field: &str) -> Result<Vec<String>> {
    let pool = &class.constant_pool;
    let mut owners = Vec::new();
    for (_, constant) in pool.iter() {
        let Constant::FieldRef {
            class_index,
            name_and_type_index,
        } = constant
        else {
            continue;
        };
        if let Constant::NameAndType { name_index, .. } = pool.get(*name_and_type_index)? {
            if pool.utf8_str(*name_index)? == field {
                owners.push(pool.class_name(*class_index)?);
            }
        }
    }
    Ok(owners)
}

// Helper function to find a member by name
fn member<'a>(class: &ClassFile, members: &'a [Member], name: &str) -> Result<&'a Member> {
    for candidate in members {
        if class.constant_pool.utf8_str(candidate.name_index)? == name {
            return Ok(candidate);
        }
    }
    panic!("No member named {name}");
}

#[test]
fn compiled_classes_roundtrip() -> Result<()> {
    let files = sample_files();
    assert_eq!(files.len(), 19);

    for path in files {
        let original = fs::read(&path)?;
        let class = ClassFile::parse(&original)?;
        assert_eq!(class.to_bytes()?, original, "{}", path.display());
        assert_eq!(ClassFile::from_file(&path)?.to_bytes()?, original);
    }
    Ok(())
}

#[test]
fn getstatic_owners_are_retargeted() -> Result<()> {
    let screen = rewritten("com/lib/a/Screen")?;

    assert_eq!(field_owners(&screen, "title")?, vec!["com/app/R$string"]);
    assert_eq!(field_owners(&screen, "subtitle")?, vec!["com/app/R$string"]);
    assert_eq!(field_owners(&screen, "screen")?, vec!["com/app/R$layout"]);
    assert_eq!(field_owners(&screen, "header")?, vec!["com/app/R$id"]);
    assert_eq!(field_owners(&screen, "cancel")?, vec!["com/other/R$string"]);
    assert_eq!(field_owners(&screen, "out")?, vec!["java/lang/System"]);

    let icon = rewritten("com/lib/b/Icon")?;
    assert_eq!(field_owners(&icon, "icon")?, vec!["com/app/R$drawable"]);
    let cache = member(&icon, &icon.fields, "cache")?;
    assert_eq!(
        icon.constant_pool.utf8_str(cache.descriptor_index)?,
        "[Lcom/app/R$drawable;"
    );
    Ok(())
}

#[test]
fn signatures_and_annotations_are_retargeted() -> Result<()> {
    let screen = rewritten("com/lib/a/Screen")?;

    let references = screen.class_references()?;
    assert!(references.contains("com/app/R$color"));
    assert!(references.contains("com/app/R$id"));
    assert!(references.contains("com/lib/a/Bind"));
    assert!(!references.iter().any(|name| name.starts_with("com/lib/a/R$")));

    let ids = member(&screen, &screen.fields, "ids")?;
    let signature = ids
        .attributes
        .iter()
        .find(|attribute| {
            attribute
                .name(&screen.constant_pool)
                .is_ok_and(|name| name == "Signature")
        })
        .expect("ids has a Signature attribute");
    assert_eq!(
        screen.constant_pool.utf8_str(signature.index_at(0)?)?,
        "Ljava/util/List<Lcom/app/R$id;>;"
    );

    let sum = member(&screen, &screen.methods, "sum")?;
    let sum_signature = sum
        .attributes
        .iter()
        .find(|attribute| {
            attribute
                .name(&screen.constant_pool)
                .is_ok_and(|name| name == "Signature")
        })
        .expect("sum has a Signature attribute");
    assert_eq!(
        screen.constant_pool.utf8_str(sum_signature.index_at(0)?)?,
        "(Ljava/util/List<Lcom/app/R$id;>;)I"
    );

    let constants: Vec<&Constant> = screen.constant_pool.iter().map(|(_, c)| c).collect();
    assert!(constants.contains(&&Constant::Long(1 << 40)));
    assert!(constants.contains(&&Constant::Double(2.5f64.to_bits())));
    Ok(())
}

#[test]
fn compiled_tree_full_rebuild() -> Result<()> {
    let output = tempfile::tempdir()?;

    let report =
        Rewriter::default().apply(samples(), &ChangeSet::new(), &table(), output.path())?;
    assert_eq!(report.rewritten.len(), 19);
    assert!(report.renamed_references > 0);

    for name in [
        "com/app/Main",
        "com/app/R$string",
        "com/app/R",
        "com/other/R$string",
        "com/lib/a/Bind",
    ] {
        assert_eq!(
            fs::read(class_file(output.path(), name))?,
            fs::read(class_file(&samples(), name))?,
            "{name} changed"
        );
    }

    let screen = fs::read(class_file(output.path(), "com/lib/a/Screen"))?;
    assert_eq!(screen, rewritten("com/lib/a/Screen")?.to_bytes()?);
    assert_eq!(rewrite_bytes(&screen, &table())?, screen);
    assert!(class_file(output.path(), "com/lib/b/Icon").exists());
    Ok(())
}
