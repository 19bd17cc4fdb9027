//! Integration tests for rewriting class directories.
//!
//! Libraries `com.lib.a` and `com.lib.b` are embedded into `com.app`; the input tree holds one
//! class of each library, one consumer class and a non-class file.

mod common;

use std::fs;

use common::{class_file, load, populate};
use rembed::{prelude::*, Result};

fn table() -> RenameTable {
    RenameTable::build(["com.lib.a", "com.lib.b"], "com.app")
}

#[test]
fn full_rebuild_rewrites_every_class() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    populate(input.path())?;

    let report = Rewriter::default().apply(input.path(), &ChangeSet::new(), &table(), output.path())?;

    assert!(report.full_rebuild);
    assert_eq!(
        report.rewritten,
        vec!["com.app.Main", "com.lib.a.Screen", "com.lib.b.Icon"]
    );
    assert_eq!(report.ignored, 1);
    assert!(!output.path().join("META-INF").exists());

    let screen = load(output.path(), "com/lib/a/Screen")?.class_references()?;
    assert!(screen.contains("com/app/R$string"));
    assert!(screen.contains("com/app/R$layout"));
    assert!(screen.contains("com/other/R$string"));
    assert!(!screen.contains("com/lib/a/R$string"));
    assert!(!screen.contains("com/lib/a/R$layout"));

    let icon = load(output.path(), "com/lib/b/Icon")?;
    assert!(icon.class_references()?.contains("com/app/R$drawable"));
    assert_eq!(
        icon.constant_pool.utf8_str(icon.methods[0].descriptor_index)?,
        "([Lcom/app/R$drawable;)Lcom/app/R$drawable;"
    );
    Ok(())
}

#[test]
fn unaffected_class_is_byte_identical() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    populate(input.path())?;

    Rewriter::default().apply(input.path(), &ChangeSet::new(), &table(), output.path())?;

    assert_eq!(
        fs::read(class_file(output.path(), "com/app/Main"))?,
        fs::read(class_file(input.path(), "com/app/Main"))?
    );
    Ok(())
}

#[test]
fn rewriting_twice_is_idempotent() -> Result<()> {
    let input = tempfile::tempdir()?;
    let once = tempfile::tempdir()?;
    let twice = tempfile::tempdir()?;
    populate(input.path())?;

    let rewriter = Rewriter::default();
    rewriter.apply(input.path(), &ChangeSet::new(), &table(), once.path())?;
    let report = rewriter.apply(once.path(), &ChangeSet::new(), &table(), twice.path())?;

    assert_eq!(report.renamed_references, 0);
    for name in ["com/app/Main", "com/lib/a/Screen", "com/lib/b/Icon"] {
        assert_eq!(
            fs::read(class_file(once.path(), name))?,
            fs::read(class_file(twice.path(), name))?
        );
    }
    Ok(())
}

#[test]
fn sequential_and_parallel_agree() -> Result<()> {
    let input = tempfile::tempdir()?;
    let parallel = tempfile::tempdir()?;
    let sequential = tempfile::tempdir()?;
    populate(input.path())?;

    let a = Rewriter::default().apply(input.path(), &ChangeSet::new(), &table(), parallel.path())?;
    let b = Rewriter::new(RewriterConfig::sequential()).apply(
        input.path(),
        &ChangeSet::new(),
        &table(),
        sequential.path(),
    )?;

    assert_eq!(a, b);
    assert_eq!(
        fs::read(class_file(parallel.path(), "com/lib/a/Screen"))?,
        fs::read(class_file(sequential.path(), "com/lib/a/Screen"))?
    );
    Ok(())
}

#[test]
fn removed_input_deletes_output_without_loading() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    populate(input.path())?;
    Rewriter::default().apply(input.path(), &ChangeSet::new(), &table(), output.path())?;

    // The removed input is gone; only its stale output remains
    fs::remove_file(class_file(input.path(), "com/lib/a/Screen"))?;
    let changes: ChangeSet = [(
        input.path().join("com/lib/a/Screen.class"),
        FileStatus::Removed,
    )]
    .into_iter()
    .collect();

    let report = Rewriter::default().apply(input.path(), &changes, &table(), output.path())?;

    assert!(report.rewritten.is_empty());
    assert_eq!(
        report.deleted,
        vec![class_file(output.path(), "com/lib/a/Screen")]
    );
    assert!(!class_file(output.path(), "com/lib/a/Screen").exists());
    assert!(class_file(output.path(), "com/lib/b/Icon").exists());
    Ok(())
}

#[test]
fn only_changed_class_is_processed() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    populate(input.path())?;
    Rewriter::default().apply(input.path(), &ChangeSet::new(), &table(), output.path())?;

    // Loading the corrupted inputs would fail the pass
    fs::write(class_file(input.path(), "com/app/Main"), b"corrupt")?;
    fs::write(class_file(input.path(), "com/lib/b/Icon"), b"corrupt")?;
    fs::write(class_file(output.path(), "com/lib/b/Icon"), b"marker")?;

    let changes: ChangeSet = [
        ("com/lib/a/Screen.class", FileStatus::Changed),
        ("com/app/Main.class", FileStatus::Unchanged),
    ]
    .into_iter()
    .collect();
    let report = Rewriter::default().apply(input.path(), &changes, &table(), output.path())?;

    assert_eq!(report.rewritten, vec!["com.lib.a.Screen"]);
    assert!(!report.full_rebuild);
    assert_eq!(fs::read(class_file(output.path(), "com/lib/b/Icon"))?, b"marker");
    assert!(load(output.path(), "com/lib/a/Screen")?
        .class_references()?
        .contains("com/app/R$string"));
    Ok(())
}

#[test]
fn vanished_change_is_skipped() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    populate(input.path())?;

    let changes: ChangeSet = [
        ("com/lib/a/Screen.class", FileStatus::Changed),
        ("com/lib/a/Vanished.class", FileStatus::Added),
    ]
    .into_iter()
    .collect();
    let report = Rewriter::default().apply(input.path(), &changes, &table(), output.path())?;

    assert_eq!(report.rewritten, vec!["com.lib.a.Screen"]);
    assert!(!class_file(output.path(), "com/lib/a/Vanished").exists());
    Ok(())
}

#[test]
fn output_root_equal_to_input_root_is_rejected() -> Result<()> {
    let input = tempfile::tempdir()?;
    populate(input.path())?;

    let result = Rewriter::default().apply(input.path(), &ChangeSet::new(), &table(), input.path());

    assert!(matches!(result, Err(Error::Configuration(_))));
    assert!(class_file(input.path(), "com/app/Main").exists());
    Ok(())
}

#[test]
fn corrupt_class_aborts_the_pass() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    populate(input.path())?;
    fs::write(class_file(input.path(), "com/lib/b/Icon"), b"\xCA\xFE\xBA\xBE")?;

    let error = Rewriter::default()
        .apply(input.path(), &ChangeSet::new(), &table(), output.path())
        .unwrap_err();

    match error {
        Error::ClassLoad { path, source } => {
            assert_eq!(path, class_file(input.path(), "com/lib/b/Icon"));
            assert!(matches!(*source, Error::OutOfBounds { .. }));
        }
        other => panic!("Expected ClassLoad, got {other:?}"),
    }
    Ok(())
}

#[test]
fn misplaced_class_is_rejected() -> Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    let misplaced = class_file(input.path(), "com/lib/a/Moved");
    fs::create_dir_all(misplaced.parent().unwrap())?;
    fs::write(&misplaced, common::screen_class()?.to_bytes()?)?;

    let error = Rewriter::default()
        .apply(input.path(), &ChangeSet::new(), &table(), output.path())
        .unwrap_err();
    assert!(matches!(
        error,
        Error::ClassLoad { ref source, .. } if matches!(**source, Error::NameMismatch { .. })
    ));

    // Without the check the output follows the file location
    Rewriter::new(RewriterConfig::lenient()).apply(
        input.path(),
        &ChangeSet::new(),
        &table(),
        output.path(),
    )?;
    assert!(class_file(output.path(), "com/lib/a/Moved").exists());
    assert!(!class_file(output.path(), "com/lib/a/Screen").exists());
    Ok(())
}

#[test]
fn change_outside_input_root_is_a_configuration_error() -> Result<()> {
    let input = tempfile::tempdir()?;
    let elsewhere = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;

    let changes: ChangeSet = [(elsewhere.path().join("A.class"), FileStatus::Added)]
        .into_iter()
        .collect();
    let result = Rewriter::default().apply(input.path(), &changes, &table(), output.path());
    assert!(matches!(result, Err(Error::Configuration(_))));
    Ok(())
}
