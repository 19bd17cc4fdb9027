//! Class trees shared by the integration tests.
#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use rembed::{
    classfile::{ClassFile, MemberAccessFlags},
    Result,
};

/// Library class using string and layout resources of `com.lib.a`, and one unrelated accessor.
pub fn screen_class() -> Result<ClassFile> {
    let mut class = ClassFile::new("com/lib/a/Screen", Some("java/lang/Object"))?;
    class
        .constant_pool
        .add_field_ref("com/lib/a/R$string", "title", "I")?;
    class
        .constant_pool
        .add_field_ref("com/other/R$string", "cancel", "I")?;
    class
        .constant_pool
        .add_method_ref("com/lib/a/R$layout", "<init>", "()V")?;
    class.add_field(MemberAccessFlags::PRIVATE, "layout", "Lcom/lib/a/R$layout;")?;
    Ok(class)
}

/// Library class using drawable resources of `com.lib.b`.
pub fn icon_class() -> Result<ClassFile> {
    let mut class = ClassFile::new("com/lib/b/Icon", Some("java/lang/Object"))?;
    class
        .constant_pool
        .add_field_ref("com/lib/b/R$drawable", "ic_launcher", "I")?;
    class.add_method(
        MemberAccessFlags::PUBLIC | MemberAccessFlags::STATIC,
        "resolve",
        "([Lcom/lib/b/R$drawable;)Lcom/lib/b/R$drawable;",
    )?;
    Ok(class)
}

/// Consumer class that only uses its own accessor classes.
pub fn main_class() -> Result<ClassFile> {
    let mut class = ClassFile::new("com/app/Main", Some("java/lang/Object"))?;
    class
        .constant_pool
        .add_field_ref("com/app/R$string", "app_name", "I")?;
    class.constant_pool.add_string("com/lib/a/R$string")?;
    Ok(class)
}

/// Writes the three sample classes and a non-class file below `root`.
pub fn populate(root: &Path) -> Result<()> {
    screen_class()?.write_to_file(root)?;
    icon_class()?.write_to_file(root)?;
    main_class()?.write_to_file(root)?;

    let module = root.join("META-INF").join("lib.kotlin_module");
    fs::create_dir_all(module.parent().unwrap())?;
    fs::write(module, b"\x00\x00\x00\x03")?;
    Ok(())
}

/// Location of the class with internal name `name` below `root`.
pub fn class_file(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.class"))
}

/// Loads the class with internal name `name` from below `root`.
pub fn load(root: &Path, name: &str) -> Result<ClassFile> {
    ClassFile::from_file(class_file(root, name))
}
