//! Class file fixtures shared by the unit tests.

use crate::classfile::{Attribute, ClassFile, MemberAccessFlags};

// Helper function to create a raw attribute
pub fn attribute(name_index: u16, info: &[u8]) -> Attribute {
    Attribute {
        name_index,
        info: info.to_vec(),
    }
}

// Helper function to create a Code attribute without exception handlers
pub fn code_attribute(name_index: u16, code: &[u8], nested: &[Attribute]) -> Attribute {
    let mut info = Vec::new();
    info.extend_from_slice(&1u16.to_be_bytes());
    info.extend_from_slice(&1u16.to_be_bytes());
    info.extend_from_slice(&(code.len() as u32).to_be_bytes());
    info.extend_from_slice(code);
    info.extend_from_slice(&0u16.to_be_bytes());
    info.extend_from_slice(&(nested.len() as u16).to_be_bytes());
    for attribute in nested {
        info.extend_from_slice(&attribute.name_index.to_be_bytes());
        info.extend_from_slice(&(attribute.info.len() as u32).to_be_bytes());
        info.extend_from_slice(&attribute.info);
    }
    attribute(name_index, &info)
}

// Helper function to create the content of a single-entry LocalVariableTable
pub fn local_variable(name_index: u16, descriptor_index: u16) -> Vec<u8> {
    let mut info = Vec::new();
    info.extend_from_slice(&1u16.to_be_bytes());
    info.extend_from_slice(&0u16.to_be_bytes());
    info.extend_from_slice(&1u16.to_be_bytes());
    info.extend_from_slice(&name_index.to_be_bytes());
    info.extend_from_slice(&descriptor_index.to_be_bytes());
    info.extend_from_slice(&0u16.to_be_bytes());
    info
}

/// A library class referencing accessor classes from every kind of symbol site.
///
/// - `com/lib/a/R$string` as a Fieldref owner, plus the same text as a string literal
/// - `com/lib/b/R$drawable` as an array Class entry
/// - `com/other/R$string` as a Fieldref owner
/// - `com/lib/a/R$layout` as a field descriptor, `com/lib/a/R$id` in its Signature
/// - `com/lib/a/R$drawable` in a LocalVariableTable inside `run()`
/// - `com/lib/a/R$color` as an annotation class literal
pub fn sample_class() -> ClassFile {
    let mut class = ClassFile::new("com/lib/a/Greeter", Some("java/lang/Object")).unwrap();
    class.add_interface("java/lang/Runnable").unwrap();

    let pool = &mut class.constant_pool;
    pool.add_field_ref("com/lib/a/R$string", "app_name", "I")
        .unwrap();
    pool.add_field_ref("com/other/R$string", "ok", "I").unwrap();
    pool.add_class("[Lcom/lib/b/R$drawable;").unwrap();
    pool.add_string("com/lib/a/R$string").unwrap();

    let signature = class
        .constant_pool
        .add_utf8("Ljava/util/List<Lcom/lib/a/R$id;>;")
        .unwrap();
    let signature = class
        .new_attribute("Signature", signature.to_be_bytes().to_vec())
        .unwrap();
    class
        .add_field(
            MemberAccessFlags::PRIVATE,
            "layouts",
            "Lcom/lib/a/R$layout;",
        )
        .unwrap()
        .attributes
        .push(signature);

    let local_name = class.constant_pool.add_utf8("icon").unwrap();
    let local_descriptor = class
        .constant_pool
        .add_utf8("Lcom/lib/a/R$drawable;")
        .unwrap();
    let lvt = class
        .new_attribute(
            "LocalVariableTable",
            local_variable(local_name, local_descriptor),
        )
        .unwrap();
    let code_name = class.constant_pool.add_utf8("Code").unwrap();
    let code = code_attribute(code_name, &[0xB1], &[lvt]);
    class
        .add_method(MemberAccessFlags::PUBLIC, "run", "()V")
        .unwrap()
        .attributes
        .push(code);

    let annotation_type = class.constant_pool.add_utf8("Lcom/app/Bind;").unwrap();
    let element_name = class.constant_pool.add_utf8("value").unwrap();
    let class_literal = class.constant_pool.add_utf8("Lcom/lib/a/R$color;").unwrap();
    let mut annotations = Vec::new();
    annotations.extend_from_slice(&1u16.to_be_bytes());
    annotations.extend_from_slice(&annotation_type.to_be_bytes());
    annotations.extend_from_slice(&1u16.to_be_bytes());
    annotations.extend_from_slice(&element_name.to_be_bytes());
    annotations.push(b'c');
    annotations.extend_from_slice(&class_literal.to_be_bytes());
    class
        .add_attribute("RuntimeVisibleAnnotations", annotations)
        .unwrap();

    class
}
