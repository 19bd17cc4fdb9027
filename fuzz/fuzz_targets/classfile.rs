#![no_main]

use libfuzzer_sys::fuzz_target;
use rembed::{rename::rewrite_bytes, ClassFile, RenameTable};

fuzz_target!(|data: &[u8]| {
    if let Ok(class) = ClassFile::parse(data) {
        let _ = class.class_references();
        let table = RenameTable::build(["com.lib.a"], "com.app");
        let _ = rewrite_bytes(data, &table);
    }
});
