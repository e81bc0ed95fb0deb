//! Minimal classfile model for renaming symbols in compiled classes.
//!
//! Only the structures that carry symbolic names are decoded: the constant
//! pool, the class header, and field/method declarations. Attribute bodies
//! (including `Code`) are kept as opaque bytes; they reference the pool by
//! index, which stays valid because the pool is only ever appended to.

pub mod class;
pub mod flags;
pub mod pool;
mod reader;
pub mod rewrite;

pub use class::{Attribute, BootstrapMethod, ClassFile, MemberInfo, BOOTSTRAP_METHODS};
pub use pool::{Constant, ConstantPool};
pub use rewrite::{remap_class, RemappedClass};

use crate::hierarchy::ClassInfo;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassFormatError {
    #[error("not a class file (bad magic)")]
    InvalidMagic,
    #[error("unexpected end of class file")]
    UnexpectedEof,
    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstant { tag: u8 },
    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },
    #[error("constant {index} is not valid UTF-8")]
    Utf8 { index: u16 },
    #[error("constant pool exceeds 65535 entries")]
    PoolOverflow,
    #[error("trailing bytes after class file")]
    TrailingBytes,
}

/// Whether an archive entry name denotes a compiled class.
pub fn is_class_entry(name: &str) -> bool {
    name.ends_with(".class") && !name.ends_with("module-info.class")
}

/// Read only the header of a class: its name, superclass and interfaces.
pub fn read_class_info(bytes: &[u8]) -> Result<ClassInfo, ClassFormatError> {
    let mut reader = reader::ByteReader::new(bytes);
    reader.expect_magic()?;
    let _minor = reader.read_u2()?;
    let _major = reader.read_u2()?;
    let pool = ConstantPool::parse(&mut reader)?;
    let _access = reader.read_u2()?;
    let this_class = reader.read_u2()?;
    let super_class = reader.read_u2()?;

    let mut info = ClassInfo::new(pool.class_name(this_class)?);
    if super_class != 0 {
        info.super_name = Some(pool.class_name(super_class)?.to_string());
    }

    let count = reader.read_u2()?;
    for _ in 0..count {
        let index = reader.read_u2()?;
        info.interfaces.push(pool.class_name(index)?.to_string());
    }

    Ok(info)
}
