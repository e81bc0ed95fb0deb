//! Constant pool model with lossless read and write.
//!
//! Entries are kept in their original slots. Rewriters only append new
//! entries and repoint indices, so bytecode that references the pool by
//! index stays valid.

use super::reader::ByteReader;
use super::ClassFormatError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    /// Modified UTF-8 bytes, kept raw.
    Utf8(Vec<u8>),
    Integer(u32),
    Float(u32),
    Long(u64),
    Double(u64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    FieldRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    MethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    MethodHandle {
        reference_kind: u8,
        reference_index: u16,
    },
    MethodType {
        descriptor_index: u16,
    },
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    Module {
        name_index: u16,
    },
    Package {
        name_index: u16,
    },
    /// Slot 0 and the slot following a long or double.
    Unusable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self {
            entries: vec![Constant::Unusable],
        }
    }
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut ByteReader<'_>) -> Result<Self, ClassFormatError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable);

        while entries.len() < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    Constant::Utf8(reader.read_slice(length)?.to_vec())
                }
                3 => Constant::Integer(reader.read_u4()?),
                4 => Constant::Float(reader.read_u4()?),
                5 => Constant::Long(reader.read_u8()?),
                6 => Constant::Double(reader.read_u8()?),
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                8 => Constant::String {
                    string_index: reader.read_u2()?,
                },
                9 => Constant::FieldRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                10 => Constant::MethodRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                11 => Constant::InterfaceMethodRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                12 => Constant::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                15 => Constant::MethodHandle {
                    reference_kind: reader.read_u1()?,
                    reference_index: reader.read_u2()?,
                },
                16 => Constant::MethodType {
                    descriptor_index: reader.read_u2()?,
                },
                17 => Constant::Dynamic {
                    bootstrap_method_attr_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                18 => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                19 => Constant::Module {
                    name_index: reader.read_u2()?,
                },
                20 => Constant::Package {
                    name_index: reader.read_u2()?,
                },
                other => return Err(ClassFormatError::UnsupportedConstant { tag: other }),
            };

            let wide = matches!(entry, Constant::Long(_) | Constant::Double(_));
            entries.push(entry);
            if wide {
                entries.push(Constant::Unusable);
            }
        }

        Ok(Self { entries })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.entries.len() as u16).to_be_bytes());

        for entry in &self.entries {
            match entry {
                Constant::Unusable => {}
                Constant::Utf8(bytes) => {
                    out.push(1);
                    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
                    out.extend_from_slice(bytes);
                }
                Constant::Integer(v) => push_u1_u4(out, 3, *v),
                Constant::Float(v) => push_u1_u4(out, 4, *v),
                Constant::Long(v) => {
                    out.push(5);
                    out.extend_from_slice(&v.to_be_bytes());
                }
                Constant::Double(v) => {
                    out.push(6);
                    out.extend_from_slice(&v.to_be_bytes());
                }
                Constant::Class { name_index } => push_u1_u2(out, 7, *name_index),
                Constant::String { string_index } => push_u1_u2(out, 8, *string_index),
                Constant::FieldRef {
                    class_index,
                    name_and_type_index,
                } => push_u1_u2_u2(out, 9, *class_index, *name_and_type_index),
                Constant::MethodRef {
                    class_index,
                    name_and_type_index,
                } => push_u1_u2_u2(out, 10, *class_index, *name_and_type_index),
                Constant::InterfaceMethodRef {
                    class_index,
                    name_and_type_index,
                } => push_u1_u2_u2(out, 11, *class_index, *name_and_type_index),
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => push_u1_u2_u2(out, 12, *name_index, *descriptor_index),
                Constant::MethodHandle {
                    reference_kind,
                    reference_index,
                } => {
                    out.push(15);
                    out.push(*reference_kind);
                    out.extend_from_slice(&reference_index.to_be_bytes());
                }
                Constant::MethodType { descriptor_index } => {
                    push_u1_u2(out, 16, *descriptor_index)
                }
                Constant::Dynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => push_u1_u2_u2(out, 17, *bootstrap_method_attr_index, *name_and_type_index),
                Constant::InvokeDynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => push_u1_u2_u2(out, 18, *bootstrap_method_attr_index, *name_and_type_index),
                Constant::Module { name_index } => push_u1_u2(out, 19, *name_index),
                Constant::Package { name_index } => push_u1_u2(out, 20, *name_index),
            }
        }
    }

    /// Number of slots, including slot 0.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn get(&self, index: u16) -> Result<&Constant, ClassFormatError> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => {
                Err(ClassFormatError::InvalidConstantIndex { index })
            }
            Some(entry) => Ok(entry),
        }
    }

    pub(crate) fn get_mut(&mut self, index: u16) -> Result<&mut Constant, ClassFormatError> {
        self.entries
            .get_mut(index as usize)
            .ok_or(ClassFormatError::InvalidConstantIndex { index })
    }

    pub fn utf8(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.get(index)? {
            Constant::Utf8(bytes) => {
                std::str::from_utf8(bytes).map_err(|_| ClassFormatError::Utf8 { index })
            }
            _ => Err(ClassFormatError::InvalidConstantIndex { index }),
        }
    }

    pub fn class_name(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassFormatError::InvalidConstantIndex { index }),
        }
    }

    /// `(name, descriptor)` of a `NameAndType` entry.
    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str), ClassFormatError> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => Err(ClassFormatError::InvalidConstantIndex { index }),
        }
    }

    /// Append an entry and return its index.
    pub fn push(&mut self, entry: Constant) -> Result<u16, ClassFormatError> {
        let wide = matches!(entry, Constant::Long(_) | Constant::Double(_));
        let needed = if wide { 2 } else { 1 };
        if self.entries.len() + needed > u16::MAX as usize {
            return Err(ClassFormatError::PoolOverflow);
        }

        let index = self.entries.len() as u16;
        self.entries.push(entry);
        if wide {
            self.entries.push(Constant::Unusable);
        }
        Ok(index)
    }

    /// Index of an existing UTF-8 entry equal to `value`, appending one if absent.
    pub fn find_or_push_utf8(&mut self, value: &str) -> Result<u16, ClassFormatError> {
        let bytes = value.as_bytes();
        let existing = self
            .entries
            .iter()
            .position(|entry| matches!(entry, Constant::Utf8(b) if b == bytes));
        match existing {
            Some(index) => Ok(index as u16),
            None => self.push(Constant::Utf8(bytes.to_vec())),
        }
    }

    pub fn find_or_push_class(&mut self, name: &str) -> Result<u16, ClassFormatError> {
        let name_index = self.find_or_push_utf8(name)?;
        let existing = self
            .entries
            .iter()
            .position(|entry| *entry == Constant::Class { name_index });
        match existing {
            Some(index) => Ok(index as u16),
            None => self.push(Constant::Class { name_index }),
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !matches!(entry, Constant::Unusable))
            .map(|(i, entry)| (i as u16, entry))
    }
}

/// Treat constants that are not plain UTF-8 as absent.
///
/// Modified UTF-8 (an encoded NUL or surrogate pairs) never names a mapped
/// symbol, so such constants are left exactly as they are.
pub(crate) fn plain<T>(
    result: std::result::Result<T, ClassFormatError>,
) -> std::result::Result<Option<T>, ClassFormatError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ClassFormatError::Utf8 { .. }) => Ok(None),
        Err(other) => Err(other),
    }
}

fn push_u1_u2(out: &mut Vec<u8>, tag: u8, a: u16) {
    out.push(tag);
    out.extend_from_slice(&a.to_be_bytes());
}

fn push_u1_u4(out: &mut Vec<u8>, tag: u8, a: u32) {
    out.push(tag);
    out.extend_from_slice(&a.to_be_bytes());
}

fn push_u1_u2_u2(out: &mut Vec<u8>, tag: u8, a: u16, b: u16) {
    out.push(tag);
    out.extend_from_slice(&a.to_be_bytes());
    out.extend_from_slice(&b.to_be_bytes());
}
