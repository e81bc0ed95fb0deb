//! Symbol renaming over a parsed class.
//!
//! Every rename is planned against the original pool first, then applied by
//! appending fresh `Utf8`/`NameAndType` entries and repointing the entries
//! that used the old ones. Existing slots are never renumbered or edited in
//! place, since a `Utf8` may be shared by unrelated constants.

use super::class::{BootstrapMethod, ClassFile};
use super::pool::{plain, Constant, ConstantPool};
use super::ClassFormatError;
use crate::errors::{PipelineError, Result};
use crate::remap::NamespaceRemapper;
use std::collections::HashMap;

const LAMBDA_METAFACTORY: &str = "java/lang/invoke/LambdaMetafactory";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemappedClass {
    /// Internal name in the target namespace.
    pub name: String,
    pub bytes: Vec<u8>,
}

enum Edit {
    ClassName {
        index: u16,
        name: String,
    },
    MemberRef {
        index: u16,
        name: String,
        descriptor: String,
    },
    MethodType {
        index: u16,
        descriptor: String,
    },
    Dynamic {
        index: u16,
        name: String,
        descriptor: String,
    },
}

/// Rename every class and member reference in `bytes` to the remapper's
/// target namespace.
pub fn remap_class(bytes: &[u8], entry: &str, remapper: &NamespaceRemapper) -> Result<RemappedClass> {
    let format_err = |e: ClassFormatError| PipelineError::class_format(entry, e.to_string());

    let mut class = ClassFile::parse(bytes).map_err(format_err)?;
    let owner = class.name().map_err(format_err)?.to_string();
    let mapped_name = remapper.map_class_name(&owner);

    let bootstraps = class.bootstrap_methods().map_err(format_err)?;
    let edits =
        plan_pool_edits(&class.pool, &bootstraps, remapper).map_err(|e| in_entry(entry, e))?;
    let member_edits = plan_member_edits(&class, &owner, remapper).map_err(|e| in_entry(entry, e))?;

    let mut appender = PoolAppender::new(&class.pool);
    for edit in edits {
        apply_edit(&mut class.pool, &mut appender, edit).map_err(format_err)?;
    }

    for (is_method, position, name, descriptor) in member_edits {
        let name_index = appender.utf8(&mut class.pool, &name).map_err(format_err)?;
        let descriptor_index = appender.utf8(&mut class.pool, &descriptor).map_err(format_err)?;
        let member = if is_method {
            &mut class.methods[position]
        } else {
            &mut class.fields[position]
        };
        member.name_index = name_index;
        member.descriptor_index = descriptor_index;
    }

    Ok(RemappedClass {
        name: mapped_name,
        bytes: class.to_bytes(),
    })
}

fn in_entry(entry: &str, err: PipelineError) -> PipelineError {
    match err {
        PipelineError::ClassFormat { message, .. } => PipelineError::class_format(entry, message),
        other => other,
    }
}

fn plan_pool_edits(
    pool: &ConstantPool,
    bootstraps: &[BootstrapMethod],
    remapper: &NamespaceRemapper,
) -> Result<Vec<Edit>> {
    let format_err = |e: ClassFormatError| PipelineError::class_format("", e.to_string());
    let mut edits = Vec::new();

    for (index, constant) in pool.iter() {
        match constant {
            Constant::Class { name_index } => {
                let Some(name) = plain(pool.utf8(*name_index)).map_err(format_err)? else {
                    continue;
                };
                let mapped = remapper.map_type_name(name);
                if mapped != name {
                    edits.push(Edit::ClassName { index, name: mapped });
                }
            }
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            }
            | Constant::MethodRef {
                class_index,
                name_and_type_index,
            }
            | Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => {
                let Some(owner) = plain(pool.class_name(*class_index)).map_err(format_err)? else {
                    continue;
                };
                let Some((name, descriptor)) =
                    plain(pool.name_and_type(*name_and_type_index)).map_err(format_err)?
                else {
                    continue;
                };
                let is_field = matches!(constant, Constant::FieldRef { .. });

                let mapped_name = if owner.starts_with('[') || is_special_method(name) {
                    name.to_string()
                } else if is_field {
                    remapper.resolve_field_name(Some(owner), name, descriptor)?
                } else {
                    remapper.resolve_method_name(Some(owner), name, Some(descriptor))?
                };
                let mapped_desc = remapper.map_descriptor(descriptor);

                if mapped_name != name || mapped_desc != descriptor {
                    edits.push(Edit::MemberRef {
                        index,
                        name: mapped_name,
                        descriptor: mapped_desc,
                    });
                }
            }
            Constant::MethodType { descriptor_index } => {
                let Some(descriptor) = plain(pool.utf8(*descriptor_index)).map_err(format_err)?
                else {
                    continue;
                };
                let mapped = remapper.map_descriptor(descriptor);
                if mapped != descriptor {
                    edits.push(Edit::MethodType {
                        index,
                        descriptor: mapped,
                    });
                }
            }
            Constant::Dynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            }
            | Constant::InvokeDynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => {
                let Some((name, descriptor)) =
                    plain(pool.name_and_type(*name_and_type_index)).map_err(format_err)?
                else {
                    continue;
                };

                let lambda = if matches!(constant, Constant::InvokeDynamic { .. }) {
                    plain(lambda_interface(
                        pool,
                        bootstraps,
                        *bootstrap_method_attr_index,
                        descriptor,
                    ))
                    .map_err(format_err)?
                    .flatten()
                } else {
                    None
                };
                let mapped_name = match lambda {
                    Some((interface, sam_descriptor)) => {
                        remapper.resolve_method_name(Some(interface), name, Some(sam_descriptor))?
                    }
                    None => name.to_string(),
                };
                let mapped_desc = remapper.map_descriptor(descriptor);

                if mapped_name != name || mapped_desc != descriptor {
                    edits.push(Edit::Dynamic {
                        index,
                        name: mapped_name,
                        descriptor: mapped_desc,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(edits)
}

/// Functional interface and erased method descriptor of a lambda call site.
///
/// The interface is the return type of the call site descriptor; the
/// method descriptor is the first static argument of the
/// `LambdaMetafactory` bootstrap.
fn lambda_interface<'a>(
    pool: &'a ConstantPool,
    bootstraps: &[BootstrapMethod],
    bootstrap_index: u16,
    descriptor: &'a str,
) -> std::result::Result<Option<(&'a str, &'a str)>, ClassFormatError> {
    let Some(bootstrap) = bootstraps.get(bootstrap_index as usize) else {
        return Ok(None);
    };
    let Constant::MethodHandle {
        reference_index, ..
    } = pool.get(bootstrap.method_handle)?
    else {
        return Ok(None);
    };
    let (Constant::MethodRef { class_index, .. } | Constant::InterfaceMethodRef { class_index, .. }) =
        pool.get(*reference_index)?
    else {
        return Ok(None);
    };
    if pool.class_name(*class_index)? != LAMBDA_METAFACTORY {
        return Ok(None);
    }

    let Some(interface) = descriptor
        .rsplit_once(')')
        .and_then(|(_, ret)| ret.strip_prefix('L'))
        .and_then(|ret| ret.strip_suffix(';'))
    else {
        return Ok(None);
    };
    let Some(Constant::MethodType { descriptor_index }) = bootstrap
        .arguments
        .first()
        .map(|arg| pool.get(*arg))
        .transpose()?
    else {
        return Ok(None);
    };
    Ok(Some((interface, pool.utf8(*descriptor_index)?)))
}

type MemberEdit = (bool, usize, String, String);

fn plan_member_edits(
    class: &ClassFile,
    owner: &str,
    remapper: &NamespaceRemapper,
) -> Result<Vec<MemberEdit>> {
    let format_err = |e: ClassFormatError| PipelineError::class_format("", e.to_string());
    let mut edits = Vec::new();

    for (position, field) in class.fields.iter().enumerate() {
        let (Some(name), Some(descriptor)) = (
            plain(class.pool.utf8(field.name_index)).map_err(format_err)?,
            plain(class.pool.utf8(field.descriptor_index)).map_err(format_err)?,
        ) else {
            continue;
        };
        let mapped_name = remapper.resolve_field_name(Some(owner), name, descriptor)?;
        let mapped_desc = remapper.map_descriptor(descriptor);
        if mapped_name != name || mapped_desc != descriptor {
            edits.push((false, position, mapped_name, mapped_desc));
        }
    }

    for (position, method) in class.methods.iter().enumerate() {
        let (Some(name), Some(descriptor)) = (
            plain(class.pool.utf8(method.name_index)).map_err(format_err)?,
            plain(class.pool.utf8(method.descriptor_index)).map_err(format_err)?,
        ) else {
            continue;
        };
        let mapped_name = if is_special_method(name) {
            name.to_string()
        } else {
            remapper.resolve_method_name(Some(owner), name, Some(descriptor))?
        };
        let mapped_desc = remapper.map_descriptor(descriptor);
        if mapped_name != name || mapped_desc != descriptor {
            edits.push((true, position, mapped_name, mapped_desc));
        }
    }

    Ok(edits)
}

fn is_special_method(name: &str) -> bool {
    name == "<init>" || name == "<clinit>"
}

fn apply_edit(
    pool: &mut ConstantPool,
    appender: &mut PoolAppender,
    edit: Edit,
) -> std::result::Result<(), ClassFormatError> {
    match edit {
        Edit::ClassName { index, name } => {
            let new_index = appender.utf8(pool, &name)?;
            if let Constant::Class { name_index } = pool.get_mut(index)? {
                *name_index = new_index;
            }
        }
        Edit::MemberRef {
            index,
            name,
            descriptor,
        } => {
            let nat = appender.name_and_type(pool, &name, &descriptor)?;
            match pool.get_mut(index)? {
                Constant::FieldRef {
                    name_and_type_index,
                    ..
                }
                | Constant::MethodRef {
                    name_and_type_index,
                    ..
                }
                | Constant::InterfaceMethodRef {
                    name_and_type_index,
                    ..
                } => *name_and_type_index = nat,
                _ => {}
            }
        }
        Edit::MethodType { index, descriptor } => {
            let new_index = appender.utf8(pool, &descriptor)?;
            if let Constant::MethodType { descriptor_index } = pool.get_mut(index)? {
                *descriptor_index = new_index;
            }
        }
        Edit::Dynamic {
            index,
            name,
            descriptor,
        } => {
            let nat = appender.name_and_type(pool, &name, &descriptor)?;
            match pool.get_mut(index)? {
                Constant::Dynamic {
                    name_and_type_index,
                    ..
                }
                | Constant::InvokeDynamic {
                    name_and_type_index,
                    ..
                } => *name_and_type_index = nat,
                _ => {}
            }
        }
    }
    Ok(())
}

/// Deduplicating appender for `Utf8` and `NameAndType` entries.
struct PoolAppender {
    utf8: HashMap<Vec<u8>, u16>,
    name_and_type: HashMap<(u16, u16), u16>,
}

impl PoolAppender {
    fn new(pool: &ConstantPool) -> Self {
        let mut utf8 = HashMap::new();
        let mut name_and_type = HashMap::new();
        for (index, constant) in pool.iter() {
            match constant {
                Constant::Utf8(bytes) => {
                    utf8.entry(bytes.clone()).or_insert(index);
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    name_and_type
                        .entry((*name_index, *descriptor_index))
                        .or_insert(index);
                }
                _ => {}
            }
        }
        Self {
            utf8,
            name_and_type,
        }
    }

    fn utf8(&mut self, pool: &mut ConstantPool, value: &str) -> std::result::Result<u16, ClassFormatError> {
        if let Some(index) = self.utf8.get(value.as_bytes()) {
            return Ok(*index);
        }
        let index = pool.push(Constant::Utf8(value.as_bytes().to_vec()))?;
        self.utf8.insert(value.as_bytes().to_vec(), index);
        Ok(index)
    }

    fn name_and_type(
        &mut self,
        pool: &mut ConstantPool,
        name: &str,
        descriptor: &str,
    ) -> std::result::Result<u16, ClassFormatError> {
        let key = (self.utf8(pool, name)?, self.utf8(pool, descriptor)?);
        if let Some(index) = self.name_and_type.get(&key) {
            return Ok(*index);
        }
        let index = pool.push(Constant::NameAndType {
            name_index: key.0,
            descriptor_index: key.1,
        })?;
        self.name_and_type.insert(key, index);
        Ok(index)
    }
}
