use super::AccessRuleSet;
use crate::bytecode::pool::plain;
use crate::bytecode::ClassFile;
use crate::errors::{PipelineError, Result};

/// Rewrite access flags of one class. Returns `None` when nothing changed.
pub fn transform_class(bytes: &[u8], entry: &str, rules: &AccessRuleSet) -> Result<Option<Vec<u8>>> {
    let format_err = |e: crate::bytecode::ClassFormatError| PipelineError::class_format(entry, e.to_string());

    let mut class = ClassFile::parse(bytes).map_err(format_err)?;
    let name = class.name().map_err(format_err)?.to_string();
    if !rules.touches(&name) {
        return Ok(None);
    }

    let mut changed = false;

    if let Some(change) = rules.class_change(&name) {
        let flags = change.apply(class.access_flags);
        changed |= flags != class.access_flags;
        class.access_flags = flags;
    }

    for i in 0..class.fields.len() {
        let Some(field_name) = plain(class.pool.utf8(class.fields[i].name_index)).map_err(format_err)?
        else {
            continue;
        };
        if let Some(change) = rules.field_change(&name, field_name) {
            let field = &mut class.fields[i];
            let flags = change.apply(field.access_flags);
            changed |= flags != field.access_flags;
            field.access_flags = flags;
        }
    }

    for i in 0..class.methods.len() {
        let (Some(method_name), Some(descriptor)) = (
            plain(class.pool.utf8(class.methods[i].name_index)).map_err(format_err)?,
            plain(class.pool.utf8(class.methods[i].descriptor_index)).map_err(format_err)?,
        ) else {
            continue;
        };
        if let Some(change) = rules.method_change(&name, method_name, descriptor) {
            let method = &mut class.methods[i];
            let flags = change.apply(method.access_flags);
            changed |= flags != method.access_flags;
            method.access_flags = flags;
        }
    }

    Ok(changed.then(|| class.to_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::flags::{ACC_FINAL, ACC_PRIVATE, ACC_PUBLIC};
    use crate::testkit::ClassFileBuilder;

    #[test]
    fn test_widens_class_and_members() {
        let bytes = ClassFileBuilder::new("a/B")
            .access(0)
            .field_with_access(ACC_PRIVATE | ACC_FINAL, "x", "I")
            .method_with_access(ACC_PRIVATE, "run", "()V")
            .method_with_access(ACC_PRIVATE, "stop", "()V")
            .build();
        let rules = AccessRuleSet::parse("public a.B\npublic-f a.B x\npublic a.B run()V\n").unwrap();

        let out = transform_class(&bytes, "a/B.class", &rules).unwrap().unwrap();
        let class = ClassFile::parse(&out).unwrap();
        assert_eq!(class.access_flags, ACC_PUBLIC);
        assert_eq!(class.fields[0].access_flags, ACC_PUBLIC);
        assert_eq!(class.methods[0].access_flags, ACC_PUBLIC);
        assert_eq!(class.methods[1].access_flags, ACC_PRIVATE);
    }

    #[test]
    fn test_untouched_class_is_none() {
        let bytes = ClassFileBuilder::new("a/C").build();
        let rules = AccessRuleSet::parse("public a.B\n").unwrap();
        assert!(transform_class(&bytes, "a/C.class", &rules).unwrap().is_none());
    }
}
