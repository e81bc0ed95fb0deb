//! Tiny v2 mapping reader.
//!
//! ```text
//! tiny	2	0	official	intermediate	named
//! c	a	class_1	com/example/Alpha
//! 	f	I	b	field_1	count
//! 	m	(La;)V	a	method_1	run
//! 		p	1		target
//! ```
//!
//! Member descriptors are given in the first namespace. Empty name columns
//! fall back to the first namespace's name. Comments, parameters and locals
//! are skipped.

use super::{ClassEntity, MappingTree, MemberEntity};
use crate::errors::{PipelineError, Result};

pub fn read_tiny_v2(text: &str) -> Result<MappingTree> {
    let mut lines = text.lines().enumerate();

    let (_, header) = lines.next().ok_or_else(|| mapping_error(1, "empty mapping file"))?;
    let header: Vec<&str> = header.split('\t').collect();
    if header.len() < 5 || header[0] != "tiny" || header[1] != "2" {
        return Err(mapping_error(1, "expected a 'tiny\\t2\\t<minor>' header"));
    }
    let namespaces: Vec<String> = header[3..].iter().map(|s| s.to_string()).collect();
    let width = namespaces.len();

    let mut tree = MappingTree::new(namespaces);
    let mut escaped_names = false;
    let mut current: Option<ClassEntity> = None;

    for (idx, raw) in lines {
        let line_no = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }

        let depth = raw.chars().take_while(|c| *c == '\t').count();
        let parts: Vec<&str> = raw[depth..].split('\t').collect();

        match (depth, parts[0]) {
            (0, "c") => {
                if let Some(class) = current.take() {
                    tree.add_class(class);
                }
                let names = fill_names(&parts[1..], width, escaped_names, line_no)?;
                current = Some(ClassEntity::new(names));
            }
            (0, other) => {
                return Err(mapping_error(
                    line_no,
                    &format!("unexpected top-level entry '{}'", other),
                ));
            }
            // Properties between the header and the first class.
            (1, property) if current.is_none() => {
                if property == "escaped-names" {
                    escaped_names = true;
                }
            }
            (1, kind @ ("f" | "m")) => {
                let class = current
                    .as_mut()
                    .ok_or_else(|| mapping_error(line_no, "member outside of a class"))?;
                let descriptor = parts
                    .get(1)
                    .filter(|d| !d.is_empty())
                    .ok_or_else(|| mapping_error(line_no, "member without a descriptor"))?;
                let names = fill_names(&parts[2..], width, escaped_names, line_no)?;
                let member = MemberEntity::new(names, *descriptor);
                if kind == "f" {
                    class.push_field(member);
                } else {
                    class.push_method(member);
                }
            }
            _ => {}
        }
    }

    if let Some(class) = current.take() {
        tree.add_class(class);
    }

    Ok(tree)
}

fn fill_names(
    columns: &[&str],
    width: usize,
    escaped: bool,
    line: usize,
) -> Result<Vec<String>> {
    let first = columns
        .first()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| mapping_error(line, "missing name in first namespace"))?;
    let first = unescape(first, escaped);

    Ok((0..width)
        .map(|i| match columns.get(i) {
            Some(name) if !name.is_empty() => unescape(name, escaped),
            _ => first.clone(),
        })
        .collect())
}

fn unescape(value: &str, escaped: bool) -> String {
    if !escaped || !value.contains('\\') {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn mapping_error(line: usize, message: &str) -> PipelineError {
    PipelineError::Mapping {
        line,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const SAMPLE: &str = indoc! {"
        tiny\t2\t0\tofficial\tintermediate\tnamed
        c\ta\tclass_1\tcom/example/Alpha
        \tc\tA class comment
        \tf\tI\tb\tfield_1\tcount
        \tm\t(La;)V\ta\tmethod_1\trun
        \t\tp\t1\t\ttarget
        c\tb\tclass_2\t
        \tm\t()V\tc\tmethod_2\t
    "};

    #[test]
    fn test_reads_classes_and_members() {
        let tree = read_tiny_v2(SAMPLE).unwrap();
        assert_eq!(tree.namespaces(), ["official", "intermediate", "named"]);
        assert_eq!(tree.classes().len(), 2);

        let alpha = &tree.classes()[0];
        assert_eq!(alpha.name(2), "com/example/Alpha");
        assert_eq!(alpha.fields().len(), 1);
        assert_eq!(alpha.fields()[0].name(2), "count");
        assert_eq!(alpha.methods()[0].source_descriptor(), "(La;)V");
        assert_eq!(alpha.methods()[0].name(1), "method_1");
    }

    #[test]
    fn test_empty_columns_fall_back_to_first_namespace() {
        let tree = read_tiny_v2(SAMPLE).unwrap();
        let beta = &tree.classes()[1];
        assert_eq!(beta.name(2), "b");
        assert_eq!(beta.methods()[0].name(2), "c");
        assert_eq!(beta.methods()[0].name(1), "method_2");
    }

    #[test]
    fn test_rejects_bad_header() {
        let err = read_tiny_v2("v1\tofficial\tnamed\n").unwrap_err();
        assert!(matches!(err, PipelineError::Mapping { line: 1, .. }));
    }

    #[test]
    fn test_member_outside_class() {
        let text = "tiny\t2\t0\tofficial\tnamed\nc\ta\tA\n\tq\tI\tx\ty\n";
        // Unknown member kinds are skipped rather than rejected.
        assert!(read_tiny_v2(text).is_ok());

        let text = "tiny\t2\t0\tofficial\tnamed\nx\ta\n";
        let err = read_tiny_v2(text).unwrap_err();
        assert!(matches!(err, PipelineError::Mapping { line: 2, .. }));
    }

    #[test]
    fn test_escaped_names() {
        let text = "tiny\t2\t0\tofficial\tnamed\n\tescaped-names\nc\ta\tweird\\tname\n";
        let tree = read_tiny_v2(text).unwrap();
        assert_eq!(tree.classes()[0].name(1), "weird\tname");
    }
}
