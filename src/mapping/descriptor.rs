//! Rewriting class references inside JVM descriptors.
//!
//! Only `L<internal-name>;` spans are touched; primitive tags, array
//! brackets and method punctuation are copied through. A malformed reference
//! (no terminating `;`) leaves the descriptor unchanged.

/// Rewrite every class reference in a field or method descriptor.
///
/// `map` returns the replacement for a class name, or `None` to keep it.
pub fn remap_descriptor<F>(descriptor: &str, mut map: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(descriptor.len());
    let mut rest = descriptor;

    while let Some(start) = rest.find('L') {
        let Some(len) = rest[start..].find(';') else {
            return descriptor.to_string();
        };
        let class = &rest[start + 1..start + len];
        out.push_str(&rest[..=start]);
        match map(class) {
            Some(mapped) => out.push_str(&mapped),
            None => out.push_str(class),
        }
        out.push(';');
        rest = &rest[start + len + 1..];
    }

    out.push_str(rest);
    out
}

/// Rewrite a `CONSTANT_Class` name, which is either an internal class name
/// or, for arrays, a field descriptor.
pub fn remap_type_name<F>(name: &str, mut map: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    if name.starts_with('[') {
        remap_descriptor(name, map)
    } else {
        map(name).unwrap_or_else(|| name.to_string())
    }
}
