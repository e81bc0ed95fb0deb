//! Fallback naming for nested classes the mapping source does not list.

/// Remap `Outer$Inner` by mapping only the portion before the first `$`.
///
/// Returns `None` when the name is not nested, or when the outer class has
/// no mapping. In that case the original combined name stays as it is.
pub fn remap_inner_class<F>(name: &str, map_outer: F) -> Option<String>
where
    F: FnOnce(&str) -> Option<String>,
{
    let (outer, inner) = name.split_once('$')?;
    let mapped = map_outer(outer)?;
    Some(format!("{}${}", mapped, inner))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outer(name: &str) -> Option<String> {
        (name == "a").then(|| "com/example/Alpha".to_string())
    }

    #[test]
    fn test_remaps_outer_portion_only() {
        assert_eq!(
            remap_inner_class("a$1", outer).as_deref(),
            Some("com/example/Alpha$1")
        );
        assert_eq!(
            remap_inner_class("a$b$c", outer).as_deref(),
            Some("com/example/Alpha$b$c")
        );
    }

    #[test]
    fn test_unknown_outer_or_top_level() {
        assert_eq!(remap_inner_class("z$1", outer), None);
        assert_eq!(remap_inner_class("a", outer), None);
    }
}
