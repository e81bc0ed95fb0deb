use super::{AccessTransformer, ToolContext};
use crate::access::{transform_class, AccessRuleSet};
use crate::bytecode::is_class_entry;
use crate::errors::{IoResultExt, Result};
use crate::jar::Jar;
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// In-process access transformer over [`AccessRuleSet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinAccessTransformer;

impl AccessTransformer for BuiltinAccessTransformer {
    fn name(&self) -> &str {
        "builtin"
    }

    fn transform(&self, input: &Path, rules: &Path, output: &Path, _ctx: ToolContext) -> Result<()> {
        let text = fs::read_to_string(rules).at_path(rules)?;
        let rules = AccessRuleSet::parse(&text)?;
        let jar = Jar::open(input)?;

        let rewritten: Vec<(String, Vec<u8>)> = jar
            .entries()
            .collect::<Vec<_>>()
            .into_par_iter()
            .filter(|(name, _)| is_class_entry(name))
            .map(|(name, bytes)| {
                transform_class(bytes, name, &rules).map(|out| out.map(|b| (name.to_string(), b)))
            })
            .filter_map(|result| result.transpose())
            .collect::<Result<_>>()?;

        log::debug!(
            "Access transformer changed {} of {} entries",
            rewritten.len(),
            jar.len()
        );

        let mut out = jar;
        for (name, bytes) in rewritten {
            out.insert(name, bytes);
        }
        out.write_to(output)
    }
}
