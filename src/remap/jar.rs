use super::NamespaceRemapper;
use crate::bytecode::{is_class_entry, remap_class};
use crate::errors::Result;
use crate::jar::Jar;
use rayon::prelude::*;
use std::path::Path;

const VERSIONS_DIR: &str = "META-INF/versions/";

/// Remap every class in `input` into a new archive addressed at `output`.
///
/// Class entries are renamed after the class they now declare, keeping any
/// multi-release `META-INF/versions/<N>/` directory. Everything else is
/// copied unchanged. The returned archive has not been written.
pub fn remap_jar(input: &Jar, remapper: &NamespaceRemapper, output: &Path) -> Result<Jar> {
    let entries: Vec<(&str, &[u8])> = input.entries().collect();

    let remapped: Vec<(String, Vec<u8>)> = entries
        .into_par_iter()
        .map(|(name, bytes)| {
            if is_class_entry(name) {
                let class = remap_class(bytes, name, remapper)?;
                Ok((
                    format!("{}{}.class", release_prefix(name), class.name),
                    class.bytes,
                ))
            } else {
                Ok((name.to_string(), bytes.to_vec()))
            }
        })
        .collect::<Result<_>>()?;

    let mut jar = Jar::new(output);
    let mut renamed = 0usize;
    for (name, bytes) in remapped {
        if jar.contains(&name) {
            log::warn!("Remapped entry {} collides with an existing entry", name);
        }
        if !input.contains(&name) {
            renamed += 1;
        }
        jar.insert(name, bytes);
    }

    log::debug!(
        "Remapped {} entries ({} renamed) {} -> {}",
        jar.len(),
        renamed,
        remapper.from_namespace(),
        remapper.to_namespace()
    );
    Ok(jar)
}

/// The `META-INF/versions/<N>/` part of a multi-release entry, or `""`.
fn release_prefix(entry: &str) -> &str {
    let Some(rest) = entry.strip_prefix(VERSIONS_DIR) else {
        return "";
    };
    match rest.split_once('/') {
        Some((release, _)) if !release.is_empty() && release.bytes().all(|b| b.is_ascii_digit()) => {
            &entry[..VERSIONS_DIR.len() + release.len() + 1]
        }
        _ => "",
    }
}
