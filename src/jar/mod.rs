//! Archive-as-filesystem helpers.
//!
//! A [`Jar`] is read fully into memory, edited as a sorted map of entry
//! names to bytes, and written back in one pass. No zip handle outlives the
//! call that opened it. Every archive written here uses sorted entry order
//! and a fixed timestamp so identical contents give identical bytes.

use crate::errors::{IoResultExt, PipelineError, Result};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

#[derive(Debug, Clone)]
pub struct Jar {
    path: PathBuf,
    entries: BTreeMap<String, Vec<u8>>,
}

impl Jar {
    /// An empty archive that will be written to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).at_path(path)?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| PipelineError::archive(path, e))?;

        let mut entries = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| PipelineError::archive(path, e))?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes).at_path(path)?;
            entries.insert(name, bytes);
        }

        log::trace!("Read {} entries from {}", entries.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert or overwrite an entry.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Option<Vec<u8>> {
        self.entries.insert(name.into(), bytes)
    }

    /// Insert only when no entry of that name exists. Returns whether it was added.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> bool {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return false;
        }
        self.entries.insert(name, bytes);
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.entries.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
    }

    pub fn into_entries(self) -> BTreeMap<String, Vec<u8>> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write(&self) -> Result<()> {
        self.write_to(&self.path)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).at_path(parent)?;
        }

        let file = File::create(path).at_path(path)?;
        let mut writer = ZipWriter::new(BufWriter::new(file));
        write_entries(&mut writer, path, self.entries())?;
        let mut inner = writer.finish().map_err(|e| PipelineError::archive(path, e))?;
        inner.flush().at_path(path)?;
        Ok(())
    }
}

/// Append entries to an existing archive without rewriting its current ones.
pub fn append_entries<'a, I>(path: &Path, entries: I) -> Result<usize>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .at_path(path)?;
    let mut writer = ZipWriter::new_append(file).map_err(|e| PipelineError::archive(path, e))?;
    let count = write_entries(&mut writer, path, entries)?;
    writer.finish().map_err(|e| PipelineError::archive(path, e))?;
    Ok(count)
}

fn entry_options() -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644)
}

fn write_entries<'a, W, I>(writer: &mut ZipWriter<W>, path: &Path, entries: I) -> Result<usize>
where
    W: Write + std::io::Seek,
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut count = 0;
    for (name, bytes) in entries {
        writer
            .start_file(name, entry_options())
            .map_err(|e| PipelineError::archive(path, e))?;
        writer.write_all(bytes).at_path(path)?;
        count += 1;
    }
    Ok(count)
}
