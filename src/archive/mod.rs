#[cfg(test)]
mod tests;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use encoding_rs::WINDOWS_1251;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::{HbkError, Result};

/// Entries larger than this are reported in the structure summary.
const LARGE_ENTRY_BYTES: u64 = 10_000;

/// A help archive (`.hbk`), which is a plain zip container holding one HTML
/// page per documentation topic.
pub struct HelpArchive {
    zip: ZipArchive<File>,
    /// Entry names in archive-listing order.
    entries: Vec<String>,
}

/// Coarse structural statistics of an archive, for the `inspect` command.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveStructure {
    pub total_files: usize,
    pub html_files: usize,
    pub st_files: usize,
    /// Extension -> file count.
    pub file_types: IndexMap<String, usize>,
    /// Top-level directory -> file count.
    pub categories: IndexMap<String, usize>,
    /// The ten largest entries above `LARGE_ENTRY_BYTES`, descending.
    pub largest_files: Vec<LargeEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LargeEntry {
    pub name: String,
    pub size: u64,
    pub compressed_size: u64,
}

impl HelpArchive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open archive: {}", path.display()))?;
        let mut zip = ZipArchive::new(file)
            .map_err(|e| HbkError::Archive(format!("'{}' is not a valid archive: {e}", path.display())))?;

        // by_index order is the archive listing order; file_names() makes no
        // ordering promise.
        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let entry = zip
                .by_index(i)
                .map_err(|e| HbkError::Archive(format!("Failed to read entry {i}: {e}")))?;
            entries.push(entry.name().to_string());
        }

        debug!("Opened archive {} with {} entries", path.display(), entries.len());

        Ok(Self { zip, entries })
    }

    /// All entry paths, in archive-listing order.
    pub fn list_entries(&self) -> &[String] {
        &self.entries
    }

    /// The HTML page entries, in archive-listing order.
    pub fn html_entries(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|name| name.ends_with(".html"))
            .cloned()
            .collect()
    }

    /// Read one entry and decode it to text: UTF-8 first, with a lossy
    /// windows-1251 fallback for legacy pages.
    pub fn read_entry_text(&mut self, name: &str) -> Result<String> {
        let mut entry = self
            .zip
            .by_name(name)
            .map_err(|e| HbkError::Archive(format!("Failed to open entry {name}: {e}")))?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read entry {name}"))?;

        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                let bytes = e.into_bytes();
                let (text, _, had_errors) = WINDOWS_1251.decode(&bytes);
                if had_errors {
                    warn!("Lossy decode for entry {}", name);
                }
                Ok(text.into_owned())
            }
        }
    }

    /// Coarse structural statistics: file counts per extension and per
    /// top-level directory, plus the largest entries.
    pub fn analyze_structure(&mut self) -> Result<ArchiveStructure> {
        let mut structure = ArchiveStructure {
            total_files: self.entries.len(),
            html_files: 0,
            st_files: 0,
            file_types: IndexMap::new(),
            categories: IndexMap::new(),
            largest_files: Vec::new(),
        };

        for i in 0..self.zip.len() {
            let entry = self
                .zip
                .by_index(i)
                .map_err(|e| HbkError::Archive(format!("Failed to read entry {i}: {e}")))?;
            let name = entry.name().to_string();

            let ext = Path::new(&name)
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_default();
            *structure.file_types.entry(ext.clone()).or_insert(0) += 1;

            if ext == ".html" {
                structure.html_files += 1;
            } else if ext == ".st" {
                structure.st_files += 1;
            }

            if let Some((top, _)) = name.split_once('/') {
                *structure.categories.entry(top.to_string()).or_insert(0) += 1;
            }

            if entry.size() > LARGE_ENTRY_BYTES {
                structure.largest_files.push(LargeEntry {
                    name,
                    size: entry.size(),
                    compressed_size: entry.compressed_size(),
                });
            }
        }

        structure
            .largest_files
            .sort_by(|a, b| b.size.cmp(&a.size));
        structure.largest_files.truncate(10);

        Ok(structure)
    }
}
