#[cfg(test)]
mod tests;

use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::ExportSettings;
use crate::{HbkError, Result};
use crate::context::ContextItem;

/// One chunk file's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkFile {
    pub items: Vec<ContextItem>,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub category: String,
    /// 1-based position within the category.
    pub chunk: usize,
    pub total_chunks: usize,
    pub items_count: usize,
    pub created_at: String,
}

/// Per-category index listing every chunk file in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryIndex {
    pub category: String,
    pub total_items: usize,
    pub total_chunks: usize,
    pub chunks: Vec<String>,
    pub created_at: String,
}

/// Run-level index aggregating all categories plus the run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainIndex {
    pub total_items: usize,
    pub categories: IndexMap<String, CategorySummary>,
    pub created_at: String,
    pub mode: String,
    pub settings: IndexSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub items_count: usize,
    pub chunks_count: usize,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSettings {
    pub max_file_size_kb: usize,
    pub max_items_per_file: usize,
}

/// Outcome of one split export run. `write_failures` is non-zero when some
/// files could not be written; the rest of the export still completed.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub total_items: usize,
    pub total_files: usize,
    pub write_failures: usize,
    pub per_category: IndexMap<String, (usize, usize)>,
}

/// Group items by category, preserving input order within each group.
pub fn split_by_category(items: &[ContextItem]) -> IndexMap<String, Vec<&ContextItem>> {
    let mut categories: IndexMap<String, Vec<&ContextItem>> = IndexMap::new();
    for item in items {
        categories.entry(item.category.clone()).or_default().push(item);
    }
    categories
}

/// Greedy chunking bounded by item count and serialized-size estimate.
/// A single oversized item still gets its own chunk, never dropped.
pub fn split_into_chunks<'a>(
    items: &[&'a ContextItem],
    settings: &ExportSettings,
) -> Vec<Vec<&'a ContextItem>> {
    let byte_budget = settings.max_file_size_bytes();
    let mut chunks = Vec::new();
    let mut current: Vec<&ContextItem> = Vec::new();
    let mut current_size = 0usize;

    for &item in items {
        let item_size = serde_json::to_string(item).map_or(0, |s| s.len());

        if current.len() >= settings.max_items_per_file
            || current_size + item_size > byte_budget
        {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_size = 0;
            }
        }

        current.push(item);
        current_size += item_size;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn chunk_filename(prefix: &str, category: &str, index: usize) -> String {
    if prefix.is_empty() {
        format!("{}_{:03}.json", category, index + 1)
    } else {
        format!("{}_{}_{:03}.json", prefix, category, index + 1)
    }
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the split export tree: one directory per category holding chunk
/// files and a category index, plus a run-level main index. A failed file
/// write is logged and skipped; the summary carries the failure count.
pub fn export_split(
    items: &[ContextItem],
    out_dir: &Path,
    mode: &str,
    settings: &ExportSettings,
) -> Result<ExportSummary> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let categories = split_by_category(items);
    let mut summary = ExportSummary {
        total_items: items.len(),
        ..ExportSummary::default()
    };
    let mut main_categories = IndexMap::new();
    let created_at = Utc::now().to_rfc3339();

    for (category, group) in &categories {
        let category_dir = out_dir.join(category);
        fs::create_dir_all(&category_dir)
            .with_context(|| format!("Failed to create {}", category_dir.display()))?;

        let chunks = split_into_chunks(group, settings);
        let filenames: Vec<String> = (0..chunks.len())
            .map(|i| chunk_filename(&settings.prefix, category, i))
            .collect();

        for (i, chunk) in chunks.iter().enumerate() {
            let payload = ChunkFile {
                items: chunk.iter().map(|item| (*item).clone()).collect(),
                metadata: ChunkMetadata {
                    category: category.clone(),
                    chunk: i + 1,
                    total_chunks: chunks.len(),
                    items_count: chunk.len(),
                    created_at: created_at.clone(),
                },
            };
            let path = category_dir.join(&filenames[i]);
            match write_json(&payload, &path) {
                Ok(()) => {
                    summary.total_files += 1;
                    debug!("Wrote {} ({} items)", path.display(), chunk.len());
                }
                Err(e) => {
                    summary.write_failures += 1;
                    error!("Failed to write {}: {e}", path.display());
                }
            }
        }

        let index = CategoryIndex {
            category: category.clone(),
            total_items: group.len(),
            total_chunks: chunks.len(),
            chunks: filenames.clone(),
            created_at: created_at.clone(),
        };
        let index_path = category_dir.join(format!("{category}_index.json"));
        if let Err(e) = write_json(&index, &index_path) {
            summary.write_failures += 1;
            error!("Failed to write {}: {e}", index_path.display());
        }

        summary
            .per_category
            .insert(category.clone(), (group.len(), chunks.len()));
        main_categories.insert(
            category.clone(),
            CategorySummary {
                items_count: group.len(),
                chunks_count: chunks.len(),
                files: filenames,
            },
        );
    }

    let main_index = MainIndex {
        total_items: items.len(),
        categories: main_categories,
        created_at,
        mode: mode.to_string(),
        settings: IndexSettings {
            max_file_size_kb: settings.max_file_size_kb,
            max_items_per_file: settings.max_items_per_file,
        },
    };
    write_json(&main_index, &out_dir.join("main_index.json"))
        .map_err(|e| HbkError::Export(format!("main index: {e}")))?;

    Ok(summary)
}
