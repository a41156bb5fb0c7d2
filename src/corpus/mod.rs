#[cfg(test)]
mod tests;

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::archive::HelpArchive;
use crate::config::CATEGORY_ORDER;
use crate::extractor::{PageCategory, SyntaxRecord, extract};
use crate::{HbkError, Result};

/// Category -> title -> record. Categories are fixed and kept in priority
/// order; titles keep archive-listing order. A repeated title within one
/// category overwrites the earlier record (accepted lossy behavior).
pub type Corpus = IndexMap<String, IndexMap<String, SyntaxRecord>>;

/// Title marker words checked in priority order; the first match wins.
const CLASSIFIER_RULES: [(&str, &str, &str); 5] = [
    ("Функция", "function", "functions"),
    ("Метод", "method", "methods"),
    ("Свойство", "property", "properties"),
    ("Оператор", "operator", "operators"),
    ("Ключевое слово", "keyword", "keywords"),
];

/// Assign a record to one of the fixed categories. Records carrying an
/// extraction error must be filtered out before calling this.
pub fn classify(record: &SyntaxRecord) -> &'static str {
    let title_lower = record.title.to_lowercase();
    for (ru_marker, en_marker, category) in CLASSIFIER_RULES {
        if record.title.contains(ru_marker) || title_lower.contains(en_marker) {
            return category;
        }
    }
    if record.category == Some(PageCategory::Object) {
        return "objects";
    }
    "objects"
}

/// Per-category counts plus failure accounting for one build run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub processed: usize,
    pub failed: usize,
    pub per_category: IndexMap<String, usize>,
}

/// Drives extraction and classification over an archive's pages.
pub struct CorpusBuilder {
    corpus: Corpus,
    stats: CorpusStats,
}

impl Default for CorpusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusBuilder {
    pub fn new() -> Self {
        let mut corpus = Corpus::new();
        for category in CATEGORY_ORDER {
            corpus.insert(category.to_string(), IndexMap::new());
        }
        Self {
            corpus,
            stats: CorpusStats::default(),
        }
    }

    /// Process pages in archive-listing order, up to `limit` pages when one
    /// is given. One bad page never aborts the build.
    pub fn build(
        mut self,
        archive: &mut HelpArchive,
        limit: Option<usize>,
    ) -> Result<(Corpus, CorpusStats)> {
        let entries = archive.html_entries();
        let total = limit.map_or(entries.len(), |n| n.min(entries.len()));

        let progress = ProgressBar::new(total as u64);
        progress.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} pages ({per_sec})")
                .expect("valid progress template"),
        );

        for filename in entries.iter().take(total) {
            let html = archive.read_entry_text(filename);
            self.insert_page(filename, html);
            progress.inc(1);
        }
        progress.finish_and_clear();

        debug!(
            "Corpus build complete: {} pages, {} failures",
            self.stats.processed, self.stats.failed
        );

        for (category, items) in &self.corpus {
            self.stats
                .per_category
                .insert(category.clone(), items.len());
        }

        Ok((self.corpus, self.stats))
    }

    /// Extract, classify and insert one page. A failed read or extraction
    /// yields an error record that is counted but never classified.
    fn insert_page(&mut self, filename: &str, html: Result<String>) {
        let record = match html {
            Ok(html) => extract(&html, filename),
            Err(e) => SyntaxRecord::failed(filename, e.to_string()),
        };
        self.stats.processed += 1;

        if record.has_error() {
            warn!("Extraction failed for {}: {}", filename, record.error);
            self.stats.failed += 1;
            return;
        }

        let category = classify(&record);
        let title = record.title.clone();
        self.corpus
            .entry(category.to_string())
            .or_default()
            .insert(title, record);
    }
}

/// Write a corpus as indented UTF-8 JSON: `{category: {title: record}}`.
pub fn save_corpus(corpus: &Corpus, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(corpus)
        .context("Failed to serialize corpus")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write corpus to {}", path.display()))?;
    Ok(())
}

/// Load a corpus file. Missing or malformed input is fatal to the invoking
/// step: the caller must abort before writing any output.
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    let content = fs::read_to_string(path)
        .map_err(|e| HbkError::Load(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| HbkError::Load(format!("{}: {e}", path.display())))
}

/// A pattern match within the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch<'a> {
    pub category: &'a str,
    pub title: &'a str,
    pub record: &'a SyntaxRecord,
}

/// Case-insensitive substring search over titles, syntax and descriptions.
pub fn find_by_pattern<'a>(corpus: &'a Corpus, pattern: &str) -> Vec<PatternMatch<'a>> {
    let needle = pattern.to_lowercase();
    let mut matches = Vec::new();
    for (category, items) in corpus {
        for (title, record) in items {
            if title.to_lowercase().contains(&needle)
                || record.syntax.to_lowercase().contains(&needle)
                || record.description.to_lowercase().contains(&needle)
            {
                matches.push(PatternMatch {
                    category,
                    title,
                    record,
                });
            }
        }
    }
    matches
}

/// Render the corpus as a human-readable Markdown reference.
pub fn corpus_to_markdown(corpus: &Corpus) -> String {
    let mut out = String::from("# Справочник синтаксиса BSL 1С\n\n");

    for (category, items) in corpus {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "## {}\n", capitalize(category));

        for (title, record) in items {
            let _ = writeln!(out, "### {title}\n");
            if !record.syntax.is_empty() {
                let _ = writeln!(out, "**Синтаксис:** `{}`\n", record.syntax);
            }
            if !record.description.is_empty() {
                let _ = writeln!(out, "**Описание:** {}\n", record.description);
            }
            if !record.parameters.is_empty() {
                out.push_str("**Параметры:**\n");
                for param in &record.parameters {
                    let _ = writeln!(out, "- {}", param.name);
                }
                out.push('\n');
            }
            if !record.return_value.is_empty() {
                let _ = writeln!(out, "**Возвращаемое значение:** {}\n", record.return_value);
            }
            if !record.example.is_empty() {
                let _ = writeln!(out, "**Пример:**\n```bsl\n{}\n```\n", record.example);
            }
            out.push_str("---\n\n");
        }
    }

    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
