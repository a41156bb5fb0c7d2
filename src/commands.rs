use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::Result;
use crate::archive::HelpArchive;
use crate::config::ExportSettings;
use crate::context::{
    ContextDocument, ConverterMode, SearchIndexDocument, context_to_text, convert_corpus,
};
use crate::corpus::{CorpusBuilder, corpus_to_markdown, find_by_pattern, load_corpus, save_corpus};
use crate::export::export_split;
use crate::selector::select;
use crate::validate::{print_report, validate_export};

/// Extract a help archive into a corpus JSON file, optionally with a
/// Markdown reference next to it.
pub fn extract(
    archive_path: &Path,
    output: &Path,
    max_files: Option<usize>,
    markdown: bool,
) -> Result<()> {
    info!("Extracting {}", archive_path.display());

    let mut archive = HelpArchive::open(archive_path)?;
    let (corpus, stats) = CorpusBuilder::new().build(&mut archive, max_files)?;
    save_corpus(&corpus, output)?;

    if markdown {
        let markdown_path = output.with_extension("md");
        fs::write(&markdown_path, corpus_to_markdown(&corpus))
            .with_context(|| format!("Failed to write {}", markdown_path.display()))?;
        println!("Wrote {}", markdown_path.display());
    }

    println!("Extraction complete: {}", output.display());
    println!("  Pages processed: {}", stats.processed);
    println!("  Failures: {}", stats.failed);
    for (category, count) in &stats.per_category {
        println!("  {category}: {count}");
    }

    Ok(())
}

/// Convert a corpus JSON file into context JSON, context text and a search
/// index, written next to each other under `output_dir`.
pub fn convert(input: &Path, output_dir: &Path, optimized: bool) -> Result<()> {
    let corpus = load_corpus(input)?;
    let mode = if optimized {
        ConverterMode::Optimized
    } else {
        ConverterMode::Full
    };

    let items = convert_corpus(&corpus, mode);
    println!("Formatted {} context items ({} mode)", items.len(), mode.as_str());

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let search = SearchIndexDocument::new(&items, mode);
    let text = context_to_text(&items);
    let document = ContextDocument::new(items);

    let context_path = output_dir.join("1c_context.json");
    fs::write(
        &context_path,
        serde_json::to_string_pretty(&document).context("Failed to serialize context")?,
    )
    .with_context(|| format!("Failed to write {}", context_path.display()))?;
    println!("Wrote {}", context_path.display());

    let text_path = output_dir.join("1c_context.txt");
    fs::write(&text_path, text)
        .with_context(|| format!("Failed to write {}", text_path.display()))?;
    println!("Wrote {}", text_path.display());

    let search_path = output_dir.join("1c_search_index.json");
    fs::write(
        &search_path,
        serde_json::to_string_pretty(&search).context("Failed to serialize search index")?,
    )
    .with_context(|| format!("Failed to write {}", search_path.display()))?;
    println!(
        "Wrote {} ({} tokens)",
        search_path.display(),
        search.index.len()
    );

    Ok(())
}

/// Split a context JSON document into size-bounded chunk files plus indices,
/// then validate the produced tree.
pub fn export(input: &Path, settings: &ExportSettings, optimized: bool) -> Result<()> {
    let content = fs::read_to_string(input)
        .map_err(|e| crate::HbkError::Load(format!("{}: {e}", input.display())))?;
    let document: ContextDocument = serde_json::from_str(&content)
        .map_err(|e| crate::HbkError::Load(format!("{}: {e}", input.display())))?;

    let (items, mode) = if optimized {
        (select(document.context_items), "optimized_split")
    } else {
        (document.context_items, "full_split")
    };

    println!(
        "Splitting {} items (max {} KB / {} items per file)",
        items.len(),
        settings.max_file_size_kb,
        settings.max_items_per_file
    );

    let summary = export_split(&items, &settings.output_dir, mode, settings)?;

    println!("Export complete: {}", settings.output_dir.display());
    println!("  Items: {}", summary.total_items);
    println!("  Files written: {}", summary.total_files);
    if summary.write_failures > 0 {
        println!("  Write failures: {}", summary.write_failures);
    }
    for (category, (items_count, chunks_count)) in &summary.per_category {
        println!("  {category}: {items_count} items in {chunks_count} files");
    }

    let report = validate_export(&settings.output_dir, settings)?;
    print_report(&report, settings);

    Ok(())
}

/// Validate a previously produced export tree.
pub fn validate(output_dir: &Path, settings: &ExportSettings) -> Result<()> {
    let report = validate_export(output_dir, settings)?;
    print_report(&report, settings);
    Ok(())
}

/// Substring search over a corpus file, printing matching records.
pub fn search(input: &Path, pattern: &str) -> Result<()> {
    let corpus = load_corpus(input)?;
    let matches = find_by_pattern(&corpus, pattern);

    if matches.is_empty() {
        println!("No matches for '{pattern}'");
        return Ok(());
    }

    println!("{} matches for '{pattern}':", matches.len());
    for found in matches {
        println!("  [{}] {}", found.category, found.title);
        if !found.record.syntax.is_empty() {
            println!("      {}", found.record.syntax);
        }
    }

    Ok(())
}

/// Print coarse structural statistics of a help archive.
pub fn inspect(archive_path: &Path) -> Result<()> {
    let mut archive = HelpArchive::open(archive_path)?;
    let structure = archive.analyze_structure()?;

    println!("Archive: {}", archive_path.display());
    println!("  Total files: {}", structure.total_files);
    println!("  HTML files: {}", structure.html_files);
    println!("  ST files: {}", structure.st_files);

    println!("  File types:");
    for (extension, count) in &structure.file_types {
        println!("    {extension}: {count}");
    }
    println!("  Top-level directories:");
    for (directory, count) in &structure.categories {
        println!("    {directory}: {count}");
    }
    if !structure.largest_files.is_empty() {
        println!("  Largest entries:");
        for entry in &structure.largest_files {
            println!("    {}: {:.1} KB", entry.name, entry.size as f64 / 1024.0);
        }
    }

    Ok(())
}
