
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use console::style;
use indexmap::IndexMap;

use crate::Result;
use crate::config::ExportSettings;

/// Why a chunk file failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    SizeExceeded,
    LinesExceeded,
}

/// One offending chunk file.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub path: PathBuf,
    pub category: String,
    pub violation: Violation,
    /// Size in KB for size violations, line count for line violations.
    pub value: f64,
}

/// Magnitude buckets used when a category has many offenders.
pub const BUCKET_LABELS: [&str; 5] = ["50-60", "60-70", "70-80", "80-90", "90+"];

pub fn bucket_label(value: f64) -> &'static str {
    if value <= 60.0 {
        "50-60"
    } else if value <= 70.0 {
        "60-70"
    } else if value <= 80.0 {
        "70-80"
    } else if value <= 90.0 {
        "80-90"
    } else {
        "90+"
    }
}

/// Result of one validation run over an export tree. Read-only; the
/// validator never mutates or re-chunks.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub total_files: usize,
    pub valid_files: usize,
    pub size_warnings: Vec<Warning>,
    pub lines_warnings: Vec<Warning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.size_warnings.is_empty() && self.lines_warnings.is_empty()
    }
}

fn is_chunk_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".json") && !name.ends_with("_index.json")
}

fn category_of(path: &Path, root: &Path) -> String {
    path.parent()
        .and_then(|p| p.strip_prefix(root).ok())
        .and_then(|p| p.iter().next())
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

fn walk_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("Failed to read entry in {}", dir.display()))?
            .path();
        if path.is_dir() {
            walk_json_files(&path, out)?;
        } else if is_chunk_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Re-read every non-index JSON file under `output_dir` and check it against
/// the size and line ceilings used during chunking.
pub fn validate_export(output_dir: &Path, settings: &ExportSettings) -> Result<ValidationReport> {
    let mut files = Vec::new();
    walk_json_files(output_dir, &mut files)?;
    files.sort();

    let mut report = ValidationReport::default();

    for path in files {
        let metadata = fs::metadata(&path)
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        let size_kb = metadata.len() as f64 / 1024.0;
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let lines = content.lines().count();

        report.total_files += 1;
        let category = category_of(&path, output_dir);

        if size_kb > settings.max_file_size_kb as f64 {
            report.size_warnings.push(Warning {
                path,
                category,
                violation: Violation::SizeExceeded,
                value: size_kb,
            });
        } else if lines > settings.max_lines_per_file {
            report.lines_warnings.push(Warning {
                path,
                category,
                violation: Violation::LinesExceeded,
                value: lines as f64,
            });
        } else {
            report.valid_files += 1;
        }
    }

    Ok(report)
}

/// Group warnings first by category, then by magnitude bucket.
pub fn group_warnings(
    warnings: &[Warning],
) -> IndexMap<String, IndexMap<&'static str, Vec<&Warning>>> {
    let mut by_category: IndexMap<String, Vec<&Warning>> = IndexMap::new();
    for warning in warnings {
        by_category
            .entry(warning.category.clone())
            .or_default()
            .push(warning);
    }
    by_category.sort_keys();

    let mut grouped = IndexMap::new();
    for (category, entries) in by_category {
        let mut buckets: IndexMap<&'static str, Vec<&Warning>> = IndexMap::new();
        for label in BUCKET_LABELS {
            buckets.insert(label, Vec::new());
        }
        for warning in entries {
            buckets
                .entry(bucket_label(warning.value))
                .or_default()
                .push(warning);
        }
        buckets.retain(|_, v| !v.is_empty());
        grouped.insert(category, buckets);
    }
    grouped
}

/// Print the validation report the way the export summary reads.
pub fn print_report(report: &ValidationReport, settings: &ExportSettings) {
    println!("Validation statistics:");
    println!("  Total files: {}", report.total_files);
    println!("  {} {}", style("Valid:").green(), report.valid_files);
    println!(
        "  {} {}",
        style("Size exceeded:").yellow(),
        report.size_warnings.len()
    );
    println!(
        "  {} {}",
        style("Lines exceeded:").yellow(),
        report.lines_warnings.len()
    );

    if !report.size_warnings.is_empty() {
        println!(
            "\n{}",
            style(format!(
                "Files over the size limit ({} KB):",
                settings.max_file_size_kb
            ))
            .yellow()
        );
        print_grouped(&report.size_warnings, "KB");
    }
    if !report.lines_warnings.is_empty() {
        println!(
            "\n{}",
            style(format!(
                "Files over the line limit ({}):",
                settings.max_lines_per_file
            ))
            .yellow()
        );
        print_grouped(&report.lines_warnings, "lines");
    }
    if report.is_clean() {
        println!("{}", style("All files are within limits").green());
    }
}

fn print_grouped(warnings: &[Warning], unit: &str) {
    for (category, buckets) in group_warnings(warnings) {
        let count: usize = buckets.values().map(Vec::len).sum();
        println!("  {category}: {count} files");
        for (label, entries) in buckets {
            if entries.len() <= 3 {
                for warning in entries {
                    let name = warning
                        .path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("?");
                    println!("    {name}: {:.1} {unit}", warning.value);
                }
            } else {
                let avg: f64 =
                    entries.iter().map(|w| w.value).sum::<f64>() / entries.len() as f64;
                println!(
                    "    {label}: {} files (average {avg:.1} {unit})",
                    entries.len()
                );
            }
        }
    }
}
