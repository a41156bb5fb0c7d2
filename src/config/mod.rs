
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The fixed set of corpus categories, in export priority order.
pub const CATEGORY_ORDER: [&str; 6] = [
    "methods",
    "functions",
    "operators",
    "objects",
    "properties",
    "keywords",
];

/// Per-category selection policy used by the optimized export mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryPolicy {
    /// Lower value means higher priority in the output ordering.
    pub priority: u32,
    /// Maximum number of items kept for this category.
    pub limit: usize,
}

/// Limit applied to categories without an explicit policy entry.
pub const DEFAULT_CATEGORY_LIMIT: usize = 100;

/// Selection policies for the optimized export mode. Methods and functions
/// carry the highest priority and the largest budgets; properties the lowest.
pub const CATEGORY_POLICIES: [(&str, CategoryPolicy); 6] = [
    (
        "methods",
        CategoryPolicy {
            priority: 1,
            limit: 200,
        },
    ),
    (
        "functions",
        CategoryPolicy {
            priority: 2,
            limit: 300,
        },
    ),
    (
        "operators",
        CategoryPolicy {
            priority: 3,
            limit: 50,
        },
    ),
    (
        "objects",
        CategoryPolicy {
            priority: 4,
            limit: 500,
        },
    ),
    (
        "properties",
        CategoryPolicy {
            priority: 5,
            limit: 200,
        },
    ),
    (
        "keywords",
        CategoryPolicy {
            priority: 6,
            limit: DEFAULT_CATEGORY_LIMIT,
        },
    ),
];

/// Importance score weights. Kept as named constants so tests can reason
/// about them without re-deriving magic numbers.
pub mod score_weights {
    /// Items in the methods or functions categories.
    pub const PRIORITY_CATEGORY: u32 = 100;
    /// Any syntax present, single or variants.
    pub const SYNTAX: u32 = 50;
    /// Any parameters present, flat or per-variant.
    pub const PARAMETERS: u32 = 30;
    /// A non-empty example.
    pub const EXAMPLE: u32 = 20;
    /// Per own method of an object.
    pub const PER_METHOD: u32 = 10;
    /// Rendered content longer than `CONTENT_THRESHOLD` chars.
    pub const LONG_CONTENT: u32 = 10;
    /// Baseline for any non-empty description or content.
    pub const BASELINE: u32 = 1;

    pub const CONTENT_THRESHOLD: usize = 50;
}

pub fn category_policy(category: &str) -> CategoryPolicy {
    CATEGORY_POLICIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, policy)| *policy)
        .unwrap_or(CategoryPolicy {
            priority: u32::MAX,
            limit: DEFAULT_CATEGORY_LIMIT,
        })
}

/// Size and count budgets for the split export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportSettings {
    /// Byte budget per chunk file, in kilobytes (serialized-size estimate).
    pub max_file_size_kb: usize,
    /// Item count ceiling per chunk file.
    pub max_items_per_file: usize,
    /// Line count ceiling checked by the export validator.
    pub max_lines_per_file: usize,
    /// Root directory for split exports.
    pub output_dir: PathBuf,
    /// Optional filename prefix for chunk files.
    pub prefix: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            max_file_size_kb: 50,
            max_items_per_file: 50,
            max_lines_per_file: 500,
            output_dir: PathBuf::from("data/context_split"),
            prefix: String::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid max file size: {0} KB (must be between 1 and 10240)")]
    InvalidMaxFileSize(usize),
    #[error("Invalid max items per file: {0} (must be between 1 and 10000)")]
    InvalidMaxItems(usize),
    #[error("Invalid max lines per file: {0} (must be at least 1)")]
    InvalidMaxLines(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl ExportSettings {
    /// Load settings from `<dir>/hbk-context.toml`, falling back to defaults
    /// when the file does not exist.
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("hbk-context.toml");

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let settings: ExportSettings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        settings
            .validate()
            .context("Configuration validation failed")?;

        Ok(settings)
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_path = config_dir.as_ref().join("hbk-context.toml");
        let content = toml::to_string_pretty(self).map_err(ConfigError::TomlSerialize)?;
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_file_size_kb == 0 || self.max_file_size_kb > 10240 {
            return Err(ConfigError::InvalidMaxFileSize(self.max_file_size_kb));
        }
        if self.max_items_per_file == 0 || self.max_items_per_file > 10000 {
            return Err(ConfigError::InvalidMaxItems(self.max_items_per_file));
        }
        if self.max_lines_per_file == 0 {
            return Err(ConfigError::InvalidMaxLines(self.max_lines_per_file));
        }
        Ok(())
    }

    /// Byte budget derived from `max_file_size_kb`.
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_kb * 1024
    }
}
