
use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::Utc;
use fancy_regex::Regex;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::Corpus;
use crate::extractor::{CollectionElements, HelpLink, MethodRef, Parameter, SyntaxVariant};

/// Which metadata subset a conversion run carries along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterMode {
    Full,
    Optimized,
}

impl ConverterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Optimized => "optimized",
        }
    }
}

/// Structured fields carried next to the rendered content. Absent fields are
/// omitted from the JSON entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub syntax: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub syntax_variants: Vec<SyntaxVariant>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters_by_variant: IndexMap<String, Vec<Parameter>>,
    #[serde(default)]
    pub return_value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub example: String,
    #[serde(default)]
    pub links: Vec<HelpLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "CollectionElements::is_empty")]
    pub collection_elements: CollectionElements,
}

/// The exported unit: rendered text block plus metadata. Immutable once
/// formatted; downstream stages only read it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub id: String,
    pub title: String,
    pub category: String,
    pub content: String,
    pub metadata: ItemMetadata,
}

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

/// Collapse whitespace runs and strip stray markup remnants.
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE_REGEX.replace_all(text, " ");
    TAG_REGEX.replace_all(&collapsed, "").trim().to_string()
}

/// Render one record into a context item. `running_count` is the 0-based
/// number of items already formatted in this run.
pub fn format_item(
    title: &str,
    record: &crate::extractor::SyntaxRecord,
    category: &str,
    running_count: usize,
    mode: ConverterMode,
) -> ContextItem {
    let mut parts = vec![format!("# {title}")];

    if !record.syntax_variants.is_empty() {
        parts.push("\n## Синтаксис".to_string());
        for variant in &record.syntax_variants {
            parts.push(format!(
                "\n### {}\n```bsl\n{}\n```",
                variant.variant_name, variant.syntax
            ));
        }
    } else if !record.syntax.is_empty() {
        parts.push(format!("\n## Синтаксис\n```bsl\n{}\n```", record.syntax));
    }

    if !record.description.is_empty() {
        parts.push(format!("\n## Описание\n{}", clean_text(&record.description)));
    }

    if !record.parameters_by_variant.is_empty() {
        parts.push("\n## Параметры".to_string());
        for (variant_name, params) in &record.parameters_by_variant {
            parts.push(format!("\n### {variant_name}"));
            for param in params {
                parts.push(parameter_line(param));
            }
        }
    } else if !record.parameters.is_empty() {
        parts.push("\n## Параметры".to_string());
        for param in &record.parameters {
            parts.push(format!("- {}", param.name));
        }
    }

    if !record.return_value.is_empty() {
        parts.push(format!(
            "\n## Возвращаемое значение\n{}",
            clean_text(&record.return_value)
        ));
    }

    if !record.example.is_empty() {
        parts.push(format!(
            "\n## Пример\n```bsl\n{}\n```",
            clean_text(&record.example)
        ));
    }

    let mut metadata = ItemMetadata {
        filename: record.filename.clone(),
        syntax: record.syntax.clone(),
        description: clean_text(&record.description),
        syntax_variants: record.syntax_variants.clone(),
        parameters: record.parameters.clone(),
        parameters_by_variant: record.parameters_by_variant.clone(),
        return_value: record.return_value.clone(),
        example: record.example.clone(),
        links: record.links.clone(),
        ..ItemMetadata::default()
    };
    if mode == ConverterMode::Optimized {
        metadata.methods = record.methods.clone();
        metadata.availability = record.availability.clone();
        metadata.version = record.version.clone();
        metadata.collection_elements = record.collection_elements.clone();
    }

    ContextItem {
        id: format!("{category}_{running_count}"),
        title: title.to_string(),
        category: category.to_string(),
        content: parts.join("\n"),
        metadata,
    }
}

fn parameter_line(param: &Parameter) -> String {
    let optional = if param.optional {
        "(необязательный)"
    } else {
        "(обязательный)"
    };
    let mut line = format!("- {} {optional}", param.name);
    if let Some(type_name) = &param.type_name {
        let _ = write!(line, ": {type_name}");
    }
    if let Some(description) = &param.description {
        let _ = write!(line, " - {description}");
    }
    line
}

/// Convert a whole corpus in category-then-title order. Error records are
/// filtered before formatting so ids stay contiguous.
pub fn convert_corpus(corpus: &Corpus, mode: ConverterMode) -> Vec<ContextItem> {
    let mut items = Vec::new();
    for (category, records) in corpus {
        debug!("Converting category {} ({} records)", category, records.len());
        for (title, record) in records {
            if record.has_error() {
                continue;
            }
            items.push(format_item(title, record, category, items.len(), mode));
        }
    }
    items
}

/// The context JSON document: run metadata plus every item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextDocument {
    pub metadata: ContextMetadata,
    pub context_items: Vec<ContextItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextMetadata {
    pub source: String,
    pub generated_at: String,
    pub total_items: usize,
    pub categories: Vec<String>,
}

pub const CONTEXT_SOURCE: &str = "1C BSL Documentation";

impl ContextDocument {
    pub fn new(context_items: Vec<ContextItem>) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for item in &context_items {
            if !categories.contains(&item.category) {
                categories.push(item.category.clone());
            }
        }
        Self {
            metadata: ContextMetadata {
                source: CONTEXT_SOURCE.to_string(),
                generated_at: Utc::now().to_rfc3339(),
                total_items: context_items.len(),
                categories,
            },
            context_items,
        }
    }
}

/// Plain-text rendition: banner then every item separated by `=` rules.
pub fn context_to_text(items: &[ContextItem]) -> String {
    let rule = "=".repeat(80);
    let mut out = String::from("# Документация синтаксиса 1С (BSL)\n\n");
    out.push_str("Этот файл содержит документацию по синтаксису языка 1С:Предприятие.\n");
    out.push_str("Используйте эту информацию для ответов на вопросы о программировании в 1С.\n\n");
    out.push_str(&rule);
    out.push_str("\n\n");
    for item in items {
        out.push_str(&item.content);
        out.push_str("\n\n");
        out.push_str(&rule);
        out.push_str("\n\n");
    }
    out
}

/// Token -> ordered item-id list. Advisory recall index, not a ranked one.
pub type SearchIndex = IndexMap<String, Vec<String>>;

/// Build the search index. Full mode tokenizes title + content; optimized
/// mode tokenizes title + description and additionally indexes availability
/// tags, version, category and parameter type names.
pub fn build_search_index(items: &[ContextItem], mode: ConverterMode) -> SearchIndex {
    let mut index = SearchIndex::new();

    for item in items {
        let text = match mode {
            ConverterMode::Full => format!("{} {}", item.title, item.content),
            ConverterMode::Optimized => {
                format!("{} {}", item.title, item.metadata.description)
            }
        };
        for word in WORD_REGEX.find_iter(&text.to_lowercase()).flatten() {
            let token = word.as_str();
            if token.chars().count() > 2 {
                index_token(&mut index, token, &item.id);
            }
        }

        if mode == ConverterMode::Optimized {
            for tag in &item.metadata.availability {
                index_token(&mut index, &tag.to_lowercase(), &item.id);
            }
            if !item.metadata.version.is_empty() {
                index_token(&mut index, &item.metadata.version, &item.id);
            }
            index_token(&mut index, &item.category, &item.id);
            for param in &item.metadata.parameters {
                if let Some(type_name) = &param.type_name {
                    index_token(&mut index, &type_name.to_lowercase(), &item.id);
                }
            }
        }
    }

    index
}

fn index_token(index: &mut SearchIndex, token: &str, id: &str) {
    let ids = index.entry(token.to_string()).or_default();
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

/// Search index JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIndexDocument {
    pub metadata: SearchIndexMetadata,
    pub index: SearchIndex,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIndexMetadata {
    pub source: String,
    pub generated_at: String,
    pub total_items: usize,
}

impl SearchIndexDocument {
    pub fn new(items: &[ContextItem], mode: ConverterMode) -> Self {
        Self {
            metadata: SearchIndexMetadata {
                source: CONTEXT_SOURCE.to_string(),
                generated_at: Utc::now().to_rfc3339(),
                total_items: items.len(),
            },
            index: build_search_index(items, mode),
        }
    }
}
