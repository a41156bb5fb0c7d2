use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Coarse page kind inferred from the archive path of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageCategory {
    Object,
    Table,
    Method,
    Property,
}

impl PageCategory {
    /// Derived solely from path-segment containment; `None` otherwise.
    pub fn from_path(path: &str) -> Option<Self> {
        if path.contains("objects/") {
            Some(Self::Object)
        } else if path.contains("tables/") {
            Some(Self::Table)
        } else if path.contains("methods/") {
            Some(Self::Method)
        } else if path.contains("properties/") {
            Some(Self::Property)
        } else {
            None
        }
    }
}

/// One named overload of a syntax form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxVariant {
    pub variant_name: String,
    pub syntax: String,
}

/// One parameter of a method or function signature. Absent optional fields
/// mean "not stated on the page", never "empty".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub optional: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// An object's own method, from an explicit method list or a methods link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRef {
    pub name: String,
    pub english_name: String,
    pub full_name: String,
}

impl MethodRef {
    /// Split a display form like "Вставить (Insert)" into the native name
    /// and the English equivalent; absent parentheses leave it empty.
    pub fn from_display(text: &str) -> Self {
        let split = match (text.find('('), text.find(')')) {
            (Some(open), Some(close)) if close > open => Some((open, close)),
            _ => None,
        };
        if let Some((open, close)) = split {
            Self {
                name: text[..open].trim().to_string(),
                english_name: text[open + 1..close].trim().to_string(),
                full_name: text.to_string(),
            }
        } else {
            Self {
                name: text.to_string(),
                english_name: String::new(),
                full_name: text.to_string(),
            }
        }
    }

    /// De-duplication key. Two distinct methods sharing both display forms
    /// collide and the second is dropped; this matches the documented
    /// behavior of the source data.
    pub fn dedup_key(&self) -> String {
        format!("{}_{}", self.name, self.english_name)
    }
}

/// Collection-element description mined from free text. Best-effort; absence
/// means the page had no such section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionElements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

impl CollectionElements {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.usage.is_none()
    }
}

/// An internal help hyperlink found anywhere on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpLink {
    pub text: String,
    pub href: String,
}

/// The structured facts extracted from one documentation page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyntaxRecord {
    /// Archive-relative path; the identity key within a corpus.
    pub filename: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<PageCategory>,
    /// Primary syntax string. When `syntax_variants` is non-empty this is
    /// always the first variant's syntax, kept for single-variant consumers.
    #[serde(default)]
    pub syntax: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub syntax_variants: Vec<SyntaxVariant>,
    /// Flattened union of parameters across variants.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Authoritative per-variant parameter lists, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters_by_variant: IndexMap<String, Vec<Parameter>>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub return_value: String,
    #[serde(default)]
    pub example: String,
    /// Platform-context tags. Empty means "not stated", not "unavailable".
    #[serde(default)]
    pub availability: Vec<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub methods: Vec<MethodRef>,
    #[serde(default, skip_serializing_if = "CollectionElements::is_empty")]
    pub collection_elements: CollectionElements,
    #[serde(default)]
    pub links: Vec<HelpLink>,
    /// Non-empty only when extraction failed for this page; such records are
    /// excluded from classification.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl SyntaxRecord {
    pub fn failed(filename: &str, error: String) -> Self {
        Self {
            filename: filename.to_string(),
            error,
            ..Self::default()
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Fixed alias table resolving help-link fragments to language types.
const TYPE_ALIASES: [(&str, &str, &str); 11] = [
    ("def_String", "String", "Строковый тип данных"),
    ("def_Number", "Number", "Числовой тип данных"),
    ("def_Boolean", "Boolean", "Логический тип данных"),
    ("def_BooleanTrue", "Boolean", "Логический тип данных (Истина)"),
    ("def_Date", "Date", "Тип данных Дата"),
    ("def_Time", "Time", "Тип данных Время"),
    ("Array", "Array", "Массив значений"),
    ("Structure", "Structure", "Структура данных"),
    ("ValueTable", "ValueTable", "Таблица значений"),
    (
        "FormDataCollectionItem",
        "FormDataCollectionItem",
        "Элемент коллекции данных формы",
    ),
    (
        "FormDataTreeItem",
        "FormDataTreeItem",
        "Элемент дерева данных формы",
    ),
];

fn alias_lookup(key: &str) -> Option<(String, String)> {
    TYPE_ALIASES
        .iter()
        .find(|(alias, _, _)| *alias == key)
        .map(|(_, type_name, description)| (type_name.to_string(), description.to_string()))
}

/// Resolve a parameter's type name and description from a help link target.
/// Unknown keys still yield a best-effort type name.
pub fn type_from_link(link: &str) -> Option<(String, String)> {
    if link.is_empty() {
        return None;
    }

    if link.contains("def_") {
        let key = link.rsplit("def_").next().unwrap_or_default();
        return Some(
            alias_lookup(&format!("def_{key}"))
                .unwrap_or_else(|| (key.to_string(), format!("Базовый тип: {key}"))),
        );
    }

    if link.contains("objects/") {
        let object_path = link.rsplit("objects/").next().unwrap_or_default();
        let object_name = object_path
            .trim_end_matches(".html")
            .rsplit('/')
            .next()
            .unwrap_or_default();
        return Some(
            alias_lookup(object_name)
                .unwrap_or_else(|| (object_name.to_string(), format!("Объект: {object_name}"))),
        );
    }

    None
}
