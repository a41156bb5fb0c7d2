mod record;

use anyhow::Result;
use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

pub use record::{
    CollectionElements, HelpLink, MethodRef, PageCategory, Parameter, SyntaxRecord, SyntaxVariant,
    type_from_link,
};

/// Marker class for section headings ("chapter markers") inside a page.
const CHAPTER_CLASS: &str = "V8SH_chapter";
/// Class of the page title heading.
const PAGE_TITLE_CLASS: &str = "V8SH_pagetitle";
/// Class of parameter description blocks.
const RUBRIC_CLASS: &str = "V8SH_rubric";
/// Class of the minimum-version note.
const VERSION_INFO_CLASS: &str = "V8SH_versionInfo";

/// Scheme used by internal help hyperlinks.
const HELP_LINK_SCHEME: &str = "v8help://";

/// Marker substring for the optional-parameter annotation.
const OPTIONAL_MARKER: &str = "(необязательный)";

/// Section heading words that leak into mined free text and must be dropped.
const SECTION_NOISE: [&str; 5] = [
    "Методы",
    "Описание",
    "Доступность",
    "См. также",
    "Использование в версии",
];

/// Iteration/indexing idioms that mark a sentence as usage guidance.
const USAGE_KEYWORDS: [&str; 5] = ["Для каждого", "Из", "Цикл", "индекс", "оператор"];

/// Extract a structured syntax record from one page's markup. Never fails
/// outward: any internal error yields a record carrying only the filename
/// and the error text.
pub fn extract(html: &str, filename: &str) -> SyntaxRecord {
    match extract_inner(html, filename) {
        Ok(record) => record,
        Err(e) => {
            trace!("Extraction failed for {}: {:#}", filename, e);
            SyntaxRecord::failed(filename, format!("{e:#}"))
        }
    }
}

fn extract_inner(html: &str, filename: &str) -> Result<SyntaxRecord> {
    let doc = Html::parse_document(html);
    let page = PageDom::new(&doc);

    let mut record = SyntaxRecord {
        filename: filename.to_string(),
        category: PageCategory::from_path(filename),
        ..SyntaxRecord::default()
    };

    record.title = page.title();

    let scan = page.scan_syntax_sections();
    record.syntax = scan.syntax;
    record.syntax_variants = scan.variants;
    record.parameters_by_variant = scan.parameters_by_variant;
    record.parameters = record
        .parameters_by_variant
        .values()
        .flatten()
        .cloned()
        .collect();

    if let Some(first) = record.syntax_variants.first() {
        record.syntax = first.syntax.clone();
    }

    if let Some(text) = page.first_section_text("Описание") {
        record.description = text;
    }
    if let Some(text) = page.first_section_text("Возвращаемое значение") {
        record.return_value = text;
    }
    if let Some(text) = page.first_section_text("Доступность") {
        record.availability = text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
    record.version = page.version().unwrap_or_default();
    record.example = page.example().unwrap_or_default();
    record.methods = page.methods();
    record.collection_elements = page.collection_elements();
    record.links = page.help_links();

    Ok(record)
}

/// One node in a section's sibling sequence: either a content element or a
/// bare text node between elements.
enum SectionNode<'a> {
    Element(ElementRef<'a>),
    Text(&'a str),
}

impl SectionNode<'_> {
    fn text(&self) -> String {
        match self {
            SectionNode::Element(el) => element_text(*el),
            SectionNode::Text(t) => t.trim().to_string(),
        }
    }
}

/// State of the marker walk while recovering syntax variants and their
/// parameter lists.
enum ScanState {
    SeekingMarker,
    /// A "Вариант синтаксиса:" marker opened this variant.
    InVariant(String),
}

/// Result of the syntax/variant/parameter scan.
#[derive(Default)]
struct SyntaxScan {
    syntax: String,
    variants: Vec<SyntaxVariant>,
    parameters_by_variant: IndexMap<String, Vec<Parameter>>,
}

/// Query wrapper over one parsed page.
struct PageDom<'a> {
    doc: &'a Html,
    chapter: Selector,
    title: Selector,
    anchor: Selector,
    table: Selector,
    list_item: Selector,
}

impl<'a> PageDom<'a> {
    fn new(doc: &'a Html) -> Self {
        Self {
            doc,
            chapter: Selector::parse(&format!("p.{CHAPTER_CLASS}")).expect("valid selector"),
            title: Selector::parse(&format!("h1.{PAGE_TITLE_CLASS}")).expect("valid selector"),
            anchor: Selector::parse("a").expect("valid selector"),
            table: Selector::parse("table").expect("valid selector"),
            list_item: Selector::parse("li").expect("valid selector"),
        }
    }

    /// Absent title is an empty string, not an error.
    fn title(&self) -> String {
        self.doc
            .select(&self.title)
            .next()
            .map(element_text)
            .unwrap_or_default()
    }

    fn markers(&self) -> impl Iterator<Item = ElementRef<'a>> + '_ {
        self.doc.select(&self.chapter)
    }

    /// The sibling nodes following `marker`, up to (not including) the next
    /// chapter marker. All section rules share this boundary.
    fn section_nodes(&self, marker: ElementRef<'a>) -> Vec<SectionNode<'a>> {
        let mut nodes = Vec::new();
        for sibling in marker.next_siblings() {
            if let Some(el) = ElementRef::wrap(sibling) {
                if is_chapter(el) {
                    break;
                }
                nodes.push(SectionNode::Element(el));
            } else if let Some(text) = sibling.value().as_text() {
                nodes.push(SectionNode::Text(&*text.text));
            }
        }
        nodes
    }

    /// Walk the marker sequence once, recovering the single syntax string or
    /// the named variants with their parameter lists.
    fn scan_syntax_sections(&self) -> SyntaxScan {
        let mut scan = SyntaxScan::default();
        let mut state = ScanState::SeekingMarker;

        for marker in self.markers() {
            let text = element_text(marker);

            if let Some(name) = text.strip_prefix("Вариант синтаксиса:") {
                let name = name.trim().to_string();
                scan.parameters_by_variant.entry(name.clone()).or_default();
                state = ScanState::InVariant(name);
            } else if text.contains("Синтаксис:") && matches!(state, ScanState::InVariant(_)) {
                if let ScanState::InVariant(name) = &state {
                    if let Some(syntax) = self.section_syntax_text(marker) {
                        scan.variants.push(SyntaxVariant {
                            variant_name: name.clone(),
                            syntax,
                        });
                    }
                }
            } else if text.contains("Синтаксис")
                && !text.contains("Вариант")
                && matches!(state, ScanState::SeekingMarker)
            {
                // Single-variant page: populate the plain syntax field and
                // stop the syntax scan entirely.
                scan.syntax = self.section_syntax_text(marker).unwrap_or_default();
                break;
            } else if text.contains("Параметры:") {
                if let ScanState::InVariant(name) = &state {
                    let params = self.section_parameters(marker);
                    scan.parameters_by_variant
                        .entry(name.clone())
                        .or_default()
                        .extend(params);
                }
            }
        }

        // A variant-style page where no variant produced a body leaves no
        // parameter lists behind either.
        scan.parameters_by_variant.retain(|_, params| !params.is_empty());
        scan
    }

    /// The first non-empty sibling text after a syntax marker, skipping a
    /// literal "Параметры:" line.
    fn section_syntax_text(&self, marker: ElementRef<'a>) -> Option<String> {
        self.section_nodes(marker)
            .iter()
            .map(SectionNode::text)
            .find(|t| !t.is_empty() && t != "Параметры:")
    }

    /// Parameter blocks (`div.V8SH_rubric`) between a "Параметры:" marker
    /// and the next chapter marker.
    fn section_parameters(&self, marker: ElementRef<'a>) -> Vec<Parameter> {
        self.section_nodes(marker)
            .iter()
            .filter_map(|node| match node {
                SectionNode::Element(el)
                    if el.value().name() == "div" && has_class(*el, RUBRIC_CLASS) =>
                {
                    self.parse_parameter(*el)
                }
                _ => None,
            })
            .collect()
    }

    /// Parse one parameter block. Blocks with no resolvable `<name>` are
    /// dropped.
    fn parse_parameter(&self, block: ElementRef<'a>) -> Option<Parameter> {
        let block_text = element_text(block);
        let name = delimited_name(&block_text)?;

        let mut parameter = Parameter {
            name,
            optional: block_text.contains(OPTIONAL_MARKER),
            type_name: None,
            type_description: None,
            description: None,
            link: None,
        };

        if let Some(next_el) = next_element_sibling(block) {
            let text = element_text(next_el);
            if let Some(idx) = text.find("Тип:") {
                let after = &text[idx + "Тип:".len()..];
                if let Some(end) = after.find('.') {
                    let type_name = after[..end].trim();
                    if !type_name.is_empty() {
                        parameter.type_name = Some(type_name.to_string());
                    }
                }
            }

            // A line-break element marks the free-text description that
            // immediately follows it.
            if next_el.value().name() == "br" {
                if let Some(text) = next_el.next_sibling().and_then(|n| {
                    n.value().as_text().map(|t| t.trim().to_string())
                }) {
                    if !text.is_empty() {
                        parameter.description = Some(text);
                    }
                }
            }
        }

        if let Some(href) = self.first_link_after(block) {
            parameter.link = Some(href.clone());
            if let Some((type_name, type_description)) = type_from_link(&href) {
                parameter.type_name = Some(type_name);
                parameter.type_description = Some(type_description);
            }
        }

        Some(parameter)
    }

    /// The first hyperlink in document order starting inside the block, then
    /// among its following siblings up to the next chapter marker.
    fn first_link_after(&self, block: ElementRef<'a>) -> Option<String> {
        if let Some(a) = block.select(&self.anchor).next() {
            return a.value().attr("href").map(str::to_string);
        }
        for sibling in block.next_siblings() {
            let Some(el) = ElementRef::wrap(sibling) else {
                continue;
            };
            if is_chapter(el) {
                break;
            }
            if el.value().name() == "a" {
                return el.value().attr("href").map(str::to_string);
            }
            if let Some(a) = el.select(&self.anchor).next() {
                return a.value().attr("href").map(str::to_string);
            }
        }
        None
    }

    /// Immediate next-sibling text of the first marker containing `needle`.
    fn first_section_text(&self, needle: &str) -> Option<String> {
        let marker = self
            .markers()
            .find(|el| element_text(*el).contains(needle))?;
        self.section_nodes(marker)
            .iter()
            .filter_map(|node| match node {
                SectionNode::Element(el) if el.value().name() == "p" => {
                    Some(element_text(*el))
                }
                _ => None,
            })
            .next()
    }

    /// Minimum version, from the version-info note after the usage marker.
    fn version(&self) -> Option<String> {
        let marker = self
            .markers()
            .find(|el| element_text(*el).contains("Использование в версии"))?;
        let version_el = self.section_nodes(marker).iter().find_map(|node| match node {
            SectionNode::Element(el)
                if el.value().name() == "p" && has_class(*el, VERSION_INFO_CLASS) =>
            {
                Some(*el)
            }
            _ => None,
        })?;

        let text = element_text(version_el);
        let idx = text.find("версии")?;
        let version = text[idx + "версии".len()..].trim();
        if version.is_empty() {
            None
        } else {
            Some(version.to_string())
        }
    }

    /// The full text of the next table after an example marker.
    fn example(&self) -> Option<String> {
        let marker = self
            .markers()
            .find(|el| element_text(*el).contains("Пример"))?;
        self.section_nodes(marker).iter().find_map(|node| match node {
            SectionNode::Element(el) => {
                if el.value().name() == "table" {
                    Some(element_text(*el))
                } else {
                    el.select(&self.table).next().map(element_text)
                }
            }
            SectionNode::Text(_) => None,
        })
    }

    /// Own methods of an object: the first bullet list after a "Методы"
    /// marker, falling back to de-duplicated hyperlinks into the methods
    /// namespace.
    fn methods(&self) -> Vec<MethodRef> {
        for marker in self
            .markers()
            .filter(|el| element_text(*el).contains("Методы"))
        {
            let listed: Vec<MethodRef> = self
                .section_nodes(marker)
                .iter()
                .filter_map(|node| match node {
                    SectionNode::Element(el) if el.value().name() == "ul" => Some(*el),
                    _ => None,
                })
                .take(1)
                .flat_map(|ul| {
                    ul.select(&self.list_item)
                        .map(element_text)
                        .filter(|t| !t.is_empty())
                        .map(|t| MethodRef::from_display(&t))
                        .collect::<Vec<_>>()
                })
                .collect();
            if !listed.is_empty() {
                return listed;
            }
        }

        // Fallback: links whose target path contains a methods namespace.
        let mut seen = std::collections::HashSet::new();
        let mut methods = Vec::new();
        for a in self.doc.select(&self.anchor) {
            let href = a.value().attr("href").unwrap_or_default();
            let text = element_text(a);
            if !href.contains("methods/") || text.is_empty() {
                continue;
            }
            let method = MethodRef::from_display(&text);
            if seen.insert(method.dedup_key()) {
                methods.push(method);
            }
        }
        methods
    }

    /// Best-effort sentence mining of the collection-elements section.
    /// Usage-pattern sentences go to `usage`, the rest to `description`;
    /// mismatches are acceptable noise, not bugs.
    fn collection_elements(&self) -> CollectionElements {
        let Some(marker) = self
            .markers()
            .find(|el| element_text(*el).contains("Элементы коллекции"))
        else {
            return CollectionElements::default();
        };

        let full_text: String = self
            .section_nodes(marker)
            .iter()
            .map(SectionNode::text)
            .collect();

        let sentences: Vec<&str> = full_text
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter(|s| !SECTION_NOISE.iter().any(|noise| s.contains(noise)))
            .collect();

        let (usage, description): (Vec<&str>, Vec<&str>) = sentences
            .iter()
            .partition(|s| USAGE_KEYWORDS.iter().any(|kw| s.contains(kw)));

        CollectionElements {
            description: if description.is_empty() {
                None
            } else {
                Some(description.join(". "))
            },
            usage: if usage.is_empty() {
                None
            } else {
                Some(usage.join(". "))
            },
        }
    }

    /// Every internal help hyperlink on the page, in document order.
    fn help_links(&self) -> Vec<HelpLink> {
        self.doc
            .select(&self.anchor)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                if !href.starts_with(HELP_LINK_SCHEME) {
                    return None;
                }
                Some(HelpLink {
                    text: element_text(a),
                    href: href.to_string(),
                })
            })
            .collect()
    }
}

/// Concatenated, fragment-trimmed text of an element (the DOM capability's
/// get-text form: each text fragment stripped, joined without separators).
fn element_text(el: ElementRef) -> String {
    el.text().map(str::trim).collect()
}

fn next_element_sibling<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

fn is_chapter(el: ElementRef) -> bool {
    el.value().name() == "p" && has_class(el, CHAPTER_CLASS)
}

fn has_class(el: ElementRef, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// The substring between the first `<`/`>` pair, used as a parameter name.
fn delimited_name(text: &str) -> Option<String> {
    let open = text.find('<')?;
    let close = text.find('>')?;
    if close <= open + 1 {
        return None;
    }
    Some(text[open + 1..close].to_string())
}
