use super::*;
use crate::context::{ContextItem, ItemMetadata};
use crate::extractor::{MethodRef, SyntaxVariant};

fn item(id: &str, category: &str) -> ContextItem {
    ContextItem {
        id: id.to_string(),
        title: id.to_string(),
        category: category.to_string(),
        content: "краткий".to_string(),
        metadata: ItemMetadata::default(),
    }
}

#[test]
fn score_weights_accumulate() {
    let mut it = item("methods_0", "methods");
    // Priority category + baseline content.
    assert_eq!(score(&it), 101);

    it.metadata.syntax = "Найти(x)".to_string();
    assert_eq!(score(&it), 151);

    it.metadata.parameters.push(crate::extractor::Parameter {
        name: "x".to_string(),
        optional: false,
        type_name: None,
        type_description: None,
        description: None,
        link: None,
    });
    assert_eq!(score(&it), 181);

    it.metadata.example = "Пример".to_string();
    assert_eq!(score(&it), 201);

    it.metadata.methods = vec![
        MethodRef::from_display("Вставить (Insert)"),
        MethodRef::from_display("Очистить (Clear)"),
    ];
    assert_eq!(score(&it), 221);
}

#[test]
fn long_content_earns_bonus() {
    let mut it = item("objects_0", "objects");
    assert_eq!(score(&it), 1);
    it.content = "х".repeat(51);
    assert_eq!(score(&it), 11);
}

#[test]
fn syntax_variants_count_as_syntax() {
    let mut it = item("operators_0", "operators");
    it.metadata.syntax_variants.push(SyntaxVariant {
        variant_name: "Основной".to_string(),
        syntax: "Для ... Цикл".to_string(),
    });
    assert_eq!(score(&it), 51);
}

#[test]
fn empty_item_scores_zero() {
    let mut it = item("objects_0", "objects");
    it.content.clear();
    assert_eq!(score(&it), 0);
}

#[test]
fn limit_keeps_highest_scoring_with_stable_ties() {
    // 120 keyword items, limit 100. Twenty of them carry syntax and must
    // all survive; the remaining 100 tie and are kept in original order.
    let mut items = Vec::new();
    for i in 0..120 {
        let mut it = item(&format!("keywords_{i}"), "keywords");
        if i >= 100 {
            it.metadata.syntax = "Перем".to_string();
        }
        items.push(it);
    }

    let selected = select(items);
    assert_eq!(selected.len(), 100);

    // The 20 syntax-bearing items come first, then ties in original order.
    for (i, it) in selected.iter().take(20).enumerate() {
        assert_eq!(it.id, format!("keywords_{}", 100 + i));
    }
    for (i, it) in selected.iter().skip(20).enumerate() {
        assert_eq!(it.id, format!("keywords_{i}"));
    }
}

#[test]
fn output_groups_categories_by_priority() {
    let items = vec![
        item("properties_0", "properties"),
        item("methods_0", "methods"),
        item("operators_0", "operators"),
        item("functions_0", "functions"),
    ];

    let selected = select(items);
    let categories: Vec<&str> = selected.iter().map(|i| i.category.as_str()).collect();
    assert_eq!(
        categories,
        vec!["methods", "functions", "operators", "properties"]
    );
}

#[test]
fn unknown_category_gets_default_limit_and_last_priority() {
    let mut items: Vec<ContextItem> = (0..120)
        .map(|i| item(&format!("other_{i}"), "other"))
        .collect();
    items.push(item("methods_0", "methods"));

    let selected = select(items);
    assert_eq!(selected.len(), 101);
    assert_eq!(selected[0].category, "methods");
    assert_eq!(selected.iter().filter(|i| i.category == "other").count(), 100);
}
