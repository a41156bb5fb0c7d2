#[cfg(test)]
mod tests;

use indexmap::IndexMap;
use tracing::debug;

use crate::config::{category_policy, score_weights};
use crate::context::ContextItem;

/// Importance score for one item. Monotonic non-negative weighted sum.
pub fn score(item: &ContextItem) -> u64 {
    let mut score = 0u64;
    let metadata = &item.metadata;

    let policy = category_policy(&item.category);
    if policy.priority <= category_policy("functions").priority {
        score += u64::from(score_weights::PRIORITY_CATEGORY);
    }
    if !metadata.syntax.is_empty() || !metadata.syntax_variants.is_empty() {
        score += u64::from(score_weights::SYNTAX);
    }
    if !metadata.parameters.is_empty() || !metadata.parameters_by_variant.is_empty() {
        score += u64::from(score_weights::PARAMETERS);
    }
    if !metadata.example.is_empty() {
        score += u64::from(score_weights::EXAMPLE);
    }
    score += u64::from(score_weights::PER_METHOD) * metadata.methods.len() as u64;
    if item.content.chars().count() > score_weights::CONTENT_THRESHOLD {
        score += u64::from(score_weights::LONG_CONTENT);
    }
    if !item.content.is_empty() || !metadata.description.is_empty() {
        score += u64::from(score_weights::BASELINE);
    }

    score
}

/// Keep the highest-scoring items per category, within that category's
/// limit. Output is grouped by category priority; within a category items
/// are score-descending with original order breaking ties.
pub fn select(items: Vec<ContextItem>) -> Vec<ContextItem> {
    let mut by_category: IndexMap<String, Vec<ContextItem>> = IndexMap::new();
    for item in items {
        by_category.entry(item.category.clone()).or_default().push(item);
    }

    by_category.sort_by(|cat_a, _, cat_b, _| {
        category_policy(cat_a)
            .priority
            .cmp(&category_policy(cat_b).priority)
    });

    let mut selected = Vec::new();
    for (category, mut group) in by_category {
        let limit = category_policy(&category).limit;
        // Stable sort: equal scores keep their original relative order.
        group.sort_by_key(|item| std::cmp::Reverse(score(item)));
        let kept = group.len().min(limit);
        debug!("Category {}: keeping {} of {}", category, kept, group.len());
        group.truncate(kept);
        selected.extend(group);
    }
    selected
}
