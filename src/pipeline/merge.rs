use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::types::EntitySet;

/// Canonical name → union of the alternates of every entity collapsing onto it
pub type MergedEntities = BTreeMap<String, BTreeSet<String>>;

/// Drop parenthesized segments and stray parenthesis characters from an entity name.
///
/// `"A (old)"` becomes `"A"`. A name that is nothing but a parenthesized
/// segment keeps its inner text instead of collapsing to an empty key.
pub fn strip_parens(name: &str) -> String {
    let mut outside = String::with_capacity(name.len());
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => outside.push(c),
            _ => {}
        }
    }

    let stripped = outside.split_whitespace().collect::<Vec<_>>().join(" ");
    if !stripped.is_empty() {
        return stripped;
    }
    name.chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse entities whose names coincide once parentheses are stripped
pub fn merge_entities(entities: &EntitySet) -> MergedEntities {
    let mut merged = MergedEntities::new();
    for entity in entities.values() {
        let key = strip_parens(&entity.name);
        if key != entity.name {
            debug!(from = %entity.name, to = %key, "Stripped parentheses from entity name");
        }
        merged
            .entry(key)
            .or_default()
            .extend(entity.alternates.iter().cloned());
    }
    merged
}
