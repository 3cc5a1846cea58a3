use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A canonical station name together with its accepted spellings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    /// Name exactly as read from the source row
    pub name: String,
    /// Alternate spellings; seeded with `name` itself
    pub alternates: BTreeSet<String>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut alternates = BTreeSet::new();
        alternates.insert(name.clone());
        Self { name, alternates }
    }

    /// Remove every alternate equal to `key` ignoring case, returning how many were dropped
    pub fn remove_alternate(&mut self, key: &str) -> usize {
        let before = self.alternates.len();
        self.alternates.retain(|alt| alt.to_lowercase() != key);
        before - self.alternates.len()
    }
}

/// All entities keyed by raw name. Sorted so every stage walks them in the same order.
pub type EntitySet = BTreeMap<String, Entity>;

/// Count alternates across every entity
pub fn total_alternates(entities: &EntitySet) -> usize {
    entities.values().map(|e| e.alternates.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_contains_own_name() {
        let entity = Entity::new("Bern");
        assert_eq!(entity.name, "Bern");
        assert!(entity.alternates.contains("Bern"));
        assert_eq!(entity.alternates.len(), 1);
    }

    #[test]
    fn test_remove_alternate_ignores_case() {
        let mut entity = Entity::new("Basel SBB");
        entity.alternates.insert("basel sbb".to_string());
        entity.alternates.insert("Basel".to_string());

        assert_eq!(entity.remove_alternate("basel sbb"), 2);
        assert_eq!(entity.alternates.len(), 1);
        assert!(entity.alternates.contains("Basel"));
    }
}
