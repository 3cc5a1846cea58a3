use std::collections::BTreeSet;
use tracing::debug;

use crate::constants::{PASSES_PER_RULE, STABLE_PASSES_BEFORE_EXIT};
use crate::pipeline::rules::RuleSet;
use crate::types::{Entity, EntitySet};

/// Outcome of expanding a single entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expansion {
    pub passes: usize,
    pub added: usize,
}

/// Grows each entity's alternates by running every rule over every known alternate.
///
/// A pass rewrites all alternates currently in the set, so rewrites compose across
/// passes (strip the city, then fold the umlaut). Expansion stops after
/// `STABLE_PASSES_BEFORE_EXIT` consecutive passes add nothing, or once the pass
/// budget of `PASSES_PER_RULE * rules` is spent.
pub struct AlternateGenerator<'a> {
    rules: &'a RuleSet,
    max_passes: usize,
}

impl<'a> AlternateGenerator<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self {
            rules,
            max_passes: rules.len() * PASSES_PER_RULE,
        }
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    /// One pass: every rule over every alternate, returning only unseen non-empty outputs
    fn pass(&self, alternates: &BTreeSet<String>) -> BTreeSet<String> {
        let mut fresh = BTreeSet::new();
        for alternate in alternates {
            for rule in self.rules.iter() {
                let rewritten = rule.apply(alternate);
                if !rewritten.is_empty() && !alternates.contains(&rewritten) {
                    fresh.insert(rewritten);
                }
            }
        }
        fresh
    }

    pub fn expand(&self, entity: &mut Entity) -> Expansion {
        let mut stable = 0;
        let mut passes = 0;
        let mut added = 0;

        while passes < self.max_passes {
            passes += 1;
            let fresh = self.pass(&entity.alternates);
            if fresh.is_empty() {
                stable += 1;
                if stable >= STABLE_PASSES_BEFORE_EXIT {
                    break;
                }
                continue;
            }
            stable = 0;
            added += fresh.len();
            entity.alternates.extend(fresh);
        }

        debug!(
            entity = %entity.name,
            passes,
            added,
            "Expanded alternates"
        );
        Expansion { passes, added }
    }

    /// Expand every entity, returning the total number of alternates added
    pub fn expand_all(&self, entities: &mut EntitySet) -> usize {
        entities
            .values_mut()
            .map(|entity| self.expand(entity).added)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expanded(name: &str) -> Entity {
        let rules = RuleSet::defaults().unwrap();
        let mut entity = Entity::new(name);
        AlternateGenerator::new(&rules).expand(&mut entity);
        entity
    }

    #[test]
    fn test_raw_name_stays_in_set() {
        let entity = expanded("Zürich HB");
        assert!(entity.alternates.contains("Zürich HB"));
    }

    #[test]
    fn test_zurich_hb_variants() {
        let entity = expanded("Zürich HB");
        for expected in [
            "Zuerich HB",
            "Zurich HB",
            "Zürich Hauptbahnhof",
            "Zürich Bahnhof",
            "Zuerich Hauptbahnhof",
            "Zurich Bahnhof",
            "Hauptbahnhof",
            "HB",
            "Zürich",
        ] {
            assert!(
                entity.alternates.contains(expected),
                "missing {expected:?} in {:?}",
                entity.alternates
            );
        }
    }

    #[test]
    fn test_chained_rewrites_survive_early_exit() {
        // "Zurich Hauptbahnhof" needs an umlaut fold plus the HB expansion
        let entity = expanded("Zürich HB");
        assert!(entity.alternates.contains("Zurich Hauptbahnhof"));

        // Running a further expansion must not find anything new
        let rules = RuleSet::defaults().unwrap();
        let mut again = entity.clone();
        let second = AlternateGenerator::new(&rules).expand(&mut again);
        assert_eq!(second.added, 0);
        assert_eq!(second.passes, STABLE_PASSES_BEFORE_EXIT);
        assert_eq!(again, entity);
    }

    #[test]
    fn test_empty_rewrites_are_never_added() {
        let entity = expanded("Bahnhof");
        assert!(!entity.alternates.contains(""));
        assert!(entity.alternates.contains("Bahnhof"));
    }

    #[test]
    fn test_plain_name_stops_after_stable_passes() {
        let rules = RuleSet::defaults().unwrap();
        let mut entity = Entity::new("Bern");
        let expansion = AlternateGenerator::new(&rules).expand(&mut entity);
        assert_eq!(expansion.added, 0);
        assert_eq!(expansion.passes, STABLE_PASSES_BEFORE_EXIT);
        assert_eq!(entity.alternates.len(), 1);
    }

    #[test]
    fn test_pass_budget_caps_expansion() {
        // Each pass appends another "x", so the set never stabilises
        let rules = RuleSet::from_pairs(&[("$", "x")]).unwrap();
        let generator = AlternateGenerator::new(&rules);
        let mut entity = Entity::new("a");
        let expansion = generator.expand(&mut entity);
        assert_eq!(expansion.passes, generator.max_passes());
        assert_eq!(expansion.added, generator.max_passes());
    }

    #[test]
    fn test_parenthesized_names() {
        let entity = expanded("Wil (SG)");
        assert!(entity.alternates.contains("Wil SG"));
        assert!(entity.alternates.contains("Wil"));
    }
}
