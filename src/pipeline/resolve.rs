use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::types::EntitySet;

/// Levenshtein distance over characters with unit costs
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let rows = a.len() + 1;
    let cols = b.len() + 1;

    let mut table = vec![vec![0usize; cols]; rows];
    for (i, row) in table.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in table[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..rows {
        for j in 1..cols {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            table[i][j] = (table[i][j - 1] + 1)
                .min(table[i - 1][j] + 1)
                .min(table[i - 1][j - 1] + cost);
        }
    }
    table[rows - 1][cols - 1]
}

/// Which entity currently owns each alternate, keyed by the lower-cased alternate
#[derive(Debug, Default)]
pub struct ReverseIndex {
    owners: HashMap<String, String>,
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self, alternate: &str) -> Option<&str> {
        self.owners.get(&alternate.to_lowercase()).map(String::as_str)
    }

    fn claim(&mut self, key: String, entity: &str) {
        self.owners.insert(key, entity.to_string());
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// One alternate that two entities both generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub alternate: String,
    pub kept_by: String,
    pub dropped_from: String,
    pub kept_distance: usize,
    pub dropped_distance: usize,
}

#[derive(Debug)]
pub struct Resolution {
    pub index: ReverseIndex,
    pub collisions: Vec<Collision>,
}

/// Makes alternate sets disjoint across entities.
///
/// Entities are visited in raw-name order. A contested alternate goes to the
/// entity whose raw name is closer by edit distance; the recorded owner keeps
/// it on a tie.
pub struct ConflictResolver;

impl ConflictResolver {
    pub fn resolve(entities: &mut EntitySet) -> Resolution {
        let mut index = ReverseIndex::new();
        let mut collisions = Vec::new();
        let names: Vec<String> = entities.keys().cloned().collect();

        for name in &names {
            let snapshot: Vec<String> = match entities.get_mut(name) {
                Some(entity) => {
                    entity.alternates.retain(|alt| !alt.is_empty());
                    entity.alternates.iter().cloned().collect()
                }
                None => continue,
            };

            for alternate in snapshot {
                // Already lost to another entity via a case variant
                let still_held = entities
                    .get(name)
                    .is_some_and(|entity| entity.alternates.contains(&alternate));
                if !still_held {
                    continue;
                }

                let key = alternate.to_lowercase();
                let owner = match index.owners.get(&key) {
                    None => {
                        index.claim(key, name);
                        continue;
                    }
                    Some(owner) if owner == name => continue,
                    Some(owner) => owner.clone(),
                };

                let owner_distance = edit_distance(&key, &owner.to_lowercase());
                let candidate_distance = edit_distance(&key, &name.to_lowercase());

                let collision = if candidate_distance < owner_distance {
                    if let Some(loser) = entities.get_mut(&owner) {
                        loser.remove_alternate(&key);
                    }
                    index.claim(key, name);
                    Collision {
                        alternate,
                        kept_by: name.clone(),
                        dropped_from: owner,
                        kept_distance: candidate_distance,
                        dropped_distance: owner_distance,
                    }
                } else {
                    if let Some(loser) = entities.get_mut(name) {
                        loser.remove_alternate(&key);
                    }
                    Collision {
                        alternate,
                        kept_by: owner,
                        dropped_from: name.clone(),
                        kept_distance: owner_distance,
                        dropped_distance: candidate_distance,
                    }
                };

                info!(
                    "Found conflicting alternate '{}' for '{}' and '{}', preferring '{}'",
                    collision.alternate,
                    collision.kept_by,
                    collision.dropped_from,
                    collision.kept_by
                );
                collisions.push(collision);
            }
        }

        debug!(indexed = index.len(), collisions = collisions.len(), "Resolved alternates");
        Resolution { index, collisions }
    }
}
