use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::constants::OUTPUT_DELIMITER;
use crate::error::{EntityError, Result};
use crate::pipeline::merge::MergedEntities;
use crate::types::EntitySet;

/// How the final entity dictionary is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// JSON object of lower-cased alternate → raw entity name
    Lookup,
    /// Quoted CSV, one row per merged entity
    #[default]
    Tabular,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Lookup
        } else {
            OutputFormat::Tabular
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Lookup => write!(f, "lookup (json)"),
            OutputFormat::Tabular => write!(f, "tabular (csv)"),
        }
    }
}

/// Build the alternate → entity table from the per-entity (unmerged) sets.
///
/// Entities are walked in raw-name order, so on a lower-cased key clash the
/// entity with the greater raw name overwrites the earlier one.
pub fn lookup_table(entities: &EntitySet) -> BTreeMap<String, String> {
    let mut table = BTreeMap::new();
    for entity in entities.values() {
        for alternate in &entity.alternates {
            table.insert(alternate.to_lowercase(), entity.name.clone());
        }
    }
    table
}

pub fn render_lookup(entities: &EntitySet) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&lookup_table(entities))?)
}

fn has_parens(s: &str) -> bool {
    s.contains(['(', ')'])
}

/// One quoted CSV row per merged entity: name first, then every alternate free of parentheses
pub fn render_tabular(merged: &MergedEntities) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut writer = WriterBuilder::new()
            .delimiter(OUTPUT_DELIMITER)
            .quote_style(QuoteStyle::Always)
            .flexible(true)
            .from_writer(&mut buffer);

        for (name, alternates) in merged {
            let row = std::iter::once(name.as_str())
                .chain(alternates.iter().map(String::as_str).filter(|alt| !has_parens(alt)));
            writer.write_record(row)?;
        }
        writer.flush().map_err(|e| EntityError::Csv(e.into()))?;
    }
    Ok(buffer)
}

/// Write the rendered document in one go
pub fn write_output(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|e| EntityError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::merge::merge_entities;
    use crate::types::Entity;

    fn entities(list: Vec<Entity>) -> EntitySet {
        list.into_iter().map(|e| (e.name.clone(), e)).collect()
    }

    #[test]
    fn test_lookup_keys_are_lowercase() {
        let mut zurich = Entity::new("Zürich HB");
        zurich.alternates.insert("Zuerich Hauptbahnhof".to_string());
        let table = lookup_table(&entities(vec![zurich]));

        assert!(table.keys().all(|k| *k == k.to_lowercase()));
        assert_eq!(table["zürich hb"], "Zürich HB");
        assert_eq!(table["zuerich hauptbahnhof"], "Zürich HB");
    }

    #[test]
    fn test_lookup_later_entity_overwrites_on_clash() {
        // Clashes only survive when the sets were never resolved; the
        // greater raw name is visited last and wins.
        let mut first = Entity::new("Baden");
        first.alternates.insert("Baden AG".to_string());
        let mut second = Entity::new("Baden AG");
        second.alternates.insert("baden".to_string());
        let table = lookup_table(&entities(vec![first, second]));

        assert_eq!(table["baden"], "Baden AG");
        assert_eq!(table["baden ag"], "Baden AG");
    }

    #[test]
    fn test_lookup_maps_to_unstripped_name() {
        let entity = Entity::new("Wil (SG)");
        let json = render_lookup(&entities(vec![entity])).unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed["wil (sg)"], "Wil (SG)");
    }

    #[test]
    fn test_tabular_quotes_every_field_and_skips_parens() {
        let mut old = Entity::new("A (old)");
        old.alternates.insert("A old".to_string());
        let mut new = Entity::new("A (new)");
        new.alternates.insert("A".to_string());
        let merged = merge_entities(&entities(vec![old, new]));

        let csv = String::from_utf8(render_tabular(&merged).unwrap()).unwrap();
        assert_eq!(csv, "\"A\",\"A\",\"A old\"\n");
    }

    #[test]
    fn test_tabular_rows_vary_in_width() {
        let mut bern = Entity::new("Bern");
        bern.alternates.insert("Bern Bahnhof".to_string());
        let merged = merge_entities(&entities(vec![bern, Entity::new("Thun")]));

        let csv = String::from_utf8(render_tabular(&merged).unwrap()).unwrap();
        assert_eq!(
            csv.lines().collect::<Vec<_>>(),
            vec!["\"Bern\",\"Bern\",\"Bern Bahnhof\"", "\"Thun\",\"Thun\""]
        );
    }

    #[test]
    fn test_json_flag_selects_lookup() {
        assert_eq!(OutputFormat::from_json_flag(true), OutputFormat::Lookup);
        assert_eq!(OutputFormat::from_json_flag(false), OutputFormat::Tabular);
        assert_eq!(OutputFormat::default(), OutputFormat::Tabular);
    }
}
