use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::constants::{
    ALLOWED_STOP_TYPES, INPUT_DELIMITER, MIN_COLUMNS, MIN_FILTER_COLUMNS, NAME_COLUMN,
    OPERATOR_COLUMN, RAIL_MODE_MARKER, STOP_ID_COLUMN, STOP_TYPE_COLUMN, TRANSPORT_MODES_COLUMN,
};
use crate::error::{EntityError, Result};
use crate::types::{Entity, EntitySet};

/// The fields of a stop row the filters look at.
///
/// `name` is kept exactly as read; the filter fields are trimmed.
#[derive(Debug, Clone, Copy)]
pub struct StopRow<'a> {
    pub name: &'a str,
    pub stop_type: &'a str,
    pub operator: &'a str,
    pub transport_modes: &'a str,
}

impl<'a> StopRow<'a> {
    fn from_record(record: &'a StringRecord) -> Self {
        let field = |i: usize| record.get(i).unwrap_or("");
        Self {
            name: field(NAME_COLUMN),
            stop_type: field(STOP_TYPE_COLUMN).trim(),
            operator: field(OPERATOR_COLUMN).trim(),
            transport_modes: field(TRANSPORT_MODES_COLUMN).trim(),
        }
    }

    pub fn is_rail(&self) -> bool {
        self.transport_modes.contains(RAIL_MODE_MARKER)
    }
}

/// Which stop rows may become entities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    pub allowed_stop_types: Vec<String>,
    /// Operators any stop must be served by, rail or not
    pub allowed_bus_operators: Option<Vec<String>>,
    /// Name substrings that let a non-rail stop through
    pub no_busses_except_for: Option<Vec<String>>,
}

impl Default for RowFilter {
    fn default() -> Self {
        Self {
            allowed_stop_types: ALLOWED_STOP_TYPES.iter().map(|s| s.to_string()).collect(),
            allowed_bus_operators: None,
            no_busses_except_for: None,
        }
    }
}

impl RowFilter {
    pub fn with_bus_operators(mut self, operators: Vec<String>) -> Self {
        self.allowed_bus_operators = Some(operators);
        self
    }

    pub fn with_bus_exemptions(mut self, substrings: Vec<String>) -> Self {
        self.no_busses_except_for = Some(substrings);
        self
    }

    /// Every active predicate must hold
    pub fn accepts(&self, row: &StopRow<'_>) -> bool {
        if !self.allowed_stop_types.iter().any(|t| t == row.stop_type) {
            return false;
        }
        if let Some(operators) = &self.allowed_bus_operators {
            if !operators.iter().any(|op| op == row.operator) {
                return false;
            }
        }
        if row.is_rail() {
            return true;
        }
        if let Some(exemptions) = &self.no_busses_except_for {
            if !exemptions.iter().any(|s| row.name.contains(s.as_str())) {
                return false;
            }
        }
        true
    }
}

/// Row counts from ingestion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_filtered: usize,
    pub blank_names: usize,
}

/// Seed one entity per distinct name from semicolon-separated rows
pub fn read_entities<R: Read>(
    reader: R,
    filter: Option<&RowFilter>,
    has_header: bool,
) -> Result<(EntitySet, IngestStats)> {
    let min_columns = if filter.is_some() {
        MIN_FILTER_COLUMNS
    } else {
        MIN_COLUMNS
    };

    let mut rdr = ReaderBuilder::new()
        .delimiter(INPUT_DELIMITER)
        .has_headers(has_header)
        .flexible(true)
        .from_reader(reader);

    let mut entities = EntitySet::new();
    let mut stats = IngestStats::default();

    for result in rdr.records() {
        let record = result?;
        stats.rows_read += 1;

        if record.len() < min_columns {
            return Err(EntityError::MalformedRow {
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                found: record.len(),
                expected: min_columns,
            });
        }

        let row = StopRow::from_record(&record);
        if let Some(filter) = filter {
            if !filter.accepts(&row) {
                debug!(
                    stop_id = record.get(STOP_ID_COLUMN).unwrap_or(""),
                    name = row.name,
                    stop_type = row.stop_type,
                    operator = row.operator,
                    "Dropping filtered row"
                );
                stats.rows_filtered += 1;
                continue;
            }
        }

        if row.name.trim().is_empty() {
            warn!(
                line = record.position().map(|p| p.line()).unwrap_or_default(),
                "Skipping row with blank name"
            );
            stats.blank_names += 1;
            continue;
        }

        stats.rows_kept += 1;
        entities
            .entry(row.name.to_string())
            .or_insert_with(|| Entity::new(row.name));
    }

    info!(
        rows = stats.rows_read,
        kept = stats.rows_kept,
        filtered = stats.rows_filtered,
        entities = entities.len(),
        "Read stop rows"
    );
    Ok((entities, stats))
}

pub fn load_entities(
    path: &Path,
    filter: Option<&RowFilter>,
    has_header: bool,
) -> Result<(EntitySet, IngestStats)> {
    let file = File::open(path).map_err(|e| EntityError::io(path, e))?;
    read_entities(file, filter, has_header)
}
