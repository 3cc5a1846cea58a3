// Column layout of the SBB stop export (semicolon separated)

pub const STOP_ID_COLUMN: usize = 0;
pub const NAME_COLUMN: usize = 2;
pub const STOP_TYPE_COLUMN: usize = 3;
pub const OPERATOR_COLUMN: usize = 4;
pub const TRANSPORT_MODES_COLUMN: usize = 5;

/// Minimum field count when only the name is read
pub const MIN_COLUMNS: usize = NAME_COLUMN + 1;
/// Minimum field count when the stop-type/operator/mode filters are active
pub const MIN_FILTER_COLUMNS: usize = TRANSPORT_MODES_COLUMN + 1;

pub const INPUT_DELIMITER: u8 = b';';
pub const OUTPUT_DELIMITER: u8 = b',';

/// Stop types that may become entities
pub const ALLOWED_STOP_TYPES: &[&str] = &["Haltestelle", "Haltestelle und Bedienpunkt"];

/// Substring of the transport-mode field marking a rail stop
pub const RAIL_MODE_MARKER: &str = "Zug";

/// Consecutive no-growth passes after which alternate generation stops
pub const STABLE_PASSES_BEFORE_EXIT: usize = 3;
/// Pass budget per entity, as a multiple of the rule count
pub const PASSES_PER_RULE: usize = 2;

/// Parse a comma-separated option value into its non-blank, trimmed entries
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_drops_blanks() {
        assert_eq!(split_list(" SBB, ,VBZ ,"), vec!["SBB", "VBZ"]);
        assert!(split_list(" , ").is_empty());
    }
}
