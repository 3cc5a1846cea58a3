use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::split_list;
use crate::error::{EntityError, Result};
use crate::pipeline::ingest::RowFilter;
use crate::pipeline::rules::{RuleSet, RulesFile};
use crate::pipeline::serialize::OutputFormat;

/// Everything one run needs, validated before any file is touched
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    /// Stop-type/operator/mode filtering; `None` reads every row
    pub filter: Option<RowFilter>,
    /// Skip the first input row
    pub has_header: bool,
    /// Optional TOML file extending or replacing the rewrite rules
    pub rules_file: Option<PathBuf>,
}

impl Config {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            format: OutputFormat::default(),
            filter: None,
            has_header: false,
            rules_file: None,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_rules_file(mut self, path: Option<PathBuf>) -> Self {
        self.rules_file = path;
        self
    }

    /// Configure row filtering from the raw command-line values.
    ///
    /// Either list implies filtering. Lists that contain nothing but commas
    /// and whitespace are rejected.
    pub fn with_filters(
        mut self,
        enabled: bool,
        allowed_bus_operators: Option<&str>,
        no_busses_except_for: Option<&str>,
    ) -> Result<Self> {
        let operators = parse_list_option("allowed_bus_operators", allowed_bus_operators)?;
        let exemptions = parse_list_option("no_busses_except_for", no_busses_except_for)?;

        if !enabled && operators.is_none() && exemptions.is_none() {
            self.filter = None;
            return Ok(self);
        }

        let mut filter = RowFilter::default();
        if let Some(operators) = operators {
            filter = filter.with_bus_operators(operators);
        }
        if let Some(exemptions) = exemptions {
            filter = filter.with_bus_exemptions(exemptions);
        }
        self.filter = Some(filter);
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input.as_os_str().is_empty() {
            return Err(EntityError::Config("input path is required".to_string()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(EntityError::Config("output path is required".to_string()));
        }
        if same_path(&self.input, &self.output) {
            return Err(EntityError::Config(format!(
                "output '{}' would overwrite the input",
                self.output.display()
            )));
        }
        Ok(())
    }

    /// Load the rewrite rules: the defaults, adjusted by the rules file if one is configured
    pub fn load_rules(&self) -> Result<RuleSet> {
        match &self.rules_file {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| EntityError::io(path, e))?;
                RuleSet::with_file(&RulesFile::parse(&content)?)
            }
            None => RuleSet::defaults(),
        }
    }
}

fn parse_list_option(option: &str, raw: Option<&str>) -> Result<Option<Vec<String>>> {
    match raw {
        None => Ok(None),
        Some(raw) => {
            let entries = split_list(raw);
            if entries.is_empty() {
                return Err(EntityError::Config(format!(
                    "{option} must list at least one entry"
                )));
            }
            Ok(Some(entries))
        }
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::rules::DEFAULT_RULES;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::new("stops.csv", "entities.csv");
        assert!(config.validate().is_ok());
        assert_eq!(config.format, OutputFormat::Tabular);
        assert!(config.filter.is_none());
        assert!(!config.has_header);
    }

    #[test]
    fn test_input_equal_to_output_is_rejected() {
        let config = Config::new("stops.csv", "stops.csv");
        assert!(matches!(config.validate(), Err(EntityError::Config(_))));
    }

    #[test]
    fn test_list_options_enable_filtering() {
        let config = Config::new("in", "out")
            .with_filters(false, Some("VBZ, PostAuto"), None)
            .unwrap();
        let filter = config.filter.unwrap();
        assert_eq!(
            filter.allowed_bus_operators,
            Some(vec!["VBZ".to_string(), "PostAuto".to_string()])
        );
        assert!(filter.no_busses_except_for.is_none());
    }

    #[test]
    fn test_filter_flag_alone_checks_stop_types() {
        let config = Config::new("in", "out").with_filters(true, None, None).unwrap();
        assert_eq!(config.filter, Some(RowFilter::default()));
    }

    #[test]
    fn test_blank_list_is_rejected() {
        let result = Config::new("in", "out").with_filters(false, None, Some(" , "));
        assert!(matches!(result, Err(EntityError::Config(_))));
    }

    #[test]
    fn test_rules_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[rule]]\npattern = \"\\\\bSt\\\\.\"\nreplacement = \"Sankt\"").unwrap();

        let config = Config::new("in", "out").with_rules_file(Some(file.path().to_path_buf()));
        let rules = config.load_rules().unwrap();
        assert_eq!(rules.len(), DEFAULT_RULES.len() + 1);
    }

    #[test]
    fn test_missing_rules_file_is_an_error() {
        let missing = PathBuf::from("/nonexistent/rules.toml");
        let config = Config::new("in", "out").with_rules_file(Some(missing));
        assert!(matches!(config.load_rules(), Err(EntityError::Io { .. })));
    }
}
