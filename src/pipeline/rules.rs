use regex::{Captures, Regex, RegexBuilder};
use serde::Deserialize;

use crate::error::{EntityError, Result};

/// Ordered default rewrite table. Every rule runs case-insensitively.
pub const DEFAULT_RULES: &[(&str, &str)] = &[
    // City qualifier
    (r"\s*\bZ(?:ü|ue|u)rich\b\s*", " "),
    // Station qualifier
    (r"\s*\bBahnhof\b\s*", " "),
    ("ü", "ue"),
    ("ü", "u"),
    ("ö", "oe"),
    ("ö", "o"),
    ("ä", "ae"),
    ("ä", "a"),
    (r"\s*,\s*", " "),
    (r"[()]", ""),
    // Parenthesized suffix
    (r"\s*\([^)]*\)\s*", " "),
    // Central station designations
    (r"\bHB\b", "Hauptbahnhof"),
    (r"\bHauptbahnhof\b", "HB"),
    (r"\bHB\b", "Bahnhof"),
    (r"\bHbf\b", "HB"),
];

/// Strip the leading/trailing commas and whitespace rewrites tend to leave behind.
pub fn trim_alternate(s: &str) -> &str {
    s.trim_matches(|c: char| c == ',' || c.is_whitespace())
}

/// Make `replacement` follow the capitalisation of the text it replaces.
fn match_case(matched: &str, replacement: String) -> String {
    let has_letters = matched.chars().any(char::is_alphabetic);
    if has_letters && !matched.chars().any(char::is_uppercase) {
        return replacement.to_lowercase();
    }
    let starts_upper = matched.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper {
        return replacement;
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => first.to_uppercase().chain(chars).collect(),
        _ => replacement,
    }
}

/// A single case-insensitive pattern rewrite
#[derive(Debug, Clone)]
pub struct ReplacementRule {
    pattern: Regex,
    replacement: String,
}

impl ReplacementRule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| EntityError::InvalidRule {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            pattern: regex,
            replacement: replacement.to_string(),
        })
    }

    /// Rewrite every match in `input` and trim the result.
    /// May return an empty string when the rule consumes the whole input.
    pub fn apply(&self, input: &str) -> String {
        let rewritten = self.pattern.replace_all(input, |caps: &Captures| {
            let mut expanded = String::new();
            caps.expand(&self.replacement, &mut expanded);
            match_case(&caps[0], expanded)
        });
        trim_alternate(&rewritten).to_string()
    }
}

/// One `[[rule]]` entry of a rules file
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

/// Shape of a TOML rules file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesFile {
    /// Use only the rules in this file instead of appending them to the defaults
    #[serde(default)]
    pub replace_defaults: bool,
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleSpec>,
}

impl RulesFile {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Ordered list of rewrite rules
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ReplacementRule>,
}

impl RuleSet {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Result<Self> {
        let rules = pairs
            .iter()
            .map(|(pattern, replacement)| ReplacementRule::new(pattern, replacement))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// The built-in station rules
    pub fn defaults() -> Result<Self> {
        Self::from_pairs(DEFAULT_RULES)
    }

    /// Combine the defaults with a parsed rules file
    pub fn with_file(file: &RulesFile) -> Result<Self> {
        let mut set = if file.replace_defaults {
            Self { rules: Vec::new() }
        } else {
            Self::defaults()?
        };
        for spec in &file.rules {
            set.rules
                .push(ReplacementRule::new(&spec.pattern, &spec.replacement)?);
        }
        if set.rules.is_empty() {
            return Err(EntityError::Config(
                "rules file replaces the defaults but defines no rules".to_string(),
            ));
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReplacementRule> {
        self.rules.iter()
    }
}
