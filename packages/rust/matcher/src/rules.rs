//! Classification-code rule compiler.
//!
//! Each configured code becomes a [`Rule`]. Codes ending in `0` denote a
//! broader level of the hierarchy (UNSPSC-style) and match by prefix; all
//! other codes match exactly.

use tenderwatch_shared::{IndustryConfig, PipelineConfig};
use tracing::{debug, instrument};

/// How a rule compares against a record's codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Exact,
    Prefix,
}

/// A compiled classification-code rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    /// Industry the code was configured under.
    pub industry: String,
    /// `macro`, `commodity`, or `feeder:<type>`.
    pub category: String,
    /// The configured code with non-digits removed.
    pub code: String,
    pub kind: MatchKind,
    /// The full code for exact rules; the code without trailing zeros for prefix rules.
    pub prefix: String,
}

impl Rule {
    /// Compile one configured code. Returns `None` when the code has no digits.
    ///
    /// All-zero codes also return `None`. They are the one exception to the
    /// zero-suffix rule: trimming them would give an empty prefix rule that
    /// matches every record carrying any code, so they are dropped instead.
    pub fn compile(industry: &str, category: &str, raw_code: &str) -> Option<Self> {
        let code = normalize_code(raw_code);
        if code.is_empty() {
            return None;
        }

        let (kind, prefix) = if code.ends_with('0') {
            (MatchKind::Prefix, code.trim_end_matches('0').to_string())
        } else {
            (MatchKind::Exact, code.clone())
        };

        if prefix.is_empty() {
            return None;
        }

        Some(Self {
            industry: industry.to_string(),
            category: category.to_string(),
            code,
            kind,
            prefix,
        })
    }

    /// Whether any of the record's codes satisfies this rule.
    pub fn matches(&self, codes: &[&str]) -> bool {
        match self.kind {
            MatchKind::Exact => codes.iter().any(|c| *c == self.prefix),
            MatchKind::Prefix => codes.iter().any(|c| c.starts_with(&self.prefix)),
        }
    }

    /// `<industry>:<category>` as written to `match_categories`.
    pub fn category_label(&self) -> String {
        format!("{}:{}", self.industry, self.category)
    }
}

/// Strip every non-digit character.
pub fn normalize_code(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Compile all classification codes of all industries into a flat rule list.
#[instrument(skip_all, fields(industries = config.industries.len()))]
pub fn compile_rules(config: &PipelineConfig) -> Vec<Rule> {
    let mut rules = Vec::new();
    let mut dropped = 0usize;

    for (industry, data) in &config.industries {
        for (category, code) in configured_codes(data) {
            match Rule::compile(industry, &category, code) {
                Some(rule) => rules.push(rule),
                None => dropped += 1,
            }
        }
    }

    debug!(rules = rules.len(), dropped, "classification rules compiled");
    rules
}

/// Every `(category tag, code)` pair of one industry.
fn configured_codes(data: &IndustryConfig) -> Vec<(String, &str)> {
    let mut codes: Vec<(String, &str)> = Vec::new();
    codes.extend(data.macro_unspsc.iter().map(|c| ("macro".to_string(), c.as_str())));
    codes.extend(
        data.commodity_unspsc
            .iter()
            .map(|c| ("commodity".to_string(), c.as_str())),
    );
    for (feeder_type, feeder_codes) in &data.feeders {
        codes.extend(
            feeder_codes
                .iter()
                .map(|c| (format!("feeder:{feeder_type}"), c.as_str())),
        );
    }
    codes
}
