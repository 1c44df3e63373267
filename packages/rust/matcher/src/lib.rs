//! Region, classification-code, and keyword matching for tender records.
//!
//! This crate provides:
//! - [`rules`]: compiles configured classification codes into [`Rule`]s
//! - [`Matcher`]: evaluates one feed row against regions, rules, and keywords
//!
//! A row matches only if it passes the region gate and at least one code rule
//! or keyword fires.

pub mod rules;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use tenderwatch_shared::{MatchProvenance, MatchSource, PipelineConfig, RawRecord, fields};

pub use rules::{MatchKind, Rule, compile_rules, normalize_code};

/// Digit runs that look like classification codes.
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4,8}").expect("valid code regex"));

/// A configured term alongside its lower-cased form.
#[derive(Debug, Clone)]
struct Term {
    original: String,
    lowered: String,
}

impl Term {
    fn new(original: &str) -> Self {
        Self {
            original: original.to_string(),
            lowered: original.to_lowercase(),
        }
    }
}

/// Evaluates feed rows against a compiled configuration.
///
/// Built once per run; holds no per-row state.
#[derive(Debug, Clone)]
pub struct Matcher {
    regions: Vec<Term>,
    rules: Vec<Rule>,
    keywords: BTreeMap<String, Vec<Term>>,
}

impl Matcher {
    /// Compile rules and keyword lists from the pipeline configuration.
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_rules(config, compile_rules(config))
    }

    /// Use an already compiled rule set.
    pub fn with_rules(config: &PipelineConfig, rules: Vec<Rule>) -> Self {
        let regions = config.regions().into_iter().map(Term::new).collect();
        let keywords = config
            .keyword_map()
            .into_iter()
            .map(|(industry, words)| {
                (
                    industry.to_string(),
                    words.into_iter().map(Term::new).collect(),
                )
            })
            .collect();

        Self {
            regions,
            rules,
            keywords,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate one row. Returns the match provenance, or `None` if the row
    /// fails the region gate or has no code/keyword hit.
    pub fn evaluate(&self, record: &RawRecord) -> Option<MatchProvenance> {
        let regions = self.match_regions(record);
        if regions.is_empty() {
            return None;
        }

        let codes = extract_codes(record.get(fields::UNSPSC));
        let code_hits = self.match_codes(&codes);
        let keyword_hits = self.match_keywords(record);

        if code_hits.is_empty() && keyword_hits.is_empty() {
            return None;
        }

        let mut provenance = MatchProvenance {
            regions,
            ..MatchProvenance::default()
        };

        if !code_hits.is_empty() {
            provenance.sources.insert(MatchSource::ClassificationCode);
            for rule in &code_hits {
                provenance.industries.insert(rule.industry.clone());
                provenance.codes.insert(rule.code.clone());
                provenance.categories.insert(rule.category_label());
            }
        }

        if !keyword_hits.is_empty() {
            provenance.sources.insert(MatchSource::Keyword);
            for (industry, keywords) in keyword_hits {
                provenance.industries.insert(industry);
                provenance.keywords.extend(keywords);
            }
        }

        debug!(
            reference = record.get(fields::REFERENCE_NUMBER),
            industries = provenance.industries.len(),
            sources = provenance.sources.len(),
            "row matched"
        );

        Some(provenance)
    }

    /// Configured regions found in the row's region fields (case-insensitive).
    pub fn match_regions(&self, record: &RawRecord) -> BTreeSet<String> {
        let haystack = record.joined(fields::REGION_COLUMNS).to_lowercase();
        self.regions
            .iter()
            .filter(|region| haystack.contains(&region.lowered))
            .map(|region| region.original.clone())
            .collect()
    }

    /// Rules satisfied by any of `codes`.
    pub fn match_codes(&self, codes: &[&str]) -> Vec<&Rule> {
        if codes.is_empty() {
            return Vec::new();
        }
        self.rules.iter().filter(|rule| rule.matches(codes)).collect()
    }

    /// Industry → keywords found in the row's titles and descriptions.
    pub fn match_keywords(&self, record: &RawRecord) -> BTreeMap<String, BTreeSet<String>> {
        let haystack = record.joined(fields::TEXT_COLUMNS).to_lowercase();
        let mut hits: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for (industry, keywords) in &self.keywords {
            for keyword in keywords {
                if haystack.contains(&keyword.lowered) {
                    hits.entry(industry.clone())
                        .or_default()
                        .insert(keyword.original.clone());
                }
            }
        }

        hits
    }
}

/// All 4–8 digit runs in a classification-code field, left to right.
pub fn extract_codes(value: &str) -> Vec<&str> {
    CODE_RE.find_iter(value).map(|m| m.as_str()).collect()
}
