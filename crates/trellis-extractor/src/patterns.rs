//! Compiled phrase matchers for the pattern library

use crate::config::PatternRule;
use regex::Regex;
use trellis_domain::{RelationshipType, Result, TrellisError};

/// One occurrence of a relationship phrase inside an observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatch<'t> {
    /// The phrase exactly as written in the observation
    pub phrase: &'t str,

    /// Byte offset where the phrase starts
    pub start: usize,

    /// Text following the phrase, where the object slot is resolved
    pub object_text: &'t str,
}

/// Matcher for the phrases of a single relationship type
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    relationship_type: RelationshipType,
    regex: Regex,
}

impl PhraseMatcher {
    /// Compile a rule into a matcher
    ///
    /// # Errors
    /// `InvalidInput` if the generated expression fails to compile
    pub fn compile(rule: &PatternRule) -> Result<Self> {
        let alternatives: Vec<String> = rule
            .phrases
            .iter()
            .map(|phrase| {
                let body = phrase
                    .split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+");
                let starts_with_word = phrase
                    .trim_start()
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_');
                if starts_with_word {
                    format!(r"\b{}", body)
                } else {
                    body
                }
            })
            .collect();

        // the trailing whitespace both ends the phrase and opens the object slot
        let pattern = format!(r"(?i)({})\s+", alternatives.join("|"));

        let regex = Regex::new(&pattern).map_err(|e| {
            TrellisError::InvalidInput(format!(
                "Invalid pattern for {}: {}",
                rule.relationship_type, e
            ))
        })?;

        Ok(Self {
            relationship_type: rule.relationship_type,
            regex,
        })
    }

    /// Relationship type this matcher indicates
    pub fn relationship_type(&self) -> RelationshipType {
        self.relationship_type
    }

    /// Every phrase occurrence in `text`, left to right
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<PhraseMatch<'t>> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let phrase = caps.get(1)?;
                Some(PhraseMatch {
                    phrase: phrase.as_str(),
                    start: whole.start(),
                    object_text: &text[whole.end()..],
                })
            })
            .collect()
    }
}

/// The compiled pattern library: a mapping from type to matcher
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    matchers: Vec<PhraseMatcher>,
}

impl PatternLibrary {
    /// Compile every rule
    pub fn compile(rules: &[PatternRule]) -> Result<Self> {
        let matchers = rules
            .iter()
            .map(PhraseMatcher::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { matchers })
    }

    /// All matchers in rule order
    pub fn matchers(&self) -> &[PhraseMatcher] {
        &self.matchers
    }

    /// The matcher for a relationship type
    pub fn matcher(&self, relationship_type: RelationshipType) -> Option<&PhraseMatcher> {
        self.matchers
            .iter()
            .find(|m| m.relationship_type == relationship_type)
    }

    /// Every (type, match) in `text`, ordered by position then rule order
    pub fn scan<'t>(&self, text: &'t str) -> Vec<(RelationshipType, PhraseMatch<'t>)> {
        let mut found: Vec<(RelationshipType, PhraseMatch<'t>)> = self
            .matchers
            .iter()
            .flat_map(|m| {
                m.find_all(text)
                    .into_iter()
                    .map(move |hit| (m.relationship_type, hit))
            })
            .collect();
        // stable: equal offsets keep rule order
        found.sort_by_key(|(_, hit)| hit.start);
        found
    }
}
