//! Resolution of object-slot text to known entities

use trellis_domain::{Entity, EntityId};

/// Articles that may precede an entity name in the object slot
const ARTICLES: &[&str] = &["the", "an", "a"];

/// Lookup of known entity names, longest name first
#[derive(Debug, Clone)]
pub struct NameIndex<'e> {
    names: Vec<(&'e str, String, &'e EntityId)>,
}

impl<'e> NameIndex<'e> {
    /// Index the display names of `entities`
    ///
    /// Entities with blank names are not resolvable.
    pub fn new(entities: &'e [Entity]) -> Self {
        let mut names: Vec<(&'e str, String, &'e EntityId)> = entities
            .iter()
            .map(|e| (e.name.trim(), e.name.trim().to_lowercase(), &e.id))
            .filter(|(name, _, _)| !name.is_empty())
            .collect();

        // longest first so "pytest-cov" wins over "pytest"; ties break on id
        names.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.2.cmp(b.2)));

        Self { names }
    }

    /// Number of resolvable names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no names are resolvable
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve the entity named at the start of `text`
    ///
    /// An exact match is preferred over a case-insensitive one. The name must
    /// end on a word boundary. If nothing matches, one leading article is
    /// skipped and resolution is tried again.
    pub fn resolve(&self, text: &str) -> Option<&'e EntityId> {
        if let Some(id) = self.resolve_at(text) {
            return Some(id);
        }

        let (first, rest) = text.split_once(char::is_whitespace)?;
        if ARTICLES.iter().any(|a| first.eq_ignore_ascii_case(a)) {
            return self.resolve_at(rest.trim_start());
        }
        None
    }

    fn resolve_at(&self, text: &str) -> Option<&'e EntityId> {
        let exact = self
            .names
            .iter()
            .find(|(name, _, _)| text.starts_with(name) && ends_on_boundary(text, name.len()));
        if let Some((_, _, id)) = exact {
            return Some(id);
        }

        self.names
            .iter()
            .find(|(name, lower, _)| {
                text.get(..name.len())
                    .is_some_and(|head| head.to_lowercase() == *lower)
                    && ends_on_boundary(text, name.len())
            })
            .map(|(_, _, id)| *id)
    }
}

/// Whether the character after `len` bytes does not continue a name
fn ends_on_boundary(text: &str, len: usize) -> bool {
    match text.get(len..).and_then(|rest| rest.chars().next()) {
        None => true,
        Some(c) => !(c.is_alphanumeric() || c == '-' || c == '_'),
    }
}
