use crate::graph::EntityKind;
use std::collections::BTreeSet;

/// Entity types the caller asked to leave out of the graph.
///
/// Tags are compared lower-cased. Unknown tags are kept as-is; they never
/// match a produced type, so a typo in `--ignore` is harmless.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    tags: BTreeSet<String>,
}

impl ExclusionFilter {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tags }
    }

    /// Parse a comma-delimited list such as `"disk,NIC"`.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn excluded(&self, kind: &str) -> bool {
        self.tags.contains(&kind.to_lowercase())
    }

    pub fn excludes(&self, kind: EntityKind) -> bool {
        self.excluded(kind.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tags that match no entity type (most likely typos).
    pub fn unknown_tags(&self) -> Vec<&str> {
        self.tags
            .iter()
            .map(String::as_str)
            .filter(|t| !EntityKind::ALL.iter().any(|k| k.as_str() == *t))
            .collect()
    }
}
