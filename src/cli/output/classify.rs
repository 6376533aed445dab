use std::collections::HashSet;

/// Productivity category of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Productive,
    Unproductive,
    Neutral,
}

/// The two configured membership sets. A domain in neither is neutral. The
/// productive set is checked first, so a domain accidentally configured into
/// both resolves to productive.
#[derive(Debug, Clone)]
pub struct ClassificationSets {
    productive: HashSet<String>,
    unproductive: HashSet<String>,
}

impl ClassificationSets {
    pub fn new(
        productive: impl IntoIterator<Item = String>,
        unproductive: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            productive: productive.into_iter().collect(),
            unproductive: unproductive.into_iter().collect(),
        }
    }

    /// Expects the same normalized form used during tracking, no
    /// normalization happens here.
    pub fn classify(&self, domain: &str) -> Category {
        if self.productive.contains(domain) {
            Category::Productive
        } else if self.unproductive.contains(domain) {
            Category::Unproductive
        } else {
            Category::Neutral
        }
    }
}
