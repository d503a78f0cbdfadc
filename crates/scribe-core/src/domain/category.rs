use serde::{Deserialize, Serialize};

/// Categories offered when none are configured.
pub const DEFAULT_CATEGORIES: [&str; 6] = ["React", "CSS", "JavaScript", "Node.js", "Design", "Tutorial"];

/// Fixed set of category names a post may belong to.
///
/// Read-only once the store is built. Not derived from the posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryList(Vec<String>);

impl CategoryList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            let name = name.trim();
            if !name.is_empty() && !list.iter().any(|n| n == name) {
                list.push(name.to_string());
            }
        }
        Self(list)
    }

    /// Parse a comma-separated list, e.g. from configuration.
    pub fn from_csv(input: &str) -> Self {
        Self::new(input.split(','))
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Canonical spelling of `name`, matched case-insensitively.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let wanted = name.to_lowercase();
        self.0
            .iter()
            .find(|n| n.to_lowercase() == wanted)
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CategoryList {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES)
    }
}
