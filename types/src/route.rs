//! Normalized route paths.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An absolute, normalized route path.
///
/// Normalization strips the query string and fragment, collapses repeated
/// slashes, resolves `.` and `..`, and drops the trailing slash. The root is
/// always `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoutePath(String);

impl RoutePath {
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let path = raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default();

        let mut parts: Vec<&str> = Vec::new();
        for part in path.split('/') {
            match part.trim() {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                part => parts.push(part),
            }
        }

        if parts.is_empty() {
            Self::root()
        } else {
            Self(format!("/{}", parts.join("/")))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path components, root excluded.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|part| !part.is_empty())
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.components().count()
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let cut = self.0.rfind('/').unwrap_or(0);
        Some(Self::parse(&self.0[..cut]))
    }

    #[must_use]
    pub fn join(&self, child: &str) -> Self {
        Self::parse(&format!("{}/{child}", self.0))
    }

    /// Every prefix of this path from the root down to the path itself.
    ///
    /// `/reports/q3` yields `/`, `/reports`, `/reports/q3`.
    #[must_use]
    pub fn lineage(&self) -> Vec<Self> {
        let mut lineage = vec![Self::root()];
        let mut current = Self::root();
        for part in self.components() {
            current = current.join(part);
            lineage.push(current.clone());
        }
        lineage
    }
}

impl Default for RoutePath {
    fn default() -> Self {
        Self::root()
    }
}

impl From<String> for RoutePath {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for RoutePath {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<RoutePath> for String {
    fn from(value: RoutePath) -> Self {
        value.0
    }
}

impl AsRef<str> for RoutePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_slashes_and_dots() {
        assert_eq!(RoutePath::parse("").as_str(), "/");
        assert_eq!(RoutePath::parse("reports//q3/").as_str(), "/reports/q3");
        assert_eq!(RoutePath::parse("/a/./b/../c").as_str(), "/a/c");
        assert_eq!(RoutePath::parse("/../..").as_str(), "/");
    }

    #[test]
    fn parse_strips_query_and_fragment() {
        assert_eq!(RoutePath::parse("/search?q=rust#top").as_str(), "/search");
        assert_eq!(RoutePath::parse("/#anchor").as_str(), "/");
    }

    #[test]
    fn parent_walks_toward_root() {
        let path = RoutePath::parse("/reports/q3");
        assert_eq!(path.parent(), Some(RoutePath::parse("/reports")));
        assert_eq!(RoutePath::parse("/reports").parent(), Some(RoutePath::root()));
        assert_eq!(RoutePath::root().parent(), None);
    }

    #[test]
    fn lineage_includes_root_and_self() {
        let lineage: Vec<String> = RoutePath::parse("/reports/q3")
            .lineage()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(lineage, ["/", "/reports", "/reports/q3"]);
        assert_eq!(RoutePath::root().lineage().len(), 1);
    }

    #[test]
    fn serde_normalizes_on_deserialize() {
        let path: RoutePath = serde_json::from_str("\"settings/\"").expect("deserialize");
        assert_eq!(path.as_str(), "/settings");
        assert_eq!(serde_json::to_string(&path).expect("serialize"), "\"/settings\"");
    }
}
