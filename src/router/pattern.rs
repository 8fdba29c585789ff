use fnv::FnvBuildHasher;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::iter::Filter;
use std::str::{FromStr, Split};

/// Splits a path string into individual segments, filtering out empty segments.
///
/// # Parameters
/// - `path`: Path string to split (e.g., "/api/v1/users", "/health")
///
/// # Returns
/// An iterator over non-empty path segments. Leading and trailing slashes are
/// ignored, and consecutive slashes are treated as a single separator.
pub fn split_path(path: &str) -> Filter<Split<'_, char>, fn(&&str) -> bool> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Represents a segment in a route template.
///
/// # Behavior
/// - `Static` segments must match the request segment exactly
/// - `Param` segments match any single segment and bind it under their name
/// - `Wildcard` segments match any single segment without binding a name
#[derive(Debug, Eq, PartialEq, Hash, Clone)]
pub enum Segment {
    /// A static path segment containing literal text that must match exactly.
    Static(String),

    /// A named parameter segment, written `:name` in templates.
    ///
    /// # Behavior
    /// Matches exactly one path segment and binds its value under `name`.
    Param(String),

    /// A wildcard segment, written `*` in templates.
    ///
    /// # Behavior
    /// Matches exactly one path segment, not multiple segments or empty
    /// segments, and binds nothing.
    Wildcard,
}

impl Segment {
    fn parse(token: &str) -> Self {
        if token == "*" {
            return Segment::Wildcard;
        }
        match token.strip_prefix(':') {
            Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
            _ => Segment::Static(token.to_string()),
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Static(s) => write!(f, "{}", s),
            Segment::Param(name) => write!(f, ":{}", name),
            Segment::Wildcard => write!(f, "*"),
        }
    }
}

impl FromStr for Segment {
    type Err = Infallible;

    /// Parses a template token into a segment.
    ///
    /// # Returns
    /// `*` becomes `Wildcard`, `:name` becomes `Param("name")`, anything else
    /// (including a bare `:`) becomes a `Static` segment. This operation is
    /// infallible.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Segment::parse(s))
    }
}

/// Parameters bound by a successful match.
pub type BoundParams = HashMap<String, String, FnvBuildHasher>;

/// The result of matching a pattern against a request path.
#[derive(Debug)]
pub struct PatternMatch<'p> {
    /// Values captured by `Param` segments.
    pub params: BoundParams,
    /// The actual request segments the pattern consumed, in order.
    pub consumed: Vec<&'p str>,
    /// Request segments left over after the pattern was exhausted. Empty for
    /// an exact match; prefix-match callers pass this on as the nested path.
    pub remainder: Vec<&'p str>,
}

impl PatternMatch<'_> {
    pub fn is_exact(&self) -> bool {
        self.remainder.is_empty()
    }
}

/// A compiled route template.
///
/// Compilation is pure and happens once at registration time, never per
/// request. No ranking or specificity sorting exists anywhere: the first
/// registered process whose pattern matches wins, which is why registration
/// order is load-bearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    template: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compiles a route template into its ordered segment list.
    ///
    /// # Parameters
    /// - `template`: Route template (e.g., "/users/:id", "/files/*", "/health")
    ///
    /// # Behavior
    /// Splits on `/`, drops empty tokens, and classifies each remaining token.
    /// Compiling the same template twice yields patterns that match an
    /// identical set of paths with identical bindings.
    pub fn compile(template: impl AsRef<str>) -> Self {
        let template = template.as_ref();
        let segments = split_path(template).map(Segment::parse).collect();
        Self {
            template: template.to_string(),
            segments,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Matches this pattern against the segments of a request path.
    ///
    /// # Returns
    /// `None` if a static segment differs or the path runs out before the
    /// pattern does. Otherwise the bound parameters plus the consumed and
    /// leftover request segments. Callers requiring an exact match must
    /// additionally check [`PatternMatch::is_exact`].
    pub fn matches<'p>(&self, path: &[&'p str]) -> Option<PatternMatch<'p>> {
        if path.len() < self.segments.len() {
            return None;
        }
        let mut params = BoundParams::default();
        for (segment, actual) in self.segments.iter().zip(path.iter()) {
            match segment {
                Segment::Static(literal) => {
                    if literal != actual {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), (*actual).to_string());
                }
                Segment::Wildcard => {}
            }
        }
        Some(PatternMatch {
            params,
            consumed: path[..self.segments.len()].to_vec(),
            remainder: path[self.segments.len()..].to_vec(),
        })
    }
}

impl Display for RoutePattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(path: &str) -> Vec<&str> {
        split_path(path).collect()
    }

    #[test]
    fn test_segment_classification() {
        let pattern = RoutePattern::compile("/users/:id/files/*");
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Static(String::from("users")),
                Segment::Param(String::from("id")),
                Segment::Static(String::from("files")),
                Segment::Wildcard,
            ]
        );
    }

    #[test]
    fn test_bare_colon_is_static() {
        let pattern = RoutePattern::compile("/a/:");
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Static(String::from("a")),
                Segment::Static(String::from(":")),
            ]
        );
    }

    #[test]
    fn test_exact_match_binds_params() {
        let pattern = RoutePattern::compile("/users/:id");
        let matched = pattern.matches(&segments("/users/42")).unwrap();
        assert!(matched.is_exact());
        assert_eq!(matched.params.get("id").map(String::as_str), Some("42"));
        assert_eq!(matched.consumed, vec!["users", "42"]);
    }

    #[test]
    fn test_static_mismatch_fails() {
        let pattern = RoutePattern::compile("/users/:id");
        assert!(pattern.matches(&segments("/orders/42")).is_none());
    }

    #[test]
    fn test_path_exhausted_before_pattern_fails() {
        let pattern = RoutePattern::compile("/users/:id/files");
        assert!(pattern.matches(&segments("/users/42")).is_none());
    }

    #[test]
    fn test_prefix_match_yields_remainder() {
        let pattern = RoutePattern::compile("/api");
        let matched = pattern.matches(&segments("/api/users/42")).unwrap();
        assert!(!matched.is_exact());
        assert_eq!(matched.consumed, vec!["api"]);
        assert_eq!(matched.remainder, vec!["users", "42"]);
    }

    #[test]
    fn test_wildcard_matches_one_segment_without_binding() {
        let pattern = RoutePattern::compile("/files/*");
        let matched = pattern.matches(&segments("/files/report.txt")).unwrap();
        assert!(matched.params.is_empty());
        assert!(matched.is_exact());

        // One segment only: deeper paths leave a remainder.
        let deeper = pattern.matches(&segments("/files/a/b")).unwrap();
        assert_eq!(deeper.remainder, vec!["b"]);
    }

    #[test]
    fn test_empty_pattern_matches_everything_as_remainder() {
        let pattern = RoutePattern::compile("/");
        let matched = pattern.matches(&segments("/users/42")).unwrap();
        assert!(matched.consumed.is_empty());
        assert_eq!(matched.remainder, vec!["users", "42"]);

        let root = pattern.matches(&segments("/")).unwrap();
        assert!(root.is_exact());
    }

    #[test]
    fn test_idempotent_compilation() {
        let first = RoutePattern::compile("/users/:id/posts/*");
        let second = RoutePattern::compile("/users/:id/posts/*");
        assert_eq!(first, second);

        let paths = ["/users/1/posts/2", "/users/1/posts", "/users/1/posts/2/3"];
        for path in paths {
            let lhs = first.matches(&segments(path)).map(|m| (m.params, m.remainder));
            let rhs = second.matches(&segments(path)).map(|m| (m.params, m.remainder));
            assert_eq!(lhs, rhs);
        }
    }
}
