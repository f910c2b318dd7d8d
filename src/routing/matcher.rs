//! Route matching logic.
//!
//! # Responsibilities
//! - Parse path patterns (literal, `{param}` templates, `/**` wildcard)
//! - Match a concrete path and extract path parameters
//! - Describe the HTTP methods a route accepts
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Trailing slashes are ignored (`/example/` matches `/example`)
//! - No regex to guarantee O(n) matching

use std::collections::HashMap;

use axum::http::Method;

use crate::routing::RouteError;

/// Path parameters captured by a template pattern.
pub type PathParams = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Exact path, e.g. `/example`.
    Literal(String),
    /// Segments with `{name}` placeholders, e.g. `/things/{id}`.
    Template(Vec<TemplateSegment>),
    /// Everything under a prefix, e.g. `/static/**`. `/**` alone matches all paths.
    Wildcard(String),
}

/// One segment of a template pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSegment(Segment);

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

impl PathPattern {
    /// Compile a pattern string.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        if let Some(prefix) = pattern.strip_suffix("/**") {
            if prefix.contains('*') || prefix.contains('{') {
                return Err(invalid("wildcard prefix must be a literal path"));
            }
            return Ok(PathPattern::Wildcard(prefix.trim_end_matches('/').to_string()));
        }
        if pattern.contains('*') {
            return Err(invalid("'**' is only allowed as the final segment"));
        }

        let path = normalize(pattern);
        if !path.contains('{') {
            return Ok(PathPattern::Literal(path.to_string()));
        }

        let mut segments = Vec::new();
        for raw in path.split('/').skip(1) {
            if let Some(name) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(invalid("malformed path parameter"));
                }
                segments.push(TemplateSegment(Segment::Param(name.to_string())));
            } else if raw.contains(['{', '}']) {
                return Err(invalid("path parameters must span a whole segment"));
            } else {
                segments.push(TemplateSegment(Segment::Literal(raw.to_string())));
            }
        }
        Ok(PathPattern::Template(segments))
    }

    /// Match a request path, returning captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let path = normalize(path);
        match self {
            PathPattern::Literal(literal) => (literal == path).then(PathParams::new),
            PathPattern::Wildcard(prefix) => {
                let hit = prefix.is_empty()
                    || path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'));
                hit.then(PathParams::new)
            }
            PathPattern::Template(segments) => {
                let parts: Vec<&str> = path.split('/').skip(1).collect();
                if parts.len() != segments.len() {
                    return None;
                }
                let mut params = PathParams::new();
                for (segment, part) in segments.iter().zip(parts) {
                    match &segment.0 {
                        Segment::Literal(lit) if lit == part => {}
                        Segment::Literal(_) => return None,
                        Segment::Param(_) if part.is_empty() => return None,
                        Segment::Param(name) => {
                            params.insert(name.clone(), part.to_string());
                        }
                    }
                }
                Some(params)
            }
        }
    }

    /// Canonical form used for conflict detection: parameter names erased.
    pub fn canonical(&self) -> String {
        match self {
            PathPattern::Literal(literal) => literal.clone(),
            PathPattern::Wildcard(prefix) => format!("{}/**", prefix),
            PathPattern::Template(segments) => segments
                .iter()
                .map(|s| match &s.0 {
                    Segment::Literal(lit) => format!("/{}", lit),
                    Segment::Param(_) => "/{}".to_string(),
                })
                .collect(),
        }
    }

    /// Ordering key: lower sorts first and wins when several patterns match.
    pub(crate) fn specificity(&self) -> (u8, usize) {
        match self {
            PathPattern::Literal(_) => (0, 0),
            PathPattern::Template(segments) => {
                let params = segments
                    .iter()
                    .filter(|s| matches!(s.0, Segment::Param(_)))
                    .count();
                (1, params)
            }
            // Longer prefixes are more specific.
            PathPattern::Wildcard(prefix) => (2, usize::MAX - prefix.len()),
        }
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathPattern::Template(segments) => {
                for s in segments {
                    match &s.0 {
                        Segment::Literal(lit) => write!(f, "/{}", lit)?,
                        Segment::Param(name) => write!(f, "/{{{}}}", name)?,
                    }
                }
                Ok(())
            }
            other => f.write_str(&other.canonical()),
        }
    }
}

/// HTTP methods a route accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSet {
    /// Any method not claimed by a more specific route on the same pattern.
    All,
    Only(Vec<Method>),
}

impl MethodSet {
    pub fn only(methods: impl IntoIterator<Item = Method>) -> Self {
        let mut unique: Vec<Method> = Vec::new();
        for method in methods {
            if !unique.contains(&method) {
                unique.push(method);
            }
        }
        MethodSet::Only(unique)
    }

    pub fn contains(&self, method: &Method) -> bool {
        match self {
            MethodSet::All => true,
            MethodSet::Only(methods) => methods.contains(method),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, MethodSet::All)
    }

    /// Two sets on the same pattern conflict when this returns true.
    ///
    /// `All` coexists with explicit sets; only two `All` sets, or two
    /// explicit sets sharing a method, overlap.
    pub fn overlaps(&self, other: &MethodSet) -> bool {
        match (self, other) {
            (MethodSet::All, MethodSet::All) => true,
            (MethodSet::Only(a), MethodSet::Only(b)) => a.iter().any(|m| b.contains(m)),
            _ => false,
        }
    }
}

impl std::fmt::Display for MethodSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodSet::All => f.write_str("ALL"),
            MethodSet::Only(methods) => {
                let names: Vec<_> = methods.iter().map(Method::as_str).collect();
                f.write_str(&names.join("|"))
            }
        }
    }
}

/// A path pattern plus the methods it accepts.
#[derive(Debug, Clone)]
pub struct Matcher {
    pub pattern: PathPattern,
    pub methods: MethodSet,
}

impl Matcher {
    /// Match `pattern` for every method.
    pub fn match_all_methods(pattern: &str) -> Result<Self, RouteError> {
        Ok(Self {
            pattern: PathPattern::parse(pattern)?,
            methods: MethodSet::All,
        })
    }

    /// Match `pattern` for the given methods only.
    pub fn match_methods(
        pattern: &str,
        methods: impl IntoIterator<Item = Method>,
    ) -> Result<Self, RouteError> {
        Ok(Self {
            pattern: PathPattern::parse(pattern)?,
            methods: MethodSet::only(methods),
        })
    }
}

impl std::fmt::Display for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.methods, self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_pattern() {
        let pattern = PathPattern::parse("/example").unwrap();
        assert!(pattern.matches("/example").is_some());
        assert!(pattern.matches("/example/").is_some());
        assert!(pattern.matches("/Example").is_none()); // Case sensitive
        assert!(pattern.matches("/example/more").is_none());
    }

    #[test]
    fn test_template_pattern_extracts_params() {
        let pattern = PathPattern::parse("/things/{id}/parts/{part}").unwrap();
        let params = pattern.matches("/things/42/parts/wheel").unwrap();
        assert_eq!(params["id"], "42");
        assert_eq!(params["part"], "wheel");
        assert!(pattern.matches("/things/42/parts").is_none());
    }

    #[test]
    fn test_wildcard_pattern() {
        let pattern = PathPattern::parse("/static/**").unwrap();
        assert!(pattern.matches("/static").is_some());
        assert!(pattern.matches("/static/css/site.css").is_some());
        assert!(pattern.matches("/staticfiles").is_none());

        let everything = PathPattern::parse("/**").unwrap();
        assert!(everything.matches("/anything/at/all").is_some());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(PathPattern::parse("example").is_err());
        assert!(PathPattern::parse("/a/**/b").is_err());
        assert!(PathPattern::parse("/a/x{id}").is_err());
        assert!(PathPattern::parse("/a/{}").is_err());
    }

    #[test]
    fn test_canonical_ignores_param_names() {
        let a = PathPattern::parse("/things/{id}").unwrap();
        let b = PathPattern::parse("/things/{name}").unwrap();
        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a.to_string(), "/things/{id}");
    }

    #[test]
    fn test_method_set_overlap() {
        let get = MethodSet::only([Method::GET]);
        let get_post = MethodSet::only([Method::GET, Method::POST]);
        let put = MethodSet::only([Method::PUT]);

        assert!(get.overlaps(&get_post));
        assert!(!get.overlaps(&put));
        assert!(!get.overlaps(&MethodSet::All));
        assert!(MethodSet::All.overlaps(&MethodSet::All));
    }
}
