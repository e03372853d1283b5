use crate::error::WiretapError;
use http::Method;
use regex::Regex;

/// One compiled segment of a path glob.
#[derive(Debug, Clone)]
enum Segment {
    /// `**`: any number of segments, including none.
    AnyDepth,
    /// Exact, case-sensitive text.
    Literal(String),
    /// A segment containing `*`; each `*` matches non-slash characters.
    Wildcard(Regex),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == "**" {
            Segment::AnyDepth
        } else if raw.contains('*') {
            let body = raw
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join("[^/]*");
            // Escaped literals joined by a character class always compile.
            match Regex::new(&format!("^{body}$")) {
                Ok(re) => Segment::Wildcard(re),
                Err(_) => Segment::Literal(raw.to_string()),
            }
        } else {
            Segment::Literal(raw.to_string())
        }
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::AnyDepth => true,
            Segment::Literal(lit) => lit == segment,
            Segment::Wildcard(re) => re.is_match(segment),
        }
    }
}

/// A compiled glob over URL paths (`/api/**`, `/*.html`, `/users/*/avatar`).
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, WiretapError> {
        if pattern.is_empty() {
            return Err(WiretapError::invalid_pattern(pattern, "pattern is empty"));
        }
        if !pattern.starts_with('/') {
            return Err(WiretapError::invalid_pattern(pattern, "pattern must start with '/'"));
        }
        let segments = split_path(pattern).map(Segment::parse).collect();
        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match a request path (no query string) against this glob.
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split_path(path).collect();
        match_segments(&self.segments, &parts)
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((head, tail)) => segment.matches(head) && match_segments(rest, tail),
            None => false,
        },
    }
}

/// A route that must never be logged: optional method plus path glob.
#[derive(Debug, Clone)]
pub struct ExclusionRule {
    /// `None` matches every method.
    pub method: Option<Method>,
    pub pattern: PathPattern,
}

impl ExclusionRule {
    pub fn new(method: Option<Method>, pattern: &str) -> Result<Self, WiretapError> {
        Ok(Self {
            method,
            pattern: PathPattern::parse(pattern)?,
        })
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().is_none_or(|m| m == method) && self.pattern.matches(path)
    }
}

/// Does `rule` cover this method and path?
pub fn matches(method: &Method, path: &str, rule: &ExclusionRule) -> bool {
    rule.matches(method, path)
}

/// First rule (in declaration order) covering the exchange, if any.
pub fn first_match<'a>(
    rules: &'a [ExclusionRule],
    method: &Method,
    path: &str,
) -> Option<&'a ExclusionRule> {
    rules.iter().find(|rule| rule.matches(method, path))
}
