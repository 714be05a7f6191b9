//! `{param}` patterns for sub-router routes.

use regex::Regex;

use crate::request::PathParams;

/// A compiled sub-router path pattern.
///
/// `{name}` captures one segment, `{*name}` captures the rest of the path.
/// Names must be identifiers; anything else in braces is matched literally.
/// A single trailing slash on the request path is tolerated.
///
/// ```
/// use oxide_http::PathPattern;
///
/// let pattern = PathPattern::new("/posts/{id}/files/{*rest}");
/// let params = pattern.match_path("/posts/7/files/a/b.txt").unwrap();
/// assert_eq!(params.get("id"), Some("7"));
/// assert_eq!(params.get("rest"), Some("a/b.txt"));
/// assert!(pattern.match_path("/posts/7").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
}

impl PathPattern {
    /// Compiles `pattern`.
    pub fn new(pattern: &str) -> Self {
        let mut seen = Vec::new();
        let body: String = pattern
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| format!("/{}", segment_regex(segment, &mut seen)))
            .collect();
        let regex_str = format!("^{body}/?$");

        // Every segment is escaped or a uniquely named identifier group.
        let regex = Regex::new(&regex_str).expect("generated path regex is valid");

        Self {
            source: pattern.to_string(),
            regex,
        }
    }

    /// Matches `path`, returning the captured parameters.
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;
        let mut params = PathParams::new();
        for name in self.regex.capture_names().flatten() {
            if let Some(value) = caps.name(name) {
                params.insert(name, value.as_str());
            }
        }
        Some(params)
    }

    /// The pattern as written.
    pub fn pattern(&self) -> &str {
        &self.source
    }
}

fn segment_regex<'a>(segment: &'a str, seen: &mut Vec<&'a str>) -> String {
    let param = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}'));
    let Some(param) = param else {
        return regex::escape(segment);
    };
    let (name, capture) = match param.strip_prefix('*') {
        Some(rest) => (rest, ".+"),
        None => (param, "[^/]+"),
    };
    if !is_identifier(name) {
        return regex::escape(segment);
    }
    if seen.contains(&name) {
        return format!("(?:{capture})");
    }
    seen.push(name);
    format!("(?P<{name}>{capture})")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
