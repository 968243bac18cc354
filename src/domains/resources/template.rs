//! Resource path templates.
//!
//! A template such as `/:resourceType/:handle?` is compiled once and matched
//! against the part of a resource URI that follows the configured root.
//! Supported segments: literal text, `:name`, `{name}` and a trailing
//! optional `:name?`. Parameter values are percent-encoded when rendered and
//! decoded when matched.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::collections::BTreeMap;
use std::fmt;

use super::error::ResourceError;

/// Parameters matched from a resource URI, keyed by segment name.
pub type ReadResourceParams = BTreeMap<String, String>;

/// Bytes that cannot appear raw inside one path segment of a URI.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, optional: bool },
}

/// Compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a template.
    pub fn parse(template: &str) -> Result<Self, ResourceError> {
        let invalid = |reason: &str| ResourceError::invalid_template(template, reason);

        let body = template
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;
        let body = body.strip_suffix('/').unwrap_or(body);
        if body.is_empty() {
            return Err(invalid("has no segments"));
        }

        let raw: Vec<&str> = body.split('/').collect();
        let mut segments = Vec::with_capacity(raw.len());
        for (i, part) in raw.iter().enumerate() {
            let segment = parse_segment(part).ok_or_else(|| invalid("has an empty segment"))?;
            if let Segment::Param { name, optional } = &segment {
                if *optional && i + 1 != raw.len() {
                    return Err(invalid("optional segments must come last"));
                }
                if segments
                    .iter()
                    .any(|s| matches!(s, Segment::Param { name: n, .. } if n == name))
                {
                    return Err(invalid("repeats a parameter name"));
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Whether the template binds a parameter called `name`.
    pub fn has_param(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Param { name: n, .. } if n == name))
    }

    /// Match a path against the whole template.
    ///
    /// A single trailing `/` on the path is tolerated. Parameter values come
    /// back percent-decoded; a value that does not decode to UTF-8 never matches.
    pub fn matches(&self, path: &str) -> Option<ReadResourceParams> {
        let body = path.strip_prefix('/')?;
        let body = body.strip_suffix('/').unwrap_or(body);
        let parts: Vec<&str> = if body.is_empty() {
            Vec::new()
        } else {
            body.split('/').collect()
        };
        let mut parts = parts.into_iter();

        let mut params = ReadResourceParams::new();
        for segment in &self.segments {
            let part = parts.next();
            match (segment, part) {
                (Segment::Literal(lit), Some(part)) if lit == part => {}
                (Segment::Param { name, .. }, Some(part)) if !part.is_empty() => {
                    let value = percent_decode_str(part).decode_utf8().ok()?;
                    params.insert(name.clone(), value.into_owned());
                }
                (Segment::Param { optional: true, .. }, None) => {}
                _ => return None,
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }

    /// Build a path from parameters; the inverse of [`PathTemplate::matches`].
    ///
    /// Returns `None` when a required parameter is missing or empty.
    pub fn render(&self, params: &ReadResourceParams) -> Option<String> {
        let mut path = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => {
                    path.push('/');
                    path.push_str(lit);
                }
                Segment::Param { name, optional } => {
                    match params.get(name).filter(|v| !v.is_empty()) {
                        Some(value) => {
                            path.push('/');
                            path.extend(utf8_percent_encode(value, SEGMENT));
                        }
                        None if *optional => break,
                        None => return None,
                    }
                }
            }
        }
        Some(path)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segment(part: &str) -> Option<Segment> {
    if part.is_empty() {
        return None;
    }
    if let Some(rest) = part.strip_prefix(':') {
        let (name, optional) = match rest.strip_suffix('?') {
            Some(name) => (name, true),
            None => (rest, false),
        };
        return valid_name(name).then(|| Segment::Param {
            name: name.to_string(),
            optional,
        });
    }
    if let Some(name) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
        return valid_name(name).then(|| Segment::Param {
            name: name.to_string(),
            optional: false,
        });
    }
    Some(Segment::Literal(part.to_string()))
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ReadResourceParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_template() {
        let template = PathTemplate::parse("/:resourceType/:handle?").unwrap();
        assert!(template.has_param("resourceType"));
        assert_eq!(
            template.matches("/files/report.txt"),
            Some(params(&[("resourceType", "files"), ("handle", "report.txt")]))
        );
        assert_eq!(
            template.matches("/files"),
            Some(params(&[("resourceType", "files")]))
        );
        assert_eq!(
            template.matches("/files/"),
            Some(params(&[("resourceType", "files")]))
        );
    }

    #[test]
    fn test_rejects_extra_or_missing_segments() {
        let template = PathTemplate::parse("/:resourceType/:handle").unwrap();
        assert_eq!(template.matches("/files"), None);
        assert_eq!(template.matches("/files/a/b"), None);
        assert_eq!(template.matches("files/a"), None);
        assert_eq!(template.matches("//a"), None);
    }

    #[test]
    fn test_literals_and_braces() {
        let template = PathTemplate::parse("/v1/{resourceType}/items/:id").unwrap();
        assert_eq!(
            template.matches("/v1/db/items/7"),
            Some(params(&[("resourceType", "db"), ("id", "7")]))
        );
        assert_eq!(template.matches("/v2/db/items/7"), None);
    }

    #[test]
    fn test_render() {
        let template = PathTemplate::parse("/:resourceType/:handle?").unwrap();
        assert_eq!(
            template.render(&params(&[("resourceType", "files"), ("handle", "a.txt")])),
            Some("/files/a.txt".to_string())
        );
        assert_eq!(
            template.render(&params(&[("resourceType", "files")])),
            Some("/files".to_string())
        );
        assert_eq!(template.render(&params(&[("handle", "a.txt")])), None);
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let template = PathTemplate::parse("/:resourceType/:handle?").unwrap();
        for name in ["my notes.txt", "what?.md", "issue #4", "100%", "a/b"] {
            let path = template
                .render(&params(&[("resourceType", "files"), ("handle", name)]))
                .unwrap();
            assert!(!path[1..].contains(['?', '#', ' ']), "unencoded path {path}");
            assert_eq!(path.matches('/').count(), 2);
            assert_eq!(
                template.matches(&path),
                Some(params(&[("resourceType", "files"), ("handle", name)]))
            );
        }
        assert_eq!(
            template.render(&params(&[("resourceType", "files"), ("handle", "my notes.txt")])),
            Some("/files/my%20notes.txt".to_string())
        );
    }

    #[test]
    fn test_undecodable_value_does_not_match() {
        let template = PathTemplate::parse("/:resourceType/:handle").unwrap();
        assert_eq!(template.matches("/files/%FF%FE"), None);
    }

    #[test]
    fn test_invalid_templates() {
        assert!(PathTemplate::parse("no-slash").is_err());
        assert!(PathTemplate::parse("/").is_err());
        assert!(PathTemplate::parse("/:a?/:b").is_err());
        assert!(PathTemplate::parse("/:a/:a").is_err());
        assert!(PathTemplate::parse("/a//b").is_err());
        assert!(PathTemplate::parse("/:").is_err());
    }
}
