use crate::error::CabinetError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Addresses one node of a content document, from the root down.
///
/// The textual form joins segments with dots: `hero.items.1`. A segment of
/// ASCII digits is an array index. Keys that would be ambiguous (empty, made
/// of digits, or containing `.`, `[`, `]` or `"`) are written in brackets
/// as a JSON string: `stats.["2024"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditPath(Vec<PathSegment>);

impl EditPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Follows the path through `doc`.
    pub fn resolve<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .try_fold(doc, |node, segment| match (segment, node) {
                (PathSegment::Key(k), Value::Object(map)) => map.get(k),
                (PathSegment::Index(i), Value::Array(items)) => items.get(*i),
                _ => None,
            })
    }
}

impl From<Vec<PathSegment>> for EditPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl<const N: usize> From<[PathSegment; N]> for EditPath {
    fn from(segments: [PathSegment; N]) -> Self {
        Self(segments.to_vec())
    }
}

fn needs_brackets(key: &str) -> bool {
    key.is_empty()
        || key.bytes().all(|b| b.is_ascii_digit())
        || key.contains(['.', '[', ']', '"'])
}

impl fmt::Display for EditPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                PathSegment::Index(n) => write!(f, "{}", n)?,
                PathSegment::Key(k) if needs_brackets(k) => {
                    write!(f, "[{}]", Value::String(k.clone()))?
                }
                PathSegment::Key(k) => f.write_str(k)?,
            }
        }
        Ok(())
    }
}

impl FromStr for EditPath {
    type Err = CabinetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| CabinetError::Precondition(format!("bad path '{}': {}", s, why));

        let mut segments = Vec::new();
        if s.is_empty() {
            return Ok(Self(segments));
        }

        let mut rest = s;
        loop {
            let (segment, tail) = if let Some(bracketed) = rest.strip_prefix('[') {
                let end = closing_bracket(bracketed).ok_or_else(|| invalid("unclosed '['"))?;
                let key: String = serde_json::from_str(&bracketed[..end])
                    .map_err(|_| invalid("bracketed key must be a JSON string"))?;
                (PathSegment::Key(key), &bracketed[end + 1..])
            } else {
                let end = rest.find('.').unwrap_or(rest.len());
                let raw = &rest[..end];
                if raw.is_empty() {
                    return Err(invalid("empty segment"));
                }
                let segment = if raw.bytes().all(|b| b.is_ascii_digit()) {
                    PathSegment::Index(raw.parse().map_err(|_| invalid("index too large"))?)
                } else {
                    PathSegment::Key(raw.to_string())
                };
                (segment, &rest[end..])
            };
            segments.push(segment);

            if tail.is_empty() {
                break;
            }
            rest = tail
                .strip_prefix('.')
                .ok_or_else(|| invalid("expected '.' between segments"))?;
        }
        Ok(Self(segments))
    }
}

/// Byte offset of the `]` closing a bracketed JSON string.
fn closing_bracket(s: &str) -> Option<usize> {
    if !s.starts_with('"') {
        return None;
    }
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return s[i + 1..].starts_with(']').then_some(i + 1),
            _ => {}
        }
    }
    None
}
