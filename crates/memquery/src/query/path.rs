//! Attribute path normalization and parsing.
//!
//! Grammar: `segment ("." segment)*` where a segment is an identifier
//! (`[A-Za-z_][A-Za-z0-9_]*`) optionally followed by an empty `()`.
//! Leading alias segments naming the root object (`process.`, `regkey.`, ...)
//! are stripped first; see [`normalize`].

use crate::query::error::{QueryError, QueryResult};
use crate::query::object::RootKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    /// Written with a trailing `()`.
    pub call: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
    raw: String,
    segments: Vec<Segment>,
}

/// Strip leading `<alias>.` prefixes for `kind`.
///
/// Repeats until no alias prefix is left, so `normalize(normalize(p)) ==
/// normalize(p)`. Alias names are never properties of any object kind.
pub fn normalize(raw: &str, kind: RootKind) -> &str {
    let mut rest = raw.trim();
    'strip: loop {
        for alias in kind.aliases() {
            if let Some(tail) = rest
                .strip_prefix(*alias)
                .and_then(|t| t.strip_prefix('.'))
            {
                rest = tail;
                continue 'strip;
            }
        }
        return rest;
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_segment(raw_path: &str, text: &str) -> QueryResult<Segment> {
    let (name, call) = match text.find('(') {
        None => (text, false),
        Some(open) => {
            if &text[open..] != "()" {
                return Err(QueryError::invalid_attribute(
                    raw_path,
                    format!("'{}': only zero-argument calls are allowed", text),
                ));
            }
            (&text[..open], true)
        }
    };

    if name.is_empty() {
        return Err(QueryError::invalid_attribute(raw_path, "empty path segment"));
    }
    if !is_identifier(name) {
        return Err(QueryError::invalid_attribute(
            raw_path,
            format!("'{}' is not a valid attribute name", name),
        ));
    }

    Ok(Segment {
        name: name.to_string(),
        call,
    })
}

impl AttributePath {
    /// Normalize `raw` for `kind` and split it into segments.
    pub fn parse(raw: &str, kind: RootKind) -> QueryResult<Self> {
        let normalized = normalize(raw, kind);
        if normalized.is_empty() {
            return Err(QueryError::invalid_attribute(raw, "attribute path is empty"));
        }

        let segments = normalized
            .split('.')
            .map(|s| parse_segment(raw, s))
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(AttributePath {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The caller-supplied string.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}
