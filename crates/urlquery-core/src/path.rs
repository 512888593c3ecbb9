//! Key paths — turning the chain of ancestors of a leaf into one flat key,
//! and splitting a flat key back into segments.

use std::fmt;

use crate::config::KeyStyle;

/// One step from a parent value to a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A record field's resolved name.
    Name(String),
    /// A zero-based sequence position.
    Index(usize),
    /// A scalar-formatted map key.
    MapKey(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Name(s) | PathSegment::MapKey(s) => f.write_str(s),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Placeholder used in error messages for a value with no key.
pub(crate) const ROOT: &str = "<root>";

/// Render a root-to-leaf path into a single key.
///
/// A one-segment path renders as the bare segment. An empty path renders as
/// the empty string.
pub fn render<I>(segments: I, style: KeyStyle) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    use fmt::Write;

    let mut key = String::new();
    for (i, segment) in segments.into_iter().enumerate() {
        // Writing into a String cannot fail.
        let _ = match (i, style) {
            (0, _) => write!(key, "{segment}"),
            (_, KeyStyle::Bracket) => write!(key, "[{segment}]"),
            (_, KeyStyle::Dot) => write!(key, ".{segment}"),
        };
    }
    key
}

/// Like [`render`], but an empty path reads `<root>`.
pub(crate) fn describe<I>(segments: I, style: KeyStyle) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    let key = render(segments, style);
    if key.is_empty() {
        ROOT.to_string()
    } else {
        key
    }
}

/// Split a flat key into its segments.
///
/// In bracket style a key that is not of the form `head[a][b]...` is kept as
/// one literal segment.
pub fn split(key: &str, style: KeyStyle) -> Vec<&str> {
    match style {
        KeyStyle::Dot => key.split('.').collect(),
        KeyStyle::Bracket => split_brackets(key).unwrap_or_else(|| vec![key]),
    }
}

fn split_brackets(key: &str) -> Option<Vec<&str>> {
    let Some(open) = key.find('[') else {
        return Some(vec![key]);
    };
    if open == 0 {
        return None;
    }

    let mut segments = vec![&key[..open]];
    let mut rest = &key[open..];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        let segment = &inner[..close];
        if segment.contains('[') {
            return None;
        }
        segments.push(segment);
        rest = &inner[close + 1..];
    }
    Some(segments)
}
