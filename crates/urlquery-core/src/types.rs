//! Flat pairs and the grouped tree the decoder rebuilds values from.

use std::collections::BTreeMap;

use crate::config::KeyStyle;
use crate::path;

/// One `(key, value)` pair before escaping (encode) or after unescaping (decode).
pub type EncodedPair = (String, String);

/// Wire pairs grouped by shared key prefix.
///
/// Each node may carry a leaf value (from a key ending at this node) and any
/// number of children (from keys continuing past it). A node's children are
/// its groups: for `a[0]=x&a[1]=y&b=z` the root has groups `a` and `b`, and
/// `a` has groups `0` and `1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryNode {
    value: Option<String>,
    children: BTreeMap<String, QueryNode>,
}

impl QueryNode {
    /// Group pairs, splitting keys with `style`. A repeated key keeps its last value.
    pub fn from_pairs<I, K, V>(pairs: I, style: KeyStyle) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut root = QueryNode::default();
        for (key, value) in pairs {
            root.insert(&path::split(key.as_ref(), style), value.into());
        }
        root
    }

    fn insert(&mut self, segments: &[&str], value: String) {
        let node = segments.iter().fold(self, |node, segment| {
            node.children.entry((*segment).to_string()).or_default()
        });
        node.value = Some(value);
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn child(&self, segment: &str) -> Option<&QueryNode> {
        self.children.get(segment)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &QueryNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_prefix() {
        let root = QueryNode::from_pairs(
            [("a[0]", "x"), ("a[1]", "y"), ("b", "z")],
            KeyStyle::Bracket,
        );
        let a = root.child("a").unwrap();
        assert_eq!(a.children().map(|(k, _)| k).collect::<Vec<_>>(), ["0", "1"]);
        assert_eq!(a.child("1").and_then(QueryNode::value), Some("y"));
        assert_eq!(root.child("b").and_then(QueryNode::value), Some("z"));
    }

    #[test]
    fn last_duplicate_wins() {
        let root = QueryNode::from_pairs([("k", "1"), ("k", "2")], KeyStyle::Dot);
        assert_eq!(root.child("k").and_then(QueryNode::value), Some("2"));
    }
}
