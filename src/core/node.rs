//! Untyped view of the provider's tag-encoded arrays.
//!
//! Definition text arrives as nested `[tag, payload]` pairs mixed with objects, e.g.
//! `[["text", "{bc}to fasten"], ["vis", [{"t": "anchor the boat"}]]]`. [`Node`] mirrors that
//! tree and the walker functions pull labeled strings out of it.

use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(Leaf),
    List(Vec<Node>),
    Map(BTreeMap<String, Node>),
}

impl Node {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Leaf(Leaf::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    /// `Some(payload)` when this node is a `[tag, payload, ..]` sequence opening with `tag`.
    fn tagged(&self, tag: &str) -> Option<&Node> {
        match self.as_list()? {
            [first, payload, ..] if first.as_text() == Some(tag) => Some(payload),
            _ => None,
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Leaf(Leaf::Null),
            Value::Bool(b) => Node::Leaf(Leaf::Bool(b)),
            Value::Number(n) => Node::Leaf(Leaf::Number(n)),
            Value::String(s) => Node::Leaf(Leaf::Text(s)),
            Value::Array(items) => Node::List(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => Node::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

/// Depth-first, leftmost-first search for the string paired with `label`.
///
/// A sequence whose first two elements are `label` and a string yields that string; a mapping
/// entry keyed by `label` with a string value yields the value. An empty payload is
/// indistinguishable from a missing one: both come back as `None`, and an empty match inside a
/// container does not stop the search of later siblings.
pub fn extract_labeled_text<'a>(node: &'a Node, label: &str) -> Option<&'a str> {
    match node {
        Node::List(items) => {
            if let [first, Node::Leaf(Leaf::Text(payload)), ..] = items.as_slice() {
                if first.as_text() == Some(label) {
                    return non_empty(payload);
                }
            }
            items
                .iter()
                .find_map(|item| extract_labeled_text(item, label))
        }
        Node::Map(map) => {
            // At most one subtree carries the label in well-formed input, so key order is moot.
            for (key, value) in map {
                if key == label {
                    if let Some(text) = value.as_text() {
                        return non_empty(text);
                    }
                }
                if let Some(text) = extract_labeled_text(value, label) {
                    return Some(text);
                }
            }
            None
        }
        Node::Leaf(_) => None,
    }
}

/// Collects the `label` text of every `[tag, ..]` element of `items`, in source order.
///
/// Matching elements whose text is absent contribute an empty string so counts line up with
/// the source; elements with other tags are skipped.
pub fn extract_all_tagged(items: &[Node], tag: &str, label: &str) -> Vec<String> {
    items
        .iter()
        .filter(|item| item.tagged(tag).is_some())
        .map(|item| {
            extract_labeled_text(item, label)
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

fn non_empty(text: &str) -> Option<&str> {
    (!text.is_empty()).then_some(text)
}
