//! Form description for an arbitrary content document.
//!
//! [`render`] walks the document and produces a [`FormNode`] tree: a group per
//! object, a bordered section per array element and one control per leaf.
//! Clients draw the tree however they like; each control carries the
//! [`EditPath`] an edit to it should target.

use super::path::{EditPath, PathSegment};
use serde::Serialize;
use serde_json::Value;

/// Strings longer than this many characters get a multi-line editor.
pub const TEXTAREA_THRESHOLD: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    SingleLine,
    MultiLine,
    Number,
    Checkbox,
    /// An empty single-line input standing in for `null`.
    Null,
}

impl Control {
    pub fn for_leaf(value: &Value) -> Option<Control> {
        match value {
            Value::String(s) if s.chars().count() > TEXTAREA_THRESHOLD => Some(Control::MultiLine),
            Value::String(_) => Some(Control::SingleLine),
            Value::Number(_) => Some(Control::Number),
            Value::Bool(_) => Some(Control::Checkbox),
            Value::Null => Some(Control::Null),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormNode {
    Field {
        label: String,
        path: EditPath,
        control: Control,
        value: Value,
    },
    Group {
        label: String,
        path: EditPath,
        children: Vec<FormNode>,
    },
    List {
        label: String,
        path: EditPath,
        items: Vec<FormNode>,
    },
}

impl FormNode {
    pub fn path(&self) -> &EditPath {
        match self {
            FormNode::Field { path, .. } | FormNode::Group { path, .. } | FormNode::List { path, .. } => path,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FormNode::Field { label, .. } | FormNode::Group { label, .. } | FormNode::List { label, .. } => {
                label
            }
        }
    }

    /// All leaf controls in document order.
    pub fn fields(&self) -> Vec<&FormNode> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a FormNode>) {
        match self {
            FormNode::Field { .. } => out.push(self),
            FormNode::Group { children, .. } => children.iter().for_each(|c| c.collect_fields(out)),
            FormNode::List { items, .. } => items.iter().for_each(|c| c.collect_fields(out)),
        }
    }

    pub fn find(&self, path: &EditPath) -> Option<&FormNode> {
        if self.path() == path {
            return Some(self);
        }
        match self {
            FormNode::Field { .. } => None,
            FormNode::Group { children, .. } => children.iter().find_map(|c| c.find(path)),
            FormNode::List { items, .. } => items.iter().find_map(|c| c.find(path)),
        }
    }
}

fn label_for(path: &EditPath) -> String {
    match path.last() {
        None => String::new(),
        Some(PathSegment::Key(k)) => k.clone(),
        Some(PathSegment::Index(i)) => format!("#{}", i + 1),
    }
}

/// Builds the form for `doc`. There is no depth limit.
pub fn render(doc: &Value) -> FormNode {
    render_at(doc, EditPath::root())
}

fn render_at(node: &Value, path: EditPath) -> FormNode {
    let label = label_for(&path);
    match node {
        Value::Object(map) => FormNode::Group {
            children: map
                .iter()
                .map(|(k, v)| render_at(v, path.child(k.as_str())))
                .collect(),
            label,
            path,
        },
        Value::Array(items) => FormNode::List {
            items: items
                .iter()
                .enumerate()
                .map(|(i, v)| render_at(v, path.child(i)))
                .collect(),
            label,
            path,
        },
        leaf => FormNode::Field {
            control: Control::for_leaf(leaf).unwrap_or(Control::SingleLine),
            value: leaf.clone(),
            label,
            path,
        },
    }
}
