use std::collections::BTreeMap;

use crate::value::{ErrorObject, ObjectKind, ObjectRef, Value};

pub const FUNCTION_MARKER: &str = "[Function]";
pub const PENDING_MARKER: &str = "[Promise]";
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Owned structural copy of a value, ready to render.
/// Callables, pending values and cycles are already reduced to markers.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(String),
    Array {
        elements: Vec<Node>,
        /// Named (non-index) array properties, sorted by name.
        named: BTreeMap<String, Node>,
    },
    /// Keys are kept sorted so the rendered output is stable.
    Record(BTreeMap<String, Node>),
}

/// Render any value as a deterministic, human-readable string.
///
/// Objects print as `{ a: 1, b: 2 }` with keys sorted, arrays as `[ 1, 2 ]`.
/// With `show_hidden`, non-enumerable properties and everything reachable
/// through the prototype chain are included as well.
///
/// `Null` and `Undefined` are returned unchanged as `None`.
pub fn print(value: &Value, show_hidden: bool) -> Option<String> {
    let value = value.to_primitive();
    if value.is_nullish() {
        return None;
    }
    let mut path = Vec::new();
    Some(render(&snapshot(&value, show_hidden, &mut path)))
}

/// Build the structural copy of `value`. `path` holds the identities of the
/// objects currently being copied; meeting one of them again is a cycle.
pub fn snapshot(value: &Value, show_hidden: bool, path: &mut Vec<usize>) -> Node {
    match value.to_primitive() {
        Value::Object(object) => snapshot_object(&object, show_hidden, path),
        Value::Function(_) => Node::Leaf(FUNCTION_MARKER.to_string()),
        Value::Pending => Node::Leaf(PENDING_MARKER.to_string()),
        Value::Error(error) => snapshot_error(&error, show_hidden),
        other => Node::Leaf(other.to_string()),
    }
}

fn snapshot_object(object: &ObjectRef, show_hidden: bool, path: &mut Vec<usize>) -> Node {
    let id = object.id();
    if path.contains(&id) {
        return Node::Leaf(CIRCULAR_MARKER.to_string());
    }
    path.push(id);

    // Clone out of the borrow before recursing into children.
    let (kind, elements) = {
        let inner = object.borrow();
        (inner.kind, inner.elements.clone())
    };

    let mut named = BTreeMap::new();
    for (name, value) in visible_properties(object, show_hidden) {
        if !named.contains_key(&name) {
            let node = snapshot(&value, show_hidden, path);
            named.insert(name, node);
        }
    }

    let node = match kind {
        ObjectKind::Plain => Node::Record(named),
        ObjectKind::Array => Node::Array {
            elements: elements
                .iter()
                .map(|element| snapshot(element, show_hidden, path))
                .collect(),
            named,
        },
    };

    path.pop();
    node
}

/// Own enumerable properties; with `show_hidden`, every own property followed
/// by those inherited along the prototype chain. Nearer definitions win.
fn visible_properties(object: &ObjectRef, show_hidden: bool) -> Vec<(String, Value)> {
    let mut seen: Vec<(String, Value)> = Vec::new();
    let mut chain = Vec::new();
    let mut current = Some(object.clone());
    while let Some(level) = current {
        if chain.contains(&level.id()) {
            break;
        }
        chain.push(level.id());
        let inner = level.borrow();
        for property in &inner.properties {
            if !(show_hidden || property.enumerable) {
                continue;
            }
            if seen.iter().any(|(name, _)| *name == property.name) {
                continue;
            }
            seen.push((property.name.clone(), property.value.clone()));
        }
        if !show_hidden {
            break;
        }
        current = inner.prototype.clone();
    }
    seen
}

/// Errors print as a record of their own fields; the name is inherited and
/// only shows with hidden properties.
fn snapshot_error(error: &ErrorObject, show_hidden: bool) -> Node {
    let mut fields = BTreeMap::new();
    fields.insert("message".to_string(), Node::Leaf(error.message.clone()));
    if let Some(stack) = &error.stack {
        fields.insert("stack".to_string(), Node::Leaf(stack.clone()));
    }
    if show_hidden {
        fields.insert("name".to_string(), Node::Leaf(error.name.clone()));
    }
    Node::Record(fields)
}

pub fn render(node: &Node) -> String {
    match node {
        Node::Leaf(text) => text.clone(),
        Node::Record(fields) => {
            let entries: Vec<String> = fields
                .iter()
                .map(|(name, value)| format!("{}: {}", name, render(value)))
                .collect();
            wrap('{', &entries, '}')
        }
        Node::Array { elements, named } => {
            let entries: Vec<String> = elements
                .iter()
                .map(render)
                .chain(
                    named
                        .iter()
                        .map(|(name, value)| format!("{}: {}", name, render(value))),
                )
                .collect();
            wrap('[', &entries, ']')
        }
    }
}

fn wrap(open: char, entries: &[String], close: char) -> String {
    if entries.is_empty() {
        format!("{}{}", open, close)
    } else {
        format!("{} {} {}", open, entries.join(", "), close)
    }
}
