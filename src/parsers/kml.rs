use roxmltree::{Document, Node};
use serde_json::{Map, Value};

use crate::core::error::ParseError;

const ATTRIBUTES_KEY: &str = "$";
const TEXT_KEY: &str = "_";

/// Parse KML into a generic markup tree.
///
/// The root element becomes `{name: node}`. A node with only text is that
/// text; otherwise it is an object holding attributes under `$`, non-blank
/// text under `_`, and one array per child element name. Names keep their
/// namespace prefix and `xmlns` declarations sit with the attributes. No
/// geometry is extracted.
pub fn parse(bytes: &[u8]) -> Result<Value, ParseError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ParseError::InvalidXml(format!("not UTF-8: {}", e)))?;
    let document = Document::parse(text).map_err(|e| ParseError::InvalidXml(e.to_string()))?;

    let root = document.root_element();
    let mut tree = Map::new();
    let root_name = qualified_name(root, root.tag_name().name(), root.tag_name().namespace());
    tree.insert(root_name, element_to_value(root));
    Ok(Value::Object(tree))
}

/// `prefix:local` as written in the document, or just `local`
fn qualified_name(node: Node, local: &str, namespace: Option<&str>) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}

/// Namespace declarations made on this element rather than inherited
fn declared_namespaces(node: Node) -> Vec<(String, String)> {
    let inherited = |prefix: Option<&str>, uri: &str| {
        node.parent_element().is_some_and(|parent| {
            parent
                .namespaces()
                .any(|ns| ns.name() == prefix && ns.uri() == uri)
        })
    };

    node.namespaces()
        .filter(|ns| !inherited(ns.name(), ns.uri()))
        .filter(|ns| ns.name() != Some("xml"))
        .map(|ns| {
            let key = match ns.name() {
                Some(prefix) => format!("xmlns:{}", prefix),
                None => "xmlns".to_string(),
            };
            (key, ns.uri().to_string())
        })
        .collect()
}

fn element_to_value(node: Node) -> Value {
    let mut attributes = Map::new();
    for (key, uri) in declared_namespaces(node) {
        attributes.insert(key, Value::String(uri));
    }
    for attr in node.attributes() {
        attributes.insert(
            qualified_name(node, attr.name(), attr.namespace()),
            Value::String(attr.value().to_string()),
        );
    }

    let mut text = String::new();
    let mut children: Map<String, Value> = Map::new();

    for child in node.children() {
        if child.is_element() {
            let name = qualified_name(child, child.tag_name().name(), child.tag_name().namespace());
            let entry = children
                .entry(name)
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(element_to_value(child));
            }
        } else if child.is_text() {
            if let Some(t) = child.text() {
                text.push_str(t);
            }
        }
    }

    let has_text = !text.trim().is_empty();

    if attributes.is_empty() && children.is_empty() {
        return if has_text {
            Value::String(text)
        } else {
            Value::String(String::new())
        };
    }

    let mut object = Map::new();
    if !attributes.is_empty() {
        object.insert(ATTRIBUTES_KEY.to_string(), Value::Object(attributes));
    }
    if has_text {
        object.insert(TEXT_KEY.to_string(), Value::String(text));
    }
    object.extend(children);
    Value::Object(object)
}
