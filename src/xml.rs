use crate::{Error, Result};
use roxmltree::Node;
use std::fmt::Display;
use std::str::FromStr;

/// XML namespace of all elements defined by the E57 standard.
pub const E57_NAMESPACE: &str = "http://www.astm.org/COMMIT/E57/2010-e57-v1.0";

/// Builds the path of a child element for error messages.
pub fn child_path(path: &str, name: &str) -> String {
    if path.ends_with('/') {
        format!("{path}{name}")
    } else {
        format!("{path}/{name}")
    }
}

/// Returns the element name and the namespace prefix of extension elements.
/// Elements of the E57 namespace have no prefix.
pub fn qualified_name(node: &Node, path: &str) -> Result<(String, Option<String>)> {
    let name = node.tag_name().name().to_string();
    match node.tag_name().namespace() {
        Some(E57_NAMESPACE) => Ok((name, None)),
        Some(uri) => {
            let prefix = node.lookup_prefix(uri).unwrap_or_default().to_string();
            Ok((name, Some(prefix)))
        }
        None => Error::mismatch(
            &child_path(path, &name),
            format!("element in namespace {E57_NAMESPACE}"),
            "element without namespace",
        ),
    }
}

/// Returns the value of the mandatory `type` attribute.
pub fn type_attribute<'a>(node: &Node<'a, '_>, path: &str) -> Result<&'a str> {
    match node.attribute("type") {
        Some(t) => Ok(t),
        None => Error::missing(path, "@type"),
    }
}

/// Parses an optional attribute into the requested type.
pub fn optional_attribute<T>(node: &Node, path: &str, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match node.attribute(name) {
        Some(str) => match str.trim().parse::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(err) => Error::invalid(format!(
                "Cannot parse attribute '{name}' with value '{str}' of '{path}': {err}"
            )),
        },
        None => Ok(None),
    }
}

/// Parses a mandatory attribute into the requested type.
pub fn required_attribute<T>(node: &Node, path: &str, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match optional_attribute(node, path, name)? {
        Some(value) => Ok(value),
        None => Error::missing(path, &format!("@{name}")),
    }
}

/// Returns the concatenated text and CDATA content of an element.
pub fn text_content(node: &Node) -> String {
    node.children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Parses the text content of an element into a number.
/// Missing or empty text is interpreted as the given default value.
pub fn parse_text<T>(node: &Node, path: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let text = text_content(node);
    let text = text.trim();
    if text.is_empty() {
        return Ok(default);
    }
    text.parse::<T>().or_else(|err| {
        Error::invalid(format!(
            "Cannot parse value '{text}' of '{path}': {err}"
        ))
    })
}
