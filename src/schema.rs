//! Typed accessors for the children of an E57 structure element.
//!
//! Missing required children and children with an unexpected type are
//! reported with the full path of the element inside the XML document.

use crate::element::{CompressedVector, Element, Structure, Vector};
use crate::{Blob, Error, Result};
use std::fmt::Display;

pub(crate) fn optional_string(s: &Structure, name: &str) -> Result<Option<String>> {
    match s.get(name) {
        Some(Element::String(value)) => Ok(Some(value.clone())),
        Some(other) => Error::mismatch(&s.path_of(name), "type String", other.type_name()),
        None => Ok(None),
    }
}

pub(crate) fn required_string(s: &Structure, name: &str) -> Result<String> {
    match optional_string(s, name)? {
        Some(value) => Ok(value),
        None => Error::missing(&s.path, name),
    }
}

/// Numeric children of all three number types are accepted.
/// Scaled integers are converted with their scale and offset.
pub(crate) fn optional_double(s: &Structure, name: &str) -> Result<Option<f64>> {
    match s.get(name) {
        Some(Element::Float { value, .. }) => Ok(Some(*value)),
        Some(Element::Integer { value, .. }) => Ok(Some(*value as f64)),
        Some(Element::ScaledInteger {
            value,
            scale,
            offset,
            ..
        }) => Ok(Some(*value as f64 * scale + offset)),
        Some(other) => Error::mismatch(&s.path_of(name), "numeric type", other.type_name()),
        None => Ok(None),
    }
}

pub(crate) fn required_double(s: &Structure, name: &str) -> Result<f64> {
    match optional_double(s, name)? {
        Some(value) => Ok(value),
        None => Error::missing(&s.path, name),
    }
}

pub(crate) fn optional_integer(s: &Structure, name: &str) -> Result<Option<i64>> {
    match s.get(name) {
        Some(Element::Integer { value, .. }) => Ok(Some(*value)),
        Some(other) => Error::mismatch(&s.path_of(name), "type Integer", other.type_name()),
        None => Ok(None),
    }
}

pub(crate) fn required_integer(s: &Structure, name: &str) -> Result<i64> {
    match optional_integer(s, name)? {
        Some(value) => Ok(value),
        None => Error::missing(&s.path, name),
    }
}

pub(crate) fn optional_structure<'a>(s: &'a Structure, name: &str) -> Result<Option<&'a Structure>> {
    match s.get(name) {
        Some(Element::Structure(value)) => Ok(Some(value)),
        Some(other) => Error::mismatch(&s.path_of(name), "type Structure", other.type_name()),
        None => Ok(None),
    }
}

pub(crate) fn required_structure<'a>(s: &'a Structure, name: &str) -> Result<&'a Structure> {
    match optional_structure(s, name)? {
        Some(value) => Ok(value),
        None => Error::missing(&s.path, name),
    }
}

pub(crate) fn optional_vector<'a>(s: &'a Structure, name: &str) -> Result<Option<&'a Vector>> {
    match s.get(name) {
        Some(Element::Vector(value)) => Ok(Some(value)),
        Some(other) => Error::mismatch(&s.path_of(name), "type Vector", other.type_name()),
        None => Ok(None),
    }
}

pub(crate) fn required_vector<'a>(s: &'a Structure, name: &str) -> Result<&'a Vector> {
    match optional_vector(s, name)? {
        Some(value) => Ok(value),
        None => Error::missing(&s.path, name),
    }
}

pub(crate) fn required_compressed_vector<'a>(
    s: &'a Structure,
    name: &str,
) -> Result<&'a CompressedVector> {
    match s.get(name) {
        Some(Element::CompressedVector(value)) => Ok(value),
        Some(other) => Error::mismatch(
            &s.path_of(name),
            "type CompressedVector",
            other.type_name(),
        ),
        None => Error::missing(&s.path, name),
    }
}

pub(crate) fn optional_blob(s: &Structure, name: &str) -> Result<Option<Blob>> {
    match s.get(name) {
        Some(Element::Blob(value)) => Ok(Some(value.clone())),
        Some(other) => Error::mismatch(&s.path_of(name), "type Blob", other.type_name()),
        None => Ok(None),
    }
}

/// Returns all children of a vector that are structures.
pub(crate) fn structure_children(v: &Vector) -> Result<Vec<&Structure>> {
    v.children
        .iter()
        .enumerate()
        .map(|(i, c)| match c {
            Element::Structure(s) => Ok(s),
            other => Error::mismatch(
                &format!("{}/{i}", v.path),
                "type Structure",
                other.type_name(),
            ),
        })
        .collect()
}

/// Returns all children of a vector that must be strings.
pub(crate) fn string_children(v: &Vector) -> Result<Vec<String>> {
    v.children
        .iter()
        .enumerate()
        .map(|(i, c)| match c {
            Element::String(s) => Ok(s.clone()),
            other => Error::mismatch(&format!("{}/{i}", v.path), "type String", other.type_name()),
        })
        .collect()
}

/// Fails if a present value is below the lower bound.
pub(crate) fn check_at_least<T>(s: &Structure, name: &str, value: Option<T>, bound: T) -> Result<()>
where
    T: PartialOrd + Display,
{
    match value {
        Some(v) if v < bound => Error::constraint(s.path_of(name), format!(">= {bound}"), v),
        _ => Ok(()),
    }
}

/// Fails if a present value is not above the lower bound.
pub(crate) fn check_above<T>(s: &Structure, name: &str, value: Option<T>, bound: T) -> Result<()>
where
    T: PartialOrd + Display,
{
    match value {
        Some(v) if v <= bound => Error::constraint(s.path_of(name), format!("> {bound}"), v),
        _ => Ok(()),
    }
}

/// Fails if a present value is outside of the inclusive range.
pub(crate) fn check_within<T>(
    s: &Structure,
    name: &str,
    value: Option<T>,
    min: T,
    max: T,
) -> Result<()>
where
    T: PartialOrd + Display,
{
    match value {
        Some(v) if v < min || v > max => {
            Error::constraint(s.path_of(name), format!("in range [{min}, {max}]"), v)
        }
        _ => Ok(()),
    }
}

/// Fails if both values are present and the maximum is below the minimum.
pub(crate) fn check_ordered<T>(
    s: &Structure,
    max_name: &str,
    min: Option<T>,
    max: Option<T>,
) -> Result<()>
where
    T: PartialOrd + Display,
{
    match (min, max) {
        (Some(min), Some(max)) if max < min => {
            Error::constraint(s.path_of(max_name), format!(">= {min}"), max)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::element::parse_element;
    use crate::element::{Element, Structure};
    use crate::xml::E57_NAMESPACE;
    use roxmltree::Document;
    use std::io::Cursor;

    /// Parses a structure element without any binary sections.
    pub fn structure(path: &str, inner: &str) -> Structure {
        let xml = format!("<s type=\"Structure\" xmlns=\"{E57_NAMESPACE}\">{inner}</s>");
        let doc = Document::parse(&xml).unwrap();
        let mut reader = Cursor::new(Vec::new());
        match parse_element(&doc.root_element(), path, &mut reader).unwrap() {
            Element::Structure(s) => s,
            other => panic!("Unexpected element {other:?}"),
        }
    }
}
