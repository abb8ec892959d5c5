use crate::cv_section::CompressedVectorSectionHeader;
use crate::xml::{
    child_path, optional_attribute, parse_text, qualified_name, required_attribute,
    text_content, type_attribute, E57_NAMESPACE,
};
use crate::{Blob, Error, Extension, Result};
use roxmltree::{Document, Node};
use std::io::{Read, Seek};

const MAX_FILE_OFFSET: u64 = i64::MAX as u64;

/// Storage precision of floating point values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatPrecision {
    Single,
    Double,
}

/// A single node of the generic E57 element tree.
#[derive(Clone, Debug)]
pub enum Element {
    Integer {
        value: i64,
        min: i64,
        max: i64,
    },
    ScaledInteger {
        value: i64,
        min: i64,
        max: i64,
        scale: f64,
        offset: f64,
    },
    Float {
        value: f64,
        precision: FloatPrecision,
        min: f64,
        max: f64,
    },
    String(String),
    Blob(Blob),
    Structure(Structure),
    Vector(Vector),
    CompressedVector(CompressedVector),
}

impl Element {
    /// Name of the element type as used in the XML `type` attribute.
    pub fn type_name(&self) -> &'static str {
        match self {
            Element::Integer { .. } => "Integer",
            Element::ScaledInteger { .. } => "ScaledInteger",
            Element::Float { .. } => "Float",
            Element::String(_) => "String",
            Element::Blob(_) => "Blob",
            Element::Structure(_) => "Structure",
            Element::Vector(_) => "Vector",
            Element::CompressedVector(_) => "CompressedVector",
        }
    }

    /// Checks if two elements have the same type and for structures also the same fields.
    pub fn same_shape(&self, other: &Element) -> bool {
        match (self, other) {
            (Element::Structure(a), Element::Structure(b)) => {
                a.fields.len() == b.fields.len()
                    && a.fields.iter().zip(&b.fields).all(|(fa, fb)| {
                        fa.name == fb.name
                            && fa.namespace == fb.namespace
                            && fa.element.same_shape(&fb.element)
                    })
            }
            (
                Element::Float { precision: a, .. },
                Element::Float { precision: b, .. },
            ) => a == b,
            _ => self.type_name() == other.type_name(),
        }
    }
}

/// Named child of a structure.
#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    /// Namespace prefix for elements defined by extensions.
    pub namespace: Option<String>,
    pub element: Element,
}

/// Ordered collection of named child elements.
#[derive(Clone, Debug)]
pub struct Structure {
    /// Location of the structure inside the XML document.
    pub path: String,
    pub fields: Vec<Field>,
}

impl Structure {
    /// Returns the child with the given name from the E57 namespace.
    pub fn get(&self, name: &str) -> Option<&Element> {
        self.fields
            .iter()
            .find(|f| f.namespace.is_none() && f.name == name)
            .map(|f| &f.element)
    }

    /// Builds the path of a child for error messages.
    pub fn path_of(&self, name: &str) -> String {
        child_path(&self.path, name)
    }
}

/// Ordered list of unnamed child elements.
#[derive(Clone, Debug)]
pub struct Vector {
    pub path: String,
    pub allow_heterogeneous_children: bool,
    pub children: Vec<Element>,
}

/// Binary coding used for some of the prototype fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodecKind {
    BitPack,
}

/// Codec description of a compressed vector.
#[derive(Clone, Debug)]
pub struct Codec {
    /// Paths of the prototype fields the codec applies to.
    /// Empty means all fields.
    pub inputs: Vec<String>,
    pub kind: CodecKind,
}

/// Describes a binary section with a sequence of records.
#[derive(Clone, Debug)]
pub struct CompressedVector {
    pub path: String,
    /// Physical offset of the binary section.
    pub file_offset: u64,
    /// Number of records in the binary section.
    pub record_count: u64,
    /// Fields of each record in storage order.
    pub prototype: Structure,
    pub codecs: Vec<Codec>,
    /// Validated binary section header found at the file offset.
    pub section: CompressedVectorSectionHeader,
}

/// Parses the XML document into the generic element tree.
/// The returned structure is the `e57Root` element.
pub fn parse_document<R: Read + Seek>(
    document: &Document,
    reader: &mut R,
) -> Result<(Structure, Vec<Extension>)> {
    let root = document.root_element();
    let (name, namespace) = qualified_name(&root, "")?;
    if name != "e57Root" || namespace.is_some() {
        Error::mismatch("/", "root element 'e57Root'", &name)?
    }
    let root_type = type_attribute(&root, "/")?;
    if root_type != "Structure" {
        Error::mismatch("/", "type Structure", root_type)?
    }

    let extensions = Extension::vec_from_document(document);
    let structure = parse_structure(&root, "/", reader)?;
    tracing::debug!(
        fields = structure.fields.len(),
        extensions = extensions.len(),
        "Parsed E57 element tree"
    );
    Ok((structure, extensions))
}

/// Parses a single XML element and all its children.
pub fn parse_element<R: Read + Seek>(node: &Node, path: &str, reader: &mut R) -> Result<Element> {
    let type_name = type_attribute(node, path)?;
    match type_name {
        "Integer" => parse_integer(node, path),
        "ScaledInteger" => parse_scaled_integer(node, path),
        "Float" => parse_float(node, path),
        "String" => Ok(Element::String(text_content(node))),
        "Blob" => {
            let blob = Blob {
                offset: parse_file_offset(node, path)?,
                length: required_attribute(node, path, "length")?,
            };
            blob.validate(reader, path)?;
            Ok(Element::Blob(blob))
        }
        "Structure" => Ok(Element::Structure(parse_structure(node, path, reader)?)),
        "Vector" => Ok(Element::Vector(parse_vector(node, path, reader)?)),
        "CompressedVector" => Ok(Element::CompressedVector(parse_compressed_vector(
            node, path, reader,
        )?)),
        _ => Err(Error::UnknownElementType {
            path: path.to_string(),
            type_name: type_name.to_string(),
        }),
    }
}

fn check_limits<T>(path: &str, min: T, max: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if min > max {
        Error::constraint(path, format!("maximum >= minimum {min}"), max)?
    }
    Ok(())
}

fn check_value<T>(path: &str, value: T, min: T, max: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        Error::constraint(path, format!("value in range [{min}, {max}]"), value)?
    }
    Ok(())
}

// Elements without text content (like prototype fields) default to the
// value closest to zero that is still inside the declared limits.
fn parse_integer(node: &Node, path: &str) -> Result<Element> {
    let min = optional_attribute(node, path, "minimum")?.unwrap_or(i64::MIN);
    let max = optional_attribute(node, path, "maximum")?.unwrap_or(i64::MAX);
    check_limits(path, min, max)?;
    let value = parse_text(node, path, 0_i64.clamp(min, max))?;
    check_value(path, value, min, max)?;
    Ok(Element::Integer { value, min, max })
}

fn parse_scaled_integer(node: &Node, path: &str) -> Result<Element> {
    let min = optional_attribute(node, path, "minimum")?.unwrap_or(i64::MIN);
    let max = optional_attribute(node, path, "maximum")?.unwrap_or(i64::MAX);
    let scale = optional_attribute(node, path, "scale")?.unwrap_or(1.0);
    let offset = optional_attribute(node, path, "offset")?.unwrap_or(0.0);
    if scale == 0.0 {
        Error::constraint(child_path(path, "@scale"), "non-zero scale", scale)?
    }
    check_limits(path, min, max)?;
    let value = parse_text(node, path, 0_i64.clamp(min, max))?;
    check_value(path, value, min, max)?;
    Ok(Element::ScaledInteger {
        value,
        min,
        max,
        scale,
        offset,
    })
}

fn parse_float(node: &Node, path: &str) -> Result<Element> {
    let precision = match node.attribute("precision").unwrap_or("double") {
        "double" => FloatPrecision::Double,
        "single" => FloatPrecision::Single,
        other => Error::constraint(
            child_path(path, "@precision"),
            "'single' or 'double'",
            other,
        )?,
    };
    let (default_min, default_max) = match precision {
        FloatPrecision::Double => (f64::MIN, f64::MAX),
        FloatPrecision::Single => (f32::MIN as f64, f32::MAX as f64),
    };
    let min: f64 = optional_attribute(node, path, "minimum")?.unwrap_or(default_min);
    let max: f64 = optional_attribute(node, path, "maximum")?.unwrap_or(default_max);
    if min.is_nan() || max.is_nan() {
        Error::constraint(path, "numeric limits", "NaN")?
    }
    check_limits(path, min, max)?;
    let value = parse_text(node, path, 0.0_f64.clamp(min, max))?;
    if value.is_nan() {
        Error::constraint(path, "number", value)?
    }
    check_value(path, value, min, max)?;
    Ok(Element::Float {
        value,
        precision,
        min,
        max,
    })
}

fn parse_file_offset(node: &Node, path: &str) -> Result<u64> {
    let offset: u64 = required_attribute(node, path, "fileOffset")?;
    if offset > MAX_FILE_OFFSET {
        Error::constraint(
            child_path(path, "@fileOffset"),
            format!("offset at most {MAX_FILE_OFFSET}"),
            offset,
        )?
    }
    Ok(offset)
}

fn parse_structure<R: Read + Seek>(node: &Node, path: &str, reader: &mut R) -> Result<Structure> {
    let mut fields = Vec::new();
    for child in node.children().filter(|n| n.is_element()) {
        let (name, namespace) = qualified_name(&child, path)?;
        let field_name = match &namespace {
            Some(prefix) => format!("{prefix}:{name}"),
            None => name.clone(),
        };
        let field_path = child_path(path, &field_name);
        if fields
            .iter()
            .any(|f: &Field| f.name == name && f.namespace == namespace)
        {
            Error::invalid(format!("Duplicate element '{field_path}'"))?
        }
        let element = parse_element(&child, &field_path, reader)?;
        fields.push(Field {
            name,
            namespace,
            element,
        });
    }
    Ok(Structure {
        path: path.to_string(),
        fields,
    })
}

fn parse_vector<R: Read + Seek>(node: &Node, path: &str, reader: &mut R) -> Result<Vector> {
    let heterogeneous: i64 =
        optional_attribute(node, path, "allowHeterogeneousChildren")?.unwrap_or(0);
    if heterogeneous != 0 && heterogeneous != 1 {
        Error::constraint(
            child_path(path, "@allowHeterogeneousChildren"),
            "0 or 1",
            heterogeneous,
        )?
    }
    let allow_heterogeneous_children = heterogeneous == 1;

    let mut children: Vec<Element> = Vec::new();
    for (index, child) in node.children().filter(|n| n.is_element()).enumerate() {
        let item_path = child_path(path, &index.to_string());
        let (name, namespace) = qualified_name(&child, path)?;
        if name != "vectorChild" || namespace.is_some() {
            Error::mismatch(&item_path, "element 'vectorChild'", &name)?
        }
        let element = parse_element(&child, &item_path, reader)?;
        if !allow_heterogeneous_children {
            if let Some(first) = children.first() {
                if !first.same_shape(&element) {
                    Error::mismatch(
                        &item_path,
                        format!("child with same shape as first child ({})", first.type_name()),
                        element.type_name(),
                    )?
                }
            }
        }
        children.push(element);
    }

    Ok(Vector {
        path: path.to_string(),
        allow_heterogeneous_children,
        children,
    })
}

fn parse_compressed_vector<R: Read + Seek>(
    node: &Node,
    path: &str,
    reader: &mut R,
) -> Result<CompressedVector> {
    let file_offset = parse_file_offset(node, path)?;
    let record_count: u64 = required_attribute(node, path, "recordCount")?;

    let prototype_node = node
        .children()
        .find(|n| n.is_element() && n.has_tag_name((E57_NAMESPACE, "prototype")));
    let prototype_path = child_path(path, "prototype");
    let prototype = match prototype_node {
        Some(n) => match parse_element(&n, &prototype_path, reader)? {
            Element::Structure(s) => s,
            other => Error::mismatch(&prototype_path, "type Structure", other.type_name())?,
        },
        None => Error::missing(path, "prototype")?,
    };

    let codecs_node = node
        .children()
        .find(|n| n.is_element() && n.has_tag_name((E57_NAMESPACE, "codecs")));
    let codecs = match codecs_node {
        Some(n) => parse_codecs(&n, &child_path(path, "codecs"), reader)?,
        None => Vec::new(),
    };

    let section = CompressedVectorSectionHeader::read_at(reader, file_offset)?;
    if section.section_length < CompressedVectorSectionHeader::SIZE {
        Error::invalid(format!(
            "Binary section of compressed vector '{path}' at offset {file_offset} is too short"
        ))?
    }

    Ok(CompressedVector {
        path: path.to_string(),
        file_offset,
        record_count,
        prototype,
        codecs,
        section,
    })
}

fn parse_codecs<R: Read + Seek>(node: &Node, path: &str, reader: &mut R) -> Result<Vec<Codec>> {
    let vector = match parse_element(node, path, reader)? {
        Element::Vector(v) => v,
        other => Error::mismatch(path, "type Vector", other.type_name())?,
    };

    let mut codecs = Vec::new();
    for (index, child) in vector.children.iter().enumerate() {
        let codec_path = child_path(path, &index.to_string());
        let Element::Structure(codec) = child else {
            return Error::mismatch(&codec_path, "type Structure", child.type_name());
        };

        let inputs = match codec.get("inputs") {
            Some(Element::Vector(v)) => v
                .children
                .iter()
                .map(|c| match c {
                    Element::String(s) => Ok(s.clone()),
                    other => Error::mismatch(&v.path, "String children", other.type_name()),
                })
                .collect::<Result<Vec<String>>>()?,
            Some(other) => Error::mismatch(&codec.path_of("inputs"), "type Vector", other.type_name())?,
            None => Vec::new(),
        };

        let kind = if codec.get("bitPackCodec").is_some() {
            CodecKind::BitPack
        } else {
            let name = codec
                .fields
                .iter()
                .map(|f| f.name.as_str())
                .find(|n| *n != "inputs")
                .unwrap_or("<none>");
            Error::not_implemented(format!(
                "Codec '{name}' used by '{codec_path}' is not supported"
            ))?
        };

        codecs.push(Codec { inputs, kind });
    }
    Ok(codecs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paged_reader::testing::paginate;
    use std::io::Cursor;

    fn reader() -> Cursor<Vec<u8>> {
        // Blob section at offset 0 and compressed vector section at offset 48
        let mut logical = vec![0_u8; 8];
        logical.extend_from_slice(&48_u64.to_le_bytes());
        logical.resize(48, 0);
        logical.push(1);
        logical.extend_from_slice(&[0; 7]);
        logical.extend_from_slice(&64_u64.to_le_bytes());
        logical.extend_from_slice(&80_u64.to_le_bytes());
        logical.extend_from_slice(&0_u64.to_le_bytes());
        Cursor::new(paginate(&logical))
    }

    fn parse(inner: &str) -> Result<Element> {
        let xml = format!(
            "<e57Root type=\"Structure\" xmlns=\"{E57_NAMESPACE}\" xmlns:ext=\"http://example.com/ext\">{inner}</e57Root>"
        );
        let document = Document::parse(&xml).unwrap();
        let child = document.root_element().first_element_child().unwrap();
        parse_element(&child, "/child", &mut reader())
    }

    #[test]
    fn integer() {
        let element = parse("<a type=\"Integer\" minimum=\"-5\" maximum=\"5\">3</a>").unwrap();
        assert!(matches!(
            element,
            Element::Integer {
                value: 3,
                min: -5,
                max: 5
            }
        ));
        let element = parse("<a type=\"Integer\"/>").unwrap();
        assert!(matches!(element, Element::Integer { value: 0, .. }));
    }

    #[test]
    fn integer_maximum_below_minimum() {
        let result = parse("<a type=\"Integer\" minimum=\"5\" maximum=\"1\">3</a>");
        match result {
            Err(Error::ConstraintViolation { field, .. }) => assert_eq!(field, "/child"),
            other => panic!("Unexpected result {other:?}"),
        }
    }

    #[test]
    fn integer_out_of_range() {
        let result = parse("<a type=\"Integer\" minimum=\"0\" maximum=\"10\">11</a>");
        assert!(matches!(result, Err(Error::ConstraintViolation { .. })));
    }

    #[test]
    fn scaled_integer() {
        let element = parse(
            "<a type=\"ScaledInteger\" minimum=\"0\" maximum=\"100\" scale=\"0.5\" offset=\"1\">10</a>",
        )
        .unwrap();
        match element {
            Element::ScaledInteger {
                value,
                scale,
                offset,
                ..
            } => {
                assert_eq!(value, 10);
                assert_eq!(scale, 0.5);
                assert_eq!(offset, 1.0);
            }
            other => panic!("Unexpected element {other:?}"),
        }
        assert!(parse("<a type=\"ScaledInteger\" scale=\"0\">1</a>").is_err());
    }

    #[test]
    fn float() {
        let element = parse("<a type=\"Float\" precision=\"single\">1.5</a>").unwrap();
        assert!(matches!(
            element,
            Element::Float {
                precision: FloatPrecision::Single,
                ..
            }
        ));
        assert!(parse("<a type=\"Float\" precision=\"half\">1.5</a>").is_err());
        assert!(parse("<a type=\"Float\" minimum=\"2\">1.5</a>").is_err());
        assert!(parse("<a type=\"Float\">abc</a>").is_err());
    }

    #[test]
    fn string() {
        let element = parse("<a type=\"String\"><![CDATA[hello]]></a>").unwrap();
        assert!(matches!(element, Element::String(s) if s == "hello"));
    }

    #[test]
    fn blob() {
        let element = parse("<a type=\"Blob\" fileOffset=\"0\" length=\"32\"/>").unwrap();
        assert!(matches!(element, Element::Blob(Blob { offset: 0, length: 32 })));
        assert!(matches!(
            parse("<a type=\"Blob\" fileOffset=\"0\"/>"),
            Err(Error::MissingRequiredElement { .. })
        ));
    }

    #[test]
    fn file_offset_range() {
        let offset = |value: &str| {
            let xml = format!("<a type=\"Blob\" fileOffset=\"{value}\" length=\"0\"/>");
            let document = Document::parse(&xml).unwrap();
            parse_file_offset(&document.root_element(), "/child")
        };
        assert_eq!(offset("9223372036854775807").unwrap(), i64::MAX as u64);
        match offset("9223372036854775808") {
            Err(Error::ConstraintViolation { field, .. }) => assert_eq!(field, "/child/@fileOffset"),
            other => panic!("Unexpected result {other:?}"),
        }
    }

    #[test]
    fn unknown_type() {
        let result = parse("<a type=\"Complex\"/>");
        assert!(matches!(
            result,
            Err(Error::UnknownElementType { type_name, .. }) if type_name == "Complex"
        ));
    }

    #[test]
    fn structure_keeps_order() {
        let element = parse(
            "<a type=\"Structure\"><z type=\"Integer\"/><b type=\"String\"/><ext:m type=\"Float\"/></a>",
        )
        .unwrap();
        let Element::Structure(s) = element else {
            panic!("Expected structure");
        };
        let names: Vec<&str> = s.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["z", "b", "m"]);
        assert_eq!(s.fields[2].namespace.as_deref(), Some("ext"));
        assert!(s.get("m").is_none());
        assert!(s.get("z").is_some());
    }

    #[test]
    fn structure_duplicate_child() {
        let result = parse("<a type=\"Structure\"><b type=\"Integer\"/><b type=\"Integer\"/></a>");
        assert!(result.is_err());
    }

    #[test]
    fn homogeneous_vector() {
        let ok = parse(
            "<a type=\"Vector\"><vectorChild type=\"Integer\">1</vectorChild><vectorChild type=\"Integer\">2</vectorChild></a>",
        )
        .unwrap();
        let Element::Vector(v) = ok else {
            panic!("Expected vector");
        };
        assert_eq!(v.children.len(), 2);
        assert!(!v.allow_heterogeneous_children);

        let mixed = "<vectorChild type=\"Integer\">1</vectorChild><vectorChild type=\"String\">x</vectorChild>";
        assert!(matches!(
            parse(&format!("<a type=\"Vector\">{mixed}</a>")),
            Err(Error::SchemaMismatch { .. })
        ));
        assert!(parse(&format!(
            "<a type=\"Vector\" allowHeterogeneousChildren=\"1\">{mixed}</a>"
        ))
        .is_ok());
    }

    #[test]
    fn vector_child_name() {
        let result = parse("<a type=\"Vector\"><child type=\"Integer\"/></a>");
        assert!(matches!(result, Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn compressed_vector() {
        let element = parse(
            "<a type=\"CompressedVector\" fileOffset=\"48\" recordCount=\"3\">\
             <prototype type=\"Structure\"><cartesianX type=\"Float\"/></prototype>\
             <codecs type=\"Vector\" allowHeterogeneousChildren=\"1\">\
             <vectorChild type=\"Structure\"><inputs type=\"Vector\" allowHeterogeneousChildren=\"1\">\
             <vectorChild type=\"String\">cartesianX</vectorChild></inputs>\
             <bitPackCodec type=\"Structure\"/></vectorChild></codecs></a>",
        )
        .unwrap();
        let Element::CompressedVector(cv) = element else {
            panic!("Expected compressed vector");
        };
        assert_eq!(cv.file_offset, 48);
        assert_eq!(cv.record_count, 3);
        assert_eq!(cv.prototype.fields.len(), 1);
        assert_eq!(cv.codecs.len(), 1);
        assert_eq!(cv.codecs[0].inputs, vec!["cartesianX".to_string()]);
        assert_eq!(cv.codecs[0].kind, CodecKind::BitPack);
        assert_eq!(cv.section.data_offset, 80);
    }

    #[test]
    fn compressed_vector_missing_prototype() {
        let result = parse("<a type=\"CompressedVector\" fileOffset=\"48\" recordCount=\"3\"/>");
        assert!(matches!(
            result,
            Err(Error::MissingRequiredElement { name, .. }) if name == "prototype"
        ));
    }

    #[test]
    fn compressed_vector_bad_section() {
        let result = parse(
            "<a type=\"CompressedVector\" fileOffset=\"0\" recordCount=\"3\"><prototype type=\"Structure\"/></a>",
        );
        assert!(result.is_err());
    }
}
