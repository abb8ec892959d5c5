use crate::bitpack::bits_for_range;
use crate::element::{Element, Field, FloatPrecision, Structure};
use crate::{Error, Result};

/// Describes a single attribute of the points in a point cloud.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Record {
    pub name: RecordName,
    pub data_type: RecordDataType,
}

impl Record {
    /// Converts all fields of a compressed vector prototype into records.
    pub(crate) fn vec_from_prototype(prototype: &Structure) -> Result<Vec<Self>> {
        prototype
            .fields
            .iter()
            .map(|f| Self::from_field(f, &prototype.path_of(&f.name)))
            .collect()
    }

    fn from_field(field: &Field, path: &str) -> Result<Self> {
        let name = RecordName::from_namespace_and_name(field.namespace.as_deref(), &field.name, path)?;
        let data_type = RecordDataType::from_element(&field.element, path)?;
        name.validate_data_type(&data_type, path)?;
        Ok(Self { name, data_type })
    }
}

/// Name of a point attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordName {
    CartesianX,
    CartesianY,
    CartesianZ,
    CartesianInvalidState,
    SphericalRange,
    SphericalAzimuth,
    SphericalElevation,
    SphericalInvalidState,
    RowIndex,
    ColumnIndex,
    ReturnIndex,
    ReturnCount,
    TimeStamp,
    IsTimeStampInvalid,
    Intensity,
    IsIntensityInvalid,
    ColorRed,
    ColorGreen,
    ColorBlue,
    IsColorInvalid,
    /// Attribute defined by an extension.
    Unknown {
        namespace: String,
        name: String,
    },
}

impl RecordName {
    fn from_namespace_and_name(namespace: Option<&str>, name: &str, path: &str) -> Result<Self> {
        if let Some(namespace) = namespace {
            return Ok(Self::Unknown {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        Ok(match name {
            "cartesianX" => Self::CartesianX,
            "cartesianY" => Self::CartesianY,
            "cartesianZ" => Self::CartesianZ,
            "cartesianInvalidState" => Self::CartesianInvalidState,
            "sphericalRange" => Self::SphericalRange,
            "sphericalAzimuth" => Self::SphericalAzimuth,
            "sphericalElevation" => Self::SphericalElevation,
            "sphericalInvalidState" => Self::SphericalInvalidState,
            "rowIndex" => Self::RowIndex,
            "columnIndex" => Self::ColumnIndex,
            "returnIndex" => Self::ReturnIndex,
            "returnCount" => Self::ReturnCount,
            "timeStamp" => Self::TimeStamp,
            "isTimeStampInvalid" => Self::IsTimeStampInvalid,
            "intensity" => Self::Intensity,
            "isIntensityInvalid" => Self::IsIntensityInvalid,
            "colorRed" => Self::ColorRed,
            "colorGreen" => Self::ColorGreen,
            "colorBlue" => Self::ColorBlue,
            "isColorInvalid" => Self::IsColorInvalid,
            _ => Error::mismatch(path, "known point attribute name", name)?,
        })
    }

    /// Name of the attribute as used in the XML prototype.
    pub fn to_tag_name(&self) -> String {
        match self {
            Self::CartesianX => "cartesianX".into(),
            Self::CartesianY => "cartesianY".into(),
            Self::CartesianZ => "cartesianZ".into(),
            Self::CartesianInvalidState => "cartesianInvalidState".into(),
            Self::SphericalRange => "sphericalRange".into(),
            Self::SphericalAzimuth => "sphericalAzimuth".into(),
            Self::SphericalElevation => "sphericalElevation".into(),
            Self::SphericalInvalidState => "sphericalInvalidState".into(),
            Self::RowIndex => "rowIndex".into(),
            Self::ColumnIndex => "columnIndex".into(),
            Self::ReturnIndex => "returnIndex".into(),
            Self::ReturnCount => "returnCount".into(),
            Self::TimeStamp => "timeStamp".into(),
            Self::IsTimeStampInvalid => "isTimeStampInvalid".into(),
            Self::Intensity => "intensity".into(),
            Self::IsIntensityInvalid => "isIntensityInvalid".into(),
            Self::ColorRed => "colorRed".into(),
            Self::ColorGreen => "colorGreen".into(),
            Self::ColorBlue => "colorBlue".into(),
            Self::IsColorInvalid => "isColorInvalid".into(),
            Self::Unknown { namespace, name } => format!("{namespace}:{name}"),
        }
    }

    /// Upper limit of the allowed value range for state and index attributes.
    fn integer_limit(&self) -> Option<(i64, i64)> {
        match self {
            Self::CartesianInvalidState | Self::SphericalInvalidState => Some((0, 2)),
            Self::IsTimeStampInvalid | Self::IsIntensityInvalid | Self::IsColorInvalid => {
                Some((0, 1))
            }
            Self::RowIndex | Self::ColumnIndex | Self::ReturnIndex | Self::ReturnCount => {
                Some((0, i64::MAX))
            }
            _ => None,
        }
    }

    fn validate_data_type(&self, data_type: &RecordDataType, path: &str) -> Result<()> {
        let Some((lower, upper)) = self.integer_limit() else {
            return Ok(());
        };
        match data_type {
            RecordDataType::Integer { min, max } => {
                if *min < lower || *max > upper {
                    Error::constraint(
                        path,
                        format!("limits within [{lower}, {upper}]"),
                        format!("[{min}, {max}]"),
                    )?
                }
                Ok(())
            }
            other => Error::mismatch(path, "type Integer", other.type_name()),
        }
    }
}

/// Basic primitive E57 data types that are used to store point attributes.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordDataType {
    /// 32-bit IEEE 754-2008 floating point value.
    Single { min: f64, max: f64 },
    /// 64-bit IEEE 754-2008 floating point value.
    Double { min: f64, max: f64 },
    /// Signed 64-bit integer scaled with a fixed 64-bit floating point value.
    ScaledInteger {
        min: i64,
        max: i64,
        scale: f64,
        offset: f64,
    },
    /// Signed 64-bit integer value.
    Integer { min: i64, max: i64 },
}

impl RecordDataType {
    pub(crate) fn from_element(element: &Element, path: &str) -> Result<Self> {
        Ok(match element {
            Element::Float {
                precision: FloatPrecision::Single,
                min,
                max,
                ..
            } => Self::Single {
                min: *min,
                max: *max,
            },
            Element::Float {
                precision: FloatPrecision::Double,
                min,
                max,
                ..
            } => Self::Double {
                min: *min,
                max: *max,
            },
            Element::Integer { min, max, .. } => Self::Integer {
                min: *min,
                max: *max,
            },
            Element::ScaledInteger {
                min,
                max,
                scale,
                offset,
                ..
            } => Self::ScaledInteger {
                min: *min,
                max: *max,
                scale: *scale,
                offset: *offset,
            },
            other => Error::not_implemented(format!(
                "Point attribute '{path}' of type {} is not supported",
                other.type_name()
            ))?,
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Single { .. } | Self::Double { .. } => "Float",
            Self::ScaledInteger { .. } => "ScaledInteger",
            Self::Integer { .. } => "Integer",
        }
    }

    /// Number of bits used by the bit pack codec for a single value.
    /// Integers with only a single possible value use zero bits.
    pub fn bit_width(&self) -> u32 {
        match self {
            Self::Single { .. } => 32,
            Self::Double { .. } => 64,
            Self::ScaledInteger { min, max, .. } | Self::Integer { min, max } => {
                bits_for_range(*min, *max)
            }
        }
    }

    /// Converts a packed unsigned value into the record value of this type.
    pub(crate) fn value_from_bits(&self, bits: u64) -> RecordValue {
        match self {
            Self::Single { .. } => RecordValue::Single(f32::from_bits(bits as u32)),
            Self::Double { .. } => RecordValue::Double(f64::from_bits(bits)),
            Self::ScaledInteger { min, .. } => {
                RecordValue::ScaledInteger(min.wrapping_add(bits as i64))
            }
            Self::Integer { min, .. } => RecordValue::Integer(min.wrapping_add(bits as i64)),
        }
    }
}

/// Represents a raw value of point attributes inside a point cloud.
///
/// Scaled integers are not scaled yet, use [`RecordValue::to_f64`] for that.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordValue {
    Single(f32),
    Double(f64),
    ScaledInteger(i64),
    Integer(i64),
}

impl RecordValue {
    /// Converts the value to a double and applies scale and offset of scaled integers.
    pub fn to_f64(&self, data_type: &RecordDataType) -> Result<f64> {
        match (self, data_type) {
            (RecordValue::Single(s), _) => Ok(*s as f64),
            (RecordValue::Double(d), _) => Ok(*d),
            (RecordValue::Integer(i), _) => Ok(*i as f64),
            (RecordValue::ScaledInteger(i), RecordDataType::ScaledInteger { scale, offset, .. }) => {
                Ok(*i as f64 * scale + offset)
            }
            (RecordValue::ScaledInteger(_), other) => Error::invalid(format!(
                "Cannot convert scaled integer value with record type {}",
                other.type_name()
            )),
        }
    }
}
