use crate::element::Structure;
use crate::schema::{optional_structure, required_double, required_structure};
use crate::{Error, Result};

/// Describes the rotation of a point cloud.
#[derive(Clone, Debug, PartialEq)]
pub struct Quaternion {
    /// The scalar part of the quaternion. Shall be nonnegative.
    pub w: f64,
    /// The i coefficient of the quaternion.
    pub x: f64,
    /// The j coefficient of the quaternion.
    pub y: f64,
    /// The k coefficient of the quaternion.
    pub z: f64,
}

impl Quaternion {
    pub(crate) fn from_structure(s: &Structure) -> Result<Self> {
        let mut components = [0.0; 4];
        for (value, name) in components.iter_mut().zip(["w", "x", "y", "z"]) {
            *value = required_double(s, name)?;
            if !value.is_finite() {
                Error::constraint(s.path_of(name), "finite value", *value)?
            }
        }
        let [w, x, y, z] = components;
        Ok(Self { w, x, y, z })
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

/// Describes the translation of a point cloud.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Translation {
    /// The X coordinate of the translation in meters.
    pub x: f64,
    /// The Y coordinate of the translation in meters.
    pub y: f64,
    /// The Z coordinate of the translation in meters.
    pub z: f64,
}

impl Translation {
    pub(crate) fn from_structure(s: &Structure) -> Result<Self> {
        let x = required_double(s, "x")?;
        let y = required_double(s, "y")?;
        let z = required_double(s, "z")?;
        Ok(Self { x, y, z })
    }
}

/// Describes a transformation of a point cloud with a rotation and translation component.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transform {
    /// A unit quaternion representing the rotation of the transform.
    pub rotation: Quaternion,
    /// The translation of the transform.
    pub translation: Translation,
}

impl Transform {
    pub(crate) fn from_structure(s: &Structure) -> Result<Self> {
        let rotation = Quaternion::from_structure(required_structure(s, "rotation")?)?;
        let translation = Translation::from_structure(required_structure(s, "translation")?)?;
        Ok(Self {
            rotation,
            translation,
        })
    }

    pub(crate) fn optional(parent: &Structure, name: &str) -> Result<Option<Self>> {
        optional_structure(parent, name)?
            .map(Self::from_structure)
            .transpose()
    }
}
