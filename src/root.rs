use crate::element::Structure;
use crate::schema::{
    optional_string, required_integer, required_string, required_vector, structure_children,
};
use crate::{DateTime, Error, Extension, Image, PointCloud, Result};

/// Format name every E57 root must declare.
pub const FORMAT_NAME: &str = "ASTM E57 3D Imaging Data File";

/// E57 XML root structure with information shared by all elements in the file.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct E57Root {
    pub format: String,
    pub guid: String,
    pub major_version: i64,
    pub minor_version: i64,
    pub library_version: Option<String>,
    pub creation: Option<DateTime>,
    pub coordinate_metadata: Option<String>,
    /// All point clouds of the `data3D` vector in document order.
    pub data3d: Vec<PointCloud>,
    /// All images of the `images2D` vector in document order.
    pub images2d: Vec<Image>,
}

impl E57Root {
    /// Builds the typed root from the generic `e57Root` element.
    pub fn from_element(root: &Structure, extensions: &[Extension]) -> Result<Self> {
        let format = required_string(root, "formatName")?;
        if format != FORMAT_NAME {
            Error::constraint(root.path_of("formatName"), format!("'{FORMAT_NAME}'"), &format)?
        }
        let guid = required_string(root, "guid")?;
        let major_version = required_integer(root, "versionMajor")?;
        let minor_version = required_integer(root, "versionMinor")?;

        let data3d = structure_children(required_vector(root, "data3D")?)?
            .into_iter()
            .map(|s| PointCloud::from_structure(s, extensions))
            .collect::<Result<Vec<_>>>()?;
        let images2d = structure_children(required_vector(root, "images2D")?)?
            .into_iter()
            .map(Image::from_structure)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            guid = %guid,
            pointclouds = data3d.len(),
            images = images2d.len(),
            "Parsed E57 root"
        );

        Ok(Self {
            format,
            guid,
            major_version,
            minor_version,
            library_version: optional_string(root, "e57LibraryVersion")?,
            creation: DateTime::optional(root, "creationDateTime")?,
            coordinate_metadata: optional_string(root, "coordinateMetadata")?,
            data3d,
            images2d,
        })
    }
}
