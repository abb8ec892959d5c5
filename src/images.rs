use crate::element::Structure;
use crate::schema::{
    check_above, optional_blob, optional_string, optional_structure, required_double,
    required_integer, required_string,
};
use crate::{Blob, DateTime, Error, Result, Transform};

/// Descriptor with metadata for a single image.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Image {
    /// Globally unique identifier for the image object.
    pub guid: String,
    /// Preview/illustration image that does not define any camera projection model.
    pub visual_reference: Option<VisualReference>,
    /// Image that includes a projection model.
    pub representation: Option<Representation>,
    /// Transforms the local coordinate system of the image to the file-level coordinate system.
    pub transform: Option<Transform>,
    /// GUID of the pointcloud that was captured with this image.
    pub pointcloud_guid: Option<String>,
    /// User-defined name for the image.
    pub name: Option<String>,
    /// User-defined description for the image.
    pub description: Option<String>,
    /// Date and time when this image was captured.
    pub acquisition: Option<DateTime>,
    /// The name of the manufacturer for the sensor used to capture the image.
    pub sensor_vendor: Option<String>,
    /// The model name or number for the sensor used to capture the image.
    pub sensor_model: Option<String>,
    /// The serial number of the sensor used to capture the image.
    pub sensor_serial: Option<String>,
}

impl Image {
    pub(crate) fn from_structure(s: &Structure) -> Result<Self> {
        let visual_reference = optional_structure(s, "visualReferenceRepresentation")?
            .map(VisualReference::from_structure)
            .transpose()?;
        Ok(Self {
            guid: required_string(s, "guid")?,
            visual_reference,
            representation: Representation::from_image(s)?,
            transform: Transform::optional(s, "pose")?,
            pointcloud_guid: optional_string(s, "associatedData3DGuid")?,
            name: optional_string(s, "name")?,
            description: optional_string(s, "description")?,
            acquisition: DateTime::optional(s, "acquisitionDateTime")?,
            sensor_vendor: optional_string(s, "sensorVendor")?,
            sensor_model: optional_string(s, "sensorModel")?,
            sensor_serial: optional_string(s, "sensorSerialNumber")?,
        })
    }
}

/// Contains one of the tree possible types for projectable images.
#[derive(Debug, Clone)]
pub enum Representation {
    /// Image with a pinhole projection model.
    Pinhole(PinholeRepresentation),
    /// Image with a spherical projection model.
    Spherical(SphericalRepresentation),
    /// Image with a cylindrical projection model.
    Cylindrical(CylindricalRepresentation),
}

impl Representation {
    const NAMES: [&'static str; 3] = [
        "pinholeRepresentation",
        "sphericalRepresentation",
        "cylindricalRepresentation",
    ];

    fn from_image(image: &Structure) -> Result<Option<Self>> {
        let present: Vec<&str> = Self::NAMES
            .into_iter()
            .filter(|n| image.get(n).is_some())
            .collect();
        if present.len() > 1 {
            Error::constraint(
                &image.path,
                "at most one projectable representation",
                present.join(", "),
            )?
        }

        if let Some(s) = optional_structure(image, "pinholeRepresentation")? {
            return Ok(Some(Self::Pinhole(PinholeRepresentation::from_structure(s)?)));
        }
        if let Some(s) = optional_structure(image, "sphericalRepresentation")? {
            return Ok(Some(Self::Spherical(
                SphericalRepresentation::from_structure(s)?,
            )));
        }
        if let Some(s) = optional_structure(image, "cylindricalRepresentation")? {
            return Ok(Some(Self::Cylindrical(
                CylindricalRepresentation::from_structure(s)?,
            )));
        }
        Ok(None)
    }
}

/// File format of an image stored inside the E57 file as blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageFormat {
    /// Portable Network Graphics (PNG) image format.
    Png,
    /// JPEG File Interchange Format (JFIF) image format.
    Jpeg,
}

/// Contains a blob with image data and the corresponding file type.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ImageBlob {
    /// Descriptor for the binary blob of the image.
    pub data: Blob,
    /// Image format of the file referenced by the blob.
    pub format: ImageFormat,
}

impl ImageBlob {
    fn from_representation(rep: &Structure) -> Result<Self> {
        if let Some(data) = optional_blob(rep, "jpegImage")? {
            Ok(Self {
                data,
                format: ImageFormat::Jpeg,
            })
        } else if let Some(data) = optional_blob(rep, "pngImage")? {
            Ok(Self {
                data,
                format: ImageFormat::Png,
            })
        } else {
            Error::missing(&rep.path, "jpegImage")
        }
    }
}

/// Reads width and height of an image which both must be positive.
fn image_size(rep: &Structure) -> Result<(u32, u32)> {
    let width = required_integer(rep, "imageWidth")?;
    let height = required_integer(rep, "imageHeight")?;
    check_above(rep, "imageWidth", Some(width), 0)?;
    check_above(rep, "imageHeight", Some(height), 0)?;
    let width = u32::try_from(width).or_else(|_| {
        Error::constraint(rep.path_of("imageWidth"), "fits into 32 bits", width)
    })?;
    let height = u32::try_from(height).or_else(|_| {
        Error::constraint(rep.path_of("imageHeight"), "fits into 32 bits", height)
    })?;
    Ok((width, height))
}

fn positive_double(rep: &Structure, name: &str) -> Result<f64> {
    let value = required_double(rep, name)?;
    check_above(rep, name, Some(value), 0.0)?;
    Ok(value)
}

/// Properties of an visual reference image.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct VisualReferenceProperties {
    /// Width of the image in pixels.
    pub width: u32,
    /// Height of the image in pixels.
    pub height: u32,
}

/// A visual reference image for preview and illustration purposes.
///
/// Such images cannot be mapped to points and are not projectable!
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct VisualReference {
    /// Reference to the binary image data.
    pub blob: ImageBlob,
    /// Properties of the visual reference image.
    pub properties: VisualReferenceProperties,
    /// Reference to a PNG image with a mask for non-rectangular images.
    pub mask: Option<Blob>,
}

impl VisualReference {
    fn from_structure(s: &Structure) -> Result<Self> {
        let (width, height) = image_size(s)?;
        Ok(Self {
            blob: ImageBlob::from_representation(s)?,
            properties: VisualReferenceProperties { width, height },
            mask: optional_blob(s, "imageMask")?,
        })
    }
}

/// Properties of a pinhole image.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct PinholeImageProperties {
    /// Width of the image in pixels.
    pub width: u32,
    /// Height of the image in pixels.
    pub height: u32,
    /// The cameras focal length in meters.
    pub focal_length: f64,
    /// The width of a pixel in meters.
    pub pixel_width: f64,
    /// The height of a pixel in meters.
    pub pixel_height: f64,
    /// The X coordinate of the principal point in pixels.
    pub principal_x: f64,
    /// The Y coordinate of the principal point in pixels.
    pub principal_y: f64,
}

/// Describes an image with a pinhole camera projection model.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct PinholeRepresentation {
    /// Reference to the binary image data.
    pub blob: ImageBlob,
    /// Properties of the pinhole image.
    pub properties: PinholeImageProperties,
    /// Reference to a PNG image with a mask for non-rectangular images.
    ///
    /// The mask dimension are the same as the image itself.
    /// It has non-zero-valued pixels at locations where the image is valid
    /// and zero-valued pixels at locations where it is invalid.
    pub mask: Option<Blob>,
}

impl PinholeRepresentation {
    fn from_structure(s: &Structure) -> Result<Self> {
        let (width, height) = image_size(s)?;
        Ok(Self {
            blob: ImageBlob::from_representation(s)?,
            properties: PinholeImageProperties {
                width,
                height,
                focal_length: required_double(s, "focalLength")?,
                pixel_width: positive_double(s, "pixelWidth")?,
                pixel_height: positive_double(s, "pixelHeight")?,
                principal_x: required_double(s, "principalPointX")?,
                principal_y: required_double(s, "principalPointY")?,
            },
            mask: optional_blob(s, "imageMask")?,
        })
    }
}

/// Properties of a spherical image.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct SphericalImageProperties {
    /// Width of the image in pixels.
    pub width: u32,
    /// Height of the image in pixels.
    pub height: u32,
    /// The width of a pixel in radians.
    pub pixel_width: f64,
    /// The height of a pixel in radians.
    pub pixel_height: f64,
}

/// Describes an image with a spherical projection model.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct SphericalRepresentation {
    /// Reference to the binary image data.
    pub blob: ImageBlob,
    /// Properties of the spherical image.
    pub properties: SphericalImageProperties,
    /// Reference to a PNG image with a mask for non-rectangular images.
    pub mask: Option<Blob>,
}

impl SphericalRepresentation {
    fn from_structure(s: &Structure) -> Result<Self> {
        let (width, height) = image_size(s)?;
        Ok(Self {
            blob: ImageBlob::from_representation(s)?,
            properties: SphericalImageProperties {
                width,
                height,
                pixel_width: positive_double(s, "pixelWidth")?,
                pixel_height: positive_double(s, "pixelHeight")?,
            },
            mask: optional_blob(s, "imageMask")?,
        })
    }
}

/// Properties of a cylindrical image.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct CylindricalImageProperties {
    /// Width of the image in pixels.
    pub width: u32,
    /// Height of the image in pixels.
    pub height: u32,
    /// The closest distance from the cylindrical image surface to the center of projection in meters.
    pub radius: f64,
    /// The Y coordinate of the principal point in pixels.
    pub principal_y: f64,
    /// The width of a pixel in radians.
    pub pixel_width: f64,
    /// The height of a pixel in radians.
    pub pixel_height: f64,
}

/// Describes an image with a cylindrical projection model.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct CylindricalRepresentation {
    /// Reference to the binary image data.
    pub blob: ImageBlob,
    /// Properties of the cylindrical image.
    pub properties: CylindricalImageProperties,
    /// Reference to a PNG image with a mask for non-rectangular images.
    pub mask: Option<Blob>,
}

impl CylindricalRepresentation {
    fn from_structure(s: &Structure) -> Result<Self> {
        let (width, height) = image_size(s)?;
        Ok(Self {
            blob: ImageBlob::from_representation(s)?,
            properties: CylindricalImageProperties {
                width,
                height,
                radius: positive_double(s, "radius")?,
                principal_y: required_double(s, "principalPointY")?,
                pixel_width: positive_double(s, "pixelWidth")?,
                pixel_height: positive_double(s, "pixelHeight")?,
            },
            mask: optional_blob(s, "imageMask")?,
        })
    }
}
