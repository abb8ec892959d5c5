//! Decoder for ASTM E57 files.
//!
//! Reads the paged binary container with its CRC checksums, the XML section
//! as generic element tree and typed records, binary section headers and
//! bit-packed field streams.

#![forbid(unsafe_code)]

pub mod bitpack;
mod blob;
mod bounds;
mod crc32;
mod cv_section;
mod date_time;
mod e57_reader;
pub mod element;
mod error;
mod extension;
mod field_reader;
mod grouping;
mod header;
mod images;
mod limits;
pub mod packet;
pub mod paged_reader;
mod pointcloud;
mod record;
mod root;
mod schema;
mod transform;
mod xml;

pub use self::blob::Blob;
pub use self::bounds::{CartesianBounds, IndexBounds, SphericalBounds};
pub use self::crc32::Crc32;
pub use self::cv_section::CompressedVectorSectionHeader;
pub use self::date_time::DateTime;
pub use self::e57_reader::{E57Reader, ReaderOptions, MAX_XML_SIZE};
pub use self::element::{Element, Structure, Vector};
pub use self::error::{Converter, Error, Result};
pub use self::extension::Extension;
pub use self::grouping::{GroupingByLine, PointGroupingSchemes};
pub use self::header::Header;
pub use self::images::{
    CylindricalImageProperties, CylindricalRepresentation, Image, ImageBlob, ImageFormat,
    PinholeImageProperties, PinholeRepresentation, Representation, SphericalImageProperties,
    SphericalRepresentation, VisualReference, VisualReferenceProperties,
};
pub use self::limits::{ColorLimits, IntensityLimits};
pub use self::pointcloud::PointCloud;
pub use self::record::{Record, RecordDataType, RecordName, RecordValue};
pub use self::root::{E57Root, FORMAT_NAME};
pub use self::transform::{Quaternion, Translation, Transform};
pub use self::xml::E57_NAMESPACE;
