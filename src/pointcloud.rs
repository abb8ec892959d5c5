use crate::cv_section::CompressedVectorSectionHeader;
use crate::element::{Codec, Structure};
use crate::schema::{
    check_above, check_at_least, check_within, optional_double, optional_string,
    optional_vector, required_compressed_vector, required_string, string_children,
};
use crate::{
    CartesianBounds, ColorLimits, DateTime, Extension, IndexBounds, IntensityLimits,
    PointGroupingSchemes, Record, Result, SphericalBounds, Transform,
};

/// Lowest possible temperature in degrees Celsius.
const ABSOLUTE_ZERO: f64 = -273.15;

/// Descriptor with metadata for a single point cloud.
///
/// This struct does not contain any actual point data,
/// it just describes the properties and attributes of a point cloud.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct PointCloud {
    /// Globally unique identifier for the point cloud.
    pub guid: String,
    /// Physical file offset of the start of the associated binary section.
    pub file_offset: u64,
    /// Number of points in the point cloud.
    pub records: u64,
    /// List of point attributes that exist for this point cloud.
    pub prototype: Vec<Record>,
    /// Codecs declared for the binary section.
    pub codecs: Vec<Codec>,
    /// Validated header of the binary section.
    pub section: CompressedVectorSectionHeader,

    /// Optional user-defined name for the point cloud.
    pub name: Option<String>,
    /// Optional user-defined description of the point cloud.
    pub description: Option<String>,
    /// Optional Cartesian bounds for the point cloud.
    pub cartesian_bounds: Option<CartesianBounds>,
    /// Optional spherical bounds for the point cloud.
    pub spherical_bounds: Option<SphericalBounds>,
    /// Optional index bounds (row, column, return values) for the point cloud.
    pub index_bounds: Option<IndexBounds>,
    /// Optional intensity limits for the point cloud.
    pub intensity_limits: Option<IntensityLimits>,
    /// Optional color limits for the point cloud.
    pub color_limits: Option<ColorLimits>,
    /// Optional grouping of the points by row or column.
    pub grouping_schemes: Option<PointGroupingSchemes>,
    /// Optional transformation to convert data from the local point cloud coordinates to the file-level coordinate system.
    pub transform: Option<Transform>,
    /// Optional start date and time when the point cloud was captured with a scanning device.
    pub acquisition_start: Option<DateTime>,
    /// Optional end date and time when the point cloud was captured with a scanning device.
    pub acquisition_end: Option<DateTime>,
    /// Optional GUID of the data which was used to create this point cloud.
    pub original_guids: Option<Vec<String>>,
    /// Optional name of the manufacturer for the sensor used to capture the point cloud.
    pub sensor_vendor: Option<String>,
    /// Optional model name of the sensor used for capturing.
    pub sensor_model: Option<String>,
    /// Optional serial number of the sensor used for capturing.
    pub sensor_serial: Option<String>,
    /// Optional version identifier for the sensor hardware used for capturing.
    pub sensor_hw_version: Option<String>,
    /// Optional version identifier for the sensor software used for capturing.
    pub sensor_sw_version: Option<String>,
    /// Optional version identifier for the sensor firmware used for capturing.
    pub sensor_fw_version: Option<String>,
    /// Optional ambient temperature in degrees Celsius, measured at the sensor at the time of capturing.
    pub temperature: Option<f64>,
    /// Optional percentage of relative humidity between 0 and 100, measured at the sensor at the time of capturing.
    pub humidity: Option<f64>,
    /// Optional atmospheric pressure in Pascals, measured at the sensor at the time of capturing.
    pub atmospheric_pressure: Option<f64>,
}

impl PointCloud {
    pub(crate) fn from_structure(s: &Structure, extensions: &[Extension]) -> Result<Self> {
        let guid = required_string(s, "guid")?;
        let points = required_compressed_vector(s, "points")?;
        let prototype = Record::vec_from_prototype(&points.prototype)?;
        Extension::validate(&points.prototype.path, &prototype, extensions)?;

        let temperature = optional_double(s, "temperature")?;
        let humidity = optional_double(s, "relativeHumidity")?;
        let atmospheric_pressure = optional_double(s, "atmosphericPressure")?;
        check_at_least(s, "temperature", temperature, ABSOLUTE_ZERO)?;
        check_within(s, "relativeHumidity", humidity, 0.0, 100.0)?;
        check_above(s, "atmosphericPressure", atmospheric_pressure, 0.0)?;

        let original_guids = optional_vector(s, "originalGuids")?
            .map(string_children)
            .transpose()?;

        tracing::debug!(
            guid = %guid,
            records = points.record_count,
            fields = prototype.len(),
            "Parsed point cloud"
        );

        Ok(Self {
            guid,
            file_offset: points.file_offset,
            records: points.record_count,
            prototype,
            codecs: points.codecs.clone(),
            section: points.section.clone(),
            name: optional_string(s, "name")?,
            description: optional_string(s, "description")?,
            cartesian_bounds: CartesianBounds::optional(s)?,
            spherical_bounds: SphericalBounds::optional(s)?,
            index_bounds: IndexBounds::optional(s)?,
            intensity_limits: IntensityLimits::optional(s)?,
            color_limits: ColorLimits::optional(s)?,
            grouping_schemes: PointGroupingSchemes::optional(s)?,
            transform: Transform::optional(s, "pose")?,
            acquisition_start: DateTime::optional(s, "acquisitionStart")?,
            acquisition_end: DateTime::optional(s, "acquisitionEnd")?,
            original_guids,
            sensor_vendor: optional_string(s, "sensorVendor")?,
            sensor_model: optional_string(s, "sensorModel")?,
            sensor_serial: optional_string(s, "sensorSerialNumber")?,
            sensor_hw_version: optional_string(s, "sensorHardwareVersion")?,
            sensor_sw_version: optional_string(s, "sensorSoftwareVersion")?,
            sensor_fw_version: optional_string(s, "sensorFirmwareVersion")?,
            temperature,
            humidity,
            atmospheric_pressure,
        })
    }
}
