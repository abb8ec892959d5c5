use crate::element::Structure;
use crate::schema::{check_ordered, optional_double, optional_integer, optional_structure};
use crate::Result;

/// Optional minimum and maximum values for Cartesian X, Y and Z coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CartesianBounds {
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    pub z_min: Option<f64>,
    pub z_max: Option<f64>,
}

impl CartesianBounds {
    pub(crate) fn optional(parent: &Structure) -> Result<Option<Self>> {
        let Some(s) = optional_structure(parent, "cartesianBounds")? else {
            return Ok(None);
        };
        let x_min = optional_double(s, "xMinimum")?;
        let x_max = optional_double(s, "xMaximum")?;
        let y_min = optional_double(s, "yMinimum")?;
        let y_max = optional_double(s, "yMaximum")?;
        let z_min = optional_double(s, "zMinimum")?;
        let z_max = optional_double(s, "zMaximum")?;
        check_ordered(s, "xMaximum", x_min, x_max)?;
        check_ordered(s, "yMaximum", y_min, y_max)?;
        check_ordered(s, "zMaximum", z_min, z_max)?;
        Ok(Some(Self {
            x_min,
            x_max,
            y_min,
            y_max,
            z_min,
            z_max,
        }))
    }
}

/// Optional minimum and maximum values for spherical coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SphericalBounds {
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
    pub elevation_min: Option<f64>,
    pub elevation_max: Option<f64>,
    pub azimuth_start: Option<f64>,
    pub azimuth_end: Option<f64>,
}

impl SphericalBounds {
    pub(crate) fn optional(parent: &Structure) -> Result<Option<Self>> {
        let Some(s) = optional_structure(parent, "sphericalBounds")? else {
            return Ok(None);
        };
        let range_min = optional_double(s, "rangeMinimum")?;
        let range_max = optional_double(s, "rangeMaximum")?;
        let elevation_min = optional_double(s, "elevationMinimum")?;
        let elevation_max = optional_double(s, "elevationMaximum")?;
        let azimuth_start = optional_double(s, "azimuthStart")?;
        let azimuth_end = optional_double(s, "azimuthEnd")?;
        check_ordered(s, "rangeMaximum", range_min, range_max)?;
        check_ordered(s, "elevationMaximum", elevation_min, elevation_max)?;
        // Azimuth may wrap around, so start and end are not ordered.
        Ok(Some(Self {
            range_min,
            range_max,
            elevation_min,
            elevation_max,
            azimuth_start,
            azimuth_end,
        }))
    }
}

/// Optional minimum and maximum values for the row, column and return indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexBounds {
    pub row_min: Option<i64>,
    pub row_max: Option<i64>,
    pub column_min: Option<i64>,
    pub column_max: Option<i64>,
    pub return_min: Option<i64>,
    pub return_max: Option<i64>,
}

impl IndexBounds {
    pub(crate) fn optional(parent: &Structure) -> Result<Option<Self>> {
        let Some(s) = optional_structure(parent, "indexBounds")? else {
            return Ok(None);
        };
        let row_min = optional_integer(s, "rowMinimum")?;
        let row_max = optional_integer(s, "rowMaximum")?;
        let column_min = optional_integer(s, "columnMinimum")?;
        let column_max = optional_integer(s, "columnMaximum")?;
        let return_min = optional_integer(s, "returnMinimum")?;
        let return_max = optional_integer(s, "returnMaximum")?;
        check_ordered(s, "rowMaximum", row_min, row_max)?;
        check_ordered(s, "columnMaximum", column_min, column_max)?;
        check_ordered(s, "returnMaximum", return_min, return_max)?;
        Ok(Some(Self {
            row_min,
            row_max,
            column_min,
            column_max,
            return_min,
            return_max,
        }))
    }
}
