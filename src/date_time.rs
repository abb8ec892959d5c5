use crate::element::Structure;
use crate::schema::{check_within, optional_integer, optional_structure, required_double};
use crate::Result;

/// Represents a specific date and time used in E57 files.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct DateTime {
    /// Number of seconds since GPS start epoch (00:00 UTC on January 6, 1980).
    pub gps_time: f64,
    /// True if the a global navigation satellite system device (such as GPS or GLONASS) was used to record the time.
    pub atomic_reference: bool,
}

impl DateTime {
    pub(crate) fn from_structure(s: &Structure) -> Result<Self> {
        let gps_time = required_double(s, "dateTimeValue")?;
        let atomic = optional_integer(s, "isAtomicClockReferenced")?;
        check_within(s, "isAtomicClockReferenced", atomic, 0, 1)?;
        Ok(Self {
            gps_time,
            atomic_reference: atomic == Some(1),
        })
    }

    pub(crate) fn optional(parent: &Structure, name: &str) -> Result<Option<Self>> {
        optional_structure(parent, name)?
            .map(Self::from_structure)
            .transpose()
    }
}
