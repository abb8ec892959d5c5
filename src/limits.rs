use crate::element::{Element, FloatPrecision, Structure};
use crate::schema::optional_structure;
use crate::{Error, RecordValue, Result};

fn extract_limit(limits: &Structure, name: &str) -> Result<Option<RecordValue>> {
    Ok(match limits.get(name) {
        Some(Element::Integer { value, .. }) => Some(RecordValue::Integer(*value)),
        Some(Element::ScaledInteger { value, .. }) => Some(RecordValue::ScaledInteger(*value)),
        Some(Element::Float {
            value,
            precision: FloatPrecision::Single,
            ..
        }) => Some(RecordValue::Single(*value as f32)),
        Some(Element::Float {
            value,
            precision: FloatPrecision::Double,
            ..
        }) => Some(RecordValue::Double(*value)),
        Some(other) => Error::mismatch(&limits.path_of(name), "numeric type", other.type_name())?,
        None => None,
    })
}

fn as_f64(value: &RecordValue) -> f64 {
    match value {
        RecordValue::Single(v) => *v as f64,
        RecordValue::Double(v) => *v,
        RecordValue::ScaledInteger(v) | RecordValue::Integer(v) => *v as f64,
    }
}

fn check_limit_pair(
    limits: &Structure,
    max_name: &str,
    min: &Option<RecordValue>,
    max: &Option<RecordValue>,
) -> Result<()> {
    if let (Some(min), Some(max)) = (min, max) {
        if as_f64(max) < as_f64(min) {
            Error::constraint(
                limits.path_of(max_name),
                format!(">= {}", as_f64(min)),
                as_f64(max),
            )?
        }
    }
    Ok(())
}

/// Optional minimum and maximum values for intensity.
#[derive(Clone, Debug, PartialEq)]
pub struct IntensityLimits {
    pub intensity_min: Option<RecordValue>,
    pub intensity_max: Option<RecordValue>,
}

impl IntensityLimits {
    pub(crate) fn optional(parent: &Structure) -> Result<Option<Self>> {
        let Some(s) = optional_structure(parent, "intensityLimits")? else {
            return Ok(None);
        };
        let intensity_min = extract_limit(s, "intensityMinimum")?;
        let intensity_max = extract_limit(s, "intensityMaximum")?;
        check_limit_pair(s, "intensityMaximum", &intensity_min, &intensity_max)?;
        Ok(Some(Self {
            intensity_min,
            intensity_max,
        }))
    }
}

/// Optional minimum and maximum values for the colors red, green and blue.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorLimits {
    pub red_min: Option<RecordValue>,
    pub red_max: Option<RecordValue>,
    pub green_min: Option<RecordValue>,
    pub green_max: Option<RecordValue>,
    pub blue_min: Option<RecordValue>,
    pub blue_max: Option<RecordValue>,
}

impl ColorLimits {
    pub(crate) fn optional(parent: &Structure) -> Result<Option<Self>> {
        let Some(s) = optional_structure(parent, "colorLimits")? else {
            return Ok(None);
        };
        let red_min = extract_limit(s, "colorRedMinimum")?;
        let red_max = extract_limit(s, "colorRedMaximum")?;
        let green_min = extract_limit(s, "colorGreenMinimum")?;
        let green_max = extract_limit(s, "colorGreenMaximum")?;
        let blue_min = extract_limit(s, "colorBlueMinimum")?;
        let blue_max = extract_limit(s, "colorBlueMaximum")?;
        check_limit_pair(s, "colorRedMaximum", &red_min, &red_max)?;
        check_limit_pair(s, "colorGreenMaximum", &green_min, &green_max)?;
        check_limit_pair(s, "colorBlueMaximum", &blue_min, &blue_max)?;
        Ok(Some(Self {
            red_min,
            red_max,
            green_min,
            green_max,
            blue_min,
            blue_max,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::testing::structure;

    #[test]
    fn limits_keep_their_type() {
        let s = structure(
            "/data3D/0",
            "<intensityLimits type=\"Structure\">\
             <intensityMinimum type=\"Float\" precision=\"single\">0</intensityMinimum>\
             <intensityMaximum type=\"Float\" precision=\"single\">1</intensityMaximum>\
             </intensityLimits>\
             <colorLimits type=\"Structure\">\
             <colorRedMinimum type=\"Integer\">0</colorRedMinimum>\
             <colorRedMaximum type=\"Integer\">255</colorRedMaximum>\
             </colorLimits>",
        );
        let intensity = IntensityLimits::optional(&s).unwrap().unwrap();
        assert_eq!(intensity.intensity_min, Some(RecordValue::Single(0.0)));
        assert_eq!(intensity.intensity_max, Some(RecordValue::Single(1.0)));
        let color = ColorLimits::optional(&s).unwrap().unwrap();
        assert_eq!(color.red_max, Some(RecordValue::Integer(255)));
        assert_eq!(color.green_min, None);
    }

    #[test]
    fn inverted_color_limits() {
        let s = structure(
            "/data3D/0",
            "<colorLimits type=\"Structure\">\
             <colorBlueMinimum type=\"Integer\">255</colorBlueMinimum>\
             <colorBlueMaximum type=\"Integer\">0</colorBlueMaximum>\
             </colorLimits>",
        );
        assert!(matches!(
            ColorLimits::optional(&s),
            Err(Error::ConstraintViolation { .. })
        ));
    }
}
