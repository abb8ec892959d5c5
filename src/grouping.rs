use crate::element::Structure;
use crate::schema::{optional_structure, required_compressed_vector, required_string};
use crate::{Error, Result};

/// Optional point grouping schemes of a point cloud.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct PointGroupingSchemes {
    pub grouping_by_line: Option<GroupingByLine>,
}

impl PointGroupingSchemes {
    pub(crate) fn optional(parent: &Structure) -> Result<Option<Self>> {
        let Some(s) = optional_structure(parent, "pointGroupingSchemes")? else {
            return Ok(None);
        };
        let grouping_by_line = optional_structure(s, "groupingByLine")?
            .map(GroupingByLine::from_structure)
            .transpose()?;
        Ok(Some(Self { grouping_by_line }))
    }
}

/// Groups the points of a point cloud by row or column index.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct GroupingByLine {
    /// Either `rowIndex` or `columnIndex`.
    pub id_element_name: String,
    /// Number of groups in the binary section.
    pub group_count: u64,
    /// Names of the fields of each group record.
    pub group_fields: Vec<String>,
}

impl GroupingByLine {
    fn from_structure(s: &Structure) -> Result<Self> {
        let id_element_name = required_string(s, "idElementName")?;
        if id_element_name != "rowIndex" && id_element_name != "columnIndex" {
            Error::constraint(
                s.path_of("idElementName"),
                "'rowIndex' or 'columnIndex'",
                &id_element_name,
            )?
        }
        let groups = required_compressed_vector(s, "groups")?;
        let group_fields = groups
            .prototype
            .fields
            .iter()
            .map(|f| f.name.clone())
            .collect();
        Ok(Self {
            id_element_name,
            group_count: groups.record_count,
            group_fields,
        })
    }
}
