use crate::error::{Converter, WRONG_OFFSET};
use crate::paged_reader::{checked_physical_after, read_logical_bytes};
use crate::{Error, Result};
use std::io::{Read, Seek};

/// Binary header at the start of a compressed vector section.
///
/// All offsets are physical file offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct CompressedVectorSectionHeader {
    /// Logical length of the whole section including this header.
    pub section_length: u64,
    /// Physical offset of the first data packet.
    pub data_offset: u64,
    /// Physical offset of the root index packet or zero if there is no index.
    pub index_offset: u64,
}

impl CompressedVectorSectionHeader {
    pub const SIZE: u64 = 32;
    const SECTION_ID: u8 = 1;

    /// Reads and validates the section header at the given physical offset.
    pub fn read_at<R: Read + Seek>(reader: &mut R, physical_offset: u64) -> Result<Self> {
        let buffer = read_logical_bytes(reader, physical_offset, Self::SIZE)?;
        let header = Self::from_bytes(&buffer, physical_offset)?;
        tracing::debug!(
            offset = physical_offset,
            section_length = header.section_length,
            data_offset = header.data_offset,
            index_offset = header.index_offset,
            "Parsed compressed vector section header"
        );
        Ok(header)
    }

    fn from_bytes(buffer: &[u8], physical_offset: u64) -> Result<Self> {
        if buffer[0] != Self::SECTION_ID {
            Error::constraint(
                format!("compressed vector section ID at offset {physical_offset}"),
                "section ID 1",
                buffer[0],
            )?
        }
        if buffer[1..8].iter().any(|b| *b != 0) {
            return Err(Error::ReservedFieldNonZero {
                section: "compressed vector section header",
                offset: physical_offset,
            });
        }

        let header = Self {
            section_length: u64::from_le_bytes(
                buffer[8..16].try_into().internal_err(WRONG_OFFSET)?,
            ),
            data_offset: u64::from_le_bytes(buffer[16..24].try_into().internal_err(WRONG_OFFSET)?),
            index_offset: u64::from_le_bytes(
                buffer[24..32].try_into().internal_err(WRONG_OFFSET)?,
            ),
        };

        if header.section_length % 4 != 0 {
            Error::constraint(
                format!("compressed vector section length at offset {physical_offset}"),
                "multiple of four",
                header.section_length,
            )?
        }
        if header.section_length < Self::SIZE {
            Error::constraint(
                format!("compressed vector section length at offset {physical_offset}"),
                format!("at least {} bytes", Self::SIZE),
                header.section_length,
            )?
        }
        if checked_physical_after(physical_offset, header.section_length).is_none() {
            Error::constraint(
                format!("compressed vector section length at offset {physical_offset}"),
                "section end inside the 64-bit address space",
                header.section_length,
            )?
        }
        if header.data_offset != 0 && header.data_offset <= physical_offset {
            Error::constraint(
                format!("compressed vector data offset at offset {physical_offset}"),
                format!("offset behind section start {physical_offset}"),
                header.data_offset,
            )?
        }

        Ok(header)
    }
}

/// Binary header at the start of a blob section.
#[derive(Clone, Debug)]
pub(crate) struct BlobSectionHeader {
    pub section_length: u64,
}

impl BlobSectionHeader {
    pub const SIZE: u64 = 16;

    pub fn read_at<R: Read + Seek>(reader: &mut R, physical_offset: u64) -> Result<Self> {
        let buffer = read_logical_bytes(reader, physical_offset, Self::SIZE)?;
        if buffer[0] != 0 {
            Error::constraint(
                format!("blob section ID at offset {physical_offset}"),
                "section ID 0",
                buffer[0],
            )?
        }
        if buffer[1..8].iter().any(|b| *b != 0) {
            return Err(Error::ReservedFieldNonZero {
                section: "blob section header",
                offset: physical_offset,
            });
        }
        Ok(Self {
            section_length: u64::from_le_bytes(
                buffer[8..16].try_into().internal_err(WRONG_OFFSET)?,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paged_reader::testing::paginate;
    use std::io::Cursor;

    fn section_bytes(id: u8, length: u64, data: u64, index: u64) -> Vec<u8> {
        let mut bytes = vec![id, 0, 0, 0, 0, 0, 0, 0];
        bytes.extend_from_slice(&length.to_le_bytes());
        bytes.extend_from_slice(&data.to_le_bytes());
        bytes.extend_from_slice(&index.to_le_bytes());
        bytes
    }

    #[test]
    fn valid_header() {
        let mut cursor = Cursor::new(paginate(&section_bytes(1, 64, 32, 0)));
        let header = CompressedVectorSectionHeader::read_at(&mut cursor, 0).unwrap();
        assert_eq!(header.section_length, 64);
        assert_eq!(header.data_offset, 32);
        assert_eq!(header.index_offset, 0);
    }

    #[test]
    fn header_spanning_pages() {
        let mut logical = vec![0_u8; 1000];
        logical.extend(section_bytes(1, 128, 1060, 0));
        let mut cursor = Cursor::new(paginate(&logical));
        let header = CompressedVectorSectionHeader::read_at(&mut cursor, 1000).unwrap();
        assert_eq!(header.section_length, 128);
        assert_eq!(header.data_offset, 1060);
    }

    #[test]
    fn wrong_section_id() {
        let mut cursor = Cursor::new(paginate(&section_bytes(0, 64, 32, 0)));
        assert!(matches!(
            CompressedVectorSectionHeader::read_at(&mut cursor, 0),
            Err(Error::ConstraintViolation { .. })
        ));
    }

    #[test]
    fn reserved_bytes_not_zero() {
        let mut bytes = section_bytes(1, 64, 32, 0);
        bytes[5] = 1;
        let mut cursor = Cursor::new(paginate(&bytes));
        assert!(matches!(
            CompressedVectorSectionHeader::read_at(&mut cursor, 0),
            Err(Error::ReservedFieldNonZero { offset: 0, .. })
        ));
    }

    #[test]
    fn unaligned_section_length() {
        let mut cursor = Cursor::new(paginate(&section_bytes(1, 63, 32, 0)));
        assert!(matches!(
            CompressedVectorSectionHeader::read_at(&mut cursor, 0),
            Err(Error::ConstraintViolation { .. })
        ));
    }

    #[test]
    fn section_length_beyond_address_space() {
        let mut cursor = Cursor::new(paginate(&section_bytes(1, u64::MAX - 3, 32, 0)));
        match CompressedVectorSectionHeader::read_at(&mut cursor, 0) {
            Err(Error::ConstraintViolation { field, actual, .. }) => {
                assert_eq!(field, "compressed vector section length at offset 0");
                assert_eq!(actual, (u64::MAX - 3).to_string());
            }
            other => panic!("Unexpected result {other:?}"),
        }
    }

    #[test]
    fn blob_header() {
        let mut bytes = vec![0_u8; 8];
        bytes.extend_from_slice(&20_u64.to_le_bytes());
        let mut cursor = Cursor::new(paginate(&bytes));
        let header = BlobSectionHeader::read_at(&mut cursor, 0).unwrap();
        assert_eq!(header.section_length, 20);

        bytes[0] = 1;
        let mut cursor = Cursor::new(paginate(&bytes));
        assert!(BlobSectionHeader::read_at(&mut cursor, 0).is_err());
    }
}
