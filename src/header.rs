use crate::error::{Converter, WRONG_OFFSET};
use crate::paged_reader::PAGE_SIZE;
use crate::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

const SIGNATURE: &[u8; 8] = b"ASTM-E57";
const MAJOR_VERSION: u32 = 1;
const MINOR_VERSION: u32 = 0;

/// Represents the file structure from the start of an E57 file.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Header {
    /// File header signature that must be always "ASTM-E57".
    pub signature: [u8; 8],

    /// Major version number of the E57 format of the file.
    pub major: u32,

    /// Minor version number of the E57 format of the file.
    pub minor: u32,

    /// Physical length of the E57 file on disk or in memory.
    pub phys_length: u64,

    /// Physical offset of the XML data inside the XML file.
    pub phys_xml_offset: u64,

    /// Logical (without CRC bytes) length of the XML data.
    pub xml_length: u64,

    /// Page size of the E57 file.
    pub page_size: u64,
}

impl Header {
    /// Size of the binary header in bytes.
    pub const SIZE: usize = 48;

    /// Reads and validates the header from the start of the stream.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        reader
            .seek(SeekFrom::Start(0))
            .read_err("Cannot seek to start of E57 file")?;
        let mut data = [0_u8; Self::SIZE];
        reader
            .read_exact(&mut data)
            .map_err(|_| Error::TruncatedStream {
                offset: 0,
                expected: Self::SIZE as u64,
                actual: 0,
            })?;
        Self::from_array(&data)
    }

    /// Parses and validates the 48 header bytes.
    pub fn from_array(data: &[u8; Self::SIZE]) -> Result<Self> {
        let header = Header {
            signature: data[0..8].try_into().internal_err(WRONG_OFFSET)?,
            major: u32::from_le_bytes(data[8..12].try_into().internal_err(WRONG_OFFSET)?),
            minor: u32::from_le_bytes(data[12..16].try_into().internal_err(WRONG_OFFSET)?),
            phys_length: u64::from_le_bytes(data[16..24].try_into().internal_err(WRONG_OFFSET)?),
            phys_xml_offset: u64::from_le_bytes(
                data[24..32].try_into().internal_err(WRONG_OFFSET)?,
            ),
            xml_length: u64::from_le_bytes(data[32..40].try_into().internal_err(WRONG_OFFSET)?),
            page_size: u64::from_le_bytes(data[40..48].try_into().internal_err(WRONG_OFFSET)?),
        };

        if &header.signature != SIGNATURE {
            return Err(Error::BadSignature {
                found: header.signature,
            });
        }
        if header.major != MAJOR_VERSION || header.minor != MINOR_VERSION {
            return Err(Error::UnsupportedVersion {
                major: header.major,
                minor: header.minor,
            });
        }
        if header.page_size != PAGE_SIZE {
            return Err(Error::UnsupportedPageSize {
                page_size: header.page_size,
            });
        }

        tracing::debug!(
            phys_length = header.phys_length,
            xml_offset = header.phys_xml_offset,
            xml_length = header.xml_length,
            "Parsed E57 file header"
        );
        Ok(header)
    }
}
