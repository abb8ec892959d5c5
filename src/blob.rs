use crate::cv_section::BlobSectionHeader;
use crate::error::Converter;
use crate::paged_reader::{physical_after, read_logical_bytes, PAYLOAD_SIZE};
use crate::{Error, Result};
use std::io::{Read, Seek, Write};

/// Describes a binary blob section inside an E57 file.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Blob {
    /// Physical offset of the blob section header.
    pub offset: u64,
    /// Logical length of the blob data without section header.
    pub length: u64,
}

impl Blob {
    /// Validates the blob section header referenced by the blob.
    pub(crate) fn validate<R: Read + Seek>(&self, reader: &mut R, path: &str) -> Result<()> {
        let header = BlobSectionHeader::read_at(reader, self.offset)?;
        let fits = self
            .length
            .checked_add(BlobSectionHeader::SIZE)
            .is_some_and(|needed| needed <= header.section_length);
        if !fits {
            Error::constraint(
                path,
                format!(
                    "blob length fitting into section of {} bytes",
                    header.section_length
                ),
                self.length,
            )?
        }
        Ok(())
    }

    /// Copies the blob data into the supplied writer.
    /// Returns the number of written bytes.
    pub(crate) fn read<R: Read + Seek>(&self, reader: &mut R, writer: &mut dyn Write) -> Result<u64> {
        let mut position = physical_after(self.offset, BlobSectionHeader::SIZE);
        let mut remaining = self.length;
        while remaining > 0 {
            let chunk = u64::min(remaining, PAYLOAD_SIZE);
            let data = read_logical_bytes(reader, position, chunk)?;
            writer
                .write_all(&data)
                .read_err("Failed to write blob data into writer")?;
            position = physical_after(position, chunk);
            remaining -= chunk;
        }
        Ok(self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paged_reader::testing::paginate;
    use std::io::Cursor;

    fn blob_section(data: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0_u8; 8];
        bytes.extend_from_slice(&(data.len() as u64 + 16).to_le_bytes());
        bytes.extend_from_slice(data);
        bytes
    }

    #[test]
    fn read_blob_across_pages() {
        let data: Vec<u8> = (0..3000).map(|i| (i % 199) as u8).collect();
        let mut cursor = Cursor::new(paginate(&blob_section(&data)));
        let blob = Blob {
            offset: 0,
            length: data.len() as u64,
        };
        blob.validate(&mut cursor, "/blob").unwrap();
        let mut output = Vec::new();
        assert_eq!(blob.read(&mut cursor, &mut output).unwrap(), 3000);
        assert_eq!(output, data);
    }

    #[test]
    fn blob_longer_than_section() {
        let mut cursor = Cursor::new(paginate(&blob_section(&[1, 2, 3])));
        let blob = Blob {
            offset: 0,
            length: 4,
        };
        assert!(matches!(
            blob.validate(&mut cursor, "/blob"),
            Err(Error::ConstraintViolation { .. })
        ));
    }

    #[test]
    fn blob_length_at_end_of_address_space() {
        let data = [0_u8; 16];
        let mut cursor = Cursor::new(paginate(&blob_section(&data)));
        let blob = Blob {
            offset: 0,
            length: u64::MAX,
        };
        match blob.validate(&mut cursor, "/images2D/0/visualReferenceRepresentation/jpegImage") {
            Err(Error::ConstraintViolation { field, actual, .. }) => {
                assert_eq!(field, "/images2D/0/visualReferenceRepresentation/jpegImage");
                assert_eq!(actual, u64::MAX.to_string());
            }
            other => panic!("Unexpected result {other:?}"),
        }
    }
}
