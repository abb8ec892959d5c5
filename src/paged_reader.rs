use crate::crc32::{page_checksum, Crc32};
use crate::error::Converter;
use crate::{Error, Result};
use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// Physical size of a single E57 page including its checksum.
pub const PAGE_SIZE: u64 = 1024;
/// Size of the CRC trailer at the end of each page.
pub const CHECKSUM_SIZE: u64 = 4;
/// Number of payload bytes per page.
pub const PAYLOAD_SIZE: u64 = PAGE_SIZE - CHECKSUM_SIZE;

/// Converts a physical file offset into a logical offset without checksums.
pub fn physical_to_logical(physical: u64) -> u64 {
    physical - CHECKSUM_SIZE * (physical / PAGE_SIZE)
}

/// Converts a logical offset into a physical file offset.
///
/// Logical offsets that are a multiple of the payload size map onto
/// the first byte of the corresponding physical page.
pub fn logical_to_physical(logical: u64) -> u64 {
    logical + CHECKSUM_SIZE * (logical / PAYLOAD_SIZE)
}

/// Returns the physical offset that is reached when reading
/// the given amount of logical bytes starting at a physical offset.
pub fn physical_after(start_physical: u64, count_logical: u64) -> u64 {
    logical_to_physical(physical_to_logical(start_physical) + count_logical)
}

/// Same as [`physical_after`], but returns `None` if the end is not addressable with 64 bits.
pub fn checked_physical_after(start_physical: u64, count_logical: u64) -> Option<u64> {
    let logical = physical_to_logical(start_physical).checked_add(count_logical)?;
    logical.checked_add(CHECKSUM_SIZE * (logical / PAYLOAD_SIZE))
}

/// Reads a range of logical bytes starting at a physical offset.
///
/// The checksum trailer at the end of each page is skipped transparently.
/// Checksums are not validated here, see [`verify_checksums`] for that.
/// The stream position is modified by this function.
pub fn read_logical_bytes<R: Read + Seek>(
    reader: &mut R,
    start_physical: u64,
    count_logical: u64,
) -> Result<Vec<u8>> {
    if start_physical % PAGE_SIZE >= PAYLOAD_SIZE {
        Error::invalid(format!(
            "Physical offset {start_physical} points into a page checksum"
        ))?
    }

    let mut data = Vec::with_capacity(count_logical as usize);
    let mut position = start_physical;
    reader
        .seek(SeekFrom::Start(position))
        .read_err(format!("Cannot seek to physical offset {position}"))?;

    while (data.len() as u64) < count_logical {
        let page_readable = PAYLOAD_SIZE - position % PAGE_SIZE;
        let missing = count_logical - data.len() as u64;
        let chunk_size = u64::min(page_readable, missing);

        let before = data.len();
        let read = reader
            .by_ref()
            .take(chunk_size)
            .read_to_end(&mut data)
            .read_err(format!("Failed to read page data at offset {position}"))?;
        if (read as u64) < chunk_size {
            return Err(Error::TruncatedStream {
                offset: start_physical,
                expected: count_logical,
                actual: (before + read) as u64,
            });
        }
        position += chunk_size;

        // Skip checksum if we reached the end of the page payload
        if (data.len() as u64) < count_logical {
            position += CHECKSUM_SIZE;
            reader
                .seek(SeekFrom::Start(position))
                .read_err(format!("Cannot seek to physical offset {position}"))?;
        }
    }

    tracing::trace!(
        start_physical,
        count_logical,
        end_physical = position,
        "Read logical byte range"
    );
    Ok(data)
}

/// Checks the CRC checksums of all pages in a stream.
///
/// Fails on the first page with a checksum mismatch.
pub fn verify_checksums<R: Read + Seek>(reader: &mut R, total_length: u64) -> Result<()> {
    if total_length % PAGE_SIZE != 0 {
        return Err(Error::InvalidFileSize {
            length: total_length,
        });
    }

    reader
        .seek(SeekFrom::Start(0))
        .read_err("Cannot seek to start of file for checksum validation")?;

    let crc = Crc32::new();
    let mut page = [0_u8; PAGE_SIZE as usize];
    let pages = total_length / PAGE_SIZE;
    for index in 0..pages {
        let offset = index * PAGE_SIZE;
        if let Err(err) = reader.read_exact(&mut page) {
            if err.kind() == ErrorKind::UnexpectedEof {
                return Err(Error::TruncatedStream {
                    offset,
                    expected: PAGE_SIZE,
                    actual: 0,
                });
            }
            return Err(err).read_err(format!("Failed to read page at offset {offset}"));
        }

        let payload = &page[..PAYLOAD_SIZE as usize];
        let mut trailer = [0_u8; CHECKSUM_SIZE as usize];
        trailer.copy_from_slice(&page[PAYLOAD_SIZE as usize..]);

        // All other binary values in E57 files are little endian,
        // but the checksum is stored in big endian byte order.
        let expected = u32::from_be_bytes(trailer);
        let actual = page_checksum(&crc, payload);
        if expected != actual {
            return Err(Error::ChecksumMismatch {
                offset,
                expected,
                actual,
            });
        }
        tracing::trace!(page = index, "Validated page checksum");
    }

    tracing::debug!(pages, "Validated all page checksums");
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Splits logical bytes into pages with valid checksums.
    /// The last page is padded with zeros.
    pub fn paginate(logical: &[u8]) -> Vec<u8> {
        let crc = Crc32::new();
        let mut physical = Vec::new();
        for chunk in logical.chunks(PAYLOAD_SIZE as usize) {
            let mut payload = chunk.to_vec();
            payload.resize(PAYLOAD_SIZE as usize, 0);
            let checksum = crc.calculate(&payload);
            physical.extend_from_slice(&payload);
            physical.extend_from_slice(&checksum.to_be_bytes());
        }
        if physical.is_empty() {
            physical = paginate(&[0_u8; 1]);
        }
        physical
    }
}
