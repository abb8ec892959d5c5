use crate::bitpack::unpack;
use crate::packet::{DataPacket, PacketHeader};
use crate::paged_reader::{checked_physical_after, physical_after};
use crate::{Error, PointCloud, RecordValue, Result};
use std::io::{Read, Seek};

/// Decodes the values of all prototype fields of a point cloud.
///
/// Returns one vector with `records` values for each prototype field in prototype order.
/// Integer values have the field minimum added back, but scaled integers are not scaled.
pub fn read_fields<R: Read + Seek>(reader: &mut R, pc: &PointCloud) -> Result<Vec<Vec<RecordValue>>> {
    let field_count = pc.prototype.len();
    let record_count = usize::try_from(pc.records)
        .or_else(|_| Error::invalid(format!("Record count {} is too large", pc.records)))?;
    let widths: Vec<u32> = pc.prototype.iter().map(|r| r.data_type.bit_width()).collect();
    let needed: Vec<u64> = widths
        .iter()
        .map(|w| pc.records.saturating_mul(*w as u64).div_ceil(8))
        .collect();

    let mut streams = vec![Vec::new(); field_count];
    if pc.records > 0 && needed.iter().any(|n| *n > 0) {
        collect_streams(reader, pc, &needed, &mut streams)?;
    }

    let mut fields = Vec::with_capacity(field_count);
    for ((record, width), bytes) in pc.prototype.iter().zip(&widths).zip(&streams) {
        let values = if *width == 0 {
            // Fields with a single possible value do not occupy any bits
            vec![record.data_type.value_from_bits(0); record_count]
        } else {
            let raw = unpack(bytes, *width)?;
            if raw.len() < record_count {
                Error::invalid(format!(
                    "Byte stream of field '{}' contains {} values, expected {record_count}",
                    record.name.to_tag_name(),
                    raw.len()
                ))?
            }
            raw[..record_count]
                .iter()
                .map(|bits| record.data_type.value_from_bits(*bits))
                .collect()
        };
        fields.push(values);
    }
    Ok(fields)
}

/// Concatenates the byte streams of all data packets until every stream has enough bytes.
fn collect_streams<R: Read + Seek>(
    reader: &mut R,
    pc: &PointCloud,
    needed: &[u64],
    streams: &mut [Vec<u8>],
) -> Result<()> {
    let section = &pc.section;
    if section.data_offset == 0 {
        Error::invalid(format!(
            "Binary section at offset {} has no data packets for {} records",
            pc.file_offset, pc.records
        ))?
    }
    let section_end = match checked_physical_after(pc.file_offset, section.section_length) {
        Some(end) => end,
        None => Error::constraint(
            format!("compressed vector section length at offset {}", pc.file_offset),
            "section end inside the 64-bit address space",
            section.section_length,
        )?,
    };
    let mut offset = section.data_offset;
    let complete = |streams: &[Vec<u8>]| {
        streams
            .iter()
            .zip(needed)
            .all(|(s, n)| s.len() as u64 >= *n)
    };

    while !complete(streams) {
        if offset >= section_end {
            Error::invalid(format!(
                "Reached end of binary section at offset {} before all records were read",
                pc.file_offset
            ))?
        }
        match PacketHeader::read_at(reader, offset)? {
            PacketHeader::Data(header) => {
                if header.bytestream_count as usize != streams.len() {
                    Error::constraint(
                        format!("data packet byte stream count at offset {offset}"),
                        format!("{} streams for the prototype fields", streams.len()),
                        header.bytestream_count,
                    )?
                }
                let (packet, next) = DataPacket::read_at(reader, offset)?;
                for (target, bytes) in streams.iter_mut().zip(packet.streams) {
                    target.extend_from_slice(&bytes);
                }
                offset = next;
            }
            other => {
                tracing::trace!(offset, length = other.packet_length(), "Skipping packet");
                offset = physical_after(offset, other.packet_length());
            }
        }
    }
    Ok(())
}
