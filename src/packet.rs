use crate::error::{Converter, WRONG_OFFSET};
use crate::paged_reader::{physical_after, read_logical_bytes};
use crate::{Error, Result};
use std::io::{Read, Seek};

const INDEX_PACKET: u8 = 0;
const DATA_PACKET: u8 = 1;
const IGNORED_PACKET: u8 = 2;

const MAX_INDEX_ENTRIES: u16 = 2048;
const MAX_INDEX_LEVEL: u8 = 5;

fn le_u16(buffer: &[u8], start: usize) -> Result<u16> {
    Ok(u16::from_le_bytes(
        buffer[start..start + 2]
            .try_into()
            .internal_err(WRONG_OFFSET)?,
    ))
}

fn le_u64(buffer: &[u8], start: usize) -> Result<u64> {
    Ok(u64::from_le_bytes(
        buffer[start..start + 8]
            .try_into()
            .internal_err(WRONG_OFFSET)?,
    ))
}

fn check_packet_length(kind: &str, physical_offset: u64, packet_length: u64) -> Result<()> {
    if packet_length % 4 != 0 {
        Error::constraint(
            format!("{kind} packet length at offset {physical_offset}"),
            "multiple of four",
            packet_length,
        )?
    }
    Ok(())
}

/// Header of any packet found in a compressed vector section.
#[derive(Clone, Debug)]
pub enum PacketHeader {
    Index(IndexPacketHeader),
    Data(DataPacketHeader),
    Ignored { packet_length: u64 },
}

impl PacketHeader {
    /// Reads the packet type at the given physical offset and parses the matching header.
    pub fn read_at<R: Read + Seek>(reader: &mut R, physical_offset: u64) -> Result<Self> {
        let prefix = read_logical_bytes(reader, physical_offset, 4)?;
        match prefix[0] {
            INDEX_PACKET => Ok(Self::Index(IndexPacketHeader::read_at(
                reader,
                physical_offset,
            )?)),
            DATA_PACKET => Ok(Self::Data(DataPacketHeader::read_at(
                reader,
                physical_offset,
            )?)),
            IGNORED_PACKET => {
                let packet_length = le_u16(&prefix, 2)? as u64 + 1;
                check_packet_length("ignored", physical_offset, packet_length)?;
                Ok(Self::Ignored { packet_length })
            }
            other => Error::constraint(
                format!("packet type at offset {physical_offset}"),
                "packet type 0, 1 or 2",
                other,
            ),
        }
    }

    /// Logical length of the whole packet including its header.
    pub fn packet_length(&self) -> u64 {
        match self {
            Self::Index(h) => h.packet_length,
            Self::Data(h) => h.packet_length,
            Self::Ignored { packet_length } => *packet_length,
        }
    }
}

/// Header of a data packet containing chunks of one or more byte streams.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct DataPacketHeader {
    /// Indicates that the compressor state must be reset before this packet.
    pub comp_restart_flag: bool,
    /// Logical length of the packet including header and padding.
    pub packet_length: u64,
    /// Number of byte streams contained in this packet.
    pub bytestream_count: u16,
}

impl DataPacketHeader {
    pub const SIZE: u64 = 6;

    pub fn read_at<R: Read + Seek>(reader: &mut R, physical_offset: u64) -> Result<Self> {
        let buffer = read_logical_bytes(reader, physical_offset, Self::SIZE)?;
        if buffer[0] != DATA_PACKET {
            Error::constraint(
                format!("data packet type at offset {physical_offset}"),
                "packet type 1",
                buffer[0],
            )?
        }
        if buffer[1] > 1 {
            Error::constraint(
                format!("data packet flags at offset {physical_offset}"),
                "flags 0 or 1",
                buffer[1],
            )?
        }

        let header = Self {
            comp_restart_flag: buffer[1] & 1 != 0,
            packet_length: le_u16(&buffer, 2)? as u64 + 1,
            bytestream_count: le_u16(&buffer, 4)?,
        };

        check_packet_length("data", physical_offset, header.packet_length)?;
        if header.bytestream_count == 0 {
            Error::constraint(
                format!("data packet byte stream count at offset {physical_offset}"),
                "at least one byte stream",
                0,
            )?
        }

        Ok(header)
    }
}

/// A data packet with the bytes of each contained byte stream.
#[derive(Clone, Debug)]
pub struct DataPacket {
    pub header: DataPacketHeader,
    pub streams: Vec<Vec<u8>>,
}

impl DataPacket {
    /// Reads a complete data packet.
    /// Returns the packet and the physical offset of the following packet.
    pub fn read_at<R: Read + Seek>(reader: &mut R, physical_offset: u64) -> Result<(Self, u64)> {
        let header = DataPacketHeader::read_at(reader, physical_offset)?;
        let packet = read_logical_bytes(reader, physical_offset, header.packet_length)?;

        let count = header.bytestream_count as usize;
        let lengths_end = DataPacketHeader::SIZE as usize + count * 2;
        if lengths_end > packet.len() {
            Error::constraint(
                format!("data packet at offset {physical_offset}"),
                format!("room for {count} byte stream lengths"),
                format!("packet length {}", packet.len()),
            )?
        }

        let mut streams = Vec::with_capacity(count);
        let mut start = lengths_end;
        for i in 0..count {
            let length = le_u16(&packet, DataPacketHeader::SIZE as usize + i * 2)? as usize;
            let end = start + length;
            if end > packet.len() {
                Error::constraint(
                    format!("byte stream {i} of data packet at offset {physical_offset}"),
                    format!("end within packet length {}", packet.len()),
                    end,
                )?
            }
            streams.push(packet[start..end].to_vec());
            start = end;
        }

        let next = physical_after(physical_offset, header.packet_length);
        tracing::trace!(
            offset = physical_offset,
            length = header.packet_length,
            streams = count,
            "Read data packet"
        );
        Ok((Self { header, streams }, next))
    }
}

/// Header of an index packet used to seek inside a compressed vector section.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct IndexPacketHeader {
    /// Logical length of the packet including header and entries.
    pub packet_length: u64,
    /// Number of address entries following the header.
    pub entry_count: u16,
    /// Level in the index tree, zero for leaf packets pointing to data packets.
    pub index_level: u8,
}

impl IndexPacketHeader {
    pub const SIZE: u64 = 16;

    pub fn read_at<R: Read + Seek>(reader: &mut R, physical_offset: u64) -> Result<Self> {
        let buffer = read_logical_bytes(reader, physical_offset, Self::SIZE)?;
        if buffer[0] != INDEX_PACKET {
            Error::constraint(
                format!("index packet type at offset {physical_offset}"),
                "packet type 0",
                buffer[0],
            )?
        }

        let header = Self {
            packet_length: le_u16(&buffer, 2)? as u64 + 1,
            entry_count: le_u16(&buffer, 4)?,
            index_level: buffer[6],
        };

        check_packet_length("index", physical_offset, header.packet_length)?;
        if !(1..=MAX_INDEX_ENTRIES).contains(&header.entry_count) {
            Error::constraint(
                format!("index packet entry count at offset {physical_offset}"),
                format!("value in range [1, {MAX_INDEX_ENTRIES}]"),
                header.entry_count,
            )?
        }
        if header.index_level > MAX_INDEX_LEVEL {
            Error::constraint(
                format!("index packet level at offset {physical_offset}"),
                format!("value in range [0, {MAX_INDEX_LEVEL}]"),
                header.index_level,
            )?
        }
        let entries_end = Self::SIZE + header.entry_count as u64 * IndexPacketEntry::SIZE;
        if entries_end > header.packet_length {
            Error::constraint(
                format!("index packet length at offset {physical_offset}"),
                format!("room for {} entries", header.entry_count),
                header.packet_length,
            )?
        }

        Ok(header)
    }
}

/// Single address entry of an index packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexPacketEntry {
    /// Index of the first record in the referenced chunk.
    pub chunk_record_index: u64,
    /// Physical offset of the referenced data or index packet.
    pub packet_offset: u64,
}

impl IndexPacketEntry {
    pub const SIZE: u64 = 16;

    pub fn read_at<R: Read + Seek>(reader: &mut R, physical_offset: u64) -> Result<Self> {
        let buffer = read_logical_bytes(reader, physical_offset, Self::SIZE)?;
        Ok(Self {
            chunk_record_index: le_u64(&buffer, 0)?,
            packet_offset: le_u64(&buffer, 8)?,
        })
    }

    /// Reads all entries of the index packet that starts at the given physical offset.
    pub fn read_all<R: Read + Seek>(
        reader: &mut R,
        packet_offset: u64,
        header: &IndexPacketHeader,
    ) -> Result<Vec<Self>> {
        (0..header.entry_count as u64)
            .map(|i| {
                let logical = IndexPacketHeader::SIZE + i * Self::SIZE;
                Self::read_at(reader, physical_after(packet_offset, logical))
            })
            .collect()
    }
}
