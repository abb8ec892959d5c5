use crate::{Error, Result};

/// Position of the next bit to write in a [`BitBuffer`].
///
/// The cursor is a plain value owned by the caller.
/// Each successful write returns the advanced cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitCursor(u64);

impl BitCursor {
    /// Creates a cursor pointing to the given absolute bit offset.
    pub fn new(bit: u64) -> Self {
        Self(bit)
    }

    /// Absolute bit offset of the cursor.
    pub fn position(&self) -> u64 {
        self.0
    }

    /// Index of the byte that contains the next bit.
    pub fn byte(&self) -> usize {
        (self.0 / 8) as usize
    }

    /// Offset of the next bit inside its byte.
    pub fn bit(&self) -> u32 {
        (self.0 % 8) as u32
    }
}

/// Byte array used as bit addressable storage with a declared bit length.
///
/// Bits are numbered LSB-first, starting with bit 0 of byte 0.
#[derive(Clone, Debug)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    bit_len: u64,
}

impl BitBuffer {
    /// Creates a zeroed buffer that can hold the given amount of bits.
    pub fn with_bit_len(bit_len: u64) -> Self {
        Self {
            bytes: vec![0_u8; bit_len.div_ceil(8) as usize],
            bit_len,
        }
    }

    /// Wraps existing bytes, all bits of the bytes are addressable.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let bit_len = bytes.len() as u64 * 8;
        Self { bytes, bit_len }
    }

    /// Declared number of addressable bits.
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn check_range(&self, start: u64, bit_count: u32, max_bits: u32) -> Result<()> {
        if bit_count == 0 || bit_count > max_bits {
            return Err(Error::UnsupportedBitWidth { bits: bit_count });
        }
        match start.checked_add(bit_count as u64) {
            Some(end) if end <= self.bit_len => Ok(()),
            end => Err(Error::OutOfBounds {
                start,
                end: end.unwrap_or(u64::MAX),
                length: self.bit_len,
            }),
        }
    }

    /// Writes the lowest `bit_count` bits of the value at the cursor position.
    /// Returns the cursor pointing behind the written bits.
    /// Nothing is written if the bits do not fit into the buffer.
    pub fn push_bits(&mut self, cursor: BitCursor, value: u64, bit_count: u32) -> Result<BitCursor> {
        self.check_range(cursor.position(), bit_count, 64)?;
        let mut remaining = bit_count;
        let mut value = value;
        let mut byte = cursor.byte();
        let mut bit = cursor.bit();
        while remaining > 0 {
            let take = u32::min(8 - bit, remaining);
            let mask = ((1_u16 << take) - 1) as u8;
            let chunk = (value as u8) & mask;
            self.bytes[byte] = (self.bytes[byte] & !(mask << bit)) | (chunk << bit);
            value = value.checked_shr(take).unwrap_or(0);
            remaining -= take;
            bit = 0;
            byte += 1;
        }
        Ok(BitCursor(cursor.position() + bit_count as u64))
    }

    /// Reads up to 32 bits starting at the given bit offset.
    pub fn get_uint(&self, start: u64, bit_count: u32) -> Result<u32> {
        self.check_range(start, bit_count, 32)?;
        Ok(self.read_bits(start, bit_count) as u32)
    }

    /// Reads up to 64 bits starting at the given bit offset.
    pub fn get_ulong(&self, start: u64, bit_count: u32) -> Result<u64> {
        self.check_range(start, bit_count, 64)?;
        Ok(self.read_bits(start, bit_count))
    }

    fn read_bits(&self, start: u64, bit_count: u32) -> u64 {
        let mut value = 0_u64;
        let mut done = 0;
        let mut byte = (start / 8) as usize;
        let mut bit = (start % 8) as u32;
        while done < bit_count {
            let take = u32::min(8 - bit, bit_count - done);
            let mask = ((1_u16 << take) - 1) as u8;
            let chunk = (self.bytes[byte] >> bit) & mask;
            value |= (chunk as u64) << done;
            done += take;
            bit = 0;
            byte += 1;
        }
        value
    }
}

fn check_bits(bits: u32) -> Result<()> {
    if bits == 0 || bits > 64 {
        Err(Error::UnsupportedBitWidth { bits })
    } else {
        Ok(())
    }
}

/// Returns the number of bits used by the bit pack codec
/// to store integers in the inclusive range from min to max.
pub fn bits_for_range(min: i64, max: i64) -> u32 {
    let range = (max as i128 - min as i128) as u128;
    if range == 0 {
        0
    } else {
        128 - range.leading_zeros()
    }
}

/// Unpacks a tightly packed stream of unsigned integers with the given bit width.
///
/// Returns as many values as fit completely into the buffer.
pub fn unpack(buffer: &[u8], bits: u32) -> Result<Vec<u64>> {
    check_bits(bits)?;
    let count = buffer.len() * 8 / bits as usize;
    let mut output = Vec::with_capacity(count);
    match bits {
        8 => output.extend(buffer.iter().map(|&b| b as u64)),
        16 => output.extend(
            buffer
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]) as u64),
        ),
        24 => output.extend(
            buffer
                .chunks_exact(3)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], 0]) as u64),
        ),
        32 => output.extend(
            buffer
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as u64),
        ),
        64 => output.extend(buffer.chunks_exact(8).map(|c| {
            u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
        })),
        2 => {
            for &b in buffer {
                output.push((b & 3) as u64);
                output.push(((b >> 2) & 3) as u64);
                output.push(((b >> 4) & 3) as u64);
                output.push((b >> 6) as u64);
            }
        }
        4 => {
            for &b in buffer {
                output.push((b & 15) as u64);
                output.push((b >> 4) as u64);
            }
        }
        12 => {
            for c in buffer.chunks_exact(3) {
                let (b0, b1, b2) = (c[0] as u64, c[1] as u64, c[2] as u64);
                output.push(b0 | (b1 & 15) << 8);
                output.push(b1 >> 4 | b2 << 4);
            }
        }
        20 => {
            for c in buffer.chunks_exact(5) {
                let (b0, b1, b2) = (c[0] as u64, c[1] as u64, c[2] as u64);
                let (b3, b4) = (c[3] as u64, c[4] as u64);
                output.push(b0 | b1 << 8 | (b2 & 15) << 16);
                output.push(b2 >> 4 | b3 << 4 | b4 << 12);
            }
        }
        _ => return unpack_generic(buffer, bits),
    }

    // Values at the end that do not fill a complete chunk of the fast path
    if output.len() < count {
        let tail = BitBuffer::from_bytes(buffer.to_vec());
        for i in output.len()..count {
            output.push(tail.get_ulong(i as u64 * bits as u64, bits)?);
        }
    }

    Ok(output)
}

/// Reference implementation of [`unpack`] that reads each value from a [`BitBuffer`].
pub fn unpack_generic(buffer: &[u8], bits: u32) -> Result<Vec<u64>> {
    check_bits(bits)?;
    let count = buffer.len() as u64 * 8 / bits as u64;
    let buffer = BitBuffer::from_bytes(buffer.to_vec());
    (0..count)
        .map(|i| buffer.get_ulong(i * bits as u64, bits))
        .collect()
}

/// Packs the lowest bits of all values LSB-first into a new byte buffer.
pub fn pack(values: &[u64], bits: u32) -> Result<Vec<u8>> {
    check_bits(bits)?;
    let mut buffer = BitBuffer::with_bit_len(values.len() as u64 * bits as u64);
    let mut cursor = BitCursor::default();
    for &value in values {
        cursor = buffer.push_bits(cursor, value, bits)?;
    }
    Ok(buffer.into_bytes())
}
