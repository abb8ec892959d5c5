/// Table driven CRC-32C (Castagnoli) as used for the E57 page checksums.
/// Only used when the optional `crc32c` feature with hardware support is disabled.
pub struct Crc32 {
    table: [u32; 256],
}

impl Crc32 {
    const POLYNOMIAL: u32 = 0x82_F6_3B_78;

    pub fn new() -> Self {
        let mut table = [0_u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut val = i as u32;
            for _ in 0..8 {
                val = if val & 1 == 0 {
                    val >> 1
                } else {
                    (val >> 1) ^ Self::POLYNOMIAL
                };
            }
            *entry = val;
        }
        Self { table }
    }

    pub fn calculate(&self, data: &[u8]) -> u32 {
        !data.iter().fold(!0, |sum, &next| {
            let index = (sum ^ next as u32) as u8;
            self.table[index as usize] ^ (sum >> 8)
        })
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculates the CRC-32C checksum of the payload of a page.
#[cfg(not(feature = "crc32c"))]
pub fn page_checksum(crc: &Crc32, payload: &[u8]) -> u32 {
    crc.calculate(payload)
}

/// Calculates the CRC-32C checksum of the payload of a page.
#[cfg(feature = "crc32c")]
pub fn page_checksum(_crc: &Crc32, payload: &[u8]) -> u32 {
    crc32c::crc32c(payload)
}
