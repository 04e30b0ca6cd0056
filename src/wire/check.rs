//! FIT cyclic redundancy checks.

const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
    0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

/// Accumulate a slice of bytes into a CRC value, starting from `init`.
///
/// The CRC of a whole file is `compute_crc(0, bytes)`; continuing from a
/// previous result lets callers checksum a buffer in pieces.
pub fn compute_crc(init: u16, bytes: &[u8]) -> u16 {
    bytes.iter().fold(init, |crc, &b| {
        let crc = nibble(crc, b & 0xF);
        nibble(crc, b >> 4)
    })
}

fn nibble(crc: u16, n: u8) -> u16 {
    let tmp = CRC_TABLE[(crc & 0xF) as usize];
    ((crc >> 4) & 0x0FFF) ^ tmp ^ CRC_TABLE[n as usize]
}

/// Whether a stored CRC matches the bytes it covers.
///
/// A stored value of zero means the writer did not compute one, and always
/// passes.
pub fn verify(stored: u16, bytes: &[u8]) -> Result<(), (u16, u16)> {
    let calculated = compute_crc(0, bytes);
    if stored == 0 || stored == calculated {
        Ok(())
    } else {
        Err((stored, calculated))
    }
}
