#![allow(dead_code)]

use cassette::{profile::FIT_EPOCH_OFFSET, wire::check::compute_crc};

pub const UINT8: u8 = 0x02;
pub const UINT16: u8 = 0x84;
pub const UINT32: u8 = 0x86;
pub const SINT8: u8 = 0x01;
pub const ENUM: u8 = 0x00;

/// Milliseconds since the Unix epoch for a FIT timestamp.
pub fn fit_ms(t: u32) -> i64 {
    (t as i64 + FIT_EPOCH_OFFSET) * 1000
}

/// Assembles FIT documents byte by byte.
#[derive(Debug, Clone)]
pub struct FitBuilder {
    header_size: u8,
    records: Vec<u8>,
}

impl Default for FitBuilder {
    fn default() -> Self {
        Self {
            header_size: 14,
            records: Vec::new(),
        }
    }
}

impl FitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn short_header(self) -> Self {
        self.header_size(12)
    }

    /// Header sizes of 14 or more carry a CRC; bytes past it are zero.
    pub fn header_size(mut self, header_size: u8) -> Self {
        self.header_size = header_size;
        self
    }

    /// A little-endian definition message.
    pub fn definition(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_inner(local, global, fields, None, true)
    }

    pub fn definition_be(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_inner(local, global, fields, None, false)
    }

    pub fn definition_dev(
        self,
        local: u8,
        global: u16,
        fields: &[(u8, u8, u8)],
        developer: &[(u8, u8, u8)],
    ) -> Self {
        self.definition_inner(local, global, fields, Some(developer), true)
    }

    fn definition_inner(
        mut self,
        local: u8,
        global: u16,
        fields: &[(u8, u8, u8)],
        developer: Option<&[(u8, u8, u8)]>,
        little_endian: bool,
    ) -> Self {
        let dev_flag = if developer.is_some() { 0x20 } else { 0 };
        self.records.push(0x40 | dev_flag | (local & 0xF));
        self.records.push(0);
        self.records.push(if little_endian { 0 } else { 1 });
        if little_endian {
            self.records.extend(global.to_le_bytes());
        } else {
            self.records.extend(global.to_be_bytes());
        }
        self.records.push(fields.len() as u8);
        for &(n, s, t) in fields {
            self.records.extend([n, s, t]);
        }
        if let Some(developer) = developer {
            self.records.push(developer.len() as u8);
            for &(n, s, i) in developer {
                self.records.extend([n, s, i]);
            }
        }
        self
    }

    /// A normal data message.
    pub fn data(mut self, local: u8, bytes: &[u8]) -> Self {
        self.records.push(local & 0xF);
        self.records.extend_from_slice(bytes);
        self
    }

    /// A compressed timestamp data message.
    pub fn compressed(mut self, local: u8, time_offset: u8, bytes: &[u8]) -> Self {
        self.records
            .push(0x80 | ((local & 0x3) << 5) | (time_offset & 0x1F));
        self.records.extend_from_slice(bytes);
        self
    }

    /// Bytes placed in the record section as is.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.records.extend_from_slice(bytes);
        self
    }

    /// The document, with header and file CRCs.
    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![self.header_size, 0x20];
        out.extend(2132u16.to_le_bytes());
        out.extend((self.records.len() as u32).to_le_bytes());
        out.extend(b".FIT");
        if self.header_size >= 14 {
            let crc = compute_crc(0, &out);
            out.extend(crc.to_le_bytes());
            out.resize(self.header_size as usize, 0);
        }
        out.extend_from_slice(&self.records);
        let crc = compute_crc(0, &out);
        out.extend(crc.to_le_bytes());
        out
    }
}

/// A record definition with a timestamp and power, on the given local type.
pub fn timestamp_power(builder: FitBuilder, local: u8) -> FitBuilder {
    builder.definition(local, 20, &[(253, 4, UINT32), (7, 2, UINT16)])
}

/// Data bytes for [`timestamp_power`].
pub fn ts_power(t: u32, power: u16) -> Vec<u8> {
    let mut v = t.to_le_bytes().to_vec();
    v.extend(power.to_le_bytes());
    v
}
