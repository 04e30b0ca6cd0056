//! Document and record headers.

use either::Either::{self, Left, Right};
use tartan_bitfield::bitfield;
use zerocopy::FromBytes;

use crate::error::Error;

use super::cursor::Cursor;

/// The header at the start of every FIT document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FileHeader {
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    /// Number of record bytes following the header, excluding the file CRC.
    pub data_size: u32,
    pub signature: [u8; 4],
    /// Header CRC, present in 14-byte headers.
    pub crc: Option<u16>,
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct RawFileHeader {
    header_size: u8,
    protocol_version: u8,
    profile_version: [u8; 2],
    data_size: [u8; 4],
    signature: [u8; 4],
}

impl FileHeader {
    /// Length of the fixed header fields shared by all header sizes.
    pub const BASE_SIZE: usize = 12;

    /// Decode the header from the start of a document.
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let c = Cursor::new(bytes);

        let RawFileHeader {
            header_size,
            protocol_version,
            profile_version,
            data_size,
            signature,
        } = zerocopy::transmute!(c.array_at::<12>(0)?);

        if &signature != b".FIT" {
            Err(Error::InvalidSignature(signature))?;
        }

        if (header_size as usize) < Self::BASE_SIZE {
            Err(Error::UnknownHeaderLength(header_size))?;
        }

        let crc = if header_size >= 14 {
            Some(c.u16_at(12, true)?)
        } else {
            None
        };

        Ok(Self {
            header_size,
            protocol_version,
            profile_version: u16::from_le_bytes(profile_version),
            data_size: u32::from_le_bytes(data_size),
            signature,
            crc,
        })
    }

    /// Offset of the first record header.
    pub fn records_start(&self) -> usize {
        self.header_size as usize
    }

    /// Offset one past the last record byte, as declared by the header.
    pub fn records_end(&self) -> usize {
        self.records_start() + self.data_size as usize
    }

    pub fn signature_str(&self) -> &str {
        core::str::from_utf8(&self.signature).unwrap_or("")
    }
}

bitfield! {
    struct RawRecordHeader(u8) {
        [7] is_compressed,
    }
}

bitfield! {
    struct CompressedHeader(u8) {
        [0..5] time_offset: u8,
        [5..7] local_message: u8,
    }
}

bitfield! {
    struct NormalHeader(u8) {
        [0..4] local_message: u8,
        [5] is_developer,
        [6] is_definition,
    }
}

/// A record header announcing a definition message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefinitionHeader {
    pub local_message_type: u8,
    /// Developer field definitions follow the regular ones.
    pub has_developer_fields: bool,
}

/// A record header announcing a data message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    pub local_message_type: u8,
    /// The 5-bit time offset of a compressed timestamp header.
    pub time_offset: Option<u8>,
}

/// Classify a record header byte.
///
/// Bit 7 marks a compressed timestamp header (always data, local type in bits
/// 5-6). Otherwise bit 6 separates definitions from data, with the local type
/// in bits 0-3.
pub fn classify(r: u8) -> Either<DefinitionHeader, DataHeader> {
    if RawRecordHeader(r).is_compressed() {
        let header = CompressedHeader(r);

        Right(DataHeader {
            local_message_type: header.local_message(),
            time_offset: Some(header.time_offset()),
        })
    } else {
        let header = NormalHeader(r);
        let local_message_type = header.local_message();

        if header.is_definition() {
            Left(DefinitionHeader {
                local_message_type,
                has_developer_fields: header.is_developer(),
            })
        } else {
            Right(DataHeader {
                local_message_type,
                time_offset: None,
            })
        }
    }
}
