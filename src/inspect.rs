//! A lenient message-boundary walk for low-level inspection.
//!
//! Unlike [`crate::decode`], nothing here fails: a bad signature, a truncated
//! message or an undefined local type is recorded and the walk carries on (or
//! stops) with what it has. Only header fields and message sizes are read, so
//! files too damaged for the full decoder can still be examined.

use alloc::{string::String, vec::Vec};
use core::fmt::Write;

use either::Either::{Left, Right};

use crate::wire::{
    cursor::Cursor,
    definition::MessageDefinition,
    header::{self, DataHeader, FileHeader},
};

/// Header fields read without validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HeaderFields {
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    pub data_size: u32,
    pub signature: [u8; 4],
    pub signature_valid: bool,
}

/// What starts at a message boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BoundaryKind {
    Definition {
        local: u8,
        global: u16,
        fields: usize,
    },
    Data {
        local: u8,
        global: u16,
        time_offset: Option<u8>,
    },
    /// A data header byte whose local type has no definition.
    Undefined { local: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Boundary {
    pub offset: usize,
    /// Length including the record header byte.
    pub length: usize,
    pub header_byte: u8,
    pub kind: BoundaryKind,
}

/// Result of walking a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Inspection {
    pub header: Option<HeaderFields>,
    pub boundaries: Vec<Boundary>,
    /// Where and why the walk stopped early.
    pub stopped: Option<(usize, &'static str)>,
}

/// Walk the message boundaries of a document.
pub fn inspect(bytes: &[u8]) -> Inspection {
    let mut inspection = Inspection::default();
    let c = Cursor::new(bytes);

    let Ok(raw) = c.array_at::<{ FileHeader::BASE_SIZE }>(0) else {
        inspection.stopped = Some((0, "buffer shorter than a header"));
        return inspection;
    };

    let header = HeaderFields {
        header_size: raw[0],
        protocol_version: raw[1],
        profile_version: u16::from_le_bytes([raw[2], raw[3]]),
        data_size: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
        signature: [raw[8], raw[9], raw[10], raw[11]],
        signature_valid: &raw[8..12] == b".FIT",
    };
    inspection.header = Some(header);

    let start = (header.header_size as usize).max(FileHeader::BASE_SIZE);
    let end = (start + header.data_size as usize).min(bytes.len());
    let mut c = Cursor::at(bytes, start);

    // Global number and data size per local type.
    let mut sizes: [Option<(u16, usize)>; 16] = [None; 16];

    while c.position() < end {
        let offset = c.position();
        let Ok(r) = c.read_u8() else { break };

        let kind = match header::classify(r) {
            Left(state) => {
                let Ok(definition) = MessageDefinition::decode(state, &mut c) else {
                    inspection.stopped = Some((offset, "truncated definition message"));
                    break;
                };

                sizes[definition.local_message_type as usize] =
                    Some((definition.global_message_number, definition.data_size()));

                BoundaryKind::Definition {
                    local: definition.local_message_type,
                    global: definition.global_message_number,
                    fields: definition.fields.len() + definition.developer_fields.len(),
                }
            }
            Right(DataHeader {
                local_message_type: local,
                time_offset,
            }) => match sizes[local as usize] {
                Some((global, size)) => {
                    if c.skip(size).is_err() {
                        inspection.stopped = Some((offset, "truncated data message"));
                        break;
                    }

                    BoundaryKind::Data {
                        local,
                        global,
                        time_offset,
                    }
                }
                None => BoundaryKind::Undefined { local },
            },
        };

        inspection.boundaries.push(Boundary {
            offset,
            length: c.position() - offset,
            header_byte: r,
            kind,
        });
    }

    inspection
}

/// Format bytes as a hex dump, sixteen per line, with offsets and an ASCII
/// column.
pub fn hex_dump(bytes: &[u8], start: usize, len: usize) -> String {
    let end = start.saturating_add(len).min(bytes.len());
    let mut out = String::new();

    let Some(bytes) = bytes.get(start..end) else {
        return out;
    };

    for (i, line) in bytes.chunks(16).enumerate() {
        let _ = write!(out, "{:08x} ", start + i * 16);

        for j in 0..16 {
            match line.get(j) {
                Some(b) => {
                    let _ = write!(out, " {b:02x}");
                }
                None => out.push_str("   "),
            }
        }

        out.push_str("  |");
        out.extend(line.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        }));
        out.push_str("|\n");
    }

    out
}
