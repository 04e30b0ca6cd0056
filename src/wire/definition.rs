//! Definition messages and the table holding them.

use alloc::vec::Vec;

use zerocopy::FromBytes;

use crate::error::Error;

use super::{cursor::Cursor, header::DefinitionHeader};

/// Layout of one field in a data message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldDefinition {
    /// Field definition number (for developer fields, the developer field
    /// number).
    pub number: u8,
    /// Size of the field in bytes.
    pub size: u8,
    /// Base type code (for developer fields, the developer data index).
    pub base_type: u8,
}

/// The field layout declared for a local message type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MessageDefinition {
    pub local_message_type: u8,
    pub global_message_number: u16,
    pub little_endian: bool,
    pub fields: Vec<FieldDefinition>,
    pub developer_fields: Vec<FieldDefinition>,
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct RawDefinition {
    _reserved: u8,
    architecture: u8,
    global_message: [u8; 2],
    fields_remaining: u8,
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct RawFieldDefinition {
    number: u8,
    size: u8,
    base_type: u8,
}

impl MessageDefinition {
    /// Decode the body of a definition message, the record header having
    /// already been read.
    pub fn decode(header: DefinitionHeader, c: &mut Cursor<'_>) -> Result<Self, Error> {
        let RawDefinition {
            architecture,
            global_message,
            fields_remaining,
            ..
        } = zerocopy::transmute!(c.read_array::<5>()?);

        let little_endian = architecture == 0;
        let global_message_number = if little_endian {
            u16::from_le_bytes(global_message)
        } else {
            u16::from_be_bytes(global_message)
        };

        let fields = decode_fields(c, fields_remaining)?;

        let developer_fields = if header.has_developer_fields {
            let n = c.read_u8()?;
            decode_fields(c, n)?
        } else {
            Vec::new()
        };

        Ok(Self {
            local_message_type: header.local_message_type,
            global_message_number,
            little_endian,
            fields,
            developer_fields,
        })
    }

    /// Total size in bytes of a data message using this definition, excluding
    /// its record header.
    pub fn data_size(&self) -> usize {
        self.fields
            .iter()
            .chain(&self.developer_fields)
            .map(|f| f.size as usize)
            .sum()
    }
}

fn decode_fields(c: &mut Cursor<'_>, n: u8) -> Result<Vec<FieldDefinition>, Error> {
    (0..n)
        .map(|_| -> Result<_, Error> {
            let RawFieldDefinition {
                number,
                size,
                base_type,
            } = zerocopy::transmute!(c.read_array::<3>()?);

            Ok(FieldDefinition {
                number,
                size,
                base_type,
            })
        })
        .collect()
}

/// Most recent definition for each of the 16 local message types.
///
/// A new definition replaces the previous one for its local type outright.
#[derive(Debug, Default)]
pub struct DefinitionTable([Option<MessageDefinition>; 16]);

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a definition under its local message type, returning the one it
    /// replaced.
    pub fn set(&mut self, definition: MessageDefinition) -> Option<MessageDefinition> {
        let slot = &mut self.0[(definition.local_message_type & 0xF) as usize];
        slot.replace(definition)
    }

    pub fn get(&self, local_message_type: u8) -> Option<&MessageDefinition> {
        self.0.get(local_message_type as usize)?.as_ref()
    }

    /// Number of local types currently holding a definition.
    pub fn len(&self) -> usize {
        self.0.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
