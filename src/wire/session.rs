//! The record stream state machine.

use alloc::vec::Vec;

use either::Either::{Left, Right};
use tracing::{debug, trace, warn};

use crate::{
    decode::{DecodeOptions, Diagnostics, Strictness},
    error::Error,
    profile::{self, mesg_num},
    wire::check,
};

use super::{
    cursor::Cursor,
    data::{BaseType, RawValue},
    definition::{DefinitionTable, FieldDefinition, MessageDefinition},
    header::{self, DataHeader, FileHeader},
};

/// One field of a data message as read from the wire.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RawField {
    pub number: u8,
    pub base_type: u8,
    pub size: u8,
    /// `None` for invalid markers and unsupported base types.
    pub value: Option<RawValue>,
}

/// A data message with its fields read but not yet interpreted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DataMessage {
    /// Offset of the record header in the document.
    pub offset: usize,
    pub local_message_type: u8,
    pub global_message_number: u16,
    /// Time offset from a compressed timestamp header.
    pub time_offset: Option<u8>,
    /// Timestamp in seconds since the FIT epoch, from field 253 or resolved
    /// from a compressed timestamp header.
    pub timestamp: Option<u32>,
    pub fields: Vec<RawField>,
    pub developer_fields: Vec<RawField>,
}

impl DataMessage {
    /// The value of a field, if present and valid.
    pub fn field(&self, number: u8) -> Option<&RawValue> {
        self.fields
            .iter()
            .find(|f| f.number == number)
            .and_then(|f| f.value.as_ref())
    }
}

/// Resolve a compressed time offset against the last full timestamp.
///
/// The offset holds the low five bits of the timestamp, so the result lies in
/// the 32 seconds starting at `last`.
pub fn resolve_compressed_timestamp(last: u32, offset: u8) -> u32 {
    let offset = (offset & 0x1F) as u32;
    last.wrapping_add((offset + 32 - (last & 0x1F)) % 32)
}

/// State for decoding one document.
///
/// Every piece of mutable decoder state lives here, so independent sessions
/// never interfere.
#[derive(Debug)]
pub struct DecodeSession<'a> {
    cursor: Cursor<'a>,
    header: FileHeader,
    end: usize,
    definitions: DefinitionTable,
    last_timestamp: Option<u32>,
    strictness: Strictness,
    diagnostics: Diagnostics,
}

impl<'a> DecodeSession<'a> {
    /// Decode the document header and position the session at the first
    /// record.
    pub fn new(bytes: &'a [u8], options: &DecodeOptions) -> Result<Self, Error> {
        let header = FileHeader::decode(bytes)?;

        if bytes.len() < header.records_start() {
            Err(Error::TruncatedBuffer {
                offset: 0,
                needed: header.records_start(),
                len: bytes.len(),
            })?;
        }

        let cursor = Cursor::at(bytes, header.records_start());

        if options.verify_crc {
            verify_crcs(&cursor, &header)?;
        }

        // Tolerate a declared data size running past the buffer.
        let end = header.records_end().min(bytes.len());

        Ok(Self {
            cursor,
            header,
            end,
            definitions: DefinitionTable::new(),
            last_timestamp: None,
            strictness: options.strictness,
            diagnostics: Diagnostics::default(),
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn definitions(&self) -> &DefinitionTable {
        &self.definitions
    }

    /// Last full timestamp seen in a record message.
    pub fn last_timestamp(&self) -> Option<u32> {
        self.last_timestamp
    }

    /// Advance to the next data message.
    ///
    /// Definition messages are absorbed into the definition table. Returns
    /// `None` once the record section is exhausted.
    pub fn next_message(&mut self) -> Result<Option<DataMessage>, Error> {
        while self.cursor.position() < self.end {
            let offset = self.cursor.position();
            let r = self.cursor.read_u8()?;

            let data = match header::classify(r) {
                Left(state) => {
                    let definition = MessageDefinition::decode(state, &mut self.cursor)?;
                    debug!(
                        offset,
                        local = definition.local_message_type,
                        global = definition.global_message_number,
                        fields = definition.fields.len(),
                        "registered definition"
                    );
                    self.definitions.set(definition);
                    self.diagnostics.definition_messages += 1;
                    continue;
                }
                Right(state) => state,
            };

            if let Some(message) = self.decode_data(offset, data)? {
                self.diagnostics.data_messages += 1;
                return Ok(Some(message));
            }
        }

        Ok(None)
    }

    fn decode_data(
        &mut self,
        offset: usize,
        header: DataHeader,
    ) -> Result<Option<DataMessage>, Error> {
        let DataHeader {
            local_message_type: local,
            time_offset,
        } = header;

        let Some(definition) = self.definitions.get(local) else {
            if self.strictness == Strictness::Abort {
                Err(Error::UnknownLocalType { local, offset })?;
            }

            // The header byte has been consumed; resume at the next byte.
            warn!(offset, local, "skipping byte with undefined local type");
            self.diagnostics.skipped_bytes += 1;
            return Ok(None);
        };

        let le = definition.little_endian;
        let fields = read_fields(&mut self.cursor, &definition.fields, |f, r| {
            match BaseType::from_code(f.base_type) {
                Some(t) => t.decode(r, le),
                None => {
                    warn!(field = f.number, base_type = f.base_type, "unsupported base type");
                    None
                }
            }
        })?;
        // Developer fields carry no profile here; keep their bytes for the raw
        // tree only.
        let developer_fields = read_fields(&mut self.cursor, &definition.developer_fields, |_, r| {
            Some(RawValue::Bytes(r.into()))
        })?;

        let mut message = DataMessage {
            offset,
            local_message_type: local,
            global_message_number: definition.global_message_number,
            time_offset,
            timestamp: None,
            fields,
            developer_fields,
        };

        trace!(
            offset,
            global = message.global_message_number,
            fields = message.fields.len(),
            "decoded data message"
        );

        if let Some(time_offset) = time_offset {
            let Some(last) = self.last_timestamp else {
                warn!(offset, "dropping compressed timestamp message without a base");
                self.diagnostics.dropped_messages += 1;
                return Ok(None);
            };

            let timestamp = resolve_compressed_timestamp(last, time_offset);
            message.timestamp = Some(timestamp);
            message.fields.retain(|f| f.number != profile::TIMESTAMP_FIELD);
            message.fields.push(RawField {
                number: profile::TIMESTAMP_FIELD,
                base_type: 0x86,
                size: 4,
                value: Some(RawValue::Unsigned(timestamp as u64)),
            });
        } else {
            message.timestamp = message
                .field(profile::TIMESTAMP_FIELD)
                .and_then(RawValue::as_i64)
                .and_then(|t| u32::try_from(t).ok());

            if message.global_message_number == mesg_num::RECORD {
                if let Some(timestamp) = message.timestamp {
                    self.last_timestamp = Some(timestamp);
                }
            }
        }

        Ok(Some(message))
    }
}

/// Read the fields of a data message, decoding each with `decode`.
///
/// Bytes are consumed even for fields that fail to decode.
fn read_fields(
    c: &mut Cursor<'_>,
    definitions: &[FieldDefinition],
    decode: impl Fn(&FieldDefinition, &[u8]) -> Option<RawValue>,
) -> Result<Vec<RawField>, Error> {
    definitions
        .iter()
        .map(|f| -> Result<_, Error> {
            let r = c.read_bytes(f.size as usize)?;
            Ok(RawField {
                number: f.number,
                base_type: f.base_type,
                size: f.size,
                value: decode(f, r),
            })
        })
        .collect()
}

fn verify_crcs(c: &Cursor<'_>, header: &FileHeader) -> Result<(), Error> {
    if let Some(stored) = header.crc {
        let covered = c.bytes_at(0, FileHeader::BASE_SIZE)?;
        check::verify(stored, covered)
            .map_err(|(found, calculated)| Error::CyclicRedundancyCheck { found, calculated })?;
    }

    let end = header.records_end();
    let stored = c.u16_at(end, true)?;

    check::verify(stored, c.bytes_at(0, end)?)
        .map_err(|(found, calculated)| Error::CyclicRedundancyCheck { found, calculated })
}
