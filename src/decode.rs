//! Entry points for decoding whole documents.
//!
//! [`decode_slice`] (and, with the `std` feature, [`decode_reader`]) turn a
//! document into [`ParsedFitData`]. Applications wanting messages beyond those
//! the aggregator collects can implement [`MessageReceiver`] and drive
//! [`decode_with`] themselves.

#[cfg(feature = "std")]
pub mod reader;

#[cfg(feature = "std")]
pub use reader::decode as decode_reader;

use tracing::debug;

use crate::{
    aggregate::{Aggregator, ParsedFitData},
    error::Error,
    message::DecodedMessage,
    wire::{DecodeSession, session::DataMessage},
};

/// What to do with a data message whose local type has no definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Skip the header byte and try the next one.
    #[default]
    Resynchronize,
    /// Fail with [`Error::UnknownLocalType`].
    Abort,
}

/// Options controlling a decode.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub strictness: Strictness,
    /// Check the header and file CRCs, failing on a mismatch.
    pub verify_crc: bool,
    /// Keep every data message in [`ParsedFitData::raw`].
    pub retain_raw: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strictness: Strictness::default(),
            verify_crc: false,
            retain_raw: true,
        }
    }
}

impl DecodeOptions {
    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn verify_crc(mut self, verify_crc: bool) -> Self {
        self.verify_crc = verify_crc;
        self
    }

    pub fn retain_raw(mut self, retain_raw: bool) -> Self {
        self.retain_raw = retain_raw;
        self
    }
}

/// Counters describing what a decode absorbed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostics {
    pub definition_messages: usize,
    pub data_messages: usize,
    /// Header bytes skipped because their local type had no definition.
    pub skipped_bytes: usize,
    /// Compressed timestamp messages read before any full timestamp.
    pub dropped_messages: usize,
    /// Data messages outside the profile. Counted by the aggregator.
    pub unknown_messages: usize,
}

/// Receive messages as they are decoded.
///
/// The default implementation of `add_raw` ignores raw messages.
pub trait MessageReceiver {
    /// Add an interpreted message.
    fn add_message(&mut self, message: DecodedMessage);

    /// Add a data message as read from the wire, before interpretation.
    #[allow(unused_variables)]
    fn add_raw(&mut self, message: &DataMessage) {}
}

/// Decode a document, publishing every data message to a receiver.
pub fn decode_with(
    r: &[u8],
    options: &DecodeOptions,
    o: &mut impl MessageReceiver,
) -> Result<Diagnostics, Error> {
    drain(DecodeSession::new(r, options)?, o)
}

fn drain(mut session: DecodeSession<'_>, o: &mut impl MessageReceiver) -> Result<Diagnostics, Error> {
    while let Some(message) = session.next_message()? {
        o.add_raw(&message);
        o.add_message(DecodedMessage::from_data(&message));
    }

    let diagnostics = *session.diagnostics();
    debug!(
        data = diagnostics.data_messages,
        definitions = diagnostics.definition_messages,
        skipped = diagnostics.skipped_bytes,
        dropped = diagnostics.dropped_messages,
        "finished decoding"
    );

    Ok(diagnostics)
}

/// Decode a document held in a slice.
///
/// Fails with [`Error::NoValidRecords`] when no record carries power,
/// cadence, heart rate or a timestamp.
pub fn decode_slice(r: &[u8], options: &DecodeOptions) -> Result<ParsedFitData, Error> {
    let session = DecodeSession::new(r, options)?;
    let header = *session.header();

    let mut aggregator = Aggregator::new(options.retain_raw);
    let diagnostics = drain(session, &mut aggregator)?;

    aggregator.finish(header, diagnostics)
}
