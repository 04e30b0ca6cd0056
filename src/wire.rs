//! Wire-level decoding of FIT documents.
//!
//! This module reads the binary layout and nothing more: it knows how to find
//! the header, record headers, definitions and field bytes, and how to turn
//! field bytes into [`RawValue`](data::RawValue)s with their 'invalid' markers
//! removed. Naming and scaling fields is left to [`crate::profile`].
//!
//! # Architecture
//!
//! A [`DecodeSession`] owns every piece of state a decode needs: the
//! [`Cursor`](cursor::Cursor), the [`DefinitionTable`](definition::DefinitionTable)
//! and the last full timestamp used to expand compressed timestamp headers.
//! Each call to [`DecodeSession::next_message`] reads record headers until it
//! reaches a data message, absorbing definition messages along the way.
//!
//! Per-message anomalies are absorbed:
//!
//! - A data message whose local type has no definition cannot be sized. Its
//! header byte is skipped and decoding resumes at the next byte, unless the
//! session was configured to abort.
//!
//! - A compressed timestamp message seen before any full timestamp is read
//! and dropped.
//!
//! - Fields with unsupported base types are consumed and left without a value.
//!
//! Reads running past the end of the buffer abort the decode.

pub mod check;
pub mod cursor;
pub mod data;
pub mod definition;
pub mod header;
pub mod session;

pub use session::DecodeSession;
