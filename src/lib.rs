#![no_std]

//! A resilient decoder for Garmin's Flexible and Interoperable Data Transfer
//! protocol, producing the activity data a training dashboard displays.
//!
//! Most users should call [`decode::decode_slice`] (or, with the `std`
//! feature, [`decode::decode_reader`]) and work with the returned
//! [`ParsedFitData`]: typed records, laps, sessions and device info, the
//! activity duration, summary statistics, and the raw message tree.
//!
//! The layers underneath are public for applications needing more:
//!
//! - [`wire`] reads the binary layout into raw values, holding all decoder
//! state in a [`wire::DecodeSession`].
//! - [`profile`] names and scales fields through a static table.
//! - [`decode::MessageReceiver`] lets applications collect messages the
//! [`aggregate::Aggregator`] ignores.
//! - [`inspect`] walks message boundaries of files too damaged to decode.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable reader-based decoding (default).
//! - `serde`: derive `Serialize` for decoded data.

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod aggregate;
pub mod decode;
pub mod error;
pub mod inspect;
pub mod message;
pub mod profile;
pub mod wire;

pub use aggregate::ParsedFitData;
pub use decode::{DecodeOptions, Strictness, decode_slice};
pub use error::Error;
pub use message::DecodedMessage;

#[cfg(feature = "std")]
pub use decode::decode_reader;
