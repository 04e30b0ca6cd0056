//! Reader-based decoding.
//!
//! _Requires Cargo feature `std`._

use std::{io::Read, vec::Vec};

use crate::{aggregate::ParsedFitData, error::Error};

use super::{DecodeOptions, decode_slice};

/// Read a whole document from a reader, then decode it.
///
/// This method is also re-exported as `cassette::decode::decode_reader`.
///
/// _Requires Cargo feature `std`._
pub fn decode(r: &mut impl Read, options: &DecodeOptions) -> Result<ParsedFitData, Error> {
    let mut bytes = Vec::new();
    r.read_to_end(&mut bytes)?;

    decode_slice(&bytes, options)
}
