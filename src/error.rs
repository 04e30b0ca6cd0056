use thiserror::Error;

use crate::wire::cursor::OutOfBounds;

/// Errors that abort a decode.
///
/// Anomalies confined to a single message (unknown local types, sentinel
/// values, compressed timestamps without a base) are absorbed by the decoder
/// and reported through [`crate::decode::Diagnostics`] instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A read ran past the end of the buffer.
    #[error("Buffer truncated: needed {needed} bytes at offset {offset}, buffer holds {len}.")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        len: usize,
    },
    /// The header signature was not `.FIT`.
    #[error("Incorrect file type marker ({0:?}).")]
    InvalidSignature([u8; 4]),
    /// The header declared a size too small to hold its own fields.
    #[error("Unknown header length ({0}).")]
    UnknownHeaderLength(u8),
    /// A data message referenced a local type with no prior definition.
    ///
    /// Only raised under [`crate::decode::Strictness::Abort`].
    #[error("Data message at offset {offset} references undefined local type {local}.")]
    UnknownLocalType { local: u8, offset: usize },
    /// Calculated and found CRC values do not match.
    #[error("Calculated ({calculated}) and found ({found}) CRC values do not match.")]
    CyclicRedundancyCheck { found: u16, calculated: u16 },
    /// The stream decoded, but no record carried meaningful data.
    #[error("No record contains power, cadence, heart rate or a timestamp.")]
    NoValidRecords,
    /// An error from the supplied reader.
    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<OutOfBounds> for Error {
    fn from(err: OutOfBounds) -> Self {
        let OutOfBounds {
            offset,
            needed,
            len,
        } = err;
        Self::TruncatedBuffer {
            offset,
            needed,
            len,
        }
    }
}

impl Error {
    /// A short reason suitable for showing next to the file name.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidSignature(_) | Self::UnknownHeaderLength(_) => "not a valid FIT file",
            Self::NoValidRecords => "no valid data found",
            Self::TruncatedBuffer { .. }
            | Self::UnknownLocalType { .. }
            | Self::CyclicRedundancyCheck { .. } => "cannot parse file",
            #[cfg(feature = "std")]
            Self::Io(_) => "cannot parse file",
        }
    }
}
