//! Base types and raw field values.

use alloc::{string::String, vec::Vec};

/// A field value as stored on the wire, before profile scaling.
///
/// Values holding their base type's 'invalid' marker are never represented;
/// they decode to `None` instead.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RawValue {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<RawValue>),
}

impl RawValue {
    /// The value as an integer, if it is a scalar integer.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Unsigned(x) => i64::try_from(x).ok(),
            Self::Signed(x) => Some(x),
            _ => None,
        }
    }

    /// The value as a float, if it is a scalar number.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Unsigned(x) => Some(x as f64),
            Self::Signed(x) => Some(x as f64),
            Self::Float(x) => Some(x),
            _ => None,
        }
    }

    /// The first element of an array, or the value itself.
    pub fn scalar(&self) -> &Self {
        match self {
            Self::Array(items) => items.first().unwrap_or(self),
            _ => self,
        }
    }
}

/// A FIT base type, identified by the low five bits of its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Enum,
    Sint8,
    Uint8,
    Sint16,
    Uint16,
    Sint32,
    Uint32,
    String,
    Float32,
    Float64,
    Uint8z,
    Uint16z,
    Uint32z,
    Byte,
    Sint64,
    Uint64,
    Uint64z,
}

impl BaseType {
    /// Look up a base type from its code, ignoring the endian-ability bit.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code & 0x1F {
            0x00 => Self::Enum,
            0x01 => Self::Sint8,
            0x02 => Self::Uint8,
            0x03 => Self::Sint16,
            0x04 => Self::Uint16,
            0x05 => Self::Sint32,
            0x06 => Self::Uint32,
            0x07 => Self::String,
            0x08 => Self::Float32,
            0x09 => Self::Float64,
            0x0A => Self::Uint8z,
            0x0B => Self::Uint16z,
            0x0C => Self::Uint32z,
            0x0D => Self::Byte,
            0x0E => Self::Sint64,
            0x0F => Self::Uint64,
            0x10 => Self::Uint64z,
            _ => None?,
        })
    }

    /// Width in bytes of a single element.
    pub fn width(self) -> usize {
        match self {
            Self::Enum | Self::Sint8 | Self::Uint8 | Self::Uint8z | Self::Byte | Self::String => 1,
            Self::Sint16 | Self::Uint16 | Self::Uint16z => 2,
            Self::Sint32 | Self::Uint32 | Self::Uint32z | Self::Float32 => 4,
            Self::Float64 | Self::Sint64 | Self::Uint64 | Self::Uint64z => 8,
        }
    }

    /// Decode a field of this base type.
    ///
    /// Returns `None` when the field holds the 'invalid' marker, when every
    /// element of an array does, or when the field size is not a multiple of
    /// the element width.
    pub fn decode(self, r: &[u8], is_le: bool) -> Option<RawValue> {
        let width = self.width();
        if r.is_empty() || r.len() % width != 0 {
            return None;
        }

        match self {
            Self::String => {
                let end = r.iter().position(|&b| b == 0).unwrap_or(r.len());
                let s = core::str::from_utf8(&r[..end]).ok()?;
                (!s.is_empty()).then(|| RawValue::String(s.into()))
            }
            Self::Byte => {
                // A byte array is only invalid when every byte is.
                if r.iter().all(|&b| b == 0xFF) {
                    None
                } else if r.len() == 1 {
                    Some(RawValue::Unsigned(r[0] as u64))
                } else {
                    Some(RawValue::Bytes(r.into()))
                }
            }
            _ if r.len() == width => self.element(r, is_le),
            _ => {
                let items: Vec<_> = r
                    .chunks_exact(width)
                    .filter_map(|e| self.element(e, is_le))
                    .collect();
                (!items.is_empty()).then_some(RawValue::Array(items))
            }
        }
    }

    fn element(self, r: &[u8], is_le: bool) -> Option<RawValue> {
        match self {
            Self::Enum | Self::Uint8 | Self::Byte => U8::convert(r, is_le).map(unsigned),
            Self::Uint8z => U8Z::convert(r, is_le).map(unsigned),
            Self::Uint16 => U16::convert(r, is_le).map(unsigned),
            Self::Uint16z => U16Z::convert(r, is_le).map(unsigned),
            Self::Uint32 => U32::convert(r, is_le).map(unsigned),
            Self::Uint32z => U32Z::convert(r, is_le).map(unsigned),
            Self::Uint64 => U64::convert(r, is_le).map(RawValue::Unsigned),
            Self::Uint64z => U64Z::convert(r, is_le).map(RawValue::Unsigned),

            Self::Sint8 => I8::convert(r, is_le).map(signed),
            Self::Sint16 => I16::convert(r, is_le).map(signed),
            Self::Sint32 => I32::convert(r, is_le).map(signed),
            Self::Sint64 => I64::convert(r, is_le).map(RawValue::Signed),

            Self::Float32 => F32::convert(r, is_le).map(|x| RawValue::Float(x as f64)),
            Self::Float64 => F64::convert(r, is_le).map(RawValue::Float),

            Self::String => None,
        }
    }
}

fn unsigned(x: impl Into<u64>) -> RawValue {
    RawValue::Unsigned(x.into())
}

fn signed(x: impl Into<i64>) -> RawValue {
    RawValue::Signed(x.into())
}

/// Conversion from the bytes of one base type element to a primitive.
trait FieldInner {
    /// The primitive corresponding to this base type.
    type Into;

    /// Convert bytes of this base type to the corresponding primitive, if
    /// valid.
    fn convert(r: &[u8], is_le: bool) -> Option<Self::Into>;
}

macro_rules! field_inner {
    ($t:ident, $into:ident, $invalid:expr) => {
        struct $t;

        impl FieldInner for $t {
            type Into = $into;

            fn convert(r: &[u8], is_le: bool) -> Option<Self::Into> {
                let r = r.try_into().ok()?;
                let x = if is_le {
                    $into::from_le_bytes(r)
                } else {
                    $into::from_be_bytes(r)
                };

                (x.to_ne_bytes() != $invalid.to_ne_bytes()).then_some(x)
            }
        }
    };
}

field_inner!(U8, u8, u8::MAX);
field_inner!(U8Z, u8, u8::MIN);
field_inner!(U16, u16, u16::MAX);
field_inner!(U16Z, u16, u16::MIN);
field_inner!(U32, u32, u32::MAX);
field_inner!(U32Z, u32, u32::MIN);
field_inner!(U64, u64, u64::MAX);
field_inner!(U64Z, u64, u64::MIN);

field_inner!(I8, i8, i8::MAX);
field_inner!(I16, i16, i16::MAX);
field_inner!(I32, i32, i32::MAX);
field_inner!(I64, i64, i64::MAX);

// Float sentinels are all-ones bit patterns, compared bitwise.
field_inner!(F32, f32, f32::from_bits(u32::MAX));
field_inner!(F64, f64, f64::from_bits(u64::MAX));
