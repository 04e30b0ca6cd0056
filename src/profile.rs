//! Names, units and scaling for the fields this crate interprets.
//!
//! The profile is a closed, static table keyed by global message number and
//! field definition number. Fields absent from the table are left in the raw
//! tree but not named.

use alloc::string::{String, ToString};

use chrono::{DateTime, NaiveDateTime};

use crate::wire::data::RawValue;

/// Global message numbers.
pub mod mesg_num {
    pub const FILE_ID: u16 = 0;
    pub const SESSION: u16 = 18;
    pub const LAP: u16 = 19;
    pub const RECORD: u16 = 20;
    pub const DEVICE_INFO: u16 = 23;
}

/// Field number of the timestamp shared by all messages.
pub const TIMESTAMP_FIELD: u8 = 253;

/// Seconds between the Unix epoch and the FIT epoch (1989-12-31T00:00:00Z).
pub const FIT_EPOCH_OFFSET: i64 = 631_065_600;

/// An interpreted field value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Integer(x) | Self::Timestamp(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Integer(x) => Some(x as f64),
            Self::Float(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<i64> {
        match *self {
            Self::Timestamp(t) => Some(t),
            _ => None,
        }
    }
}

/// How a raw value becomes an engineering value.
#[derive(Debug, Clone, Copy)]
pub enum Conversion {
    /// Kept as is.
    Plain,
    /// `raw / scale - offset`.
    Scaled { scale: f64, offset: f64 },
    /// Seconds since the FIT epoch, to epoch milliseconds.
    Timestamp,
    /// Semicircles to degrees.
    Semicircles,
    /// Millimetres per second to kilometres per hour.
    SpeedKmh,
    /// Enumerated value, named through a lookup table.
    Enum(fn(u64) -> Option<&'static str>),
}

/// Profile entry for one field of one message.
#[derive(Debug, Clone, Copy)]
pub struct FieldProfile {
    pub message: u16,
    pub number: u8,
    pub name: &'static str,
    pub conversion: Conversion,
    /// Engineering values at or above this bound are implausible.
    pub limit: Option<f64>,
    /// Only fills the name when no other field has.
    pub fallback: bool,
}

const fn field(message: u16, number: u8, name: &'static str, conversion: Conversion) -> FieldProfile {
    FieldProfile {
        message,
        number,
        name,
        conversion,
        limit: None,
        fallback: false,
    }
}

const fn scaled(scale: f64, offset: f64) -> Conversion {
    Conversion::Scaled { scale, offset }
}

impl FieldProfile {
    const fn below(mut self, limit: f64) -> Self {
        self.limit = Some(limit);
        self
    }

    const fn fallback(mut self) -> Self {
        self.fallback = true;
        self
    }

    /// Convert a raw value according to this entry.
    ///
    /// Returns `None` when the value has the wrong shape or fails its
    /// plausibility bound.
    pub fn convert(&self, raw: &RawValue) -> Option<FieldValue> {
        let raw = raw.scalar();

        let value = match self.conversion {
            Conversion::Plain => match raw {
                RawValue::Unsigned(_) | RawValue::Signed(_) => FieldValue::Integer(raw.as_i64()?),
                RawValue::Float(x) => FieldValue::Float(*x),
                RawValue::String(s) => FieldValue::Text(s.clone()),
                _ => None?,
            },
            Conversion::Scaled { scale, offset } => {
                FieldValue::Float(apply_scale(raw.as_f64()?, scale, offset))
            }
            Conversion::Timestamp => {
                let t = u32::try_from(raw.as_i64()?).ok()?;
                FieldValue::Timestamp(epoch_millis(TimestampRepr::FitSeconds(t))?)
            }
            Conversion::Semicircles => FieldValue::Float(semicircles_to_degrees(raw.as_i64()?)),
            Conversion::SpeedKmh => FieldValue::Float(apply_scale(raw.as_f64()?, 1000.0, 0.0) * 3.6),
            Conversion::Enum(names) => {
                let n = u64::try_from(raw.as_i64()?).ok()?;
                match names(n) {
                    Some(name) => FieldValue::Text(name.to_string()),
                    None => FieldValue::Integer(n as i64),
                }
            }
        };

        if let (Some(limit), Some(x)) = (self.limit, value.as_f64()) {
            if x >= limit {
                return None;
            }
        }

        Some(value)
    }
}

static PROFILE: &[FieldProfile] = {
    use Conversion::*;
    use mesg_num::*;

    &[
        field(FILE_ID, 0, "type", Plain),
        field(FILE_ID, 1, "manufacturer", Plain),
        field(FILE_ID, 2, "product", Plain),
        field(FILE_ID, 3, "serial_number", Plain),
        field(FILE_ID, 4, "time_created", Timestamp),
        field(FILE_ID, 5, "number", Plain),
        field(FILE_ID, 8, "product_name", Plain),
        //
        field(SESSION, 253, "timestamp", Timestamp),
        field(SESSION, 2, "start_time", Timestamp),
        field(SESSION, 5, "sport", Enum(sport_name)),
        field(SESSION, 6, "sub_sport", Plain),
        field(SESSION, 7, "total_elapsed_time", scaled(1000.0, 0.0)),
        field(SESSION, 8, "total_timer_time", scaled(1000.0, 0.0)),
        field(SESSION, 9, "total_distance", scaled(100.0, 0.0)),
        field(SESSION, 11, "total_calories", Plain),
        field(SESSION, 14, "avg_speed", SpeedKmh),
        field(SESSION, 15, "max_speed", SpeedKmh),
        field(SESSION, 16, "avg_heart_rate", Plain),
        field(SESSION, 17, "max_heart_rate", Plain),
        field(SESSION, 18, "avg_cadence", Plain),
        field(SESSION, 19, "max_cadence", Plain),
        field(SESSION, 20, "avg_power", Plain),
        field(SESSION, 21, "max_power", Plain),
        field(SESSION, 26, "num_laps", Plain),
        field(SESSION, 34, "normalized_power", Plain),
        //
        field(LAP, 253, "timestamp", Timestamp),
        field(LAP, 2, "start_time", Timestamp),
        field(LAP, 7, "total_elapsed_time", scaled(1000.0, 0.0)),
        field(LAP, 8, "total_timer_time", scaled(1000.0, 0.0)),
        field(LAP, 9, "total_distance", scaled(100.0, 0.0)),
        field(LAP, 11, "total_calories", Plain),
        field(LAP, 13, "avg_speed", SpeedKmh),
        field(LAP, 14, "max_speed", SpeedKmh),
        field(LAP, 15, "avg_heart_rate", Plain),
        field(LAP, 16, "max_heart_rate", Plain),
        field(LAP, 17, "avg_cadence", Plain),
        field(LAP, 18, "max_cadence", Plain),
        field(LAP, 19, "avg_power", Plain),
        field(LAP, 20, "max_power", Plain),
        field(LAP, 33, "normalized_power", Plain),
        //
        field(RECORD, 253, "timestamp", Timestamp),
        field(RECORD, 0, "position_lat", Semicircles),
        field(RECORD, 1, "position_long", Semicircles),
        field(RECORD, 2, "altitude", scaled(5.0, 500.0)).fallback(),
        field(RECORD, 3, "cadence", Plain).below(200.0),
        field(RECORD, 4, "heart_rate", Plain),
        field(RECORD, 5, "distance", scaled(100.0, 0.0)),
        field(RECORD, 6, "speed", SpeedKmh).fallback(),
        field(RECORD, 7, "power", Plain),
        field(RECORD, 13, "temperature", Plain),
        field(RECORD, 73, "speed", SpeedKmh),
        field(RECORD, 78, "altitude", scaled(5.0, 500.0)),
        //
        field(DEVICE_INFO, 253, "timestamp", Timestamp),
        field(DEVICE_INFO, 0, "device_index", Plain),
        field(DEVICE_INFO, 1, "device_type", Plain),
        field(DEVICE_INFO, 2, "manufacturer", Plain),
        field(DEVICE_INFO, 3, "serial_number", Plain),
        field(DEVICE_INFO, 4, "product", Plain),
        field(DEVICE_INFO, 5, "software_version", scaled(100.0, 0.0)),
        field(DEVICE_INFO, 27, "product_name", Plain),
    ]
};

/// Find the profile entry for a field.
pub fn lookup(message: u16, number: u8) -> Option<&'static FieldProfile> {
    PROFILE
        .iter()
        .find(|p| p.message == message && p.number == number)
}

/// Name and convert a raw field value.
///
/// Scale and offset come from the field's entry in the profile table. Returns
/// `None` for fields outside the profile and for values failing their
/// plausibility bound.
pub fn map_field(message: u16, number: u8, raw: &RawValue) -> Option<(&'static str, FieldValue)> {
    map_field_scaled(message, number, raw, None)
}

/// Like [`map_field`], converting with `scale` and `offset` instead of the
/// profile's conversion when given.
pub fn map_field_scaled(
    message: u16,
    number: u8,
    raw: &RawValue,
    scale: Option<(f64, f64)>,
) -> Option<(&'static str, FieldValue)> {
    let profile = lookup(message, number)?;

    let value = match scale {
        Some((scale, offset)) => FieldProfile {
            conversion: Conversion::Scaled { scale, offset },
            ..*profile
        }
        .convert(raw)?,
        None => profile.convert(raw)?,
    };

    Some((profile.name, value))
}

/// Apply a profile scale and offset: `raw / scale - offset`.
pub fn apply_scale(raw: f64, scale: f64, offset: f64) -> f64 {
    raw / scale - offset
}

pub fn semicircles_to_degrees(x: i64) -> f64 {
    x as f64 * (180.0 / 2_147_483_648.0)
}

/// A timestamp in any of the representations the dashboard encounters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimestampRepr<'a> {
    /// Seconds since the FIT epoch, as stored in FIT files.
    FitSeconds(u32),
    EpochSeconds(f64),
    EpochMillis(i64),
    /// RFC 3339, or a naive date-time taken as UTC.
    Iso8601(&'a str),
}

/// Normalize a timestamp to milliseconds since the Unix epoch.
pub fn epoch_millis(repr: TimestampRepr<'_>) -> Option<i64> {
    match repr {
        TimestampRepr::FitSeconds(t) => Some((t as i64 + FIT_EPOCH_OFFSET) * 1000),
        TimestampRepr::EpochSeconds(t) => t.is_finite().then(|| (t * 1000.0) as i64),
        TimestampRepr::EpochMillis(t) => Some(t),
        TimestampRepr::Iso8601(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.timestamp_millis())
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .map(|t| t.and_utc().timestamp_millis())
                })
                .ok()
        }
    }
}

/// Name of a `sport` enumeration value.
pub fn sport_name(n: u64) -> Option<&'static str> {
    const SPORTS: [&str; 49] = [
        "generic",
        "running",
        "cycling",
        "transition",
        "fitness_equipment",
        "swimming",
        "basketball",
        "soccer",
        "tennis",
        "american_football",
        "training",
        "walking",
        "cross_country_skiing",
        "alpine_skiing",
        "snowboarding",
        "rowing",
        "mountaineering",
        "hiking",
        "multisport",
        "paddling",
        "flying",
        "e_biking",
        "motorcycling",
        "boating",
        "driving",
        "golf",
        "hang_gliding",
        "horseback_riding",
        "hunting",
        "fishing",
        "inline_skating",
        "rock_climbing",
        "sailing",
        "ice_skating",
        "sky_diving",
        "snowshoeing",
        "snowmobiling",
        "stand_up_paddleboarding",
        "surfing",
        "wakeboarding",
        "water_skiing",
        "kayaking",
        "rafting",
        "windsurfing",
        "kitesurfing",
        "tactical",
        "jumpmaster",
        "boxing",
        "floor_climbing",
    ];

    match n {
        254 => Some("all"),
        _ => SPORTS.get(usize::try_from(n).ok()?).copied(),
    }
}

/// Name of a `manufacturer` value, for the manufacturers commonly seen.
pub fn manufacturer_name(n: u64) -> Option<&'static str> {
    Some(match n {
        1 => "garmin",
        15 => "dynastream",
        23 => "suunto",
        32 => "wahoo_fitness",
        69 => "stages_cycling",
        89 => "tacx",
        255 => "development",
        260 => "zwift",
        265 => "strava",
        294 => "coros",
        _ => None?,
    })
}
