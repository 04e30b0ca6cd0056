//! Interpreted messages and typed views of them.

use alloc::{collections::BTreeMap, string::String, string::ToString};

use crate::{
    profile::{self, FieldValue, mesg_num},
    wire::{data::RawValue, session::DataMessage},
};

/// Named field values of an interpreted message.
pub type Fields = BTreeMap<&'static str, FieldValue>;

/// A data message, tagged by what its global message number means.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DecodedMessage {
    FileId(Fields),
    Record(Fields),
    Lap(Fields),
    Session(Fields),
    DeviceInfo(Fields),
    /// A message outside the profile, with its valid fields by number.
    Unknown {
        global: u16,
        fields: BTreeMap<u8, RawValue>,
    },
}

impl DecodedMessage {
    /// Interpret a data message through the profile.
    pub fn from_data(message: &DataMessage) -> Self {
        let global = message.global_message_number;

        let wrap: fn(Fields) -> Self = match global {
            mesg_num::FILE_ID => Self::FileId,
            mesg_num::RECORD => Self::Record,
            mesg_num::LAP => Self::Lap,
            mesg_num::SESSION => Self::Session,
            mesg_num::DEVICE_INFO => Self::DeviceInfo,
            _ => {
                let fields = message
                    .fields
                    .iter()
                    .filter_map(|f| Some((f.number, f.value.clone()?)))
                    .collect();
                return Self::Unknown { global, fields };
            }
        };

        let mut fields = Fields::new();
        for f in &message.fields {
            let Some(entry) = profile::lookup(global, f.number) else {
                continue;
            };
            let Some(value) = f.value.as_ref().and_then(|v| entry.convert(v)) else {
                continue;
            };

            if entry.fallback && fields.contains_key(entry.name) {
                continue;
            }
            fields.insert(entry.name, value);
        }

        wrap(fields)
    }

    pub fn global_message_number(&self) -> u16 {
        match self {
            Self::FileId(_) => mesg_num::FILE_ID,
            Self::Record(_) => mesg_num::RECORD,
            Self::Lap(_) => mesg_num::LAP,
            Self::Session(_) => mesg_num::SESSION,
            Self::DeviceInfo(_) => mesg_num::DEVICE_INFO,
            Self::Unknown { global, .. } => *global,
        }
    }

    /// Named fields, for messages within the profile.
    pub fn fields(&self) -> Option<&Fields> {
        match self {
            Self::FileId(f)
            | Self::Record(f)
            | Self::Lap(f)
            | Self::Session(f)
            | Self::DeviceInfo(f) => Some(f),
            Self::Unknown { .. } => None,
        }
    }
}

fn int<T: TryFrom<i64>>(fields: &Fields, name: &str) -> Option<T> {
    fields.get(name)?.as_i64()?.try_into().ok()
}

fn float(fields: &Fields, name: &str) -> Option<f64> {
    fields.get(name)?.as_f64()
}

fn time(fields: &Fields, name: &str) -> Option<i64> {
    fields.get(name)?.as_timestamp()
}

fn text(fields: &Fields, name: &str) -> Option<String> {
    match fields.get(name)? {
        FieldValue::Text(s) => Some(s.clone()),
        FieldValue::Integer(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One sample of an activity. Absent fields were not recorded.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Record {
    /// Milliseconds since the Unix epoch.
    pub timestamp: Option<i64>,
    /// Watts.
    pub power: Option<u16>,
    /// Revolutions per minute.
    pub cadence: Option<u8>,
    /// Beats per minute.
    pub heart_rate: Option<u8>,
    /// Kilometres per hour.
    pub speed: Option<f64>,
    /// Metres.
    pub distance: Option<f64>,
    /// Metres.
    pub altitude: Option<f64>,
    /// Degrees Celsius.
    pub temperature: Option<i8>,
    /// Degrees.
    pub position_lat: Option<f64>,
    /// Degrees.
    pub position_long: Option<f64>,
    /// Seconds since the first timestamped record, filled in by the
    /// aggregator.
    pub elapsed_time: Option<f64>,
}

impl Record {
    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            timestamp: time(fields, "timestamp"),
            power: int(fields, "power"),
            cadence: int(fields, "cadence"),
            heart_rate: int(fields, "heart_rate"),
            speed: float(fields, "speed"),
            distance: float(fields, "distance"),
            altitude: float(fields, "altitude"),
            temperature: int(fields, "temperature"),
            position_lat: float(fields, "position_lat"),
            position_long: float(fields, "position_long"),
            elapsed_time: None,
        }
    }

    /// Whether the record holds anything a chart or summary can use.
    pub fn is_meaningful(&self) -> bool {
        self.power.is_some()
            || self.cadence.is_some()
            || self.heart_rate.is_some()
            || self.timestamp.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Lap {
    pub timestamp: Option<i64>,
    pub start_time: Option<i64>,
    /// Seconds.
    pub total_elapsed_time: Option<f64>,
    pub total_timer_time: Option<f64>,
    /// Metres.
    pub total_distance: Option<f64>,
    pub total_calories: Option<u16>,
    pub avg_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub avg_power: Option<u16>,
    pub max_power: Option<u16>,
    pub normalized_power: Option<u16>,
    pub avg_cadence: Option<u8>,
    pub max_cadence: Option<u8>,
    pub avg_heart_rate: Option<u8>,
    pub max_heart_rate: Option<u8>,
}

impl Lap {
    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            timestamp: time(fields, "timestamp"),
            start_time: time(fields, "start_time"),
            total_elapsed_time: float(fields, "total_elapsed_time"),
            total_timer_time: float(fields, "total_timer_time"),
            total_distance: float(fields, "total_distance"),
            total_calories: int(fields, "total_calories"),
            avg_speed: float(fields, "avg_speed"),
            max_speed: float(fields, "max_speed"),
            avg_power: int(fields, "avg_power"),
            max_power: int(fields, "max_power"),
            normalized_power: int(fields, "normalized_power"),
            avg_cadence: int(fields, "avg_cadence"),
            max_cadence: int(fields, "max_cadence"),
            avg_heart_rate: int(fields, "avg_heart_rate"),
            max_heart_rate: int(fields, "max_heart_rate"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Session {
    pub timestamp: Option<i64>,
    pub start_time: Option<i64>,
    /// Sport name, or the raw enumeration value when it has no name.
    pub sport: Option<String>,
    pub sub_sport: Option<u8>,
    /// Seconds.
    pub total_elapsed_time: Option<f64>,
    pub total_timer_time: Option<f64>,
    /// Metres.
    pub total_distance: Option<f64>,
    pub total_calories: Option<u16>,
    pub avg_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub avg_power: Option<u16>,
    pub max_power: Option<u16>,
    pub normalized_power: Option<u16>,
    pub avg_cadence: Option<u8>,
    pub max_cadence: Option<u8>,
    pub avg_heart_rate: Option<u8>,
    pub max_heart_rate: Option<u8>,
    pub num_laps: Option<u16>,
}

impl Session {
    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            timestamp: time(fields, "timestamp"),
            start_time: time(fields, "start_time"),
            sport: text(fields, "sport"),
            sub_sport: int(fields, "sub_sport"),
            total_elapsed_time: float(fields, "total_elapsed_time"),
            total_timer_time: float(fields, "total_timer_time"),
            total_distance: float(fields, "total_distance"),
            total_calories: int(fields, "total_calories"),
            avg_speed: float(fields, "avg_speed"),
            max_speed: float(fields, "max_speed"),
            avg_power: int(fields, "avg_power"),
            max_power: int(fields, "max_power"),
            normalized_power: int(fields, "normalized_power"),
            avg_cadence: int(fields, "avg_cadence"),
            max_cadence: int(fields, "max_cadence"),
            avg_heart_rate: int(fields, "avg_heart_rate"),
            max_heart_rate: int(fields, "max_heart_rate"),
            num_laps: int(fields, "num_laps"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceInfo {
    pub timestamp: Option<i64>,
    pub device_index: Option<u8>,
    pub manufacturer: Option<u16>,
    pub product: Option<u16>,
    pub product_name: Option<String>,
    pub serial_number: Option<u32>,
    pub software_version: Option<f64>,
}

impl DeviceInfo {
    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            timestamp: time(fields, "timestamp"),
            device_index: int(fields, "device_index"),
            manufacturer: int(fields, "manufacturer"),
            product: int(fields, "product"),
            product_name: text(fields, "product_name"),
            serial_number: int(fields, "serial_number"),
            software_version: float(fields, "software_version"),
        }
    }

    pub fn manufacturer_name(&self) -> Option<&'static str> {
        profile::manufacturer_name(self.manufacturer?.into())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FileId {
    pub file_type: Option<u8>,
    pub manufacturer: Option<u16>,
    pub product: Option<u16>,
    pub product_name: Option<String>,
    pub serial_number: Option<u32>,
    pub time_created: Option<i64>,
    pub number: Option<u16>,
}

impl FileId {
    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            file_type: int(fields, "type"),
            manufacturer: int(fields, "manufacturer"),
            product: int(fields, "product"),
            product_name: text(fields, "product_name"),
            serial_number: int(fields, "serial_number"),
            time_created: time(fields, "time_created"),
            number: int(fields, "number"),
        }
    }

    pub fn manufacturer_name(&self) -> Option<&'static str> {
        profile::manufacturer_name(self.manufacturer?.into())
    }
}
