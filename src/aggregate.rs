//! Collecting decoded messages into activity data.

use alloc::vec::Vec;

use tracing::warn;

use crate::{
    decode::{Diagnostics, MessageReceiver},
    error::Error,
    message::{DecodedMessage, DeviceInfo, FileId, Lap, Record, Session},
    wire::{header::FileHeader, session::DataMessage},
};

/// Minimum, mean and maximum of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Stats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl Stats {
    /// Compute statistics over the present values, or `None` if there are
    /// none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut n = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for x in values {
            n += 1;
            sum += x;
            min = min.min(x);
            max = max.max(x);
        }

        (n != 0).then(|| Self {
            min,
            avg: sum / n as f64,
            max,
        })
    }
}

/// Scalar aggregates for summary cards.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Summary {
    pub record_count: usize,
    pub lap_count: usize,
    pub session_count: usize,
    pub power: Option<Stats>,
    pub cadence: Option<Stats>,
    pub heart_rate: Option<Stats>,
    pub speed: Option<Stats>,
    pub altitude: Option<Stats>,
    pub temperature: Option<Stats>,
}

impl Summary {
    fn new(records: &[Record], laps: &[Lap], sessions: &[Session]) -> Self {
        fn stats<T: Into<f64> + Copy>(
            records: &[Record],
            f: impl Fn(&Record) -> Option<T>,
        ) -> Option<Stats> {
            Stats::from_values(records.iter().filter_map(|r| f(r).map(Into::into)))
        }

        Self {
            record_count: records.len(),
            lap_count: laps.len(),
            session_count: sessions.len(),
            power: stats(records, |r| r.power),
            cadence: stats(records, |r| r.cadence),
            heart_rate: stats(records, |r| r.heart_rate),
            speed: stats(records, |r| r.speed),
            altitude: stats(records, |r| r.altitude),
            temperature: stats(records, |r| r.temperature),
        }
    }
}

/// A point of the power, cadence and heart rate chart.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChartPoint {
    /// Minutes since the start of the activity.
    pub time: f64,
    pub power: Option<u16>,
    pub cadence: Option<u8>,
    pub heart_rate: Option<u8>,
}

/// The document as decoded from the wire, for raw display.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RawTree {
    pub header: FileHeader,
    pub messages: Vec<DataMessage>,
}

/// Activity data decoded from one document.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParsedFitData {
    pub header: FileHeader,
    pub file_id: Option<FileId>,
    pub records: Vec<Record>,
    pub laps: Vec<Lap>,
    pub sessions: Vec<Session>,
    pub device_info: Option<DeviceInfo>,
    /// Seconds.
    pub duration: f64,
    pub summary: Summary,
    pub diagnostics: Diagnostics,
    pub raw: RawTree,
}

impl ParsedFitData {
    /// One chart point per record.
    ///
    /// Time comes from the record's elapsed time; records without one are
    /// placed by index, assuming one-second sampling.
    pub fn chart_points(&self) -> Vec<ChartPoint> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| ChartPoint {
                time: r.elapsed_time.unwrap_or(i as f64) / 60.0,
                power: r.power,
                cadence: r.cadence,
                heart_rate: r.heart_rate,
            })
            .collect()
    }
}

/// Activity duration in seconds.
///
/// Spans the timestamped records when there are at least two; otherwise falls
/// back to the first session's total elapsed time, then zero.
pub fn duration(records: &[Record], sessions: &[Session]) -> f64 {
    let mut timestamps = records.iter().filter_map(|r| r.timestamp);

    if let Some(first) = timestamps.next() {
        let (min, max, n) = timestamps.fold((first, first, 1), |(min, max, n), t| {
            (min.min(t), max.max(t), n + 1)
        });

        if n >= 2 {
            return (max - min) as f64 / 1000.0;
        }
    }

    sessions
        .iter()
        .find_map(|s| s.total_elapsed_time)
        .unwrap_or(0.0)
}

/// A [`MessageReceiver`] bucketing messages by kind.
#[derive(Debug, Default)]
pub struct Aggregator {
    file_id: Option<FileId>,
    records: Vec<Record>,
    laps: Vec<Lap>,
    sessions: Vec<Session>,
    device_info: Option<DeviceInfo>,
    unknown_messages: usize,
    retain_raw: bool,
    raw: Vec<DataMessage>,
}

impl MessageReceiver for Aggregator {
    fn add_message(&mut self, message: DecodedMessage) {
        match &message {
            DecodedMessage::FileId(f) => self.file_id = Some(FileId::from_fields(f)),
            DecodedMessage::Record(f) => self.records.push(Record::from_fields(f)),
            DecodedMessage::Lap(f) => self.laps.push(Lap::from_fields(f)),
            DecodedMessage::Session(f) => self.sessions.push(Session::from_fields(f)),
            DecodedMessage::DeviceInfo(f) => self.device_info = Some(DeviceInfo::from_fields(f)),
            DecodedMessage::Unknown { .. } => self.unknown_messages += 1,
        }
    }

    fn add_raw(&mut self, message: &DataMessage) {
        if self.retain_raw {
            self.raw.push(message.clone());
        }
    }
}

impl Aggregator {
    pub fn new(retain_raw: bool) -> Self {
        Self {
            retain_raw,
            ..Self::default()
        }
    }

    /// Compute derived values and assemble the decoded activity.
    pub fn finish(
        mut self,
        header: FileHeader,
        mut diagnostics: Diagnostics,
    ) -> Result<ParsedFitData, Error> {
        if !self.records.iter().any(Record::is_meaningful) {
            warn!(
                records = self.records.len(),
                skipped = diagnostics.skipped_bytes,
                "no valid records"
            );
            Err(Error::NoValidRecords)?;
        }

        if let Some(start) = self.records.iter().filter_map(|r| r.timestamp).min() {
            for r in &mut self.records {
                r.elapsed_time = r.timestamp.map(|t| (t - start) as f64 / 1000.0);
            }
        }

        diagnostics.unknown_messages = self.unknown_messages;

        Ok(ParsedFitData {
            header,
            duration: duration(&self.records, &self.sessions),
            summary: Summary::new(&self.records, &self.laps, &self.sessions),
            file_id: self.file_id,
            records: self.records,
            laps: self.laps,
            sessions: self.sessions,
            device_info: self.device_info,
            diagnostics,
            raw: RawTree {
                header,
                messages: self.raw,
            },
        })
    }
}
