//! # Telemetry Module
//!
//! Energy readings from the power monitor: the latest snapshot plus a short
//! timestamped history, newest first.

use crate::protocol::{FIELD_SEPARATOR, parse_numbers};
use chrono::{Local, NaiveTime};
use log::debug;
use std::fmt;

/// Number of historical rows kept.
pub const TELEMETRY_HISTORY_CAP: usize = 10;

/// Timestamp format of historical rows.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// One energy sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TelemetryReading {
    /// V
    pub bus_voltage: f32,
    /// mV
    pub shunt_voltage: f32,
    /// V
    pub load_voltage: f32,
    /// mA
    pub current: f32,
    /// mW
    pub power: f32,
}

impl TelemetryReading {
    /// Parses `B,<bus>,<shunt>,<load>,<current>,<power>`.
    ///
    /// The firmware may insert a sensor tag after `B` (seven fields); the tag
    /// fields are ignored and the last five must be numeric. Any other field
    /// count is rejected.
    pub fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let values = match fields.len() {
            6 => &fields[1..],
            7 => &fields[2..],
            _ => return None,
        };
        let [bus_voltage, shunt_voltage, load_voltage, current, power] =
            parse_numbers::<5>(values)?;
        Some(Self {
            bus_voltage,
            shunt_voltage,
            load_voltage,
            current,
            power,
        })
    }
}

impl fmt::Display for TelemetryReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} V | {:.2} mV | {:.2} V | {:.2} mA | {:.2} mW",
            self.bus_voltage, self.shunt_voltage, self.load_voltage, self.current, self.power
        )
    }
}

/// A reading stamped with the wall-clock time it arrived.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoricalRow {
    /// `hh:mm:ss`
    pub timestamp: String,
    pub reading: TelemetryReading,
}

impl HistoricalRow {
    pub fn new(time: NaiveTime, reading: TelemetryReading) -> Self {
        Self {
            timestamp: time.format(TIMESTAMP_FORMAT).to_string(),
            reading,
        }
    }
}

impl fmt::Display for HistoricalRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.reading;
        write!(
            f,
            "{},{},{},{},{},{}",
            self.timestamp, r.bus_voltage, r.shunt_voltage, r.load_voltage, r.current, r.power
        )
    }
}

/// Fixed ring of the most recent rows, indexed newest first.
#[derive(Clone, Debug, Default)]
pub struct TelemetryHistory {
    rows: [Option<HistoricalRow>; TELEMETRY_HISTORY_CAP],
    /// slot of the newest row
    head: usize,
    len: usize,
}

impl TelemetryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `row` as the newest entry, returns the row that fell off.
    pub fn prepend(&mut self, row: HistoricalRow) -> Option<HistoricalRow> {
        self.head = (self.head + TELEMETRY_HISTORY_CAP - 1) % TELEMETRY_HISTORY_CAP;
        let evicted = self.rows[self.head].replace(row);
        self.len = (self.len + 1).min(TELEMETRY_HISTORY_CAP);
        evicted
    }

    /// Row `index` positions back from the newest.
    pub fn get(&self, index: usize) -> Option<&HistoricalRow> {
        if index >= self.len {
            return None;
        }
        self.rows[(self.head + index) % TELEMETRY_HISTORY_CAP].as_ref()
    }

    pub fn newest(&self) -> Option<&HistoricalRow> {
        self.get(0)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoricalRow> {
        (0..self.len).filter_map(move |i| self.get(i))
    }
}

/// Telemetry processor: current snapshot and history.
#[derive(Clone, Debug, Default)]
pub struct TelemetryProcessor {
    current: Option<TelemetryReading>,
    history: TelemetryHistory,
}

impl TelemetryProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes an energy line stamped with the local time.
    pub fn process(&mut self, line: &str) -> Option<TelemetryReading> {
        self.process_at(line, Local::now().time())
    }

    /// Processes an energy line stamped with `time`.
    pub fn process_at(&mut self, line: &str, time: NaiveTime) -> Option<TelemetryReading> {
        let Some(reading) = TelemetryReading::parse(line) else {
            debug!("discarding malformed telemetry line {:?}", line);
            return None;
        };
        self.current = Some(reading);
        self.history.prepend(HistoricalRow::new(time, reading));
        Some(reading)
    }

    pub fn current(&self) -> Option<&TelemetryReading> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &TelemetryHistory {
        &self.history
    }
}
