//! # Protocol Module
//!
//! The line protocol spoken with the turret firmware.
//!
//! Inbound, one record per line:
//!
//! | line                                     | meaning               |
//! |------------------------------------------|-----------------------|
//! | `B,[<tag>,]<bus>,<shunt>,<load>,<ma>,<mw>` | energy telemetry    |
//! | `<angle>,<distance>`                     | radar reading         |
//! | `LASER_ACTIVATED` / `LASER_DEACTIVATED`  | hardware laser status |
//!
//! Anything else is noise and is ignored. Outbound commands are [`Command`].

use std::fmt;

/// Tag that opens an energy telemetry line.
pub const ENERGY_TAG: &str = "B,";
/// Field separator shared by every data line.
pub const FIELD_SEPARATOR: char = ',';

const LASER_ACTIVATED: &str = "LASER_ACTIVATED";
const LASER_DEACTIVATED: &str = "LASER_DEACTIVATED";

/// Laser status reported by the firmware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaserEvent {
    Activated,
    Deactivated,
}

/// Classification of one framed line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message<'a> {
    /// energy telemetry line
    Energy(&'a str),
    /// radar reading line
    Radar(&'a str),
    /// laser status
    LaserEvent(LaserEvent),
    /// noise, partial frame or empty line
    Unknown,
}

/// Classifies a framed line by its prefix and shape.
///
/// The checks run in order, so an energy line (which also contains commas)
/// is never taken for a radar reading.
///
/// # Examples
///
/// ```
/// use radar_turret::protocol::{classify, LaserEvent, Message};
///
/// assert_eq!(classify("90,50"), Message::Radar("90,50"));
/// assert_eq!(classify("LASER_ACTIVATED"), Message::LaserEvent(LaserEvent::Activated));
/// assert_eq!(classify("hello"), Message::Unknown);
/// ```
pub fn classify(line: &str) -> Message<'_> {
    if line.starts_with(ENERGY_TAG) {
        Message::Energy(line)
    } else if line.contains(FIELD_SEPARATOR) {
        Message::Radar(line)
    } else if line == LASER_ACTIVATED {
        Message::LaserEvent(LaserEvent::Activated)
    } else if line == LASER_DEACTIVATED {
        Message::LaserEvent(LaserEvent::Deactivated)
    } else {
        Message::Unknown
    }
}

/// Splits a data line into exactly `N` numeric fields.
///
/// Returns `None` when the field count differs or any field is not a number.
pub(crate) fn parse_fields<const N: usize>(line: &str) -> Option<[f32; N]> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    parse_numbers(&fields)
}

/// Parses exactly `N` already-split fields as numbers.
///
/// `nan` and `inf` spellings parse as floats but are not readings.
pub(crate) fn parse_numbers<const N: usize>(fields: &[&str]) -> Option<[f32; N]> {
    if fields.len() != N {
        return None;
    }
    let mut values = [0.0f32; N];
    for (value, field) in values.iter_mut().zip(fields) {
        let parsed: f32 = field.trim().parse().ok()?;
        if !parsed.is_finite() {
            return None;
        }
        *value = parsed;
    }
    Some(values)
}

/// Commands written to the firmware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// servo angle in degrees, 0 to 180
    Angle(u16),
    LaserOn,
    LaserOff,
    Auto,
    Manual,
}

impl Command {
    /// Wire form, newline terminated.
    pub fn encode(&self) -> Vec<u8> {
        format!("{self}\n").into_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Angle(angle) => write!(f, "{angle}"),
            Command::LaserOn => write!(f, "LASER_ON"),
            Command::LaserOff => write!(f, "LASER_OFF"),
            Command::Auto => write!(f, "AUTO"),
            Command::Manual => write!(f, "MANUAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_energy_before_radar() {
        let line = "B,x,12.10,0.50,11.80,45.00,540.00";
        assert_eq!(classify(line), Message::Energy(line));
    }

    #[test]
    fn test_classify_radar() {
        assert_eq!(classify("135.5,72.25"), Message::Radar("135.5,72.25"));
        // shape check only, field validation happens in the processor
        assert_eq!(classify("a,b,c"), Message::Radar("a,b,c"));
    }

    #[test]
    fn test_classify_laser_events() {
        assert_eq!(
            classify("LASER_DEACTIVATED"),
            Message::LaserEvent(LaserEvent::Deactivated)
        );
        assert_eq!(classify("LASER_ACTIVATED_"), Message::Unknown);
    }

    #[test]
    fn test_classify_noise() {
        assert_eq!(classify(""), Message::Unknown);
        assert_eq!(classify("B"), Message::Unknown);
        assert_eq!(classify("laser_activated"), Message::Unknown);
    }

    #[test]
    fn test_parse_fields() {
        assert_eq!(parse_fields::<2>("90,50"), Some([90.0, 50.0]));
        assert_eq!(parse_fields::<2>(" 12.5 , -1 "), Some([12.5, -1.0]));
        assert_eq!(parse_fields::<2>("90"), None);
        assert_eq!(parse_fields::<2>("90,50,10"), None);
        assert_eq!(parse_fields::<2>("90,abc"), None);
        assert_eq!(parse_fields::<2>("90,"), None);
    }

    #[test]
    fn test_parse_fields_rejects_non_finite() {
        assert_eq!(parse_fields::<2>("nan,50"), None);
        assert_eq!(parse_fields::<2>("NaN,50"), None);
        assert_eq!(parse_fields::<2>("90,inf"), None);
        assert_eq!(parse_fields::<2>("-infinity,50"), None);
        assert_eq!(parse_numbers::<3>(&["1", "2", "inf"]), None);
    }

    #[test]
    fn test_command_encoding() {
        assert_eq!(Command::Angle(90).encode(), b"90\n".to_vec());
        assert_eq!(Command::Angle(0).encode(), b"0\n".to_vec());
        assert_eq!(Command::LaserOn.encode(), b"LASER_ON\n".to_vec());
        assert_eq!(Command::LaserOff.encode(), b"LASER_OFF\n".to_vec());
        assert_eq!(Command::Auto.encode(), b"AUTO\n".to_vec());
        assert_eq!(Command::Manual.encode(), b"MANUAL\n".to_vec());
    }
}
