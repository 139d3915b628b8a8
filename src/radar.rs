//! # Radar Module
//!
//! Turns `<angle>,<distance>` lines into zone decisions, the sweep needle and
//! the bounded trail of detection points.
//!
//! Coordinates are display-space: the radar origin sits at [`RADAR_CENTER`],
//! x grows to the right and y grows downwards, so a reading at 90° is drawn
//! straight above the origin.

use crate::config::Thresholds;
use crate::protocol::parse_fields;
use log::debug;
use std::collections::VecDeque;
use std::fmt;

/// Maximum number of detection points kept on screen.
pub const DETECTION_HISTORY_CAP: usize = 50;
/// Radius of the radar display, in display units.
pub const DISPLAY_RADIUS: f32 = 445.0;
/// Origin of the radar display.
pub const RADAR_CENTER: DisplayPoint = DisplayPoint { x: 505.0, y: 495.0 };
/// Half width of the sweep needle, in radians.
pub const NEEDLE_HALF_ANGLE: f32 = 0.05;
/// Distances mapped onto the display radius (cm); farther echoes draw no point.
pub const POINT_RANGE_CM: f32 = 200.0;

/// One sensor sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadarReading {
    /// degrees, 0 to 180
    pub angle: f32,
    /// centimeters, zero or negative means no echo
    pub distance: f32,
}

impl RadarReading {
    /// Parses a radar line; exactly two numeric fields are accepted.
    pub fn parse(line: &str) -> Option<Self> {
        let [angle, distance] = parse_fields::<2>(line)?;
        Some(Self { angle, distance })
    }

    /// Zone of this reading under `thresholds`.
    pub fn zone(&self, thresholds: &Thresholds) -> Zone {
        let d = self.distance;
        if d >= thresholds.laser_min_cm && d <= thresholds.laser_max_cm {
            Zone::LaserRange
        } else if d > thresholds.laser_max_cm && d <= thresholds.max_detection_cm {
            Zone::DetectionRange
        } else {
            Zone::NoObject
        }
    }
}

/// Distance classification of a reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zone {
    /// close enough to fire the laser
    LaserRange,
    /// detected, out of laser range
    DetectionRange,
    NoObject,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::LaserRange => write!(f, "Object Detected (Laser Range)"),
            Zone::DetectionRange => write!(f, "Object Detected"),
            Zone::NoObject => write!(f, "No Object"),
        }
    }
}

/// A point in display space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayPoint {
    pub x: f32,
    pub y: f32,
}

impl DisplayPoint {
    /// Point `radius` units from the origin along `radians`.
    fn polar(radius: f32, radians: f32) -> Self {
        Self {
            x: RADAR_CENTER.x + radius * radians.cos(),
            y: RADAR_CENTER.y - radius * radians.sin(),
        }
    }
}

/// Detection point left on the display by an in-range echo.
pub type DetectionPoint = DisplayPoint;

/// Thin wedge from the origin to the display edge centered on the sweep angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Needle {
    pub upper: DisplayPoint,
    pub apex: DisplayPoint,
    pub lower: DisplayPoint,
}

impl Needle {
    /// Needle pointing at `angle` degrees.
    pub fn at(angle: f32) -> Self {
        let radians = angle.to_radians();
        Self {
            upper: DisplayPoint::polar(DISPLAY_RADIUS, radians + NEEDLE_HALF_ANGLE),
            apex: RADAR_CENTER,
            lower: DisplayPoint::polar(DISPLAY_RADIUS, radians - NEEDLE_HALF_ANGLE),
        }
    }
}

impl Default for Needle {
    fn default() -> Self {
        Self::at(0.0)
    }
}

/// Maps an echo onto the display, `None` outside `(0, POINT_RANGE_CM]`.
pub fn detection_point(reading: &RadarReading) -> Option<DetectionPoint> {
    if reading.distance > 0.0 && reading.distance <= POINT_RANGE_CM {
        let scaled = reading.distance / POINT_RANGE_CM * DISPLAY_RADIUS;
        Some(DisplayPoint::polar(scaled, reading.angle.to_radians()))
    } else {
        None
    }
}

/// Detection points in arrival order, oldest evicted first.
#[derive(Clone, Debug, Default)]
pub struct DetectionHistory {
    points: VecDeque<DetectionPoint>,
}

impl DetectionHistory {
    pub fn new() -> Self {
        Self {
            points: VecDeque::with_capacity(DETECTION_HISTORY_CAP + 1),
        }
    }

    /// Appends a point, returns the evicted one if the cap was exceeded.
    pub fn push(&mut self, point: DetectionPoint) -> Option<DetectionPoint> {
        self.points.push_back(point);
        if self.points.len() > DETECTION_HISTORY_CAP {
            self.points.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &DetectionPoint> {
        self.points.iter()
    }
}

/// Result of processing one radar line.
#[derive(Clone, Debug, PartialEq)]
pub struct RadarUpdate {
    pub reading: RadarReading,
    pub zone: Zone,
    pub needle: Needle,
    /// point added to the history by this reading
    pub point: Option<DetectionPoint>,
    /// point pushed out of the history by this reading
    pub evicted: Option<DetectionPoint>,
    /// the laser should be switched on
    pub activation_requested: bool,
}

/// Radar reading processor.
///
/// Owns the detection history and the current needle; it never talks to the
/// device, laser activation is returned as a request for the controller.
#[derive(Clone, Debug)]
pub struct RadarProcessor {
    thresholds: Thresholds,
    history: DetectionHistory,
    needle: Needle,
    last_reading: Option<RadarReading>,
}

impl RadarProcessor {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            history: DetectionHistory::new(),
            needle: Needle::default(),
            last_reading: None,
        }
    }

    /// Processes a radar line given the current laser state.
    ///
    /// Returns `None` for a malformed line, which leaves every piece of state
    /// untouched.
    pub fn process(&mut self, line: &str, laser_active: bool) -> Option<RadarUpdate> {
        let Some(reading) = RadarReading::parse(line) else {
            debug!("discarding malformed radar line {:?}", line);
            return None;
        };

        let zone = reading.zone(&self.thresholds);
        self.needle = Needle::at(reading.angle);
        self.last_reading = Some(reading);

        let point = detection_point(&reading);
        let evicted = point.and_then(|p| self.history.push(p));

        Some(RadarUpdate {
            reading,
            zone,
            needle: self.needle,
            point,
            evicted,
            activation_requested: zone == Zone::LaserRange && !laser_active,
        })
    }

    pub fn history(&self) -> &DetectionHistory {
        &self.history
    }

    pub fn needle(&self) -> &Needle {
        &self.needle
    }

    pub fn last_reading(&self) -> Option<&RadarReading> {
        self.last_reading.as_ref()
    }
}
