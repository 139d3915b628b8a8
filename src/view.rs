//! # View Module
//!
//! Interface to whatever presents the turret to the operator. The controller
//! core only calls these hooks; [`LogView`] renders them through `log`.

use crate::control::{Feedback, Mode};
use crate::radar::{RadarReading, RadarUpdate, Zone};
use crate::telemetry::{HistoricalRow, TelemetryHistory, TelemetryReading};
use log::{debug, info, trace, warn};

/// Point-in-time summary for the `status` request.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusSnapshot {
    pub mode: Mode,
    pub auto_mode: bool,
    pub laser_active: bool,
    pub scan_angle: u16,
    pub last_reading: Option<RadarReading>,
    pub detection_points: usize,
    pub telemetry: Option<TelemetryReading>,
    /// newest first
    pub history: Vec<HistoricalRow>,
    pub dropped_commands: usize,
}

/// Display hooks; every method defaults to doing nothing.
pub trait TurretView {
    /// A radar reading moved the needle (and maybe left a point).
    fn radar_updated(&mut self, _update: &RadarUpdate) {}

    /// A telemetry reading replaced the current snapshot.
    fn telemetry_updated(&mut self, _reading: &TelemetryReading, _history: &TelemetryHistory) {}

    /// Controller feedback: laser status, control lock, servo position.
    fn feedback(&mut self, _feedback: &Feedback) {}

    /// No device could be opened; the operator must be told.
    fn device_missing(&mut self, _reason: &str) {}

    fn status(&mut self, _status: &StatusSnapshot) {}
}

/// View that writes everything to the log.
#[derive(Debug, Default)]
pub struct LogView;

impl TurretView for LogView {
    fn radar_updated(&mut self, update: &RadarUpdate) {
        let reading = &update.reading;
        match update.zone {
            Zone::NoObject => trace!(
                "{:.1}° {:.1} cm - {}",
                reading.angle, reading.distance, update.zone
            ),
            _ => debug!(
                "{:.1}° {:.1} cm - {}",
                reading.angle, reading.distance, update.zone
            ),
        }
    }

    fn telemetry_updated(&mut self, reading: &TelemetryReading, _history: &TelemetryHistory) {
        debug!("energy: {}", reading);
    }

    fn feedback(&mut self, feedback: &Feedback) {
        match feedback {
            Feedback::LaserStatus(true) => info!("Laser: On"),
            Feedback::LaserStatus(false) => info!("Laser: Off"),
            Feedback::ControlsLocked(locked) => debug!("manual controls locked: {}", locked),
            Feedback::ScanAngle(angle) => trace!("scan angle {}", angle),
            Feedback::ManualAngle(angle) => info!("servo -> {}°", angle),
        }
    }

    fn device_missing(&mut self, reason: &str) {
        warn!("Port error: {}. Running display-only.", reason);
    }

    fn status(&mut self, status: &StatusSnapshot) {
        info!(
            "mode: {} | auto: {} | laser: {} | servo: {}°",
            status.mode,
            status.auto_mode,
            if status.laser_active { "On" } else { "Off" },
            status.scan_angle
        );
        match &status.last_reading {
            Some(reading) => info!(
                "last reading: {:.1}° {:.1} cm, {} detection points",
                reading.angle, reading.distance, status.detection_points
            ),
            None => info!("no radar readings yet"),
        }
        match &status.telemetry {
            Some(reading) => info!("energy: {}", reading),
            None => info!("no energy readings yet"),
        }
        for (i, row) in status.history.iter().enumerate() {
            info!("  {:>2} {}", i + 1, row);
        }
        if status.dropped_commands > 0 {
            warn!("{} commands dropped", status.dropped_commands);
        }
    }
}
