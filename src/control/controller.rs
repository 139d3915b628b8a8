//! Laser / auto-mode state machine.
//!
//! The controller is the only component that writes to the device. It owns
//! the three timers (auto-scan tick, laser cool-down, resume) and enforces the
//! interlock: manual positioning is accepted only while neither auto mode nor
//! the laser is active.

use super::oscillator::{MAX_ANGLE, Oscillator};
use super::timer::Timer;
use crate::config::Timing;
use crate::protocol::{Command, LaserEvent};
use crate::serial::link::Transport;
use log::{debug, info, warn};
use std::fmt;
use std::time::Instant;

/// Operating mode derived from the controller flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Manual,
    AutoScanning,
    LaserActive,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Manual => write!(f, "manual"),
            Mode::AutoScanning => write!(f, "auto-scanning"),
            Mode::LaserActive => write!(f, "laser active"),
        }
    }
}

/// Everything the controller mutates.
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerState {
    pub laser_active: bool,
    /// mode to resume into after a laser sequence
    pub auto_mode: bool,
    /// manual angle controls disabled
    pub slider_locked: bool,
    pub laser_cooldown: Timer,
    pub resume: Timer,
    pub auto_scan: Timer,
    pub oscillator: Oscillator,
}

impl ControllerState {
    /// Manual mode, laser off, every timer stopped.
    pub fn new(scan_step: u16) -> Self {
        Self {
            laser_active: false,
            auto_mode: false,
            slider_locked: false,
            laser_cooldown: Timer::new(),
            resume: Timer::new(),
            auto_scan: Timer::new(),
            oscillator: Oscillator::new(scan_step),
        }
    }

    pub fn mode(&self) -> Mode {
        if self.laser_active {
            Mode::LaserActive
        } else if self.auto_mode {
            Mode::AutoScanning
        } else {
            Mode::Manual
        }
    }

    /// Whether a manual angle request would be honoured now.
    pub fn accepts_manual(&self) -> bool {
        !self.auto_mode && !self.laser_active
    }
}

/// Controller output meant for the operator display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    LaserStatus(bool),
    /// manual controls locked (auto mode on) or unlocked
    ControlsLocked(bool),
    /// angle commanded by the auto-scan sweep
    ScanAngle(u16),
    /// angle commanded by the operator
    ManualAngle(u16),
}

/// Laser / auto-mode controller writing to `T`.
pub struct Controller<T: Transport> {
    state: ControllerState,
    timing: Timing,
    link: T,
    feedback: Vec<Feedback>,
    dropped: usize,
}

impl<T: Transport> Controller<T> {
    pub fn new(link: T, timing: Timing) -> Self {
        Self {
            state: ControllerState::new(timing.scan_step_deg),
            timing,
            link,
            feedback: Vec::new(),
            dropped: 0,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn link(&self) -> &T {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut T {
        &mut self.link
    }

    /// Commands dropped because the link was not writable.
    pub fn dropped_commands(&self) -> usize {
        self.dropped
    }

    /// Takes the feedback queued since the last call.
    pub fn drain_feedback(&mut self) -> Vec<Feedback> {
        std::mem::take(&mut self.feedback)
    }

    /// Earliest deadline among the armed timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.state.laser_cooldown.deadline(),
            self.state.resume.deadline(),
            self.state.auto_scan.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Laser request from the radar processor.
    pub fn request_laser(&mut self, now: Instant) {
        if self.state.laser_active {
            return;
        }
        self.activate_laser(now);
    }

    /// Laser status reported by the firmware.
    pub fn laser_event(&mut self, event: LaserEvent, now: Instant) {
        match event {
            LaserEvent::Activated if self.state.laser_active => {
                debug!("laser activation confirmed by device");
            }
            LaserEvent::Activated => self.activate_laser(now),
            LaserEvent::Deactivated => {
                if self.state.laser_active {
                    self.state.laser_active = false;
                    self.feedback.push(Feedback::LaserStatus(false));
                    info!("laser deactivated by device");
                }
                self.state.laser_cooldown.stop();
                self.resume_scan(now);
            }
        }
    }

    /// Flips between auto-scan and manual mode.
    pub fn toggle_auto(&mut self, now: Instant) {
        self.state.auto_mode = !self.state.auto_mode;
        self.state.slider_locked = self.state.auto_mode;
        self.feedback
            .push(Feedback::ControlsLocked(self.state.slider_locked));

        if self.state.auto_mode {
            info!("auto mode on");
            // while the laser is on the resume step restarts the sweep
            if !self.state.laser_active {
                self.state.auto_scan.start(self.timing.scan_period(), now);
            }
            self.send(Command::Auto);
        } else {
            info!("auto mode off");
            self.state.auto_scan.stop();
            self.send(Command::Manual);
        }
    }

    /// Operator angle request; returns whether it was accepted.
    ///
    /// Ignored (not queued) while auto mode or the laser is active.
    pub fn manual_angle(&mut self, angle: u16) -> bool {
        if !self.state.accepts_manual() {
            debug!(
                "ignoring manual angle {} while {}",
                angle,
                self.state.mode()
            );
            return false;
        }
        if angle > MAX_ANGLE {
            warn!("manual angle {} out of range 0..={}", angle, MAX_ANGLE);
            return false;
        }
        self.send(Command::Angle(angle));
        self.feedback.push(Feedback::ManualAngle(angle));
        true
    }

    /// Fires every timer that is due at `now`.
    ///
    /// Timers are checked once, in the order cool-down, resume, scan. A timer
    /// armed by one of these handlers waits for the next poll.
    pub fn poll_timers(&mut self, now: Instant) {
        let cooldown_due = self.state.laser_cooldown.is_due(now);
        let resume_due = self.state.resume.is_due(now);
        let scan_due = self.state.auto_scan.is_due(now);

        if cooldown_due && self.state.laser_cooldown.fire(now) {
            self.cooldown_elapsed(now);
        }
        if resume_due && self.state.resume.fire(now) {
            self.resume(now);
        }
        if scan_due && self.state.auto_scan.fire(now) {
            self.scan_tick();
        }
    }

    /// Stops every timer and leaves the device in manual mode, laser off.
    pub fn shutdown(&mut self) {
        self.state.laser_cooldown.stop();
        self.state.resume.stop();
        self.state.auto_scan.stop();
        if self.state.laser_active {
            self.state.laser_active = false;
            self.feedback.push(Feedback::LaserStatus(false));
            self.send(Command::LaserOff);
        }
        if self.state.auto_mode {
            self.state.auto_mode = false;
            self.state.slider_locked = false;
            self.feedback.push(Feedback::ControlsLocked(false));
            self.send(Command::Manual);
        }
    }

    fn activate_laser(&mut self, now: Instant) {
        info!("laser on");
        self.state.laser_active = true;
        self.feedback.push(Feedback::LaserStatus(true));
        self.send(Command::LaserOn);
        self.state.laser_cooldown.start(self.timing.laser_cooldown(), now);
        // sweep pauses in place; the oscillator keeps its phase
        self.state.auto_scan.stop();
        // a pending resume must not re-assert AUTO under an active laser
        self.state.resume.stop();
    }

    fn cooldown_elapsed(&mut self, now: Instant) {
        info!("laser off");
        self.state.laser_active = false;
        self.feedback.push(Feedback::LaserStatus(false));
        self.send(Command::LaserOff);
        self.state.laser_cooldown.stop();
        self.state.resume.start(self.timing.resume_delay(), now);
    }

    fn resume(&mut self, now: Instant) {
        self.state.resume.stop();
        if self.state.auto_mode {
            self.resume_scan(now);
            self.send(Command::Auto);
        } else {
            self.send(Command::Manual);
        }
    }

    fn resume_scan(&mut self, now: Instant) {
        if self.state.auto_mode && !self.state.laser_active && !self.state.auto_scan.is_active() {
            self.state.auto_scan.start(self.timing.scan_period(), now);
        }
    }

    fn scan_tick(&mut self) {
        if self.state.laser_active {
            return;
        }
        let angle = self.state.oscillator.advance();
        self.send(Command::Angle(angle));
        self.feedback.push(Feedback::ScanAngle(angle));
    }

    fn send(&mut self, command: Command) -> bool {
        if !self.link.is_writable() {
            warn!("Couldn't write to serial, dropping {}", command);
            self.dropped += 1;
            return false;
        }
        match self.link.write(&command.encode()) {
            Ok(_) => {
                debug!("sent {}", command);
                true
            }
            Err(e) => {
                warn!("Dropping {}: {}", command, e);
                self.dropped += 1;
                false
            }
        }
    }
}
