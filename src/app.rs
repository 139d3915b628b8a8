//! # App Module
//!
//! The single-task event loop tying the core together.
//!
//! Every event (bytes from the port, an operator intent, a timer deadline) is
//! handled to completion before the next one is taken, so the controller
//! state and both histories are only ever observed between events.

use crate::config::TurretConfig;
use crate::control::Controller;
use crate::protocol::{Message, classify};
use crate::radar::RadarProcessor;
use crate::serial::framer::LineFramer;
use crate::serial::link::Transport;
use crate::telemetry::TelemetryProcessor;
use crate::view::{StatusSnapshot, TurretView};
use log::{debug, info, warn};
use std::str::FromStr;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

/// Operator request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// start/stop auto-scan
    ToggleAuto,
    /// move the servo (slider or preset button)
    ManualAngle(u16),
    Status,
    Quit,
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        let mut words = text.split_whitespace();
        let intent = match (words.next(), words.next(), words.next()) {
            (Some("auto"), None, None) => Intent::ToggleAuto,
            (Some("status"), None, None) => Intent::Status,
            (Some("quit" | "exit" | "q"), None, None) => Intent::Quit,
            (Some("angle"), Some(angle), None) | (Some(angle), None, None) => angle
                .parse()
                .map(Intent::ManualAngle)
                .map_err(|_| format!("not an angle: {angle:?}"))?,
            _ => return Err(format!("unknown command: {:?}", s.trim())),
        };
        Ok(intent)
    }
}

/// Input to [`Turret::handle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// chunk read from the port
    BytesReceived(Vec<u8>),
    Intent(Intent),
    /// a timer deadline passed
    TimersDue,
}

/// The turret controller: framing, processing and actuation.
pub struct Turret<T: Transport, V: TurretView> {
    framer: LineFramer,
    radar: RadarProcessor,
    telemetry: TelemetryProcessor,
    controller: Controller<T>,
    view: V,
}

impl<T: Transport, V: TurretView> Turret<T, V> {
    pub fn new(config: &TurretConfig, link: T, view: V) -> Self {
        Self {
            framer: LineFramer::new(),
            radar: RadarProcessor::new(config.thresholds),
            telemetry: TelemetryProcessor::new(),
            controller: Controller::new(link, config.timing),
            view,
        }
    }

    pub fn controller(&self) -> &Controller<T> {
        &self.controller
    }

    pub fn radar(&self) -> &RadarProcessor {
        &self.radar
    }

    pub fn telemetry(&self) -> &TelemetryProcessor {
        &self.telemetry
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Handles one event to completion.
    pub fn handle(&mut self, event: Event, now: Instant) {
        match event {
            Event::BytesReceived(bytes) => {
                let lines: Vec<String> = self.framer.feed(&bytes).collect();
                for line in lines {
                    self.handle_line(&line, now);
                }
            }
            Event::Intent(intent) => self.handle_intent(intent, now),
            Event::TimersDue => self.controller.poll_timers(now),
        }
        for feedback in self.controller.drain_feedback() {
            self.view.feedback(&feedback);
        }
    }

    /// Stops the timers and returns the device to manual mode.
    pub fn shutdown(&mut self) {
        self.controller.shutdown();
        for feedback in self.controller.drain_feedback() {
            self.view.feedback(&feedback);
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let state = self.controller.state();
        StatusSnapshot {
            mode: state.mode(),
            auto_mode: state.auto_mode,
            laser_active: state.laser_active,
            scan_angle: state.oscillator.angle(),
            last_reading: self.radar.last_reading().copied(),
            detection_points: self.radar.history().len(),
            telemetry: self.telemetry.current().copied(),
            history: self.telemetry.history().iter().cloned().collect(),
            dropped_commands: self.controller.dropped_commands(),
        }
    }

    fn handle_line(&mut self, line: &str, now: Instant) {
        match classify(line) {
            Message::Energy(line) => {
                if let Some(reading) = self.telemetry.process(line) {
                    self.view
                        .telemetry_updated(&reading, self.telemetry.history());
                }
            }
            Message::Radar(line) => {
                let laser_active = self.controller.state().laser_active;
                if let Some(update) = self.radar.process(line, laser_active) {
                    if update.activation_requested {
                        self.controller.request_laser(now);
                    }
                    self.view.radar_updated(&update);
                }
            }
            Message::LaserEvent(event) => self.controller.laser_event(event, now),
            Message::Unknown => {
                if !line.is_empty() {
                    debug!("ignoring line {:?}", line);
                }
            }
        }
    }

    fn handle_intent(&mut self, intent: Intent, now: Instant) {
        match intent {
            Intent::ToggleAuto => self.controller.toggle_auto(now),
            Intent::ManualAngle(angle) => {
                self.controller.manual_angle(angle);
            }
            Intent::Status => {
                let snapshot = self.snapshot();
                self.view.status(&snapshot);
            }
            Intent::Quit => self.controller.shutdown(),
        }
    }

    /// Runs until a `Quit` intent arrives or the intent channel closes.
    ///
    /// Losing the inbound channel (device unplugged) is not fatal: the loop
    /// keeps serving intents and timers.
    pub async fn run(
        &mut self,
        mut inbound: mpsc::Receiver<Vec<u8>>,
        mut intents: mpsc::Receiver<Intent>,
    ) {
        let mut link_open = true;
        loop {
            let deadline = self.controller.next_deadline();
            tokio::select! {
                chunk = inbound.recv(), if link_open => match chunk {
                    Some(bytes) => self.handle(Event::BytesReceived(bytes), now()),
                    None => {
                        warn!("serial link closed, continuing display-only");
                        link_open = false;
                    }
                },
                intent = intents.recv() => match intent {
                    Some(Intent::Quit) | None => break,
                    Some(intent) => self.handle(Event::Intent(intent), now()),
                },
                _ = wait_until(deadline) => self.handle(Event::TimersDue, now()),
            }
        }
        info!("shutting down");
        self.shutdown();
    }
}

/// Current time on the runtime clock.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

/// Forwards operator intents typed one per line on `reader`.
///
/// Returns when the reader is exhausted or the receiver is gone.
pub async fn read_intents<R>(reader: R, tx: mpsc::Sender<Intent>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match line.parse::<Intent>() {
                Ok(intent) => {
                    if tx.send(intent).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{e} (try: auto, angle <0-180>, status, quit)"),
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read operator input: {e}");
                break;
            }
        }
    }
}
