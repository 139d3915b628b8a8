//! # Radar Turret
//!
//! Host-side controller for a serial radar / laser turret.
//!
//! The device streams newline-terminated lines: radar readings
//! (`angle,distance`), energy telemetry (`B,...`) and laser status events.
//! This crate frames and classifies them, keeps the radar and telemetry
//! views current, and drives the laser and the auto-scan sweep back over the
//! same port.
//!
//! ## Architecture
//!
//! - [`serial`]: port discovery, I/O tasks, line framing and the outbound
//!   [`serial::Transport`]
//! - [`protocol`]: line classification and device commands
//! - [`radar`]: radar readings, zones, needle geometry and detection history
//! - [`telemetry`]: energy readings and the timestamped history
//! - [`control`]: the laser / auto-mode controller, its timers and the sweep
//! - [`view`]: operator display hooks
//! - [`app`]: the event loop tying it all together
//! - [`config`]: RON configuration
//! - [`error`]: custom error types for the application

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod protocol;
pub mod radar;
pub mod serial;
pub mod telemetry;
pub mod view;

/// Re-exports for convenience
pub mod prelude {
    pub use crate::app::{Event, Intent, Turret};
    pub use crate::config::TurretConfig;
    pub use crate::control::{Controller, Feedback, Mode};
    pub use crate::error::*;
    pub use crate::serial::{DetachedLink, SerialLink, Transport};
    pub use crate::view::{LogView, TurretView};
}
