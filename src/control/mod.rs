//! # Control Module
//!
//! The actuation side of the turret: the laser / auto-mode state machine, the
//! auto-scan oscillator it drives, and the deadline timers behind both.

pub mod controller;
pub mod oscillator;
pub mod timer;

pub use controller::{Controller, ControllerState, Feedback, Mode};
pub use oscillator::Oscillator;
pub use timer::Timer;
