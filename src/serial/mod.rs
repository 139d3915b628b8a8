//! # Serial Module
//!
//! Everything between the serial device and the controller: port discovery and
//! I/O tasks, byte decoding, newline framing, and the outbound [`Transport`].

pub mod encoding;
pub mod framer;
pub mod link;
pub mod port;

pub use framer::LineFramer;
pub use link::{DetachedLink, SerialLink, Transport};
pub use port::PortSettings;
