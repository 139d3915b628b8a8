//! Outbound side of the serial channel.

use crate::error::{Result, TurretError};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Write access to the device.
///
/// Writes are fire-and-forget: callers check [`Transport::is_writable`] first
/// and drop the command when the channel cannot take it.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Whether a write issued now would be accepted.
    fn is_writable(&self) -> bool;

    /// Queues `data` for the device, returns number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize>;
}

/// Live link to the port writer task.
#[derive(Clone, Debug)]
pub struct SerialLink {
    tx: mpsc::Sender<Vec<u8>>,
}

impl SerialLink {
    /// Wraps the sending half of the writer task's queue.
    pub fn new(tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self { tx }
    }
}

impl Transport for SerialLink {
    fn is_writable(&self) -> bool {
        !self.tx.is_closed() && self.tx.capacity() > 0
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        match self.tx.try_send(data.to_vec()) {
            Ok(()) => Ok(data.len()),
            Err(TrySendError::Full(_)) => Err(TurretError::port_write("write queue full")),
            Err(TrySendError::Closed(_)) => Err(TurretError::channel("port writer stopped")),
        }
    }
}

/// Link used when no device is attached; nothing is ever writable.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedLink;

impl Transport for DetachedLink {
    fn is_writable(&self) -> bool {
        false
    }

    fn write(&mut self, _data: &[u8]) -> Result<usize> {
        Err(TurretError::port_write("no device attached"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_link_forwards_bytes() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut link = SerialLink::new(tx);
        assert!(link.is_writable());
        assert_eq!(link.write(b"AUTO\n").unwrap(), 5);
        assert_eq!(rx.try_recv().unwrap(), b"AUTO\n".to_vec());
    }

    #[test]
    fn test_serial_link_full_queue_is_not_writable() {
        let (tx, _rx) = mpsc::channel(1);
        let mut link = SerialLink::new(tx);
        link.write(b"90\n").unwrap();
        assert!(!link.is_writable());
        assert!(matches!(link.write(b"92\n"), Err(TurretError::PortWrite(_))));
    }

    #[test]
    fn test_serial_link_closed_receiver() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let mut link = SerialLink::new(tx);
        assert!(!link.is_writable());
        assert!(matches!(link.write(b"AUTO\n"), Err(TurretError::Channel(_))));
    }

    #[test]
    fn test_detached_link() {
        let mut link = DetachedLink;
        assert!(!link.is_writable());
        assert!(link.write(b"MANUAL\n").is_err());
    }
}
