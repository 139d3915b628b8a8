use super::encoding::hex_preview;
use super::link::SerialLink;
use crate::error::{Result, TurretError};
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
use tokio::io::{self, AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_serial::SerialPortBuilderExt;
pub use tokio_serial::{
    DataBits, FlowControl, Parity, SerialPortInfo, SerialPortType, SerialStream, StopBits,
};

/// Arduino Uno USB vendor id
pub const ARDUINO_UNO_VENDOR_ID: u16 = 0x2341;
/// Arduino Uno USB product id
pub const ARDUINO_UNO_PRODUCT_ID: u16 = 0x0043;

/// read buffer size of the port reader task
const READ_BUFFER_SIZE: usize = 1024;
/// outbound commands queued for the writer task
const WRITE_QUEUE_DEPTH: usize = 32;
/// inbound chunks queued for the event loop
const READ_QUEUE_DEPTH: usize = 64;

/// serial port settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortSettings {
    /// explicit port name, skips discovery when set
    pub port_name: Option<String>,
    pub baud_rate: u32,
    /// USB vendor id used for discovery
    pub vendor_id: u16,
    /// USB product id used for discovery
    pub product_id: u16,
}

impl PortSettings {
    /// serial port settings initialization
    pub fn new() -> Self {
        PortSettings {
            port_name: None,
            baud_rate: 115200,
            vendor_id: ARDUINO_UNO_VENDOR_ID,
            product_id: ARDUINO_UNO_PRODUCT_ID,
        }
    }
}

impl Default for PortSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// all serial ports currently attached
pub fn list_ports() -> Vec<SerialPortInfo> {
    match tokio_serial::available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            warn!("Error listing ports: {}", e);
            Vec::new()
        }
    }
}

/// first port whose USB identifiers match
pub fn find_device(ports: &[SerialPortInfo], vendor_id: u16, product_id: u16) -> Option<String> {
    ports.iter().find_map(|port| match &port.port_type {
        SerialPortType::UsbPort(usb) if usb.vid == vendor_id && usb.pid == product_id => {
            Some(port.port_name.clone())
        }
        _ => None,
    })
}

/// port to open: the explicit name, else the discovered device
pub fn resolve_port_name(settings: &PortSettings) -> Result<String> {
    if let Some(name) = &settings.port_name {
        return Ok(name.clone());
    }
    let ports = tokio_serial::available_ports()?;
    debug!("{} serial ports attached", ports.len());
    find_device(&ports, settings.vendor_id, settings.product_id)
        .ok_or_else(|| TurretError::port_not_found(settings.vendor_id, settings.product_id))
}

/// open serial port, 8N1 without flow control
pub fn open_port(port_name: &str, settings: &PortSettings) -> Result<SerialStream> {
    match tokio_serial::new(port_name, settings.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .open_native_async()
    {
        Ok(stream) => {
            info!("Opened serial port {} at {} baud", port_name, settings.baud_rate);
            Ok(stream)
        }
        Err(e) => {
            error!("Failed to open serial port {}: {}", port_name, e);
            Err(TurretError::port_open(port_name, e.to_string()))
        }
    }
}

/// handles of the two port tasks
pub struct PortTasks {
    pub reader: JoinHandle<()>,
    pub writer: JoinHandle<()>,
}

impl PortTasks {
    /// stop both tasks
    pub fn abort(&self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Spawns the reader and writer tasks for an open port.
///
/// The reader forwards every received chunk unmodified; framing happens on
/// the event loop. The returned link feeds the writer.
pub fn spawn_port_io<S>(port: S) -> (SerialLink, mpsc::Receiver<Vec<u8>>, PortTasks)
where
    S: io::AsyncRead + io::AsyncWrite + Send + 'static,
{
    let (mut rec, mut send) = io::split(port);
    let (inbound_tx, inbound_rx) = mpsc::channel::<Vec<u8>>(READ_QUEUE_DEPTH);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Vec<u8>>(WRITE_QUEUE_DEPTH);

    let reader = tokio::spawn(async move {
        debug!("port reader started");
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        loop {
            match rec.read(&mut buffer[..]).await {
                Ok(0) => {
                    info!("serial port closed by device");
                    break;
                }
                Ok(n) => {
                    trace!("rx {}", hex_preview(&buffer[..n]));
                    if inbound_tx.send(buffer[..n].to_vec()).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read from serial port: {}", e);
                    break;
                }
            }
        }
    });

    let writer = tokio::spawn(async move {
        debug!("port writer started");
        while let Some(data) = outbound_rx.recv().await {
            trace!("tx {}", hex_preview(&data));
            if let Err(e) = send.write_all(&data).await {
                error!("Failed to write to serial port: {}", e);
                break;
            }
        }
    });

    (
        SerialLink::new(outbound_tx),
        inbound_rx,
        PortTasks { reader, writer },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::link::Transport;
    use tokio_serial::UsbPortInfo;

    fn usb_port(name: &str, vid: u16, pid: u16) -> SerialPortInfo {
        SerialPortInfo {
            port_name: name.to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid,
                pid,
                serial_number: None,
                manufacturer: None,
                product: None,
            }),
        }
    }

    #[test]
    fn test_find_device_matches_vid_and_pid() {
        let ports = vec![
            SerialPortInfo {
                port_name: "/dev/ttyS0".to_string(),
                port_type: SerialPortType::Unknown,
            },
            usb_port("/dev/ttyUSB0", ARDUINO_UNO_VENDOR_ID, 0x0001),
            usb_port("/dev/ttyACM0", ARDUINO_UNO_VENDOR_ID, ARDUINO_UNO_PRODUCT_ID),
        ];
        assert_eq!(
            find_device(&ports, ARDUINO_UNO_VENDOR_ID, ARDUINO_UNO_PRODUCT_ID).as_deref(),
            Some("/dev/ttyACM0")
        );
        assert_eq!(find_device(&ports, 0x1a86, 0x7523), None);
    }

    #[test]
    fn test_resolve_explicit_port_name() {
        let settings = PortSettings {
            port_name: Some("COM9".to_string()),
            ..PortSettings::new()
        };
        assert_eq!(resolve_port_name(&settings).unwrap(), "COM9");
    }

    #[tokio::test]
    async fn test_port_io_round_trip() {
        let (device, host) = tokio::io::duplex(64);
        let (mut link, mut inbound, tasks) = spawn_port_io(host);
        let (mut device_rx, mut device_tx) = io::split(device);

        device_tx.write_all(b"90,50\n").await.unwrap();
        let chunk = inbound.recv().await.unwrap();
        assert_eq!(chunk, b"90,50\n".to_vec());

        assert!(link.is_writable());
        link.write(b"LASER_ON\n").unwrap();
        let mut buf = [0u8; 9];
        device_rx.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"LASER_ON\n");

        tasks.abort();
    }
}
