//! # Serial Communication Module
//!
//! Handles serial communication with the humidity sensor board.
//!
//! This module handles:
//! - Opening the sensor port (8N1, no flow control) at a supported baud rate
//! - Enumerating available ports
//! - Auto-detecting the sensor board by USB manufacturer string

pub mod port_trait;

use crate::error::{HumidityError, Result};
use port_trait::SerialSource;
use tokio_serial::{SerialPortBuilderExt, SerialPortInfo, SerialPortType};
use tracing::{debug, info};

/// Default sensor baud rate
pub const DEFAULT_BAUD_RATE: u32 = 19_200;

/// Supported baud rates
pub const BAUD_RATES: &[u32] = &[
    50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 9600, 19200, 38400, 57600,
    115200, 230400, 460800, 500000, 576000, 921600, 1000000, 1152000, 1500000, 2000000, 2500000,
    3000000, 3500000, 4000000,
];

/// USB manufacturer string reported by the sensor board
pub const DEFAULT_MANUFACTURER: &str = "Arduino (www.arduino.cc)";

/// Check whether `baud_rate` is a supported rate
pub fn is_valid_baud_rate(baud_rate: u32) -> bool {
    BAUD_RATES.contains(&baud_rate)
}

/// Sensor serial port handler
///
/// Owns the opened port as a [`SerialSource`] together with its device path.
pub struct SensorSerial {
    source: SerialSource,
    device_path: String,
}

impl std::fmt::Debug for SensorSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SensorSerial {
    /// Open the sensor port
    ///
    /// # Arguments
    ///
    /// * `path` - Device path (e.g., "/dev/ttyACM0")
    /// * `baud_rate` - One of [`BAUD_RATES`]
    ///
    /// # Errors
    ///
    /// Returns error if the baud rate is unsupported or the port cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use garden_humidity::serial::SensorSerial;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let serial = SensorSerial::open("/dev/ttyACM0", 19200)?;
    ///     println!("Connected to: {}", serial.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        if !is_valid_baud_rate(baud_rate) {
            return Err(HumidityError::Serial(format!(
                "Unsupported baud rate {}",
                baud_rate
            )));
        }

        debug!("Opening serial port {} at {} baud", path, baud_rate);

        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| HumidityError::Serial(format!("Failed to open {}: {}", path, e)))?;

        info!("Opened sensor at {} ({} baud)", path, baud_rate);

        Ok(Self {
            source: SerialSource::new(port),
            device_path: path.to_string(),
        })
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Hand over the byte stream to the pipeline
    pub fn into_source(self) -> SerialSource {
        self.source
    }
}

/// List the serial ports present on this machine
///
/// # Errors
///
/// Returns error if the OS port enumeration fails
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    tokio_serial::available_ports()
        .map_err(|e| HumidityError::Serial(format!("Failed to enumerate ports: {}", e)))
}

/// Pick the first USB port whose manufacturer matches exactly
pub fn find_port_by_manufacturer<'a>(
    ports: &'a [SerialPortInfo],
    manufacturer: &str,
) -> Option<&'a SerialPortInfo> {
    ports.iter().find(|port| match &port.port_type {
        SerialPortType::UsbPort(usb) => usb.manufacturer.as_deref() == Some(manufacturer),
        _ => false,
    })
}

/// Auto-detect the sensor board among the available ports
///
/// # Returns
///
/// * `Result<Option<String>>` - Device path of the first match, if any
pub fn suggest_port(manufacturer: &str) -> Result<Option<String>> {
    let ports = list_ports()?;
    let found = find_port_by_manufacturer(&ports, manufacturer).map(|p| p.port_name.clone());

    match &found {
        Some(path) => debug!("Auto-detected sensor at {}", path),
        None => debug!("No port with manufacturer {:?}", manufacturer),
    }

    Ok(found)
}

/// Format a port for `--list` output
///
/// Short form is the device path and a description, `verbose` adds one
/// `key : value` line per known USB attribute.
pub fn describe_port(port: &SerialPortInfo, verbose: bool) -> String {
    let kind = match &port.port_type {
        SerialPortType::UsbPort(usb) => usb
            .product
            .clone()
            .unwrap_or_else(|| "USB device".to_string()),
        SerialPortType::PciPort => "PCI device".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth device".to_string(),
        SerialPortType::Unknown => "n/a".to_string(),
    };

    let summary = format!("{} - {}", port.port_name, kind);
    if !verbose {
        return summary;
    }

    let mut lines = vec![summary, format!("  device       : {}", port.port_name)];
    if let SerialPortType::UsbPort(usb) = &port.port_type {
        let none = || "None".to_string();
        lines.push(format!("  vid          : {:04x}", usb.vid));
        lines.push(format!("  pid          : {:04x}", usb.pid));
        lines.push(format!(
            "  serial_number: {}",
            usb.serial_number.clone().unwrap_or_else(none)
        ));
        lines.push(format!(
            "  manufacturer : {}",
            usb.manufacturer.clone().unwrap_or_else(none)
        ));
        lines.push(format!(
            "  product      : {}",
            usb.product.clone().unwrap_or_else(none)
        ));
    } else {
        lines.push(format!("  type         : {}", kind));
    }
    lines.join("\n")
}
