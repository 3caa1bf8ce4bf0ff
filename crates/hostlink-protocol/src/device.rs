//! Device records and the `devices-l` payload grammar
//!
//! The broker reports one device per newline-terminated line:
//!
//! ```text
//! <serial> <state> product:<product> model:<model> device:<device>
//! ```
//!
//! Only fully online devices (state `"device"`) carry the descriptive
//! fields; devices in any other state (offline, unauthorized, ...) are
//! excluded from the parsed set.

use std::fmt;

use crate::error::ProtocolError;

/// Device state string for a fully online device
const STATE_ONLINE: &str = "device";

/// A device attached to the broker
///
/// `serial` is the stable identity: two records with the same serial are
/// the same device for tracking purposes, even if the descriptive fields
/// differ between snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Unique, stable identifier
    pub serial: String,
    /// Product name reported by the device
    pub product: String,
    /// Model name reported by the device
    pub model: String,
    /// Device string reported by the device
    pub device_string: String,
}

impl Device {
    /// Create a new device record
    pub fn new(
        serial: impl Into<String>,
        product: impl Into<String>,
        model: impl Into<String>,
        device_string: impl Into<String>,
    ) -> Self {
        Self {
            serial: serial.into(),
            product: product.into(),
            model: model.into(),
            device_string: device_string.into(),
        }
    }

    /// Whether another record refers to the same physical device
    pub fn same_identity(&self, other: &Device) -> bool {
        self.serial == other.serial
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ Serial: {}, Product: {}, Model: {}, DeviceString: {} }}",
            self.serial, self.product, self.model, self.device_string
        )
    }
}

/// Parse a `host:devices-l` payload into the set of online devices
///
/// Lines whose state is anything other than `"device"` are skipped
/// silently; a `"device"` line that is missing required fields is a
/// protocol violation, never a partially filled record.
pub fn parse_device_list(payload: &str) -> Result<Vec<Device>, ProtocolError> {
    let mut devices = Vec::new();

    for line in payload.split('\n').filter(|l| !l.trim().is_empty()) {
        if let Some(device) = parse_device_line(line)? {
            devices.push(device);
        }
    }

    Ok(devices)
}

/// Parse a single device record line
///
/// Returns `Ok(None)` for devices that are not fully online.
fn parse_device_line(line: &str) -> Result<Option<Device>, ProtocolError> {
    let malformed = || ProtocolError::MalformedRecord {
        line: line.to_string(),
    };

    let mut tokens = line.split(' ').filter(|t| !t.is_empty());

    let serial = tokens.next().ok_or_else(malformed)?;
    let state = tokens.next().ok_or_else(malformed)?;

    if state != STATE_ONLINE {
        tracing::debug!(serial, state, "Skipping device that is not fully online");
        return Ok(None);
    }

    let product = field_value(tokens.next().ok_or_else(malformed)?).ok_or_else(malformed)?;
    let model = field_value(tokens.next().ok_or_else(malformed)?).ok_or_else(malformed)?;
    let device_string = field_value(tokens.next().ok_or_else(malformed)?).ok_or_else(malformed)?;

    Ok(Some(Device::new(serial, product, model, device_string)))
}

/// Extract the value half of a `key:value` token
fn field_value(token: &str) -> Option<&str> {
    token.split_once(':').map(|(_, value)| value)
}
