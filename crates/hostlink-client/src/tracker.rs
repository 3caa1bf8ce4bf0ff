//! Stateful device tracking over the broker's subscription connection
//!
//! The broker's change notifications carry only a summary, never full
//! device metadata, so a notification is treated purely as a trigger: the
//! tracker re-fetches the full device list and diffs it against its last
//! snapshot to produce attach/detach events.

use hostlink_protocol::Device;

use crate::client::HostClient;
use crate::connection::Connection;
use crate::connector::Connector;
use crate::error::{ClientError, Result};

/// A change in the attached device set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A device appeared since the previous snapshot
    Attached(Device),
    /// A device disappeared; carries the record from the old snapshot
    Detached(Device),
}

/// The full device set at one polling instant
///
/// Replaced wholesale on every refresh, never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct DeviceSnapshot {
    devices: Vec<Device>,
}

impl DeviceSnapshot {
    /// Build a snapshot from a freshly listed device set
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    /// The devices in this snapshot, in listing order
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Whether a device with this serial is present
    pub fn contains_serial(&self, serial: &str) -> bool {
        self.devices.iter().any(|d| d.serial == serial)
    }
}

/// Tracks device attach/detach events via a long-lived subscription
///
/// Construction opens the subscription connection and fails if the broker
/// is unreachable. The tracker never schedules itself; an external driver
/// calls [`poll`](DeviceTracker::poll) at whatever cadence it likes. Any
/// error on the subscription connection is terminal: the tracker refuses
/// all further polls and a new tracker must be constructed.
#[derive(Debug)]
pub struct DeviceTracker {
    /// Client used for the list-refresh step
    client: HostClient,
    /// The long-lived subscription connection
    subscription: Connection,
    /// Device set as of the last refresh, absent until the first one
    last: Option<DeviceSnapshot>,
    /// Set once the subscription connection has errored
    failed: bool,
}

impl DeviceTracker {
    /// Subscribe to device changes at the connector's endpoint
    pub async fn connect(connector: Connector) -> Result<Self> {
        let client = HostClient::with_connector(connector);
        let subscription = client.track_devices().await?;

        Ok(Self {
            client,
            subscription,
            last: None,
            failed: false,
        })
    }

    /// The devices of the last snapshot, empty before the first refresh
    pub fn devices(&self) -> &[Device] {
        self.last.as_ref().map(DeviceSnapshot::devices).unwrap_or(&[])
    }

    /// Check for device changes without blocking
    ///
    /// Drains every notification currently readable on the subscription
    /// connection; if at least one arrived, re-fetches the device list and
    /// returns the diff against the previous snapshot, all detach events
    /// before all attach events. With no pending notification this is a
    /// no-op: no round trip, no events.
    ///
    /// On the very first refresh every listed device is reported as
    /// attached.
    pub async fn poll(&mut self) -> Result<Vec<DeviceEvent>> {
        if self.failed {
            return Err(ClientError::SubscriptionLost);
        }

        let mut notified = false;
        loop {
            match self.subscription.poll_notification() {
                Ok(Some(_)) => notified = true, // payload is only a trigger
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Subscription connection lost");
                    self.failed = true;
                    return Err(e);
                }
            }
        }

        if !notified {
            return Ok(Vec::new());
        }

        let fresh = DeviceSnapshot::new(self.client.list_devices().await?);
        let events = match &self.last {
            Some(previous) => diff_snapshots(previous, &fresh),
            // Initial population: every present device fires an attach
            None => fresh
                .devices()
                .iter()
                .cloned()
                .map(DeviceEvent::Attached)
                .collect(),
        };

        for event in &events {
            match event {
                DeviceEvent::Attached(d) => tracing::debug!(serial = %d.serial, "Device attached"),
                DeviceEvent::Detached(d) => tracing::debug!(serial = %d.serial, "Device detached"),
            }
        }

        self.last = Some(fresh);
        Ok(events)
    }
}

/// Diff two snapshots by serial, detaches first
///
/// Devices present in both snapshots produce no event even if their
/// descriptive fields changed; identity is the serial alone.
fn diff_snapshots(previous: &DeviceSnapshot, fresh: &DeviceSnapshot) -> Vec<DeviceEvent> {
    let mut events = Vec::new();

    for device in previous.devices() {
        if !fresh.contains_serial(&device.serial) {
            events.push(DeviceEvent::Detached(device.clone()));
        }
    }

    for device in fresh.devices() {
        if !previous.contains_serial(&device.serial) {
            events.push(DeviceEvent::Attached(device.clone()));
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(serial: &str) -> Device {
        Device::new(serial, "product", "model", "device")
    }

    fn snapshot(serials: &[&str]) -> DeviceSnapshot {
        DeviceSnapshot::new(serials.iter().map(|s| device(s)).collect())
    }

    #[test]
    fn test_diff_detach_before_attach() {
        let events = diff_snapshots(&snapshot(&["A", "B"]), &snapshot(&["B", "C"]));

        assert_eq!(
            events,
            vec![
                DeviceEvent::Detached(device("A")),
                DeviceEvent::Attached(device("C")),
            ]
        );
    }

    #[test]
    fn test_diff_identical_snapshots() {
        let events = diff_snapshots(&snapshot(&["A", "B"]), &snapshot(&["A", "B"]));
        assert!(events.is_empty());
    }

    #[test]
    fn test_diff_ignores_descriptive_field_changes() {
        let previous = DeviceSnapshot::new(vec![Device::new("A", "p1", "m1", "d1")]);
        let fresh = DeviceSnapshot::new(vec![Device::new("A", "p2", "m2", "d2")]);

        assert!(diff_snapshots(&previous, &fresh).is_empty());
    }

    #[test]
    fn test_diff_detached_uses_old_record() {
        let previous = DeviceSnapshot::new(vec![Device::new("A", "old-p", "old-m", "old-d")]);
        let fresh = snapshot(&[]);

        let events = diff_snapshots(&previous, &fresh);
        assert_eq!(
            events,
            vec![DeviceEvent::Detached(Device::new("A", "old-p", "old-m", "old-d"))]
        );
    }

    #[test]
    fn test_snapshot_contains_serial() {
        let snap = snapshot(&["A", "B"]);
        assert!(snap.contains_serial("A"));
        assert!(!snap.contains_serial("C"));
    }
}
