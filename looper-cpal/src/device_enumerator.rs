//! Audio device enumeration and lookup via cpal.
//!
//! Wraps a `cpal::Host` to list input and output devices and to find one by
//! a case-insensitive name fragment. Devices that are still being plugged in
//! are waited for: lookups are retried every 100 ms until a timeout.

use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host, HostId};

use looper_core::models::error::LooperError;

/// Interval between device lookups while searching.
pub const SEARCH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Input,
    Output,
}

impl DeviceKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// Audio device enumerator over one cpal host.
pub struct DeviceEnumerator {
    host: Host,
}

impl DeviceEnumerator {
    /// Enumerator for the platform's default host.
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    pub fn with_host(host_id: HostId) -> Result<Self, LooperError> {
        let host = cpal::host_from_id(host_id)
            .map_err(|e| LooperError::DeviceNotAvailable(format!("host unavailable: {}", e)))?;
        Ok(Self { host })
    }

    /// Names of the devices able to record.
    pub fn list_input_devices(&self) -> Vec<String> {
        match self.host.input_devices() {
            Ok(devices) => devices.map(|d| device_name(&d)).collect(),
            Err(e) => {
                log::warn!("Failed to enumerate input devices: {}", e);
                Vec::new()
            }
        }
    }

    /// Names of the devices able to play back.
    pub fn list_output_devices(&self) -> Vec<String> {
        match self.host.output_devices() {
            Ok(devices) => devices.map(|d| device_name(&d)).collect(),
            Err(e) => {
                log::warn!("Failed to enumerate output devices: {}", e);
                Vec::new()
            }
        }
    }

    /// Every device with its direction, e.g. `"USB Audio (input)"`.
    pub fn list_devices(&self) -> Vec<String> {
        let inputs = self
            .list_input_devices()
            .into_iter()
            .map(|name| format!("{} (input)", name));
        let outputs = self
            .list_output_devices()
            .into_iter()
            .map(|name| format!("{} (output)", name));
        inputs.chain(outputs).collect()
    }

    /// Find a device whose name contains `pattern`, ignoring case.
    ///
    /// `None` selects the host default. A named device that is not present yet
    /// is looked up again every [`SEARCH_INTERVAL`] until `timeout` elapses;
    /// at least one lookup always happens.
    pub fn find_device(
        &self,
        kind: DeviceKind,
        pattern: Option<&str>,
        timeout: Duration,
    ) -> Result<Device, LooperError> {
        let Some(pattern) = pattern else {
            let device = match kind {
                DeviceKind::Input => self.host.default_input_device(),
                DeviceKind::Output => self.host.default_output_device(),
            };
            return device.ok_or_else(|| {
                LooperError::DeviceNotAvailable(format!("no default {} device", kind.as_str()))
            });
        };

        log::info!("Searching {} device '{}'", kind.as_str(), pattern);
        poll_until(timeout, SEARCH_INTERVAL, || self.lookup(kind, pattern)).ok_or_else(|| {
            LooperError::DeviceNotAvailable(format!(
                "no {} device matching '{}' within {:?}",
                kind.as_str(),
                pattern,
                timeout
            ))
        })
    }

    fn lookup(&self, kind: DeviceKind, pattern: &str) -> Option<Device> {
        let devices = match kind {
            DeviceKind::Input => self.host.input_devices(),
            DeviceKind::Output => self.host.output_devices(),
        };
        match devices {
            Ok(mut devices) => devices.find(|d| matches_pattern(&device_name(d), pattern)),
            Err(e) => {
                log::debug!("Device enumeration failed: {}", e);
                None
            }
        }
    }
}

impl Default for DeviceEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn device_name(device: &Device) -> String {
    device.name().unwrap_or_else(|_| "unknown device".into())
}

/// Case-insensitive substring match. An empty pattern matches everything.
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    name.to_lowercase().contains(&pattern.to_lowercase())
}

/// Call `attempt` until it yields a value or `timeout` has elapsed, sleeping
/// `interval` between calls.
pub fn poll_until<T>(
    timeout: Duration,
    interval: Duration,
    mut attempt: impl FnMut() -> Option<T>,
) -> Option<T> {
    let start = Instant::now();
    loop {
        if let Some(value) = attempt() {
            return Some(value);
        }
        if start.elapsed() + interval > timeout {
            return None;
        }
        thread::sleep(interval);
    }
}
