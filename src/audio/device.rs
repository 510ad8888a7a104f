// Périphériques de sortie - Listing and selection through the cpal host

use crate::error::{MetronomeError, Result};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

/// Output device as shown by `clicktrack devices`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

pub struct AudioDeviceManager {
    host: Host,
}

impl AudioDeviceManager {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// Every output device with a readable name. Enumeration errors are
    /// logged and give an empty list.
    pub fn list_output_devices(&self) -> Vec<AudioDeviceInfo> {
        let default_name = self
            .host
            .default_output_device()
            .and_then(|device| device.name().ok());

        let devices = match self.host.output_devices() {
            Ok(devices) => devices,
            Err(e) => {
                log::warn!("Could not enumerate output devices: {}", e);
                return Vec::new();
            }
        };

        devices
            .filter_map(|device| device.name().ok())
            .map(|name| AudioDeviceInfo {
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
            })
            .collect()
    }

    /// Device named in the engine config, or the host default for `None`
    pub fn output_device(&self, name: Option<&str>) -> Result<Device> {
        match name {
            Some(name) => self
                .find_output_device(name)
                .ok_or_else(|| MetronomeError::DeviceNotFound(name.to_string())),
            None => self
                .host
                .default_output_device()
                .ok_or(MetronomeError::NoOutputDevice),
        }
    }

    /// Exact-name lookup among the host's output devices
    pub fn find_output_device(&self, name: &str) -> Option<Device> {
        self.host
            .output_devices()
            .ok()?
            .find(|device| device.name().is_ok_and(|n| n == name))
    }
}

impl Default for AudioDeviceManager {
    fn default() -> Self {
        Self::new()
    }
}
