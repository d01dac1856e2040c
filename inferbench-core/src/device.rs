//! Compute devices

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Device names accepted on the command line
pub const DEVICE_CHOICES: &[&str] = &["cpu", "cuda", "mps", "tflite", "apu", "npu", "vulkan"];

/// Raised when a device string is not recognised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Cannot set device (unknown device \"{unknown}\")\nDevice must be one of the following:\n{}",
    DEVICE_CHOICES.join(", ")
)]
pub struct DeviceError {
    /// The rejected device string
    pub unknown: String,
}

/// Backend or accelerator a benchmark targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    /// Host CPU
    Cpu,
    /// NVIDIA GPU, optionally by ordinal (`cuda:1`)
    Cuda(Option<u32>),
    /// Apple Metal Performance Shaders
    Mps,
    /// TensorFlow Lite delegate
    Tflite,
    /// MediaTek AI processing unit
    Apu,
    /// Generic neural processing unit
    Npu,
    /// Vulkan compute
    Vulkan,
}

impl FromStr for Device {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let unknown = || DeviceError {
            unknown: s.trim().to_string(),
        };

        let (kind, ordinal) = match normalized.split_once(':') {
            Some((kind, ordinal)) => (kind, Some(ordinal)),
            None => (normalized.as_str(), None),
        };

        let device = match kind {
            "cpu" => Device::Cpu,
            "cuda" | "gpu" => {
                let ordinal = ordinal
                    .map(|o| o.parse::<u32>().map_err(|_| unknown()))
                    .transpose()?;
                return Ok(Device::Cuda(ordinal));
            }
            "mps" => Device::Mps,
            "tflite" => Device::Tflite,
            "apu" => Device::Apu,
            "npu" => Device::Npu,
            "vulkan" => Device::Vulkan,
            _ => return Err(unknown()),
        };

        match ordinal {
            Some(_) => Err(unknown()),
            None => Ok(device),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda(None) => f.write_str("cuda"),
            Device::Cuda(Some(n)) => write!(f, "cuda:{}", n),
            Device::Mps => f.write_str("mps"),
            Device::Tflite => f.write_str("tflite"),
            Device::Apu => f.write_str("apu"),
            Device::Npu => f.write_str("npu"),
            Device::Vulkan => f.write_str("vulkan"),
        }
    }
}
