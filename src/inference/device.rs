use candle_core::Device;
use tracing::{debug, warn};

#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::info;

use super::config::DevicePreference;
use super::error::SessionError;

/// Picks the compute device for a session.
///
/// `Auto` tries the accelerators enabled through cargo features (Metal, then
/// CUDA) and falls back to CPU. An accelerator that fails to initialize is
/// not fatal.
pub fn select_device(preference: DevicePreference) -> Result<Device, SessionError> {
    if preference == DevicePreference::Cpu {
        debug!("CPU device requested explicitly");
        return Ok(Device::Cpu);
    }

    #[cfg_attr(not(any(feature = "metal", feature = "cuda")), allow(unused_mut))]
    let mut failures: Vec<String> = Vec::new();

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Scoring on Metal GPU");
                return Ok(device);
            }
            Err(e) => {
                warn!(error = %e, "Metal device unavailable");
                failures.push(format!("metal: {e}"));
            }
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("Scoring on CUDA GPU");
                return Ok(device);
            }
            Err(e) => {
                warn!(error = %e, "CUDA device unavailable");
                failures.push(format!("cuda: {e}"));
            }
        }
    }

    if failures.is_empty() {
        debug!("No GPU backend compiled, scoring on CPU");
    } else {
        warn!(reasons = %failures.join("; "), "Falling back to CPU device");
    }

    Ok(Device::Cpu)
}

/// Short label used in logs and diagnostics.
pub fn device_label(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}
