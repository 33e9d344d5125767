use playlink_core::entities::{DeviceId, DevicePlatform};
use playlink_core::ports::DeviceInfo;
use playlink_core::Error;
use sha1::{Digest, Sha1};

/// Device identity derived from the host machine
#[derive(Debug, Clone)]
pub struct HostDeviceInfo {
    platform: DevicePlatform,
    id: Option<String>,
}

impl HostDeviceInfo {
    pub fn new() -> Self {
        Self {
            platform: current_platform(),
            id: None,
        }
    }

    /// Use a fixed identifier instead of hashing host details
    pub fn with_id(platform: DevicePlatform, id: String) -> Self {
        Self {
            platform,
            id: Some(id),
        }
    }
}

impl Default for HostDeviceInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceInfo for HostDeviceInfo {
    fn device_id(&self) -> Result<DeviceId, Error> {
        let id = match &self.id {
            Some(id) if id.trim().is_empty() => {
                return Err(Error::Other("device id must not be empty".to_string()))
            }
            Some(id) => id.clone(),
            None => make_device_id(),
        };
        Ok(DeviceId::new(self.platform, id))
    }
}

fn current_platform() -> DevicePlatform {
    if cfg!(target_os = "android") {
        DevicePlatform::Android
    } else if cfg!(target_os = "ios") {
        DevicePlatform::Ios
    } else {
        DevicePlatform::Desktop
    }
}

/// Stable machine identifier: SHA1 of hostname + username + OS,
/// prefixed with a one-byte checksum.
fn make_device_id() -> String {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let username = whoami::username();
    let os_info = std::env::consts::OS;

    let mut hasher = Sha1::new();
    hasher.update(format!("{}{}{}", hostname, username, os_info).as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 9];
    bytes[1..].copy_from_slice(&digest[0..8]);

    // Checksum byte: negated wrapping sum of the hash bytes
    bytes[0] = bytes[1..]
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b))
        .wrapping_neg();

    hex::encode(bytes)
}
