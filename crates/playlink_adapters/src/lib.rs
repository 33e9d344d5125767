pub mod configuration;
pub mod device;
pub mod network;
pub mod playfab;
pub mod preferences;
pub mod telemetry;

// Re-exports for convenience
pub use device::HostDeviceInfo;
pub use playfab::PlayFabClient;
pub use preferences::FilePreferenceStore;
