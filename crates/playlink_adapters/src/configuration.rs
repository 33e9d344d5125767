use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use playlink_core::config::{Settings, DEFAULT_TITLE_ID};

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "playlink", "playlink")
}

/// Directory holding the local preference file
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

pub fn get_configuration_with_paths(
    current_dir_path: Option<PathBuf>,
    system_config_dir_path: Option<PathBuf>,
) -> Result<Settings, config::ConfigError> {
    let config_directory = current_dir_path.unwrap_or_else(|| {
        std::env::current_dir()
            .map(|p| p.join("config"))
            .unwrap_or_else(|_| PathBuf::from("config"))
    });

    let system_config_dir = if let Some(path) = system_config_dir_path {
        path
    } else {
        project_dirs()
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("config"))
    };

    let settings = Config::builder()
        .set_default("title_id", DEFAULT_TITLE_ID)?
        .set_default("request_timeout_secs", 30)?
        .set_default("registration_fallback", "always")?
        .set_default("log_level", "info")?
        // Cloud script settings
        .set_default("script.function_name", "UpdatePlayerStats")?
        .set_default("script.generate_play_stream_event", true)?
        // Local storage
        .set_default("storage.file_name", "prefs.json")?
        .add_source(File::from(system_config_dir.join("config.toml")).required(false))
        .add_source(File::from(config_directory.join("config.toml")).required(false))
        .add_source(Environment::with_prefix("PLAYLINK").separator("__"))
        .build()?;

    settings.try_deserialize::<Settings>()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    get_configuration_with_paths(None, None)
}
