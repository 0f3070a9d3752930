pub mod persistence;
pub mod schema;

pub use schema::AppConfig;

use crate::services::platform;

/// Load the effective config: on-disk `config.json` deep-merged over
/// defaults, then overridden by the handful of environment variables a
/// host process is expected to support (spec §2 bootstrap sequence).
pub fn load() -> AppConfig {
    let mut config = persistence::load_config(&platform::get_config_dir());

    if let Ok(path) = std::env::var("ASLAN_SOCKET_PATH") {
        config.transport.socket_path = path;
    }
    if let Ok(level) = std::env::var("ASLAN_LOG") {
        config.logging.level = level;
    }
    if let Ok(dir) = std::env::var("ASLAN_LEARN_DIR") {
        config.learn.output_dir = Some(dir);
    }

    config
}
