use std::path::PathBuf;

/// App name used in platform paths.
const APP_NAME: &str = "aslan-browser";

/// Get the platform-appropriate configuration directory.
///
/// - macOS:  `~/Library/Application Support/aslan-browser/`
/// - Linux:  `~/.config/aslan-browser/`
/// - Windows: `%APPDATA%\aslan-browser\`
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the platform-appropriate log directory.
pub fn get_log_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(get_config_dir)
        .join(APP_NAME)
        .join("logs")
}

/// Default parent directory for learn-mode recordings (spec §6.4):
/// `<temp>/aslan-learn/<name>/`.
pub fn get_learn_root() -> PathBuf {
    std::env::temp_dir().join("aslan-learn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_contains_app_name() {
        let dir = get_config_dir();
        assert!(dir.to_string_lossy().contains(APP_NAME));
    }

    #[test]
    fn log_dir_contains_app_name() {
        let dir = get_log_dir();
        assert!(dir.to_string_lossy().contains(APP_NAME));
    }

    #[test]
    fn learn_root_is_under_temp_dir() {
        let dir = get_learn_root();
        assert!(dir.starts_with(std::env::temp_dir()));
        assert!(dir.ends_with("aslan-learn"));
    }
}
