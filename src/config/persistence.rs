use std::fs;
use std::path::Path;

use serde_json::Value;

use super::schema::AppConfig;

/// Load config from disk, falling back to defaults.
///
/// Reads `config.json` from the given directory. If it exists, its contents
/// are deep-merged on top of `AppConfig::default()` so newly-added config
/// keys automatically get their default values. Falls back to
/// `config.json.bak`, then to `AppConfig::default()`.
pub fn load_config(config_dir: &Path) -> AppConfig {
    let config_path = config_dir.join("config.json");
    let backup_path = config_dir.join("config.json.bak");

    for path in &[&config_path, &backup_path] {
        if path.exists() {
            if let Ok(text) = fs::read_to_string(path) {
                if let Ok(saved) = serde_json::from_str::<Value>(&text) {
                    let default_val = match serde_json::to_value(AppConfig::default()) {
                        Ok(v) => v,
                        Err(_) => return AppConfig::default(),
                    };
                    let merged = deep_merge(default_val, saved);
                    if let Ok(config) = serde_json::from_value::<AppConfig>(merged) {
                        return config;
                    }
                }
            }
        }
    }

    AppConfig::default()
}

/// Save config to disk with an atomic write: write `.tmp`, back up the
/// existing file to `.bak`, then rename `.tmp` over the final path.
pub fn save_config(config_dir: &Path, config: &AppConfig) -> Result<(), String> {
    fs::create_dir_all(config_dir).map_err(|e| format!("failed to create config dir: {}", e))?;

    let config_path = config_dir.join("config.json");
    let tmp_path = config_dir.join("config.json.tmp");
    let backup_path = config_dir.join("config.json.bak");

    let json =
        serde_json::to_string_pretty(config).map_err(|e| format!("serialize error: {}", e))?;

    fs::write(&tmp_path, &json).map_err(|e| format!("write error: {}", e))?;

    if config_path.exists() {
        let _ = fs::copy(&config_path, &backup_path);
    }

    fs::rename(&tmp_path, &config_path).map_err(|e| format!("rename error: {}", e))?;

    Ok(())
}

/// Recursively merge `patch` into `base`. Objects merge key-by-key; every
/// other type (including arrays) is replaced wholesale by `patch`.
pub fn deep_merge(base: Value, patch: Value) -> Value {
    match (base, patch) {
        (Value::Object(mut base_map), Value::Object(patch_map)) => {
            for (key, patch_val) in patch_map {
                let merged = if let Some(base_val) = base_map.remove(&key) {
                    deep_merge(base_val, patch_val)
                } else {
                    patch_val
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_base, patch) => patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_preserves_unpatched_keys() {
        let base = json!({"transport": {"socket_path": "/tmp/a.sock"}, "tabs": {"width": 1280}});
        let patch = json!({"transport": {"socket_path": "/tmp/b.sock"}});
        let result = deep_merge(base, patch);
        assert_eq!(result["transport"]["socket_path"], "/tmp/b.sock");
        assert_eq!(result["tabs"]["width"], 1280);
    }

    #[test]
    fn deep_merge_replaces_arrays() {
        let base = json!({"arr": [1, 2, 3]});
        let patch = json!({"arr": [4]});
        assert_eq!(deep_merge(base, patch), json!({"arr": [4]}));
    }

    #[test]
    fn load_config_defaults_on_missing_dir() {
        let config = load_config(Path::new("/nonexistent/aslan-browser-config-dir"));
        assert_eq!(config.transport.socket_path, "/tmp/aslan-browser.sock");
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = std::env::temp_dir().join("aslan-browser-test-persistence");
        let _ = fs::remove_dir_all(&tmp);

        let mut config = AppConfig::default();
        config.transport.socket_path = "/tmp/custom.sock".into();
        config.tabs.width = 1440;

        save_config(&tmp, &config).expect("save should succeed");

        let loaded = load_config(&tmp);
        assert_eq!(loaded.transport.socket_path, "/tmp/custom.sock");
        assert_eq!(loaded.tabs.width, 1440);

        let _ = fs::remove_dir_all(&tmp);
    }
}
