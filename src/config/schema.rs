use serde::{Deserialize, Serialize};

/// Top-level on-disk configuration, deep-merged over [`AppConfig::default`]
/// on load so newly added keys pick up their defaults automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub transport: TransportConfig,
    pub tabs: TabDefaults,
    pub learn: LearnConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            tabs: TabDefaults::default(),
            learn: LearnConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Filesystem path of the Unix domain socket (spec §6.1).
    pub socket_path: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            socket_path: "/tmp/aslan-browser.sock".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabDefaults {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f32,
    /// Debounce window for the DOM-stability readiness signal, in ms (spec §4.4).
    pub dom_stable_debounce_ms: u64,
}

impl Default for TabDefaults {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            device_scale_factor: 1.0,
            dom_stable_debounce_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnConfig {
    /// Parent directory for learn-mode screenshot output (spec §4.7/§6.4).
    /// `None` resolves to `<temp>/aslan-learn` at recorder start.
    pub output_dir: Option<String>,
    pub settle_delay_ms: u64,
}

impl Default for LearnConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            settle_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; overridden by `ASLAN_LOG`.
    pub level: String,
    pub file_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: true,
        }
    }
}
