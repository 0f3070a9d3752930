pub mod a11y_js;
pub mod attributes;
pub mod bridge_js;
pub mod host;
pub mod learn_js;
pub mod readiness;
pub mod tab;

#[cfg(target_os = "macos")]
pub mod macos;

pub use attributes::{TabAttributes, WaitUntil};
pub use host::WebViewHost;
pub use tab::Tab;
