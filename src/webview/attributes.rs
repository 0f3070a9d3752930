//! Per-tab creation attributes and wait-policy enums (spec §4.2/§4.3).

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    None,
    Load,
    #[default]
    Idle,
}

#[derive(Debug, Clone)]
pub struct TabAttributes {
    pub width: u32,
    pub height: u32,
    pub hidden: bool,
    /// Overrides `navigator.userAgent` and the `User-Agent` request header
    /// for this tab's WebView. Common on CEF/WebKit-backed automation
    /// hosts; not part of spec.md's steady-state loop.
    pub user_agent: Option<String>,
}

impl TabAttributes {
    pub fn new(width: u32, height: u32, hidden: bool) -> Self {
        Self { width, height, hidden, user_agent: None }
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }
}
