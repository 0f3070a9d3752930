//! Platform WebView host abstraction (spec §6.5).
//!
//! Everything the [`Tab`](super::tab::Tab) façade needs from the underlying
//! engine, expressed as an object-safe async trait so the façade and
//! readiness detector can be exercised in tests against an in-memory fake
//! rather than a real WKWebView.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::BrowserError;

/// One navigation-lifecycle callback the host reports back to the façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    Started,
    Finished,
    FailedProvisional,
    Failed,
}

/// A cookie as passed through `getCookies`/`setCookie`.
pub type Cookie = Value;

/// Capabilities required of the WebView engine (§6.5): load-with-callbacks,
/// async JS evaluation with bound arguments, user-script injection, a
/// script-message channel, snapshot capture, and a cookie store.
#[async_trait]
pub trait WebViewHost: Send + Sync {
    /// Begin loading `url`. Completion is reported asynchronously via the
    /// host's navigation event channel, not this call's return.
    async fn load_url(&self, url: &str) -> Result<(), BrowserError>;

    async fn go_back(&self) -> Result<(), BrowserError>;
    async fn go_forward(&self) -> Result<(), BrowserError>;
    async fn reload(&self) -> Result<(), BrowserError>;
    async fn stop_loading(&self) -> Result<(), BrowserError>;

    /// Evaluate `script` (an async-function body) with `args` bound as
    /// named parameters. Awaits promise return values.
    async fn evaluate(&self, script: &str, args: Value) -> Result<Value, BrowserError>;

    /// Inject `script` as a user script, document-end, main-frame-only.
    async fn inject_script(&self, script: &str) -> Result<(), BrowserError>;

    /// Capture a snapshot at `width` content pixels, encode as JPEG at
    /// `quality` (0..=100), return raw JPEG bytes.
    async fn screenshot(&self, quality: u8, width: u32) -> Result<Vec<u8>, BrowserError>;

    async fn get_cookies(&self, url: Option<&str>) -> Result<Vec<Cookie>, BrowserError>;
    async fn set_cookie(&self, cookie: Cookie) -> Result<(), BrowserError>;

    /// Current `document.title` / location URL, read directly rather than
    /// through `evaluate` so callers don't pay a round-trip through the
    /// JS evaluator for the common case.
    async fn current_title(&self) -> Result<String, BrowserError>;
    async fn current_url(&self) -> Result<String, BrowserError>;

    fn set_viewport(&self, width: u32, height: u32);

    /// Navigation lifecycle events (§4.3 state machine), fed to the
    /// façade and readiness detector.
    fn subscribe_navigation(&self) -> broadcast::Receiver<NavigationEvent>;

    /// Script-message channel: every `window.__agentPost(json)` call from
    /// the injected bridge, a11y, or learn-mode JS arrives here as a
    /// parsed JSON value (§4.5/§4.7).
    fn subscribe_messages(&self) -> broadcast::Receiver<Value>;

    /// Hide the window and detach script message handlers. Must not block
    /// on releasing the underlying WebView (§4.3 teardown).
    async fn teardown(&self);

    /// Set whether the host's window is visible (`hidden` tab attribute).
    fn set_hidden(&self, hidden: bool);

    /// Toggle the window chrome's recording indicator (spec §4.3 window
    /// chrome, §4.7 learn mode). No-op for hosts with no chrome of their
    /// own (e.g. test fakes).
    fn set_recording(&self, _active: bool) {}
}
