//! The Tab façade (spec §4.3): the single owner of one WebView, serializing
//! every operation through an internal lock the way the real WebView is
//! pinned to its platform's UI execution context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::error::BrowserError;
use crate::learn::recorder::LearnRecorder;
use crate::webview::attributes::WaitUntil;
use crate::webview::bridge_js;
use crate::webview::host::{NavigationEvent, WebViewHost};
use crate::webview::learn_js::LEARN_JS;
use crate::webview::readiness::ReadinessDetector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum NavState {
    #[default]
    Idle,
    Navigating,
    Loaded,
    Failed,
}

pub struct Tab {
    pub id: String,
    host: Arc<dyn WebViewHost>,
    session_id: Mutex<Option<String>>,
    nav_state: Mutex<NavState>,
    /// Serializes every operation on this tab (spec §4.3/§5 invariant 5).
    op_lock: Mutex<()>,
    readiness: Arc<ReadinessDetector>,
    learn_active: AtomicBool,
    recorder: Mutex<Option<Weak<Mutex<LearnRecorder>>>>,
    dom_stable_debounce_ms: u64,
    events_tx: broadcast::Sender<Value>,
}

impl Tab {
    pub fn new(
        id: String,
        host: Arc<dyn WebViewHost>,
        dom_stable_debounce_ms: u64,
        events_tx: broadcast::Sender<Value>,
    ) -> Arc<Self> {
        let tab = Arc::new(Self {
            id,
            host: host.clone(),
            session_id: Mutex::new(None),
            nav_state: Mutex::new(NavState::Idle),
            op_lock: Mutex::new(()),
            readiness: Arc::new(ReadinessDetector::new()),
            learn_active: AtomicBool::new(false),
            recorder: Mutex::new(None),
            dom_stable_debounce_ms,
            events_tx,
        });

        {
            let host = tab.host.clone();
            let bridge = bridge_js::render(dom_stable_debounce_ms);
            tokio::spawn(async move {
                let _ = host.inject_script(&bridge).await;
            });
        }
        Self::spawn_navigation_watcher(tab.clone());
        Self::spawn_message_watcher(tab.clone());
        tab
    }

    fn spawn_navigation_watcher(tab: Arc<Self>) {
        let mut rx = tab.host.subscribe_navigation();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => tab.on_navigation_event(event).await,
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(tab = %tab.id, skipped = n, "navigation event channel lagged");
                    }
                }
            }
        });
    }

    fn spawn_message_watcher(tab: Arc<Self>) {
        let mut rx = tab.host.subscribe_messages();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(message) => tab.on_bridge_message(message).await,
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(tab = %tab.id, skipped = n, "bridge message channel lagged");
                    }
                }
            }
        });
    }

    async fn on_navigation_event(&self, event: NavigationEvent) {
        let mut state = self.nav_state.lock().await;
        match event {
            NavigationEvent::Started => {
                *state = NavState::Navigating;
                self.readiness.reset().await;
            }
            NavigationEvent::Finished => {
                *state = NavState::Loaded;
                drop(state);
                // `inject_script` is one-shot (macos.rs's `window.eval`), so the
                // bridge has to be reinstalled after every navigation, same as
                // `LEARN_JS` below — a fresh document has no `window.__agent`.
                let bridge = bridge_js::render(self.dom_stable_debounce_ms);
                let _ = self.host.inject_script(&bridge).await;
                self.readiness.on_did_finish_navigation().await;
                if self.learn_active.load(Ordering::SeqCst) {
                    let _ = self.host.inject_script(LEARN_JS).await;
                    let recorder = {
                        let guard = self.recorder.lock().await;
                        guard.as_ref().and_then(Weak::upgrade)
                    };
                    if let Some(recorder) = recorder {
                        recorder.lock().await.record_synthetic(&self.id, "navigation");
                    }
                }
                if let (Ok(url), Ok(title)) = (self.host.current_url().await, self.host.current_title().await) {
                    let _ = self
                        .events_tx
                        .send(json!({"method": "event.navigation", "params": {"tabId": self.id, "url": url, "title": title}}));
                }
            }
            NavigationEvent::FailedProvisional | NavigationEvent::Failed => {
                *state = NavState::Failed;
                drop(state);
                self.readiness.cancel_all().await;
            }
        }
    }

    async fn on_bridge_message(&self, message: Value) {
        let Some(kind) = message.get("type").and_then(Value::as_str) else { return };
        match kind {
            "domStable" => self.readiness.on_dom_stable().await,
            "networkBusy" => self.readiness.on_network_busy().await,
            "networkIdle" => self.readiness.on_network_idle().await,
            "learn.action" => self.forward_learn_action(message).await,
            "console" => {
                let _ = self.events_tx.send(json!({
                    "method": "event.console",
                    "params": {"tabId": self.id, "level": message.get("level"), "message": message.get("message")}
                }));
            }
            "error" => {
                let _ = self.events_tx.send(json!({
                    "method": "event.error",
                    "params": {"tabId": self.id, "message": message.get("message"), "source": message.get("source"), "line": message.get("line")}
                }));
            }
            _ => debug!(tab = %self.id, ?message, "unrecognised bridge message"),
        }
    }

    async fn forward_learn_action(&self, message: Value) {
        let recorder = {
            let guard = self.recorder.lock().await;
            guard.as_ref().and_then(Weak::upgrade)
        };
        let Some(recorder) = recorder else { return };
        let Some(action) = message.get("action").cloned() else { return };

        tokio::time::sleep(Duration::from_millis(500)).await;
        let screenshot = self.host.screenshot(70, 1280).await.ok();
        let mut recorder = recorder.lock().await;
        recorder.record_action(&self.id, action, screenshot).await;
    }

    pub async fn session_id(&self) -> Option<String> {
        self.session_id.lock().await.clone()
    }

    pub async fn set_session_id(&self, session_id: Option<String>) {
        *self.session_id.lock().await = session_id;
    }

    pub async fn navigate(&self, url: &str, wait_until: WaitUntil, timeout: Duration) -> Result<(String, String), BrowserError> {
        let _guard = self.op_lock.lock().await;
        let parsed = url::Url::parse(url).map_err(|e| BrowserError::Navigation(format!("invalid url: {e}")))?;

        {
            let mut state = self.nav_state.lock().await;
            *state = NavState::Navigating;
        }
        self.readiness.reset().await;
        self.host.load_url(parsed.as_str()).await?;

        if matches!(wait_until, WaitUntil::None) {
            return Ok((parsed.to_string(), String::new()));
        }

        self.wait_for_navigation_settled(timeout).await?;

        if matches!(wait_until, WaitUntil::Idle) {
            self.readiness.wait_for_idle(timeout).await?;
        }

        let url = self.host.current_url().await?;
        let title = self.host.current_title().await?;
        Ok((url, title))
    }

    async fn wait_for_navigation_settled(&self, timeout: Duration) -> Result<(), BrowserError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            {
                let state = *self.nav_state.lock().await;
                match state {
                    NavState::Loaded => return Ok(()),
                    NavState::Failed => return Err(BrowserError::Navigation("navigation failed".into())),
                    _ => {}
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::Timeout("timed out waiting for navigation".into()));
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    pub async fn go_back(&self, timeout: Duration) -> Result<(String, String), BrowserError> {
        let _guard = self.op_lock.lock().await;
        self.readiness.reset().await;
        self.host.go_back().await?;
        self.wait_for_navigation_settled(timeout).await?;
        Ok((self.host.current_url().await?, self.host.current_title().await?))
    }

    pub async fn go_forward(&self, timeout: Duration) -> Result<(String, String), BrowserError> {
        let _guard = self.op_lock.lock().await;
        self.readiness.reset().await;
        self.host.go_forward().await?;
        self.wait_for_navigation_settled(timeout).await?;
        Ok((self.host.current_url().await?, self.host.current_title().await?))
    }

    pub async fn reload(&self, timeout: Duration) -> Result<(String, String), BrowserError> {
        let _guard = self.op_lock.lock().await;
        self.readiness.reset().await;
        self.host.reload().await?;
        self.wait_for_navigation_settled(timeout).await?;
        Ok((self.host.current_url().await?, self.host.current_title().await?))
    }

    pub async fn stop_loading(&self) -> Result<(), BrowserError> {
        let _guard = self.op_lock.lock().await;
        self.host.stop_loading().await?;
        *self.nav_state.lock().await = NavState::Failed;
        self.readiness.cancel_all().await;
        Ok(())
    }

    pub async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let _guard = self.op_lock.lock().await;
        let script = format!(
            "return await window.__agent.waitForSelector({}, {});",
            serde_json::to_string(selector).unwrap_or_default(),
            timeout.as_millis()
        );
        self.host.evaluate(&script, json!({})).await?;
        Ok(())
    }

    pub async fn evaluate(&self, script: &str, args: Value) -> Result<Value, BrowserError> {
        let _guard = self.op_lock.lock().await;
        self.host.evaluate(script, args).await
    }

    pub async fn screenshot(&self, quality: u8, width: u32) -> Result<Vec<u8>, BrowserError> {
        let _guard = self.op_lock.lock().await;
        self.host.screenshot(quality, width).await
    }

    pub async fn get_accessibility_tree(&self) -> Result<Value, BrowserError> {
        let _guard = self.op_lock.lock().await;
        let script = format!(
            "{}\nreturn window.__agentA11y.extractA11yTree();",
            crate::webview::a11y_js::A11Y_JS
        );
        self.host.evaluate(&script, json!({})).await
    }

    pub async fn click(&self, target: &str) -> Result<Value, BrowserError> {
        self.run_primitive("click", &[target]).await
    }

    pub async fn fill(&self, target: &str, value: &str) -> Result<Value, BrowserError> {
        self.run_primitive("fill", &[target, value]).await
    }

    pub async fn select(&self, target: &str, value: &str) -> Result<Value, BrowserError> {
        self.run_primitive("select", &[target, value]).await
    }

    pub async fn keypress(&self, key: &str, modifiers: Value) -> Result<Value, BrowserError> {
        let _guard = self.op_lock.lock().await;
        let script = format!(
            "{}\nreturn window.__agentA11y.keypress({}, {});",
            crate::webview::a11y_js::A11Y_JS,
            serde_json::to_string(key).unwrap_or_default(),
            modifiers
        );
        self.host.evaluate(&script, json!({})).await
    }

    pub async fn scroll(&self, x: Option<f64>, y: Option<f64>, target: Option<&str>) -> Result<Value, BrowserError> {
        let _guard = self.op_lock.lock().await;
        let script = format!(
            "{}\nreturn window.__agentA11y.scroll({}, {}, {});",
            crate::webview::a11y_js::A11Y_JS,
            x.map(|v| v.to_string()).unwrap_or_else(|| "undefined".into()),
            y.map(|v| v.to_string()).unwrap_or_else(|| "undefined".into()),
            target.map(|t| serde_json::to_string(t).unwrap_or_default()).unwrap_or_else(|| "undefined".into())
        );
        self.host.evaluate(&script, json!({})).await
    }

    async fn run_primitive(&self, name: &str, string_args: &[&str]) -> Result<Value, BrowserError> {
        let _guard = self.op_lock.lock().await;
        let rendered_args: Vec<String> = string_args
            .iter()
            .map(|a| serde_json::to_string(a).unwrap_or_default())
            .collect();
        let script = format!(
            "{}\nreturn window.__agentA11y.{}({});",
            crate::webview::a11y_js::A11Y_JS,
            name,
            rendered_args.join(", ")
        );
        self.host.evaluate(&script, json!({})).await
    }

    pub async fn get_cookies(&self, url: Option<&str>) -> Result<Value, BrowserError> {
        let _guard = self.op_lock.lock().await;
        let cookies = self.host.get_cookies(url).await?;
        Ok(json!(cookies))
    }

    pub async fn set_cookie(&self, cookie: Value) -> Result<(), BrowserError> {
        let _guard = self.op_lock.lock().await;
        self.host.set_cookie(cookie).await
    }

    pub async fn get_title(&self) -> Result<String, BrowserError> {
        let _guard = self.op_lock.lock().await;
        self.host.current_title().await
    }

    pub async fn get_url(&self) -> Result<String, BrowserError> {
        let _guard = self.op_lock.lock().await;
        self.host.current_url().await
    }

    /// Install the learn-mode listeners (spec §4.2 invariant 6, §4.7).
    pub async fn start_learn_listeners(&self, recorder: Weak<Mutex<LearnRecorder>>) -> Result<(), BrowserError> {
        let _guard = self.op_lock.lock().await;
        *self.recorder.lock().await = Some(recorder);
        self.learn_active.store(true, Ordering::SeqCst);
        self.host.set_recording(true);
        self.host.inject_script(LEARN_JS).await
    }

    pub async fn stop_learn_listeners(&self) {
        self.learn_active.store(false, Ordering::SeqCst);
        *self.recorder.lock().await = None;
        self.host.set_recording(false);
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.host.set_hidden(hidden);
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        self.host.set_viewport(width, height);
    }

    /// Closing a tab: detach the bridge, hide the window, resolve any
    /// pending readiness waiters with a cancellation, and defer the
    /// WebView's release by one event-loop tick (spec §4.3 teardown).
    pub async fn teardown(&self) {
        self.readiness.cancel_all().await;
        self.host.set_hidden(true);
        tokio::task::yield_now().await;
        self.host.teardown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webview::host::Cookie;
    use std::sync::atomic::AtomicU32;

    struct FakeHost {
        nav_tx: broadcast::Sender<NavigationEvent>,
        msg_tx: broadcast::Sender<Value>,
        title: Mutex<String>,
        url: Mutex<String>,
        evaluate_calls: AtomicU32,
    }

    impl FakeHost {
        fn new() -> Arc<Self> {
            let (nav_tx, _) = broadcast::channel(16);
            let (msg_tx, _) = broadcast::channel(16);
            Arc::new(Self {
                nav_tx,
                msg_tx,
                title: Mutex::new(String::new()),
                url: Mutex::new(String::new()),
                evaluate_calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl WebViewHost for FakeHost {
        async fn load_url(&self, url: &str) -> Result<(), BrowserError> {
            *self.url.lock().await = url.to_string();
            let tx = self.nav_tx.clone();
            let url = url.to_string();
            let title = self.title.clone();
            tokio::spawn(async move {
                let _ = tx.send(NavigationEvent::Started);
                tokio::time::sleep(Duration::from_millis(5)).await;
                *title.lock().await = format!("title for {url}");
                let _ = tx.send(NavigationEvent::Finished);
            });
            Ok(())
        }
        async fn go_back(&self) -> Result<(), BrowserError> {
            Ok(())
        }
        async fn go_forward(&self) -> Result<(), BrowserError> {
            Ok(())
        }
        async fn reload(&self) -> Result<(), BrowserError> {
            Ok(())
        }
        async fn stop_loading(&self) -> Result<(), BrowserError> {
            Ok(())
        }
        async fn evaluate(&self, _script: &str, _args: Value) -> Result<Value, BrowserError> {
            self.evaluate_calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"value": null}))
        }
        async fn inject_script(&self, _script: &str) -> Result<(), BrowserError> {
            Ok(())
        }
        async fn screenshot(&self, _quality: u8, _width: u32) -> Result<Vec<u8>, BrowserError> {
            Ok(vec![0xFF, 0xD8, 0xFF])
        }
        async fn get_cookies(&self, _url: Option<&str>) -> Result<Vec<Cookie>, BrowserError> {
            Ok(vec![])
        }
        async fn set_cookie(&self, _cookie: Cookie) -> Result<(), BrowserError> {
            Ok(())
        }
        async fn current_title(&self) -> Result<String, BrowserError> {
            Ok(self.title.lock().await.clone())
        }
        async fn current_url(&self) -> Result<String, BrowserError> {
            Ok(self.url.lock().await.clone())
        }
        fn set_viewport(&self, _width: u32, _height: u32) {}
        fn subscribe_navigation(&self) -> broadcast::Receiver<NavigationEvent> {
            self.nav_tx.subscribe()
        }
        fn subscribe_messages(&self) -> broadcast::Receiver<Value> {
            self.msg_tx.subscribe()
        }
        async fn teardown(&self) {}
        fn set_hidden(&self, _hidden: bool) {}
    }

    #[tokio::test]
    async fn navigate_load_returns_url_and_title() {
        let host = FakeHost::new();
        let (events_tx, _) = broadcast::channel(16);
        let tab = Tab::new("tab0".into(), host, 50, events_tx);
        let (url, title) = tab
            .navigate("https://example.com", WaitUntil::Load, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(url, "https://example.com/");
        assert_eq!(title, "title for https://example.com/");
    }

    #[tokio::test]
    async fn navigate_none_returns_immediately_without_title() {
        let host = FakeHost::new();
        let (events_tx, _) = broadcast::channel(16);
        let tab = Tab::new("tab0".into(), host, 50, events_tx);
        let (url, title) = tab
            .navigate("https://example.com/path", WaitUntil::None, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(url, "https://example.com/path");
        assert_eq!(title, "");
    }

    #[tokio::test]
    async fn navigate_rejects_invalid_url() {
        let host = FakeHost::new();
        let (events_tx, _) = broadcast::channel(16);
        let tab = Tab::new("tab0".into(), host, 50, events_tx);
        let err = tab
            .navigate("not a url", WaitUntil::None, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BrowserError::Navigation(_)));
    }

    #[tokio::test]
    async fn session_id_round_trips() {
        let host = FakeHost::new();
        let (events_tx, _) = broadcast::channel(16);
        let tab = Tab::new("tab1".into(), host, 50, events_tx);
        assert_eq!(tab.session_id().await, None);
        tab.set_session_id(Some("s0".into())).await;
        assert_eq!(tab.session_id().await, Some("s0".into()));
    }
}
