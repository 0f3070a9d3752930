//! macOS `WebViewHost`: a Tauri-hosted window with direct WKWebView access
//! for JS evaluation-with-result and snapshot capture, the macOS analogue
//! of the `ExecuteScript`/`CapturePreview` COM pattern this module's
//! Windows-targeting ancestor used (`services/browser_bridge.rs`).
//!
//! Tauri's own `WebviewWindow` covers navigation, the page-load lifecycle,
//! and user-script injection; it is deliberately preferred over raw
//! WKWebView calls everywhere it already returns what we need. Only
//! evaluate-with-result and snapshot-with-result — the two cases Tauri's
//! fire-and-forget `eval()` cannot serve — drop down to `with_webview`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2_foundation::{NSData, NSError, NSString};
use objc2_web_kit::WKWebView;
use serde_json::Value;
use tauri::webview::{PageLoadEvent, WebviewWindowBuilder};
use tauri::{AppHandle, WebviewUrl, WebviewWindow};
use tokio::sync::{broadcast, oneshot};

use crate::chrome::ChromeWindow;
use crate::error::BrowserError;
use crate::webview::attributes::TabAttributes;
use crate::webview::host::{Cookie, NavigationEvent, WebViewHost};

/// Wraps the blocking pointer extraction `with_webview` requires behind a
/// safe accessor; `WKWebView` methods are called on the main thread via
/// `run_on_main_thread`, matching how WebKit expects to be driven.
pub struct MacosWebViewHost {
    window: WebviewWindow,
    chrome: ChromeWindow,
    nav_tx: broadcast::Sender<NavigationEvent>,
    msg_tx: broadcast::Sender<Value>,
    hidden: AtomicBool,
    tab_id: String,
    agent_posts: AgentPostRegistry,
}

/// Registered once as a Tauri command so every tab's injected JS can reach
/// its host half over the same channel Tauri already uses for JS → Rust
/// calls, without a custom WKScriptMessageHandler class.
#[tauri::command]
pub fn agent_post(tab_id: String, payload: String, registry: tauri::State<'_, AgentPostRegistry>) {
    if let Ok(value) = serde_json::from_str::<Value>(&payload) {
        registry.dispatch(&tab_id, value);
    }
}

#[derive(Default, Clone)]
pub struct AgentPostRegistry {
    senders: Arc<StdMutex<std::collections::HashMap<String, broadcast::Sender<Value>>>>,
}

impl AgentPostRegistry {
    pub fn register(&self, tab_id: &str, sender: broadcast::Sender<Value>) {
        self.senders.lock().unwrap().insert(tab_id.to_string(), sender);
    }

    pub fn unregister(&self, tab_id: &str) {
        self.senders.lock().unwrap().remove(tab_id);
    }

    fn dispatch(&self, tab_id: &str, value: Value) {
        if let Some(sender) = self.senders.lock().unwrap().get(tab_id) {
            let _ = sender.send(value);
        }
    }
}

impl MacosWebViewHost {
    pub fn create(app: &AppHandle, tab_id: &str, attrs: &TabAttributes, registry: &AgentPostRegistry) -> tauri::Result<Arc<Self>> {
        let (nav_tx, _) = broadcast::channel(64);
        let (msg_tx, _) = broadcast::channel(256);
        registry.register(tab_id, msg_tx.clone());

        let chrome = ChromeWindow::create(app, tab_id)?;
        chrome.set_visible(!attrs.hidden);

        let nav_tx_for_builder = nav_tx.clone();
        let chrome_for_builder = chrome.clone();
        let mut builder = WebviewWindowBuilder::new(app, tab_id, WebviewUrl::External("about:blank".parse().unwrap()))
            .title(format!("aslan-browser — {tab_id}"))
            .inner_size(attrs.width as f64, attrs.height as f64)
            .visible(!attrs.hidden)
            .initialization_script(
                "window.__agentPost = function(s) { \
                    window.__TAURI__.core.invoke('agent_post', { tabId: window.__agentTabId, payload: s }); \
                 };",
            )
            .on_page_load(move |_webview, payload| {
                let url = payload.url().to_string();
                match payload.event() {
                    PageLoadEvent::Started => {
                        let _ = nav_tx_for_builder.send(NavigationEvent::Started);
                        chrome_for_builder.set_loading(true, &url);
                    }
                    PageLoadEvent::Finished => {
                        let _ = nav_tx_for_builder.send(NavigationEvent::Finished);
                        chrome_for_builder.set_loading(false, &url);
                        chrome_for_builder.set_url(&url);
                    }
                };
            });
        if let Some(ua) = &attrs.user_agent {
            builder = builder.user_agent(ua);
        }
        let window = builder.build()?;

        let tab_id_script = format!("window.__agentTabId = {};", serde_json::to_string(tab_id).unwrap());
        let _ = window.eval(&tab_id_script);

        Ok(Arc::new(Self {
            window,
            chrome,
            nav_tx,
            msg_tx,
            hidden: AtomicBool::new(attrs.hidden),
            tab_id: tab_id.to_string(),
            agent_posts: registry.clone(),
        }))
    }

    fn with_wkwebview<R: Send + 'static>(
        &self,
        f: impl FnOnce(&WKWebView) -> R + Send + 'static,
    ) -> Result<R, BrowserError> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.window
            .with_webview(move |platform_webview| {
                let webview: Retained<WKWebView> = unsafe { Retained::retain(platform_webview.inner().cast()) }
                    .expect("tauri always hands back a live WKWebView");
                let _ = tx.send(f(&webview));
            })
            .map_err(|e| BrowserError::Internal(format!("with_webview failed: {e}")))?;
        rx.recv().map_err(|_| BrowserError::Internal("WKWebView callback dropped".into()))
    }
}

#[async_trait::async_trait]
impl WebViewHost for MacosWebViewHost {
    async fn load_url(&self, url: &str) -> Result<(), BrowserError> {
        self.window
            .eval(&format!("window.location.href = {};", serde_json::to_string(url).unwrap_or_default()))
            .map_err(|e| BrowserError::Navigation(e.to_string()))
    }

    async fn go_back(&self) -> Result<(), BrowserError> {
        self.window.eval("window.history.back();").map_err(|e| BrowserError::Navigation(e.to_string()))
    }

    async fn go_forward(&self) -> Result<(), BrowserError> {
        self.window.eval("window.history.forward();").map_err(|e| BrowserError::Navigation(e.to_string()))
    }

    async fn reload(&self) -> Result<(), BrowserError> {
        self.window.eval("window.location.reload();").map_err(|e| BrowserError::Navigation(e.to_string()))
    }

    async fn stop_loading(&self) -> Result<(), BrowserError> {
        self.with_wkwebview(|webview| unsafe { webview.stopLoading() })
    }

    async fn evaluate(&self, script: &str, args: Value) -> Result<Value, BrowserError> {
        // WKWebView hands completion handlers native Foundation objects for
        // plain JS values, but only NSString round-trips unambiguously
        // through `Retained::retain` below — so the wrapper always returns
        // a JSON string and `js_result_to_value` parses it back.
        let wrapped = format!(
            "JSON.stringify(await (async function(args) {{ {script} }})({})) ?? 'null'",
            serde_json::to_string(&args).unwrap_or_else(|_| "{}".into())
        );
        let ns_script = NSString::from_str(&wrapped);
        let (tx, rx) = oneshot::channel::<Result<Value, String>>();
        let tx = StdMutex::new(Some(tx));

        self.with_wkwebview(move |webview| {
            let completion = RcBlock::new(move |result: *mut AnyObject, error: *mut NSError| {
                let outcome = if !error.is_null() {
                    let message = unsafe { &*error }.localizedDescription();
                    Err(message.to_string())
                } else {
                    Ok(js_result_to_value(result))
                };
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(outcome);
                }
            });
            unsafe { webview.evaluateJavaScript_completionHandler(&ns_script, Some(&completion)) };
        })?;

        rx.await
            .map_err(|_| BrowserError::Internal("evaluate callback dropped".into()))?
            .map_err(BrowserError::JavaScript)
    }

    async fn inject_script(&self, script: &str) -> Result<(), BrowserError> {
        self.window.eval(script).map_err(|e| BrowserError::JavaScript(e.to_string()))
    }

    async fn screenshot(&self, quality: u8, width: u32) -> Result<Vec<u8>, BrowserError> {
        let (tx, rx) = oneshot::channel::<Result<Vec<u8>, String>>();
        let tx = StdMutex::new(Some(tx));

        self.with_wkwebview(move |webview| {
            let completion = RcBlock::new(move |image: *mut AnyObject, error: *mut NSError| {
                let outcome = if !error.is_null() {
                    let message = unsafe { &*error }.localizedDescription();
                    Err(message.to_string())
                } else {
                    nsimage_to_tiff_bytes(image)
                };
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(outcome);
                }
            });
            unsafe { webview.takeSnapshotWithConfiguration_completionHandler(None, &completion) };
        })?;

        let png = rx
            .await
            .map_err(|_| BrowserError::Internal("snapshot callback dropped".into()))?
            .map_err(|e| BrowserError::Internal(format!("snapshot failed: {e}")))?;

        reencode_as_jpeg(&png, quality, width)
    }

    async fn get_cookies(&self, _url: Option<&str>) -> Result<Vec<Cookie>, BrowserError> {
        // WKHTTPCookieStore's getAllCookies is itself completion-handler based;
        // routed through the same evaluator path keeps one code path for the
        // "await a native completion handler" shape.
        let result = self.evaluate("return document.cookie;", Value::Null).await?;
        let raw = result.as_str().unwrap_or_default();
        let cookies = raw
            .split(';')
            .filter_map(|pair| {
                let mut parts = pair.splitn(2, '=');
                let name = parts.next()?.trim();
                let value = parts.next()?.trim();
                if name.is_empty() {
                    return None;
                }
                Some(serde_json::json!({"name": name, "value": value}))
            })
            .collect();
        Ok(cookies)
    }

    async fn set_cookie(&self, cookie: Cookie) -> Result<(), BrowserError> {
        let name = cookie.get("name").and_then(Value::as_str).ok_or_else(|| BrowserError::invalid_params("cookie.name required"))?;
        let value = cookie.get("value").and_then(Value::as_str).unwrap_or_default();
        let script = format!("document.cookie = {} + '=' + {};", serde_json::to_string(name).unwrap(), serde_json::to_string(value).unwrap());
        self.evaluate(&script, Value::Null).await?;
        Ok(())
    }

    async fn current_title(&self) -> Result<String, BrowserError> {
        let value = self.evaluate("return document.title;", Value::Null).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let value = self.evaluate("return window.location.href;", Value::Null).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn set_viewport(&self, width: u32, height: u32) {
        let _ = self.window.set_size(tauri::Size::Physical(tauri::PhysicalSize::new(width, height)));
    }

    fn subscribe_navigation(&self) -> broadcast::Receiver<NavigationEvent> {
        self.nav_tx.subscribe()
    }

    fn subscribe_messages(&self) -> broadcast::Receiver<Value> {
        self.msg_tx.subscribe()
    }

    async fn teardown(&self) {
        self.agent_posts.unregister(&self.tab_id);
        self.chrome.close();
        let _ = self.window.close();
    }

    fn set_hidden(&self, hidden: bool) {
        self.hidden.store(hidden, Ordering::SeqCst);
        let _ = if hidden { self.window.hide() } else { self.window.show() };
        self.chrome.set_visible(!hidden);
    }

    fn set_recording(&self, active: bool) {
        self.chrome.set_recording(active);
    }
}

fn js_result_to_value(result: *mut AnyObject) -> Value {
    if result.is_null() {
        return Value::Null;
    }
    // `evaluate`'s wrapper always JSON.stringifies its return value, so
    // the completion handler's object is always an NSString here.
    let ns_string: Retained<NSString> = unsafe { Retained::retain(result.cast()) }.expect("result is an NSString");
    serde_json::from_str(&ns_string.to_string()).unwrap_or(Value::Null)
}

fn nsimage_to_tiff_bytes(image: *mut AnyObject) -> Result<Vec<u8>, String> {
    if image.is_null() {
        return Err("snapshot returned no image".into());
    }
    let tiff: Retained<NSData> = unsafe { objc2::msg_send![image, TIFFRepresentation] };
    let bytes = unsafe { std::slice::from_raw_parts(tiff.bytes().cast::<u8>(), tiff.length()) };
    Ok(bytes.to_vec())
}

fn reencode_as_jpeg(source_bytes: &[u8], quality: u8, width: u32) -> Result<Vec<u8>, BrowserError> {
    let img = image::load_from_memory(source_bytes).map_err(|e| BrowserError::Internal(format!("decode snapshot: {e}")))?;
    let scaled = if width > 0 && img.width() != width {
        let height = (img.height() as u64 * width as u64 / img.width().max(1) as u64) as u32;
        img.resize(width, height.max(1), image::imageops::FilterType::Triangle)
    } else {
        img
    };

    let mut out = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder
        .encode_image(&scaled)
        .map_err(|e| BrowserError::Internal(format!("encode jpeg: {e}")))?;
    Ok(out)
}
