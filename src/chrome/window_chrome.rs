//! Minimal window chrome (spec §4.3 "Window chrome (out-of-hot-path)").
//!
//! Purely UX: an address bar, a Go/Stop button, a bottom status bar
//! showing the loading URL, and, during learn recording, a red "● REC"
//! indicator with an annotation button. Rendered as a small overlay HTML
//! page hosted in its own `WebviewWindow`, independent of the content
//! WebView the façade drives.

use std::sync::Arc;

use tauri::{AppHandle, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use crate::registry::Registry;
use crate::router::handlers::learn;

const CHROME_HTML: &str = r#"<!doctype html>
<html><head><meta charset="utf-8"><style>
  body { margin: 0; font: 12px -apple-system, sans-serif; background: #e8e8e8; }
  #bar { display: flex; align-items: center; gap: 6px; padding: 4px 8px; }
  #address { flex: 1; padding: 3px 6px; }
  #status { padding: 2px 8px; color: #555; border-top: 1px solid #ccc; white-space: nowrap; overflow: hidden; text-overflow: ellipsis; }
  #rec { display: none; color: #c0392b; font-weight: bold; }
  #rec.active { display: inline; }
</style></head>
<body>
  <div id="bar">
    <button id="go">Go</button>
    <input id="address" type="text" readonly />
    <span id="rec">● REC</span>
    <button id="annotate" style="display:none">Note</button>
  </div>
  <div id="status"></div>
  <script>
    window.__chrome = {
      setUrl: function (url) { document.getElementById('address').value = url; },
      setLoading: function (loading, url) {
        document.getElementById('go').textContent = loading ? 'Stop' : 'Go';
        document.getElementById('status').textContent = loading ? url : '';
      },
      setRecording: function (active) {
        document.getElementById('rec').className = active ? 'active' : '';
        document.getElementById('annotate').style.display = active ? 'inline-block' : 'none';
      },
    };
    document.getElementById('annotate').addEventListener('click', function () {
      window.__TAURI__.core.invoke('learn_annotate', { tabId: window.__chromeTabId, text: 'user annotation' });
    });
  </script>
</body></html>"#;

/// Registered once as a Tauri command so the chrome window's "Note" button
/// reaches the same recorder call `learn.note` uses over RPC (spec §4.3).
#[tauri::command]
pub async fn learn_annotate(tab_id: String, registry: tauri::State<'_, Arc<Registry>>) -> Result<(), String> {
    learn::annotate(&registry, &tab_id, "user annotation").await.map_err(|e| e.to_string())
}

/// One chrome overlay window, paired with a content tab by id.
#[derive(Clone)]
pub struct ChromeWindow {
    window: WebviewWindow,
}

impl ChromeWindow {
    pub fn create(app: &AppHandle, tab_id: &str) -> tauri::Result<Self> {
        let label = format!("chrome-{tab_id}");
        let data_url = url::Url::parse(&html_data_url()).expect("chrome data url is well-formed");
        let window = WebviewWindowBuilder::new(app, label, WebviewUrl::External(data_url))
            .title(format!("aslan-browser — {tab_id}"))
            .inner_size(800.0, 56.0)
            .resizable(true)
            .initialization_script(format!("window.__chromeTabId = {};", serde_json::to_string(tab_id).unwrap()))
            .build()?;
        Ok(Self { window })
    }

    pub fn set_url(&self, url: &str) {
        let script = format!("window.__chrome.setUrl({});", serde_json::to_string(url).unwrap_or_default());
        let _ = self.window.eval(&script);
    }

    pub fn set_loading(&self, loading: bool, url: &str) {
        let script = format!(
            "window.__chrome.setLoading({}, {});",
            loading,
            serde_json::to_string(url).unwrap_or_default()
        );
        let _ = self.window.eval(&script);
    }

    pub fn set_recording(&self, active: bool) {
        let script = format!("window.__chrome.setRecording({active});");
        let _ = self.window.eval(&script);
    }

    pub fn set_visible(&self, visible: bool) {
        let _ = if visible { self.window.show() } else { self.window.hide() };
    }

    pub fn close(&self) {
        let _ = self.window.close();
    }
}

fn html_data_url() -> String {
    format!("data:text/html;base64,{}", base64::Engine::encode(&base64::engine::general_purpose::STANDARD, CHROME_HTML))
}
