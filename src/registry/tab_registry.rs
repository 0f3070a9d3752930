//! Tab & Session Registry (spec §4.2): the single source of truth for the
//! set of tabs and sessions, and the only place that allocates their ids.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::{broadcast, Mutex};

use crate::error::BrowserError;
use crate::learn::LearnRecorder;
use crate::registry::session::Session;
use crate::webview::attributes::TabAttributes;
use crate::webview::host::WebViewHost;
use crate::webview::tab::Tab;

/// Constructs the platform `WebViewHost` for a new tab. Kept behind a
/// closure so the registry (and its tests) never depend on a concrete
/// platform implementation.
pub type HostFactory = Arc<dyn Fn(&str, &TabAttributes) -> Arc<dyn WebViewHost> + Send + Sync>;

struct State {
    tabs: HashMap<String, Arc<Tab>>,
    sessions: HashMap<String, Session>,
}

pub struct Registry {
    state: Mutex<State>,
    next_tab_seq: AtomicU64,
    next_session_seq: AtomicU64,
    host_factory: HostFactory,
    dom_stable_debounce_ms: u64,
    events_tx: broadcast::Sender<Value>,
    pub learn_recorder: Arc<Mutex<LearnRecorder>>,
    pub default_width: u32,
    pub default_height: u32,
    pub learn_root: std::path::PathBuf,
}

impl Registry {
    /// Builds the registry and its permanent `tab0` (spec §3 invariant 2).
    pub async fn bootstrap(
        host_factory: HostFactory,
        dom_stable_debounce_ms: u64,
        default_attrs: TabAttributes,
        events_tx: broadcast::Sender<Value>,
        learn_root: std::path::PathBuf,
    ) -> Arc<Self> {
        let registry = Arc::new(Self {
            state: Mutex::new(State { tabs: HashMap::new(), sessions: HashMap::new() }),
            next_tab_seq: AtomicU64::new(1),
            next_session_seq: AtomicU64::new(0),
            host_factory,
            dom_stable_debounce_ms,
            events_tx,
            learn_recorder: Arc::new(Mutex::new(LearnRecorder::new())),
            default_width: default_attrs.width,
            default_height: default_attrs.height,
            learn_root,
        });

        let host = (registry.host_factory)("tab0", &default_attrs);
        let tab0 = Tab::new("tab0".to_string(), host, registry.dom_stable_debounce_ms, registry.events_tx.clone());
        registry.state.lock().await.tabs.insert("tab0".to_string(), tab0);
        registry
    }

    pub fn events(&self) -> broadcast::Sender<Value> {
        self.events_tx.clone()
    }

    pub async fn create_tab(
        &self,
        attrs: TabAttributes,
        session_id: Option<&str>,
    ) -> Result<String, BrowserError> {
        if let Some(sid) = session_id {
            let state = self.state.lock().await;
            if !state.sessions.contains_key(sid) {
                return Err(BrowserError::session_not_found(sid));
            }
        }

        let tab_id = format!("tab{}", self.next_tab_seq.fetch_add(1, Ordering::SeqCst));
        let host = (self.host_factory)(&tab_id, &attrs);
        let tab = Tab::new(tab_id.clone(), host, self.dom_stable_debounce_ms, self.events_tx.clone());
        tab.set_hidden(attrs.hidden);

        {
            let mut state = self.state.lock().await;
            if let Some(sid) = session_id {
                if let Some(session) = state.sessions.get_mut(sid) {
                    session.tab_ids.insert(tab_id.clone());
                }
            }
            state.tabs.insert(tab_id.clone(), tab.clone());
            if let Some(sid) = session_id {
                tab.set_session_id(Some(sid.to_string())).await;
            }
        }

        let recording = {
            let mut recorder = self.learn_recorder.lock().await;
            if recorder.is_recording() {
                recorder.record_synthetic(&tab_id, "tab.created");
                true
            } else {
                false
            }
        };
        if recording {
            tab.start_learn_listeners(Arc::downgrade(&self.learn_recorder)).await?;
        }

        Ok(tab_id)
    }

    pub async fn close_tab(&self, tab_id: &str) -> Result<(), BrowserError> {
        let tab = {
            let mut state = self.state.lock().await;
            let tab = state.tabs.remove(tab_id).ok_or_else(|| BrowserError::tab_not_found(tab_id))?;
            if let Some(sid) = tab.session_id().await {
                if let Some(session) = state.sessions.get_mut(&sid) {
                    session.tab_ids.remove(tab_id);
                }
            }
            tab
        };

        tab.teardown().await;

        let mut recorder = self.learn_recorder.lock().await;
        if recorder.is_recording() {
            recorder.record_synthetic(tab_id, "tab.closed");
        }
        Ok(())
    }

    /// All live tabs, for learn-mode install/remove across the whole set
    /// (spec §3 invariant 6, §4.7).
    pub async fn all_tabs(&self) -> Vec<Arc<Tab>> {
        self.state.lock().await.tabs.values().cloned().collect()
    }

    pub async fn get_tab(&self, tab_id: &str) -> Result<Arc<Tab>, BrowserError> {
        self.state
            .lock()
            .await
            .tabs
            .get(tab_id)
            .cloned()
            .ok_or_else(|| BrowserError::tab_not_found(tab_id))
    }

    /// Snapshot ordered by ascending numeric suffix of `tabId` (spec §4.2).
    pub async fn list_tabs(&self, session_id: Option<&str>) -> Result<Vec<Value>, BrowserError> {
        let state = self.state.lock().await;
        let mut entries: Vec<(&String, &Arc<Tab>)> = state.tabs.iter().collect();
        entries.sort_by_key(|(id, _)| tab_suffix(id));

        let mut out = Vec::new();
        for (id, tab) in entries {
            if let Some(sid) = session_id {
                if tab.session_id().await.as_deref() != Some(sid) {
                    continue;
                }
            }
            let url = tab.get_url().await.unwrap_or_default();
            let title = tab.get_title().await.unwrap_or_default();
            out.push(json!({"tabId": id, "url": url, "title": title}));
        }
        Ok(out)
    }

    pub async fn create_session(&self, name: Option<String>, owner: Option<u64>) -> String {
        let session_id = format!("s{}", self.next_session_seq.fetch_add(1, Ordering::SeqCst));
        let session = Session::new(session_id.clone(), name, owner);
        self.state.lock().await.sessions.insert(session_id.clone(), session);
        session_id
    }

    /// Destroys every tab whose `sessionId` matches; `tab0` is never
    /// affected unless it was explicitly tagged into this session.
    pub async fn destroy_session(&self, session_id: &str) -> Result<Vec<String>, BrowserError> {
        let tab_ids: Vec<String> = {
            let mut state = self.state.lock().await;
            let session = state.sessions.remove(session_id).ok_or_else(|| BrowserError::session_not_found(session_id))?;
            session.tab_ids.into_iter().collect()
        };
        for tab_id in &tab_ids {
            self.close_tab(tab_id).await?;
        }
        Ok(tab_ids)
    }

    /// Called on connection disconnect to clean up its auto-session.
    pub async fn destroy_sessions_owned_by(&self, connection_id: u64) {
        let owned: Vec<String> = {
            let state = self.state.lock().await;
            state
                .sessions
                .values()
                .filter(|s| s.owner == Some(connection_id))
                .map(|s| s.id.clone())
                .collect()
        };
        for session_id in owned {
            let _ = self.destroy_session(&session_id).await;
        }
    }
}

fn tab_suffix(tab_id: &str) -> u64 {
    tab_id.trim_start_matches("tab").parse().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webview::host::{Cookie, NavigationEvent};
    use async_trait::async_trait;

    struct NoopHost {
        nav_tx: broadcast::Sender<NavigationEvent>,
        msg_tx: broadcast::Sender<Value>,
    }

    impl NoopHost {
        fn factory() -> HostFactory {
            Arc::new(|_tab_id: &str, _attrs: &TabAttributes| {
                let (nav_tx, _) = broadcast::channel(4);
                let (msg_tx, _) = broadcast::channel(4);
                Arc::new(NoopHost { nav_tx, msg_tx }) as Arc<dyn WebViewHost>
            })
        }
    }

    #[async_trait]
    impl WebViewHost for NoopHost {
        async fn load_url(&self, _url: &str) -> Result<(), BrowserError> {
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
            Ok(Value::Null)
        }
        async fn inject_script(&self, _script: &str) -> Result<(), BrowserError> {
            Ok(())
        }
        async fn screenshot(&self, _quality: u8, _width: u32) -> Result<Vec<u8>, BrowserError> {
            Ok(vec![])
        }
        async fn get_cookies(&self, _url: Option<&str>) -> Result<Vec<Cookie>, BrowserError> {
            Ok(vec![])
        }
        async fn set_cookie(&self, _cookie: Cookie) -> Result<(), BrowserError> {
            Ok(())
        }
        async fn current_title(&self) -> Result<String, BrowserError> {
            Ok(String::new())
        }
        async fn current_url(&self) -> Result<String, BrowserError> {
            Ok(String::new())
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

    async fn test_registry() -> Arc<Registry> {
        let (events_tx, _) = broadcast::channel(16);
        let learn_root = std::env::temp_dir().join("aslan-browser-test-registry-learn");
        Registry::bootstrap(NoopHost::factory(), 50, TabAttributes::new(800, 600, true), events_tx, learn_root).await
    }

    #[tokio::test]
    async fn bootstrap_creates_tab0() {
        let registry = test_registry().await;
        assert!(registry.get_tab("tab0").await.is_ok());
    }

    #[tokio::test]
    async fn create_tab_allocates_sequential_ids() {
        let registry = test_registry().await;
        let a = registry.create_tab(TabAttributes::new(800, 600, true), None).await.unwrap();
        let b = registry.create_tab(TabAttributes::new(800, 600, true), None).await.unwrap();
        assert_eq!(a, "tab1");
        assert_eq!(b, "tab2");
    }

    #[tokio::test]
    async fn create_tab_with_unknown_session_errors() {
        let registry = test_registry().await;
        let err = registry
            .create_tab(TabAttributes::new(800, 600, true), Some("s99"))
            .await
            .unwrap_err();
        assert_eq!(err.rpc_code(), -32004);
    }

    #[tokio::test]
    async fn destroy_session_closes_member_tabs_but_not_tab0() {
        let registry = test_registry().await;
        let session_id = registry.create_session(None, None).await;
        let tab_id = registry.create_tab(TabAttributes::new(800, 600, true), Some(&session_id)).await.unwrap();

        let closed = registry.destroy_session(&session_id).await.unwrap();
        assert_eq!(closed, vec![tab_id.clone()]);
        assert!(registry.get_tab(&tab_id).await.is_err());
        assert!(registry.get_tab("tab0").await.is_ok());
    }

    #[tokio::test]
    async fn list_tabs_orders_by_numeric_suffix() {
        let registry = test_registry().await;
        registry.create_tab(TabAttributes::new(800, 600, true), None).await.unwrap();
        registry.create_tab(TabAttributes::new(800, 600, true), None).await.unwrap();
        let listed = registry.list_tabs(None).await.unwrap();
        let ids: Vec<String> = listed.iter().map(|v| v["tabId"].as_str().unwrap().to_string()).collect();
        assert_eq!(ids, vec!["tab0", "tab1", "tab2"]);
    }

    #[tokio::test]
    async fn destroy_sessions_owned_by_cleans_up_on_disconnect() {
        let registry = test_registry().await;
        let session_id = registry.create_session(None, Some(42)).await;
        let tab_id = registry.create_tab(TabAttributes::new(800, 600, true), Some(&session_id)).await.unwrap();

        registry.destroy_sessions_owned_by(42).await;
        assert!(registry.get_tab(&tab_id).await.is_err());
    }
}
