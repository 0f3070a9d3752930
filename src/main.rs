//! Process entry point. This binary *is* the native app (spec §2): it
//! hosts the Tauri event loop on the main thread and spawns the
//! JSON-RPC socket server as a background tokio task from inside
//! `.setup()`, the same split the platform bridge module documents for
//! `evaluate`/`screenshot` (main-thread WebKit, background async I/O).

use std::sync::Arc;

use tauri::Manager;
use tokio::sync::broadcast;
use tracing::{error, info};

use aslan_browser_lib::chrome::window_chrome;
use aslan_browser_lib::config;
use aslan_browser_lib::registry::{HostFactory, Registry};
use aslan_browser_lib::services::{logging, platform};
use aslan_browser_lib::transport::{Server, NOTIFICATION_CHANNEL_CAPACITY};
use aslan_browser_lib::webview::attributes::TabAttributes;
use aslan_browser_lib::webview::host::WebViewHost;
use aslan_browser_lib::webview::macos::{self, AgentPostRegistry};

fn main() {
    let config = config::load();
    let _log_guard = logging::init(&config);

    let agent_posts = AgentPostRegistry::default();
    let socket_path = config.transport.socket_path.clone();
    let socket_path_for_shutdown = socket_path.clone();
    let default_attrs = TabAttributes::new(config.tabs.width, config.tabs.height, false);
    let dom_stable_debounce_ms = config.tabs.dom_stable_debounce_ms;
    let learn_root = config
        .learn
        .output_dir
        .clone()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(platform::get_learn_root);

    tauri::Builder::default()
        .manage(agent_posts.clone())
        .invoke_handler(tauri::generate_handler![macos::agent_post, window_chrome::learn_annotate])
        .setup(move |app| {
            let app_handle = app.handle().clone();
            let manage_handle = app.handle().clone();
            let agent_posts = agent_posts.clone();

            let host_factory: HostFactory = Arc::new(move |tab_id: &str, attrs: &TabAttributes| {
                macos::MacosWebViewHost::create(&app_handle, tab_id, attrs, &agent_posts)
                    .expect("failed to create tab window") as Arc<dyn WebViewHost>
            });

            let (events_tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
            let default_attrs = default_attrs.clone();
            let socket_path = socket_path.clone();
            let learn_root = learn_root.clone();

            tauri::async_runtime::spawn(async move {
                let registry =
                    Registry::bootstrap(host_factory, dom_stable_debounce_ms, default_attrs, events_tx, learn_root)
                        .await;
                manage_handle.manage(registry.clone());

                let server = match Server::bind(&socket_path, registry) {
                    Ok(server) => server,
                    Err(e) => {
                        error!(path = %socket_path, error = %e, "failed to bind socket");
                        return;
                    }
                };

                info!(path = %socket_path, "aslan-browser ready");
                server.serve().await;
            });

            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error building aslan-browser")
        .run(move |_app_handle, event| {
            if let tauri::RunEvent::ExitRequested { .. } = event {
                let _ = std::fs::remove_file(&socket_path_for_shutdown);
            }
        });
}
