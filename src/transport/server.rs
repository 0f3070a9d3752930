//! Unix-socket JSON-RPC server (spec §4.1/§6.1): accepts connections,
//! allocates connection ids, and hands each stream off to its own task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::net::UnixListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::registry::Registry;
use crate::router::Dispatcher;
use crate::transport::connection;

pub struct Server {
    listener: UnixListener,
    socket_path: std::path::PathBuf,
    registry: Arc<Registry>,
    dispatcher: Arc<Dispatcher>,
    events_tx: broadcast::Sender<Value>,
    next_connection_id: AtomicU64,
}

impl Server {
    /// Binds the listener at `socket_path`, removing a stale socket file
    /// left behind by a previous, uncleanly-terminated process (spec §6.1).
    pub fn bind(socket_path: impl Into<std::path::PathBuf>, registry: Arc<Registry>) -> std::io::Result<Self> {
        let socket_path = socket_path.into();
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)?;
        }
        let listener = UnixListener::bind(&socket_path)?;
        let events_tx = registry.events();
        Ok(Self {
            listener,
            socket_path,
            registry,
            dispatcher: Arc::new(Dispatcher::new()),
            events_tx,
            next_connection_id: AtomicU64::new(0),
        })
    }

    pub async fn serve(&self) {
        info!(path = %self.socket_path.display(), "listening");
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    let connection_id = self.next_connection_id.fetch_add(1, Ordering::SeqCst);
                    let registry = self.registry.clone();
                    let dispatcher = self.dispatcher.clone();
                    let events_rx = self.events_tx.subscribe();
                    tokio::spawn(async move {
                        connection::handle(connection_id, stream, registry, dispatcher, events_rx).await;
                    });
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                }
            }
        }
    }

    /// Unlink the socket path. Called on shutdown (spec §4.1 connection
    /// lifecycle: "close the listener and unlink the socket path").
    pub fn unlink(&self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Broadcast channel capacity for `event.*` notifications (spec §4.1). A
/// slow client that falls this far behind drops messages and gets a
/// lag warning rather than blocking the server.
pub const NOTIFICATION_CHANNEL_CAPACITY: usize = 256;
