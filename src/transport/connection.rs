//! Per-connection task (spec §4.1): owns one socket, multiplexes request
//! dispatch with server-originated notification delivery over the same
//! writer, and tears down the connection's auto-session on close.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::protocol::codec::{parse_line, read_line, write_line};
use crate::protocol::message::{error_response, success_response, RpcRequest};
use crate::registry::Registry;
use crate::router::{Context, Dispatcher};

type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

pub async fn handle(
    connection_id: u64,
    stream: UnixStream,
    registry: Arc<Registry>,
    dispatcher: Arc<Dispatcher>,
    mut events_rx: broadcast::Receiver<Value>,
) {
    let (read_half, write_half): (OwnedReadHalf, OwnedWriteHalf) = stream.into_split();
    let writer: SharedWriter = Arc::new(Mutex::new(write_half));

    let notify_writer = writer.clone();
    let notify_task = tokio::spawn(async move {
        loop {
            match events_rx.recv().await {
                Ok(notification) => {
                    let mut w = notify_writer.lock().await;
                    if write_line(&mut *w, &notification).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(connection_id, skipped = n, "notification channel lagged");
                }
            }
        }
    });

    read_loop(connection_id, read_half, writer, registry.clone(), dispatcher).await;

    notify_task.abort();
    registry.destroy_sessions_owned_by(connection_id).await;
    debug!(connection_id, "connection closed");
}

async fn read_loop(
    connection_id: u64,
    read_half: OwnedReadHalf,
    writer: SharedWriter,
    registry: Arc<Registry>,
    dispatcher: Arc<Dispatcher>,
) {
    let mut reader = BufReader::new(read_half);

    loop {
        let line = match read_line(&mut reader).await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(connection_id, error = %e, "connection read error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let writer = writer.clone();
        let registry = registry.clone();
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            handle_line(connection_id, &line, writer, registry, dispatcher).await;
        });
    }
}

async fn handle_line(connection_id: u64, line: &str, writer: SharedWriter, registry: Arc<Registry>, dispatcher: Arc<Dispatcher>) {
    let parsed = match parse_line(line) {
        Ok(v) => v,
        Err(e) => {
            let err = crate::error::BrowserError::Parse(e.to_string());
            send(&writer, error_response(None, &err, None)).await;
            return;
        }
    };

    let request: RpcRequest = match serde_json::from_value(parsed) {
        Ok(r) => r,
        Err(e) => {
            let err = crate::error::BrowserError::Envelope(e.to_string());
            send(&writer, error_response(None, &err, None)).await;
            return;
        }
    };

    let method = match request.validate() {
        Ok(m) => m.to_string(),
        Err(err) => {
            send(&writer, error_response(request.id, &err, None)).await;
            return;
        }
    };

    let ctx = Context { registry, connection_id, dispatcher: dispatcher.clone() };
    let result = dispatcher.call(&method, ctx, request.params).await;

    if let Some(id) = request.id {
        let response = match result {
            Ok(value) => success_response(id, value),
            Err(err) => error_response(Some(id), &err, None),
        };
        send(&writer, response).await;
    } else if let Err(err) = result {
        debug!(connection_id, method = %method, error = %err, "notification handler failed");
    }
}

async fn send<W>(writer: &Arc<Mutex<W>>, value: Value)
where
    W: AsyncWrite + Unpin,
{
    let mut w = writer.lock().await;
    if write_line(&mut *w, &value).await.is_err() {
        let _ = w.shutdown().await;
    }
}
