//! `learn.start`/`learn.stop`/`learn.status`/`learn.note` (spec §4.7/§6.2).

use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::BrowserError;
use crate::router::dispatch::Context;
use crate::router::handlers::require_str;

pub async fn start(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let name = require_str(&params, "name")?;
    {
        let mut recorder = ctx.registry.learn_recorder.lock().await;
        recorder.start(name, &ctx.registry.learn_root).await?;
    }

    for tab in ctx.registry.all_tabs().await {
        tab.start_learn_listeners(Arc::downgrade(&ctx.registry.learn_recorder)).await?;
    }

    Ok(json!({"ok": true}))
}

pub async fn stop(ctx: Context, _params: Value) -> Result<Value, BrowserError> {
    let log = {
        let mut recorder = ctx.registry.learn_recorder.lock().await;
        recorder.stop()?
    };

    for tab in ctx.registry.all_tabs().await {
        tab.stop_learn_listeners().await;
    }

    Ok(log)
}

pub async fn status(ctx: Context, _params: Value) -> Result<Value, BrowserError> {
    Ok(ctx.registry.learn_recorder.lock().await.status())
}

pub async fn note(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let text = require_str(&params, "text")?;
    let tab_id = params.get("tabId").and_then(Value::as_str).unwrap_or("tab0");
    ctx.registry.learn_recorder.lock().await.record_annotation(tab_id, text)?;
    Ok(json!({"ok": true}))
}

/// Shared by the `learn.note` RPC and the chrome window's "Note" button
/// (spec §4.3 window chrome), so a manually triggered annotation goes
/// through the same recorder call as an agent-driven one.
pub async fn annotate(registry: &crate::registry::Registry, tab_id: &str, text: &str) -> Result<(), BrowserError> {
    registry.learn_recorder.lock().await.record_annotation(tab_id, text)
}
