//! `session.create`/`session.destroy` (spec §4.2/§6.2).
//!
//! Every session created over RPC is owned by the creating connection, so
//! it is auto-destroyed on disconnect along with its tabs (spec §3
//! Connection entity, "destroy_sessions_owned_by").

use serde_json::{json, Value};

use crate::error::BrowserError;
use crate::router::dispatch::Context;
use crate::router::handlers::{optional_str, require_str};

pub async fn create(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let name = optional_str(&params, "name").map(str::to_string);
    let session_id = ctx.registry.create_session(name, Some(ctx.connection_id)).await;
    Ok(json!({"sessionId": session_id}))
}

pub async fn destroy(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let session_id = require_str(&params, "sessionId")?;
    let closed_tabs = ctx.registry.destroy_session(session_id).await?;
    Ok(json!({"ok": true, "closedTabs": closed_tabs}))
}
