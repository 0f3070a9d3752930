//! `tab.create`/`tab.close`/`tab.list` (spec §4.2/§6.2).

use serde_json::{json, Value};

use crate::error::BrowserError;
use crate::router::dispatch::Context;
use crate::router::handlers::{optional_str, optional_u64, tab_id};
use crate::webview::attributes::TabAttributes;

pub async fn create(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let width = optional_u64(&params, "width").map(|v| v as u32).unwrap_or(ctx.registry.default_width);
    let height = optional_u64(&params, "height").map(|v| v as u32).unwrap_or(ctx.registry.default_height);
    let hidden = params.get("hidden").and_then(Value::as_bool).unwrap_or(false);
    let session_id = optional_str(&params, "sessionId");
    let user_agent = optional_str(&params, "userAgent").map(str::to_string);

    let attrs = TabAttributes::new(width, height, hidden).with_user_agent(user_agent);
    let tab_id = ctx.registry.create_tab(attrs, session_id).await?;

    if let Some(url) = optional_str(&params, "url") {
        let tab = ctx.registry.get_tab(&tab_id).await?;
        tab.navigate(url, crate::webview::attributes::WaitUntil::None, std::time::Duration::from_secs(30))
            .await?;
    }

    Ok(json!({"tabId": tab_id}))
}

pub async fn close(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    ctx.registry.close_tab(tab_id(&params)?).await?;
    Ok(json!({"ok": true}))
}

pub async fn list(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let session_id = optional_str(&params, "sessionId");
    let tabs = ctx.registry.list_tabs(session_id).await?;
    Ok(json!({"tabs": tabs}))
}
