//! `navigate`, `goBack`/`goForward`/`reload`, `waitForSelector`,
//! `getTitle`/`getURL` (spec §6.2).

use std::time::Duration;

use serde_json::{json, Value};

use crate::error::BrowserError;
use crate::router::dispatch::Context;
use crate::router::handlers::{optional_str, optional_u64, require_str, tab_id};
use crate::webview::attributes::WaitUntil;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

fn timeout_from(params: &Value) -> Duration {
    Duration::from_millis(optional_u64(params, "timeout").unwrap_or(DEFAULT_TIMEOUT_MS))
}

fn wait_until_from(params: &Value) -> WaitUntil {
    match optional_str(params, "waitUntil") {
        Some("none") => WaitUntil::None,
        Some("load") => WaitUntil::Load,
        _ => WaitUntil::Idle,
    }
}

pub async fn navigate(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let url = require_str(&params, "url")?;
    let (url, title) = tab.navigate(url, wait_until_from(&params), timeout_from(&params)).await?;
    Ok(json!({"url": url, "title": title}))
}

pub async fn go_back(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let (url, title) = tab.go_back(timeout_from(&params)).await?;
    Ok(json!({"url": url, "title": title}))
}

pub async fn go_forward(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let (url, title) = tab.go_forward(timeout_from(&params)).await?;
    Ok(json!({"url": url, "title": title}))
}

pub async fn reload(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let (url, title) = tab.reload(timeout_from(&params)).await?;
    Ok(json!({"url": url, "title": title}))
}

pub async fn wait_for_selector(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let selector = require_str(&params, "selector")?;
    tab.wait_for_selector(selector, timeout_from(&params)).await?;
    Ok(json!({"found": true}))
}

pub async fn get_title(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    Ok(json!({"title": tab.get_title().await?}))
}

pub async fn get_url(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    Ok(json!({"url": tab.get_url().await?}))
}

pub async fn set_viewport(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let width = optional_u64(&params, "width").ok_or_else(|| BrowserError::invalid_params("missing required field: width"))? as u32;
    let height = optional_u64(&params, "height").ok_or_else(|| BrowserError::invalid_params("missing required field: height"))? as u32;
    tab.set_viewport(width, height);
    Ok(json!({"ok": true}))
}
