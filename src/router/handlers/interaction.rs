//! `click`/`fill`/`select`/`keypress`/`scroll` (spec §4.6/§6.2).
//!
//! `selector` accepts either a CSS selector or an accessibility ref
//! (`@eN`); the façade resolves the distinction.

use serde_json::{json, Value};

use crate::error::BrowserError;
use crate::router::dispatch::Context;
use crate::router::handlers::{optional_f64, optional_str, require_str, tab_id};

fn ok_or_js_error(result: Value) -> Result<Value, BrowserError> {
    if let Some(message) = result.get("error").and_then(Value::as_str) {
        return Err(BrowserError::JavaScript(message.to_string()));
    }
    Ok(json!({"ok": true}))
}

pub async fn click(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let selector = require_str(&params, "selector")?;
    ok_or_js_error(tab.click(selector).await?)
}

pub async fn fill(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let selector = require_str(&params, "selector")?;
    let value = require_str(&params, "value")?;
    ok_or_js_error(tab.fill(selector, value).await?)
}

pub async fn select(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let selector = require_str(&params, "selector")?;
    let value = require_str(&params, "value")?;
    ok_or_js_error(tab.select(selector, value).await?)
}

pub async fn keypress(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let key = require_str(&params, "key")?;
    let modifiers = params.get("modifiers").cloned().unwrap_or_else(|| json!({}));
    ok_or_js_error(tab.keypress(key, modifiers).await?)
}

pub async fn scroll(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let x = optional_f64(&params, "x");
    let y = optional_f64(&params, "y");
    let selector = optional_str(&params, "selector");
    ok_or_js_error(tab.scroll(x, y, selector).await?)
}
