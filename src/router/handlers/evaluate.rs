//! `evaluate` (spec §4.3/§6.2).

use serde_json::{json, Value};

use crate::error::BrowserError;
use crate::router::dispatch::Context;
use crate::router::handlers::{require_str, tab_id};

pub async fn evaluate(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let script = require_str(&params, "script")?;
    let args = params.get("args").cloned().unwrap_or_else(|| json!({}));
    let value = tab.evaluate(script, args).await?;
    Ok(json!({"value": value}))
}

/// Debug/CLI `dump`-style helper (spec §4.3 supplement): not part of the
/// agent's steady-state loop, but cheap since the evaluator already exists.
pub async fn get_dom_html(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let html = tab.evaluate("return document.documentElement.outerHTML;", json!({})).await?;
    Ok(json!({"html": html}))
}
