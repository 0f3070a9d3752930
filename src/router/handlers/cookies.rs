//! `getCookies`/`setCookie` (spec §4.3/§6.2).

use serde_json::{json, Value};

use crate::error::BrowserError;
use crate::router::dispatch::Context;
use crate::router::handlers::{optional_str, tab_id};

pub async fn get_cookies(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let url = optional_str(&params, "url");
    let cookies = tab.get_cookies(url).await?;
    Ok(json!({"cookies": cookies}))
}

pub async fn set_cookie(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let cookie = params
        .get("cookie")
        .cloned()
        .ok_or_else(|| BrowserError::invalid_params("missing required field: cookie"))?;
    tab.set_cookie(cookie).await?;
    Ok(json!({"ok": true}))
}
