//! `screenshot` (spec §3 invariant 7, §6.2): JPEG bytes, base64-inline.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use crate::error::BrowserError;
use crate::router::dispatch::Context;
use crate::router::handlers::{optional_u64, tab_id};

const DEFAULT_QUALITY: u64 = 80;
const DEFAULT_WIDTH: u64 = 1280;

pub async fn screenshot(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let quality = optional_u64(&params, "quality").unwrap_or(DEFAULT_QUALITY).min(100) as u8;
    let width = optional_u64(&params, "width").unwrap_or(DEFAULT_WIDTH) as u32;
    let bytes = tab.screenshot(quality, width).await?;
    Ok(json!({"data": BASE64.encode(bytes)}))
}
