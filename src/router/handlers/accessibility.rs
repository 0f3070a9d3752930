//! `getAccessibilityTree` (spec §4.6/§6.2).

use serde_json::{json, Value};

use crate::error::BrowserError;
use crate::router::dispatch::Context;
use crate::router::handlers::tab_id;

pub async fn get_accessibility_tree(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let tab = ctx.registry.get_tab(tab_id(&params)?).await?;
    let tree = tab.get_accessibility_tree().await?;
    Ok(json!({"tree": tree}))
}
