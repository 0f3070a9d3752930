//! `batch` (spec §4.8): each sub-request runs concurrently as an
//! independent task; per-tab serialization still applies inside each
//! sub-request's own handler. Nested batches are rejected.

use serde_json::{json, Value};

use crate::error::BrowserError;
use crate::router::dispatch::Context;

struct SubRequest {
    method: String,
    params: Value,
}

fn parse_sub_requests(params: &Value) -> Result<Vec<SubRequest>, BrowserError> {
    let requests = params
        .get("requests")
        .and_then(Value::as_array)
        .ok_or_else(|| BrowserError::invalid_params("missing required field: requests"))?;

    requests
        .iter()
        .map(|r| {
            let method = r
                .get("method")
                .and_then(Value::as_str)
                .ok_or_else(|| BrowserError::invalid_params("batch sub-request missing method"))?
                .to_string();
            if method == "batch" {
                return Err(BrowserError::Envelope("nested batch is not allowed".into()));
            }
            let params = r.get("params").cloned().unwrap_or_else(|| json!({}));
            Ok(SubRequest { method, params })
        })
        .collect()
}

pub async fn batch(ctx: Context, params: Value) -> Result<Value, BrowserError> {
    let sub_requests = parse_sub_requests(&params)?;

    let tasks: Vec<_> = sub_requests
        .into_iter()
        .map(|req| {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.dispatcher.call(&req.method, ctx.clone(), req.params).await })
        })
        .collect();

    let mut responses = Vec::with_capacity(tasks.len());
    for task in tasks {
        let response = match task.await {
            Ok(Ok(result)) => json!({"result": result}),
            Ok(Err(err)) => json!({"error": {"code": err.rpc_code(), "message": err.message()}}),
            Err(join_err) => json!({"error": {"code": -32603, "message": join_err.to_string()}}),
        };
        responses.push(response);
    }

    Ok(json!({"responses": responses}))
}
