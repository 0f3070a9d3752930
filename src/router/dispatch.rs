//! Method → handler table (spec §4.8): built once at startup, then used
//! read-only for the life of the process.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::error::BrowserError;
use crate::registry::Registry;
use crate::router::handlers;

/// Per-call context: the registry and the id of the connection that made
/// the request (needed only by `session.create`/auto-session bookkeeping).
#[derive(Clone)]
pub struct Context {
    pub registry: Arc<Registry>,
    pub connection_id: u64,
    pub dispatcher: Arc<Dispatcher>,
}

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, BrowserError>> + Send>>;
type Handler = Box<dyn Fn(Context, Value) -> HandlerFuture + Send + Sync>;

pub struct Dispatcher {
    table: HashMap<&'static str, Handler>,
}

macro_rules! entry {
    ($map:expr, $name:expr, $func:path) => {
        $map.insert($name, Box::new(|ctx: Context, params: Value| Box::pin($func(ctx, params)) as HandlerFuture) as Handler);
    };
}

impl Dispatcher {
    pub fn new() -> Self {
        let mut table: HashMap<&'static str, Handler> = HashMap::new();

        entry!(table, "navigate", handlers::navigation::navigate);
        entry!(table, "goBack", handlers::navigation::go_back);
        entry!(table, "goForward", handlers::navigation::go_forward);
        entry!(table, "reload", handlers::navigation::reload);
        entry!(table, "waitForSelector", handlers::navigation::wait_for_selector);
        entry!(table, "getTitle", handlers::navigation::get_title);
        entry!(table, "getURL", handlers::navigation::get_url);
        entry!(table, "setViewport", handlers::navigation::set_viewport);

        entry!(table, "evaluate", handlers::evaluate::evaluate);
        entry!(table, "getDomHtml", handlers::evaluate::get_dom_html);
        entry!(table, "screenshot", handlers::screenshot::screenshot);
        entry!(table, "getAccessibilityTree", handlers::accessibility::get_accessibility_tree);

        entry!(table, "click", handlers::interaction::click);
        entry!(table, "fill", handlers::interaction::fill);
        entry!(table, "select", handlers::interaction::select);
        entry!(table, "keypress", handlers::interaction::keypress);
        entry!(table, "scroll", handlers::interaction::scroll);

        entry!(table, "getCookies", handlers::cookies::get_cookies);
        entry!(table, "setCookie", handlers::cookies::set_cookie);

        entry!(table, "tab.create", handlers::tabs::create);
        entry!(table, "tab.close", handlers::tabs::close);
        entry!(table, "tab.list", handlers::tabs::list);

        entry!(table, "session.create", handlers::sessions::create);
        entry!(table, "session.destroy", handlers::sessions::destroy);

        entry!(table, "learn.start", handlers::learn::start);
        entry!(table, "learn.stop", handlers::learn::stop);
        entry!(table, "learn.status", handlers::learn::status);
        entry!(table, "learn.note", handlers::learn::note);

        Self { table }
    }

    pub fn contains(&self, method: &str) -> bool {
        method == "batch" || self.table.contains_key(method)
    }

    /// Dispatches a single (non-batch) method. `batch` is handled by the
    /// caller since it needs access to this table for its sub-requests.
    pub async fn call(&self, method: &str, ctx: Context, params: Value) -> Result<Value, BrowserError> {
        if method == "batch" {
            return handlers::batch::batch(ctx, params).await;
        }
        match self.table.get(method) {
            Some(handler) => handler(ctx, params).await,
            None => Err(BrowserError::MethodNotFound(format!("unknown method: {method}"))),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
