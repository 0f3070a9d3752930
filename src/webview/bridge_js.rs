//! The always-on injected page bridge (spec §4.5).
//!
//! Installed as a document-start initialization script in every main
//! frame. Idempotent: guarded by `window.__agent`. Maintains the network
//! and DOM-stability signals the readiness detector (§4.4) consumes, and
//! exposes `window.__agent.waitForSelector`.

/// `window.__agent` namespace: fetch/XHR monkey-patch for network-idle
/// tracking, a debounced MutationObserver for DOM-stability, and the
/// selector-wait helper. Posts `domStable` / `networkBusy` / `networkIdle`
/// messages to the host via `window.__agentPost`.
pub const BRIDGE_JS: &str = r#"
(function () {
    if (window.__agent) { return; }

    function post(type, payload) {
        try {
            if (window.__agentPost) {
                window.__agentPost(JSON.stringify(Object.assign({ type: type }, payload || {})));
            }
        } catch (e) { /* host channel not ready yet */ }
    }

    var agent = {
        pendingRequests: 0,
        domStableTimer: null,
        domStableDebounceMs: __DOM_STABLE_DEBOUNCE_MS__,
    };

    function onNetworkStart() {
        agent.pendingRequests += 1;
        if (agent.pendingRequests === 1) {
            post('networkBusy', {});
        }
    }

    function onNetworkEnd() {
        agent.pendingRequests = Math.max(0, agent.pendingRequests - 1);
        if (agent.pendingRequests === 0) {
            post('networkIdle', {});
        }
    }

    var originalFetch = window.fetch;
    if (originalFetch) {
        window.fetch = function () {
            onNetworkStart();
            var p = originalFetch.apply(this, arguments);
            return p.then(
                function (r) { onNetworkEnd(); return r; },
                function (e) { onNetworkEnd(); throw e; }
            );
        };
    }

    var OriginalOpen = XMLHttpRequest.prototype.open;
    var OriginalSend = XMLHttpRequest.prototype.send;
    XMLHttpRequest.prototype.open = function () {
        this.__agentTracked = true;
        return OriginalOpen.apply(this, arguments);
    };
    XMLHttpRequest.prototype.send = function () {
        if (this.__agentTracked) {
            onNetworkStart();
            var done = false;
            var finish = function () {
                if (!done) { done = true; onNetworkEnd(); }
            };
            this.addEventListener('loadend', finish);
        }
        return OriginalSend.apply(this, arguments);
    };

    function scheduleDomStable() {
        if (agent.domStableTimer) { clearTimeout(agent.domStableTimer); }
        agent.domStableTimer = setTimeout(function () {
            post('domStable', {});
        }, agent.domStableDebounceMs);
    }

    function installObserver() {
        if (!document.body) {
            document.addEventListener('DOMContentLoaded', installObserver, { once: true });
            return;
        }
        var observer = new MutationObserver(function () { scheduleDomStable(); });
        observer.observe(document.body, { childList: true, subtree: true, attributes: true });
        scheduleDomStable();
    }
    installObserver();

    agent.waitForSelector = function (selector, timeoutMs) {
        return new Promise(function (resolve, reject) {
            var existing = document.querySelector(selector);
            if (existing) { resolve(true); return; }

            var timer = setTimeout(function () {
                obs.disconnect();
                reject(new Error('timed out waiting for selector: ' + selector));
            }, timeoutMs);

            var obs = new MutationObserver(function () {
                var el = document.querySelector(selector);
                if (el) {
                    clearTimeout(timer);
                    obs.disconnect();
                    resolve(true);
                }
            });
            obs.observe(document.documentElement, { childList: true, subtree: true, attributes: true });
        });
    };

    window.__agent = agent;
})();
"#;

/// Substitute the configured DOM-stability debounce window into the bridge
/// script before injection.
pub fn render(dom_stable_debounce_ms: u64) -> String {
    BRIDGE_JS.replace("__DOM_STABLE_DEBOUNCE_MS__", &dom_stable_debounce_ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_debounce_window() {
        let js = render(750);
        assert!(js.contains("750"));
        assert!(!js.contains("__DOM_STABLE_DEBOUNCE_MS__"));
    }

    #[test]
    fn bridge_is_idempotency_guarded() {
        assert!(BRIDGE_JS.contains("if (window.__agent) { return; }"));
    }
}
