//! Learn-mode listener JS (spec §4.7), injected on-demand by the evaluator
//! while a recording is active and re-injected after every navigation.

/// Passive capture-phase listeners for click/input/keydown/scroll that
/// build a target descriptor including `composedPath()` so actions can be
/// replayed across shadow-DOM boundaries, and post them to the host as
/// `learn.action` messages.
pub const LEARN_JS: &str = r#"
(function () {
    if (window.__agentLearn) { return; }

    var TARGET_ATTRS = [
        'id', 'class', 'name', 'type', 'role', 'aria-label', 'data-testid',
        'placeholder', 'href', 'src', 'action', 'value', 'contenteditable'
    ];
    var KEYDOWN_KEYS = ['Enter', 'Tab', 'Escape', 'Backspace', 'Delete'];

    function collapse(text) {
        var t = (text || '').replace(/\s+/g, ' ').trim();
        return t.length > 80 ? t.slice(0, 80) : t;
    }

    function composedPathDescriptor(event) {
        var path = typeof event.composedPath === 'function' ? event.composedPath() : [];
        return path.filter(function (node) {
            return node && node.nodeType === 1;
        }).map(function (node) {
            var root = node.getRootNode();
            var prefix = (root instanceof ShadowRoot) ? '#shadow-root > ' : '';
            var tag = node.tagName ? node.tagName.toLowerCase() : 'node';
            var id = node.id ? '#' + node.id : '';
            var cls = node.className && typeof node.className === 'string'
                ? '.' + node.className.trim().split(/\s+/).join('.')
                : '';
            return prefix + tag + id + cls;
        });
    }

    function describeTarget(event, el) {
        var attributes = {};
        TARGET_ATTRS.forEach(function (name) {
            if (el.hasAttribute && el.hasAttribute(name)) {
                attributes[name] = el.getAttribute(name);
            }
        });
        var rect = el.getBoundingClientRect ? el.getBoundingClientRect() : { x: 0, y: 0, width: 0, height: 0 };
        return {
            tagName: el.tagName ? el.tagName.toLowerCase() : '',
            textContent: collapse(el.textContent),
            attributes: attributes,
            rect: { x: rect.x, y: rect.y, w: rect.width, h: rect.height },
            composedPath: composedPathDescriptor(event),
        };
    }

    function post(action) {
        try {
            if (window.__agentPost) {
                window.__agentPost(JSON.stringify({ type: 'learn.action', action: action }));
            }
        } catch (e) { /* host channel not ready yet */ }
    }

    document.addEventListener('click', function (event) {
        var target = event.target;
        if (!target) { return; }
        post({
            type: 'click',
            target: describeTarget(event, target),
            clientX: event.clientX,
            clientY: event.clientY,
            button: event.button,
        });
    }, { capture: true, passive: true });

    var inputTimer = null;
    document.addEventListener('input', function (event) {
        var target = event.target;
        if (!target) { return; }
        var descriptor = describeTarget(event, target);
        var value = target.isContentEditable ? target.textContent : target.value;
        if (inputTimer) { clearTimeout(inputTimer); }
        inputTimer = setTimeout(function () {
            post({ type: 'input', target: descriptor, value: value });
        }, 300);
    }, { capture: true, passive: true });

    document.addEventListener('keydown', function (event) {
        var modifierHeld = event.altKey || event.ctrlKey || event.shiftKey || event.metaKey;
        if (KEYDOWN_KEYS.indexOf(event.key) === -1 && !modifierHeld) { return; }
        var target = event.target || document.body;
        post({
            type: 'keydown',
            target: describeTarget(event, target),
            value: event.key,
        });
    }, { capture: true, passive: true });

    var scrollTimer = null;
    document.addEventListener('scroll', function (event) {
        if (scrollTimer) { clearTimeout(scrollTimer); }
        scrollTimer = setTimeout(function () {
            post({
                type: 'scroll',
                target: describeTarget(event, document.scrollingElement || document.body),
                scrollX: window.scrollX,
                scrollY: window.scrollY,
            });
        }, 500);
    }, { capture: true, passive: true });

    window.__agentLearn = true;
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_idempotency_guarded() {
        assert!(LEARN_JS.contains("if (window.__agentLearn) { return; }"));
    }

    #[test]
    fn listeners_are_passive_capture() {
        let passive_count = LEARN_JS.matches("passive: true").count();
        assert_eq!(passive_count, 4);
    }

    #[test]
    fn captures_composed_path() {
        assert!(LEARN_JS.contains("composedPath"));
        assert!(LEARN_JS.contains("#shadow-root > "));
    }
}
