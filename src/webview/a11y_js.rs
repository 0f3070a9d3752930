//! Accessibility extractor and interaction primitives (spec §4.6).
//!
//! Injected on demand by the evaluator rather than as a permanent user
//! script: `extractA11yTree()` is called per `getAccessibilityTree`
//! request, and the interaction helpers are called per `click`/`fill`/…
//! request, each as a one-shot `evaluate` body.

/// `extractA11yTree()`: flat, ref-stamped projection of the interactive
/// and structural DOM, plus the `resolveAgentTarget`/`click`/`fill`/
/// `select`/`keypress`/`scroll` primitives that the router's interaction
/// handlers evaluate against a resolved target string.
pub const A11Y_JS: &str = r#"
(function () {
    if (window.__agentA11y) { return; }

    var INTERACTIVE_SELECTOR = [
        'a[href]', 'button', 'input:not([type="hidden"])', 'select', 'textarea',
        '[role]', '[tabindex]'
    ].join(',');
    var LANDMARK_SELECTOR = 'nav,main,header,footer,aside,form,table,ul,ol,li';
    var HEADING_SELECTOR = 'h1,h2,h3,h4,h5,h6';

    var IMPLICIT_ROLES = {
        A: 'link', BUTTON: 'button', H1: 'heading', H2: 'heading', H3: 'heading',
        H4: 'heading', H5: 'heading', H6: 'heading', IMG: 'img', SELECT: 'combobox',
        TEXTAREA: 'textbox', NAV: 'navigation', MAIN: 'main', HEADER: 'banner',
        FOOTER: 'contentinfo', ASIDE: 'complementary', FORM: 'form', TABLE: 'table',
        UL: 'list', OL: 'list', LI: 'listitem'
    };
    var INPUT_TYPE_ROLES = {
        checkbox: 'checkbox', radio: 'radio', button: 'button', submit: 'button',
        reset: 'button'
    };

    function isVisible(el) {
        var style = window.getComputedStyle(el);
        if (style.display === 'none' || style.visibility === 'hidden') { return false; }
        if (el.getAttribute('aria-hidden') === 'true') { return false; }
        var rect = el.getBoundingClientRect();
        return rect.width > 0 && rect.height > 0;
    }

    function implicitRole(el) {
        if (el.tagName === 'INPUT') {
            var type = (el.getAttribute('type') || 'text').toLowerCase();
            return INPUT_TYPE_ROLES[type] || 'textbox';
        }
        return IMPLICIT_ROLES[el.tagName] || null;
    }

    function resolveRole(el) {
        var explicit = el.getAttribute('role');
        if (explicit) { return explicit; }
        return implicitRole(el) || 'generic';
    }

    function collapse(text) {
        return (text || '').replace(/\s+/g, ' ').trim();
    }

    function labelFor(el) {
        if (el.id) {
            var byFor = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
            if (byFor) { return collapse(byFor.textContent); }
        }
        var ancestor = el.closest('label');
        if (ancestor) { return collapse(ancestor.textContent); }
        return '';
    }

    function resolveName(el) {
        var ariaLabel = el.getAttribute('aria-label');
        if (ariaLabel && collapse(ariaLabel)) { return collapse(ariaLabel); }

        var labelledBy = el.getAttribute('aria-labelledby');
        if (labelledBy) {
            var joined = labelledBy.split(/\s+/).map(function (id) {
                var ref = document.getElementById(id);
                return ref ? collapse(ref.textContent) : '';
            }).join(' ').trim();
            if (joined) { return joined; }
        }

        var label = labelFor(el);
        if (label) { return label; }

        var placeholder = el.getAttribute('placeholder');
        if (placeholder && collapse(placeholder)) { return collapse(placeholder); }

        var title = el.getAttribute('title');
        if (title && collapse(title)) { return collapse(title); }

        var text = collapse(el.textContent);
        return text.length > 80 ? text.slice(0, 80) : text;
    }

    function elementValue(el) {
        if (el.tagName === 'INPUT' || el.tagName === 'TEXTAREA' || el.tagName === 'SELECT') {
            return el.value;
        }
        return undefined;
    }

    function rectOf(el) {
        var r = el.getBoundingClientRect();
        return { x: r.x, y: r.y, w: r.width, h: r.height };
    }

    window.__agentA11y = {
        extractA11yTree: function () {
            var selector = [INTERACTIVE_SELECTOR, LANDMARK_SELECTOR, HEADING_SELECTOR, 'img'].join(',');
            var nodes = Array.prototype.slice.call(document.querySelectorAll(selector));
            var out = [];
            var refIndex = 0;
            nodes.forEach(function (el) {
                if (!isVisible(el)) { return; }
                var ref = '@e' + refIndex;
                refIndex += 1;
                el.setAttribute('data-agent-ref', ref);
                var node = {
                    ref: ref,
                    role: resolveRole(el),
                    name: resolveName(el),
                    tag: el.tagName.toUpperCase(),
                    rect: rectOf(el),
                };
                var value = elementValue(el);
                if (value !== undefined) { node.value = value; }
                out.push(node);
            });
            return out;
        },

        resolveAgentTarget: function (target) {
            if (typeof target === 'string' && target.indexOf('@e') === 0) {
                return document.querySelector('[data-agent-ref="' + CSS.escape(target) + '"]');
            }
            return document.querySelector(target);
        },

        click: function (target) {
            var el = this.resolveAgentTarget(target);
            if (!el) { return { error: 'target not found: ' + target }; }
            el.focus();
            el.click();
            return { ok: true };
        },

        fill: function (target, value) {
            var el = this.resolveAgentTarget(target);
            if (!el) { return { error: 'target not found: ' + target }; }
            el.focus();
            el.value = value;
            el.dispatchEvent(new Event('input', { bubbles: true }));
            el.dispatchEvent(new Event('change', { bubbles: true }));
            return { ok: true };
        },

        select: function (target, value) {
            var el = this.resolveAgentTarget(target);
            if (!el) { return { error: 'target not found: ' + target }; }
            el.value = value;
            el.dispatchEvent(new Event('change', { bubbles: true }));
            return { ok: true };
        },

        keypress: function (key, modifiers) {
            modifiers = modifiers || {};
            var opts = {
                key: key,
                bubbles: true,
                altKey: !!modifiers.alt,
                ctrlKey: !!modifiers.ctrl,
                shiftKey: !!modifiers.shift,
                metaKey: !!modifiers.meta,
            };
            var target = document.activeElement || document.body;
            target.dispatchEvent(new KeyboardEvent('keydown', opts));
            target.dispatchEvent(new KeyboardEvent('keyup', opts));
            return { ok: true };
        },

        scroll: function (x, y, target) {
            if (target) {
                var el = this.resolveAgentTarget(target);
                if (!el) { return { error: 'target not found: ' + target }; }
                el.scrollIntoView({ block: 'center' });
                return { ok: true };
            }
            window.scrollTo(x || 0, y || 0);
            return { ok: true };
        },
    };
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defines_extractor_and_primitives() {
        for name in [
            "extractA11yTree",
            "resolveAgentTarget",
            "click:",
            "fill:",
            "select:",
            "keypress:",
            "scroll:",
        ] {
            assert!(A11Y_JS.contains(name), "missing {name}");
        }
    }

    #[test]
    fn is_idempotency_guarded() {
        assert!(A11Y_JS.contains("if (window.__agentA11y) { return; }"));
    }
}
