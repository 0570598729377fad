//! DOM scripts shared by the browser hosts.
//!
//! Every script is self-contained (nothing is injected ahead of time, so a
//! navigation cannot leave a host without its helpers) and answers with a
//! [`DomReply`] envelope.

use crate::host::HostError;
use serde::Deserialize;
use serde_json::{Value, json};

const PRELUDE: &str = r#"
const __resolveAll = (selector) => {
    const s = selector.trim();
    if (s.startsWith('/') || s.startsWith('(')) {
        const snapshot = document.evaluate(s, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
        const out = [];
        for (let i = 0; i < snapshot.snapshotLength; i++) out.push(snapshot.snapshotItem(i));
        return out;
    }
    return Array.from(document.querySelectorAll(s));
};
const __isVisible = (el) => {
    if (!el.isConnected) return false;
    const style = window.getComputedStyle(el);
    if (style.visibility === 'hidden' || style.display === 'none') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
};
const __fail = (code, message) => ({ ok: false, code, message });
const __actionable = (el) => {
    if (!__isVisible(el)) return __fail('ELEMENT_NOT_VISIBLE', 'element is not visible');
    if (el.disabled) return __fail('ELEMENT_NOT_INTERACTABLE', 'element is disabled');
    el.scrollIntoView({ block: 'center', inline: 'center' });
    const rect = el.getBoundingClientRect();
    const hit = document.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2);
    if (hit && hit !== el && !el.contains(hit)) {
        return __fail('ELEMENT_NOT_INTERACTABLE', 'obscured by <' + hit.tagName.toLowerCase() + '>');
    }
    return null;
};
const __setNativeValue = (el, value) => {
    const proto = Object.getPrototypeOf(el);
    const descriptor = Object.getOwnPropertyDescriptor(proto, 'value');
    if (descriptor && descriptor.set) descriptor.set.call(el, value); else el.value = value;
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
};
"#;

const VISIBLE: &str = r#"
const [sel] = args;
const els = __resolveAll(sel);
return { ok: true, value: els.length > 0 && __isVisible(els[0]) };
"#;

const TEXT_CONTENT: &str = r#"
const [sel] = args;
const el = __resolveAll(sel)[0];
if (!el) return __fail('ELEMENT_NOT_FOUND', sel);
return { ok: true, value: el.textContent };
"#;

const ALL_TEXT_CONTENTS: &str = r#"
const [sel] = args;
return { ok: true, value: __resolveAll(sel).map((el) => el.textContent ?? '') };
"#;

const CLICK: &str = r#"
const [sel, force] = args;
const el = __resolveAll(sel)[0];
if (!el) return __fail('ELEMENT_NOT_FOUND', sel);
if (!force) {
    const blocked = __actionable(el);
    if (blocked) return blocked;
}
el.click();
return { ok: true, value: null };
"#;

const FILL: &str = r#"
const [sel, value, force] = args;
const el = __resolveAll(sel)[0];
if (!el) return __fail('ELEMENT_NOT_FOUND', sel);
if (!force) {
    const blocked = __actionable(el);
    if (blocked) return blocked;
    if (el.readOnly) return __fail('ELEMENT_NOT_INTERACTABLE', 'element is read-only');
}
el.focus();
__setNativeValue(el, value);
return { ok: true, value: null };
"#;

const SELECT_OPTION: &str = r#"
const [sel, value] = args;
const el = __resolveAll(sel)[0];
if (!el) return __fail('ELEMENT_NOT_FOUND', sel);
if (!(el instanceof HTMLSelectElement)) return __fail('ELEMENT_NOT_INTERACTABLE', 'not a <select> element');
if (!Array.from(el.options).some((o) => o.value === value)) return __fail('OPTION_NOT_FOUND', value);
__setNativeValue(el, value);
return { ok: true, value: null };
"#;

const READY_STATE: &str = r#"
return { ok: true, value: document.readyState };
"#;

/// A DOM operation with its JSON arguments.
#[derive(Debug, Clone)]
pub struct DomScript {
    body: &'static str,
    args: Vec<Value>,
}

impl DomScript {
    pub fn visible(selector: &str) -> Self {
        Self::new(VISIBLE, vec![json!(selector)])
    }

    pub fn text_content(selector: &str) -> Self {
        Self::new(TEXT_CONTENT, vec![json!(selector)])
    }

    pub fn all_text_contents(selector: &str) -> Self {
        Self::new(ALL_TEXT_CONTENTS, vec![json!(selector)])
    }

    pub fn click(selector: &str, force: bool) -> Self {
        Self::new(CLICK, vec![json!(selector), json!(force)])
    }

    pub fn fill(selector: &str, value: &str, force: bool) -> Self {
        Self::new(FILL, vec![json!(selector), json!(value), json!(force)])
    }

    pub fn select_option(selector: &str, value: &str) -> Self {
        Self::new(SELECT_OPTION, vec![json!(selector), json!(value)])
    }

    pub fn ready_state() -> Self {
        Self::new(READY_STATE, vec![])
    }

    fn new(body: &'static str, args: Vec<Value>) -> Self {
        Self { body, args }
    }

    fn function(&self) -> String {
        format!(
            "(function (args) {{ {} try {{ {} }} catch (e) {{ return __fail(e && e.name === 'SyntaxError' ? 'SELECTOR_INVALID' : 'SCRIPT_ERROR', String(e)); }} }})",
            PRELUDE, self.body
        )
    }

    /// Source for WebDriver `execute`; pair with [`DomScript::webdriver_args`].
    pub fn webdriver_source(&self) -> String {
        format!("return {}(arguments[0]);", self.function())
    }

    pub fn webdriver_args(&self) -> Vec<Value> {
        vec![Value::Array(self.args.clone())]
    }

    /// A standalone expression for CDP `Runtime.evaluate`.
    pub fn cdp_expression(&self) -> String {
        format!("{}({})", self.function(), Value::Array(self.args.clone()))
    }
}

/// The envelope every [`DomScript`] answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct DomReply {
    pub ok: bool,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DomReply {
    /// Parse a raw script result. `null` means the page went away mid-call.
    pub fn parse(raw: Value, selector: &str) -> Result<Self, HostError> {
        if raw.is_null() {
            return Err(HostError::ElementDetached {
                selector: selector.to_string(),
            });
        }
        Ok(serde_json::from_value(raw)?)
    }

    pub fn into_value(self, selector: &str) -> Result<Value, HostError> {
        if self.ok {
            return Ok(self.value);
        }
        let code = self.code.as_deref().unwrap_or("SCRIPT_ERROR");
        let message = self.message.as_deref().unwrap_or("");
        Err(HostError::from_dom_code(code, selector, message))
    }
}

/// Parse a raw script result straight to its value.
pub fn reply_value(raw: Value, selector: &str) -> Result<Value, HostError> {
    DomReply::parse(raw, selector)?.into_value(selector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webdriver_script_shape() {
        let script = DomScript::click("#login", true);
        let source = script.webdriver_source();
        assert!(source.starts_with("return (function (args)"));
        assert!(source.ends_with("(arguments[0]);"));
        assert_eq!(script.webdriver_args(), vec![json!(["#login", true])]);
    }

    #[test]
    fn test_cdp_expression_inlines_args() {
        let expr = DomScript::fill("[data-test=\"username\"]", "standard_user", false).cdp_expression();
        assert!(expr.ends_with(r#"(["[data-test=\"username\"]","standard_user",false])"#));
    }

    #[test]
    fn test_reply_ok() {
        let value = reply_value(json!({"ok": true, "value": "Sauce Labs Backpack"}), "#x").unwrap();
        assert_eq!(value, json!("Sauce Labs Backpack"));

        let value = reply_value(json!({"ok": true, "value": null}), "#x").unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_reply_failure_maps_code() {
        let err = reply_value(
            json!({"ok": false, "code": "ELEMENT_NOT_INTERACTABLE", "message": "obscured by <div>"}),
            "#checkout",
        )
        .unwrap_err();
        assert_eq!(
            err,
            HostError::ElementNotInteractable {
                selector: "#checkout".into(),
                reason: "obscured by <div>".into()
            }
        );
    }

    #[test]
    fn test_null_reply_is_detached() {
        let err = reply_value(Value::Null, "#gone").unwrap_err();
        assert_eq!(err.code(), "ELEMENT_DETACHED");
    }
}
