//! Host device queries used to pick the desktop or touch layout.

/// Browser user agent. Empty on native.
#[cfg(not(target_family = "wasm"))]
pub fn user_agent() -> String {
    String::new()
}

/// Whether the host reports a touch screen. Native windows rely on the
/// `--touch` flag instead.
#[cfg(not(target_family = "wasm"))]
pub fn has_touch() -> bool {
    false
}

#[cfg(target_family = "wasm")]
fn navigator_property(name: &str) -> Option<wasm_bindgen::JsValue> {
    use wasm_bindgen::JsValue;

    let navigator = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("navigator")).ok()?;
    js_sys::Reflect::get(&navigator, &JsValue::from_str(name)).ok()
}

/// Browser user agent.
#[cfg(target_family = "wasm")]
pub fn user_agent() -> String {
    navigator_property("userAgent")
        .and_then(|value| value.as_string())
        .unwrap_or_default()
}

/// Whether the browser reports any touch points.
#[cfg(target_family = "wasm")]
pub fn has_touch() -> bool {
    navigator_property("maxTouchPoints")
        .and_then(|value| value.as_f64())
        .is_some_and(|points| points > 0.0)
}
