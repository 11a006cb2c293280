//! Browser Location Helpers

use wasm_bindgen::JsValue;

/// Page origin, used as the sign-up confirmation redirect target
pub fn origin() -> Option<String> {
    web_sys::window()?.location().origin().ok()
}

/// Take the auth redirect fragment (`#access_token=...` or `#error=...`)
/// from the address bar, leaving the URL clean.
pub fn take_auth_fragment() -> Option<String> {
    let window = web_sys::window()?;
    let location = window.location();
    let hash = location.hash().ok()?;
    let fragment = hash.strip_prefix('#').unwrap_or(&hash);
    if !(fragment.contains("access_token=") || fragment.contains("error=")) {
        return None;
    }
    let fragment = fragment.to_string();

    let clean = format!(
        "{}{}",
        location.pathname().unwrap_or_default(),
        location.search().unwrap_or_default()
    );
    match window.history() {
        Ok(history) => {
            if let Err(e) = history.replace_state_with_url(&JsValue::NULL, "", Some(&clean)) {
                log::warn!("[browser] could not strip auth fragment: {:?}", e);
            }
        }
        Err(e) => log::warn!("[browser] history unavailable: {:?}", e),
    }
    Some(fragment)
}
