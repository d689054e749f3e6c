use js_sys::Function;
use wasm_bindgen::JsValue;

use tm_core::{KvStore, StoreError};

/// Key-value backend over the userscript manager's `GM_getValue` /
/// `GM_setValue` pair, handed in from JavaScript.
pub struct UserscriptStorage {
    get_value: Function,
    set_value: Function,
}

impl UserscriptStorage {
    pub fn new(get_value: Function, set_value: Function) -> Self {
        Self { get_value, set_value }
    }
}

impl KvStore for UserscriptStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self.get_value.call1(&JsValue::NULL, &JsValue::from_str(key)) {
            Ok(value) => value.as_string(),
            Err(e) => {
                log::warn!("GM_getValue failed for {}: {:?}", key, e);
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.set_value
            .call2(&JsValue::NULL, &JsValue::from_str(key), &JsValue::from_str(&value))
            .map(|_| ())
            .map_err(|e| StoreError::Backend(format!("GM_setValue failed: {:?}", e)))
    }
}
