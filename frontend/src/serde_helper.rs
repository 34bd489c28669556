//! Bridge between serde types and JS objects handed to the vendor SDKs.

use oneroof::error::AppError;
use serde::{Serialize, de::DeserializeOwned};
use wasm_bindgen::JsValue;

/// Serialize into a plain JS object (maps become objects, not `Map`).
pub fn to_value<T: Serialize>(value: &T) -> Result<JsValue, AppError> {
    let serializer = serde_wasm_bindgen::Serializer::new()
        .serialize_large_number_types_as_bigints(false)
        .serialize_maps_as_objects(true);
    value
        .serialize(&serializer)
        .map_err(|e| AppError::Serialization(e.to_string()))
}

pub fn from_value<T: DeserializeOwned>(value: JsValue) -> Result<T, AppError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| AppError::Serialization(e.to_string()))
}

/// `message` of a thrown JS error, falling back to its debug form.
pub fn js_error_message(error: &JsValue) -> String {
    js_sys::Reflect::get(error, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| error.as_string())
        .unwrap_or_else(|| format!("{:?}", error))
}
