//! WASM bindings for urlquery-core.
//!
//! Exposes `encode` and `decode` as `#[wasm_bindgen]` functions that can be
//! called from JavaScript/TypeScript. Values cross the boundary as JSON text,
//! so any JSON object or array can be encoded and any query string decoded.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p urlquery-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir pkg/ \
//!   target/wasm32-unknown-unknown/release/urlquery_wasm.wasm
//! ```

use serde_json::Value;
use wasm_bindgen::prelude::*;

/// Encode a JSON object or array into an escaped query string.
///
/// Throws a JS error if the input is not valid JSON or is a bare scalar.
#[wasm_bindgen]
pub fn encode(json: &str) -> std::result::Result<String, JsValue> {
    encode_json(json).map_err(|e| JsValue::from_str(&e))
}

/// Decode a query string into compact JSON.
///
/// Leaf values are typed by inference: `true`/`false`, integers and floats
/// become JSON booleans and numbers, everything else a string.
#[wasm_bindgen]
pub fn decode(query: &str) -> std::result::Result<String, JsValue> {
    decode_query(query).map_err(|e| JsValue::from_str(&e))
}

fn encode_json(json: &str) -> Result<String, String> {
    let value: Value = serde_json::from_str(json).map_err(|e| format!("invalid JSON: {e}"))?;
    urlquery_core::to_string(&value).map_err(|e| e.to_string())
}

fn decode_query(query: &str) -> Result<String, String> {
    let value: Value = urlquery_core::from_str(query).map_err(|e| e.to_string())?;
    serde_json::to_string(&value).map_err(|e| e.to_string())
}
