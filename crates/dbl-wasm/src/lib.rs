//! WebAssembly bindings for the blocklist catalog core

use std::sync::OnceLock;
use wasm_bindgen::prelude::*;
use dbl_core::{reconcile, NormalizedCatalog, SelectionSnapshot};

static CATALOG: OnceLock<NormalizedCatalog> = OnceLock::new();

/// Decode and normalize the catalog. Returns the number of entries.
#[wasm_bindgen]
pub fn init_catalog(catalog_json: &str) -> Result<usize, JsValue> {
    if CATALOG.get().is_some() {
        return Err(JsValue::from_str("Catalog already initialized. Reload the page to reinitialize."));
    }

    let catalog = NormalizedCatalog::from_json_str(catalog_json)
        .map_err(|e| JsValue::from_str(&format!("Failed to load catalog: {}", e)))?;
    let count = catalog.len();

    CATALOG.set(catalog)
        .map_err(|_| JsValue::from_str("Failed to set catalog state"))?;

    web_sys::console::debug_1(&JsValue::from_str(&format!("Blocklist catalog loaded: {} entries", count)));
    Ok(count)
}

#[wasm_bindgen]
pub fn is_initialized() -> bool {
    CATALOG.get().is_some()
}

/// The normalized catalog as a `{ key: entry }` object.
#[wasm_bindgen]
pub fn normalized_catalog() -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(catalog()?)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize catalog: {}", e)))?;
    js_sys::JSON::parse(&json)
}

/// A single catalog entry, or `null` when the key is unknown.
#[wasm_bindgen]
pub fn catalog_entry(key: &str) -> Result<JsValue, JsValue> {
    match catalog()?.get(key) {
        Some(entry) => {
            let json = serde_json::to_string(entry)
                .map_err(|e| JsValue::from_str(&format!("Failed to serialize entry: {}", e)))?;
            js_sys::JSON::parse(&json)
        }
        None => Ok(JsValue::NULL),
    }
}

/// Reconcile two `{ key: bool }` selections into an array of actions.
#[wasm_bindgen]
pub fn reconcile_selection(before_json: &str, after_json: &str) -> Result<JsValue, JsValue> {
    let actions = reconcile_json(catalog()?, before_json, after_json)
        .map_err(|e| JsValue::from_str(&e))?;
    js_sys::JSON::parse(&actions)
}

fn catalog() -> Result<&'static NormalizedCatalog, JsValue> {
    CATALOG
        .get()
        .ok_or_else(|| JsValue::from_str("Catalog not initialized. Call init_catalog first."))
}

fn reconcile_json(catalog: &NormalizedCatalog, before_json: &str, after_json: &str) -> Result<String, String> {
    let before: SelectionSnapshot = serde_json::from_str(before_json)
        .map_err(|e| format!("Invalid initial selection: {}", e))?;
    let after: SelectionSnapshot = serde_json::from_str(after_json)
        .map_err(|e| format!("Invalid submitted selection: {}", e))?;

    let actions = reconcile(&before, &after, catalog).map_err(|e| e.to_string())?;

    serde_json::to_string(&actions)
        .map_err(|e| format!("Failed to serialize actions: {}", e))
}
