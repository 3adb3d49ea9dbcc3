use wasm_bindgen::prelude::*;

pub mod types;
pub mod document;
pub mod lenient;
pub mod error;
pub mod options;
pub mod style;
pub mod tree;
pub mod walker;
pub mod dom;
pub mod host;
pub mod reconstruct;
pub mod canvas;
pub mod logging;

pub use canvas::{Canvas, Layer, LayerKind};
pub use document::*;
pub use error::{ExportError, HostError, ImportError};
pub use host::{DesignHost, HostMessage, NodeId, NodeKind, NodeProperty};
pub use options::{ExportOptions, ImportOptions};
pub use reconstruct::{import_document, import_json, ImportSummary};
pub use tree::{ComputedStyle, ElementSnapshot, RenderedElement};
pub use types::*;
pub use walker::export_document;

fn export_options(options: JsValue) -> Result<ExportOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(ExportOptions::default());
    }
    Ok(serde_wasm_bindgen::from_value(options)?)
}

fn export_error(err: ExportError) -> JsValue {
    log::error!("{}", err);
    js_sys::Error::new(&err.to_string()).into()
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logging::ConsoleLogger::init(log::LevelFilter::Info);
}

/// Serializes a captured element tree into interchange JSON.
#[wasm_bindgen]
pub fn export_snapshot(snapshot: JsValue, options: JsValue) -> Result<String, JsValue> {
    let root: ElementSnapshot = serde_wasm_bindgen::from_value(snapshot)?;
    let options = export_options(options)?;
    let document = export_document(&root, &options).map_err(export_error)?;
    document.to_json().map_err(|e| export_error(e.into()))
}

/// Serializes the live DOM under `root` into interchange JSON.
#[wasm_bindgen]
pub fn export_dom(root: web_sys::Element, options: JsValue) -> Result<String, JsValue> {
    let options = export_options(options)?;
    let document = export_document(dom::DomElement(root), &options).map_err(export_error)?;
    document.to_json().map_err(|e| export_error(e.into()))
}
