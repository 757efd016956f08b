use flyttsmart_widget::WidgetError;
use wasm_bindgen::prelude::*;

// Importing an error class defined in JavaScript instead of defining it in Rust
// allows us to extend the `Error` class. It also provides much better console output.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = Error)]
    type JsError;

    #[wasm_bindgen(constructor, js_class = Error)]
    fn new(message: String) -> JsError;

    #[wasm_bindgen(method, setter, structural)]
    fn set_name(this: &JsError, name: String);

    #[wasm_bindgen(method, setter, structural)]
    fn set_variant(this: &JsError, variant: String);
}

pub(crate) struct WasmError {
    message: String,
    name: &'static str,
    variant: &'static str,
}

impl From<WidgetError> for WasmError {
    fn from(error: WidgetError) -> Self {
        WasmError {
            message: error.to_string(),
            name: "WidgetError",
            variant: error.variant(),
        }
    }
}

impl From<serde_wasm_bindgen::Error> for WasmError {
    fn from(error: serde_wasm_bindgen::Error) -> Self {
        WasmError {
            message: error.to_string(),
            name: "WidgetError",
            variant: "InvalidConfig",
        }
    }
}

impl From<WasmError> for JsValue {
    fn from(error: WasmError) -> Self {
        let js_error = JsError::new(error.message);
        js_error.set_name(error.name.to_owned());
        js_error.set_variant(error.variant.to_owned());
        js_error.into()
    }
}
