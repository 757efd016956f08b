use std::rc::Rc;

use flyttsmart_widget::{WidgetConfig, WidgetController};
use js_sys::{Function, Promise};
use serde::Serialize;
use tokio::sync::oneshot;
use wasm_bindgen::{prelude::*, JsCast};
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use crate::{document::WebDocument, error::WasmError};

/// The Flyttsmart widget of a host page.
#[wasm_bindgen(js_name = FlyttsmartWidget)]
pub struct JsFlyttsmartWidget {
    controller: Rc<WidgetController<WebDocument>>,
}

#[wasm_bindgen(js_class = FlyttsmartWidget)]
impl JsFlyttsmartWidget {
    #[allow(missing_docs)]
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<JsFlyttsmartWidget, JsValue> {
        let document = WebDocument::current().ok_or_else(|| JsValue::from_str("No document"))?;
        let ready = document.is_ready();

        let controller = WidgetController::new(document);
        if ready {
            controller.on_dom_ready();
        }
        Ok(Self {
            controller: Rc::new(controller),
        })
    }

    /// Marks the document as ready. Only needed when the widget was created while the document
    /// was still loading.
    pub fn on_dom_ready(&self) {
        self.controller.on_dom_ready();
    }

    #[allow(missing_docs)]
    pub fn assign_settings(&self, config: JsValue) -> Result<(), JsValue> {
        let config = parse_config(config)?;
        self.controller
            .assign_settings(config)
            .map_err(|e| WasmError::from(e).into())
    }

    /// Validates the settings and mounts the widget.
    pub fn init(&self, config: JsValue) -> Result<(), JsValue> {
        let config = parse_config(config)?;
        self.controller
            .init(config)
            .map_err(|e| WasmError::from(e).into())
    }

    #[allow(missing_docs)]
    pub fn init_ui(&self) -> Result<(), JsValue> {
        self.controller
            .init_ui()
            .map_err(|e| WasmError::from(e).into())
    }

    #[allow(missing_docs)]
    pub fn init_debug_widget(&self) -> Result<(), JsValue> {
        self.controller
            .init_debug_widget()
            .map_err(|e| WasmError::from(e).into())
    }

    /// Logs the user in and hands the session token to the widget frame. The promise rejects
    /// when the login fails or the frame never answers.
    pub fn init_iframe(&self) -> Promise {
        let controller = self.controller.clone();
        future_to_promise(async move {
            controller
                .init_iframe()
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(|e| WasmError::from(e).into())
        })
    }

    #[allow(missing_docs)]
    pub fn is_initialized(&self) -> bool {
        self.controller.is_initialized()
    }

    /// The validated settings, without the personal number.
    #[wasm_bindgen(getter)]
    pub fn settings(&self) -> JsValue {
        self.controller
            .settings()
            .and_then(|settings| to_js(&settings))
            .unwrap_or(JsValue::UNDEFINED)
    }

    /// Registers a listener for widget events.
    pub fn on_event(&self, listener: Function) {
        self.controller
            .on_event(move |event| call_listener(&listener, event));
    }

    /// Registers a listener for lifecycle commands (`API:INIT`, `API:INIT_UI`).
    pub fn on_cmd_request(&self, listener: Function) {
        self.controller
            .on_cmd_request(move |request| call_listener(&listener, request));
    }
}

/// Waits for the document, then initializes the widget and runs the login handshake.
///
/// Resolves to the [`JsFlyttsmartWidget`] once the session token has been delivered.
#[wasm_bindgen]
pub fn init_widget(settings: JsValue) -> Promise {
    future_to_promise(async move {
        let config = parse_config(settings)?;
        let widget = JsFlyttsmartWidget::new()?;

        let document = widget.controller.document().clone();
        document_ready(&document).await;
        widget.controller.on_dom_ready();

        widget
            .controller
            .init(config)
            .map_err(WasmError::from)?;
        JsFuture::from(widget.init_iframe()).await?;
        Ok(widget.into())
    })
}

async fn document_ready(document: &WebDocument) {
    if document.is_ready() {
        return;
    }

    let (tx, rx) = oneshot::channel();
    let listener = Closure::once(move || {
        let _ = tx.send(());
    });
    let target = document.inner();
    if let Err(e) = target
        .add_event_listener_with_callback("DOMContentLoaded", listener.as_ref().unchecked_ref())
    {
        log::error!("Could not wait for DOMContentLoaded: {e:?}");
        return;
    }
    let _ = rx.await;
    let _ = target
        .remove_event_listener_with_callback("DOMContentLoaded", listener.as_ref().unchecked_ref());
}

fn parse_config(config: JsValue) -> Result<WidgetConfig, WasmError> {
    Ok(serde_wasm_bindgen::from_value(config)?)
}

fn to_js<T: Serialize>(value: &T) -> Option<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .inspect_err(|e| log::error!("Could not convert value for JavaScript: {e}"))
        .ok()
}

fn call_listener<T: Serialize>(listener: &Function, value: &T) {
    let Some(value) = to_js(value) else {
        return;
    };
    if let Err(e) = listener.call1(&JsValue::NULL, &value) {
        log::error!("Widget listener threw: {e:?}");
    }
}
