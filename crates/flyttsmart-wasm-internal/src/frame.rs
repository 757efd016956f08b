use flyttsmart_widget::{FrameMessage, FrameTransport, InboundMessage};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};
use wasm_bindgen::{prelude::*, JsCast};
use web_sys::{HtmlIFrameElement, MessageEvent, Window};

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("No window is available")]
    NoWindow,
    #[error("The widget frame has no content window")]
    NoContentWindow,
    #[error("The host window stopped delivering messages")]
    Closed,
    #[error("Could not encode the message: {0}")]
    Encoding(#[from] serde_wasm_bindgen::Error),
    #[error("JavaScript error: {0}")]
    Js(String),
}

impl From<JsValue> for FrameError {
    fn from(value: JsValue) -> Self {
        FrameError::Js(format!("{value:?}"))
    }
}

/// `postMessage` channel to an iframe.
///
/// Messages posted to the host window are buffered from construction until the transport is
/// dropped, at which point both listeners are removed.
pub struct WebFrameTransport {
    window: Window,
    frame: HtmlIFrameElement,
    loaded: watch::Receiver<bool>,
    incoming: Mutex<mpsc::UnboundedReceiver<InboundMessage>>,
    on_load: Closure<dyn FnMut()>,
    on_message: Closure<dyn FnMut(MessageEvent)>,
}

impl WebFrameTransport {
    #[allow(missing_docs)]
    pub fn new(frame: HtmlIFrameElement) -> Result<Self, FrameError> {
        let window = web_sys::window().ok_or(FrameError::NoWindow)?;

        let (loaded_tx, loaded) = watch::channel(has_loaded(&frame));
        let loading_frame = frame.clone();
        let on_load = Closure::<dyn FnMut()>::new(move || {
            // The initial about:blank document also fires `load`.
            if !loading_frame.src().is_empty() {
                loaded_tx.send_replace(true);
            }
        });
        frame.add_event_listener_with_callback("load", on_load.as_ref().unchecked_ref())?;

        let (incoming_tx, incoming) = mpsc::unbounded_channel();
        let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let data = match serde_wasm_bindgen::from_value::<serde_json::Value>(event.data()) {
                Ok(data) => data,
                Err(e) => {
                    log::trace!("Ignoring message from {}: {e}", event.origin());
                    return;
                }
            };
            let _ = incoming_tx.send(InboundMessage {
                origin: event.origin(),
                data,
            });
        });
        window.add_event_listener_with_callback("message", on_message.as_ref().unchecked_ref())?;

        Ok(Self {
            window,
            frame,
            loaded,
            incoming: Mutex::new(incoming),
            on_load,
            on_message,
        })
    }
}

/// Whether the frame already finished loading its source. Cross-origin documents can not be
/// inspected and count as loaded once a source is set.
fn has_loaded(frame: &HtmlIFrameElement) -> bool {
    if frame.src().is_empty() {
        return false;
    }
    frame.content_document().is_none_or(|document| {
        document.ready_state() == "complete" && document.url().is_ok_and(|url| url != "about:blank")
    })
}

impl FrameTransport for WebFrameTransport {
    type Error = FrameError;

    async fn loaded(&self) {
        let mut loaded = self.loaded.clone();
        let _ = loaded.wait_for(|loaded| *loaded).await;
    }

    fn post_message(&self, message: &FrameMessage, target_origin: &str) -> Result<(), FrameError> {
        let content_window = self
            .frame
            .content_window()
            .ok_or(FrameError::NoContentWindow)?;
        let value = message.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?;
        content_window.post_message(&value, target_origin)?;
        Ok(())
    }

    async fn receive(&self) -> Result<InboundMessage, FrameError> {
        self.incoming
            .lock()
            .await
            .recv()
            .await
            .ok_or(FrameError::Closed)
    }
}

impl Drop for WebFrameTransport {
    fn drop(&mut self) {
        let _ = self.window.remove_event_listener_with_callback(
            "message",
            self.on_message.as_ref().unchecked_ref(),
        );
        let _ = self
            .frame
            .remove_event_listener_with_callback("load", self.on_load.as_ref().unchecked_ref());
    }
}
