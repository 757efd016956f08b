use flyttsmart_widget::{HostDocument, HostElement};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlIFrameElement};

use crate::frame::WebFrameTransport;

/// `window.document` of the host page.
#[derive(Clone)]
pub struct WebDocument {
    document: Document,
}

impl WebDocument {
    /// The document of the current window, if there is one.
    pub fn current() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self { document })
    }

    /// `true` once the document has been parsed.
    pub fn is_ready(&self) -> bool {
        self.document.ready_state() != "loading"
    }

    pub(crate) fn inner(&self) -> &Document {
        &self.document
    }
}

impl HostDocument for WebDocument {
    type Element = WebElement;
    type Frame = WebFrameTransport;

    fn query_selector(&self, selector: &str) -> Option<WebElement> {
        match self.document.query_selector(selector) {
            Ok(element) => element.map(WebElement),
            Err(e) => {
                log::error!("Invalid selector {selector}: {e:?}");
                None
            }
        }
    }

    fn create_element(&self, tag_name: &str) -> Option<WebElement> {
        self.document.create_element(tag_name).ok().map(WebElement)
    }

    fn frame_transport(&self, frame: &WebElement) -> Option<WebFrameTransport> {
        let frame = frame.0.dyn_ref::<HtmlIFrameElement>()?.clone();
        WebFrameTransport::new(frame)
            .inspect_err(|e| log::error!("Could not open the widget frame channel: {e}"))
            .ok()
    }
}

#[allow(missing_docs)]
#[derive(Clone)]
pub struct WebElement(pub Element);

impl HostElement for WebElement {
    fn append_child(&self, child: &Self) {
        if let Err(e) = self.0.append_child(&child.0) {
            log::error!("Could not append <{}>: {e:?}", child.0.tag_name());
        }
    }

    fn set_text_content(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn set_style(&self, property: &str, value: &str) {
        let Some(element) = self.0.dyn_ref::<HtmlElement>() else {
            return;
        };
        if let Err(e) = element.style().set_property(property, value) {
            log::error!("Could not set {property}: {e:?}");
        }
    }

    fn set_src(&self, src: &str) {
        match self.0.dyn_ref::<HtmlIFrameElement>() {
            Some(frame) => frame.set_src(src),
            None => {
                if let Err(e) = self.0.set_attribute("src", src) {
                    log::error!("Could not set src: {e:?}");
                }
            }
        }
    }
}
