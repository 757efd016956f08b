use crate::frame::FrameTransport;

/// The page the widget is embedded in.
///
/// It is up to the platform to implement this trait. In the browser it wraps
/// `window.document`; tests use an in-memory tree.
pub trait HostDocument {
    /// A node of the page.
    type Element: HostElement;
    /// Message channel to the document loaded in a frame element.
    type Frame: FrameTransport;

    /// Returns the first element matching a CSS selector.
    fn query_selector(&self, selector: &str) -> Option<Self::Element>;

    /// Creates a detached element, or `None` if the tag can not be created.
    fn create_element(&self, tag_name: &str) -> Option<Self::Element>;

    /// Opens the message channel to a frame created by [`HostDocument::create_element`].
    ///
    /// The transport must observe the frame's `load` event from the moment it is created, since
    /// the frame's source is set afterwards.
    fn frame_transport(&self, frame: &Self::Element) -> Option<Self::Frame>;
}

/// The element operations the widget needs.
pub trait HostElement: Clone + 'static {
    #[allow(missing_docs)]
    fn append_child(&self, child: &Self);
    #[allow(missing_docs)]
    fn set_text_content(&self, text: &str);
    /// Sets an inline style property, e.g. `display` or `color`.
    fn set_style(&self, property: &str, value: &str);
    /// Sets the `src` attribute. Only called on frames.
    fn set_src(&self, src: &str);
}
