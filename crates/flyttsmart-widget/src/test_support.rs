//! In-memory implementations of the host traits.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};

use crate::{
    document::{HostDocument, HostElement},
    frame::{FrameMessage, FrameTransport, InboundMessage},
};

struct Node {
    tag: String,
    id: Option<String>,
    text: String,
    style: HashMap<String, String>,
    src: Option<String>,
    children: Vec<MemoryElement>,
    loaded: watch::Sender<bool>,
}

#[derive(Clone)]
pub(crate) struct MemoryElement(Rc<RefCell<Node>>);

impl MemoryElement {
    fn new(tag: &str, id: Option<&str>) -> Self {
        let (loaded, _) = watch::channel(false);
        Self(Rc::new(RefCell::new(Node {
            tag: tag.to_owned(),
            id: id.map(str::to_owned),
            text: String::new(),
            style: HashMap::new(),
            src: None,
            children: Vec::new(),
            loaded,
        })))
    }

    pub(crate) fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub(crate) fn text(&self) -> String {
        self.0.borrow().text.clone()
    }

    pub(crate) fn style(&self, property: &str) -> Option<String> {
        self.0.borrow().style.get(property).cloned()
    }

    pub(crate) fn src(&self) -> Option<String> {
        self.0.borrow().src.clone()
    }

    pub(crate) fn children(&self) -> Vec<MemoryElement> {
        self.0.borrow().children.clone()
    }

    fn loaded(&self) -> watch::Receiver<bool> {
        self.0.borrow().loaded.subscribe()
    }
}

impl HostElement for MemoryElement {
    fn append_child(&self, child: &Self) {
        self.0.borrow_mut().children.push(child.clone());
    }

    fn set_text_content(&self, text: &str) {
        self.0.borrow_mut().text = text.to_owned();
    }

    fn set_style(&self, property: &str, value: &str) {
        self.0
            .borrow_mut()
            .style
            .insert(property.to_owned(), value.to_owned());
    }

    /// Setting the source "loads" the frame right away.
    fn set_src(&self, src: &str) {
        let mut node = self.0.borrow_mut();
        node.src = Some(src.to_owned());
        node.loaded.send_replace(true);
    }
}

/// A page consisting of detached mount points.
#[derive(Default)]
pub(crate) struct MemoryDocument {
    mounts: Vec<MemoryElement>,
    bus: Rc<FrameBus>,
}

impl MemoryDocument {
    pub(crate) fn with_mount(id: &str) -> Self {
        Self {
            mounts: vec![MemoryElement::new("div", Some(id))],
            ..Default::default()
        }
    }

    pub(crate) fn mount(&self, id: &str) -> Option<MemoryElement> {
        self.mounts
            .iter()
            .find(|m| m.0.borrow().id.as_deref() == Some(id))
            .cloned()
    }

    /// The transport every frame of this document shares.
    pub(crate) fn frames(&self) -> TestFrameTransport {
        TestFrameTransport {
            frame: None,
            bus: self.bus.clone(),
        }
    }
}

impl HostDocument for MemoryDocument {
    type Element = MemoryElement;
    type Frame = TestFrameTransport;

    fn query_selector(&self, selector: &str) -> Option<MemoryElement> {
        self.mount(selector.strip_prefix('#')?)
    }

    fn create_element(&self, tag_name: &str) -> Option<MemoryElement> {
        Some(MemoryElement::new(tag_name, None))
    }

    fn frame_transport(&self, frame: &MemoryElement) -> Option<TestFrameTransport> {
        (frame.tag() == "iframe").then(|| TestFrameTransport {
            frame: Some(frame.clone()),
            bus: self.bus.clone(),
        })
    }
}

struct FrameBus {
    posted: RefCell<Vec<(FrameMessage, String)>>,
    incoming_tx: mpsc::UnboundedSender<InboundMessage>,
    incoming_rx: Mutex<mpsc::UnboundedReceiver<InboundMessage>>,
    pong_after: RefCell<Option<(usize, String)>>,
    fail_posts: Cell<bool>,
}

impl Default for FrameBus {
    fn default() -> Self {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        Self {
            posted: RefCell::new(Vec::new()),
            incoming_tx,
            incoming_rx: Mutex::new(incoming_rx),
            pong_after: RefCell::new(None),
            fail_posts: Cell::new(false),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum TestTransportError {
    #[error("Posting is disabled")]
    PostFailed,
    #[error("The incoming message channel is closed")]
    Closed,
}

/// Records outgoing messages and plays the frame's side of the handshake.
#[derive(Clone)]
pub(crate) struct TestFrameTransport {
    frame: Option<MemoryElement>,
    bus: Rc<FrameBus>,
}

impl TestFrameTransport {
    /// Answers the `count`-th PING with a PONG from `origin`.
    pub(crate) fn reply_pong_after(&self, count: usize, origin: &str) {
        *self.bus.pong_after.borrow_mut() = Some((count, origin.to_owned()));
    }

    pub(crate) fn push_incoming(&self, origin: &str, data: serde_json::Value) {
        let _ = self.bus.incoming_tx.send(InboundMessage {
            origin: origin.to_owned(),
            data,
        });
    }

    pub(crate) fn fail_posts(&self) {
        self.bus.fail_posts.set(true);
    }

    pub(crate) fn posted(&self) -> Vec<FrameMessage> {
        self.bus
            .posted
            .borrow()
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }

    pub(crate) fn target_origins(&self) -> Vec<String> {
        self.bus
            .posted
            .borrow()
            .iter()
            .map(|(_, origin)| origin.clone())
            .collect()
    }
}

impl FrameTransport for TestFrameTransport {
    type Error = TestTransportError;

    async fn loaded(&self) {
        if let Some(frame) = &self.frame {
            let mut loaded = frame.loaded();
            let _ = loaded.wait_for(|loaded| *loaded).await;
        }
    }

    fn post_message(
        &self,
        message: &FrameMessage,
        target_origin: &str,
    ) -> Result<(), TestTransportError> {
        if self.bus.fail_posts.get() {
            return Err(TestTransportError::PostFailed);
        }

        let pings = {
            let mut posted = self.bus.posted.borrow_mut();
            posted.push((message.clone(), target_origin.to_owned()));
            posted
                .iter()
                .filter(|(m, _)| *m == FrameMessage::Ping)
                .count()
        };

        if *message == FrameMessage::Ping {
            let reply = self.bus.pong_after.borrow().clone();
            if let Some((count, origin)) = reply {
                if pings == count {
                    self.push_incoming(&origin, serde_json::json!({ "type": "PONG" }));
                }
            }
        }
        Ok(())
    }

    async fn receive(&self) -> Result<InboundMessage, TestTransportError> {
        self.bus
            .incoming_rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(TestTransportError::Closed)
    }
}
