use std::{cell::RefCell, rc::Rc};

use flyttsmart_auth::{AuthClient, StatusEvent, SubscriptionId};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    commands::{CommandRequest, Listeners, WidgetEvent, CMD_INIT, CMD_INIT_UI},
    document::{HostDocument, HostElement},
    handshake::{FrameHandshake, PingPolicy},
    settings::{WidgetConfig, WidgetSettings},
    WidgetError,
};

/// The elements mounted by [`WidgetController::init_ui`].
#[derive(Clone, Debug)]
pub struct UiElements<E> {
    /// Status line mirroring the authentication progress.
    pub status_el: E,
    /// The widget iframe, hidden until the user is logged in.
    pub widget_frame: E,
}

struct MountedUi<E> {
    elements: UiElements<E>,
    subscription: SubscriptionId,
    /// Terminal login events. Taken while a handshake runs.
    outcomes: Option<mpsc::UnboundedReceiver<StatusEvent>>,
}

struct WidgetState<E> {
    dom_ready: bool,
    is_initialized: bool,
    settings: Option<WidgetSettings>,
    auth_client: Option<Rc<AuthClient>>,
    ui: Option<MountedUi<E>>,
}

/// Controls one widget instance on a host page.
///
/// The controller lives on the page's event loop. All methods take `&self`; no state borrow is
/// held across an await point, so listeners may call back into the controller.
pub struct WidgetController<D: HostDocument> {
    document: D,
    state: RefCell<WidgetState<D::Element>>,
    on_event: Rc<Listeners<WidgetEvent>>,
    on_cmd_request: Listeners<CommandRequest>,
}

impl<D: HostDocument> WidgetController<D> {
    #[allow(missing_docs)]
    pub fn new(document: D) -> Self {
        Self {
            document,
            state: RefCell::new(WidgetState {
                dom_ready: false,
                is_initialized: false,
                settings: None,
                auth_client: None,
                ui: None,
            }),
            on_event: Rc::new(Listeners::default()),
            on_cmd_request: Listeners::default(),
        }
    }

    #[allow(missing_docs)]
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Document ready hook. Must be called once the host document has been parsed.
    pub fn on_dom_ready(&self) {
        self.state.borrow_mut().dom_ready = true;
        log::debug!("Host document ready");
    }

    #[allow(missing_docs)]
    pub fn is_dom_ready(&self) -> bool {
        self.state.borrow().dom_ready
    }

    #[allow(missing_docs)]
    pub fn is_initialized(&self) -> bool {
        self.state.borrow().is_initialized
    }

    #[allow(missing_docs)]
    pub fn settings(&self) -> Option<WidgetSettings> {
        self.state.borrow().settings.clone()
    }

    #[allow(missing_docs)]
    pub fn auth_client(&self) -> Option<Rc<AuthClient>> {
        self.state.borrow().auth_client.clone()
    }

    /// The mounted elements, `None` until [`WidgetController::init_ui`] found the mount point.
    pub fn ui_elements(&self) -> Option<UiElements<D::Element>> {
        self.state.borrow().ui.as_ref().map(|ui| ui.elements.clone())
    }

    /// Registers a listener for [`WidgetEvent`]s.
    pub fn on_event(&self, listener: impl Fn(&WidgetEvent) + 'static) {
        self.on_event.add(listener);
    }

    /// Registers a listener for lifecycle [`CommandRequest`]s.
    pub fn on_cmd_request(&self, listener: impl Fn(&CommandRequest) + 'static) {
        self.on_cmd_request.add(listener);
    }

    /// Validates and stores the host configuration.
    ///
    /// Nothing is stored when the configuration is invalid.
    pub fn assign_settings(&self, config: WidgetConfig) -> Result<(), WidgetError> {
        if self.is_initialized() {
            return Err(WidgetError::AlreadyInitialized);
        }
        let settings = WidgetSettings::from_config(config)?;
        self.state.borrow_mut().settings = Some(settings);
        Ok(())
    }

    /// Initializes the widget: settings, authentication client and UI.
    ///
    /// Calling `init` again after a successful call does nothing.
    pub fn init(&self, config: WidgetConfig) -> Result<(), WidgetError> {
        {
            let state = self.state.borrow();
            if !state.dom_ready {
                return Err(WidgetError::DocumentNotReady);
            }
            if state.is_initialized {
                log::debug!("Widget already initialized");
                return Ok(());
            }
        }

        self.assign_settings(config)?;
        let settings = self.settings().ok_or(WidgetError::NotInitialized)?;
        log::debug!("Initializing widget with {settings:?}");

        {
            let mut state = self.state.borrow_mut();
            state.auth_client = Some(Rc::new(AuthClient::new(settings.auth_settings())));
            state.is_initialized = true;
        }

        self.do_command(
            CMD_INIT,
            serde_json::to_value(&settings).unwrap_or(serde_json::Value::Null),
        );
        self.init_ui()
    }

    /// Mounts the status line and the hidden frame into the configured element.
    ///
    /// From then on every status event of the [`AuthClient`] is mirrored into the status line,
    /// and the terminal success reveals the frame. A missing mount element is logged and
    /// otherwise ignored.
    pub fn init_ui(&self) -> Result<(), WidgetError> {
        let (auth_client, settings) = {
            let state = self.state.borrow();
            if state.ui.is_some() {
                return Ok(());
            }
            let auth_client = state
                .auth_client
                .clone()
                .ok_or(WidgetError::NotInitialized)?;
            let settings = state.settings.clone().ok_or(WidgetError::NotInitialized)?;
            (auth_client, settings)
        };

        let selector = &settings.dom_element_id;
        let Some(owner) = self.document.query_selector(selector) else {
            log::error!("Widget owner {selector} not found");
            return Ok(());
        };

        let status_el = self
            .document
            .create_element("div")
            .ok_or(WidgetError::ElementCreation("div"))?;
        let widget_frame = self
            .document
            .create_element("iframe")
            .ok_or(WidgetError::ElementCreation("iframe"))?;

        widget_frame.set_style("display", "none");
        owner.append_child(&status_el);
        owner.append_child(&widget_frame);

        let elements = UiElements {
            status_el,
            widget_frame,
        };

        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let subscription = {
            let elements = elements.clone();
            let iframe_url = settings.iframe_url;
            let on_event = self.on_event.clone();
            auth_client.subscribe(move |event| {
                apply_status(&elements, &iframe_url, &on_event, event);
                if event.is_error() || event.is_logged_in() {
                    // The receiver only goes away with the controller.
                    let _ = outcome_tx.send(event.clone());
                }
            })
        };

        self.state.borrow_mut().ui = Some(MountedUi {
            elements,
            subscription,
            outcomes: Some(outcomes),
        });

        self.do_command(CMD_INIT_UI, serde_json::Value::Null);
        Ok(())
    }

    /// Builds the UI without running the handshake.
    pub fn init_debug_widget(&self) -> Result<(), WidgetError> {
        self.init_ui()
    }

    /// Logs the user in and hands the session token to the widget frame.
    ///
    /// The login and the frame handshake run concurrently; the token is posted once the user is
    /// logged in and the frame has answered a `PING`. A failed login or an unanswered frame
    /// fails the whole operation.
    pub async fn init_iframe(&self) -> Result<(), WidgetError> {
        let (auth_client, settings, elements, mut outcomes) = {
            let mut state = self.state.borrow_mut();
            let auth_client = state
                .auth_client
                .clone()
                .ok_or(WidgetError::NotInitialized)?;
            let settings = state.settings.clone().ok_or(WidgetError::NotInitialized)?;
            let ui = state.ui.as_mut().ok_or(WidgetError::NotMounted)?;
            let outcomes = ui.outcomes.take().ok_or(WidgetError::AlreadyStarted)?;
            (auth_client, settings, ui.elements.clone(), outcomes)
        };

        let result = self
            .run_handshake(&auth_client, &settings, &elements, &mut outcomes)
            .await;

        if let Some(ui) = self.state.borrow_mut().ui.as_mut() {
            ui.outcomes = Some(outcomes);
        }

        match &result {
            Ok(()) => self.on_event.trigger(&WidgetEvent::TokenDelivered),
            Err(WidgetError::Handshake(e)) => self.on_event.trigger(&WidgetEvent::HandshakeFailed {
                reason: e.to_string(),
            }),
            Err(_) => {}
        }
        result
    }

    async fn run_handshake(
        &self,
        auth_client: &AuthClient,
        settings: &WidgetSettings,
        elements: &UiElements<D::Element>,
        outcomes: &mut mpsc::UnboundedReceiver<StatusEvent>,
    ) -> Result<(), WidgetError> {
        let transport = self
            .document
            .frame_transport(&elements.widget_frame)
            .ok_or(WidgetError::FrameUnavailable)?;

        // Outcomes of earlier logins do not end this run.
        while outcomes.try_recv().is_ok() {}

        let (token_tx, mut token_rx) = watch::channel(None::<String>);
        let login_failed = CancellationToken::new();

        let login = async {
            let ((), outcome) = tokio::join!(auth_client.login_user(), login_outcome(outcomes));
            match outcome {
                Ok(token) => {
                    token_tx.send_replace(Some(token));
                    Ok(())
                }
                Err(e) => {
                    login_failed.cancel();
                    Err(e)
                }
            }
        };

        let handshake = async {
            let policy = PingPolicy {
                interval: settings.ping_interval,
                max_attempts: settings.max_ping_attempts,
            };
            let handshake = FrameHandshake::new(
                &transport,
                policy,
                settings.iframe_origin.as_deref(),
                settings.target_origin(),
            );
            let access_token = async {
                token_rx
                    .wait_for(Option::is_some)
                    .await
                    .ok()
                    .and_then(|token| (*token).clone())
            };

            tokio::select! {
                biased;
                // The login branch reports its own error.
                _ = login_failed.cancelled() => Ok(()),
                delivered = handshake.deliver(access_token) => delivered,
            }
        };

        let (logged_in, delivered) = tokio::join!(login, handshake);
        logged_in?;
        delivered?;
        Ok(())
    }

    fn do_command(&self, cmd: &str, value: serde_json::Value) {
        self.on_cmd_request.trigger(&CommandRequest {
            cmd: cmd.to_owned(),
            value,
        });
    }
}

impl<D: HostDocument> Drop for WidgetController<D> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if let (Some(client), Some(ui)) = (&state.auth_client, &state.ui) {
            client.unsubscribe(ui.subscription);
        }
    }
}

/// Waits for the terminal status event of a login. Returns the session token.
async fn login_outcome(
    outcomes: &mut mpsc::UnboundedReceiver<StatusEvent>,
) -> Result<String, WidgetError> {
    match outcomes.recv().await {
        Some(event) if event.is_error() => Err(WidgetError::LoginFailed(event.status_text)),
        Some(event) => event
            .token
            .ok_or_else(|| WidgetError::LoginFailed("missing session token".to_owned())),
        None => Err(WidgetError::LoginFailed("status channel closed".to_owned())),
    }
}

/// Mirrors a status event into the status line. The terminal success hides the status line
/// and reveals the frame.
fn apply_status<E: HostElement>(
    elements: &UiElements<E>,
    iframe_url: &str,
    on_event: &Listeners<WidgetEvent>,
    event: &StatusEvent,
) {
    let status_el = &elements.status_el;
    status_el.set_text_content(&event.status_text);

    if event.is_error() {
        status_el.set_style("color", "red");
    } else {
        status_el.set_style("color", "black");
    }
    on_event.trigger(&WidgetEvent::Status(event.clone()));

    if let (true, Some(token)) = (event.is_logged_in(), event.token.as_deref()) {
        status_el.set_style("display", "none");
        elements.widget_frame.set_style("display", "block");
        elements.widget_frame.set_src(&frame_source(iframe_url, token));
        on_event.trigger(&WidgetEvent::FrameRevealed);
    }
}

/// Appends the session token to the frame URL.
fn frame_source(iframe_url: &str, token: &str) -> String {
    match Url::parse(iframe_url) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("token", token);
            url.into()
        }
        Err(e) => {
            log::warn!("Could not parse iframe URL {iframe_url}: {e}");
            format!("{iframe_url}?token={token}")
        }
    }
}
