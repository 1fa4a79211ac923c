//! Handheld viewport adaptation.
//!
//! [`ViewportAdapter`] owns everything the page needs to behave on phones and
//! tablets: the landscape lock request, the one-shot fullscreen request on
//! first touch, and the rotation prompt shown while the device is held in
//! portrait.
//!
//! # Lifecycle
//!
//! 1. [`ViewportAdapter::attach`] hooks `DOMContentLoaded`/`load`, or runs
//!    [`ViewportAdapter::initialize`] right away when the document is ready.
//! 2. `initialize` runs once. On desktop it does nothing at all.
//! 3. On handheld devices it requests a landscape lock, arms the fullscreen
//!    request for the first `touchstart`/`click`, watches `resize` and checks
//!    the orientation once more after a short settle delay.
//! 4. [`ViewportAdapter::shutdown`] deregisters every listener and timer.
//!
//! All callbacks registered with the [`Host`] hold a weak reference to the
//! adapter; once the last `Rc` is dropped they are inert.
//!
//! Nothing here fails loudly. Rejected lock or fullscreen requests and failed
//! DOM operations are logged and the page carries on.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::{
    capability,
    config::AdapterConfig,
    host::{EventKind, EventSource, Host, ListenerId, Pending, Target, TimerId},
    overlay::{self, OverlaySpec, PromptHandle},
    profile::DeviceProfile,
};

#[derive(Debug, Default)]
struct AdapterState {
    initialized: bool,
    shut_down: bool,
    fullscreen_requested: bool,
    lifecycle: Vec<ListenerId>,
    interaction: Vec<ListenerId>,
    resize: Option<ListenerId>,
    settle_timer: Option<TimerId>,
    prompt: Option<PromptHandle>,
}

pub struct ViewportAdapter<H: Host + 'static> {
    host: H,
    config: AdapterConfig,
    state: RefCell<AdapterState>,
    this: Weak<Self>,
}

impl<H: Host + 'static> std::fmt::Debug for ViewportAdapter<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportAdapter")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

impl<H: Host + 'static> ViewportAdapter<H> {
    pub fn new(host: H, config: AdapterConfig) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            host,
            config,
            state: RefCell::new(AdapterState::default()),
            this: this.clone(),
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn profile(&self) -> DeviceProfile {
        DeviceProfile::detect(&self.host, &self.config)
    }

    pub fn detect_handheld(&self) -> bool {
        self.profile().handheld
    }

    pub fn supports_orientation_lock(&self) -> bool {
        capability::supports_orientation_lock(&self.host)
    }

    pub fn supports_fullscreen(&self) -> bool {
        capability::supports_fullscreen(&self.host)
    }

    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    pub fn fullscreen_requested(&self) -> bool {
        self.state.borrow().fullscreen_requested
    }

    pub fn is_prompt_visible(&self) -> bool {
        self.state.borrow().prompt.is_some()
    }

    /// Runs [`Self::initialize`] as soon as the document is interactive.
    ///
    /// While the document is still loading, `load` is hooked as well for pages
    /// whose game files finish loading after `DOMContentLoaded`. Whichever
    /// fires first initializes the adapter and retires both hooks.
    pub fn attach(&self) {
        if !self.host.is_loading() {
            self.initialize();
            return;
        }
        let hooks: Vec<_> = [
            (EventSource::Document, EventKind::DomContentLoaded),
            (EventSource::Window, EventKind::Load),
        ]
        .into_iter()
        .filter_map(|(source, kind)| self.listen(source, kind, |a| a.initialize()))
        .collect();
        self.state.borrow_mut().lifecycle.extend(hooks);
    }

    pub fn initialize(&self) {
        let lifecycle = {
            let mut state = self.state.borrow_mut();
            if state.initialized || state.shut_down {
                return;
            }
            state.initialized = true;
            std::mem::take(&mut state.lifecycle)
        };
        lifecycle.into_iter().for_each(|id| self.host.unlisten(id));

        let profile = self.profile();
        if !profile.handheld {
            log::debug!(
                "Not a handheld device ({}x{}), leaving the page untouched",
                profile.viewport.width,
                profile.viewport.height
            );
            return;
        }
        log::info!(
            "Handheld device detected ({}x{}), initializing orientation and fullscreen handling",
            profile.viewport.width,
            profile.viewport.height
        );

        self.request_landscape();

        let interaction: Vec<_> = [EventKind::TouchStart, EventKind::Click]
            .into_iter()
            .filter_map(|kind| {
                self.listen(EventSource::Document, kind, |a| a.on_first_interaction())
            })
            .collect();
        let resize = self.listen(EventSource::Window, EventKind::Resize, |a| {
            a.on_orientation_change()
        });
        let weak = self.this.clone();
        let settle_timer = self
            .host
            .set_timeout(
                self.config.settle_delay,
                Box::new(move || {
                    if let Some(adapter) = weak.upgrade() {
                        adapter.state.borrow_mut().settle_timer = None;
                        adapter.on_orientation_change();
                    }
                }),
            )
            .map_err(|e| log::error!("Could not schedule the initial orientation check: {:#}", e))
            .ok();
        {
            let mut state = self.state.borrow_mut();
            state.interaction = interaction;
            state.resize = resize;
            state.settle_timer = settle_timer;
        }

        if let Err(e) = self.host.inject_style(&overlay::touch_style(&self.config)) {
            log::error!("Could not inject the touch style: {:#}", e);
        }
    }

    /// Locks the screen to landscape if the browser can, otherwise asks the
    /// user to rotate when the viewport is portrait.
    pub fn request_landscape(&self) {
        match capability::find_orientation_lock(&self.host) {
            Some(api) => {
                log::debug!("Requesting landscape lock via {}", api.method);
                let pending = api.lock_landscape(&self.host);
                self.observe("Orientation lock", pending);
            }
            None => {
                if self.host.viewport().is_portrait() {
                    self.show_rotation_prompt();
                }
            }
        }
    }

    /// Requests fullscreen on the root element through the first entry point
    /// the browser exposes.
    pub fn request_fullscreen(&self) {
        if !self.supports_fullscreen() {
            return;
        }
        let Some(method) = capability::find_fullscreen_request(&self.host) else {
            log::warn!("Fullscreen is enabled but the root element has no request method");
            return;
        };
        log::debug!("Requesting fullscreen via {}", method);
        let pending = self.host.invoke(Target::DocumentElement, method, &[]);
        self.observe("Fullscreen request", pending);
    }

    /// Replaces any prompt on screen with a fresh one.
    ///
    /// The new prompt disappears on the first resize that leaves the viewport
    /// wider than tall, or after `prompt_timeout`, whichever comes first.
    pub fn show_rotation_prompt(&self) {
        self.dismiss_rotation_prompt();

        let overlay = OverlaySpec::rotation_prompt(&self.config);
        if let Err(e) = self.host.append_overlay(&overlay) {
            log::error!("Could not show the rotation prompt: {:#}", e);
            return;
        }

        let resize = self.listen(EventSource::Window, EventKind::Resize, |a| {
            a.on_prompt_resize()
        });
        let weak = self.this.clone();
        let timer = self
            .host
            .set_timeout(
                self.config.prompt_timeout,
                Box::new(move || {
                    if let Some(adapter) = weak.upgrade() {
                        adapter.expire_prompt();
                    }
                }),
            )
            .map_err(|e| log::error!("Could not arm the rotation prompt timeout: {:#}", e))
            .ok();

        self.state.borrow_mut().prompt = Some(PromptHandle { resize, timer });
    }

    /// Removes the prompt along with its resize observer and timeout. Returns
    /// whether a prompt was on screen.
    pub fn dismiss_rotation_prompt(&self) -> bool {
        let prompt = self.state.borrow_mut().prompt.take();
        match prompt {
            Some(prompt) => {
                prompt.release(&self.host, &self.config.prompt_id);
                true
            }
            // a node we do not track, e.g. left behind by an earlier script
            None => self.host.remove_element(&self.config.prompt_id),
        }
    }

    pub fn on_orientation_change(&self) {
        if self.host.viewport().is_portrait() {
            self.show_rotation_prompt();
        } else {
            self.dismiss_rotation_prompt();
        }
    }

    /// Deregisters every listener and timer and removes the prompt. The
    /// adapter cannot be initialized again afterwards.
    pub fn shutdown(&self) {
        let state = {
            let mut state = self.state.borrow_mut();
            state.shut_down = true;
            AdapterState {
                initialized: state.initialized,
                shut_down: true,
                fullscreen_requested: state.fullscreen_requested,
                ..Default::default()
            }
        };
        let old = self.state.replace(state);
        old.lifecycle
            .into_iter()
            .chain(old.interaction)
            .chain(old.resize)
            .for_each(|id| self.host.unlisten(id));
        if let Some(id) = old.settle_timer {
            self.host.clear_timeout(id);
        }
        if let Some(prompt) = old.prompt {
            prompt.release(&self.host, &self.config.prompt_id);
        }
        log::debug!("Viewport adapter shut down");
    }

    fn on_first_interaction(&self) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            if state.fullscreen_requested {
                return;
            }
            state.fullscreen_requested = true;
            std::mem::take(&mut state.interaction)
        };
        listeners.into_iter().for_each(|id| self.host.unlisten(id));
        self.request_fullscreen();
    }

    fn on_prompt_resize(&self) {
        let viewport = self.host.viewport();
        if viewport.width > viewport.height {
            self.dismiss_rotation_prompt();
        }
    }

    fn expire_prompt(&self) {
        let prompt = self.state.borrow_mut().prompt.take();
        if let Some(mut prompt) = prompt {
            log::debug!("Rotation prompt timed out");
            // already fired
            prompt.timer = None;
            prompt.release(&self.host, &self.config.prompt_id);
        }
    }

    fn listen(
        &self,
        source: EventSource,
        kind: EventKind,
        handler: impl Fn(&Self) + 'static,
    ) -> Option<ListenerId> {
        let weak = self.this.clone();
        self.host
            .listen(
                source,
                kind,
                Rc::new(move || {
                    if let Some(adapter) = weak.upgrade() {
                        handler(&adapter);
                    }
                }),
            )
            .map_err(|e| log::error!("Could not listen for {}: {:#}", kind.dom_name(), e))
            .ok()
    }

    fn observe(&self, what: &'static str, pending: Pending) {
        self.host.spawn_local(Box::pin(async move {
            match pending.await {
                Ok(()) => log::debug!("{} succeeded", what),
                Err(e) => log::warn!("{} failed: {:#}", what, e),
            }
        }));
    }
}
