//! Browser host and wasm entry point.
//!
//! [`WebHost`] implements [`Host`] on top of `web-sys`. Presentation APIs are
//! reached through `js_sys::Reflect` so vendor-prefixed members that `web-sys`
//! has no bindings for can still be probed and called by name.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use anyhow::{Context as _, anyhow};
use futures::future::LocalBoxFuture;
use instant::Duration;
use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::{JsCast, prelude::*};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Window};

use crate::{
    AdapterConfig, ViewportAdapter,
    host::{Callback, EventKind, EventSource, Host, ListenerId, Pending, Target, TimerId},
    overlay::OverlaySpec,
    profile::Viewport,
};

type WebAdapter = ViewportAdapter<WebHost>;

thread_local! {
    // Listener callbacks only hold weak references, the page keeps the adapter alive.
    static ADAPTER: RefCell<Option<Rc<WebAdapter>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    crate::init_logging();

    let host = WebHost::new().map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
    let adapter = ViewportAdapter::new(host, AdapterConfig::default());
    adapter.attach();
    ADAPTER.with(|slot| *slot.borrow_mut() = Some(adapter));
    Ok(())
}

fn js_error(value: JsValue) -> anyhow::Error {
    match value.as_string() {
        Some(message) => anyhow!(message),
        None => anyhow!("{:?}", value),
    }
}

struct Listener {
    source: EventSource,
    kind: EventKind,
    closure: Closure<dyn Fn()>,
}

pub struct WebHost {
    window: Window,
    document: Document,
    next_listener: Cell<u64>,
    listeners: RefCell<HashMap<u64, Listener>>,
    timers: Rc<RefCell<HashMap<i32, Closure<dyn FnMut()>>>>,
}

impl WebHost {
    pub fn new() -> anyhow::Result<Self> {
        let window = web_sys::window().context("no global window")?;
        let document = window.document().context("window has no document")?;
        Ok(Self {
            window,
            document,
            next_listener: Cell::new(0),
            listeners: RefCell::new(HashMap::new()),
            timers: Rc::new(RefCell::new(HashMap::new())),
        })
    }

    fn resolve(&self, target: Target) -> Option<JsValue> {
        let value: JsValue = match target {
            Target::Document => self.document.clone().into(),
            Target::DocumentElement => self.document.document_element()?.into(),
            Target::Screen => self.window.screen().ok()?.into(),
            Target::ScreenOrientation => {
                let screen: JsValue = self.window.screen().ok()?.into();
                Reflect::get(&screen, &"orientation".into()).ok()?
            }
        };
        value.is_object().then_some(value)
    }

    fn event_target(&self, source: EventSource) -> &web_sys::EventTarget {
        match source {
            EventSource::Window => self.window.as_ref(),
            EventSource::Document => self.document.as_ref(),
        }
    }

    fn call(&self, target: Target, method: &str, args: &[&str]) -> anyhow::Result<JsValue> {
        let this = self
            .resolve(target)
            .with_context(|| format!("{:?} is not available", target))?;
        let function = Reflect::get(&this, &method.into())
            .map_err(js_error)?
            .dyn_into::<Function>()
            .map_err(|_| anyhow!("{} is not a function", method))?;
        let args: Array = args.iter().map(|arg| JsValue::from_str(arg)).collect();
        Reflect::apply(&function, &this, &args).map_err(js_error)
    }
}

/// Drops a closure once the current callback has returned. A `Closure` must
/// not be freed while the browser is still executing it.
fn retire<T: ?Sized + 'static>(closure: Closure<T>) {
    wasm_bindgen_futures::spawn_local(async move { drop(closure) });
}

impl Host for WebHost {
    fn user_agent(&self) -> String {
        self.window.navigator().user_agent().unwrap_or_default()
    }

    fn viewport(&self) -> Viewport {
        let dimension = |value: Result<JsValue, JsValue>| {
            value.ok().and_then(|v| v.as_f64()).unwrap_or_default()
        };
        Viewport::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }

    fn has_member(&self, target: Target, name: &str) -> bool {
        self.resolve(target)
            .and_then(|value| Reflect::has(&value, &name.into()).ok())
            .unwrap_or(false)
    }

    fn is_truthy(&self, target: Target, name: &str) -> bool {
        self.resolve(target)
            .and_then(|value| Reflect::get(&value, &name.into()).ok())
            .is_some_and(|value| value.is_truthy())
    }

    fn invoke(&self, target: Target, method: &str, args: &[&str]) -> Pending {
        let result = self.call(target, method, args);
        let method = method.to_string();
        Box::pin(async move {
            match result?.dyn_into::<Promise>() {
                Ok(promise) => {
                    JsFuture::from(promise)
                        .await
                        .map_err(js_error)
                        .with_context(|| format!("{} was rejected", method))?;
                }
                Err(value) if value.as_bool() == Some(false) => {
                    return Err(anyhow!("{} returned false", method));
                }
                Err(_) => {}
            }
            Ok(())
        })
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn remove_element(&self, id: &str) -> bool {
        match self.document.get_element_by_id(id) {
            Some(element) => {
                element.remove();
                true
            }
            None => false,
        }
    }

    fn append_overlay(&self, overlay: &OverlaySpec) -> anyhow::Result<()> {
        let body = self.document.body().context("document has no body")?;
        let element = self.document.create_element("div").map_err(js_error)?;
        element.set_id(&overlay.id);
        element
            .set_attribute("style", &overlay.css)
            .map_err(js_error)?;
        element.set_inner_html(&overlay.inner_html);
        body.append_child(&element).map_err(js_error)?;
        Ok(())
    }

    fn inject_style(&self, css: &str) -> anyhow::Result<()> {
        let head = self.document.head().context("document has no head")?;
        let style = self.document.create_element("style").map_err(js_error)?;
        style.set_text_content(Some(css));
        head.append_child(&style).map_err(js_error)?;
        Ok(())
    }

    fn listen(
        &self,
        source: EventSource,
        kind: EventKind,
        callback: Callback,
    ) -> anyhow::Result<ListenerId> {
        let closure = Closure::<dyn Fn()>::new(move || callback());
        self.event_target(source)
            .add_event_listener_with_callback(kind.dom_name(), closure.as_ref().unchecked_ref())
            .map_err(js_error)
            .with_context(|| format!("adding {} listener", kind.dom_name()))?;

        let id = self.next_listener.get() + 1;
        self.next_listener.set(id);
        self.listeners.borrow_mut().insert(
            id,
            Listener {
                source,
                kind,
                closure,
            },
        );
        Ok(ListenerId(id))
    }

    fn unlisten(&self, id: ListenerId) {
        let listener = self.listeners.borrow_mut().remove(&id.0);
        let Some(listener) = listener else {
            return;
        };
        if let Err(e) = self
            .event_target(listener.source)
            .remove_event_listener_with_callback(
                listener.kind.dom_name(),
                listener.closure.as_ref().unchecked_ref(),
            )
        {
            log::error!(
                "Could not remove {} listener: {:#}",
                listener.kind.dom_name(),
                js_error(e)
            );
        }
        retire(listener.closure);
    }

    fn set_timeout(
        &self,
        delay: Duration,
        callback: Box<dyn FnOnce()>,
    ) -> anyhow::Result<TimerId> {
        // The handle is only known after scheduling, the closure looks it up lazily.
        let handle = Rc::new(RefCell::new(None::<i32>));
        let mut callback = Some(callback);
        let fired = handle.clone();
        let timers = Rc::downgrade(&self.timers);
        let closure = Closure::<dyn FnMut()>::new(move || {
            let id = *fired.borrow();
            if let (Some(id), Some(timers)) = (id, timers.upgrade()) {
                let closure = timers.borrow_mut().remove(&id);
                if let Some(closure) = closure {
                    retire(closure);
                }
            }
            if let Some(callback) = callback.take() {
                callback();
            }
        });
        let id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                delay.as_millis().min(i32::MAX as u128) as i32,
            )
            .map_err(js_error)
            .context("scheduling timeout")?;
        *handle.borrow_mut() = Some(id);
        self.timers.borrow_mut().insert(id, closure);
        Ok(TimerId(id as u64))
    }

    fn clear_timeout(&self, id: TimerId) {
        let handle = id.0 as i32;
        let closure = self.timers.borrow_mut().remove(&handle);
        if let Some(closure) = closure {
            self.window.clear_timeout_with_handle(handle);
            retire(closure);
        }
    }

    fn is_loading(&self) -> bool {
        self.document.ready_state() == "loading"
    }
}
