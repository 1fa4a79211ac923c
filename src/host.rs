//! The seam between the adapter and the page it runs in.
//!
//! [`Host`] exposes the handful of browser primitives the adapter needs:
//! environment queries, reflective capability probes, DOM mutations, event
//! listeners and timers. In the browser it is implemented by
//! `web::WebHost`; tests drive the adapter through a simulated host.
//!
//! Capability probes are reflective on purpose: the vendor-prefixed API names
//! live in [`crate::capability`] as data, and a host only has to answer
//! "does this object have a member called X".

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use instant::Duration;

use crate::{overlay::OverlaySpec, profile::Viewport};

/// Browser objects whose members are probed or invoked by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Document,
    /// `document.documentElement`, the root `<html>` node.
    DocumentElement,
    Screen,
    /// `screen.orientation`; missing on older engines.
    ScreenOrientation,
}

/// Objects the adapter attaches listeners to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    Window,
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `click`, fired on pointer-down/up of a mouse or pen.
    Click,
    /// `touchstart`
    TouchStart,
    Resize,
    DomContentLoaded,
    Load,
}

impl EventKind {
    pub fn dom_name(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::TouchStart => "touchstart",
            EventKind::Resize => "resize",
            EventKind::DomContentLoaded => "DOMContentLoaded",
            EventKind::Load => "load",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Listener callbacks may fire any number of times until deregistered.
pub type Callback = Rc<dyn Fn()>;

/// Completion of an asynchronous browser request such as a fullscreen or
/// orientation-lock promise. Only ever observed for logging.
pub type Pending = LocalBoxFuture<'static, anyhow::Result<()>>;

pub trait Host {
    fn user_agent(&self) -> String;

    fn viewport(&self) -> Viewport;

    /// `name in target`. False when the target itself does not exist.
    fn has_member(&self, target: Target, name: &str) -> bool;

    /// Whether `target[name]` is truthy. False when the target does not exist.
    fn is_truthy(&self, target: Target, name: &str) -> bool;

    /// Calls `target[method](...args)`.
    ///
    /// A thrown exception becomes an already-failed [`Pending`]. A returned
    /// promise is awaited; `false` (legacy lock APIs) counts as a failure.
    fn invoke(&self, target: Target, method: &str, args: &[&str]) -> Pending;

    /// Drives a future on the page's event loop.
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);

    /// Removes the element with the given id. Returns whether one existed.
    fn remove_element(&self, id: &str) -> bool;

    /// Appends the overlay to `<body>`.
    fn append_overlay(&self, overlay: &OverlaySpec) -> anyhow::Result<()>;

    /// Appends a `<style>` block with the given rules to `<head>`.
    fn inject_style(&self, css: &str) -> anyhow::Result<()>;

    fn listen(
        &self,
        source: EventSource,
        kind: EventKind,
        callback: Callback,
    ) -> anyhow::Result<ListenerId>;

    /// Deregistering an unknown or already removed id is a no-op.
    fn unlisten(&self, id: ListenerId);

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>)
    -> anyhow::Result<TimerId>;

    /// Clearing an unknown or already fired timer is a no-op.
    fn clear_timeout(&self, id: TimerId);

    /// `document.readyState == "loading"`
    fn is_loading(&self) -> bool;
}

impl<H> Host for Rc<H>
where
    H: Host + ?Sized,
{
    fn user_agent(&self) -> String {
        (**self).user_agent()
    }

    fn viewport(&self) -> Viewport {
        (**self).viewport()
    }

    fn has_member(&self, target: Target, name: &str) -> bool {
        (**self).has_member(target, name)
    }

    fn is_truthy(&self, target: Target, name: &str) -> bool {
        (**self).is_truthy(target, name)
    }

    fn invoke(&self, target: Target, method: &str, args: &[&str]) -> Pending {
        (**self).invoke(target, method, args)
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        (**self).spawn_local(task)
    }

    fn remove_element(&self, id: &str) -> bool {
        (**self).remove_element(id)
    }

    fn append_overlay(&self, overlay: &OverlaySpec) -> anyhow::Result<()> {
        (**self).append_overlay(overlay)
    }

    fn inject_style(&self, css: &str) -> anyhow::Result<()> {
        (**self).inject_style(css)
    }

    fn listen(
        &self,
        source: EventSource,
        kind: EventKind,
        callback: Callback,
    ) -> anyhow::Result<ListenerId> {
        (**self).listen(source, kind, callback)
    }

    fn unlisten(&self, id: ListenerId) {
        (**self).unlisten(id)
    }

    fn set_timeout(
        &self,
        delay: Duration,
        callback: Box<dyn FnOnce()>,
    ) -> anyhow::Result<TimerId> {
        (**self).set_timeout(delay, callback)
    }

    fn clear_timeout(&self, id: TimerId) {
        (**self).clear_timeout(id)
    }

    fn is_loading(&self) -> bool {
        (**self).is_loading()
    }
}
