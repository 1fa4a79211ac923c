use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashSet},
    rc::Rc,
    sync::Once,
};

use futures::{
    executor::LocalPool,
    future::{self, LocalBoxFuture},
    task::LocalSpawnExt,
};
use instant::Duration;
use viewport_adapter::{
    AdapterConfig, Viewport, ViewportAdapter,
    host::{Callback, EventKind, EventSource, Host, ListenerId, Pending, Target, TimerId},
    overlay::OverlaySpec,
};

pub(crate) const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
pub(crate) const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36";
pub(crate) const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub(crate) type TestAdapter = ViewportAdapter<Rc<FakeHost>>;

/// A simulated page: one document, window listeners, a virtual clock and a
/// set of presentation APIs that exist by name.
pub(crate) struct FakeHost {
    user_agent: RefCell<String>,
    viewport: Cell<Viewport>,
    loading: Cell<bool>,
    members: RefCell<HashSet<(Target, String)>>,
    truthy: RefCell<HashSet<(Target, String)>>,
    rejecting: RefCell<HashSet<String>>,
    calls: RefCell<Vec<(Target, String, Vec<String>)>>,
    pool: RefCell<LocalPool>,
    elements: RefCell<Vec<OverlaySpec>>,
    styles: RefCell<Vec<String>>,
    mutations: Cell<usize>,
    next_id: Cell<u64>,
    listeners: RefCell<BTreeMap<u64, (EventSource, EventKind, Callback)>>,
    now: Cell<Duration>,
    timers: RefCell<BTreeMap<u64, (Duration, Box<dyn FnOnce()>)>>,
}

impl FakeHost {
    pub fn new(user_agent: &str, width: f64, height: f64) -> Rc<Self> {
        Rc::new(Self {
            user_agent: RefCell::new(user_agent.to_string()),
            viewport: Cell::new(Viewport::new(width, height)),
            loading: Cell::new(false),
            members: RefCell::new(HashSet::new()),
            truthy: RefCell::new(HashSet::new()),
            rejecting: RefCell::new(HashSet::new()),
            calls: RefCell::new(Vec::new()),
            pool: RefCell::new(LocalPool::new()),
            elements: RefCell::new(Vec::new()),
            styles: RefCell::new(Vec::new()),
            mutations: Cell::new(0),
            next_id: Cell::new(0),
            listeners: RefCell::new(BTreeMap::new()),
            now: Cell::new(Duration::ZERO),
            timers: RefCell::new(BTreeMap::new()),
        })
    }

    pub fn desktop() -> Rc<Self> {
        Self::new(DESKTOP_UA, 1920.0, 1080.0)
    }

    pub fn phone(width: f64, height: f64) -> Rc<Self> {
        Self::new(IPHONE_UA, width, height)
    }

    pub fn adapter(self: &Rc<Self>) -> Rc<TestAdapter> {
        ViewportAdapter::new(self.clone(), AdapterConfig::default())
    }

    pub fn add_member(&self, target: Target, name: &str) {
        self.members.borrow_mut().insert((target, name.to_string()));
    }

    pub fn set_truthy(&self, target: Target, name: &str) {
        self.truthy.borrow_mut().insert((target, name.to_string()));
    }

    /// `screen.orientation.lock`
    pub fn with_orientation_lock(self: Rc<Self>) -> Rc<Self> {
        self.add_member(Target::ScreenOrientation, "lock");
        self
    }

    /// `document.fullscreenEnabled` plus `documentElement.requestFullscreen`.
    pub fn with_fullscreen(self: Rc<Self>) -> Rc<Self> {
        self.set_truthy(Target::Document, "fullscreenEnabled");
        self.add_member(Target::DocumentElement, "requestFullscreen");
        self
    }

    /// Every call to `method` fails.
    pub fn reject(&self, method: &str) {
        self.rejecting.borrow_mut().insert(method.to_string());
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.set(loading);
    }

    pub fn calls(&self) -> Vec<(Target, String, Vec<String>)> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(_, name, _)| name == method)
            .count()
    }

    /// Runs spawned request futures until none can make progress.
    pub fn run_tasks(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    pub fn count_elements(&self, id: &str) -> usize {
        self.elements.borrow().iter().filter(|e| e.id == id).count()
    }

    pub fn overlay(&self, id: &str) -> Option<OverlaySpec> {
        self.elements.borrow().iter().find(|e| e.id == id).cloned()
    }

    pub fn styles(&self) -> Vec<String> {
        self.styles.borrow().clone()
    }

    /// Number of DOM insertions and removals so far.
    pub fn mutations(&self) -> usize {
        self.mutations.get()
    }

    pub fn listener_count(&self, source: EventSource, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .values()
            .filter(|(s, k, _)| *s == source && *k == kind)
            .count()
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Fires `kind` on `source`. Listeners removed by an earlier callback of
    /// the same dispatch are skipped, listeners added during it are not run.
    pub fn dispatch(&self, source: EventSource, kind: EventKind) {
        let snapshot: Vec<_> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, (s, k, _))| *s == source && *k == kind)
            .map(|(id, (_, _, callback))| (*id, callback.clone()))
            .collect();
        for (id, callback) in snapshot {
            if self.listeners.borrow().contains_key(&id) {
                callback();
            }
        }
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.viewport.set(Viewport::new(width, height));
        self.dispatch(EventSource::Window, EventKind::Resize);
    }

    /// A touch produces `touchstart` and then a synthesized `click`.
    pub fn tap(&self) {
        self.dispatch(EventSource::Document, EventKind::TouchStart);
        self.dispatch(EventSource::Document, EventKind::Click);
    }

    pub fn click(&self) {
        self.dispatch(EventSource::Document, EventKind::Click);
    }

    pub fn finish_loading(&self) {
        self.loading.set(false);
        self.dispatch(EventSource::Document, EventKind::DomContentLoaded);
        self.dispatch(EventSource::Window, EventKind::Load);
    }

    /// Moves the virtual clock forward, firing due timers in order.
    pub fn advance(&self, by: Duration) {
        let until = self.now.get() + by;
        loop {
            let due = self
                .timers
                .borrow()
                .iter()
                .filter(|(_, (at, _))| *at <= until)
                .min_by_key(|(id, (at, _))| (*at, **id))
                .map(|(id, (at, _))| (*id, *at));
            let Some((id, at)) = due else {
                break;
            };
            self.now.set(at);
            let timer = self.timers.borrow_mut().remove(&id);
            if let Some((_, callback)) = timer {
                callback();
            }
        }
        self.now.set(until);
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

impl Host for FakeHost {
    fn user_agent(&self) -> String {
        self.user_agent.borrow().clone()
    }

    fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    fn has_member(&self, target: Target, name: &str) -> bool {
        self.members
            .borrow()
            .contains(&(target, name.to_string()))
    }

    fn is_truthy(&self, target: Target, name: &str) -> bool {
        self.truthy.borrow().contains(&(target, name.to_string()))
    }

    fn invoke(&self, target: Target, method: &str, args: &[&str]) -> Pending {
        self.calls.borrow_mut().push((
            target,
            method.to_string(),
            args.iter().map(|a| a.to_string()).collect(),
        ));
        let result = if !self.has_member(target, method) {
            Err(anyhow::anyhow!("TypeError: {} is not a function", method))
        } else if self.rejecting.borrow().contains(method) {
            Err(anyhow::anyhow!("NotSupportedError: {} is not supported", method))
        } else {
            Ok(())
        };
        Box::pin(future::ready(result))
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        self.pool
            .borrow()
            .spawner()
            .spawn_local(task)
            .expect("local pool accepts tasks");
    }

    fn remove_element(&self, id: &str) -> bool {
        let mut elements = self.elements.borrow_mut();
        let before = elements.len();
        elements.retain(|e| e.id != id);
        let removed = elements.len() != before;
        if removed {
            self.mutations.set(self.mutations.get() + 1);
        }
        removed
    }

    fn append_overlay(&self, overlay: &OverlaySpec) -> anyhow::Result<()> {
        self.elements.borrow_mut().push(overlay.clone());
        self.mutations.set(self.mutations.get() + 1);
        Ok(())
    }

    fn inject_style(&self, css: &str) -> anyhow::Result<()> {
        self.styles.borrow_mut().push(css.to_string());
        self.mutations.set(self.mutations.get() + 1);
        Ok(())
    }

    fn listen(
        &self,
        source: EventSource,
        kind: EventKind,
        callback: Callback,
    ) -> anyhow::Result<ListenerId> {
        let id = self.next_id();
        self.listeners
            .borrow_mut()
            .insert(id, (source, kind, callback));
        Ok(ListenerId(id))
    }

    fn unlisten(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(&id.0);
    }

    fn set_timeout(
        &self,
        delay: Duration,
        callback: Box<dyn FnOnce()>,
    ) -> anyhow::Result<TimerId> {
        let id = self.next_id();
        self.timers
            .borrow_mut()
            .insert(id, (self.now.get() + delay, callback));
        Ok(TimerId(id))
    }

    fn clear_timeout(&self, id: TimerId) {
        self.timers.borrow_mut().remove(&id.0);
    }

    fn is_loading(&self) -> bool {
        self.loading.get()
    }
}

/// Log records captured on the current test thread.
pub(crate) struct CapturingLogger;

thread_local! {
    static RECORDS: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

static LOGGER: CapturingLogger = CapturingLogger;
static INSTALL: Once = Once::new();

impl log::Log for CapturingLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        RECORDS.with(|records| {
            records
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

impl CapturingLogger {
    pub fn install() {
        INSTALL.call_once(|| {
            log::set_logger(&LOGGER).expect("no other logger in this test binary");
            log::set_max_level(log::LevelFilter::Trace);
        });
        RECORDS.with(|records| records.borrow_mut().clear());
    }

    pub fn records() -> Vec<(log::Level, String)> {
        RECORDS.with(|records| records.borrow().clone())
    }
}
