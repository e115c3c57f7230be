//! Scripted in-process platform.
//!
//! Every capability is implemented against plain in-memory state, and every
//! asynchronous source is driven explicitly from the outside: tests (and
//! the demo) decide when an element intersects, when an image settles, when
//! the window resizes, and how far the clock moves. Nothing fires on its
//! own.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use perch_core::clock::{Clock, ManualClock};
use slotmap::SlotMap;
use smallvec::SmallVec;
use web_time::{Duration, Instant};

use crate::cookies::{CookieJar, CookieOptions};
use crate::document::{DocumentHost, MemoryDocument, NodeId};
use crate::events::{
    FocusListenerId, FocusSource, ResizeListenerId, TimerHost, TimerId, WindowHost, WindowMetrics,
};
use crate::image::{ImageHandle, ImageTransport, LoadError};
use crate::intersection::{IntersectionEntry, IntersectionSource, ObservationId};
use crate::platform::Platform;
use crate::storage::{StorageArea, StorageAreaKind, StorageError, StorageEvent, StorageListenerId};

/// Scripted platform for tests and demos.
pub struct Headless {
    document: Rc<MemoryDocument>,
    local: Rc<MemoryStorage>,
    session: Rc<MemoryStorage>,
    cookies: Rc<MemoryCookies>,
    intersection: Rc<ScriptedIntersection>,
    focus: Rc<ScriptedFocus>,
    window: Rc<ScriptedWindow>,
    clock: Rc<ManualClock>,
    timers: Rc<ScriptedTimers>,
    images: Rc<ScriptedImages>,
}

impl Headless {
    pub fn new() -> Rc<Self> {
        let clock = Rc::new(ManualClock::new());
        Rc::new(Self {
            document: Rc::new(MemoryDocument::new()),
            local: Rc::new(MemoryStorage::new(StorageAreaKind::Local)),
            session: Rc::new(MemoryStorage::new(StorageAreaKind::Session)),
            cookies: Rc::new(MemoryCookies::default()),
            intersection: Rc::new(ScriptedIntersection::default()),
            focus: Rc::new(ScriptedFocus::default()),
            window: Rc::new(ScriptedWindow::new()),
            timers: Rc::new(ScriptedTimers::new(clock.clone())),
            clock,
            images: ScriptedImages::new(),
        })
    }

    /// The document tree, with the inspection surface tests use.
    pub fn dom(&self) -> Rc<MemoryDocument> {
        self.document.clone()
    }

    // --- storage scripting ---

    fn area(&self, kind: StorageAreaKind) -> &MemoryStorage {
        match kind {
            StorageAreaKind::Local => &self.local,
            StorageAreaKind::Session => &self.session,
        }
    }

    /// Caps an area at `bytes` of key + value payload; `None` lifts the cap.
    pub fn set_quota(&self, kind: StorageAreaKind, bytes: Option<usize>) {
        self.area(kind).quota.set(bytes);
    }

    /// Chooses which raw failure signature an over-quota write reports.
    pub fn set_quota_signature(&self, kind: StorageAreaKind, code: Option<u32>, name: &str) {
        *self.area(kind).failure.borrow_mut() = (code, name.to_string());
    }

    /// The raw stored text for a key, bypassing the hook layer.
    pub fn stored(&self, kind: StorageAreaKind, key: &str) -> Option<String> {
        self.area(kind).items.borrow().get(key).cloned()
    }

    pub fn store_raw(&self, kind: StorageAreaKind, key: &str, value: &str) {
        self.area(kind)
            .items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    /// Simulates a write from another context: applies it to the area and
    /// broadcasts the change notification.
    pub fn emit_storage_event(&self, kind: StorageAreaKind, key: &str, new_value: Option<&str>) {
        self.area(kind).external_write(key, new_value);
    }

    // --- event scripting ---

    pub fn focus_node(&self, node: Option<NodeId>) {
        self.focus.drive(node);
    }

    pub fn resize_to(&self, width: u32, height: u32) {
        self.window.drive(|m| {
            m.outer_width = width;
            m.outer_height = height;
        });
    }

    pub fn move_to(&self, top: i32, left: i32) {
        self.window.drive(|m| {
            m.screen_top = top;
            m.screen_left = left;
        });
    }

    pub fn set_intersecting(&self, target: NodeId, is_intersecting: bool) {
        self.intersection.drive(target, is_intersecting);
    }

    pub fn observation_count(&self) -> usize {
        self.intersection.observations.borrow().len()
    }

    // --- images ---

    /// Declares the fetch result for a URL; pending and future loads of it
    /// succeed with these dimensions once pumped.
    pub fn stage_image(&self, url: &str, width: u32, height: u32) {
        self.images
            .staged
            .borrow_mut()
            .insert(url.to_string(), Ok((width, height)));
    }

    pub fn stage_image_failure(&self, url: &str, reason: &str) {
        self.images
            .staged
            .borrow_mut()
            .insert(url.to_string(), Err(reason.to_string()));
    }

    /// Settles every pending load against the staged results. Unstaged URLs
    /// fail.
    pub fn pump_images(&self) {
        self.images.pump();
    }

    pub fn pending_image_count(&self) -> usize {
        self.images.pending.borrow().len()
    }

    // --- time ---

    /// Moves the clock forward and fires every timer that came due, in
    /// deadline order.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
        self.timers.fire_due();
    }

    pub fn pending_timer_count(&self) -> usize {
        self.timers.timers.borrow().len()
    }
}

impl Platform for Headless {
    fn document(&self) -> Rc<dyn DocumentHost> {
        self.document.clone()
    }
    fn storage(&self, kind: StorageAreaKind) -> Rc<dyn StorageArea> {
        match kind {
            StorageAreaKind::Local => self.local.clone(),
            StorageAreaKind::Session => self.session.clone(),
        }
    }
    fn cookies(&self) -> Rc<dyn CookieJar> {
        self.cookies.clone()
    }
    fn intersection(&self) -> Rc<dyn IntersectionSource> {
        self.intersection.clone()
    }
    fn focus(&self) -> Rc<dyn FocusSource> {
        self.focus.clone()
    }
    fn window(&self) -> Rc<dyn WindowHost> {
        self.window.clone()
    }
    fn timers(&self) -> Rc<dyn TimerHost> {
        self.timers.clone()
    }
    fn images(&self) -> Rc<dyn ImageTransport> {
        self.images.clone()
    }
}

// --- storage ---

struct MemoryStorage {
    kind: StorageAreaKind,
    items: RefCell<HashMap<String, String>>,
    quota: Cell<Option<usize>>,
    // raw (code, name) signature reported when the quota trips
    failure: RefCell<(Option<u32>, String)>,
    listeners: RefCell<SlotMap<StorageListenerId, Rc<dyn Fn(&StorageEvent)>>>,
}

impl MemoryStorage {
    fn new(kind: StorageAreaKind) -> Self {
        Self {
            kind,
            items: RefCell::new(HashMap::new()),
            quota: Cell::new(None),
            failure: RefCell::new((Some(22), "QuotaExceededError".to_string())),
            listeners: RefCell::new(SlotMap::with_key()),
        }
    }

    fn used_bytes(items: &HashMap<String, String>) -> usize {
        items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn external_write(&self, key: &str, new_value: Option<&str>) {
        let old_value = {
            let mut items = self.items.borrow_mut();
            match new_value {
                Some(v) => items.insert(key.to_string(), v.to_string()),
                None => items.remove(key),
            }
        };
        let event = StorageEvent {
            key: key.to_string(),
            old_value,
            new_value: new_value.map(str::to_string),
            area: self.kind,
        };
        self.broadcast(&event);
    }

    fn broadcast(&self, event: &StorageEvent) {
        let listeners: Vec<_> = self.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(event);
        }
    }
}

impl StorageArea for MemoryStorage {
    fn kind(&self) -> StorageAreaKind {
        self.kind
    }

    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.borrow_mut();
        if let Some(quota) = self.quota.get() {
            let existing = items.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let projected = Self::used_bytes(&items) - existing + key.len() + value.len();
            if projected > quota {
                let (code, name) = self.failure.borrow().clone();
                return Err(StorageError::classify(code, &name));
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }

    fn subscribe(&self, listener: Rc<dyn Fn(&StorageEvent)>) -> StorageListenerId {
        self.listeners.borrow_mut().insert(listener)
    }

    fn unsubscribe(&self, id: StorageListenerId) {
        self.listeners.borrow_mut().remove(id);
    }
}

// --- cookies ---

#[derive(Default)]
struct MemoryCookies {
    jar: RefCell<HashMap<String, String>>,
}

impl CookieJar for MemoryCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.jar.borrow().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str, _options: &CookieOptions) {
        self.jar
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    fn remove(&self, name: &str, _options: &CookieOptions) {
        self.jar.borrow_mut().remove(name);
    }
}

// --- intersection ---

struct Observation {
    target: NodeId,
    deliver: Rc<dyn Fn(&[IntersectionEntry])>,
}

#[derive(Default)]
struct ScriptedIntersection {
    observations: RefCell<SlotMap<ObservationId, Observation>>,
}

impl ScriptedIntersection {
    fn drive(&self, target: NodeId, is_intersecting: bool) {
        let delivers: Vec<_> = self
            .observations
            .borrow()
            .values()
            .filter(|obs| obs.target == target)
            .map(|obs| obs.deliver.clone())
            .collect();
        let batch: SmallVec<[IntersectionEntry; 4]> = smallvec::smallvec![IntersectionEntry {
            target,
            is_intersecting,
        }];
        for deliver in delivers {
            deliver(&batch);
        }
    }
}

impl IntersectionSource for ScriptedIntersection {
    fn observe(&self, target: NodeId, deliver: Rc<dyn Fn(&[IntersectionEntry])>) -> ObservationId {
        self.observations
            .borrow_mut()
            .insert(Observation { target, deliver })
    }

    fn unobserve(&self, id: ObservationId) {
        self.observations.borrow_mut().remove(id);
    }
}

// --- focus ---

#[derive(Default)]
struct ScriptedFocus {
    active: Cell<Option<NodeId>>,
    listeners: RefCell<SlotMap<FocusListenerId, Rc<dyn Fn(Option<NodeId>)>>>,
}

impl ScriptedFocus {
    fn drive(&self, node: Option<NodeId>) {
        self.active.set(node);
        let listeners: Vec<_> = self.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(node);
        }
    }
}

impl FocusSource for ScriptedFocus {
    fn active(&self) -> Option<NodeId> {
        self.active.get()
    }

    fn subscribe(&self, listener: Rc<dyn Fn(Option<NodeId>)>) -> FocusListenerId {
        self.listeners.borrow_mut().insert(listener)
    }

    fn unsubscribe(&self, id: FocusListenerId) {
        self.listeners.borrow_mut().remove(id);
    }
}

// --- window ---

struct ScriptedWindow {
    metrics: Cell<WindowMetrics>,
    listeners: RefCell<SlotMap<ResizeListenerId, Rc<dyn Fn(&WindowMetrics)>>>,
}

impl ScriptedWindow {
    fn new() -> Self {
        Self {
            metrics: Cell::new(WindowMetrics {
                outer_width: 1280,
                outer_height: 800,
                screen_top: 0,
                screen_left: 0,
            }),
            listeners: RefCell::new(SlotMap::with_key()),
        }
    }

    fn drive(&self, change: impl FnOnce(&mut WindowMetrics)) {
        let mut metrics = self.metrics.get();
        change(&mut metrics);
        self.metrics.set(metrics);

        let listeners: Vec<_> = self.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(&metrics);
        }
    }
}

impl WindowHost for ScriptedWindow {
    fn metrics(&self) -> Option<WindowMetrics> {
        Some(self.metrics.get())
    }

    fn subscribe(&self, listener: Rc<dyn Fn(&WindowMetrics)>) -> ResizeListenerId {
        self.listeners.borrow_mut().insert(listener)
    }

    fn unsubscribe(&self, id: ResizeListenerId) {
        self.listeners.borrow_mut().remove(id);
    }
}

// --- timers ---

struct PendingTimer {
    deadline: Instant,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

struct ScriptedTimers {
    clock: Rc<ManualClock>,
    timers: RefCell<SlotMap<TimerId, PendingTimer>>,
    seq: Cell<u64>,
}

impl ScriptedTimers {
    fn new(clock: Rc<ManualClock>) -> Self {
        Self {
            clock,
            timers: RefCell::new(SlotMap::with_key()),
            seq: Cell::new(0),
        }
    }

    // Callbacks run outside the borrow so they may schedule or cancel
    // timers themselves.
    fn fire_due(&self) {
        loop {
            let now = self.clock.now();
            let next = self
                .timers
                .borrow()
                .iter()
                .filter(|(_, p)| p.deadline <= now)
                .min_by_key(|(_, p)| (p.deadline, p.seq))
                .map(|(key, _)| key);
            let Some(key) = next else { break };
            let Some(pending) = self.timers.borrow_mut().remove(key) else {
                break;
            };
            (pending.callback)();
        }
    }
}

impl TimerHost for ScriptedTimers {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        self.timers.borrow_mut().insert(PendingTimer {
            deadline: self.clock.now() + delay,
            seq,
            callback,
        })
    }

    fn cancel(&self, id: TimerId) {
        self.timers.borrow_mut().remove(id);
    }
}

// --- images ---

struct ScriptedImages {
    self_ref: Weak<ScriptedImages>,
    staged: RefCell<HashMap<String, Result<(u32, u32), String>>>,
    pending: RefCell<Vec<(ImageHandle, String)>>,
}

impl ScriptedImages {
    fn new() -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            self_ref: weak.clone(),
            staged: RefCell::new(HashMap::new()),
            pending: RefCell::new(Vec::new()),
        })
    }

    fn pump(&self) {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        for (handle, url) in pending {
            let outcome = match self.staged.borrow().get(&url) {
                Some(Ok(size)) => Ok(*size),
                Some(Err(reason)) => Err(LoadError::Failed(reason.clone())),
                None => Err(LoadError::Failed(format!("no response staged for {url}"))),
            };
            handle.settle(outcome);
        }
    }
}

impl ImageTransport for ScriptedImages {
    fn create(&self) -> ImageHandle {
        let weak: Weak<dyn ImageTransport> = self.self_ref.clone();
        ImageHandle::new(weak)
    }

    fn begin(&self, handle: &ImageHandle, url: &str) {
        log::trace!("image fetch queued: {url}");
        self.pending
            .borrow_mut()
            .push((handle.clone(), url.to_string()));
    }
}
