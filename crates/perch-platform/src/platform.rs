use std::cell::RefCell;
use std::rc::Rc;

use web_time::Duration;

use crate::cookies::{CookieJar, CookieOptions};
use crate::document::{DocumentHost, MemoryDocument, NodeId};
use crate::events::{
    FocusListenerId, FocusSource, ResizeListenerId, TimerHost, TimerId, WindowHost, WindowMetrics,
};
use crate::image::{ImageHandle, ImageTransport};
use crate::intersection::{IntersectionEntry, IntersectionSource, ObservationId};
use crate::storage::{StorageArea, StorageAreaKind, StorageError, StorageEvent, StorageListenerId};

/// The capability bundle hooks resolve their environment from.
pub trait Platform {
    fn document(&self) -> Rc<dyn DocumentHost>;
    fn storage(&self, kind: StorageAreaKind) -> Rc<dyn StorageArea>;
    fn cookies(&self) -> Rc<dyn CookieJar>;
    fn intersection(&self) -> Rc<dyn IntersectionSource>;
    fn focus(&self) -> Rc<dyn FocusSource>;
    fn window(&self) -> Rc<dyn WindowHost>;
    fn timers(&self) -> Rc<dyn TimerHost>;
    fn images(&self) -> Rc<dyn ImageTransport>;
}

// Locals carry concrete Clone types; this wraps the trait object.
#[derive(Clone)]
struct PlatformHandle(Rc<dyn Platform>);

/// Installs `platform` as the composition's environment for the duration of
/// `f`.
pub fn with_platform<R>(platform: Rc<dyn Platform>, f: impl FnOnce() -> R) -> R {
    perch_core::locals::with_local(PlatformHandle(platform), f)
}

/// The installed platform, or the degraded fallback when none is installed
/// (server-side composition, tests that forgot `with_platform`, ...).
pub fn current_platform() -> Rc<dyn Platform> {
    if let Some(handle) = perch_core::locals::local::<PlatformHandle>() {
        return handle.0;
    }
    UNSUPPORTED.with(|cell| {
        cell.borrow_mut()
            .get_or_insert_with(|| Rc::new(Unsupported::new()))
            .clone()
    })
}

thread_local! {
    static UNSUPPORTED: RefCell<Option<Rc<Unsupported>>> = const { RefCell::new(None) };
}

/// Fallback platform for environments with none of the capabilities.
/// Nothing panics: reads come back empty, writes fail through the normal
/// error channels, events never fire. The document is a private in-memory
/// tree so portal consumers still receive a container.
struct Unsupported {
    document: Rc<MemoryDocument>,
    local: Rc<NoStorage>,
    session: Rc<NoStorage>,
    cookies: Rc<NoCookies>,
    intersection: Rc<NoIntersection>,
    focus: Rc<NoFocus>,
    window: Rc<NoWindow>,
    timers: Rc<NoTimers>,
    images: Rc<NoImages>,
}

impl Unsupported {
    fn new() -> Self {
        Self {
            document: Rc::new(MemoryDocument::new()),
            local: Rc::new(NoStorage(StorageAreaKind::Local)),
            session: Rc::new(NoStorage(StorageAreaKind::Session)),
            cookies: Rc::new(NoCookies),
            intersection: Rc::new(NoIntersection),
            focus: Rc::new(NoFocus),
            window: Rc::new(NoWindow),
            timers: Rc::new(NoTimers),
            images: Rc::new(NoImages),
        }
    }
}

impl Platform for Unsupported {
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

struct NoStorage(StorageAreaKind);

impl StorageArea for NoStorage {
    fn kind(&self) -> StorageAreaKind {
        self.0
    }
    fn get(&self, _key: &str) -> Option<String> {
        log::error!("key-value storage is not supported in this environment");
        None
    }
    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
    fn remove(&self, _key: &str) {}
    fn subscribe(&self, _listener: Rc<dyn Fn(&StorageEvent)>) -> StorageListenerId {
        StorageListenerId::default()
    }
    fn unsubscribe(&self, _id: StorageListenerId) {}
}

struct NoCookies;

impl CookieJar for NoCookies {
    fn get(&self, _name: &str) -> Option<String> {
        log::error!("cookies are not supported in this environment");
        None
    }
    fn set(&self, _name: &str, _value: &str, _options: &CookieOptions) {}
    fn remove(&self, _name: &str, _options: &CookieOptions) {}
}

struct NoIntersection;

impl IntersectionSource for NoIntersection {
    fn observe(
        &self,
        _target: NodeId,
        _deliver: Rc<dyn Fn(&[IntersectionEntry])>,
    ) -> ObservationId {
        log::debug!("intersection observation unsupported; target stays invisible");
        ObservationId::default()
    }
    fn unobserve(&self, _id: ObservationId) {}
}

struct NoFocus;

impl FocusSource for NoFocus {
    fn active(&self) -> Option<NodeId> {
        None
    }
    fn subscribe(&self, _listener: Rc<dyn Fn(Option<NodeId>)>) -> FocusListenerId {
        FocusListenerId::default()
    }
    fn unsubscribe(&self, _id: FocusListenerId) {}
}

struct NoWindow;

impl WindowHost for NoWindow {
    fn metrics(&self) -> Option<WindowMetrics> {
        None
    }
    fn subscribe(&self, _listener: Rc<dyn Fn(&WindowMetrics)>) -> ResizeListenerId {
        ResizeListenerId::default()
    }
    fn unsubscribe(&self, _id: ResizeListenerId) {}
}

struct NoTimers;

impl TimerHost for NoTimers {
    fn schedule(&self, _delay: Duration, _callback: Box<dyn FnOnce()>) -> TimerId {
        log::error!("timers are not supported in this environment; callback dropped");
        TimerId::default()
    }
    fn cancel(&self, _id: TimerId) {}
}

struct NoImages;

impl ImageTransport for NoImages {
    fn create(&self) -> ImageHandle {
        ImageHandle::detached()
    }
    fn begin(&self, handle: &ImageHandle, _url: &str) {
        handle.settle(Err(crate::image::LoadError::Unsupported));
    }
}
