//! # Platform capabilities
//!
//! Hooks never touch an environment global directly. Every browser-ish
//! primitive (key-value storage, cookies, the document tree, intersection
//! observation, focus and resize events, timers, image fetching) is a trait
//! here, bundled behind [`Platform`] and injected with [`with_platform`] as
//! a composition local. That keeps the hooks testable without process-wide
//! mocking: compose against a [`Headless`] platform and script it.
//!
//! When no platform is installed, [`current_platform`] hands back a
//! degraded fallback that logs and reports failure through the normal
//! channels instead of panicking — a hook composed in an unsupported
//! environment still settles into a well-defined state.
//!
//! Everything in this crate is single-threaded: capabilities are `Rc`-held
//! and callbacks run on the composing thread's event loop.

pub mod cookies;
pub mod document;
pub mod events;
pub mod headless;
pub mod image;
pub mod intersection;
pub mod platform;
pub mod storage;

pub use cookies::{CookieJar, CookieOptions};
pub use document::{DocumentHost, MemoryDocument, NodeId};
pub use events::{
    FocusListenerId, FocusSource, ResizeListenerId, TimerHost, TimerId, WindowHost, WindowMetrics,
};
pub use headless::Headless;
pub use image::{ImageHandle, ImageTransport, LoadError, LoadResult};
pub use intersection::{IntersectionEntry, IntersectionSource, ObservationId};
pub use platform::{Platform, current_platform, with_platform};
pub use storage::{StorageArea, StorageAreaKind, StorageError, StorageEvent, StorageListenerId};
