//! # Signals, slots, and effects
//!
//! Perch hooks are plain functions that run inside a composition pass. The
//! core gives them three things:
//!
//! - `Signal<T>` — observable, reactive value.
//! - `remember*` — lifecycle-aware storage bound to the composition.
//! - `effect` / `scoped_effect` / `disposable_effect` — side-effects with
//!   cleanup.
//!
//! ## Signals
//!
//! `Signal<T>` is a cloneable handle to a piece of state:
//!
//! ```rust
//! use perch_core::*;
//!
//! let count = signal(0);
//! count.set(1);
//! count.update(|v| *v += 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! Subscribers registered with `subscribe` run synchronously on every write
//! and can be removed with `unsubscribe` — hooks detach their listeners when
//! the owning composition unmounts.
//!
//! ## Remembered state
//!
//! Hook state lives in `remember*` slots rather than globals:
//!
//! ```rust
//! use perch_core::*;
//!
//! let composition = Composition::new();
//! let first = composition.compose(|| *remember(|| 7));
//! let second = composition.compose(|| *remember(|| 99));
//! assert_eq!(first, 7);
//! assert_eq!(second, 7); // same slot, init runs once
//! composition.unmount();
//! ```
//!
//! - `remember` and `remember_state` are order-based: the Nth call in a pass
//!   always refers to the Nth stored value.
//! - `remember_with_key` and `remember_state_with_key` are key-based and
//!   stable across conditional composition.
//!
//! ## Effects and cleanup
//!
//! `disposable_effect` is the workhorse: it re-runs when its key changes and
//! runs the final cleanup when the composition unmounts.
//!
//! ```rust
//! use perch_core::*;
//!
//! let composition = Composition::new();
//! composition.compose(|| {
//!     disposable_effect("subscription", || {
//!         log::debug!("attach");
//!         on_unmount(|| log::debug!("detach"))
//!     });
//! });
//! composition.unmount(); // detach runs here, exactly once
//! ```

pub mod clock;
pub mod effects;
pub mod locals;
pub mod prelude;
pub mod runtime;
pub mod scope;
pub mod signal;
pub mod tests;

pub use effects::*;
pub use locals::*;
pub use prelude::*;
pub use runtime::*;
pub use scope::*;
pub use signal::*;
