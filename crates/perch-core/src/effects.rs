use std::cell::RefCell;
use std::rc::Rc;

use crate::runtime::remember;
use crate::scope::scoped_effect;

/// Cleanup guard that runs at most once, no matter how often `run` is
/// called. Detach-exactly-once contracts (observers, listeners, timers) hang
/// off this.
#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// A guard with nothing to clean up.
    pub fn noop() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    pub fn run(&self) {
        if let Some(f) = self.0.borrow_mut().take() {
            f()
        }
    }
}

/// Runs `f()` immediately and returns its `Dispose`, auto-registering the
/// cleanup with the current scope if one exists.
pub fn effect<F>(f: F) -> Dispose
where
    F: FnOnce() -> Dispose + 'static,
{
    let d = f();

    if let Some(scope) = crate::scope::current_scope() {
        let d2 = d.clone();
        scope.add_disposer(move || d2.run());
    }

    d
}

/// Helper to build the cleanup returned from an effect.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}

/// Keyed effect: runs `f` on the first pass and again whenever `key`
/// changes (after running the previous cleanup); the last cleanup runs on
/// unmount.
pub fn disposable_effect<K: PartialEq + Clone + 'static>(
    key: K,
    f: impl FnOnce() -> Dispose + 'static,
) {
    let last_key = remember(|| RefCell::new(None::<K>));
    let cleanup_slot = remember(|| RefCell::new(None::<Dispose>));
    let installed = remember(|| RefCell::new(false));

    // One unmount disposer per callsite, registered on the first pass.
    if !*installed.borrow() {
        *installed.borrow_mut() = true;
        let cleanup_slot = cleanup_slot.clone();
        scoped_effect(move || {
            Box::new(move || {
                if let Some(d) = cleanup_slot.borrow_mut().take() {
                    d.run();
                }
            })
        });
    }

    let changed = last_key.borrow().as_ref() != Some(&key);
    if changed {
        *last_key.borrow_mut() = Some(key);

        if let Some(d) = cleanup_slot.borrow_mut().take() {
            d.run();
        }

        *cleanup_slot.borrow_mut() = Some(f());
    }
}

/// Runs on every composition pass.
pub fn side_effect(f: impl Fn()) {
    f();
}
