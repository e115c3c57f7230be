use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::scope::Scope;

thread_local! {
    static CURRENT_COMPOSER: RefCell<Vec<Rc<RefCell<Composer>>>> = const { RefCell::new(Vec::new()) };
    // hooks called outside any composition still get working (leaked) slots
    static FALLBACK_COMPOSER: Rc<RefCell<Composer>> = Rc::new(RefCell::new(Composer::default()));
}

/// Slot storage for `remember*`. Each [`Composition`] owns one; the active
/// composer is installed for the duration of a pass.
#[derive(Default)]
pub struct Composer {
    slots: Vec<Box<dyn Any>>,
    cursor: usize,
    keyed_slots: HashMap<String, Box<dyn Any>>,
}

impl Composer {
    fn clear(&mut self) {
        self.slots.clear();
        self.keyed_slots.clear();
        self.cursor = 0;
    }
}

fn current_composer() -> Rc<RefCell<Composer>> {
    CURRENT_COMPOSER
        .with(|stack| stack.borrow().last().cloned())
        .unwrap_or_else(|| FALLBACK_COMPOSER.with(Rc::clone))
}

/// A mounted composition: slot storage plus one scope that survives across
/// passes until `unmount`.
pub struct Composition {
    composer: Rc<RefCell<Composer>>,
    scope: Scope,
}

impl Composition {
    pub fn new() -> Self {
        Self {
            composer: Rc::new(RefCell::new(Composer::default())),
            scope: Scope::new(),
        }
    }

    /// Runs one composition pass. Hooks called inside `f` see the same slot
    /// sequence and the same scope on every pass.
    pub fn compose<R>(&self, f: impl FnOnce() -> R) -> R {
        self.composer.borrow_mut().cursor = 0;

        // pop-on-drop so a panicking pass cannot leave this composer
        // installed
        struct Guard;
        impl Drop for Guard {
            fn drop(&mut self) {
                CURRENT_COMPOSER.with(|stack| {
                    stack.borrow_mut().pop();
                });
            }
        }
        CURRENT_COMPOSER.with(|stack| stack.borrow_mut().push(self.composer.clone()));
        let _guard = Guard;

        self.scope.run(f)
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Tears the composition down: runs every registered cleanup and frees
    /// the slots.
    pub fn unmount(self) {
        self.scope.dispose();
        self.composer.borrow_mut().clear();
    }
}

impl Default for Composition {
    fn default() -> Self {
        Self::new()
    }
}

/// Slot-based remember (sequential composition only).
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    let composer = current_composer();
    let mut c = composer.borrow_mut();
    let cursor = c.cursor;
    c.cursor += 1;

    if cursor >= c.slots.len() {
        let rc: Rc<T> = Rc::new(init());
        c.slots.push(Box::new(rc.clone()));
        return rc;
    }

    if let Some(rc) = c.slots[cursor].downcast_ref::<Rc<T>>() {
        rc.clone()
    } else {
        log::warn!(
            "remember: slot {cursor} changed type; replacing. \
             For conditional composition prefer remember_with_key."
        );
        let rc: Rc<T> = Rc::new(init());
        c.slots[cursor] = Box::new(rc.clone());
        rc
    }
}

/// Key-based remember, stable across conditional branches.
pub fn remember_with_key<T: 'static>(key: impl Into<String>, init: impl FnOnce() -> T) -> Rc<T> {
    let composer = current_composer();
    let mut c = composer.borrow_mut();
    let key = key.into();

    if let Some(existing) = c.keyed_slots.get(&key) {
        if let Some(rc) = existing.downcast_ref::<Rc<T>>() {
            return rc.clone();
        }
        log::warn!("remember_with_key: key '{key}' reused with a different type; replacing.");
    }

    let rc: Rc<T> = Rc::new(init());
    c.keyed_slots.insert(key, Box::new(rc.clone()));
    rc
}

pub fn remember_state<T: 'static>(init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    remember(|| RefCell::new(init()))
}

pub fn remember_state_with_key<T: 'static>(
    key: impl Into<String>,
    init: impl FnOnce() -> T,
) -> Rc<RefCell<T>> {
    remember_with_key(key, || RefCell::new(init()))
}
