use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

new_key_type! {
    /// Key returned by [`Signal::subscribe`]; pass it back to `unsubscribe`.
    pub struct SubId;
}

/// Cloneable handle to an observable value.
pub struct Signal<T: 'static>(Rc<RefCell<Inner<T>>>);

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

struct Inner<T> {
    value: T,
    subs: SlotMap<SubId, Rc<dyn Fn(&T)>>,
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            value,
            subs: SlotMap::with_key(),
        })))
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().value.clone()
    }

    /// Read the value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow().value)
    }

    pub fn set(&self, v: T)
    where
        T: Clone,
    {
        self.0.borrow_mut().value = v;
        self.notify();
    }

    pub fn update<F: FnOnce(&mut T)>(&self, f: F)
    where
        T: Clone,
    {
        f(&mut self.0.borrow_mut().value);
        self.notify();
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        self.0.borrow_mut().subs.insert(Rc::new(f))
    }

    /// Removes a subscriber. Unknown or already-removed ids are ignored.
    pub fn unsubscribe(&self, id: SubId) {
        self.0.borrow_mut().subs.remove(id);
    }

    // The value and subscriber list are cloned out of the borrow before
    // delivery so a subscriber may read or write signals (including this
    // one) re-entrantly.
    fn notify(&self)
    where
        T: Clone,
    {
        let (value, subs) = {
            let inner = self.0.borrow();
            let subs: SmallVec<[Rc<dyn Fn(&T)>; 4]> = inner.subs.values().cloned().collect();
            (inner.value.clone(), subs)
        };
        for sub in subs {
            sub(&value);
        }
    }
}

pub fn signal<T>(t: T) -> Signal<T> {
    Signal::new(t)
}
