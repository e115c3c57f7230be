//! Typed composition locals.
//!
//! A local is any `Clone + 'static` value pushed for the duration of a
//! closure; lookups search frames innermost-first. Perch uses this to inject
//! the platform bundle without process-wide globals, so tests can substitute
//! a scripted platform per composition:
//!
//! ```rust
//! use perch_core::locals::{local, with_local};
//!
//! #[derive(Clone, PartialEq, Debug)]
//! struct Flavor(&'static str);
//!
//! with_local(Flavor("outer"), || {
//!     assert_eq!(local::<Flavor>(), Some(Flavor("outer")));
//!     with_local(Flavor("inner"), || {
//!         assert_eq!(local::<Flavor>(), Some(Flavor("inner")));
//!     });
//! });
//! assert_eq!(local::<Flavor>(), None);
//! ```

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static LOCALS_STACK: RefCell<Vec<HashMap<TypeId, Box<dyn Any>>>> = RefCell::new(Vec::new());
}

/// Pushes `value` as the innermost local of its type for the duration of
/// `f`.
pub fn with_local<T: Clone + 'static, R>(value: T, f: impl FnOnce() -> R) -> R {
    with_locals_frame(|| {
        set_local_boxed(TypeId::of::<T>(), Box::new(value));
        f()
    })
}

/// Innermost local of type `T`, if any frame carries one.
pub fn local<T: Clone + 'static>() -> Option<T> {
    LOCALS_STACK.with(|st| {
        for frame in st.borrow().iter().rev() {
            if let Some(v) = frame.get(&TypeId::of::<T>())
                && let Some(t) = v.downcast_ref::<T>()
            {
                return Some(t.clone());
            }
        }
        None
    })
}

fn with_locals_frame<R>(f: impl FnOnce() -> R) -> R {
    // Non-panicking frame guard (ensures pop on unwind)
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            LOCALS_STACK.with(|st| {
                st.borrow_mut().pop();
            });
        }
    }
    LOCALS_STACK.with(|st| st.borrow_mut().push(HashMap::new()));
    let _guard = Guard;
    f()
}

fn set_local_boxed(t: TypeId, v: Box<dyn Any>) {
    LOCALS_STACK.with(|st| {
        if let Some(top) = st.borrow_mut().last_mut() {
            top.insert(t, v);
        }
    });
}
