use std::rc::Rc;

use perch_core::{Signal, disposable_effect, on_unmount, remember, signal};
use perch_platform::{NodeId, current_platform};

/// Current and previous focused element.
#[derive(Clone)]
pub struct ActiveElement {
    pub active: Signal<Option<NodeId>>,
    pub previous: Signal<Option<NodeId>>,
}

/// Tracks document focus: `active` is seeded from the platform's current
/// focus, and every focus-in pushes the old value into `previous`.
pub fn use_active_element() -> ActiveElement {
    let active = remember(|| signal(current_platform().focus().active()));
    let previous = remember(|| signal(None::<NodeId>));
    let active = active.as_ref().clone();
    let previous = previous.as_ref().clone();

    disposable_effect((), {
        let active = active.clone();
        let previous = previous.clone();
        move || {
            let source = current_platform().focus();

            let listener = Rc::new(move |node: Option<NodeId>| {
                previous.set(active.get());
                active.set(node);
            });
            let id = source.subscribe(listener);

            on_unmount(move || source.unsubscribe(id))
        }
    });

    ActiveElement { active, previous }
}
