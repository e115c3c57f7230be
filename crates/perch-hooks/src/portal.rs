use perch_core::{disposable_effect, on_unmount, remember};
use perch_platform::{NodeId, current_platform};

/// Mount point for content rendered outside normal layout order.
///
/// Looks up a container element with `container_id` under the document
/// body, creating and appending one when absent, then parks a fresh child
/// element of its own inside it. Each hook instance owns one child; the
/// child is detached on unmount while the shared container stays in place.
pub fn use_portal(container_id: &str) -> NodeId {
    let slot = remember(|| {
        let document = current_platform().document();
        let container = document.element_by_id(container_id).unwrap_or_else(|| {
            let container = document.create_element("div");
            document.set_id(container, container_id);
            document.append(document.body(), container);
            container
        });

        let slot = document.create_element("div");
        document.append(container, slot);
        slot
    });
    let slot = *slot;

    disposable_effect(slot, move || {
        let document = current_platform().document();
        on_unmount(move || document.remove(slot))
    });

    slot
}
