use std::rc::Rc;

use perch_core::{Signal, disposable_effect, on_unmount, remember, signal};
use perch_platform::{IntersectionEntry, NodeId, current_platform};

/// Tracks whether `target` currently intersects its viewport.
///
/// The signal starts `false` and stays there until the platform delivers at
/// least one entry for the target. The observation is detached exactly once
/// when the composition unmounts (or when `target` changes, which starts a
/// fresh observation).
pub fn use_in_viewport(target: NodeId) -> Signal<bool> {
    let visible = remember(|| signal(false));
    let visible = visible.as_ref().clone();

    disposable_effect(target, {
        let visible = visible.clone();
        move || {
            visible.set(false);

            let source = current_platform().intersection();
            let deliver = {
                let visible = visible.clone();
                Rc::new(move |entries: &[IntersectionEntry]| {
                    if let Some(entry) = entries.last() {
                        visible.set(entry.is_intersecting);
                    }
                })
            };
            let observation = source.observe(target, deliver);

            on_unmount(move || source.unobserve(observation))
        }
    });

    visible
}
