use std::rc::Rc;

use perch_core::{Signal, disposable_effect, on_unmount, remember, signal};
use perch_platform::{WindowMetrics, current_platform};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowPosition {
    pub top: i32,
    pub left: i32,
}

/// Outer window size and screen position; `None` until the first
/// measurement, so environments without a window read as unmeasured rather
/// than zero-sized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowDetails {
    pub size: Option<WindowSize>,
    pub position: Option<WindowPosition>,
}

impl From<&WindowMetrics> for WindowDetails {
    fn from(m: &WindowMetrics) -> Self {
        Self {
            size: Some(WindowSize {
                width: m.outer_width,
                height: m.outer_height,
            }),
            position: Some(WindowPosition {
                top: m.screen_top,
                left: m.screen_left,
            }),
        }
    }
}

/// Reports window metrics, re-measured on every resize notification
/// (unthrottled on purpose: consumers decide their own damping).
pub fn use_window_details() -> Signal<WindowDetails> {
    let details = remember(|| signal(WindowDetails::default()));
    let details = details.as_ref().clone();

    disposable_effect((), {
        let details = details.clone();
        move || {
            let host = current_platform().window();

            let apply = {
                let details = details.clone();
                Rc::new(move |metrics: &WindowMetrics| details.set(metrics.into()))
            };

            // seed right away so the first pass already sees a measurement
            if let Some(metrics) = host.metrics() {
                apply(&metrics);
            }
            let id = host.subscribe(apply);

            on_unmount(move || host.unsubscribe(id))
        }
    });

    details
}
