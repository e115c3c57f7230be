use std::rc::Rc;

use slotmap::new_key_type;
use web_time::Duration;

use crate::document::NodeId;

new_key_type! {
    pub struct FocusListenerId;
    pub struct ResizeListenerId;
    pub struct TimerId;
}

/// Document-level focus changes. Listeners fire with the newly focused
/// node on every focus-in.
pub trait FocusSource {
    fn active(&self) -> Option<NodeId>;
    fn subscribe(&self, listener: Rc<dyn Fn(Option<NodeId>)>) -> FocusListenerId;
    fn unsubscribe(&self, id: FocusListenerId);
}

/// Outer window size and screen position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowMetrics {
    pub outer_width: u32,
    pub outer_height: u32,
    pub screen_top: i32,
    pub screen_left: i32,
}

/// Window-level resize notifications, intentionally unthrottled. `metrics`
/// is `None` in environments without a window.
pub trait WindowHost {
    fn metrics(&self) -> Option<WindowMetrics>;
    fn subscribe(&self, listener: Rc<dyn Fn(&WindowMetrics)>) -> ResizeListenerId;
    fn unsubscribe(&self, id: ResizeListenerId);
}

/// One-shot timers driven by the platform clock.
pub trait TimerHost {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId;
    /// Cancels a pending timer. A no-op once the timer has fired.
    fn cancel(&self, id: TimerId);
}
