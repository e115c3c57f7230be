use std::rc::Rc;

use slotmap::new_key_type;

use crate::document::NodeId;

new_key_type! {
    pub struct ObservationId;
}

#[derive(Clone, Copy, Debug)]
pub struct IntersectionEntry {
    pub target: NodeId,
    pub is_intersecting: bool,
}

/// Viewport-intersection observation. Observations are independent per
/// `observe` call (no shared registry across consumers), and a target must
/// be treated as not intersecting until at least one entry batch has been
/// delivered for it.
pub trait IntersectionSource {
    fn observe(&self, target: NodeId, deliver: Rc<dyn Fn(&[IntersectionEntry])>) -> ObservationId;
    /// Detaches one observation. Unknown or already-detached ids are
    /// ignored.
    fn unobserve(&self, id: ObservationId);
}
