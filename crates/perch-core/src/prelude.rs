pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::effects::{Dispose, disposable_effect, effect, on_unmount, side_effect};
pub use crate::locals::{local, with_local};
pub use crate::runtime::{
    Composition, remember, remember_state, remember_state_with_key, remember_with_key,
};
pub use crate::scope::{Scope, current_scope, scoped_effect};
pub use crate::signal::{Signal, SubId, signal};
