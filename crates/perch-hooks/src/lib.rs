//! # Perch hooks
//!
//! Each hook is a plain function called during a composition pass. State
//! lives in `remember` slots, side effects attach through
//! `disposable_effect`, and every platform touch goes through the
//! capability traits in `perch-platform` — compose under
//! [`with_platform`](perch_platform::with_platform) and the whole collection
//! runs against a scripted environment.
//!
//! The image pipeline is the load-bearing piece: [`use_in_viewport`]
//! watches an element, [`image_loader`] assigns a URL to an image handle at
//! most once behind that visibility gate, and [`use_image`] composes the
//! two into a small state record ([`ImageProperties`]) the UI can render
//! from.

pub mod cookie;
pub mod focus;
pub mod image;
pub mod portal;
pub mod storage;
pub mod tests;
pub mod timeout;
pub mod viewport;
pub mod window;

pub use cookie::{CookieValue, use_cookie};
pub use focus::{ActiveElement, use_active_element};
pub use image::{Dimensions, ImageProperties, Orientation, UseImage, image_loader, use_image};
pub use portal::use_portal;
pub use storage::{StoredValue, use_local_storage, use_session_storage};
pub use timeout::{TimeoutHandle, use_timeout};
pub use viewport::use_in_viewport;
pub use window::{WindowDetails, WindowPosition, WindowSize, use_window_details};
