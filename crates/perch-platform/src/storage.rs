use std::rc::Rc;

use slotmap::new_key_type;
use thiserror::Error;

new_key_type! {
    pub struct StorageListenerId;
}

/// Which key-value area a hook is bound to: `Local` persists per origin,
/// `Session` lives with the context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageAreaKind {
    Local,
    Session,
}

/// Change notification, observable cross-context by key + area. A context's
/// own writes do not notify itself.
#[derive(Clone, Debug)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub area: StorageAreaKind,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage quota exceeded ({name}, code {code:?})")]
    QuotaExceeded { code: Option<u32>, name: String },
    #[error("key-value storage is not available in this environment")]
    Unavailable,
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StorageError {
    /// Maps a raw backend failure signature onto the taxonomy. Quota
    /// exhaustion is recognized in any of the three shapes platforms report
    /// it: code 22, legacy code 1014, or one of the two well-known names.
    pub fn classify(code: Option<u32>, name: &str) -> Self {
        let quota = matches!(code, Some(22) | Some(1014))
            || name == "QuotaExceededError"
            || name == "NS_ERROR_DOM_QUOTA_REACHED";
        if quota {
            Self::QuotaExceeded {
                code,
                name: name.to_string(),
            }
        } else {
            Self::Backend(name.to_string())
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// One key-value area. `set` is the only fallible operation; a failed write
/// leaves the stored value unchanged.
pub trait StorageArea {
    fn kind(&self) -> StorageAreaKind;
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str);
    fn subscribe(&self, listener: Rc<dyn Fn(&StorageEvent)>) -> StorageListenerId;
    fn unsubscribe(&self, id: StorageListenerId);
}
