//! Persisted key-value state with cross-context synchronization.
//!
//! Values are stored as UTF-8 JSON text. A missing item, or the literal
//! string `"undefined"` some environments leave behind, reads as absent.
//! Storage failures never reach the caller: writes that trip the quota log
//! one warning and leave both the stored value and the in-memory state
//! unchanged; unparseable stored text is logged and replaced by the
//! default.

use std::rc::Rc;

use perch_core::{Signal, disposable_effect, on_unmount, remember, signal};
use perch_platform::{StorageArea, StorageAreaKind, StorageEvent, current_platform};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Handle returned by the storage hooks: the reactive value plus write
/// access to the backing area.
pub struct StoredValue<T: 'static> {
    value: Signal<Option<T>>,
    area: Rc<dyn StorageArea>,
    key: String,
}

impl<T> Clone for StoredValue<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            area: self.area.clone(),
            key: self.key.clone(),
        }
    }
}

impl<T: Serialize + DeserializeOwned + Clone + 'static> StoredValue<T> {
    pub fn get(&self) -> Option<T> {
        self.value.get()
    }

    pub fn signal(&self) -> Signal<Option<T>> {
        self.value.clone()
    }

    /// Persists `value` and, on success, updates the in-memory state. A
    /// failed write changes nothing and is only logged.
    pub fn set(&self, value: T) {
        let text = match serde_json::to_string(&value) {
            Ok(text) => text,
            Err(err) => {
                log::error!("value for {:?} is not serializable: {err}", self.key);
                return;
            }
        };
        match self.area.set(&self.key, &text) {
            Ok(()) => self.value.set(Some(value)),
            Err(err) if err.is_quota_exceeded() => {
                log::warn!("write of {:?} dropped: {err}", self.key);
            }
            Err(err) => {
                log::error!("write of {:?} failed: {err}", self.key);
            }
        }
    }

    /// Removes the key from the area and clears the in-memory state.
    pub fn clear(&self) {
        self.area.remove(&self.key);
        self.value.set(None);
    }
}

fn parse_stored<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("stored value for {key:?} is not valid JSON: {err}");
            None
        }
    }
}

fn present(raw: Option<String>) -> Option<String> {
    raw.filter(|item| !item.is_empty() && item != "undefined")
}

fn use_storage<T: Serialize + DeserializeOwned + Clone + 'static>(
    kind: StorageAreaKind,
    key: &str,
    initial: impl FnOnce() -> Option<T>,
    save_initial: bool,
) -> StoredValue<T> {
    let area = current_platform().storage(kind);

    let slot = remember({
        let area = area.clone();
        let key = key.to_string();
        move || {
            let item = present(area.get(&key));
            let initial_value = initial();
            let parsed: Option<T> = item.as_deref().and_then(|raw| parse_stored(&key, raw));

            // seed the area when nothing usable is stored, or when the
            // caller forces its initial over what is there
            let seed = initial_value.is_some() && (item.is_none() || save_initial);
            if seed && let Ok(text) = serde_json::to_string(&initial_value) {
                if let Err(err) = area.set(&key, &text) {
                    if err.is_quota_exceeded() {
                        log::warn!("seed of {key:?} dropped: {err}");
                    } else {
                        log::error!("seed of {key:?} failed: {err}");
                    }
                }
            }

            let resolved = if save_initial && initial_value.is_some() {
                initial_value
            } else if parsed.is_some() {
                parsed
            } else {
                initial_value
            };
            signal(resolved)
        }
    });
    let value = slot.as_ref().clone();

    disposable_effect(key.to_string(), {
        let area = area.clone();
        let value = value.clone();
        let key = key.to_string();
        move || {
            let listener = Rc::new({
                let value = value.clone();
                let key = key.clone();
                move |event: &StorageEvent| {
                    if event.key != key || event.area != kind {
                        return;
                    }
                    let next = present(event.new_value.clone())
                        .as_deref()
                        .and_then(|raw| parse_stored::<T>(&key, raw));
                    value.set(next);
                }
            });
            let id = area.subscribe(listener);
            let area = area.clone();
            on_unmount(move || area.unsubscribe(id))
        }
    });

    StoredValue {
        value,
        area,
        key: key.to_string(),
    }
}

/// Persisted state in the origin-scoped area. `initial` runs at most once;
/// with `save_initial` a `Some` initial overrides whatever is stored.
pub fn use_local_storage<T: Serialize + DeserializeOwned + Clone + 'static>(
    key: &str,
    initial: impl FnOnce() -> Option<T>,
    save_initial: bool,
) -> StoredValue<T> {
    use_storage(StorageAreaKind::Local, key, initial, save_initial)
}

/// Same contract as [`use_local_storage`], bound to the context-scoped
/// area.
pub fn use_session_storage<T: Serialize + DeserializeOwned + Clone + 'static>(
    key: &str,
    initial: impl FnOnce() -> Option<T>,
    save_initial: bool,
) -> StoredValue<T> {
    use_storage(StorageAreaKind::Session, key, initial, save_initial)
}
