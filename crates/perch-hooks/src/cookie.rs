use std::rc::Rc;

use perch_core::{Signal, remember, signal};
use perch_platform::{CookieJar, CookieOptions, current_platform};

/// Handle returned by [`use_cookie`].
#[derive(Clone)]
pub struct CookieValue {
    value: Signal<Option<String>>,
    jar: Rc<dyn CookieJar>,
    key: String,
    options: CookieOptions,
}

impl CookieValue {
    pub fn get(&self) -> Option<String> {
        self.value.get()
    }

    pub fn signal(&self) -> Signal<Option<String>> {
        self.value.clone()
    }

    /// Writes a new value; an empty value removes the cookie instead.
    pub fn update(&self, value: &str) {
        if value.is_empty() {
            self.jar.remove(&self.key, &self.options);
            self.value.set(None);
        } else {
            self.value.set(Some(value.to_string()));
            self.jar.set(&self.key, value, &self.options);
        }
    }
}

/// Reads a cookie into reactive state, falling back to `default_value` when
/// it is missing.
pub fn use_cookie(key: &str, default_value: &str, options: CookieOptions) -> CookieValue {
    let jar = current_platform().cookies();

    let slot = remember({
        let jar = jar.clone();
        let key = key.to_string();
        let default_value = default_value.to_string();
        move || signal(Some(jar.get(&key).unwrap_or(default_value)))
    });

    CookieValue {
        value: slot.as_ref().clone(),
        jar,
        key: key.to_string(),
        options,
    }
}
