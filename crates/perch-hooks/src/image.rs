//! Image acquisition: a viewport-gated loader plus a hook that mirrors the
//! load lifecycle into a small state record.
//!
//! The contract that holds the pipeline together: a URL is assigned to an
//! image handle **at most once** per handle, and only while the visibility
//! gate is open. Visibility can flip as often as it likes afterwards
//! without causing another fetch.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use perch_core::{Dispose, Signal, disposable_effect, on_unmount, remember, signal};
use perch_platform::{ImageHandle, LoadError, NodeId, current_platform};

use crate::viewport::use_in_viewport;

/// Shape of a loaded image, from the natural width/height ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Square,
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn of(width: u32, height: u32) -> Self {
        if width == height {
            Self::Square
        } else if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// UI-visible load state. Exactly one of loading / errored / loaded holds at
/// any observation point; `orientation` and `dimensions` are `Some` iff the
/// image is loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageProperties {
    pub url: Option<String>,
    pub is_loading: bool,
    pub has_error: bool,
    pub orientation: Option<Orientation>,
    pub dimensions: Option<Dimensions>,
}

impl Default for ImageProperties {
    fn default() -> Self {
        Self {
            url: None,
            is_loading: true,
            has_error: false,
            orientation: None,
            dimensions: None,
        }
    }
}

impl ImageProperties {
    fn loading(url: Option<String>) -> Self {
        Self {
            url,
            ..Self::default()
        }
    }

    fn failed(url: Option<String>) -> Self {
        Self {
            url,
            is_loading: false,
            has_error: true,
            orientation: None,
            dimensions: None,
        }
    }

    fn loaded(url: String, width: u32, height: u32) -> Self {
        Self {
            url: Some(url),
            is_loading: false,
            has_error: false,
            orientation: Some(Orientation::of(width, height)),
            dimensions: Some(Dimensions { width, height }),
        }
    }
}

/// Conditionally starts an image fetch.
///
/// Creates a handle when none is supplied. Iff `in_viewport` is true and
/// the handle has no URL yet, installs the completion callbacks and then
/// assigns the URL, in that order, so settlement can never race the
/// callbacks. A handle that already carries a URL is returned untouched,
/// which makes repeated calls (visibility re-evaluation) no-ops.
///
/// Never fails synchronously; a failed fetch reports once through
/// `on_error` and is not retried.
pub fn image_loader(
    url: Option<&str>,
    on_success: impl FnOnce(ImageHandle) + 'static,
    on_error: impl FnOnce(LoadError) + 'static,
    img: Option<ImageHandle>,
    in_viewport: bool,
) -> ImageHandle {
    let image = img.unwrap_or_else(|| current_platform().images().create());

    if in_viewport && image.src().is_none() {
        image.bind(move |outcome| match outcome {
            Ok(handle) => on_success(handle),
            Err(err) => on_error(err),
        });
        image.assign(url.unwrap_or(""));
    }

    image
}

/// Parameters for [`use_image`].
pub struct UseImage {
    url: Option<String>,
    handle: Option<ImageHandle>,
    lazy_target: Option<NodeId>,
    on_load: Option<Rc<dyn Fn(&ImageHandle)>>,
    on_error: Option<Rc<dyn Fn(&LoadError)>>,
}

impl UseImage {
    pub fn new(url: Option<impl Into<String>>) -> Self {
        Self {
            url: url.map(Into::into),
            handle: None,
            lazy_target: None,
            on_load: None,
            on_error: None,
        }
    }

    /// Reuses an existing image handle instead of creating one.
    #[must_use]
    pub fn with_handle(mut self, handle: ImageHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Defers loading until `target` enters the viewport.
    #[must_use]
    pub fn lazy(mut self, target: NodeId) -> Self {
        self.lazy_target = Some(target);
        self
    }

    #[must_use]
    pub fn on_load(mut self, f: impl Fn(&ImageHandle) + 'static) -> Self {
        self.on_load = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&LoadError) + 'static) -> Self {
        self.on_error = Some(Rc::new(f));
        self
    }
}

/// Loads (or lazy-loads) an image URL and exposes the lifecycle as
/// [`ImageProperties`].
///
/// State machine: mount or URL change restarts at loading, unless the URL
/// is absent or empty, which settles synchronously to the errored state
/// with `url: None`. A settle-success records orientation and dimensions; a
/// settle-failure keeps the URL and clears both. Consumer callbacks fire
/// exactly once per settle.
///
/// A URL change supersedes any in-flight load: each request carries a
/// generation tag and stale settlements are discarded, so the superseded
/// load can never overwrite newer state.
pub fn use_image(params: UseImage) -> Signal<ImageProperties> {
    let UseImage {
        url,
        handle,
        lazy_target,
        on_load,
        on_error,
    } = params;
    let url = url.filter(|u| !u.is_empty());

    let props = remember(|| signal(ImageProperties::default()))
        .as_ref()
        .clone();
    let generation = remember(|| Cell::new(0u64));
    let seed = remember(|| RefCell::new(handle));

    let visible = match lazy_target {
        Some(target) => use_in_viewport(target),
        None => remember(|| signal(true)).as_ref().clone(),
    };

    disposable_effect(url.clone(), {
        let props = props.clone();
        let visible = visible.clone();
        let generation = generation.clone();
        let seed = seed.clone();
        move || {
            let this_generation = generation.get() + 1;
            generation.set(this_generation);

            let Some(url) = url else {
                // absent URL: synchronous terminal state, handle untouched
                props.set(ImageProperties::failed(None));
                return Dispose::noop();
            };

            props.set(ImageProperties::loading(Some(url.clone())));

            // the handle for this url-run; seeded from the caller's handle
            // on the first run, fresh afterwards
            let run_handle = Rc::new(RefCell::new(seed.borrow_mut().take()));

            let try_load = Rc::new({
                let props = props.clone();
                let generation = generation.clone();
                move |in_viewport: bool| {
                    let success = {
                        let props = props.clone();
                        let generation = generation.clone();
                        let on_load = on_load.clone();
                        let url = url.clone();
                        move |handle: ImageHandle| {
                            if generation.get() != this_generation {
                                log::trace!("stale load of {url} discarded");
                                return;
                            }
                            if let Some(cb) = &on_load {
                                cb(&handle);
                            }
                            let (width, height) = handle.natural_size().unwrap_or_default();
                            props.set(ImageProperties::loaded(url.clone(), width, height));
                        }
                    };
                    let failure = {
                        let props = props.clone();
                        let generation = generation.clone();
                        let on_error = on_error.clone();
                        let url = url.clone();
                        move |err: LoadError| {
                            if generation.get() != this_generation {
                                log::trace!("stale failure of {url} discarded");
                                return;
                            }
                            if let Some(cb) = &on_error {
                                cb(&err);
                            }
                            props.set(ImageProperties::failed(Some(url.clone())));
                        }
                    };
                    let current = run_handle.borrow_mut().take();
                    let loaded = image_loader(Some(&url), success, failure, current, in_viewport);
                    *run_handle.borrow_mut() = Some(loaded);
                }
            });

            // attempt now, then on every visibility flip; the at-most-once
            // assignment rule makes extra attempts no-ops
            try_load(visible.get());
            let sub = visible.subscribe({
                let try_load = try_load.clone();
                move |v| {
                    if *v {
                        try_load(true);
                    }
                }
            });

            let visible = visible.clone();
            on_unmount(move || visible.unsubscribe(sub))
        }
    });

    props
}
