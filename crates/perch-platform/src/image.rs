use std::cell::RefCell;
use std::rc::{Rc, Weak};

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("image load failed: {0}")]
    Failed(String),
    #[error("image loading is not supported in this environment")]
    Unsupported,
}

pub type LoadResult = Result<ImageHandle, LoadError>;

/// Fetch backend for image handles. `begin` must not settle re-entrantly
/// from inside `ImageHandle::assign`; queue and deliver from an event pump.
pub trait ImageTransport {
    fn create(&self) -> ImageHandle;
    fn begin(&self, handle: &ImageHandle, url: &str);
}

/// The external, mutable image resource. URL assignment is at-most-once per
/// handle, and settlement (success or failure) is delivered at most once
/// through a single-shot callback, so visibility churn or duplicate
/// platform events can never re-fetch or double-report.
#[derive(Clone)]
pub struct ImageHandle {
    inner: Rc<RefCell<HandleInner>>,
}

struct HandleInner {
    src: Option<String>,
    natural: Option<(u32, u32)>,
    settled: bool,
    on_settle: Option<Box<dyn FnOnce(LoadResult)>>,
    transport: Option<Weak<dyn ImageTransport>>,
}

impl ImageHandle {
    pub fn new(transport: Weak<dyn ImageTransport>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(HandleInner {
                src: None,
                natural: None,
                settled: false,
                on_settle: None,
                transport: Some(transport),
            })),
        }
    }

    /// A handle with no fetch backend: any assignment settles immediately
    /// with [`LoadError::Unsupported`].
    pub fn detached() -> Self {
        Self {
            inner: Rc::new(RefCell::new(HandleInner {
                src: None,
                natural: None,
                settled: false,
                on_settle: None,
                transport: None,
            })),
        }
    }

    /// The assigned URL, `None` until the first assignment.
    pub fn src(&self) -> Option<String> {
        self.inner.borrow().src.clone()
    }

    /// Intrinsic dimensions, `Some` iff the handle settled successfully.
    pub fn natural_size(&self) -> Option<(u32, u32)> {
        self.inner.borrow().natural
    }

    pub fn is_settled(&self) -> bool {
        self.inner.borrow().settled
    }

    /// Installs the single-shot settlement callback. Must happen before
    /// `assign` so settlement can never race the consumer; a bind after
    /// assignment is ignored.
    pub fn bind(&self, on_settle: impl FnOnce(LoadResult) + 'static) {
        let mut inner = self.inner.borrow_mut();
        if inner.src.is_some() {
            log::trace!("image bind after assignment ignored");
            return;
        }
        inner.on_settle = Some(Box::new(on_settle));
    }

    /// Records the URL and hands the handle to its transport. Only the
    /// first assignment takes effect.
    pub fn assign(&self, url: &str) {
        let transport = {
            let mut inner = self.inner.borrow_mut();
            if inner.src.is_some() {
                return;
            }
            inner.src = Some(url.to_string());
            inner.transport.clone()
        };

        match transport.and_then(|weak| weak.upgrade()) {
            Some(transport) => transport.begin(self, url),
            None => self.settle(Err(LoadError::Unsupported)),
        }
    }

    /// Delivers the load outcome. The first settlement wins; later calls
    /// are ignored.
    pub fn settle(&self, outcome: Result<(u32, u32), LoadError>) {
        let on_settle = {
            let mut inner = self.inner.borrow_mut();
            if inner.settled {
                log::trace!("duplicate image settlement ignored");
                return;
            }
            inner.settled = true;
            if let Ok(size) = outcome {
                inner.natural = Some(size);
            }
            inner.on_settle.take()
        };

        if let Some(on_settle) = on_settle {
            match outcome {
                Ok(_) => on_settle(Ok(self.clone())),
                Err(err) => on_settle(Err(err)),
            }
        }
    }

    /// Two handles are the same iff they share the underlying resource.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
