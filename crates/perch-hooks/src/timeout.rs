use std::cell::RefCell;
use std::rc::Rc;

use perch_core::{disposable_effect, on_unmount, remember};
use perch_platform::{TimerHost, TimerId, current_platform};
use web_time::Duration;

/// Cancel handle returned by [`use_timeout`].
#[derive(Clone)]
pub struct TimeoutHandle {
    timers: Rc<dyn TimerHost>,
    pending: Rc<RefCell<Option<TimerId>>>,
}

impl TimeoutHandle {
    /// Clears the pending timer, if any. Idempotent.
    pub fn cancel(&self) {
        if let Some(id) = self.pending.borrow_mut().take() {
            self.timers.cancel(id);
        }
    }
}

/// Runs `callback` once after `delay`. `None` schedules nothing; a change
/// of delay cancels the pending timer and schedules afresh. The latest
/// callback is saved on every pass, so a timer that fires always runs the
/// most recent closure.
pub fn use_timeout(callback: impl Fn() + 'static, delay: Option<Duration>) -> TimeoutHandle {
    let callback: Rc<dyn Fn()> = Rc::new(callback);
    let saved = remember({
        let callback = callback.clone();
        move || RefCell::new(callback)
    });
    *saved.borrow_mut() = callback;

    let pending = remember(|| Rc::new(RefCell::new(None::<TimerId>)));
    let pending = pending.as_ref().clone();
    let timers = current_platform().timers();

    disposable_effect(delay, {
        let saved = saved.clone();
        let pending = pending.clone();
        let timers = timers.clone();
        move || {
            let Some(delay) = delay else {
                return perch_core::Dispose::noop();
            };

            let fire = {
                let saved = saved.clone();
                let pending = pending.clone();
                Box::new(move || {
                    pending.borrow_mut().take();
                    let callback = saved.borrow().clone();
                    callback();
                })
            };
            *pending.borrow_mut() = Some(timers.schedule(delay, fire));

            let timers = timers.clone();
            let pending = pending.clone();
            on_unmount(move || {
                if let Some(id) = pending.borrow_mut().take() {
                    timers.cancel(id);
                }
            })
        }
    });

    TimeoutHandle { timers, pending }
}
