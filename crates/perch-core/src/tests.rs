#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::clock::{Clock, ManualClock};
    use crate::effects::{Dispose, disposable_effect, on_unmount};
    use crate::locals::{local, with_local};
    use crate::runtime::{Composition, remember, remember_with_key};
    use crate::scope::Scope;
    use crate::signal::signal;
    use web_time::Duration;

    #[test]
    fn signal_basic() {
        let sig = signal(42);
        assert_eq!(sig.get(), 42);

        sig.set(100);
        assert_eq!(sig.get(), 100);

        sig.update(|v| *v += 1);
        assert_eq!(sig.get(), 101);
    }

    #[test]
    fn signal_subscription_and_unsubscribe() {
        let sig = signal(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen2 = seen.clone();
        let id = sig.subscribe(move |v| seen2.borrow_mut().push(*v));

        sig.set(1);
        sig.set(2);
        sig.unsubscribe(id);
        sig.set(3);

        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn signal_subscriber_may_write_back() {
        let sig = signal(1);
        let sum = signal(0);

        let sum2 = sum.clone();
        sig.subscribe(move |v| sum2.update(|s| *s += *v));

        sig.set(5);
        assert_eq!(sum.get(), 5);
    }

    #[test]
    fn dispose_runs_at_most_once() {
        let count = Rc::new(Cell::new(0));
        let count2 = count.clone();
        let d = Dispose::new(move || count2.set(count2.get() + 1));

        d.run();
        d.run();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn scope_explicit_dispose() {
        let cleaned_up = Rc::new(Cell::new(false));

        let scope = Scope::new();
        let cleaned = cleaned_up.clone();
        scope.add_disposer(move || cleaned.set(true));

        assert!(!cleaned_up.get());
        scope.dispose();
        assert!(cleaned_up.get());
    }

    #[test]
    fn remember_returns_same_slot_across_passes() {
        let composition = Composition::new();

        let first = composition.compose(|| *remember(|| 7));
        let second = composition.compose(|| *remember(|| 99));

        assert_eq!(first, 7);
        assert_eq!(second, 7);
        composition.unmount();
    }

    #[test]
    fn remember_with_key_is_stable() {
        let composition = Composition::new();

        let (a, b) = composition.compose(|| {
            let a = remember_with_key("k", || 42);
            let b = remember_with_key("k", || 100);
            (*a, *b)
        });

        assert_eq!(a, 42);
        assert_eq!(b, 42);
        composition.unmount();
    }

    #[test]
    fn disposable_effect_rekeys_and_cleans_up() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let cleanups = Rc::new(Cell::new(0));
        let composition = Composition::new();

        let pass = |key: i32| {
            let runs = runs.clone();
            let cleanups = cleanups.clone();
            composition.compose(move || {
                disposable_effect(key, move || {
                    runs.borrow_mut().push(key);
                    on_unmount(move || cleanups.set(cleanups.get() + 1))
                });
            });
        };

        pass(1);
        pass(1); // same key: no re-run
        pass(2); // key change: cleanup + re-run

        assert_eq!(*runs.borrow(), vec![1, 2]);
        assert_eq!(cleanups.get(), 1);

        composition.unmount();
        assert_eq!(cleanups.get(), 2);
    }

    #[test]
    fn unmount_runs_cleanups_exactly_once() {
        let cleanups = Rc::new(Cell::new(0));
        let composition = Composition::new();

        let cleanups2 = cleanups.clone();
        composition.compose(move || {
            disposable_effect((), move || {
                on_unmount(move || cleanups2.set(cleanups2.get() + 1))
            });
        });

        composition.unmount();
        assert_eq!(cleanups.get(), 1);
    }

    #[test]
    fn effect_runs_now_and_cleans_up_with_the_scope() {
        let ran = Rc::new(Cell::new(false));
        let cleaned = Rc::new(Cell::new(false));

        let scope = Scope::new();
        scope.run(|| {
            let ran = ran.clone();
            let cleaned = cleaned.clone();
            crate::effects::effect(move || {
                ran.set(true);
                on_unmount(move || cleaned.set(true))
            });
        });

        assert!(ran.get());
        assert!(!cleaned.get());
        scope.dispose();
        assert!(cleaned.get());
    }

    #[test]
    fn locals_nest_and_pop() {
        #[derive(Clone, PartialEq, Debug)]
        struct Label(&'static str);

        assert_eq!(local::<Label>(), None);
        with_local(Label("outer"), || {
            assert_eq!(local::<Label>(), Some(Label("outer")));
            with_local(Label("inner"), || {
                assert_eq!(local::<Label>(), Some(Label("inner")));
            });
            assert_eq!(local::<Label>(), Some(Label("outer")));
        });
        assert_eq!(local::<Label>(), None);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        let t0 = clock.now();

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - t0, Duration::from_millis(250));
    }
}
