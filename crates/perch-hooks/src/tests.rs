#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use perch_core::Composition;
    use perch_platform::{
        CookieOptions, DocumentHost, Headless, Platform, StorageAreaKind, with_platform,
    };
    use serde::{Deserialize, Serialize};
    use web_time::Duration;

    use crate::cookie::use_cookie;
    use crate::focus::use_active_element;
    use crate::image::{Orientation, UseImage, image_loader, use_image};
    use crate::portal::use_portal;
    use crate::storage::{use_local_storage, use_session_storage};
    use crate::timeout::use_timeout;
    use crate::viewport::use_in_viewport;
    use crate::window::use_window_details;

    fn mount<R>(platform: &Rc<Headless>, f: impl FnOnce() -> R) -> (Composition, R) {
        let composition = Composition::new();
        let out = composition.compose(|| with_platform(platform.clone(), f));
        (composition, out)
    }

    // --- image pipeline ---

    #[test]
    fn absent_url_settles_synchronously_to_errored() {
        let platform = Headless::new();
        let (composition, props) =
            mount(&platform, || use_image(UseImage::new(None::<String>)));

        let state = props.get();
        assert_eq!(state.url, None);
        assert!(!state.is_loading);
        assert!(state.has_error);
        assert_eq!(state.orientation, None);
        assert_eq!(state.dimensions, None);
        composition.unmount();
    }

    #[test]
    fn empty_url_settles_synchronously_to_errored() {
        let platform = Headless::new();
        let (composition, props) = mount(&platform, || use_image(UseImage::new(Some(""))));

        let state = props.get();
        assert_eq!(state.url, None);
        assert!(!state.is_loading && state.has_error);
        composition.unmount();
    }

    #[test]
    fn orientation_follows_the_ratio() {
        assert_eq!(Orientation::of(100, 100), Orientation::Square);
        assert_eq!(Orientation::of(200, 100), Orientation::Landscape);
        assert_eq!(Orientation::of(100, 200), Orientation::Portrait);
    }

    #[test]
    fn loader_creates_a_handle_and_reports_success_with_it() {
        let platform = Headless::new();
        platform.stage_image("a.png", 32, 16);

        let reported = Rc::new(RefCell::new(None));
        let (composition, handle) = mount(&platform, {
            let reported = reported.clone();
            move || {
                image_loader(
                    Some("a.png"),
                    move |handle| *reported.borrow_mut() = Some(handle),
                    |err| panic!("unexpected failure: {err}"),
                    None,
                    true,
                )
            }
        });

        assert_eq!(handle.src().as_deref(), Some("a.png"));
        platform.pump_images();

        let reported = reported.borrow();
        let got = reported.as_ref().unwrap();
        assert!(got.ptr_eq(&handle));
        assert_eq!(got.natural_size(), Some((32, 16)));
        composition.unmount();
    }

    #[test]
    fn loader_is_idempotent_per_handle() {
        let platform = Headless::new();
        platform.stage_image("a.png", 8, 8);

        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));

        let (composition, handle) = mount(&platform, {
            let first = first.clone();
            move || {
                image_loader(
                    Some("a.png"),
                    move |_| first.set(first.get() + 1),
                    |_| {},
                    None,
                    true,
                )
            }
        });

        // second call with the already-assigned handle must not re-bind or
        // re-assign
        let s = second.clone();
        let again = image_loader(
            Some("a.png"),
            move |_| s.set(s.get() + 1),
            |_| {},
            Some(handle.clone()),
            true,
        );
        assert!(again.ptr_eq(&handle));
        assert_eq!(platform.pending_image_count(), 1);

        platform.pump_images();
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 0);
        composition.unmount();
    }

    #[test]
    fn loader_without_visibility_does_not_assign() {
        let platform = Headless::new();
        let (composition, handle) = mount(&platform, || {
            image_loader(Some("a.png"), |_| {}, |_| {}, None, false)
        });

        assert_eq!(handle.src(), None);
        assert_eq!(platform.pending_image_count(), 0);
        composition.unmount();
    }

    #[test]
    fn eager_image_loads_and_records_orientation() {
        let platform = Headless::new();
        platform.stage_image("banner.png", 1280, 720);

        let loads = Rc::new(Cell::new(0));
        let (composition, props) = mount(&platform, {
            let loads = loads.clone();
            move || {
                use_image(
                    UseImage::new(Some("banner.png"))
                        .on_load(move |_| loads.set(loads.get() + 1)),
                )
            }
        });

        assert!(props.get().is_loading);
        platform.pump_images();

        let state = props.get();
        assert!(!state.is_loading && !state.has_error);
        assert_eq!(state.url.as_deref(), Some("banner.png"));
        assert_eq!(state.orientation, Some(Orientation::Landscape));
        assert_eq!(
            state.dimensions.map(|d| (d.width, d.height)),
            Some((1280, 720))
        );
        assert_eq!(loads.get(), 1);
        composition.unmount();
    }

    #[test]
    fn failed_load_keeps_url_and_clears_dimensions() {
        let platform = Headless::new();
        platform.stage_image_failure("broken.png", "decode failed");

        let errors = Rc::new(Cell::new(0));
        let (composition, props) = mount(&platform, {
            let errors = errors.clone();
            move || {
                use_image(
                    UseImage::new(Some("broken.png"))
                        .on_error(move |_| errors.set(errors.get() + 1)),
                )
            }
        });

        platform.pump_images();

        let state = props.get();
        assert!(state.has_error && !state.is_loading);
        assert_eq!(state.url.as_deref(), Some("broken.png"));
        assert_eq!(state.orientation, None);
        assert_eq!(state.dimensions, None);
        assert_eq!(errors.get(), 1);
        composition.unmount();
    }

    #[test]
    fn lazy_image_assigns_exactly_once_on_first_visibility() {
        let platform = Headless::new();
        platform.stage_image("lazy.png", 100, 100);
        let target = platform.dom().create_element("img");

        let (composition, props) = mount(&platform, || {
            use_image(UseImage::new(Some("lazy.png")).lazy(target))
        });

        // invisible: handle exists but nothing was assigned or fetched
        assert!(props.get().is_loading);
        assert_eq!(platform.pending_image_count(), 0);

        platform.set_intersecting(target, true);
        assert_eq!(platform.pending_image_count(), 1);

        // visibility churn never re-fetches
        platform.set_intersecting(target, false);
        platform.set_intersecting(target, true);
        assert_eq!(platform.pending_image_count(), 1);

        platform.pump_images();
        let state = props.get();
        assert!(!state.is_loading && !state.has_error);
        assert_eq!(state.orientation, Some(Orientation::Square));
        composition.unmount();
    }

    #[test]
    fn stale_settlement_is_discarded_after_url_change() {
        let platform = Headless::new();
        platform.stage_image("a.png", 10, 20);
        platform.stage_image("b.png", 20, 10);

        let platform2 = platform.clone();
        let composition = Composition::new();
        let pass = |url: &'static str| {
            composition.compose(|| {
                with_platform(platform2.clone(), || use_image(UseImage::new(Some(url))))
            })
        };

        let props = pass("a.png");
        // supersede before the first load settles
        let props2 = pass("b.png");
        assert!(props2.get().is_loading);

        // both pending loads settle now; the stale one must not win
        platform.pump_images();

        let state = props.get();
        assert_eq!(state.url.as_deref(), Some("b.png"));
        assert_eq!(state.orientation, Some(Orientation::Landscape));
        assert_eq!(
            state.dimensions.map(|d| (d.width, d.height)),
            Some((20, 10))
        );
        composition.unmount();
    }

    #[test]
    fn caller_supplied_handle_is_used_for_the_first_load() {
        let platform = Headless::new();
        platform.stage_image("a.png", 4, 4);
        let handle = platform.images().create();

        let (composition, props) = mount(&platform, {
            let handle = handle.clone();
            move || use_image(UseImage::new(Some("a.png")).with_handle(handle))
        });

        assert_eq!(handle.src().as_deref(), Some("a.png"));
        platform.pump_images();
        assert!(!props.get().is_loading);
        composition.unmount();
    }

    #[test]
    fn unsupported_environment_reports_error_instead_of_panicking() {
        // no platform installed at all
        let composition = Composition::new();
        let props = composition.compose(|| use_image(UseImage::new(Some("a.png"))));

        let state = props.get();
        assert!(state.has_error && !state.is_loading);
        assert_eq!(state.url.as_deref(), Some("a.png"));
        composition.unmount();
    }

    // --- viewport ---

    #[test]
    fn in_viewport_starts_false_and_follows_entries() {
        let platform = Headless::new();
        let target = platform.dom().create_element("div");

        let (composition, visible) = mount(&platform, || use_in_viewport(target));
        assert!(!visible.get());

        platform.set_intersecting(target, true);
        assert!(visible.get());
        platform.set_intersecting(target, false);
        assert!(!visible.get());

        composition.unmount();
        assert_eq!(platform.observation_count(), 0);

        // a detached observation receives nothing
        platform.set_intersecting(target, true);
        assert!(!visible.get());
    }

    // --- storage ---

    #[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
    struct Profile {
        name: String,
        tags: Vec<String>,
        count: u32,
    }

    #[test]
    fn storage_round_trips_json_values() {
        let platform = Headless::new();
        let value = Profile {
            name: "ada".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
            count: 3,
        };

        let (composition, stored) = mount(&platform, || {
            use_local_storage::<Profile>("profile", || None, false)
        });
        assert_eq!(stored.get(), None);

        stored.set(value.clone());
        assert_eq!(stored.get(), Some(value.clone()));
        composition.unmount();

        // a fresh composition reads back a deep-equal value
        let (composition, reread) = mount(&platform, || {
            use_local_storage::<Profile>("profile", || None, false)
        });
        assert_eq!(reread.get(), Some(value));
        composition.unmount();
    }

    #[test]
    fn storage_initial_value_is_used_and_seeded() {
        let platform = Headless::new();
        let (composition, stored) = mount(&platform, || {
            use_local_storage("greeting", || Some("hello".to_string()), false)
        });

        assert_eq!(stored.get(), Some("hello".to_string()));
        assert_eq!(
            platform.stored(StorageAreaKind::Local, "greeting").as_deref(),
            Some("\"hello\"")
        );
        composition.unmount();
    }

    #[test]
    fn corrupted_stored_value_falls_back_to_initial() {
        let platform = Headless::new();
        platform.store_raw(StorageAreaKind::Local, "k", "[corruptedValue");

        let (composition, stored) = mount(&platform, || {
            use_local_storage("k", || Some("fallback".to_string()), false)
        });
        assert_eq!(stored.get(), Some("fallback".to_string()));
        composition.unmount();
    }

    #[test]
    fn undefined_sentinel_reads_as_absent() {
        let platform = Headless::new();
        platform.store_raw(StorageAreaKind::Local, "k", "undefined");

        let (composition, stored) = mount(&platform, || {
            use_local_storage("k", || Some("default".to_string()), false)
        });
        assert_eq!(stored.get(), Some("default".to_string()));
        composition.unmount();
    }

    #[test]
    fn save_initial_overrides_the_stored_value() {
        let platform = Headless::new();
        platform.store_raw(StorageAreaKind::Local, "k", "\"oldValue\"");

        let (composition, stored) = mount(&platform, || {
            use_local_storage("k", || Some("newDefault".to_string()), true)
        });
        assert_eq!(stored.get(), Some("newDefault".to_string()));
        assert_eq!(
            platform.stored(StorageAreaKind::Local, "k").as_deref(),
            Some("\"newDefault\"")
        );
        composition.unmount();
    }

    #[test]
    fn without_save_initial_the_stored_value_wins() {
        let platform = Headless::new();
        platform.store_raw(StorageAreaKind::Local, "k", "\"oldValue\"");

        let (composition, stored) = mount(&platform, || {
            use_local_storage("k", || Some("newDefault".to_string()), false)
        });
        assert_eq!(stored.get(), Some("oldValue".to_string()));
        assert_eq!(
            platform.stored(StorageAreaKind::Local, "k").as_deref(),
            Some("\"oldValue\"")
        );
        composition.unmount();
    }

    #[test]
    fn save_initial_with_absent_initial_does_not_overwrite() {
        let platform = Headless::new();
        platform.store_raw(StorageAreaKind::Local, "k", "\"oldValue\"");

        let (composition, stored) = mount(&platform, || {
            use_local_storage::<String>("k", || None, true)
        });
        assert_eq!(stored.get(), Some("oldValue".to_string()));
        assert_eq!(
            platform.stored(StorageAreaKind::Local, "k").as_deref(),
            Some("\"oldValue\"")
        );
        composition.unmount();
    }

    #[test]
    fn quota_failed_write_changes_nothing() {
        let platform = Headless::new();
        let (composition, stored) = mount(&platform, || {
            use_local_storage("k", || Some("small".to_string()), false)
        });

        platform.set_quota(StorageAreaKind::Local, Some(16));
        stored.set("a value far larger than the sixteen byte cap".to_string());

        assert_eq!(stored.get(), Some("small".to_string()));
        assert_eq!(
            platform.stored(StorageAreaKind::Local, "k").as_deref(),
            Some("\"small\"")
        );
        composition.unmount();
    }

    #[test]
    fn clear_removes_key_and_state() {
        let platform = Headless::new();
        let (composition, stored) = mount(&platform, || {
            use_local_storage("k", || Some("v".to_string()), false)
        });

        stored.clear();
        assert_eq!(stored.get(), None);
        assert_eq!(platform.stored(StorageAreaKind::Local, "k"), None);
        composition.unmount();
    }

    #[test]
    fn session_storage_is_isolated_from_the_local_area() {
        let platform = Headless::new();
        let (composition, stored) = mount(&platform, || {
            use_session_storage("k", || Some("session".to_string()), false)
        });

        assert_eq!(
            platform.stored(StorageAreaKind::Session, "k").as_deref(),
            Some("\"session\"")
        );
        assert_eq!(platform.stored(StorageAreaKind::Local, "k"), None);

        stored.set("updated".to_string());
        assert_eq!(
            platform.stored(StorageAreaKind::Session, "k").as_deref(),
            Some("\"updated\"")
        );
        composition.unmount();
    }

    #[test]
    fn cross_context_event_updates_matching_key_only() {
        let platform = Headless::new();
        let (composition, stored) = mount(&platform, || {
            use_local_storage("k", || Some("initial".to_string()), false)
        });

        platform.emit_storage_event(StorageAreaKind::Local, "other", Some("\"nope\""));
        assert_eq!(stored.get(), Some("initial".to_string()));

        platform.emit_storage_event(StorageAreaKind::Session, "k", Some("\"nope\""));
        assert_eq!(stored.get(), Some("initial".to_string()));

        platform.emit_storage_event(StorageAreaKind::Local, "k", Some("\"eventValue\""));
        assert_eq!(stored.get(), Some("eventValue".to_string()));

        platform.emit_storage_event(StorageAreaKind::Local, "k", None);
        assert_eq!(stored.get(), None);

        composition.unmount();

        // the listener is detached on unmount
        platform.emit_storage_event(StorageAreaKind::Local, "k", Some("\"late\""));
        assert_eq!(stored.get(), None);
    }

    // --- window ---

    #[test]
    fn window_details_seed_immediately_and_track_resizes() {
        let platform = Headless::new();
        let (composition, details) = mount(&platform, use_window_details);

        let first = details.get();
        assert_eq!(first.size.map(|s| (s.width, s.height)), Some((1280, 800)));

        platform.resize_to(640, 480);
        platform.move_to(10, 20);
        let next = details.get();
        assert_eq!(next.size.map(|s| (s.width, s.height)), Some((640, 480)));
        assert_eq!(next.position.map(|p| (p.top, p.left)), Some((10, 20)));

        composition.unmount();
        platform.resize_to(100, 100);
        assert_eq!(details.get(), next);
    }

    // --- focus ---

    #[test]
    fn active_element_tracks_current_and_previous() {
        let platform = Headless::new();
        let a = platform.dom().create_element("input");
        let b = platform.dom().create_element("input");

        let (composition, focus) = mount(&platform, use_active_element);
        assert_eq!(focus.active.get(), None);
        assert_eq!(focus.previous.get(), None);

        platform.focus_node(Some(a));
        assert_eq!(focus.active.get(), Some(a));
        assert_eq!(focus.previous.get(), None);

        platform.focus_node(Some(b));
        assert_eq!(focus.active.get(), Some(b));
        assert_eq!(focus.previous.get(), Some(a));

        composition.unmount();
    }

    // --- portal ---

    #[test]
    fn portal_creates_container_and_owns_one_slot() {
        let platform = Headless::new();
        let dom = platform.dom();

        let (composition, slot) = mount(&platform, || use_portal("overlay"));

        let container = dom.element_by_id("overlay").unwrap();
        assert_eq!(dom.parent(container), Some(dom.body()));
        assert_eq!(dom.children(container), vec![slot]);

        composition.unmount();
        // the slot is detached, the container stays for the next consumer
        assert!(dom.children(container).is_empty());
        assert_eq!(dom.element_by_id("overlay"), Some(container));
    }

    #[test]
    fn portals_share_the_container_by_id() {
        let platform = Headless::new();
        let dom = platform.dom();

        let (c1, slot1) = mount(&platform, || use_portal("overlay"));
        let (c2, slot2) = mount(&platform, || use_portal("overlay"));

        let container = dom.element_by_id("overlay").unwrap();
        assert_ne!(slot1, slot2);
        assert_eq!(dom.children(container), vec![slot1, slot2]);

        c1.unmount();
        c2.unmount();
    }

    // --- timeout ---

    #[test]
    fn timeout_fires_once_after_the_delay() {
        let platform = Headless::new();
        let fired = Rc::new(Cell::new(0));

        let (composition, _handle) = mount(&platform, {
            let fired = fired.clone();
            move || {
                use_timeout(
                    move || fired.set(fired.get() + 1),
                    Some(Duration::from_millis(100)),
                )
            }
        });

        platform.advance(Duration::from_millis(50));
        assert_eq!(fired.get(), 0);

        platform.advance(Duration::from_millis(60));
        assert_eq!(fired.get(), 1);

        platform.advance(Duration::from_secs(10));
        assert_eq!(fired.get(), 1);
        composition.unmount();
    }

    #[test]
    fn timeout_with_no_delay_schedules_nothing() {
        let platform = Headless::new();
        let (composition, _handle) = mount(&platform, || use_timeout(|| {}, None));

        assert_eq!(platform.pending_timer_count(), 0);
        composition.unmount();
    }

    #[test]
    fn timeout_cancel_and_unmount_clear_the_timer() {
        let platform = Headless::new();
        let fired = Rc::new(Cell::new(0));

        let (composition, handle) = mount(&platform, {
            let fired = fired.clone();
            move || {
                use_timeout(
                    move || fired.set(fired.get() + 1),
                    Some(Duration::from_millis(100)),
                )
            }
        });

        handle.cancel();
        handle.cancel();
        platform.advance(Duration::from_secs(1));
        assert_eq!(fired.get(), 0);
        composition.unmount();
        assert_eq!(platform.pending_timer_count(), 0);
    }

    #[test]
    fn timeout_runs_the_latest_callback() {
        let platform = Headless::new();
        let which = Rc::new(RefCell::new(""));

        let platform2 = platform.clone();
        let composition = Composition::new();
        let pass = |label: &'static str, which: Rc<RefCell<&'static str>>| {
            composition.compose(|| {
                with_platform(platform2.clone(), || {
                    use_timeout(
                        move || *which.borrow_mut() = label,
                        Some(Duration::from_millis(100)),
                    )
                })
            })
        };

        pass("first", which.clone());
        pass("second", which.clone()); // same delay: timer survives, callback swaps

        assert_eq!(platform.pending_timer_count(), 1);
        platform.advance(Duration::from_millis(150));
        assert_eq!(*which.borrow(), "second");
        composition.unmount();
    }

    #[test]
    fn delay_change_reschedules() {
        let platform = Headless::new();
        let fired = Rc::new(Cell::new(0));

        let platform2 = platform.clone();
        let composition = Composition::new();
        let pass = |delay_ms: u64, fired: Rc<Cell<u32>>| {
            composition.compose(|| {
                with_platform(platform2.clone(), || {
                    use_timeout(
                        move || fired.set(fired.get() + 1),
                        Some(Duration::from_millis(delay_ms)),
                    )
                })
            })
        };

        pass(100, fired.clone());
        platform.advance(Duration::from_millis(50));
        pass(200, fired.clone()); // reschedules from now

        platform.advance(Duration::from_millis(100));
        assert_eq!(fired.get(), 0);
        platform.advance(Duration::from_millis(150));
        assert_eq!(fired.get(), 1);
        composition.unmount();
    }

    // --- cookie ---

    #[test]
    fn cookie_defaults_updates_and_removes() {
        let platform = Headless::new();

        let (composition, cookie) = mount(&platform, || {
            use_cookie("theme", "light", CookieOptions::default())
        });
        assert_eq!(cookie.get(), Some("light".to_string()));

        cookie.update("dark");
        assert_eq!(cookie.get(), Some("dark".to_string()));

        composition.unmount();

        // the jar kept the write: a fresh composition reads it back
        let (composition, cookie) = mount(&platform, || {
            use_cookie("theme", "light", CookieOptions::default())
        });
        assert_eq!(cookie.get(), Some("dark".to_string()));

        cookie.update("");
        assert_eq!(cookie.get(), None);
        composition.unmount();
    }
}
