use std::rc::Rc;

use perch_core::Composition;
use perch_hooks::{UseImage, use_image, use_local_storage, use_portal, use_timeout, use_window_details};
use perch_platform::{DocumentHost, Headless, StorageAreaKind, with_platform};
use web_time::Duration;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let platform = Headless::new();
    platform.stage_image("https://example.com/banner.png", 1280, 720);
    platform.store_raw(StorageAreaKind::Local, "visits", "41");

    let target = platform.dom().create_element("img");
    let composition = Composition::new();

    let compose = |platform: &Rc<Headless>| {
        let platform = platform.clone();
        composition.compose(|| {
            with_platform(platform, || {
                let banner = use_image(
                    UseImage::new(Some("https://example.com/banner.png"))
                        .lazy(target)
                        .on_load(|handle| {
                            log::info!("banner loaded at {:?}", handle.natural_size());
                        })
                        .on_error(|err| log::warn!("banner failed: {err}")),
                );
                let visits = use_local_storage::<u32>("visits", || Some(0), false);
                let details = use_window_details();
                let overlay = use_portal("overlay");
                use_timeout(
                    || log::info!("idle reminder fired"),
                    Some(Duration::from_secs(2)),
                );
                (banner, visits, details, overlay)
            })
        })
    };

    let (banner, visits, details, overlay) = compose(&platform);
    log::info!("portal mounted at {overlay:?}");
    log::info!("window: {:?}", details.get());
    log::info!("banner state: {:?}", banner.get());

    visits.set(visits.get().unwrap_or(0) + 1);
    log::info!("visits persisted as {:?}", platform.stored(StorageAreaKind::Local, "visits"));

    // scroll the banner into view and let the fetch settle
    platform.set_intersecting(target, true);
    platform.pump_images();
    log::info!("banner state: {:?}", banner.get());

    platform.resize_to(800, 600);
    log::info!("window after resize: {:?}", details.get());

    platform.advance(Duration::from_secs(3));

    composition.unmount();
    Ok(())
}
