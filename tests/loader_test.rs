use kleczewsky_world::{
    config::TimingOptions,
    loader::{LoaderController, LoaderEvent},
};

fn loader() -> LoaderController {
    LoaderController::new(&TimingOptions::default())
}

#[test]
fn should_average_progress_over_every_asset() {
    let mut loader = loader();
    assert_eq!(loader.progress(), None);

    loader.report_bytes("letters", 50, Some(100));
    loader.report_bytes("wall", 10, None);
    assert_eq!(loader.progress(), Some(25));

    loader.report_bytes("wall", 3, Some(4));
    assert_eq!(loader.progress(), Some(63));
}

#[test]
fn should_throttle_progress_updates() {
    let mut loader = loader();
    loader.report_percent("letters", 0.0);
    loader.report_percent("letters", 50.0);
    loader.report_percent("letters", 60.0);

    assert_eq!(loader.advance(0.1), vec![LoaderEvent::Progress(0)]);
    assert_eq!(loader.advance(0.2), vec![LoaderEvent::Progress(60)]);
    assert!(loader.advance(0.5).is_empty());
}

#[test]
fn should_fade_out_once_everything_is_loaded() {
    let mut loader = loader();
    loader.report_percent("letters", 100.0);

    assert_eq!(
        loader.advance(0.0),
        vec![LoaderEvent::Progress(100), LoaderEvent::Ready]
    );
    assert!(loader.is_loaded());
    assert!(loader.advance(1.5).is_empty());
    assert_eq!(
        loader.advance(0.5),
        vec![LoaderEvent::FadeOut { duration: 0.5 }]
    );
    assert!(loader.advance(0.25).is_empty());
    assert_eq!(loader.advance(0.25), vec![LoaderEvent::Hidden]);
}

#[test]
fn should_stay_ready_after_late_reports() {
    let mut loader = loader();
    loader.report_percent("letters", 100.0);
    loader.advance(0.0);

    loader.report_percent("extra", 0.0);
    let events = loader.advance(0.5);
    assert!(
        !events.iter().any(|e| matches!(e, LoaderEvent::Progress(_))),
        "{:?}",
        events
    );
}

#[test]
fn should_describe_the_loader_text() {
    assert_eq!(LoaderEvent::Progress(42).text().as_deref(), Some("42%"));
    assert_eq!(LoaderEvent::Ready.text().as_deref(), Some("Ready"));
    assert_eq!(LoaderEvent::Hidden.text(), None);
}

#[test]
fn should_wait_for_expected_assets() {
    let mut loader = loader();
    loader.expect_asset("letters");
    loader.expect_asset("wall");
    loader.report_percent("letters", 100.0);

    assert_eq!(loader.advance(0.0), vec![LoaderEvent::Progress(50)]);
    assert!(!loader.is_loaded());

    loader.expect_asset("letters");
    assert_eq!(loader.progress(), Some(50));
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn should_report_bytes_while_reading_an_asset() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut reports = Vec::new();
    let data = runtime
        .block_on(kleczewsky_world::resources::load_binary_with_progress(
            "world.toml",
            &mut |loaded, total| reports.push((loaded, total)),
        ))
        .unwrap();

    let size = data.len() as u64;
    assert!(size > 0);
    assert_eq!(reports.first(), Some(&(0, Some(size))));
    assert_eq!(reports.last(), Some(&(size, Some(size))));
    assert!(reports.windows(2).all(|w| w[0].0 <= w[1].0));
}
