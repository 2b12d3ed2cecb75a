use cgmath::Vector3;
use scroll_reveal::{
    camera::fov_for_height,
    layout::{FixedLayout, Placement, ViewportSize},
    scroll::SectionEnter,
};

use crate::common::test_utils::{assets, progress_samples, rect, scene, secs};

mod common;

#[test]
fn containers_place_items_over_their_layout_elements() {
    let mut scene = scene(800.0, 600.0);
    let layout = FixedLayout::new(vec![rect(0.0, 0.0, 100.0, 100.0), rect(200.0, 0.0, 100.0, 100.0)]);
    assert!(scene.populate(assets(2), &layout, secs(0.0)));

    let positions: Vec<_> = scene.items().iter().map(|item| item.position).collect();
    assert_eq!(
        positions,
        vec![Vector3::new(-350.0, 250.0, 0.0), Vector3::new(-150.0, 250.0, 0.0)]
    );
    assert_eq!(scene.items()[0].uniforms.size, [100.0, 100.0]);
    assert_eq!(scene.items()[1].uniforms.plane_resolution, [100.0, 100.0]);
}

#[test]
fn textures_without_a_container_are_stacked_by_section() {
    let mut scene = scene(800.0, 600.0);
    let layout = FixedLayout::new(vec![
        rect(0.0, 0.0, 200.0, 150.0),
        rect(0.0, 600.0, 200.0, 150.0),
        rect(0.0, 1200.0, 200.0, 150.0),
    ]);
    scene.populate(assets(5), &layout, secs(0.0));

    let items = scene.items();
    assert_eq!(items.len(), 5);
    for (i, item) in items.iter().take(3).enumerate() {
        assert_eq!(item.placement, Placement::Container(i));
        assert_eq!(item.position.x, -300.0);
    }
    assert_eq!(items[3].placement, Placement::Fallback);
    assert_eq!(items[3].position, Vector3::new(0.0, -600.0 * 3.0, 0.0));
    assert_eq!(items[4].position, Vector3::new(0.0, -600.0 * 4.0, 0.0));
}

#[test]
fn crossing_the_rounding_boundary_enters_one_section() {
    let mut scene = scene(800.0, 600.0);
    scene.populate(assets(3), &FixedLayout::default(), secs(0.0));
    assert_eq!(scene.scroll().section(), 0);

    assert_eq!(scene.on_scroll(0.4 * 600.0, secs(0.1)), None);
    assert_eq!(scene.on_scroll(0.6 * 600.0, secs(0.2)), Some(SectionEnter { section: 1 }));
    for _ in 0..10 {
        assert_eq!(scene.on_scroll(0.6 * 600.0, secs(0.3)), None);
    }
    assert!(scene.animator().is_animating(1));
}

#[test]
fn retrigger_continues_from_the_in_flight_value() {
    let mut scene = scene(800.0, 600.0);
    scene.populate(assets(3), &FixedLayout::default(), secs(0.0));

    assert!(scene.on_scroll(1200.0, secs(0.0)).is_some());
    scene.tick(secs(1.0));
    let in_flight = scene.items()[2].uniforms.progress;
    assert!(in_flight > 0.0 && in_flight < 1.0);

    // leave and re-enter section 2 at the same instant
    scene.on_scroll(600.0, secs(1.0));
    assert_eq!(scene.on_scroll(1200.0, secs(1.0)), Some(SectionEnter { section: 2 }));

    let samples = progress_samples(&mut scene, 2, 1.0, 6.0, 50);
    assert!((samples[0] - in_flight).abs() < 1e-6);
    for pair in samples.windows(2) {
        assert!(pair[1] >= pair[0], "progress went backwards: {pair:?}");
    }
    assert!(samples.iter().all(|p| *p <= 1.0));
    assert_eq!(*samples.last().expect("samples"), 1.0);
    assert!(!scene.animator().is_animating(2));
}

#[test]
fn scrolling_past_the_last_item_is_a_no_op() {
    let mut scene = scene(800.0, 600.0);
    scene.populate(assets(2), &FixedLayout::default(), secs(0.0));
    assert_eq!(scene.on_scroll(3000.0, secs(0.5)), Some(SectionEnter { section: 5 }));
    assert_eq!(scene.animator().in_flight(), 1);
    scene.tick(secs(0.6));
}

#[test]
fn resize_keeps_fov_when_only_width_changes() {
    let mut scene = scene(1000.0, 800.0);
    let layout = FixedLayout::default();
    scene.populate(assets(1), &layout, secs(0.0));
    let before = scene.camera().fovy;
    assert!((before.0 - fov_for_height(800.0, 5.0).0).abs() < 1e-4);
    let expected = 2.0 * (400.0f32 / 5.0).atan().to_degrees();
    assert!((before.0 - expected).abs() < 1e-3);

    scene.on_resize(ViewportSize::new(500.0, 800.0), &layout).expect("no containers to lose");
    assert!((scene.camera().fovy.0 - before.0).abs() < 1e-6);
    assert!((scene.camera().aspect - 500.0 / 800.0).abs() < 1e-6);
}

#[test]
fn resize_follows_moved_containers() {
    let mut scene = scene(800.0, 600.0);
    let mut layout = FixedLayout::new(vec![rect(0.0, 0.0, 100.0, 100.0)]);
    scene.populate(assets(1), &layout, secs(0.0));

    layout.set_rects(vec![rect(100.0, 50.0, 100.0, 100.0)]);
    scene.on_resize(ViewportSize::new(400.0, 600.0), &layout).expect("container present");
    assert_eq!(scene.items()[0].position, Vector3::new(-50.0, 200.0, 0.0));
}

#[test]
fn camera_eases_toward_the_scroll_target() {
    let mut scene = scene(800.0, 600.0);
    scene.populate(assets(3), &FixedLayout::default(), secs(0.0));
    scene.on_scroll(600.0, secs(0.0));

    let mut last = scene.camera().y;
    for frame in 1..=120 {
        scene.tick(secs(frame as f32 / 60.0));
        let y = scene.camera().y;
        assert!(y <= last && y >= -600.0);
        last = y;
    }
    assert!((last + 600.0).abs() < 1.0);
}

#[test]
fn teardown_ends_the_frame_loop() {
    let mut scene = scene(800.0, 600.0);
    scene.populate(assets(1), &FixedLayout::default(), secs(0.0));
    let stop = scene.stop_handle();
    assert!(scene.tick(secs(0.1)).is_some());
    stop.stop();
    assert!(scene.tick(secs(0.2)).is_none());
}

#[test]
fn rapid_resizes_leave_the_scene_where_it_was() {
    let mut scene = scene(800.0, 600.0);
    let layout = FixedLayout::new(vec![rect(0.0, 0.0, 100.0, 100.0), rect(200.0, 300.0, 100.0, 100.0)]);
    scene.populate(assets(3), &layout, secs(0.0));
    scene.tick(secs(1.0));
    let positions: Vec<_> = scene.items().iter().map(|item| item.position).collect();
    let fovy = scene.camera().fovy;
    let progress = scene.items()[0].uniforms.progress;

    for _ in 0..20 {
        scene.on_resize(ViewportSize::new(800.0, 600.0), &layout).expect("containers present");
    }
    assert_eq!(scene.items().iter().map(|item| item.position).collect::<Vec<_>>(), positions);
    assert_eq!(scene.camera().fovy, fovy);

    for i in 0..20 {
        let size = if i % 2 == 0 { ViewportSize::new(640.0, 480.0) } else { ViewportSize::new(800.0, 600.0) };
        scene.on_resize(size, &layout).expect("containers present");
    }
    assert_eq!(scene.items().iter().map(|item| item.position).collect::<Vec<_>>(), positions);
    assert_eq!(scene.camera().fovy, fovy);

    // reveals are untouched by any of it
    assert_eq!(scene.items()[0].uniforms.progress, progress);
    assert!(scene.animator().is_animating(0));
    assert_eq!(scene.animator().in_flight(), 1);
    assert_eq!(scene.scroll().section(), 0);
}

#[test]
fn items_stay_on_their_containers_when_resized_mid_scroll() {
    let mut scene = scene(800.0, 600.0);
    let mut layout = FixedLayout::new(vec![rect(0.0, 0.0, 100.0, 100.0), rect(0.0, 600.0, 100.0, 100.0)]);
    scene.populate(assets(2), &layout, secs(0.0));
    scene.on_scroll(600.0, secs(0.1));

    layout.set_rects(vec![rect(0.0, -600.0, 100.0, 100.0), rect(0.0, 0.0, 100.0, 100.0)]);
    scene.on_resize(ViewportSize::new(800.0, 600.0), &layout).expect("containers present");
    assert_eq!(scene.items()[0].position, Vector3::new(-350.0, 250.0, 0.0));
    assert_eq!(scene.items()[1].position, Vector3::new(-350.0, -350.0, 0.0));

    // a narrower window reflows the second container to the right
    layout.set_rects(vec![rect(0.0, -600.0, 100.0, 100.0), rect(150.0, 0.0, 100.0, 100.0)]);
    scene.on_resize(ViewportSize::new(400.0, 600.0), &layout).expect("containers present");
    assert_eq!(scene.items()[1].position, Vector3::new(0.0, -350.0, 0.0));
}
