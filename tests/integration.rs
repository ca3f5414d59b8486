use enchartix_engine::chart::camera::{flat_dims, orbit_dims};
use enchartix_engine::chart::{
    ChartError, ChartOptions, ChartRuntime, ColorError, Entry, FrameUpdate, LayoutEngine,
    LayoutParams, ReleasedResources, RenderHost, Rgb, SegmentRef, Series, SeriesPoints, ThemeStyle,
    TickOutcome, ViewMode, Viewport, ease_in_out, parse_series_json,
};
use enchartix_engine::geom::Point3;

const FITNESS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/fitness.json"));
const STUDY: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/study.json"));

#[derive(Default)]
struct RecordingHost {
    frames: Vec<FrameUpdate>,
    exports: Vec<String>,
    released: Vec<ReleasedResources>,
    detached: usize,
}

impl RenderHost for RecordingHost {
    fn submit_frame(&mut self, frame: &FrameUpdate) {
        self.frames.push(frame.clone());
    }

    fn export_image(&mut self, filename: &str) {
        self.exports.push(filename.to_owned());
    }

    fn release(&mut self, released: ReleasedResources) {
        self.released.push(released);
    }

    fn detach_observers(&mut self) {
        self.detached += 1;
    }
}

fn fitness() -> Vec<Series> {
    parse_series_json(FITNESS).expect("fitness demo parses")
}

fn runtime_at(now: f64) -> ChartRuntime<RecordingHost> {
    ChartRuntime::new(
        RecordingHost::default(),
        fitness(),
        ChartOptions::default(),
        Viewport::new(800.0, 400.0),
        true,
        now,
    )
    .expect("runtime builds")
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Container pixel under which `world` appears for the runtime's camera.
fn screen_position(rt: &ChartRuntime<RecordingHost>, world: Point3) -> (f64, f64) {
    let pose = rt.camera();
    let frustum = rt.framing().frustum(rt.viewport());
    let d = world - pose.position;
    let half_w = (frustum.right - frustum.left) / 2.0 / pose.zoom;
    let half_h = (frustum.top - frustum.bottom) / 2.0 / pose.zoom;
    let ndc_x = d.dot(pose.right()) / half_w;
    let ndc_y = d.dot(pose.up()) / half_h;
    let viewport = rt.viewport();
    (
        (ndc_x + 1.0) / 2.0 * viewport.width,
        (1.0 - ndc_y) / 2.0 * viewport.height,
    )
}

#[test]
fn demo_points_are_monotonic_and_anchored() {
    for json in [FITNESS, STUDY] {
        let series = parse_series_json(json).unwrap();
        let theme = Rgb::from_hex("#00b894").unwrap();
        let params = LayoutParams::new(250.0, 360.0);
        let style = ThemeStyle::derive(theme, false);
        let engine = LayoutEngine::build(&series, theme, style, params, false);

        for record in engine.records() {
            let points = &record.derived.points;
            assert!(
                points.windows(2).all(|w| w[0].cumulative <= w[1].cumulative),
                "{}",
                record.name
            );
            assert_eq!(points[0].day_index, 0);
            assert_eq!(points[0].cumulative, 0.0);
            assert_eq!(record.positions[0].x, -125.0);
        }
    }
}

#[test]
fn demo_segments_are_never_smaller_than_the_floor() {
    let series = fitness();
    let theme = Rgb::from_hex("#7d33ff").unwrap();
    let engine = LayoutEngine::build(
        &series,
        theme,
        ThemeStyle::derive(theme, true),
        LayoutParams::new(250.0, 360.0),
        false,
    );

    let mut count = 0;
    for segment in engine.records().iter().flat_map(|r| &r.segments) {
        let size = segment.size();
        assert!(size.x >= 24.0 && size.y >= 24.0 && size.z >= 40.0);
        count += 1;
    }
    // Every dated entry of the demo has at least one set.
    assert_eq!(count, 7 + 6 + 3);
}

#[test]
fn repeated_full_layout_is_idempotent() {
    let series = fitness();
    let theme = Rgb::from_hex("#7d33ff").unwrap();
    let params = LayoutParams::new(310.0, 280.0);
    let style = ThemeStyle::derive(theme, true);
    let mut engine = LayoutEngine::build(&series, theme, style, params, false);

    engine.apply_layout(params, true);
    let positions: Vec<Vec<Point3>> =
        engine.records().iter().map(|r| r.positions.clone()).collect();
    let volumes: Vec<_> = engine
        .records()
        .iter()
        .flat_map(|r| r.segments.iter().map(|s| s.volume))
        .collect();
    let tube = engine.records()[0].tube.clone();

    engine.apply_layout(params, true);
    let again: Vec<Vec<Point3>> = engine.records().iter().map(|r| r.positions.clone()).collect();
    let volumes_again: Vec<_> = engine
        .records()
        .iter()
        .flat_map(|r| r.segments.iter().map(|s| s.volume))
        .collect();

    assert_eq!(positions, again);
    assert_eq!(volumes, volumes_again);
    assert_eq!(tube, engine.records()[0].tube);
}

#[test]
fn three_set_day_scenario() {
    let series = Series::new(
        "s",
        vec![Entry::new("Start", vec![]), Entry::new("d1", vec![5.0, 5.0, 4.0])],
    );
    let derived = SeriesPoints::derive(&series);

    assert_eq!(derived.stats.max_cumulative, 14.0);
    assert_eq!(derived.points.len(), 4);
    let cumulative: Vec<f64> = derived.points.iter().map(|p| p.cumulative).collect();
    assert_eq!(cumulative, vec![0.0, 5.0, 10.0, 14.0]);
    let nodes: Vec<bool> = derived.points.iter().map(|p| p.is_anchor_node).collect();
    assert_eq!(nodes, vec![true, false, false, true]);
}

#[test]
fn easing_boundaries() {
    assert_eq!(ease_in_out(0.0), 0.0);
    assert_eq!(ease_in_out(0.5), 0.5);
    assert_eq!(ease_in_out(1.0), 1.0);
}

#[test]
fn construction_frames_the_3d_view() {
    let mut rt = runtime_at(0.0);
    assert_eq!(rt.mode(), ViewMode::Orbit);
    assert_eq!(rt.layout().params(), orbit_dims(3));
    assert_eq!(rt.layout_stats().rebuild_passes, 1);
    assert_eq!(rt.inactivity_deadline(), Some(5000.0));

    let framing = *rt.framing();
    assert_eq!(rt.camera().position, framing.orbit_position());

    assert_eq!(rt.tick(16.0), TickOutcome::Rendered);
    let frame = &rt.host().frames[0];
    assert!(frame.has_tube_geometry());
    assert!(frame.has_segment_geometry());
    assert_eq!(frame.toggle_caption, "2D Flat View");
    assert!(frame.controls.policy.enable_rotate);

    rt.tick(32.0);
    let frame = &rt.host().frames[1];
    assert!(!frame.has_tube_geometry());
    assert!(!frame.has_segment_geometry());
}

#[test]
fn toggle_runs_to_flat_end_state_with_one_final_rebuild() {
    let mut rt = runtime_at(0.0);
    let rebuilds = rt.layout_stats().rebuild_passes;
    let passes = rt.layout_stats().passes;

    assert_eq!(rt.toggle_view_mode(1000.0).unwrap(), ViewMode::Flat);
    assert_eq!(rt.inactivity_deadline(), None);

    for now in [1000.0, 1200.0, 1450.0, 1700.0] {
        rt.tick(now);
        assert!(rt.is_transitioning());
        assert_eq!(rt.layout_stats().rebuild_passes, rebuilds);
    }

    rt.tick(1900.0);
    assert!(!rt.is_transitioning());
    assert_eq!(rt.layout_stats().rebuild_passes, rebuilds + 1);
    assert_eq!(rt.layout_stats().passes, passes + 5 + 1);

    let expected = flat_dims(rt.framing().view_size, 2.0);
    let params = rt.layout().params();
    assert!(approx(params.box_width, expected.box_width));
    assert!(approx(params.box_depth, expected.box_depth));
    assert_eq!(rt.camera().position, rt.framing().flat_position());

    let frame = rt.host().frames.last().unwrap();
    assert!(frame.top_down);
    assert!(frame.has_segment_geometry());
    assert!(!frame.controls.policy.enable_rotate);
    assert_eq!(frame.toggle_caption, "3D Perspective");
}

#[test]
fn flat_end_state_ignores_pre_toggle_camera() {
    let mut a = runtime_at(0.0);
    let mut b = runtime_at(0.0);
    b.update_camera([400.0, -30.0, 12.0], [5.0, 5.0, 5.0], [0.1, 0.7, 0.0, 0.7], 2.5)
        .unwrap();

    for rt in [&mut a, &mut b] {
        rt.toggle_view_mode(100.0).unwrap();
        rt.tick(100.0);
        rt.tick(1000.0);
    }

    assert_eq!(a.layout().params(), b.layout().params());
    assert_eq!(a.camera().position, b.camera().position);
    assert_eq!(a.camera().target, b.camera().target);
}

#[test]
fn interrupted_transition_rebuilds_once_at_interpolated_size() {
    let mut rt = runtime_at(0.0);
    let start = rt.layout().params();
    let rebuilds = rt.layout_stats().rebuild_passes;

    rt.toggle_view_mode(1000.0).unwrap();
    rt.tick(1360.0);
    assert!(rt.is_transitioning());

    rt.controls_start().unwrap();
    assert!(!rt.is_transitioning());
    assert_eq!(rt.layout_stats().rebuild_passes, rebuilds + 1);

    let end = flat_dims(rt.framing().view_size, 2.0);
    let eased = ease_in_out(0.4);
    assert!(approx(eased, 0.32));
    let params = rt.layout().params();
    assert!(approx(params.box_width, lerp(start.box_width, end.box_width, eased)));
    assert!(approx(params.box_depth, lerp(start.box_depth, end.box_depth, eased)));

    // No stray rebuilds on later frames.
    rt.tick(2000.0);
    rt.tick(3000.0);
    assert_eq!(rt.layout_stats().rebuild_passes, rebuilds + 1);
}

#[test]
fn controls_start_without_transition_only_disarms() {
    let mut rt = runtime_at(0.0);
    let rebuilds = rt.layout_stats().rebuild_passes;
    rt.controls_start().unwrap();
    assert_eq!(rt.inactivity_deadline(), None);
    assert_eq!(rt.layout_stats().rebuild_passes, rebuilds);

    // Disarmed: no re-home even long after construction.
    rt.tick(60_000.0);
    assert!(!rt.is_transitioning());
}

#[test]
fn inactivity_rehomes_to_current_mode_pose() {
    let mut rt = runtime_at(0.0);
    let home = rt.framing().orbit_position();

    rt.controls_start().unwrap();
    rt.update_camera([10.0, 300.0, 10.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0], 1.0)
        .unwrap();
    rt.controls_end(1000.0).unwrap();
    assert_eq!(rt.inactivity_deadline(), Some(6000.0));

    rt.tick(5999.0);
    assert!(!rt.is_transitioning());
    rt.tick(6000.0);
    assert!(rt.is_transitioning());
    assert_eq!(rt.mode(), ViewMode::Orbit);

    rt.tick(6900.0);
    assert!(!rt.is_transitioning());
    assert_eq!(rt.camera().position, home);
    assert_eq!(rt.layout().params(), orbit_dims(3));
}

#[test]
fn hover_highlights_dims_and_toggle_clears() {
    let mut rt = runtime_at(0.0);
    let at = SegmentRef { series: 2, segment: 1 };
    let center = rt.layout().segment(at).unwrap().center();
    let (x, y) = screen_position(&rt, center);

    rt.pointer_move(x, y).unwrap();
    let hovered = rt.hovered().expect("pointer over a segment");
    let records = rt.layout().records();
    for (index, record) in records.iter().enumerate() {
        let expected = if index == hovered.series { 0.8 } else { 0.15 };
        assert_eq!(record.tube_opacity.target, expected);
    }
    let highlight = rt.layout().style().highlight_opacity;
    assert_eq!(rt.layout().segment(hovered).unwrap().highlight.target, highlight);

    rt.tick(16.0);
    let frame = rt.host().frames.last().unwrap();
    let tooltip = frame.tooltip.as_ref().expect("tooltip shown");
    assert!(tooltip.content.title.ends_with(')'));
    assert!(frame.grid.visible);
    assert!(frame.grid.placement.is_some());

    rt.toggle_view_mode(100.0).unwrap();
    assert_eq!(rt.hovered(), None);
    assert_eq!(rt.layout().segment(hovered).unwrap().highlight.current, 0.0);
    assert!(rt.layout().records().iter().all(|r| r.tube_opacity.target == 0.8));

    rt.tick(116.0);
    assert!(rt.host().frames.last().unwrap().tooltip.is_none());
}

#[test]
fn pointer_is_ignored_during_transition() {
    let mut rt = runtime_at(0.0);
    let center = rt.layout().records()[0].segments[0].center();
    let (x, y) = screen_position(&rt, center);

    rt.toggle_view_mode(0.0).unwrap();
    rt.pointer_move(x, y).unwrap();
    assert_eq!(rt.hovered(), None);
}

#[test]
fn pointer_leave_restores_opacities() {
    let mut rt = runtime_at(0.0);
    let center = rt.layout().records()[1].segments[2].center();
    let (x, y) = screen_position(&rt, center);
    rt.pointer_move(x, y).unwrap();
    assert!(rt.hovered().is_some());

    rt.pointer_leave().unwrap();
    assert_eq!(rt.hovered(), None);
    assert!(rt.layout().records().iter().all(|r| r.tube_opacity.target == 0.8));
    assert!(rt.layout().records().iter().all(|r| r.marker_opacity.target == 1.0));
}

#[test]
fn hidden_chart_pauses_and_resumes() {
    let mut rt = runtime_at(0.0);
    rt.set_visible(false);
    assert_eq!(rt.tick(16.0), TickOutcome::Paused);
    assert!(rt.host().frames.is_empty());

    rt.set_visible(true);
    assert_eq!(rt.tick(32.0), TickOutcome::Rendered);
    assert_eq!(rt.host().frames.len(), 1);
}

#[test]
fn detached_container_stops_the_loop() {
    let mut rt = runtime_at(0.0);
    rt.container_detached();
    rt.container_detached();
    assert_eq!(rt.tick(16.0), TickOutcome::Stopped);
    assert_eq!(rt.host().detached, 1);
}

#[test]
fn destroy_is_idempotent() {
    let mut rt = runtime_at(0.0);
    rt.destroy();
    rt.destroy();

    assert!(rt.is_destroyed());
    assert_eq!(rt.host().detached, 1);
    assert_eq!(rt.host().released.len(), 1);
    assert_eq!(rt.host().released[0].series, 3);
    assert_eq!(rt.tick(16.0), TickOutcome::Stopped);
    assert_eq!(rt.toggle_view_mode(0.0), Err(ChartError::Destroyed));
    assert_eq!(rt.layout().bounds(), None);
}

#[test]
fn theme_change_swaps_the_arena() {
    let mut rt = runtime_at(0.0);
    let before = rt.layout().records()[0].accent;

    assert_eq!(
        rt.update_theme_color("not-a-color"),
        Err(ChartError::Color(ColorError::InvalidHex("not-a-color".to_owned())))
    );
    assert!(rt.host().released.is_empty());

    rt.update_theme_color("#00b894").unwrap();
    assert_eq!(rt.host().released.len(), 1);
    assert_eq!(rt.host().released[0].segments, 16);
    assert_ne!(rt.layout().records()[0].accent, before);
    assert_eq!(rt.layout().params(), orbit_dims(3));
}

#[test]
fn dark_mode_switch_restyles_without_swap() {
    let mut rt = runtime_at(0.0);
    let rebuilds = rt.layout_stats().rebuild_passes;
    rt.set_dark(false).unwrap();
    assert!(!rt.layout().style().is_dark);
    assert_eq!(rt.layout_stats().rebuild_passes, rebuilds + 1);
    assert!(rt.host().released.is_empty());
}

#[test]
fn rebuild_replaces_data_and_framing() {
    let mut rt = runtime_at(0.0);
    let study = parse_series_json(STUDY).unwrap();
    let single = vec![study[2].clone()];

    rt.rebuild(single).unwrap();
    assert_eq!(rt.layout().series_count(), 1);
    assert_eq!(rt.layout().params(), orbit_dims(1));
    assert_eq!(rt.host().released[0].series, 3);
    assert!(rt.framing().max_dim < 360.0);
    assert_eq!(rt.camera().position, rt.framing().orbit_position());
    assert_eq!(rt.camera().target, rt.framing().center);

    assert!(matches!(rt.rebuild(Vec::new()), Err(ChartError::Data(_))));
}

#[test]
fn rebuild_in_flat_view_moves_camera_to_new_framing() {
    let mut rt = runtime_at(0.0);
    rt.toggle_view_mode(0.0).unwrap();
    rt.tick(0.0);
    rt.tick(900.0);

    let study = parse_series_json(STUDY).unwrap();
    rt.rebuild(vec![study[0].clone()]).unwrap();

    let expected = flat_dims(rt.framing().view_size, 2.0);
    assert_eq!(rt.layout().params(), expected);
    assert_eq!(rt.camera().position, rt.framing().flat_position());
}

#[test]
fn rebuild_during_transition_ends_at_new_dims() {
    let mut rt = runtime_at(0.0);
    rt.toggle_view_mode(0.0).unwrap();
    rt.tick(0.0);
    rt.tick(900.0);
    rt.toggle_view_mode(1000.0).unwrap();
    rt.tick(1000.0);
    rt.tick(1300.0);
    assert!(rt.is_transitioning());

    let study = parse_series_json(STUDY).unwrap();
    rt.rebuild(vec![study[2].clone()]).unwrap();
    assert!(rt.is_transitioning());

    rt.tick(1600.0);
    rt.tick(1900.0);
    assert!(!rt.is_transitioning());
    assert_eq!(rt.mode(), ViewMode::Orbit);
    assert_eq!(rt.layout().params(), orbit_dims(1));
    assert_eq!(rt.camera().position, rt.framing().orbit_position());
}

#[test]
fn resize_refits_flat_width_only_when_idle() {
    let mut rt = runtime_at(0.0);
    rt.resize(600.0, 600.0).unwrap();
    assert_eq!(rt.layout().params(), orbit_dims(3));

    rt.toggle_view_mode(0.0).unwrap();
    rt.tick(0.0);
    rt.tick(900.0);
    let depth = rt.layout().params().box_depth;

    rt.resize(1200.0, 400.0).unwrap();
    let params = rt.layout().params();
    assert!(approx(params.box_width, rt.framing().view_size * 3.0 * 0.85));
    assert_eq!(params.box_depth, depth);

    rt.resize(1.0, 1.0).unwrap();
    assert_eq!(rt.viewport(), Viewport::new(10.0, 10.0));
}

#[test]
fn screenshot_renders_then_exports() {
    let mut rt = runtime_at(0.0);
    rt.download_screenshot(None).unwrap();
    rt.download_screenshot(Some("mine.png")).unwrap();

    let host = rt.host();
    assert_eq!(host.exports, vec!["enchartix-graph.png".to_owned(), "mine.png".to_owned()]);
    assert_eq!(host.frames.len(), 2);
    assert!(host.frames.iter().all(FrameUpdate::has_tube_geometry));
}

#[test]
fn invalid_input_is_rejected_at_construction() {
    let bad = vec![Series::new(
        "bad",
        vec![Entry::new("Start", vec![]), Entry::new("d1", vec![f64::NAN])],
    )];
    let err = ChartRuntime::new(
        RecordingHost::default(),
        bad,
        ChartOptions::default(),
        Viewport::new(100.0, 100.0),
        false,
        0.0,
    )
    .err();
    assert!(matches!(err, Some(ChartError::Data(_))));
}
