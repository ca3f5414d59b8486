//! Layout engine: an arena of per-series geometry records re-laid out for a
//! given box width and depth.
//!
//! Every pass remaps all points, rebuilds each series' tube and moves its
//! markers. Day-segment volumes and the picking hierarchy are only rebuilt
//! when asked to, since they are the costly part and only matter once the
//! geometry has settled.

use std::ops::Range;

use serde::Serialize;

use crate::geom::{
    BBox, CatmullRomCurve, GeomMesh, GradientAxis, HitBoxes, Point3, TubeOptions, Vec3,
    VolumePadding, apply_falloff, apply_height_gradient, box_mesh, padded_volume, reorient_falloff,
    tube_mesh,
};

use super::camera::Ray;
use super::data::{DaySpan, Series, SeriesPoints};
use super::interaction::{
    DIMMED_OPACITY, FadingOpacity, MARKER_BASE_OPACITY, SegmentRef, TUBE_BASE_OPACITY,
};
use super::mapper::{BOX_HEIGHT, DepthSlot, LayoutParams, map_points};
use super::theme::{Rgb, ThemeStyle, accent_palette};

pub const NODE_MARKER_RADIUS: f64 = 1.5;
pub const SET_MARKER_RADIUS: f64 = 0.8;
/// Segment volume color relative to the series accent.
const SEGMENT_TINT: f64 = 0.1;
const SEGMENT_BOX_DIVISIONS: usize = 4;

/// Tooltip data carried by a day segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMeta {
    pub series: String,
    pub date: String,
    pub sets: Vec<f64>,
    pub day_total: f64,
    pub running_total: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRecord {
    pub meta: SegmentMeta,
    /// Indices into the owning series' points.
    pub points: Range<usize>,
    /// Padded hit volume in layout space.
    pub volume: BBox,
    /// Box mesh centered on the origin; place it at `volume.center()`.
    pub mesh: GeomMesh,
    pub highlight: FadingOpacity,
}

impl SegmentRecord {
    fn new(span: &DaySpan, series: &str, accent: Rgb) -> Self {
        Self {
            meta: SegmentMeta {
                series: series.to_owned(),
                date: span.date.clone(),
                sets: span.sets.clone(),
                day_total: span.day_total,
                running_total: span.running_total,
                color: accent,
            },
            points: span.points.clone(),
            volume: BBox::new(Point3::ORIGIN, Point3::ORIGIN),
            mesh: GeomMesh::default(),
            highlight: FadingOpacity::new(0.0),
        }
    }

    #[must_use]
    pub fn center(&self) -> Point3 {
        self.volume.center()
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.volume.size()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub position: Point3,
    pub radius: f64,
}

#[derive(Debug, Clone)]
pub struct SeriesRecord {
    pub name: String,
    pub accent: Rgb,
    pub derived: SeriesPoints,
    pub slot: DepthSlot,
    pub positions: Vec<Point3>,
    /// `None` while the series has no curve or its tube could not be built.
    pub tube: Option<GeomMesh>,
    pub markers: Vec<Marker>,
    pub segments: Vec<SegmentRecord>,
    pub tube_opacity: FadingOpacity,
    pub marker_opacity: FadingOpacity,
}

impl SeriesRecord {
    fn new(series: &Series, accent: Rgb) -> Self {
        let derived = SeriesPoints::derive(series);
        let segments = derived
            .days
            .iter()
            .map(|span| SegmentRecord::new(span, &series.name, accent))
            .collect();

        Self {
            name: series.name.clone(),
            accent,
            derived,
            slot: DepthSlot::for_series(0, 1, 0.0),
            positions: Vec::new(),
            tube: None,
            markers: Vec::new(),
            segments,
            tube_opacity: FadingOpacity::new(TUBE_BASE_OPACITY),
            marker_opacity: FadingOpacity::new(MARKER_BASE_OPACITY),
        }
    }
}

/// Pass counters, mostly for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutStats {
    pub passes: usize,
    pub rebuild_passes: usize,
    /// Tubes skipped because their curve was degenerate.
    pub skipped_tubes: usize,
}

/// Geometry handed over on dispose or rebuild-and-swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReleasedResources {
    pub series: usize,
    pub tubes: usize,
    pub markers: usize,
    pub segments: usize,
}

impl ReleasedResources {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.series == 0 && self.tubes == 0 && self.markers == 0 && self.segments == 0
    }
}

#[derive(Debug, Clone)]
pub struct LayoutEngine {
    records: Vec<SeriesRecord>,
    params: LayoutParams,
    style: ThemeStyle,
    top_down: bool,
    hit_boxes: HitBoxes,
    segment_index: Vec<SegmentRef>,
    stats: LayoutStats,
}

impl LayoutEngine {
    /// Build the arena for `series` and run a first full pass at `params`.
    #[must_use]
    pub fn build(
        series: &[Series],
        theme: Rgb,
        style: ThemeStyle,
        params: LayoutParams,
        top_down: bool,
    ) -> Self {
        let palette = accent_palette(theme, series.len());
        let records = series
            .iter()
            .zip(palette)
            .map(|(s, accent)| SeriesRecord::new(s, accent))
            .collect();

        let mut engine = Self {
            records,
            params,
            style,
            top_down,
            hit_boxes: HitBoxes::default(),
            segment_index: Vec::new(),
            stats: LayoutStats::default(),
        };
        engine.apply_layout(params, true);
        engine
    }

    /// Replace the arena with one built from `series` at `params`, keeping the
    /// gradient orientation. Returns what the old arena held.
    pub fn rebuild_and_swap(
        &mut self,
        series: &[Series],
        theme: Rgb,
        style: ThemeStyle,
        params: LayoutParams,
    ) -> ReleasedResources {
        let next = Self::build(series, theme, style, params, self.top_down);
        let old = std::mem::replace(self, next);
        self.stats.passes += old.stats.passes;
        self.stats.rebuild_passes += old.stats.rebuild_passes;
        old.released()
    }

    /// Drop every record.
    pub fn dispose(&mut self) -> ReleasedResources {
        let released = self.released();
        self.records.clear();
        self.hit_boxes = HitBoxes::default();
        self.segment_index.clear();
        released
    }

    fn released(&self) -> ReleasedResources {
        ReleasedResources {
            series: self.records.len(),
            tubes: self.records.iter().filter(|r| r.tube.is_some()).count(),
            markers: self.records.iter().map(|r| r.markers.len()).sum(),
            segments: self.records.iter().map(|r| r.segments.len()).sum(),
        }
    }

    pub fn apply_layout(&mut self, params: LayoutParams, rebuild_segments: bool) {
        self.params = params;
        let count = self.records.len();
        let base = self.style.background.to_array();
        let axis = GradientAxis::for_top_down(self.top_down);
        let mut skipped = 0;

        for (index, record) in self.records.iter_mut().enumerate() {
            record.slot = DepthSlot::for_series(index, count, params.box_depth);
            record.positions = map_points(
                &record.derived.points,
                &record.derived.stats,
                params,
                record.slot,
            );

            record.markers = record
                .derived
                .points
                .iter()
                .zip(&record.positions)
                .map(|(p, &position)| Marker {
                    position,
                    radius: if p.is_anchor_node {
                        NODE_MARKER_RADIUS
                    } else {
                        SET_MARKER_RADIUS
                    },
                })
                .collect();

            if record.derived.has_curve() {
                record.tube = build_tube(&record.positions, params.box_width, base, record.accent);
                if record.tube.is_none() {
                    skipped += 1;
                }
            }

            if rebuild_segments {
                let tint = record.accent.scaled(SEGMENT_TINT).to_array();
                for segment in &mut record.segments {
                    let points = &record.positions[segment.points.clone()];
                    let Some(volume) = padded_volume(points, VolumePadding::default()) else {
                        continue;
                    };
                    let size = volume.size();
                    let mut mesh = box_mesh(size, SEGMENT_BOX_DIVISIONS);
                    apply_falloff(&mut mesh, size, axis, tint);
                    segment.volume = volume;
                    segment.mesh = mesh;
                }
            }
        }

        if rebuild_segments {
            self.rebuild_hit_boxes();
            self.stats.rebuild_passes += 1;
        }
        self.stats.passes += 1;
        self.stats.skipped_tubes += skipped;
    }

    fn rebuild_hit_boxes(&mut self) {
        self.segment_index.clear();
        let mut volumes = Vec::new();
        for (series, record) in self.records.iter().enumerate() {
            for (segment, seg) in record.segments.iter().enumerate() {
                self.segment_index.push(SegmentRef { series, segment });
                volumes.push(seg.volume);
            }
        }
        self.hit_boxes = HitBoxes::new(volumes);
    }

    /// Nearest segment volume along `ray`.
    #[must_use]
    pub fn pick(&self, ray: &Ray) -> Option<SegmentRef> {
        let hit = self.hit_boxes.first_hit(ray.origin, ray.direction, f64::INFINITY)?;
        self.segment_index.get(hit.index).copied()
    }

    /// Re-derive segment alpha along the axis matching the camera elevation.
    pub fn reorient_gradients(&mut self, top_down: bool) {
        if self.top_down == top_down {
            return;
        }
        self.top_down = top_down;
        let axis = GradientAxis::for_top_down(top_down);
        for segment in self.records.iter_mut().flat_map(|r| r.segments.iter_mut()) {
            let size = segment.size();
            reorient_falloff(&mut segment.mesh, size, axis);
        }
    }

    /// Theme change without a data change: the tube gradient base follows the
    /// background, so tubes are rebuilt.
    pub fn set_style(&mut self, style: ThemeStyle) {
        self.style = style;
        self.apply_layout(self.params, true);
    }

    /// Point every series' opacity target at its base value, or dim all but
    /// `focus`.
    pub fn focus_series(&mut self, focus: Option<usize>) {
        for (index, record) in self.records.iter_mut().enumerate() {
            let dimmed = focus.is_some_and(|f| f != index);
            record.tube_opacity.set_target(if dimmed { DIMMED_OPACITY } else { TUBE_BASE_OPACITY });
            let marker = if dimmed { DIMMED_OPACITY } else { MARKER_BASE_OPACITY };
            record.marker_opacity.set_target(marker);
        }
    }

    pub fn set_highlight(&mut self, at: SegmentRef, target: f64) {
        if let Some(segment) = self.segment_mut(at) {
            segment.highlight.set_target(target);
        }
    }

    /// Snap a segment's highlight to fully transparent.
    pub fn hide_highlight(&mut self, at: SegmentRef) {
        if let Some(segment) = self.segment_mut(at) {
            segment.highlight = FadingOpacity::new(0.0);
        }
    }

    /// One blend step on every opacity. Returns true if anything moved.
    pub fn blend_opacities(&mut self) -> bool {
        let mut moved = false;
        for record in &mut self.records {
            moved |= record.tube_opacity.step();
            moved |= record.marker_opacity.step();
            for segment in &mut record.segments {
                moved |= segment.highlight.step();
            }
        }
        moved
    }

    /// Points grown by their marker radius, joined with the segment volumes.
    #[must_use]
    pub fn bounds(&self) -> Option<BBox> {
        let mut bounds: Option<BBox> = None;
        let mut join = |b: BBox| {
            bounds = Some(bounds.map_or(b, |acc| acc.union(b)));
        };

        for record in &self.records {
            for marker in &record.markers {
                join(BBox::new(marker.position, marker.position).expand_by(marker.radius));
            }
            for segment in &record.segments {
                join(segment.volume);
            }
        }
        bounds
    }

    #[must_use]
    pub fn segment(&self, at: SegmentRef) -> Option<&SegmentRecord> {
        self.records.get(at.series)?.segments.get(at.segment)
    }

    fn segment_mut(&mut self, at: SegmentRef) -> Option<&mut SegmentRecord> {
        self.records.get_mut(at.series)?.segments.get_mut(at.segment)
    }

    #[must_use]
    pub fn records(&self) -> &[SeriesRecord] {
        &self.records
    }

    #[must_use]
    pub fn series_count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub const fn params(&self) -> LayoutParams {
        self.params
    }

    #[must_use]
    pub const fn style(&self) -> &ThemeStyle {
        &self.style
    }

    #[must_use]
    pub const fn is_top_down(&self) -> bool {
        self.top_down
    }

    #[must_use]
    pub const fn stats(&self) -> LayoutStats {
        self.stats
    }
}

fn build_tube(
    positions: &[Point3],
    box_width: f64,
    base: [f64; 3],
    accent: Rgb,
) -> Option<GeomMesh> {
    let curve = match CatmullRomCurve::centripetal(positions) {
        Ok(curve) => curve,
        Err(err) => {
            log::warn!("skipping tube: {err}");
            return None;
        }
    };
    match tube_mesh(&curve, TubeOptions::for_box_width(box_width)) {
        Ok(mut mesh) => {
            let floor = -BOX_HEIGHT / 2.0;
            apply_height_gradient(&mut mesh, base, accent.to_array(), floor, BOX_HEIGHT);
            Some(mesh)
        }
        Err(err) => {
            log::warn!("skipping tube: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::data::Entry;

    fn data() -> Vec<Series> {
        vec![
            Series::new(
                "Pull-ups",
                vec![
                    Entry::new("Start", vec![]),
                    Entry::new("Mon", vec![5.0, 5.0, 4.0]),
                    Entry::new("Tue", vec![6.0]),
                ],
            ),
            Series::new(
                "Squats",
                vec![Entry::new("Start", vec![]), Entry::new("Mon", vec![20.0, 15.0])],
            ),
        ]
    }

    fn engine() -> LayoutEngine {
        let theme = Rgb::from_hex("#7d33ff").unwrap();
        LayoutEngine::build(
            &data(),
            theme,
            ThemeStyle::derive(theme, true),
            LayoutParams::new(250.0, 240.0),
            false,
        )
    }

    #[test]
    fn build_runs_one_full_pass() {
        let e = engine();
        assert_eq!(e.stats().passes, 1);
        assert_eq!(e.stats().rebuild_passes, 1);
        assert_eq!(e.records().len(), 2);
        assert!(e.records().iter().all(|r| r.tube.is_some()));
        assert_eq!(e.records()[0].segments.len(), 2);
        assert_eq!(e.records()[0].markers[3].radius, NODE_MARKER_RADIUS);
        assert_eq!(e.records()[0].markers[1].radius, SET_MARKER_RADIUS);
    }

    #[test]
    fn segment_volumes_respect_minimums() {
        let e = engine();
        for seg in e.records().iter().flat_map(|r| &r.segments) {
            let size = seg.size();
            assert!(size.x >= 24.0 - 1e-9);
            assert!(size.y >= 24.0 - 1e-9);
            assert!(size.z >= 40.0 - 1e-9);
            assert_eq!(seg.mesh.colors.len(), seg.mesh.positions.len());
        }
    }

    #[test]
    fn interpolated_passes_leave_segments_alone() {
        let mut e = engine();
        let before = e.records()[0].segments[0].volume;
        e.apply_layout(LayoutParams::new(500.0, 100.0), false);
        assert_eq!(e.records()[0].segments[0].volume, before);
        assert_eq!(e.stats().rebuild_passes, 1);

        e.apply_layout(LayoutParams::new(500.0, 100.0), true);
        assert_ne!(e.records()[0].segments[0].volume, before);
    }

    #[test]
    fn pick_finds_segment_under_ray() {
        let e = engine();
        let target = e.records()[1].segments[0].center();
        let ray = Ray {
            origin: Point3::new(target.x, 1000.0, target.z),
            direction: Vec3::new(0.0, -1.0, 0.0),
        };
        assert_eq!(e.pick(&ray), Some(SegmentRef { series: 1, segment: 0 }));

        let miss = Ray {
            origin: Point3::new(10_000.0, 1000.0, 0.0),
            direction: Vec3::new(0.0, -1.0, 0.0),
        };
        assert_eq!(e.pick(&miss), None);
    }

    #[test]
    fn focus_dims_other_series() {
        let mut e = engine();
        e.focus_series(Some(0));
        assert_eq!(e.records()[0].tube_opacity.target, TUBE_BASE_OPACITY);
        assert_eq!(e.records()[1].tube_opacity.target, DIMMED_OPACITY);
        assert_eq!(e.records()[1].marker_opacity.target, DIMMED_OPACITY);
        assert!(e.blend_opacities());

        e.focus_series(None);
        assert_eq!(e.records()[1].tube_opacity.target, TUBE_BASE_OPACITY);
    }

    #[test]
    fn reorienting_changes_only_alpha() {
        let mut e = engine();
        let before = e.records()[0].segments[0].mesh.clone();
        e.reorient_gradients(true);
        let after = &e.records()[0].segments[0].mesh;
        assert_eq!(before.positions, after.positions);
        assert!(before.colors.iter().zip(&after.colors).all(|(a, b)| a[..3] == b[..3]));
        assert_ne!(before.colors, after.colors);
    }

    #[test]
    fn dispose_reports_released_geometry() {
        let mut e = engine();
        let released = e.dispose();
        assert_eq!(released.series, 2);
        assert_eq!(released.tubes, 2);
        assert_eq!(released.markers, 5 + 3);
        assert_eq!(released.segments, 3);
        assert!(e.dispose().is_empty());
        assert_eq!(e.bounds(), None);
    }
}
