//! Projection of chart points into layout space.

use serde::Serialize;

use crate::geom::Point3;

use super::data::{ChartPoint, SeriesStats};

/// Fixed height of the chart box; Y spans `[-BOX_HEIGHT/2, BOX_HEIGHT/2]`.
pub const BOX_HEIGHT: f64 = 120.0;

/// Share of the half-slot a zig-zag may use along Z.
const Z_PADDING: f64 = 0.9;

/// The two free spatial parameters of a layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutParams {
    pub box_width: f64,
    pub box_depth: f64,
}

impl LayoutParams {
    #[must_use]
    pub const fn new(box_width: f64, box_depth: f64) -> Self {
        Self {
            box_width,
            box_depth,
        }
    }
}

/// Slice of the box depth owned by one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthSlot {
    pub base_z: f64,
    pub max_deviation_z: f64,
}

impl DepthSlot {
    /// Even partition of `box_depth` by `count`, slot `index` counted from -Z.
    #[must_use]
    pub fn for_series(index: usize, count: usize, box_depth: f64) -> Self {
        let depth = box_depth / count.max(1) as f64;
        Self {
            base_z: -box_depth / 2.0 + (index as f64 + 0.5) * depth,
            max_deviation_z: depth / 2.0 * Z_PADDING,
        }
    }
}

#[must_use]
pub fn map_x(point: &ChartPoint, stats: &SeriesStats, box_width: f64) -> f64 {
    let slot = if point.day_index == 0 {
        0.0
    } else {
        (point.day_index - 1) as f64 + point.fraction
    };
    -box_width / 2.0 + (slot / stats.max_days as f64) * box_width
}

#[must_use]
pub fn map_y(cumulative: f64, stats: &SeriesStats) -> f64 {
    -BOX_HEIGHT / 2.0 + (cumulative / stats.max_cumulative) * BOX_HEIGHT
}

#[must_use]
pub fn map_z(point: &ChartPoint, stats: &SeriesStats, slot: DepthSlot) -> f64 {
    if point.is_anchor_node {
        slot.base_z
    } else {
        slot.base_z + (point.set_value / stats.max_set) * slot.max_deviation_z * point.direction
    }
}

#[must_use]
pub fn map_point(
    point: &ChartPoint,
    stats: &SeriesStats,
    params: LayoutParams,
    slot: DepthSlot,
) -> Point3 {
    Point3::new(
        map_x(point, stats, params.box_width),
        map_y(point.cumulative, stats),
        map_z(point, stats, slot),
    )
}

#[must_use]
pub fn map_points(
    points: &[ChartPoint],
    stats: &SeriesStats,
    params: LayoutParams,
    slot: DepthSlot,
) -> Vec<Point3> {
    points
        .iter()
        .map(|p| map_point(p, stats, params, slot))
        .collect()
}
