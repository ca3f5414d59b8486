//! Hover highlighting, the reveal grid, top-down detection and tooltip content.
//!
//! Everything here is plain state stepped by the runtime once per frame.
//! Picking itself lives on [`super::layout::LayoutEngine::pick`].

use serde::Serialize;

use crate::geom::BBox;

use super::camera::{CameraPose, Viewport};
use super::config::Labels;
use super::layout::SegmentMeta;
use super::theme::Rgb;

/// Opacity of series elements that do not belong to the hovered series.
pub const DIMMED_OPACITY: f64 = 0.15;
pub const TUBE_BASE_OPACITY: f64 = 0.8;
pub const MARKER_BASE_OPACITY: f64 = 1.0;

const BLEND_FACTOR: f64 = 0.25;
const SETTLE_EPS: f64 = 0.01;
const REVEAL_STEP: f64 = 0.08;
const GRID_LIFT: f64 = 0.2;
const GRID_CELLS: f64 = 4.0;

const TOOLTIP_OFFSET: f64 = 15.0;
const TOOLTIP_MARGIN: f64 = 10.0;

/// An opacity that approaches its target by a fixed share each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FadingOpacity {
    pub current: f64,
    pub target: f64,
}

impl FadingOpacity {
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self {
            current: value,
            target: value,
        }
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// One blend step. Returns false once within the settle distance; the
    /// value is left where it is in that case.
    pub fn step(&mut self) -> bool {
        if (self.current - self.target).abs() > SETTLE_EPS {
            self.current += (self.target - self.current) * BLEND_FACTOR;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() <= SETTLE_EPS
    }
}

/// Address of one day segment in the layout arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRef {
    pub series: usize,
    pub segment: usize,
}

/// Grid overlay revealed inside the hovered segment.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RevealGrid {
    target_fill: f64,
    progress: f64,
    visible: bool,
}

impl RevealGrid {
    /// Restart the fill animation from empty.
    pub fn reveal(&mut self) {
        self.target_fill = 1.0;
        self.progress = 0.0;
        self.visible = true;
    }

    pub fn conceal(&mut self) {
        self.target_fill = 0.0;
    }

    pub fn step(&mut self) {
        if self.target_fill == 0.0 {
            if self.progress > 0.0 || self.visible {
                self.progress = 0.0;
                self.visible = false;
            }
        } else if self.progress < 1.0 {
            self.progress = (self.progress + REVEAL_STEP).min(1.0);
        }
    }

    #[must_use]
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    #[must_use]
    pub const fn target_fill(&self) -> f64 {
        self.target_fill
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Where the reveal grid sits for a given segment volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPlacement {
    pub position: [f64; 3],
    /// Rotation about X in radians.
    pub rotation_x: f64,
    pub scale: [f64; 2],
    /// Grid lines per plane axis.
    pub cell_scale: [f64; 2],
}

/// Floor of the volume when looking down on it, its back wall otherwise.
#[must_use]
pub fn grid_placement(volume: BBox, top_down: bool) -> GridPlacement {
    let center = volume.center();
    let size = volume.size();

    if top_down {
        GridPlacement {
            position: [center.x, volume.min.y + GRID_LIFT, center.z],
            rotation_x: -std::f64::consts::FRAC_PI_2,
            scale: [size.x, size.z],
            cell_scale: [size.x / GRID_CELLS, size.z / GRID_CELLS],
        }
    } else {
        GridPlacement {
            position: [center.x, center.y, volume.min.z + GRID_LIFT],
            rotation_x: 0.0,
            scale: [size.x, size.y],
            cell_scale: [size.x / GRID_CELLS, size.y / GRID_CELLS],
        }
    }
}

/// The camera looks down on the chart when the target-to-camera direction
/// is steeper than `threshold` (a cosine).
#[must_use]
pub fn is_top_down(pose: &CameraPose, threshold: f64) -> bool {
    pose.view_direction().is_some_and(|dir| dir.y > threshold)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipRow {
    pub label: String,
    /// Rendered bold by the host when present.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipContent {
    pub title: String,
    pub color: Rgb,
    pub rows: Vec<TooltipRow>,
}

impl TooltipContent {
    #[must_use]
    pub fn for_segment(meta: &SegmentMeta, labels: &Labels) -> Self {
        let sets = meta
            .sets
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" + ");

        Self {
            title: format!("{} ({})", meta.date, meta.series),
            color: meta.color,
            rows: vec![
                TooltipRow {
                    label: label_prefix(&labels.tooltip_daily_total),
                    value: Some(meta.day_total.to_string()),
                },
                TooltipRow {
                    label: format!("{}: {sets}", meta.series),
                    value: None,
                },
                TooltipRow {
                    label: label_prefix(&labels.tooltip_cumulative),
                    value: Some(meta.running_total.to_string()),
                },
            ],
        }
    }
}

fn label_prefix(label: &str) -> String {
    format!("{}: ", label.trim_end().trim_end_matches(':'))
}

/// Top-left corner of a `size` tooltip near `pointer`, both in
/// container pixels. Flips to the other side of the pointer on overflow and
/// keeps a margin to the container edges.
#[must_use]
pub fn place_tooltip(pointer: (f64, f64), size: (f64, f64), container: Viewport) -> (f64, f64) {
    let place = |p: f64, extent: f64, limit: f64| {
        let mut at = p + TOOLTIP_OFFSET;
        if at + extent > limit {
            at = p - extent - TOOLTIP_OFFSET;
        }
        at.min(limit - extent - TOOLTIP_MARGIN).max(TOOLTIP_MARGIN)
    };

    (
        place(pointer.0, size.0, container.width),
        place(pointer.1, size.1, container.height),
    )
}

/// Result of feeding one pointer sample to [`HoverState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverChange {
    /// Same segment as before, or still nothing.
    Unchanged,
    /// A different segment is now hovered; carries the previous one.
    Entered {
        previous: Option<SegmentRef>,
        current: SegmentRef,
    },
    /// Hover left the last segment.
    Cleared { previous: SegmentRef },
}

/// Current hover selection plus its reveal grid.
#[derive(Debug, Clone, Default)]
pub struct HoverState {
    hovered: Option<SegmentRef>,
    grid: RevealGrid,
    tooltip_visible: bool,
}

impl HoverState {
    #[must_use]
    pub const fn hovered(&self) -> Option<SegmentRef> {
        self.hovered
    }

    #[must_use]
    pub const fn grid(&self) -> &RevealGrid {
        &self.grid
    }

    #[must_use]
    pub const fn tooltip_visible(&self) -> bool {
        self.tooltip_visible
    }

    pub fn update(&mut self, hit: Option<SegmentRef>) -> HoverChange {
        match (self.hovered, hit) {
            (Some(prev), Some(cur)) if prev == cur => {
                self.tooltip_visible = true;
                HoverChange::Unchanged
            }
            (previous, Some(current)) => {
                self.hovered = Some(current);
                self.grid.reveal();
                self.tooltip_visible = true;
                HoverChange::Entered { previous, current }
            }
            (Some(previous), None) => self.clear_with(previous),
            (None, None) => {
                self.tooltip_visible = false;
                HoverChange::Unchanged
            }
        }
    }

    /// Drop the selection, hide the tooltip and start hiding the grid.
    pub fn clear(&mut self) -> HoverChange {
        match self.hovered {
            Some(previous) => self.clear_with(previous),
            None => {
                self.tooltip_visible = false;
                self.grid.conceal();
                HoverChange::Unchanged
            }
        }
    }

    fn clear_with(&mut self, previous: SegmentRef) -> HoverChange {
        self.hovered = None;
        self.tooltip_visible = false;
        self.grid.conceal();
        HoverChange::Cleared { previous }
    }

    pub fn step_grid(&mut self) {
        self.grid.step();
    }
}
