//! Serializable snapshot submitted to the render host after every tick.
//!
//! Mesh buffers are only attached when they changed since the previous
//! frame; everything else is sent every time.

use serde::Serialize;

use crate::geom::GeomMesh;

use super::camera::{CameraPose, OrthoFrustum, ViewMode};
use super::config::ControlsPolicy;
use super::interaction::{GridPlacement, SegmentRef, TooltipContent};
use super::layout::{Marker, SegmentRecord, SeriesRecord};
use super::mapper::LayoutParams;
use super::theme::{Rgb, ThemeStyle};

const MIN_ZOOM: f64 = 0.3;
const MAX_ZOOM: f64 = 4.0;
const DAMPING_FACTOR: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshFrame {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub indices: Vec<u32>,
}

impl From<&GeomMesh> for MeshFrame {
    fn from(mesh: &GeomMesh) -> Self {
        Self {
            positions: mesh.positions_f32(),
            colors: mesh.colors_f32(),
            indices: mesh.indices.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraFrame {
    pub position: [f64; 3],
    pub target: [f64; 3],
    pub quaternion: [f64; 4],
    pub frustum: OrthoFrustum,
    /// True while a transition drives the camera; the host controller
    /// should not override it.
    pub driven: bool,
}

impl CameraFrame {
    #[must_use]
    pub fn new(pose: &CameraPose, frustum: OrthoFrustum, driven: bool) -> Self {
        Self {
            position: pose.position.to_array(),
            target: pose.target.to_array(),
            quaternion: pose.orientation.to_array(),
            frustum,
            driven,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsFrame {
    #[serde(flatten)]
    pub policy: ControlsPolicy,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub damping_factor: f64,
}

impl From<ControlsPolicy> for ControlsFrame {
    fn from(policy: ControlsPolicy) -> Self {
        Self {
            policy,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            damping_factor: DAMPING_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerFrame {
    pub position: [f64; 3],
    pub radius: f64,
}

impl From<&Marker> for MarkerFrame {
    fn from(marker: &Marker) -> Self {
        Self {
            position: marker.position.to_array(),
            radius: marker.radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesFrame {
    pub name: String,
    pub accent: Rgb,
    pub tube_opacity: f64,
    pub marker_opacity: f64,
    pub markers: Vec<MarkerFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tube: Option<MeshFrame>,
}

impl SeriesFrame {
    #[must_use]
    pub fn new(record: &SeriesRecord, with_tube: bool) -> Self {
        Self {
            name: record.name.clone(),
            accent: record.accent,
            tube_opacity: record.tube_opacity.current,
            marker_opacity: record.marker_opacity.current,
            markers: record.markers.iter().map(MarkerFrame::from).collect(),
            tube: if with_tube {
                record.tube.as_ref().map(MeshFrame::from)
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentFrame {
    #[serde(flatten)]
    pub at: SegmentRef,
    pub center: [f64; 3],
    pub size: [f64; 3],
    pub opacity: f64,
    /// Local to `center`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshFrame>,
}

impl SegmentFrame {
    #[must_use]
    pub fn new(at: SegmentRef, record: &SegmentRecord, with_mesh: bool) -> Self {
        Self {
            at,
            center: record.center().to_array(),
            size: record.size().to_array(),
            opacity: record.highlight.current,
            mesh: with_mesh.then(|| MeshFrame::from(&record.mesh)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridFrame {
    pub visible: bool,
    pub fill_progress: f64,
    pub target_fill: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<GridPlacement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipFrame {
    pub content: TooltipContent,
    pub left: f64,
    pub top: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameUpdate {
    pub mode: ViewMode,
    pub toggle_caption: String,
    pub camera: CameraFrame,
    pub controls: ControlsFrame,
    pub theme: ThemeStyle,
    pub layout: LayoutParams,
    pub top_down: bool,
    pub series: Vec<SeriesFrame>,
    pub segments: Vec<SegmentFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<SegmentRef>,
    pub grid: GridFrame,
    /// `None` hides the tooltip.
    pub tooltip: Option<TooltipFrame>,
}

impl FrameUpdate {
    /// True when this frame carries new tube buffers.
    #[must_use]
    pub fn has_tube_geometry(&self) -> bool {
        self.series.iter().any(|s| s.tube.is_some())
    }

    /// True when this frame carries new segment volume buffers.
    #[must_use]
    pub fn has_segment_geometry(&self) -> bool {
        self.segments.iter().any(|s| s.mesh.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::config::FlatViewPolicy;

    #[test]
    fn controls_flatten_policy_fields() {
        let frame = ControlsFrame::from(FlatViewPolicy::default().controls(true));
        let json = serde_json::to_value(frame).unwrap();
        assert_eq!(json["enableRotate"], false);
        assert_eq!(json["enablePan"], true);
        assert_eq!(json["minZoom"], 0.3);
        assert_eq!(json["maxZoom"], 4.0);
    }

    #[test]
    fn mesh_buffers_are_flattened() {
        let mesh = GeomMesh::new(
            vec![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0], [6.0, 7.0, 8.0]],
            vec![0, 1, 2],
        );
        let frame = MeshFrame::from(&mesh);
        assert_eq!(frame.positions.len(), 9);
        assert_eq!(frame.colors.len(), 12);
        assert_eq!(frame.indices, vec![0, 1, 2]);
    }
}
