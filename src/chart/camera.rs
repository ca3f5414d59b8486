//! Camera poses, framing and picking for the orthographic chart camera.
//!
//! End poses for both view modes come from [`compute_end_pose`], a pure
//! function of the mode, the scene framing and the viewport. The orientation
//! is the look-at rotation of a camera placed at the end position and aimed
//! at the end target with +Y up.

use serde::Serialize;

use crate::geom::{BBox, Point3, Quat, Transform, Vec3};

use super::mapper::{BOX_HEIGHT, LayoutParams};

/// Default 3D box width.
pub const ORBIT_BOX_WIDTH: f64 = 250.0;
/// Share of the orthographic view the flat layout fills.
pub const FLAT_FILL: f64 = 0.85;
/// Smallest extent used for framing.
const MIN_FRAMING_DIM: f64 = 50.0;
/// Viewport sides are clamped to this many pixels.
pub const MIN_VIEWPORT_PX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    #[default]
    Orbit,
    Flat,
}

impl ViewMode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Orbit => Self::Flat,
            Self::Flat => Self::Orbit,
        }
    }

    #[must_use]
    pub const fn is_flat(self) -> bool {
        matches!(self, Self::Flat)
    }
}

/// Container size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Both sides clamped to [`MIN_VIEWPORT_PX`].
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        let side = |v: f64| if v.is_finite() { v.max(MIN_VIEWPORT_PX) } else { MIN_VIEWPORT_PX };
        Self {
            width: side(width),
            height: side(height),
        }
    }

    #[must_use]
    pub fn aspect(self) -> f64 {
        self.width / self.height
    }

    /// Container-relative pixels to normalized device coordinates.
    #[must_use]
    pub fn to_ndc(self, x: f64, y: f64) -> (f64, f64) {
        (x / self.width * 2.0 - 1.0, -(y / self.height) * 2.0 + 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Point3,
    pub target: Point3,
    pub orientation: Quat,
    /// Orthographic zoom as reported by the host controller.
    pub zoom: f64,
}

impl CameraPose {
    /// Pose at `position` aimed at `target`, +Y up.
    #[must_use]
    pub fn looking_at(position: Point3, target: Point3) -> Self {
        Self {
            position,
            target,
            orientation: look_at_orientation(position, target),
            zoom: 1.0,
        }
    }

    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.orientation.rotate(Vec3::new(0.0, 0.0, -1.0))
    }

    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.orientation.rotate(Vec3::Y)
    }

    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.orientation.rotate(Vec3::X)
    }

    /// Unit vector from the target towards the camera.
    #[must_use]
    pub fn view_direction(&self) -> Option<Vec3> {
        (self.position - self.target).normalized()
    }
}

/// Orientation of a camera at `eye` looking at `target` with +Y up. A view
/// straight along Y is nudged by 1e-4 on Z.
#[must_use]
pub fn look_at_orientation(eye: Point3, target: Point3) -> Quat {
    Transform::look_at(eye, target, Vec3::Y)
        .or_else(|| Transform::look_at(eye.add_vec(Vec3::new(0.0, 0.0, 1e-4)), target, Vec3::Y))
        .map_or(Quat::IDENTITY, |t| Quat::from_rotation(&t))
}

/// Framing derived once from the initial 3D layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneFraming {
    pub center: Point3,
    pub max_dim: f64,
    pub view_size: f64,
}

impl SceneFraming {
    #[must_use]
    pub fn from_bounds(bounds: Option<BBox>) -> Self {
        let (center, size) =
            bounds.map_or((Point3::ORIGIN, Vec3::ZERO), |b| (b.center(), b.size()));
        let max_dim = size.max_component().max(MIN_FRAMING_DIM);
        Self {
            center,
            max_dim,
            view_size: max_dim * 1.2,
        }
    }

    #[must_use]
    pub fn orbit_position(&self) -> Point3 {
        self.center.add_vec(Vec3::new(-0.5, 0.4, 0.8).mul_scalar(self.max_dim))
    }

    #[must_use]
    pub fn flat_position(&self) -> Point3 {
        self.center.add_vec(Vec3::new(0.0, self.max_dim, 1.0))
    }

    #[must_use]
    pub fn frustum(&self, viewport: Viewport) -> OrthoFrustum {
        let half_h = self.view_size / 2.0;
        let half_w = half_h * viewport.aspect();
        OrthoFrustum {
            left: -half_w,
            right: half_w,
            top: half_h,
            bottom: -half_h,
            near: -self.max_dim * 3.0,
            far: self.max_dim * 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrthoFrustum {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub near: f64,
    pub far: f64,
}

/// Box dimensions of the orbit layout for `series_count` series.
#[must_use]
pub fn orbit_dims(series_count: usize) -> LayoutParams {
    LayoutParams::new(ORBIT_BOX_WIDTH, series_count as f64 * BOX_HEIGHT)
}

/// Box dimensions filling the orthographic view.
#[must_use]
pub fn flat_dims(view_size: f64, aspect: f64) -> LayoutParams {
    LayoutParams::new(view_size * aspect * FLAT_FILL, view_size * FLAT_FILL)
}

/// Camera pose and box dimensions a transition ends at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTarget {
    pub pose: CameraPose,
    pub dims: LayoutParams,
}

/// Canonical end state for `mode`. Independent of the current camera.
#[must_use]
pub fn compute_end_pose(
    mode: ViewMode,
    framing: &SceneFraming,
    viewport: Viewport,
    series_count: usize,
) -> ViewTarget {
    let (position, dims) = match mode {
        ViewMode::Orbit => (framing.orbit_position(), orbit_dims(series_count)),
        ViewMode::Flat => (
            framing.flat_position(),
            flat_dims(framing.view_size, viewport.aspect()),
        ),
    };

    ViewTarget {
        pose: CameraPose::looking_at(position, framing.center),
        dims,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vec3,
}

/// Orthographic picking ray: starts on the near plane under the pointer and
/// runs along the view direction.
#[must_use]
pub fn picking_ray(pose: &CameraPose, frustum: &OrthoFrustum, ndc: (f64, f64)) -> Ray {
    let zoom = if pose.zoom > 0.0 && pose.zoom.is_finite() { pose.zoom } else { 1.0 };
    let half_w = (frustum.right - frustum.left) / 2.0 / zoom;
    let half_h = (frustum.top - frustum.bottom) / 2.0 / zoom;
    let cx = (frustum.right + frustum.left) / 2.0;
    let cy = (frustum.top + frustum.bottom) / 2.0;

    let forward = pose.forward();
    let origin = pose
        .position
        .add_vec(pose.right().mul_scalar(cx + ndc.0 * half_w))
        .add_vec(pose.up().mul_scalar(cy + ndc.1 * half_h))
        .add_vec(forward.mul_scalar(frustum.near));

    Ray {
        origin,
        direction: forward,
    }
}
