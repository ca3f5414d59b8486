//! Tube mesh generation around a sampled curve.
//!
//! Rings are placed at even arc-length steps along a [`CatmullRomCurve`] and
//! oriented with rotation-minimizing (parallel transport) frames, so the tube
//! does not twist where the curve changes direction. The mesh is open at both
//! ends; chart tubes are thin enough that caps are never visible.

use super::mesh::GeomMesh;
use super::spline::CatmullRomCurve;
use super::{Point3, Tolerance, Vec3};

/// Lower bound for the number of rings along a chart tube.
pub const MIN_TUBULAR_SEGMENTS: usize = 300;
/// Upper bound for the number of rings along a chart tube.
pub const MAX_TUBULAR_SEGMENTS: usize = 1000;

/// Threshold for detecting sharp tangent changes between consecutive rings.
const CUSP_DOT_THRESHOLD: f64 = 0.25;

/// Options for controlling tube mesh generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TubeOptions {
    pub radius: f64,
    /// Number of segments around the circular cross-section.
    pub radial_segments: usize,
    /// Number of segments along the curve; the mesh has one more ring.
    pub tubular_segments: usize,
}

impl Default for TubeOptions {
    fn default() -> Self {
        Self {
            radius: 0.3,
            radial_segments: 8,
            tubular_segments: MIN_TUBULAR_SEGMENTS,
        }
    }
}

impl TubeOptions {
    /// Default options with the segment count scaled to the layout width.
    #[must_use]
    pub fn for_box_width(box_width: f64) -> Self {
        Self {
            tubular_segments: tubular_segments_for_width(box_width),
            ..Self::default()
        }
    }
}

/// `floor(width * 1.5)` clamped to `[300, 1000]`.
#[must_use]
pub fn tubular_segments_for_width(box_width: f64) -> usize {
    let scaled = (box_width * 1.5).floor();
    if !scaled.is_finite() {
        return MIN_TUBULAR_SEGMENTS;
    }
    scaled.clamp(MIN_TUBULAR_SEGMENTS as f64, MAX_TUBULAR_SEGMENTS as f64) as usize
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TubeError {
    #[error("radius must be finite and > 0")]
    InvalidRadius,
    #[error("tube requires at least 3 radial segments")]
    NotEnoughRadialSegments,
    #[error("tube requires at least 1 tubular segment")]
    NotEnoughTubularSegments,
    #[error("curve has zero length")]
    DegenerateCurve,
}

/// Orthonormal frame attached to a point on a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFrame {
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
}

impl CurveFrame {
    /// Fallback frame for a rail with no usable tangent.
    pub const ALONG_X: Self = Self {
        tangent: Vec3::X,
        normal: Vec3::Z,
        binormal: Vec3::new(0.0, -1.0, 0.0),
    };

    /// Frame from a tangent, choosing a normal away from the world X axis.
    #[must_use]
    pub fn from_tangent(tangent: Vec3) -> Option<Self> {
        let tangent = tangent.normalized()?;
        let reference = if tangent.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };

        let normal = tangent.cross(reference).normalized()?;
        let binormal = tangent.cross(normal);

        Some(Self {
            tangent,
            normal,
            binormal,
        })
    }
}

/// Build a tube around `curve`. Colors default to opaque white; see
/// [`apply_height_gradient`].
pub fn tube_mesh(curve: &CatmullRomCurve, options: TubeOptions) -> Result<GeomMesh, TubeError> {
    tube_mesh_with_tolerance(curve, options, Tolerance::DEFAULT)
}

pub fn tube_mesh_with_tolerance(
    curve: &CatmullRomCurve,
    options: TubeOptions,
    tol: Tolerance,
) -> Result<GeomMesh, TubeError> {
    if !options.radius.is_finite() || options.radius <= tol.eps {
        return Err(TubeError::InvalidRadius);
    }
    if options.radial_segments < 3 {
        return Err(TubeError::NotEnoughRadialSegments);
    }
    if options.tubular_segments == 0 {
        return Err(TubeError::NotEnoughTubularSegments);
    }
    if curve.length() <= tol.eps {
        return Err(TubeError::DegenerateCurve);
    }

    let segments = options.tubular_segments;
    let rail: Vec<Point3> = curve.spaced_points(segments);
    let tangents: Vec<Option<Vec3>> = (0..=segments)
        .map(|i| curve.tangent_at(i as f64 / segments as f64))
        .collect();

    let (frames, cusps) = compute_rail_frames(&rail, &tangents, tol);
    if cusps > 0 {
        log::trace!("tube rail has {cusps} sharp tangent changes");
    }

    let radial_segments = options.radial_segments;
    let ring_count = rail.len();
    let mut positions: Vec<[f64; 3]> = Vec::with_capacity(ring_count * radial_segments);

    for (origin, frame) in rail.iter().zip(frames.iter()) {
        for seg in 0..radial_segments {
            let angle = 2.0 * std::f64::consts::PI * seg as f64 / radial_segments as f64;
            // Matches the winding of a standard tube: -cos along the normal.
            let local_n = -options.radius * angle.cos();
            let local_b = options.radius * angle.sin();

            let world = origin
                .add_vec(frame.normal.mul_scalar(local_n))
                .add_vec(frame.binormal.mul_scalar(local_b));
            positions.push(world.to_array());
        }
    }

    let mut indices: Vec<u32> = Vec::with_capacity((ring_count - 1) * radial_segments * 6);
    for r in 0..ring_count - 1 {
        for seg in 0..radial_segments {
            let seg_next = (seg + 1) % radial_segments;

            let i0 = (r * radial_segments + seg) as u32;
            let i1 = (r * radial_segments + seg_next) as u32;
            let i2 = ((r + 1) * radial_segments + seg_next) as u32;
            let i3 = ((r + 1) * radial_segments + seg) as u32;

            indices.extend_from_slice(&[i0, i3, i1]);
            indices.extend_from_slice(&[i3, i2, i1]);
        }
    }

    Ok(GeomMesh::new(positions, indices))
}

/// Blend vertex colors from `base` at `floor_y` to `accent` at
/// `floor_y + height`, clamped outside that band. Alpha is set to 1.
pub fn apply_height_gradient(
    mesh: &mut GeomMesh,
    base: [f64; 3],
    accent: [f64; 3],
    floor_y: f64,
    height: f64,
) {
    let height = if height.abs() > 0.0 { height } else { 1.0 };
    mesh.colors = mesh
        .positions
        .iter()
        .map(|p| {
            let f = ((p[1] - floor_y) / height).clamp(0.0, 1.0);
            [
                base[0] + (accent[0] - base[0]) * f,
                base[1] + (accent[1] - base[1]) * f,
                base[2] + (accent[2] - base[2]) * f,
                1.0,
            ]
        })
        .collect();
}

/// Rotation-minimizing frames along `rail`. `tangents[i]` is the preferred
/// tangent at ring `i`; missing ones fall back to finite differences and then
/// to the previous frame. Returns the frames and the number of sharp turns.
fn compute_rail_frames(
    rail: &[Point3],
    tangents: &[Option<Vec3>],
    tol: Tolerance,
) -> (Vec<CurveFrame>, usize) {
    let mut frames: Vec<CurveFrame> = Vec::with_capacity(rail.len());
    let mut cusps = 0usize;

    for i in 0..rail.len() {
        let tangent = tangents
            .get(i)
            .copied()
            .flatten()
            .or_else(|| rail_difference(rail, i).normalized());

        let Some(prev) = frames.last().copied() else {
            let first = tangent
                .and_then(CurveFrame::from_tangent)
                .unwrap_or(CurveFrame::ALONG_X);
            frames.push(first);
            continue;
        };

        let tangent = tangent.unwrap_or(prev.tangent);
        if prev.tangent.dot(tangent) < CUSP_DOT_THRESHOLD {
            cusps += 1;
        }
        frames.push(parallel_transport_frame(&prev, tangent, tol));
    }

    (frames, cusps)
}

fn rail_difference(rail: &[Point3], i: usize) -> Vec3 {
    let last = rail.len().saturating_sub(1);
    let prev = rail[i.saturating_sub(1)];
    let next = rail[(i + 1).min(last)];
    next - prev
}

fn parallel_transport_frame(prev: &CurveFrame, new_tangent: Vec3, tol: Tolerance) -> CurveFrame {
    let old_tangent = prev.tangent;
    let cross = old_tangent.cross(new_tangent);

    if cross.length_squared() < tol.eps_squared() {
        let sign = if old_tangent.dot(new_tangent) < 0.0 { -1.0 } else { 1.0 };
        return CurveFrame {
            tangent: new_tangent,
            normal: prev.normal.mul_scalar(sign),
            binormal: prev.binormal.mul_scalar(sign),
        };
    }

    let axis = cross.normalized().unwrap_or(Vec3::Z);
    let angle = old_tangent.dot(new_tangent).clamp(-1.0, 1.0).acos();

    let normal = rotate_vector(prev.normal, axis, angle)
        .normalized()
        .unwrap_or(prev.normal);
    let binormal = new_tangent
        .cross(normal)
        .normalized()
        .unwrap_or(prev.binormal);

    CurveFrame {
        tangent: new_tangent,
        normal,
        binormal,
    }
}

/// Rodrigues rotation of `v` about unit `axis`.
fn rotate_vector(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    v.mul_scalar(cos) + axis.cross(v).mul_scalar(sin) + axis.mul_scalar(axis.dot(v) * (1.0 - cos))
}
