//! Padded hit volumes and their translucent box meshes.

use super::mesh::GeomMesh;
use super::{BBox, Point3, Vec3};

/// Minimum extents applied before padding, and the padding added on top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumePadding {
    pub min_width: f64,
    pub min_height: f64,
    pub min_depth: f64,
    pub pad: f64,
}

impl Default for VolumePadding {
    fn default() -> Self {
        Self {
            min_width: 8.0,
            min_height: 8.0,
            min_depth: 24.0,
            pad: 16.0,
        }
    }
}

impl VolumePadding {
    #[must_use]
    pub fn apply(self, size: Vec3) -> Vec3 {
        Vec3::new(
            size.x.max(self.min_width) + self.pad,
            size.y.max(self.min_height) + self.pad,
            size.z.max(self.min_depth) + self.pad,
        )
    }
}

/// Bounds of `points`, grown to the padded minimum size around the same center.
/// `None` for an empty slice.
#[must_use]
pub fn padded_volume(points: &[Point3], padding: VolumePadding) -> Option<BBox> {
    let bounds = BBox::from_points(points)?;
    Some(BBox::from_center_size(
        bounds.center(),
        padding.apply(bounds.size()),
    ))
}

/// Axis along which the volume alpha fades out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientAxis {
    /// Fade along +Y; used when the camera looks down on the chart.
    Vertical,
    /// Fade along +Z.
    #[default]
    Depth,
}

impl GradientAxis {
    #[must_use]
    pub const fn for_top_down(top_down: bool) -> Self {
        if top_down { Self::Vertical } else { Self::Depth }
    }

    const fn component(self, v: [f64; 3]) -> f64 {
        match self {
            Self::Vertical => v[1],
            Self::Depth => v[2],
        }
    }

    const fn extent(self, size: Vec3) -> f64 {
        match self {
            Self::Vertical => size.y,
            Self::Depth => size.z,
        }
    }
}

/// `((1 - local + size/2) / size)^5`, clamped to [0, 1]. `local` is measured
/// from the volume center.
#[must_use]
pub fn falloff_alpha(local: f64, size: f64) -> f64 {
    if size <= 0.0 || !size.is_finite() {
        return 0.0;
    }
    ((1.0 - local + size * 0.5) / size).powi(5).clamp(0.0, 1.0)
}

/// Subdivided box of the given size centered on the origin, `segments`
/// subdivisions per edge on every face.
#[must_use]
pub fn box_mesh(size: Vec3, segments: usize) -> GeomMesh {
    let s = segments.max(1);
    let mut positions = Vec::with_capacity(6 * (s + 1) * (s + 1));
    let mut indices = Vec::with_capacity(6 * s * s * 6);

    let (w, h, d) = (size.x, size.y, size.z);
    // (u axis, v axis, w axis, u dir, v dir, u extent, v extent, w extent)
    let faces: [(usize, usize, usize, f64, f64, f64, f64, f64); 6] = [
        (2, 1, 0, -1.0, -1.0, d, h, w),
        (2, 1, 0, 1.0, -1.0, d, h, -w),
        (0, 2, 1, 1.0, 1.0, w, d, h),
        (0, 2, 1, 1.0, -1.0, w, d, -h),
        (0, 1, 2, 1.0, -1.0, w, h, d),
        (0, 1, 2, -1.0, -1.0, w, h, -d),
    ];

    for (u, v, wa, udir, vdir, width, height, depth) in faces {
        let offset = positions.len() as u32;
        let row = (s + 1) as u32;

        for iy in 0..=s {
            let y = iy as f64 * height / s as f64 - height * 0.5;
            for ix in 0..=s {
                let x = ix as f64 * width / s as f64 - width * 0.5;
                let mut p = [0.0; 3];
                p[u] = x * udir;
                p[v] = y * vdir;
                p[wa] = depth * 0.5;
                positions.push(p);
            }
        }

        for iy in 0..s as u32 {
            for ix in 0..s as u32 {
                let a = offset + ix + row * iy;
                let b = offset + ix + row * (iy + 1);
                let c = offset + (ix + 1) + row * (iy + 1);
                let e = offset + (ix + 1) + row * iy;
                indices.extend_from_slice(&[a, b, e]);
                indices.extend_from_slice(&[b, c, e]);
            }
        }
    }

    GeomMesh::new(positions, indices)
}

/// Paint every vertex `color` with the falloff alpha along `axis`.
/// Positions must be local to the volume center.
pub fn apply_falloff(mesh: &mut GeomMesh, size: Vec3, axis: GradientAxis, color: [f64; 3]) {
    let extent = axis.extent(size);
    mesh.colors = mesh
        .positions
        .iter()
        .map(|p| {
            let alpha = falloff_alpha(axis.component(*p), extent);
            [color[0], color[1], color[2], alpha]
        })
        .collect();
}

/// Re-derive alpha only, keeping the existing RGB.
pub fn reorient_falloff(mesh: &mut GeomMesh, size: Vec3, axis: GradientAxis) {
    let extent = axis.extent(size);
    for (color, p) in mesh.colors.iter_mut().zip(mesh.positions.iter()) {
        color[3] = falloff_alpha(axis.component(*p), extent);
    }
}
