mod core;
mod mesh;
mod pick;
mod spline;
mod tube;
mod volume;

pub use core::{BBox, Point3, Quat, Tolerance, Transform, Vec3};
pub use mesh::GeomMesh;
pub use pick::{HitBoxes, RayHit};
pub use spline::{CatmullRomCurve, CurveParameterization, SplineError};
pub use tube::{
    CurveFrame, MAX_TUBULAR_SEGMENTS, MIN_TUBULAR_SEGMENTS, TubeError, TubeOptions,
    apply_height_gradient, tube_mesh, tube_mesh_with_tolerance, tubular_segments_for_width,
};
pub use volume::{
    GradientAxis, VolumePadding, apply_falloff, box_mesh, falloff_alpha, padded_volume,
    reorient_falloff,
};

#[cfg(test)]
mod tests;
