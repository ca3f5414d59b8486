use super::{BBox, Point3, Vec3};

/// Nearest box hit by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Index into the boxes the set was built from.
    pub index: usize,
    /// Ray parameter of the entry point (0 when the origin is inside the box).
    pub t: f64,
}

/// Axis-aligned boxes tested one by one against a ray. Charts carry a few
/// dozen segment volumes at most.
#[derive(Debug, Clone, Default)]
pub struct HitBoxes {
    boxes: Vec<BBox>,
}

impl HitBoxes {
    #[must_use]
    pub fn new(boxes: Vec<BBox>) -> Self {
        Self { boxes }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Closest box along the ray within `t_max`. Ties keep the lower index.
    #[must_use]
    pub fn first_hit(&self, origin: Point3, dir: Vec3, t_max: f64) -> Option<RayHit> {
        self.boxes
            .iter()
            .enumerate()
            .filter_map(|(index, &bbox)| {
                ray_entry(origin, dir, bbox, t_max).map(|t| RayHit { index, t })
            })
            .fold(None, |best: Option<RayHit>, hit| match best {
                Some(b) if b.t <= hit.t => Some(b),
                _ => Some(hit),
            })
    }
}

/// Entry parameter of the ray into `bbox`, clamped at 0.
fn ray_entry(origin: Point3, dir: Vec3, bbox: BBox, t_max: f64) -> Option<f64> {
    let o = origin.to_array();
    let d = dir.to_array();
    let lo = bbox.min.to_array();
    let hi = bbox.max.to_array();

    let mut near = 0.0_f64;
    let mut far = t_max;
    for axis in 0..3 {
        if !(o[axis].is_finite() && d[axis].is_finite()) {
            return None;
        }
        if d[axis] == 0.0 {
            if o[axis] < lo[axis] || o[axis] > hi[axis] {
                return None;
            }
            continue;
        }
        let a = (lo[axis] - o[axis]) / d[axis];
        let b = (hi[axis] - o[axis]) / d[axis];
        near = near.max(a.min(b));
        far = far.min(a.max(b));
        if far < near {
            return None;
        }
    }
    Some(near)
}
