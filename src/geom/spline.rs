//! Interpolating Catmull-Rom curves through chart points.
//!
//! The curve passes through every control point. With the default
//! `Centripetal` parameterization the knot spacing follows the square root of
//! the chord length, which keeps the curve from overshooting or forming cusps
//! when neighbouring points are unevenly spaced (a day with five sets next to
//! a day with one). Open curves extrapolate a phantom control point at each
//! end, so the first and last spans are well defined.

use super::{Point3, Tolerance, Vec3};

/// Number of chords used to build the arc-length lookup table.
const ARC_LENGTH_DIVISIONS: usize = 200;

/// Knot parameterization of the spline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveParameterization {
    /// Uniform knots; tangents are scaled by the curve's `tension`.
    Uniform,
    /// Knot interval = chord length^0.5. Avoids cusps and self-intersections.
    #[default]
    Centripetal,
    /// Knot interval = chord length.
    Chordal,
}

impl CurveParameterization {
    /// Exponent applied to the squared chord length.
    fn knot_power(self) -> f64 {
        match self {
            Self::Uniform => 0.0,
            Self::Centripetal => 0.25,
            Self::Chordal => 0.5,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SplineError {
    #[error("curve requires at least 2 control points")]
    TooFewPoints,
    #[error("curve control points must be finite")]
    NonFinitePoint,
}

/// Cubic polynomial `c0 + c1 t + c2 t² + c3 t³` for one coordinate of one span.
#[derive(Debug, Clone, Copy)]
struct CubicPoly {
    c0: f64,
    c1: f64,
    c2: f64,
    c3: f64,
}

impl CubicPoly {
    fn hermite(x0: f64, x1: f64, t0: f64, t1: f64) -> Self {
        Self {
            c0: x0,
            c1: t0,
            c2: -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1,
            c3: 2.0 * x0 - 2.0 * x1 + t0 + t1,
        }
    }

    fn uniform(x0: f64, x1: f64, x2: f64, x3: f64, tension: f64) -> Self {
        Self::hermite(x1, x2, tension * (x2 - x0), tension * (x3 - x1))
    }

    fn non_uniform(x0: f64, x1: f64, x2: f64, x3: f64, dt0: f64, dt1: f64, dt2: f64) -> Self {
        let mut t1 = (x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1;
        let mut t2 = (x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2;

        // Rescale tangents for parameter range [0, 1] of the middle span.
        t1 *= dt1;
        t2 *= dt1;

        Self::hermite(x1, x2, t1, t2)
    }

    fn eval(self, t: f64) -> f64 {
        let t2 = t * t;
        let t3 = t2 * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t3
    }
}

/// Open Catmull-Rom curve through an ordered list of control points.
#[derive(Debug, Clone)]
pub struct CatmullRomCurve {
    points: Vec<Point3>,
    parameterization: CurveParameterization,
    tension: f64,
    arc_lengths: Vec<f64>,
}

impl CatmullRomCurve {
    /// Default tension; only affects `Uniform` parameterization.
    pub const DEFAULT_TENSION: f64 = 0.5;

    /// Centripetal curve with the default tension.
    pub fn centripetal(points: &[Point3]) -> Result<Self, SplineError> {
        Self::new(points, CurveParameterization::Centripetal, Self::DEFAULT_TENSION)
    }

    pub fn new(
        points: &[Point3],
        parameterization: CurveParameterization,
        tension: f64,
    ) -> Result<Self, SplineError> {
        if points.len() < 2 {
            return Err(SplineError::TooFewPoints);
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(SplineError::NonFinitePoint);
        }

        let mut curve = Self {
            points: points.to_vec(),
            parameterization,
            tension,
            arc_lengths: Vec::new(),
        };
        curve.arc_lengths = curve.compute_arc_lengths(ARC_LENGTH_DIVISIONS);
        Ok(curve)
    }

    /// Total arc length (chord approximation).
    #[must_use]
    pub fn length(&self) -> f64 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at curve parameter `t` in [0, 1]; spans are spaced uniformly in `t`.
    #[must_use]
    pub fn point(&self, t: f64) -> Point3 {
        let points = &self.points;
        let l = points.len();

        let p = (l - 1) as f64 * t.clamp(0.0, 1.0);
        let mut span = p.floor() as usize;
        let mut weight = p - span as f64;
        if span >= l - 1 {
            span = l - 2;
            weight = 1.0;
        }

        let p1 = points[span];
        let p2 = points[span + 1];
        let p0 = if span > 0 {
            points[span - 1]
        } else {
            reflect(points[1], points[0])
        };
        let p3 = if span + 2 < l {
            points[span + 2]
        } else {
            reflect(points[l - 2], points[l - 1])
        };

        let (px, py, pz) = match self.parameterization {
            CurveParameterization::Uniform => (
                CubicPoly::uniform(p0.x, p1.x, p2.x, p3.x, self.tension),
                CubicPoly::uniform(p0.y, p1.y, p2.y, p3.y, self.tension),
                CubicPoly::uniform(p0.z, p1.z, p2.z, p3.z, self.tension),
            ),
            param => {
                let pow = param.knot_power();
                let knot = Tolerance::KNOT.eps;
                let mut dt0 = p0.distance_squared_to(p1).powf(pow);
                let mut dt1 = p1.distance_squared_to(p2).powf(pow);
                let mut dt2 = p2.distance_squared_to(p3).powf(pow);

                // Coincident control points.
                if dt1 < knot {
                    dt1 = 1.0;
                }
                if dt0 < knot {
                    dt0 = dt1;
                }
                if dt2 < knot {
                    dt2 = dt1;
                }

                (
                    CubicPoly::non_uniform(p0.x, p1.x, p2.x, p3.x, dt0, dt1, dt2),
                    CubicPoly::non_uniform(p0.y, p1.y, p2.y, p3.y, dt0, dt1, dt2),
                    CubicPoly::non_uniform(p0.z, p1.z, p2.z, p3.z, dt0, dt1, dt2),
                )
            }
        };

        Point3::new(px.eval(weight), py.eval(weight), pz.eval(weight))
    }

    /// Point at normalized arc length `u` in [0, 1].
    #[must_use]
    pub fn point_at(&self, u: f64) -> Point3 {
        self.point(self.arc_length_to_t(u))
    }

    /// Unit tangent at normalized arc length `u`, by central difference.
    #[must_use]
    pub fn tangent_at(&self, u: f64) -> Option<Vec3> {
        let t = self.arc_length_to_t(u);
        let delta = 1e-4;
        let t1 = (t - delta).max(0.0);
        let t2 = (t + delta).min(1.0);
        (self.point(t2) - self.point(t1)).normalized()
    }

    /// `count + 1` points evenly spaced by arc length, endpoints included.
    #[must_use]
    pub fn spaced_points(&self, count: usize) -> Vec<Point3> {
        let count = count.max(1);
        (0..=count)
            .map(|i| self.point_at(i as f64 / count as f64))
            .collect()
    }

    fn compute_arc_lengths(&self, divisions: usize) -> Vec<f64> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut last = self.point(0.0);
        let mut sum = 0.0;
        lengths.push(sum);

        for i in 1..=divisions {
            let current = self.point(i as f64 / divisions as f64);
            sum += current.distance_to(last);
            lengths.push(sum);
            last = current;
        }

        lengths
    }

    fn arc_length_to_t(&self, u: f64) -> f64 {
        let lengths = &self.arc_lengths;
        let il = lengths.len();
        let total = self.length();
        if il < 2 || total <= Tolerance::DEFAULT.eps {
            return u.clamp(0.0, 1.0);
        }

        let target = u.clamp(0.0, 1.0) * total;

        // Largest index with lengths[i] <= target.
        let i = lengths.partition_point(|len| *len <= target).saturating_sub(1);
        if i >= il - 1 {
            return 1.0;
        }

        let before = lengths[i];
        let segment = lengths[i + 1] - before;
        let fraction = if segment > 0.0 {
            (target - before) / segment
        } else {
            0.0
        };

        (i as f64 + fraction) / (il - 1) as f64
    }
}

/// `2 * anchor - other`: phantom control point beyond an open end.
fn reflect(other: Point3, anchor: Point3) -> Point3 {
    Point3::new(
        2.0 * anchor.x - other.x,
        2.0 * anchor.y - other.y,
        2.0 * anchor.z - other.z,
    )
}
