use crate::geom::{CatmullRomCurve, CurveParameterization, Point3, SplineError, Tolerance};

fn close(a: Point3, b: Point3) -> bool {
    Tolerance::new(1e-6).approx_eq_point3(a, b)
}

fn zigzag() -> Vec<Point3> {
    vec![
        Point3::new(-125.0, -60.0, 0.0),
        Point3::new(-110.0, -40.0, 12.0),
        Point3::new(-95.0, -20.0, -12.0),
        Point3::new(-80.0, -5.0, 0.0),
        Point3::new(0.0, 60.0, 0.0),
    ]
}

#[test]
fn centripetal_curve_passes_through_control_points() {
    let points = zigzag();
    let curve = CatmullRomCurve::centripetal(&points).expect("curve");
    let last = (points.len() - 1) as f64;

    for (i, p) in points.iter().enumerate() {
        let on_curve = curve.point(i as f64 / last);
        assert!(close(on_curve, *p), "point {i}: {on_curve:?} != {p:?}");
    }
}

#[test]
fn curve_endpoints_match_first_and_last_points() {
    let points = zigzag();
    let curve = CatmullRomCurve::centripetal(&points).expect("curve");

    assert!(close(curve.point_at(0.0), points[0]));
    assert!(close(curve.point_at(1.0), points[points.len() - 1]));
    // Out-of-range parameters clamp.
    assert!(close(curve.point(-1.0), points[0]));
    assert!(close(curve.point(2.0), points[points.len() - 1]));
}

#[test]
fn evenly_spaced_collinear_points_give_a_straight_line() {
    let points: Vec<Point3> = (0..5).map(|i| Point3::new(i as f64 * 10.0, 0.0, 0.0)).collect();
    let curve = CatmullRomCurve::centripetal(&points).expect("curve");

    let mid = curve.point_at(0.5);
    assert!(close(mid, Point3::new(20.0, 0.0, 0.0)), "mid = {mid:?}");
    assert!((curve.length() - 40.0).abs() < 1e-6);

    for p in curve.spaced_points(20) {
        assert!(p.y.abs() < 1e-9 && p.z.abs() < 1e-9);
    }
}

#[test]
fn spaced_points_include_both_ends() {
    let curve = CatmullRomCurve::centripetal(&zigzag()).expect("curve");
    let samples = curve.spaced_points(300);
    assert_eq!(samples.len(), 301);
    assert!(samples.iter().all(|p| p.is_finite()));
}

#[test]
fn coincident_control_points_stay_finite() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(5.0, 1.0, 0.0),
        Point3::new(5.0, 1.0, 0.0),
    ];
    let curve = CatmullRomCurve::centripetal(&points).expect("curve");

    for i in 0..=50 {
        let p = curve.point(i as f64 / 50.0);
        assert!(p.is_finite(), "non-finite at sample {i}");
    }
}

#[test]
fn uniform_and_chordal_curves_interpolate_too() {
    let points = zigzag();
    for param in [CurveParameterization::Uniform, CurveParameterization::Chordal] {
        let curve =
            CatmullRomCurve::new(&points, param, CatmullRomCurve::DEFAULT_TENSION).expect("curve");
        assert!(close(curve.point(0.5), points[2]), "{param:?}");
    }
}

#[test]
fn curve_rejects_bad_input() {
    assert_eq!(
        CatmullRomCurve::centripetal(&[Point3::ORIGIN]).unwrap_err(),
        SplineError::TooFewPoints
    );
    assert_eq!(
        CatmullRomCurve::centripetal(&[Point3::ORIGIN, Point3::new(f64::NAN, 0.0, 0.0)])
            .unwrap_err(),
        SplineError::NonFinitePoint
    );
}

#[test]
fn tangent_follows_curve_direction() {
    let points: Vec<Point3> = (0..4).map(|i| Point3::new(0.0, i as f64 * 3.0, 0.0)).collect();
    let curve = CatmullRomCurve::centripetal(&points).expect("curve");
    let tangent = curve.tangent_at(0.5).expect("tangent");
    assert!((tangent.y - 1.0).abs() < 1e-6);
}
