use crate::geom::{
    GradientAxis, Point3, Vec3, VolumePadding, apply_falloff, box_mesh, falloff_alpha,
    padded_volume, reorient_falloff,
};

#[test]
fn single_point_volume_gets_minimum_size() {
    let p = Point3::new(3.0, -4.0, 5.0);
    let volume = padded_volume(&[p], VolumePadding::default()).expect("volume");

    assert_eq!(volume.size(), Vec3::new(24.0, 24.0, 40.0));
    assert_eq!(volume.center(), p);
}

#[test]
fn wide_volume_keeps_extent_plus_padding() {
    let points = [
        Point3::new(0.0, 0.0, -2.0),
        Point3::new(100.0, 30.0, 2.0),
    ];
    let volume = padded_volume(&points, VolumePadding::default()).expect("volume");

    assert_eq!(volume.size(), Vec3::new(116.0, 46.0, 40.0));
    assert_eq!(volume.center(), Point3::new(50.0, 15.0, 0.0));
    assert!(padded_volume(&[], VolumePadding::default()).is_none());
}

#[test]
fn box_mesh_is_subdivided_and_sized() {
    let size = Vec3::new(24.0, 30.0, 40.0);
    let mesh = box_mesh(size, 4);

    assert_eq!(mesh.vertex_count(), 6 * 25);
    assert_eq!(mesh.triangle_count(), 6 * 16 * 2);
    assert!(mesh.has_valid_indices());

    let bbox = mesh.bbox().expect("bbox");
    assert_eq!(bbox.size(), size);
    assert_eq!(bbox.center(), Point3::ORIGIN);
}

#[test]
fn falloff_is_opaque_at_bottom_and_clear_past_top() {
    let size = 40.0;
    assert_eq!(falloff_alpha(-size / 2.0, size), 1.0);
    assert_eq!(falloff_alpha(size / 2.0 + 1.0, size), 0.0);

    let mid = falloff_alpha(0.0, size);
    let expected = ((1.0 + size / 2.0) / size).powi(5);
    assert!((mid - expected).abs() < 1e-12);

    let mut prev = f64::INFINITY;
    for i in 0..=10 {
        let a = falloff_alpha(-size / 2.0 + i as f64 * size / 10.0, size);
        assert!(a <= prev);
        prev = a;
    }
    assert_eq!(falloff_alpha(0.0, 0.0), 0.0);
}

#[test]
fn falloff_follows_requested_axis() {
    let size = Vec3::new(24.0, 24.0, 40.0);
    let mut mesh = box_mesh(size, 1);
    let tint = [0.1, 0.02, 0.05];

    apply_falloff(&mut mesh, size, GradientAxis::Vertical, tint);
    for (p, c) in mesh.positions.iter().zip(&mesh.colors) {
        assert_eq!(c[3], falloff_alpha(p[1], size.y));
        assert_eq!([c[0], c[1], c[2]], tint);
    }

    reorient_falloff(&mut mesh, size, GradientAxis::for_top_down(false));
    for (p, c) in mesh.positions.iter().zip(&mesh.colors) {
        assert_eq!(c[3], falloff_alpha(p[2], size.z));
        assert_eq!([c[0], c[1], c[2]], tint);
    }
}
