use crate::geom::{BBox, HitBoxes, Point3, Vec3};

fn unit_box_at(x: f64) -> BBox {
    BBox::from_center_size(Point3::new(x, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0))
}

#[test]
fn nearest_box_along_the_ray_wins() {
    let hits = HitBoxes::new(vec![unit_box_at(10.0), unit_box_at(5.0), unit_box_at(20.0)]);
    let hit = hits
        .first_hit(Point3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), f64::INFINITY)
        .expect("hit");

    assert_eq!(hit.index, 1);
    assert!((hit.t - 4.0).abs() < 1e-12);
}

#[test]
fn rays_beside_or_behind_the_boxes_miss() {
    let hits = HitBoxes::new(vec![unit_box_at(5.0)]);
    let origin = Point3::new(0.0, 0.0, 0.0);

    assert!(hits.first_hit(Point3::new(0.0, 3.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 100.0).is_none());
    assert!(hits.first_hit(origin, Vec3::new(-1.0, 0.0, 0.0), 100.0).is_none());
    assert!(hits.first_hit(origin, Vec3::new(1.0, 0.0, 0.0), 3.0).is_none());
}

#[test]
fn origin_inside_a_box_hits_at_zero() {
    let hits = HitBoxes::new(vec![unit_box_at(5.0), unit_box_at(0.0)]);
    let hit = hits
        .first_hit(Point3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), f64::INFINITY)
        .expect("hit");

    assert_eq!(hit.index, 1);
    assert_eq!(hit.t, 0.0);
}

#[test]
fn overlapping_boxes_keep_the_lower_index() {
    let hits = HitBoxes::new(vec![unit_box_at(5.0), unit_box_at(5.0)]);
    let hit = hits
        .first_hit(Point3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), f64::INFINITY)
        .expect("hit");

    assert_eq!(hit.index, 0);
}

#[test]
fn empty_set_never_hits() {
    let hits = HitBoxes::default();

    assert!(hits.is_empty());
    assert_eq!(hits.len(), 0);
    assert!(
        hits.first_hit(Point3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), f64::INFINITY)
            .is_none()
    );
}
