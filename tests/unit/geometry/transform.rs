use super::*;

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

#[test]
fn default_placement_is_identity() {
    let t = placement_affine(&Placement::default(), 40, 30).unwrap();
    assert_eq!(t, Affine::IDENTITY);
}

#[test]
fn translation_only_moves_top_left_to_position() {
    let p = Placement {
        position: Vec2::new(25.0, 10.0),
        ..Placement::default()
    };
    let t = placement_affine(&p, 50, 50).unwrap();
    assert_eq!(t, Affine::translate(Vec2::new(25.0, 10.0)));
}

#[test]
fn scale_keeps_top_left_anchored_without_rotation() {
    let p = Placement {
        position: Vec2::new(5.0, 5.0),
        scale: Vec2::new(2.0, 0.5),
        ..Placement::default()
    };
    let t = placement_affine(&p, 10, 10).unwrap();
    assert!(close(t * Point::ORIGIN, Point::new(5.0, 5.0)));
    assert!(close(t * Point::new(10.0, 10.0), Point::new(25.0, 10.0)));
}

#[test]
fn rotation_spins_about_scaled_center() {
    let p = Placement {
        rotation_deg: 90.0,
        ..Placement::default()
    };
    let t = placement_affine(&p, 100, 100).unwrap();
    // The center is fixed; the top-left corner swings to the top-right.
    assert!(close(t * Point::new(50.0, 50.0), Point::new(50.0, 50.0)));
    assert!(close(t * Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
    assert!(close(t * Point::new(10.0, 10.0), Point::new(90.0, 10.0)));

    let scaled = Placement {
        rotation_deg: 90.0,
        scale: Vec2::new(2.0, 2.0),
        ..Placement::default()
    };
    let t = placement_affine(&scaled, 100, 100).unwrap();
    assert!(close(t * Point::new(50.0, 50.0), Point::new(100.0, 100.0)));
}

#[test]
fn rotation_is_taken_modulo_360() {
    let base = Placement {
        rotation_deg: 90.0,
        ..Placement::default()
    };
    let wrapped = Placement {
        rotation_deg: 450.0,
        ..Placement::default()
    };
    let negative = Placement {
        rotation_deg: -270.0,
        ..Placement::default()
    };
    let a = placement_affine(&base, 8, 8).unwrap();
    assert_eq!(a, placement_affine(&wrapped, 8, 8).unwrap());
    assert_eq!(a, placement_affine(&negative, 8, 8).unwrap());
}

#[test]
fn zero_or_negative_scale_is_rejected() {
    for scale in [Vec2::new(0.0, 1.0), Vec2::new(1.0, -2.0), Vec2::new(f64::NAN, 1.0)] {
        let p = Placement {
            scale,
            ..Placement::default()
        };
        let err = placement_affine(&p, 4, 4).unwrap_err();
        assert!(matches!(err, LayerbakeError::InvalidTransform(_)));
    }
}

#[test]
fn zero_area_raster_is_rejected() {
    let err = placement_affine(&Placement::default(), 0, 4).unwrap_err();
    assert!(matches!(err, LayerbakeError::InvalidTransform(_)));
}

#[test]
fn compose_applies_right_operand_first() {
    let a = Affine::translate(Vec2::new(10.0, 0.0));
    let b = Affine::scale(2.0);
    let p = transform_point(Point::new(1.0, 1.0), compose(a, b));
    assert!(close(p, Point::new(12.0, 2.0)));
}

#[test]
fn polygon_order_is_preserved() {
    let pts = [Point::new(0.0, 0.0), Point::new(2.0, 0.0), Point::new(2.0, 1.0)];
    let out = transform_polygon(&pts, Affine::translate(Vec2::new(1.0, 1.0)));
    assert_eq!(
        out,
        vec![Point::new(1.0, 1.0), Point::new(3.0, 1.0), Point::new(3.0, 2.0)]
    );
}

#[test]
fn rotated_rectangle_becomes_quad_or_box_by_policy() {
    let p = Placement {
        rotation_deg: 90.0,
        ..Placement::default()
    };
    let t = placement_affine(&p, 100, 100).unwrap();
    let rect = Rect::new(10.0, 10.0, 40.0, 40.0);

    let TransformedRect::Quad(q) = transform_rectangle(rect, t, RectExport::Quad) else {
        panic!("expected quad for a 90 degree rotation");
    };
    assert!(close(q[0], Point::new(90.0, 10.0)));
    assert!(close(q[1], Point::new(90.0, 40.0)));
    assert!(close(q[2], Point::new(60.0, 40.0)));
    assert!(close(q[3], Point::new(60.0, 10.0)));

    let TransformedRect::Rect(r) = transform_rectangle(rect, t, RectExport::AxisAligned) else {
        panic!("expected an axis-aligned box");
    };
    assert!((r.x0 - 60.0).abs() < 1e-9 && (r.x1 - 90.0).abs() < 1e-9);
    assert!((r.y0 - 10.0).abs() < 1e-9 && (r.y1 - 40.0).abs() < 1e-9);
}

#[test]
fn unrotated_rectangle_stays_rect_even_in_quad_mode() {
    let t = Affine::translate(Vec2::new(3.0, 4.0)) * Affine::scale(2.0);
    let out = transform_rectangle(Rect::new(5.0, 5.0, 1.0, 1.0), t, RectExport::Quad);
    assert_eq!(out, TransformedRect::Rect(Rect::new(5.0, 6.0, 13.0, 14.0)));
}

#[test]
fn inverse_rejects_degenerate_transforms() {
    assert!(checked_inverse(Affine::scale_non_uniform(1.0, 0.0)).is_err());
    let inv = checked_inverse(Affine::scale(4.0)).unwrap();
    assert!(close(inv * Point::new(8.0, 4.0), Point::new(2.0, 1.0)));
}
