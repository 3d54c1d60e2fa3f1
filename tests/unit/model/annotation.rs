use super::*;
use crate::foundation::core::Vec2;

#[test]
fn rectangle_normalizes_click_order() {
    let a = Annotation::from_coordinates(
        "box",
        AnnotationKind::Rectangle,
        &[(40.0, 30.0), (10.0, 5.0)],
    )
    .unwrap();
    assert_eq!(
        a.geometry,
        Geometry::Rectangle {
            rect: Rect::new(10.0, 5.0, 40.0, 30.0)
        }
    );
}

#[test]
fn coordinate_counts_are_checked_per_kind() {
    let one = [(1.0, 1.0)];
    let three = [(1.0, 1.0), (2.0, 1.0), (2.0, 2.0)];
    assert!(Annotation::from_coordinates("p", AnnotationKind::PointSet, &one).is_ok());
    assert!(Annotation::from_coordinates("p", AnnotationKind::PointSet, &[]).is_err());
    assert!(Annotation::from_coordinates("r", AnnotationKind::Rectangle, &one).is_err());
    assert!(Annotation::from_coordinates("r", AnnotationKind::Rectangle, &three).is_err());
    assert!(Annotation::from_coordinates("g", AnnotationKind::Polygon, &three[..2]).is_err());
    assert!(Annotation::from_coordinates("g", AnnotationKind::Polygon, &three).is_ok());
    let err = Annotation::from_coordinates("m", AnnotationKind::Mask, &three).unwrap_err();
    assert!(matches!(err, LayerbakeError::MalformedAnnotation(_)));
}

#[test]
fn rectangles_are_clipped_to_the_layer() {
    let a = Annotation::rectangle("r", Point::new(-5.0, 10.0), Point::new(30.0, 80.0))
        .validated_for(20, 50)
        .unwrap();
    assert_eq!(
        a.geometry,
        Geometry::Rectangle {
            rect: Rect::new(0.0, 10.0, 20.0, 50.0)
        }
    );

    let outside = Annotation::rectangle("r", Point::new(30.0, 30.0), Point::new(40.0, 40.0));
    assert!(outside.validated_for(20, 20).is_err());
}

#[test]
fn points_and_polygons_outside_the_layer_are_rejected() {
    let p = Annotation::points("p", vec![Point::new(5.0, 5.0), Point::new(11.0, 2.0)]);
    assert!(p.validated_for(10, 10).is_err());

    let poly = Annotation::polygon(
        "g",
        vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)],
    );
    assert!(poly.clone().validated_for(10, 10).is_ok());
    assert!(poly.validated_for(9, 9).is_err());
}

#[test]
fn non_finite_values_are_rejected() {
    let p = Annotation::points("p", vec![Point::new(f64::NAN, 1.0)]);
    assert!(p.validated_for(10, 10).is_err());
    let s = Annotation::points("p", vec![Point::new(1.0, 1.0)]).with_score(f64::INFINITY);
    assert!(s.validated_for(10, 10).is_err());
}

#[test]
fn mask_must_match_layer_size() {
    let a = Annotation::mask("m", Mask::new(4, 4));
    assert!(a.clone().validated_for(4, 4).is_ok());
    assert!(a.validated_for(5, 4).is_err());
}

#[test]
fn rectangle_transform_follows_export_policy() {
    let g = Geometry::rectangle(Point::new(0.0, 0.0), Point::new(2.0, 1.0));
    let t = Affine::translate(Vec2::new(1.0, 1.0));
    let shifted = g.transform(t, 10, 10, RectExport::Quad).unwrap();
    assert_eq!(shifted.kind(), AnnotationKind::Rectangle);

    let rotated = g
        .transform(Affine::rotate(0.3), 10, 10, RectExport::Quad)
        .unwrap();
    let Geometry::Polygon { vertices } = rotated else {
        panic!("rotated rectangle should export as a quad");
    };
    assert_eq!(vertices.len(), 4);

    let boxed = g
        .transform(Affine::rotate(0.3), 10, 10, RectExport::AxisAligned)
        .unwrap();
    assert_eq!(boxed.kind(), AnnotationKind::Rectangle);
}

#[test]
fn json_shape_is_tagged_and_sparse() {
    let a = Annotation::rectangle("cat", Point::new(1.0, 2.0), Point::new(3.0, 4.0))
        .with_id(AnnotationId(5))
        .with_color(Rgb8::new(255, 0, 0));
    let v = serde_json::to_value(&a).unwrap();
    assert_eq!(v["type"], "rectangle");
    assert_eq!(v["id"], 5);
    assert_eq!(v["color"], serde_json::json!([255, 0, 0]));
    assert!(v.get("score").is_none());

    let de: Annotation = serde_json::from_value(v).unwrap();
    assert_eq!(de, a);
}
