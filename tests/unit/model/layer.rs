use super::*;
use crate::foundation::core::Point;

fn layer() -> Layer {
    let pixels = Raster::filled(20, 10, [255, 0, 0, 255]).unwrap();
    Layer::new(LayerId(0), "Layer_0".to_string(), pixels, 0)
}

#[test]
fn defaults_are_identity_and_visible() {
    let l = layer();
    assert_eq!(l.params().placement, Placement::default());
    assert_eq!(l.params().opacity, 1.0);
    assert!(l.params().visible);
    assert!(l.export_annotations());
    assert_eq!(l.affine().unwrap(), Affine::IDENTITY);
}

#[test]
fn opacity_is_clamped() {
    let mut l = layer();
    l.set_opacity(2.0).unwrap();
    assert_eq!(l.params().opacity, 1.0);
    l.set_opacity(-0.5).unwrap();
    assert_eq!(l.params().opacity, 0.0);
    assert!(l.set_opacity(f64::NAN).is_err());
}

#[test]
fn scale_rejects_non_positive_and_defaults_uniform() {
    let mut l = layer();
    l.set_scale(2.0, None).unwrap();
    assert_eq!(l.params().placement.scale, Vec2::new(2.0, 2.0));
    l.set_scale(2.0, Some(0.5)).unwrap();
    assert_eq!(l.params().placement.scale, Vec2::new(2.0, 0.5));

    assert!(l.set_scale(0.0, None).is_err());
    assert!(l.set_scale(1.0, Some(-1.0)).is_err());
    // A rejected update leaves the previous value intact.
    assert_eq!(l.params().placement.scale, Vec2::new(2.0, 0.5));
}

#[test]
fn position_and_rotation_reject_non_finite() {
    let mut l = layer();
    assert!(l.set_position(f64::INFINITY, 0.0).is_err());
    assert!(l.set_rotation(f64::NAN).is_err());
    l.set_position(3.0, 4.0).unwrap();
    l.set_rotation(720.0).unwrap();
    assert_eq!(l.params().placement.position, Vec2::new(3.0, 4.0));
    assert_eq!(l.params().placement.rotation_deg, 720.0);
}

#[test]
fn annotations_keep_local_coordinates() {
    let mut l = layer();
    l.set_position(100.0, 100.0).unwrap();
    l.set_rotation(45.0).unwrap();
    let ann = Annotation::points("tip", vec![Point::new(2.0, 3.0)]);
    l.push_annotation(ann, AnnotationId(9)).unwrap();
    assert_eq!(
        l.annotations()[0].geometry,
        crate::Geometry::Points {
            points: vec![Point::new(2.0, 3.0)]
        }
    );
    assert_eq!(l.annotations()[0].id, Some(AnnotationId(9)));
}

#[test]
fn malformed_annotation_never_enters_the_layer() {
    let mut l = layer();
    let ann = Annotation::points("far", vec![Point::new(50.0, 3.0)]);
    assert!(l.push_annotation(ann, AnnotationId(1)).is_err());
    assert!(l.annotations().is_empty());
}

#[test]
fn remove_annotation_by_id() {
    let mut l = layer();
    let ann = Annotation::points("a", vec![Point::new(1.0, 1.0)]);
    l.push_annotation(ann, AnnotationId(3)).unwrap();
    assert!(l.remove_annotation(AnnotationId(4)).is_none());
    assert!(l.remove_annotation(AnnotationId(3)).is_some());
    assert!(l.annotations().is_empty());
}
