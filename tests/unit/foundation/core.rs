use super::*;

#[test]
fn premul_roundtrip_is_exact_for_opaque_pixels() {
    for c in [0u8, 1, 77, 128, 254, 255] {
        let p = Rgba8Premul::from_straight_rgba(c, 255 - c, c / 2, 255);
        assert_eq!(p.to_straight_rgba(), [c, 255 - c, c / 2, 255]);
    }
}

#[test]
fn transparent_unpremul_is_zero() {
    let p = Rgba8Premul::from_straight_rgba(200, 10, 30, 0);
    assert_eq!(p, Rgba8Premul::transparent());
    assert_eq!(p.to_straight_rgba(), [0, 0, 0, 0]);
}

#[test]
fn rgb8_serializes_as_triplet() {
    let s = serde_json::to_string(&Rgb8::new(1, 2, 3)).unwrap();
    assert_eq!(s, "[1,2,3]");
    let de: Rgb8 = serde_json::from_str("[9,8,7]").unwrap();
    assert_eq!(de, Rgb8::new(9, 8, 7));
}

#[test]
fn ids_serialize_transparently() {
    assert_eq!(serde_json::to_string(&LayerId(4)).unwrap(), "4");
    assert_eq!(serde_json::to_string(&AnnotationId(12)).unwrap(), "12");
}
