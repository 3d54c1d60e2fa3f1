use super::*;
use crate::foundation::core::Vec2;

fn square(size: u32, lo: u32, hi: u32) -> Mask {
    let inside = |v: u32| (lo..hi).contains(&v);
    Mask::from_fn(size, size, |x, y| inside(x) && inside(y))
}

#[test]
fn from_bits_rejects_wrong_length() {
    let err = Mask::from_bits(2, 2, vec![true; 3]).unwrap_err();
    assert!(matches!(err, LayerbakeError::MalformedAnnotation(_)));
}

#[test]
fn bounds_cover_set_cells() {
    let m = square(10, 2, 5);
    assert_eq!(m.count(), 9);
    assert_eq!(m.bounds(), Some(Rect::new(2.0, 2.0, 5.0, 5.0)));
    assert_eq!(Mask::new(3, 3).bounds(), None);
}

#[test]
fn identity_transform_preserves_mask() {
    let m = square(8, 1, 4);
    let out = transform_mask(&m, Affine::IDENTITY, 8, 8).unwrap();
    assert_eq!(out, m);
}

#[test]
fn translation_moves_cells_and_clips_to_canvas() {
    let m = square(4, 0, 4);
    let out = transform_mask(&m, Affine::translate(Vec2::new(6.0, 1.0)), 8, 8).unwrap();
    assert_eq!(out.bounds(), Some(Rect::new(6.0, 1.0, 8.0, 5.0)));
    assert_eq!(out.count(), 8);
}

#[test]
fn scaling_stays_binary_and_grows_area() {
    let m = square(4, 1, 3);
    let out = transform_mask(&m, Affine::scale(2.0), 8, 8).unwrap();
    assert_eq!(out.count(), 16);
    assert_eq!(out.bounds(), Some(Rect::new(2.0, 2.0, 6.0, 6.0)));
}

#[test]
fn degenerate_transform_is_rejected() {
    let m = square(4, 0, 2);
    assert!(transform_mask(&m, Affine::scale_non_uniform(0.0, 1.0), 4, 4).is_err());
}

#[test]
fn rle_json_roundtrip() {
    let m = square(5, 1, 3);
    let json = serde_json::to_string(&m).unwrap();
    assert!(json.contains("\"counts\""));
    let de: Mask = serde_json::from_str(&json).unwrap();
    assert_eq!(de, m);
}

#[test]
fn rle_with_wrong_total_is_rejected() {
    let json = r#"{"width":2,"height":2,"counts":[1,1]}"#;
    assert!(serde_json::from_str::<Mask>(json).is_err());
}

#[test]
fn rle_with_overflowing_runs_is_rejected() {
    let json = r#"{"width":2,"height":1,"counts":[18446744073709551615,2]}"#;
    let err = serde_json::from_str::<Mask>(json).unwrap_err();
    assert!(err.to_string().contains("overflow"), "{err}");

    let rle = MaskRle {
        width: 2,
        height: 1,
        counts: vec![u64::MAX, 1, 2],
    };
    assert!(matches!(
        Mask::try_from(rle),
        Err(LayerbakeError::MalformedAnnotation(_))
    ));
}
