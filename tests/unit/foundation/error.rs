use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LayerbakeError::invalid_transform("x")
            .to_string()
            .contains("invalid transform:")
    );
    assert!(
        LayerbakeError::invalid_canvas("x")
            .to_string()
            .contains("invalid canvas:")
    );
    assert!(
        LayerbakeError::malformed_annotation("x")
            .to_string()
            .contains("malformed annotation:")
    );
    assert!(
        LayerbakeError::config("x")
            .to_string()
            .contains("config error:")
    );
    assert!(
        LayerbakeError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn missing_layer_and_unknown_step_name_the_key() {
    assert_eq!(
        LayerbakeError::MissingLayer(LayerId(7)).to_string(),
        "missing layer: 7"
    );
    let step = LayerbakeError::UnknownStep(3);
    assert_eq!(step.to_string(), "unknown step: 3");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LayerbakeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
