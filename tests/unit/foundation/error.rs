use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MockupError::degenerate("x")
            .to_string()
            .contains("degenerate geometry:")
    );
    assert!(
        MockupError::invalid_argument("x")
            .to_string()
            .contains("invalid argument:")
    );
    assert!(
        MockupError::invalid_recipe("x")
            .to_string()
            .contains("invalid recipe:")
    );
    assert!(
        MockupError::asset_unavailable("x")
            .to_string()
            .contains("asset unavailable:")
    );
    assert!(
        MockupError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MockupError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn only_asset_errors_are_non_fatal() {
    assert!(MockupError::asset_unavailable("logo").is_non_fatal());
    assert!(!MockupError::degenerate("quad").is_non_fatal());
    assert!(!MockupError::invalid_recipe("x").is_non_fatal());
}

#[test]
fn compose_error_display_carries_context() {
    let err = ComposeError::variant(
        "countertop-1",
        2,
        ComposeStage::TransformLayers,
        MockupError::degenerate("collinear"),
    )
    .with_layer(1);
    let s = err.to_string();
    assert!(s.contains("countertop-1"));
    assert!(s.contains("variant 2"));
    assert!(s.contains("layer 1"));
    assert!(s.contains("transform-layers"));
    assert!(s.contains("collinear"));

    let call = ComposeError::call("nope", MockupError::invalid_recipe("unknown"));
    assert_eq!(call.variant, None);
    assert_eq!(call.stage, ComposeStage::Start);
}
