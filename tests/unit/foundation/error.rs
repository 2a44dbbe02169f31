use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ReelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ReelError::composition("x")
            .to_string()
            .contains("composition failed:")
    );
    assert!(
        ReelError::caption_burn("x")
            .to_string()
            .contains("caption burn-in failed:")
    );
    assert!(
        ReelError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(
        ReelError::asset_rejected("/tmp/a.jpg", "bad header")
            .to_string()
            .contains("/tmp/a.jpg")
    );
}

#[test]
fn fatality_follows_error_taxonomy() {
    assert!(ReelError::NoUsableAssets.is_fatal());
    assert!(ReelError::composition("exit 1").is_fatal());
    assert!(!ReelError::caption_burn("exit 1").is_fatal());
    assert!(!ReelError::asset_rejected("a.png", "empty").is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
