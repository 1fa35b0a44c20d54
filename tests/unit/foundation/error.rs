use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PackError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(PackError::fetch("x").to_string().contains("fetch error:"));
    assert!(PackError::decode("x").to_string().contains("decode error:"));
    assert!(PackError::render("x").to_string().contains("render error:"));
    assert!(
        PackError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PackError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
