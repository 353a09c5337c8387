use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        VariantError::document("x")
            .to_string()
            .contains("document error:")
    );
    assert!(
        VariantError::structure("x")
            .to_string()
            .contains("structure error:")
    );
    assert!(VariantError::render("x").to_string().contains("render error:"));
    assert!(VariantError::encode("x").to_string().contains("encode error:"));
}

#[test]
fn degenerate_reports_color_and_size() {
    let msg = VariantError::degenerate("red", 1, 600).to_string();
    assert!(msg.contains("'red'"));
    assert!(msg.contains("1x600"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = VariantError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
