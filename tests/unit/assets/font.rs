use super::*;

#[test]
fn garbage_font_bytes_are_rejected() {
    let err = TextLayoutEngine::new(b"not a font".to_vec())
        .err()
        .expect("garbage bytes must not register");
    assert!(err.to_string().contains("no font families"));
}

#[test]
fn missing_font_file_is_a_validation_error() {
    let err = TextLayoutEngine::from_path(Path::new("/definitely/missing/font.ttf"))
        .err()
        .expect("missing file");
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn system_font_measures_longer_text_wider() {
    let Some(path) = find_system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let mut engine = TextLayoutEngine::from_path(&path).unwrap();
    assert!(!engine.family_name().is_empty());

    let short = engine.measure("Chase", 64.0, true).unwrap();
    let long = engine.measure("Chase your dreams", 64.0, true).unwrap();
    assert!(short > 0.0);
    assert!(long > short);
    assert!(engine.measure("x", 0.0, true).is_err());
}
