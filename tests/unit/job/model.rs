use super::*;

#[test]
fn empty_script_fails_fast() {
    let err = RenderJob::new(Vec::new(), Vec::new(), 15.0).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
    assert!(err.to_string().contains("at least one line"));
}

#[test]
fn blank_line_and_bad_duration_are_rejected() {
    assert!(RenderJob::new(vec!["ok".into(), "   ".into()], Vec::new(), 15.0).is_err());
    assert!(RenderJob::new(vec!["ok".into()], Vec::new(), 0.0).is_err());
    assert!(RenderJob::new(vec!["ok".into()], Vec::new(), -3.0).is_err());
    assert!(RenderJob::new(vec!["ok".into()], Vec::new(), f64::NAN).is_err());
}

#[test]
fn media_search_wire_shape_deserializes() {
    let json = r#"{
        "script": ["Never give up"],
        "media": [
            {"type": "video", "url": "https://cdn.example/clip.mp4", "id": 42},
            {"type": "image", "url": "https://cdn.example/a.jpg"}
        ],
        "duration_secs": 15
    }"#;
    let job = RenderJob::from_json_str(json).unwrap();
    assert_eq!(job.media.len(), 2);
    assert_eq!(job.media[0].kind, MediaKind::Clip);
    assert_eq!(job.media[0].id, Some(42));
    assert_eq!(job.media[1], MediaAsset::image("https://cdn.example/a.jpg"));
    assert_eq!(job.duration_secs, 15.0);
}

#[test]
fn media_defaults_to_empty() {
    let job = RenderJob::from_json_str(r#"{"script": ["a"], "duration_secs": 30}"#).unwrap();
    assert!(job.media.is_empty());
}

#[test]
fn from_path_reads_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("job.json");
    std::fs::write(
        &path,
        r#"{"script": ["a", "b"], "media": [{"kind": "clip", "source": "x.mp4"}], "duration_secs": 60}"#,
    )
    .unwrap();
    let job = RenderJob::from_path(&path).unwrap();
    assert_eq!(job.script, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(job.media[0], MediaAsset::clip("x.mp4"));

    assert!(RenderJob::from_path(dir.path().join("missing.json")).is_err());
}

#[test]
fn script_text_splits_and_drops_blank_lines() {
    let text = "  Wake up early \n\n   \nChase your dreams\r\nNever quit\n";
    assert_eq!(
        parse_script_text(text),
        vec![
            "Wake up early".to_string(),
            "Chase your dreams".to_string(),
            "Never quit".to_string()
        ]
    );
    assert!(parse_script_text("\n \n").is_empty());
}

#[test]
fn missing_script_parses_but_does_not_validate() {
    let job: RenderJob = serde_json::from_str(r#"{"duration_secs": 10}"#).unwrap();
    assert!(job.script.is_empty());
    assert!(RenderJob::from_json_str(r#"{"duration_secs": 10}"#).is_err());
}

#[test]
fn generate_params_shape_uses_duration() {
    let json = r#"{
        "script": ["Never give up", "Chase your dreams"],
        "media": [{"type": "image", "url": "https://example.invalid/a.jpg"}],
        "duration": 15
    }"#;
    let job = RenderJob::from_json_str(json).unwrap();
    assert_eq!(job.duration_secs, 15.0);
    assert_eq!(job.media[0].kind, MediaKind::Image);
}
