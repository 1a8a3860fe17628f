use super::*;

#[test]
fn resolves_urls_file_uris_and_paths() {
    let root = Path::new("/srv/assets");
    assert_eq!(
        SourceLocation::resolve("https://cdn.example/a.jpg", root).unwrap(),
        SourceLocation::Remote("https://cdn.example/a.jpg".into())
    );
    assert_eq!(
        SourceLocation::resolve("file:///tmp/a.png", root).unwrap(),
        SourceLocation::File(PathBuf::from("/tmp/a.png"))
    );
    assert_eq!(
        SourceLocation::resolve("file://localhost/tmp/a.png", root).unwrap(),
        SourceLocation::File(PathBuf::from("/tmp/a.png"))
    );
    assert_eq!(
        SourceLocation::resolve("img/a.png", root).unwrap(),
        SourceLocation::File(PathBuf::from("/srv/assets/img/a.png"))
    );
    assert_eq!(
        SourceLocation::resolve("/abs/b.png", root).unwrap(),
        SourceLocation::File(PathBuf::from("/abs/b.png"))
    );
}

#[test]
fn rejects_empty_and_unknown_schemes() {
    let root = Path::new(".");
    assert!(SourceLocation::resolve("  ", root).is_err());
    assert!(SourceLocation::resolve("ftp://host/a.png", root).is_err());
    assert!(SourceLocation::resolve("file://host/a.png", root).is_err());
}

#[test]
fn svg_extension_ignores_query_string() {
    let root = Path::new(".");
    assert!(
        SourceLocation::resolve("https://x.example/logo.SVG?w=2", root)
            .unwrap()
            .has_svg_extension()
    );
    assert!(
        !SourceLocation::resolve("photo.jpeg", root)
            .unwrap()
            .has_svg_extension()
    );
}

#[test]
fn fetches_local_files() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("a.bin");
    std::fs::write(&p, b"hello").unwrap();

    let fetcher = Fetcher::new(1024).unwrap();
    assert_eq!(
        fetcher.fetch(&SourceLocation::File(p)).unwrap(),
        b"hello".to_vec()
    );
    let missing = fetcher
        .fetch(&SourceLocation::File(dir.path().join("nope")))
        .unwrap_err();
    assert!(matches!(missing, ReelError::Asset(_)));
}
