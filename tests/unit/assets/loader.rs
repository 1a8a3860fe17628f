use std::io::Cursor;

use super::*;

const TINY: Canvas = Canvas {
    width: 4,
    height: 8,
};

/// Loads `ok*` sources as 1x1 stills whose red channel is the source length; fails the rest.
struct FakeLoader {
    calls: Vec<String>,
}

impl AssetLoader for FakeLoader {
    fn load(&mut self, asset: &MediaAsset) -> ReelResult<LoadedAsset> {
        self.calls.push(asset.source.clone());
        if asset.source.starts_with("ok") {
            let r = asset.source.len() as u8;
            Ok(LoadedAsset::Still(
                PreparedImage::from_premul_rgba8(1, 1, vec![r, 0, 0, 255]).unwrap(),
            ))
        } else {
            Err(ReelError::asset(format!("cannot load {}", asset.source)))
        }
    }
}

fn red_of(asset: &mut LoadedAsset) -> u8 {
    asset.frame_at(FrameIndex(0)).unwrap().rgba8_premul[0]
}

#[test]
fn failures_are_skipped_and_order_is_kept() {
    let mut loader = FakeLoader { calls: Vec::new() };
    let assets = vec![
        MediaAsset::image("ok-a"),
        MediaAsset::clip("broken"),
        MediaAsset::image("ok-bbb"),
    ];
    let mut media = load_media(&assets, &mut loader, TINY).unwrap();
    assert_eq!(loader.calls, vec!["ok-a", "broken", "ok-bbb"]);
    assert_eq!(media.len(), 2);
    assert!(!media.is_fallback());
    assert_eq!(red_of(media.for_segment(0).unwrap()), 4);
    assert_eq!(red_of(media.for_segment(1).unwrap()), 6);
}

#[test]
fn empty_input_yields_exactly_one_fallback() {
    let mut loader = FakeLoader { calls: Vec::new() };
    let mut media = load_media(&[], &mut loader, TINY).unwrap();
    assert_eq!(media.len(), 1);
    assert!(media.is_fallback());

    let frame = media.for_segment(5).unwrap().frame_at(FrameIndex(3)).unwrap();
    assert_eq!((frame.width, frame.height), (4, 8));
    assert_eq!(&frame.rgba8_premul[0..4], &[0x1a, 0x1a, 0x2e, 255]);
}

#[test]
fn all_failures_yield_fallback() {
    let mut loader = FakeLoader { calls: Vec::new() };
    let assets = vec![MediaAsset::image("x"), MediaAsset::clip("y")];
    let mut set = MediaSet::new();
    for a in &assets {
        assert!(!set.load_next(&mut loader, a));
    }
    assert_eq!(set.skipped(), 2);
    let media = set.finish(TINY).unwrap();
    assert_eq!(media.len(), 1);
    assert!(media.is_fallback());
}

#[test]
fn six_lines_two_media_cycle() {
    let mut loader = FakeLoader { calls: Vec::new() };
    let assets = vec![MediaAsset::image("ok-a"), MediaAsset::image("ok-bb")];
    let mut media = load_media(&assets, &mut loader, TINY).unwrap();
    let first = red_of(media.for_segment(0).unwrap());
    assert_eq!(red_of(media.for_segment(4).unwrap()), first);
    assert_eq!(red_of(media.for_segment(5).unwrap()), 5);
}

#[test]
fn uri_loader_decodes_local_png_and_skips_missing() {
    let dir = tempfile::tempdir().unwrap();
    let img = image::RgbaImage::from_raw(2, 1, vec![10, 20, 30, 255, 40, 50, 60, 255]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(dir.path().join("bg.png"), &buf).unwrap();

    let mut loader = UriAssetLoader::new(
        UriAssetLoaderOpts::default()
            .with_assets_root(dir.path())
            .with_canvas(TINY),
    )
    .unwrap();

    let assets = vec![MediaAsset::image("missing.png"), MediaAsset::image("bg.png")];
    let mut media = load_media(&assets, &mut loader, TINY).unwrap();
    assert_eq!(media.len(), 1);
    assert!(!media.is_fallback());
    let frame = media.for_segment(0).unwrap().frame_at(FrameIndex(0)).unwrap();
    assert_eq!((frame.width, frame.height), (2, 1));
    assert_eq!(&frame.rgba8_premul[0..4], &[10, 20, 30, 255]);
}

#[test]
fn uri_loader_rasterizes_svg_to_canvas() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("logo.svg"),
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"><rect width="1" height="1" fill="#00ff00"/></svg>"##,
    )
    .unwrap();
    let mut loader = UriAssetLoader::new(
        UriAssetLoaderOpts::default()
            .with_assets_root(dir.path())
            .with_canvas(TINY),
    )
    .unwrap();
    let mut asset = loader.load(&MediaAsset::image("logo.svg")).unwrap();
    let frame = asset.frame_at(FrameIndex(0)).unwrap();
    assert_eq!((frame.width, frame.height), (4, 8));
    assert_eq!(&frame.rgba8_premul[0..4], &[0, 255, 0, 255]);
}

#[test]
fn uri_loader_skips_images_too_wide_to_draw() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbaImage::from_pixel(70_000, 1, image::Rgba([9, 9, 9, 255]))
        .save(dir.path().join("strip.png"))
        .unwrap();

    let mut loader = UriAssetLoader::new(
        UriAssetLoaderOpts::default()
            .with_assets_root(dir.path())
            .with_canvas(TINY),
    )
    .unwrap();
    let err = loader.load(&MediaAsset::image("strip.png")).unwrap_err();
    assert!(matches!(err, ReelError::Asset(_)), "{err}");

    let media = load_media(&[MediaAsset::image("strip.png")], &mut loader, TINY).unwrap();
    assert!(media.is_fallback());
}
