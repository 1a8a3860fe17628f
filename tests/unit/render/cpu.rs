use super::*;
use crate::assets::font::find_system_font;
use crate::assets::gradient::GradientStop;
use crate::foundation::core::Point;
use crate::render::text::PositionedLine;

const SMALL: Canvas = Canvas {
    width: 64,
    height: 64,
};

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [frame.data[i], frame.data[i + 1], frame.data[i + 2], frame.data[i + 3]]
}

#[test]
fn clear_fills_every_pixel() {
    let mut s = CpuSurface::new(SMALL).unwrap();
    s.clear(Rgba8Premul::opaque(0x0a, 0x0a, 0x0f)).unwrap();
    let f = s.capture().unwrap();
    assert_eq!((f.width, f.height), (64, 64));
    assert!(f.premultiplied);
    assert!(f.data.chunks_exact(4).all(|p| p == [0x0a, 0x0a, 0x0f, 255]));
}

#[test]
fn image_is_stretched_to_dest() {
    let mut s = CpuSurface::new(SMALL).unwrap();
    let red = PreparedImage::from_premul_rgba8(2, 2, [255, 0, 0, 255].repeat(4)).unwrap();
    s.clear(Rgba8Premul::opaque(0, 0, 0)).unwrap();
    s.draw_image(&red, Rect::new(0.0, 0.0, 32.0, 64.0)).unwrap();
    let f = s.capture().unwrap();
    assert_eq!(px(&f, 10, 30), [255, 0, 0, 255]);
    assert_eq!(px(&f, 50, 30), [0, 0, 0, 255]);
}

#[test]
fn image_paints_are_cached_by_buffer() {
    let mut s = CpuSurface::new(SMALL).unwrap();
    let img = PreparedImage::from_premul_rgba8(1, 1, vec![1, 2, 3, 255]).unwrap();
    s.clear(Rgba8Premul::opaque(0, 0, 0)).unwrap();
    for _ in 0..3 {
        s.draw_image(&img, SMALL.rect()).unwrap();
    }
    assert_eq!(s.images.len(), 1);
    for i in 0..6u8 {
        let other = PreparedImage::from_premul_rgba8(1, 1, vec![i, 0, 0, 255]).unwrap();
        s.draw_image(&other, SMALL.rect()).unwrap();
    }
    assert_eq!(s.images.len(), IMAGE_CACHE_CAPACITY);
}

#[test]
fn gradient_darkens_toward_the_end() {
    let mut s = CpuSurface::new(SMALL).unwrap();
    let g = LinearGradient::new(
        Point::new(0.0, 32.0),
        Point::new(0.0, 64.0),
        vec![
            GradientStop {
                offset: 0.0,
                color: Rgba8Premul::transparent(),
            },
            GradientStop {
                offset: 1.0,
                color: Rgba8Premul::from_straight_f32_alpha(0, 0, 0, 0.8),
            },
        ],
    )
    .unwrap();
    s.clear(Rgba8Premul::opaque(255, 255, 255)).unwrap();
    s.fill_gradient(SMALL.rect(), &g).unwrap();
    let f = s.capture().unwrap();
    assert_eq!(px(&f, 32, 4), [255, 255, 255, 255]);
    let bottom = px(&f, 32, 63);
    assert!(bottom[0] < 80, "bottom = {bottom:?}");
    assert_eq!(bottom[3], 255);
}

#[test]
fn text_without_font_is_a_render_error() {
    let mut s = CpuSurface::new(SMALL).unwrap();
    assert!(!s.has_text_engine());
    let err = s.measure_text("hi", &TextStyle::default()).unwrap_err();
    assert!(matches!(err, ReelError::Render(_)));
}

#[test]
fn oversized_surface_is_rejected() {
    assert!(
        CpuSurface::new(Canvas {
            width: 70_000,
            height: 10
        })
        .is_err()
    );
}

#[test]
fn text_paints_glyphs_with_shadow_below() {
    let Some(path) = find_system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let canvas = Canvas {
        width: 256,
        height: 128,
    };
    let mut s = CpuSurface::new(canvas)
        .unwrap()
        .with_text_engine(TextLayoutEngine::from_path(&path).unwrap());
    let style = TextStyle::default();
    let width = s.measure_text("HH", &style).unwrap();
    assert!(width > 0.0);

    s.clear(Rgba8Premul::opaque(128, 128, 128)).unwrap();
    s.draw_text(&TextBlock {
        lines: vec![PositionedLine {
            text: "HH".to_owned(),
            center: Point::new(128.0, 64.0),
            width,
        }],
        style,
        opacity: 1.0,
    })
    .unwrap();
    let f = s.capture().unwrap();

    let bright = f.data.chunks_exact(4).filter(|p| p[0] > 200).count();
    let dark = f.data.chunks_exact(4).filter(|p| p[0] < 100).count();
    assert!(bright > 0, "no glyph pixels");
    assert!(dark > 0, "no shadow pixels");
    // Far corners stay untouched.
    assert_eq!(px(&f, 0, 0), [128, 128, 128, 255]);
}

fn bright_column_span(f: &FrameRGBA) -> Option<(u32, u32)> {
    let mut span: Option<(u32, u32)> = None;
    for y in 0..f.height {
        for x in 0..f.width {
            if px(f, x, y)[0] > 200 {
                span = Some(match span {
                    Some((lo, hi)) => (lo.min(x), hi.max(x)),
                    None => (x, x),
                });
            }
        }
    }
    span
}

#[test]
fn glyphs_spread_across_the_measured_width() {
    let Some(path) = find_system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let canvas = Canvas {
        width: 1080,
        height: 160,
    };
    let mut s = CpuSurface::new(canvas)
        .unwrap()
        .with_text_engine(TextLayoutEngine::from_path(&path).unwrap());
    let style = TextStyle {
        shadow: None,
        ..TextStyle::default()
    };
    let text = "HHHHHHHH";
    let width = s.measure_text(text, &style).unwrap();

    s.clear(Rgba8Premul::opaque(0, 0, 0)).unwrap();
    s.draw_text(&TextBlock {
        lines: vec![PositionedLine {
            text: text.to_owned(),
            center: Point::new(540.0, 80.0),
            width,
        }],
        style,
        opacity: 1.0,
    })
    .unwrap();
    let f = s.capture().unwrap();

    let (lo, hi) = bright_column_span(&f).expect("no glyph pixels");
    let painted = f64::from(hi - lo + 1);
    assert!(
        painted > width * 0.8 && painted < width * 1.1,
        "painted {painted}px for a {width}px line"
    );
    let mid = f64::from(lo + hi) / 2.0;
    assert!((mid - 540.0).abs() < 16.0, "line centered at {mid}");

    // Glyphs sit inside the line box rather than above its top edge.
    let rows_lit = (0..f.height)
        .filter(|&y| (lo..=hi).any(|x| px(&f, x, y)[0] > 200))
        .collect::<Vec<_>>();
    assert!(*rows_lit.first().unwrap() > 40);
    assert!(*rows_lit.last().unwrap() < 120);
}

#[test]
fn shadow_paints_are_reused_per_line() {
    let Some(path) = find_system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let canvas = Canvas {
        width: 256,
        height: 128,
    };
    let mut s = CpuSurface::new(canvas)
        .unwrap()
        .with_text_engine(TextLayoutEngine::from_path(&path).unwrap());
    let style = TextStyle::default();
    let block = |text: &str| TextBlock {
        lines: vec![PositionedLine {
            text: text.to_owned(),
            center: Point::new(128.0, 64.0),
            width: 0.0,
        }],
        style,
        opacity: 1.0,
    };

    let mut frames = Vec::new();
    for _ in 0..3 {
        s.clear(Rgba8Premul::opaque(128, 128, 128)).unwrap();
        s.draw_text(&block("Go")).unwrap();
        frames.push(s.capture().unwrap().data);
    }
    assert_eq!(s.shadows.len(), 1);
    assert_eq!(frames[0], frames[2]);

    s.clear(Rgba8Premul::opaque(128, 128, 128)).unwrap();
    s.draw_text(&block("Stop")).unwrap();
    assert_eq!(s.shadows.len(), 2);

    let bolder = TextBlock {
        style: TextStyle {
            font_size_px: 48.0,
            ..style
        },
        ..block("Go")
    };
    s.draw_text(&bolder).unwrap();
    assert_eq!(s.shadows.len(), 3);
}
