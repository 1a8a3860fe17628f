use super::*;
use crate::foundation::core::FrameIndex;
use crate::render::surface::{DrawCommand, RecordingSurface};

fn state(progress: f64) -> FrameState {
    FrameState {
        frame: FrameIndex(0),
        time_secs: 0.0,
        segment_index: 0,
        segment_progress: progress,
    }
}

fn bg() -> PreparedImage {
    PreparedImage::from_premul_rgba8(1, 1, vec![1, 2, 3, 255]).unwrap()
}

#[test]
fn draws_in_fixed_order() {
    let mut s = RecordingSurface::new(Canvas::PORTRAIT_1080);
    let style = FrameStyle::default();
    draw_frame(&mut s, &state(0.5), "Never give up", &bg(), &style).unwrap();

    let cmds = s.current();
    assert_eq!(cmds.len(), 4);
    assert_eq!(cmds[0], DrawCommand::Clear(Rgba8Premul::opaque(0x0a, 0x0a, 0x0f)));
    assert!(matches!(cmds[1], DrawCommand::Image { width: 1, height: 1, .. }));
    assert!(matches!(cmds[2], DrawCommand::Gradient { .. }));
    let DrawCommand::Text(block) = &cmds[3] else {
        panic!("expected text, got {:?}", cmds[3]);
    };
    assert_eq!(block.lines.len(), 1);
    assert_eq!(block.lines[0].text, "Never give up");
    assert_eq!(block.lines[0].center, Point::new(540.0, 1440.0));
    assert_eq!(block.opacity, 1.0);
}

#[test]
fn blank_line_skips_text() {
    let mut s = RecordingSurface::new(Canvas::PORTRAIT_1080);
    draw_frame(&mut s, &state(0.5), "   ", &bg(), &FrameStyle::default()).unwrap();
    assert_eq!(s.current().len(), 3);
}

#[test]
fn background_zooms_about_center() {
    let style = FrameStyle::default();
    let c = Canvas::PORTRAIT_1080;
    assert_eq!(style.background_rect(c, 0.0), c.rect());

    let r = style.background_rect(c, 1.0);
    assert!((r.width() - 1134.0).abs() < 1e-9);
    assert!((r.height() - 2016.0).abs() < 1e-9);
    assert!((r.center().x - 540.0).abs() < 1e-9);
    assert!((r.center().y - 960.0).abs() < 1e-9);
}

#[test]
fn overlay_spans_lower_half_to_translucent_black() {
    let g = FrameStyle::default().overlay_gradient(Canvas::PORTRAIT_1080);
    assert_eq!(g.start, Point::new(0.0, 960.0));
    assert_eq!(g.end, Point::new(0.0, 1920.0));
    assert_eq!(g.color_at(g.param_at(Point::new(0.0, 100.0))).a, 0);
    assert_eq!(g.color_at(1.0), Rgba8Premul::from_straight_rgba(0, 0, 0, 204));
}

#[test]
fn long_lines_wrap_within_margin() {
    let mut s = RecordingSurface::new(Canvas::PORTRAIT_1080);
    // 32px per char with the recording metrics; 960px fits 30 chars.
    let line = "Success is not final and failure is not fatal it is the courage to continue";
    draw_frame(&mut s, &state(0.0), line, &bg(), &FrameStyle::default()).unwrap();
    let DrawCommand::Text(block) = &s.current()[3] else {
        panic!("expected text");
    };
    assert!(block.lines.len() > 1);
    assert!(block.lines.iter().all(|l| l.width <= 960.0));
    assert_eq!(block.opacity, 0.0);
    // Rise-in offset at progress 0.
    let n = block.lines.len() as f64;
    assert!((block.lines[0].center.y - (1440.0 - (n - 1.0) * 40.0 + 50.0)).abs() < 1e-9);
}
