use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert_eq!(Fps::new(30, 1).unwrap(), Fps::integer(30));
}

#[test]
fn fps_frame_time_and_rounding() {
    let fps = Fps::integer(30);
    assert_eq!(fps.frames_to_secs(225), 7.5);
    assert_eq!(fps.secs_to_frames_round(15.0), 450);
    assert_eq!(fps.secs_to_frames_round(0.51 / 30.0), 1);
    assert_eq!(fps.secs_to_frames_round(0.49 / 30.0), 0);
}

#[test]
fn canvas_rect_and_len() {
    let c = Canvas::PORTRAIT_1080;
    assert_eq!(c.rect(), Rect::new(0.0, 0.0, 1080.0, 1920.0));
    assert_eq!(c.rgba8_len(), 1080 * 1920 * 4);
}

#[test]
fn hex_colors_parse_and_premultiply() {
    assert_eq!(
        Rgba8Premul::from_hex("#0a0a0f").unwrap(),
        Rgba8Premul::opaque(0x0a, 0x0a, 0x0f)
    );
    assert!(Rgba8Premul::from_hex("#12345").is_err());
    assert!(Rgba8Premul::from_hex("#zzzzzz").is_err());

    let black80 = Rgba8Premul::from_straight_f32_alpha(0, 0, 0, 0.8);
    assert_eq!(black80, Rgba8Premul { r: 0, g: 0, b: 0, a: 204 });

    let half_white = Rgba8Premul::from_straight_rgba(255, 255, 255, 128);
    assert_eq!(half_white.to_array(), [128, 128, 128, 128]);
}
