use super::*;

fn two_stop_vertical(h: f64) -> LinearGradient {
    LinearGradient::new(
        Point::new(0.0, 0.0),
        Point::new(0.0, h),
        vec![
            GradientStop {
                offset: 1.0,
                color: Rgba8Premul::opaque(255, 255, 255),
            },
            GradientStop {
                offset: 0.0,
                color: Rgba8Premul::transparent(),
            },
        ],
    )
    .unwrap()
}

#[test]
fn stops_are_sorted_and_validated() {
    let g = two_stop_vertical(10.0);
    assert_eq!(g.stops[0].offset, 0.0);
    assert!(LinearGradient::new(Point::ZERO, Point::new(1.0, 0.0), Vec::new()).is_err());
    assert!(
        LinearGradient::new(
            Point::ZERO,
            Point::new(1.0, 0.0),
            vec![GradientStop {
                offset: 1.5,
                color: Rgba8Premul::transparent()
            }]
        )
        .is_err()
    );
}

#[test]
fn color_at_pads_and_interpolates() {
    let g = two_stop_vertical(10.0);
    assert_eq!(g.color_at(-1.0), Rgba8Premul::transparent());
    assert_eq!(g.color_at(2.0), Rgba8Premul::opaque(255, 255, 255));
    assert_eq!(g.color_at(0.5), Rgba8Premul { r: 128, g: 128, b: 128, a: 128 });
}

#[test]
fn param_projects_onto_axis() {
    let g = two_stop_vertical(10.0);
    assert_eq!(g.param_at(Point::new(123.0, 5.0)), 0.5);
    let degenerate = LinearGradient::new(
        Point::new(3.0, 3.0),
        Point::new(3.0, 3.0),
        g.stops.clone(),
    )
    .unwrap();
    assert_eq!(degenerate.param_at(Point::new(9.0, 9.0)), 0.0);
}

#[test]
fn fallback_has_dark_corners_and_mid_stop() {
    let canvas = Canvas {
        width: 9,
        height: 16,
    };
    let img = fallback_background(canvas).unwrap();
    assert_eq!((img.width, img.height), (9, 16));
    assert!(img.rgba8_premul.chunks_exact(4).all(|px| px[3] == 255));

    let g = fallback_gradient(canvas);
    assert_eq!(g.color_at(0.0), Rgba8Premul::opaque(0x1a, 0x1a, 0x2e));
    assert_eq!(g.color_at(0.5), Rgba8Premul::opaque(0x16, 0x21, 0x3e));
    assert_eq!(g.color_at(1.0), Rgba8Premul::opaque(0x0f, 0x34, 0x60));
}
