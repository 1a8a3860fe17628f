use super::*;

#[test]
fn zero_radius_is_identity() {
    let k = GaussianKernel::new(0, 1.0).unwrap();
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    assert_eq!(k.apply(&src, 1, 2).unwrap(), src);
}

#[test]
fn weights_sum_to_one_in_q16() {
    let k = GaussianKernel::for_shadow_blur(20.0).unwrap();
    assert_eq!(k.radius(), 20);
    assert_eq!(k.weights.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
}

#[test]
fn constant_image_is_unchanged() {
    let (w, h) = (4u32, 3u32);
    let src = [10u8, 20, 30, 40].repeat((w * h) as usize);
    let out = GaussianKernel::new(3, 2.0).unwrap().apply(&src, w, h).unwrap();
    assert_eq!(out, src);
}

#[test]
fn single_pixel_spreads_and_keeps_energy() {
    let (w, h) = (5u32, 5u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((2 * w + 2) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    let out = GaussianKernel::new(2, 1.2).unwrap().apply(&src, w, h).unwrap();
    assert!(out.chunks_exact(4).filter(|px| px[3] != 0).count() > 1);
    let sum_a: u32 = out.chunks_exact(4).map(|px| u32::from(px[3])).sum();
    assert!((sum_a as i32 - 255).abs() <= 4);
    // Symmetric about the center.
    let px = |x: u32, y: u32| out[((y * w + x) * 4 + 3) as usize];
    assert_eq!(px(1, 2), px(3, 2));
    assert_eq!(px(2, 1), px(2, 3));
}

#[test]
fn rejects_bad_inputs() {
    assert!(GaussianKernel::new(2, 0.0).is_err());
    assert!(GaussianKernel::for_shadow_blur(-1.0).is_err());
    let k = GaussianKernel::new(1, 1.0).unwrap();
    assert!(k.apply(&[0u8; 7], 1, 2).is_err());
}
