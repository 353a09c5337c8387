use super::*;
use image::Rgba;

#[test]
fn scale_alpha_full_opacity_is_noop() {
    let mut img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 200]));
    scale_alpha(&mut img, 1.0);
    assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30, 200]);
}

#[test]
fn scale_alpha_halves_alpha_only() {
    let mut img = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 200]));
    scale_alpha(&mut img, 0.5);
    assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30, 100]);
    scale_alpha(&mut img, 0.0);
    assert_eq!(img.get_pixel(0, 0).0[3], 0);
}

#[test]
fn matte_blends_over_background() {
    let mut img = RgbaImage::new(3, 1);
    img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 0, Rgba([255, 0, 0, 0]));
    img.put_pixel(2, 0, Rgba([0, 0, 0, 128]));
    let out = matte(&img, [255, 255, 255]);
    assert_eq!(out.get_pixel(0, 0).0, [255, 0, 0]);
    assert_eq!(out.get_pixel(1, 0).0, [255, 255, 255]);
    assert_eq!(out.get_pixel(2, 0).0, [127, 127, 127]);
}

#[test]
fn content_bounds_ignores_black() {
    let mut img = RgbImage::new(8, 6);
    assert_eq!(content_bounds(&img), None);
    img.put_pixel(2, 1, Rgb([1, 0, 0]));
    img.put_pixel(5, 4, Rgb([0, 0, 9]));
    assert_eq!(
        content_bounds(&img),
        Some(PixelBounds {
            x0: 2,
            y0: 1,
            x1: 6,
            y1: 5
        })
    );
}

#[test]
fn identical_images_have_no_difference() {
    let a = RgbImage::from_pixel(4, 4, Rgb([200, 10, 10]));
    assert_eq!(difference_bounds(&a, &a.clone()), None);
}

#[test]
fn difference_locates_changed_pixels() {
    let a = RgbImage::from_pixel(4, 4, Rgb([200, 10, 10]));
    let mut b = a.clone();
    b.put_pixel(3, 2, Rgb([200, 10, 11]));
    assert_eq!(
        difference_bounds(&a, &b),
        Some(PixelBounds {
            x0: 3,
            y0: 2,
            x1: 4,
            y1: 3
        })
    );
}

#[test]
fn size_mismatch_is_a_difference() {
    let a = RgbImage::new(4, 4);
    let b = RgbImage::new(4, 5);
    assert!(difference_bounds(&a, &b).is_some());
}
