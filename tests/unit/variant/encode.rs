use image::Rgb;

use super::*;

#[test]
fn quality_is_clamped() {
    assert_eq!(clamp_quality(0), 1);
    assert_eq!(clamp_quality(95), 95);
    assert_eq!(clamp_quality(255), 100);
}

#[test]
fn encodes_decodable_jpeg() {
    let img = RgbImage::from_pixel(16, 8, Rgb([200, 40, 40]));
    let bytes = encode_jpeg(&img, 95).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

    let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (16, 8));
    let px = decoded.get_pixel(8, 4).0;
    assert!(px[0].abs_diff(200) <= 4 && px[1].abs_diff(40) <= 4, "{px:?}");
}

#[test]
fn lower_quality_is_not_larger() {
    let img = RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 128]));
    let hi = encode_jpeg(&img, 100).unwrap();
    let lo = encode_jpeg(&img, 10).unwrap();
    assert!(lo.len() <= hi.len());
}

#[test]
fn empty_image_is_an_encode_error() {
    let err = encode_jpeg(&RgbImage::new(0, 4), 95).unwrap_err();
    assert!(matches!(err, VariantError::Encode(_)));
}

#[test]
fn write_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("out.jpg");
    write_encoded(&path, b"abc").unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"abc");
}

#[test]
fn chroma_is_not_subsampled() {
    let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 80]));
    let bytes = encode_jpeg(&img, DEFAULT_QUALITY).unwrap();
    let sof = bytes
        .windows(2)
        .position(|w| w == [0xFF, 0xC0])
        .expect("baseline frame header");
    let components = usize::from(bytes[sof + 9]);
    assert_eq!(components, 3);
    for c in 0..components {
        assert_eq!(bytes[sof + 11 + c * 3], 0x11, "component {c} is subsampled");
    }
}
