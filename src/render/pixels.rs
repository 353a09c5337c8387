use image::{Rgb, RgbImage, RgbaImage};

/// Inclusive-exclusive pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PixelBounds {
    /// Left edge.
    pub x0: u32,
    /// Top edge.
    pub y0: u32,
    /// Right edge (exclusive).
    pub x1: u32,
    /// Bottom edge (exclusive).
    pub y1: u32,
}

/// Scale the alpha channel of a straight-alpha image by `opacity`.
pub fn scale_alpha(img: &mut RgbaImage, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity >= 1.0 {
        return;
    }
    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    for px in img.pixels_mut() {
        px.0[3] = mul_div255(u16::from(px.0[3]), op);
    }
}

/// Composite a straight-alpha image over an opaque background and drop alpha.
pub fn matte(img: &RgbaImage, background: [u8; 3]) -> RgbImage {
    let mut out = RgbImage::new(img.width(), img.height());
    for (dst, src) in out.pixels_mut().zip(img.pixels()) {
        let a = u16::from(src.0[3]);
        let inv = 255 - a;
        let mut rgb = [0u8; 3];
        for i in 0..3 {
            rgb[i] = mul_div255(u16::from(src.0[i]), a)
                .saturating_add(mul_div255(u16::from(background[i]), inv));
        }
        *dst = Rgb(rgb);
    }
    out
}

/// Bounding box of all non-black pixels, `None` for an all-black (or empty) image.
pub fn content_bounds(img: &RgbImage) -> Option<PixelBounds> {
    let mut bounds: Option<PixelBounds> = None;
    for (x, y, px) in img.enumerate_pixels() {
        if px.0 == [0, 0, 0] {
            continue;
        }
        let b = bounds.get_or_insert(PixelBounds {
            x0: x,
            y0: y,
            x1: x + 1,
            y1: y + 1,
        });
        b.x0 = b.x0.min(x);
        b.y0 = b.y0.min(y);
        b.x1 = b.x1.max(x + 1);
        b.y1 = b.y1.max(y + 1);
    }
    bounds
}

/// Bounding box of pixels that differ between `a` and `b`.
///
/// Images of different sizes differ everywhere.
pub fn difference_bounds(a: &RgbImage, b: &RgbImage) -> Option<PixelBounds> {
    if a.dimensions() != b.dimensions() {
        return Some(PixelBounds {
            x0: 0,
            y0: 0,
            x1: a.width().max(b.width()),
            y1: a.height().max(b.height()),
        });
    }
    let mut diff = RgbImage::new(a.width(), a.height());
    for ((d, pa), pb) in diff.pixels_mut().zip(a.pixels()).zip(b.pixels()) {
        *d = Rgb([
            pa.0[0].abs_diff(pb.0[0]),
            pa.0[1].abs_diff(pb.0[1]),
            pa.0[2].abs_diff(pb.0[2]),
        ]);
    }
    content_bounds(&diff)
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/pixels.rs"]
mod tests;
