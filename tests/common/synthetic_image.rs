use image::{Rgb, RgbImage};

/// Two solid rectangles side by side, split at column `split`.
pub fn two_rectangles(
    width: u32,
    height: u32,
    split: u32,
    left: [u8; 3],
    right: [u8; 3],
) -> RgbImage {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(split > 0 && split < width, "split must leave both rectangles non-empty");
    RgbImage::from_fn(width, height, |x, _| if x < split { Rgb(left) } else { Rgb(right) })
}

/// Image filled with a single color.
pub fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    RgbImage::from_pixel(width, height, Rgb(color))
}
