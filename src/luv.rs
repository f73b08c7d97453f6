use tables::{D65_U, D65_V, SRGB_LINEAR_TBL, XYZ_MATRIX};
pub(crate) mod tables {
    use static_init::dynamic;
    /// Linear sRGB to XYZ (D65), row-major.
    pub const XYZ_MATRIX: [f32; 9] = [
        0.412453, 0.357580, 0.180423, 0.212671, 0.715160, 0.072169, 0.019334, 0.119193, 0.950227,
    ];
    pub const D65_U: f32 = 0.197_939_43;
    pub const D65_V: f32 = 0.468_310_96;
    #[dynamic(65535)]
    pub static SRGB_LINEAR_TBL: [f32; 256] =
        core::array::from_fn(|i| calculate_srgb_linear(i as u8));

    fn calculate_srgb_linear(a: u8) -> f32 {
        let v: f64 = a as f64 / 255.0;
        if v <= 0.04045 {
            return (v / 12.92) as f32;
        }
        ((v + 0.055) / 1.055).powf(2.4) as f32
    }
}

/// Convert pixel in RGB24 to 8-bit L*u*v*.
///
/// The output uses the usual 8-bit encoding:
///  - L - `L* * 255 / 100`, from 0 to 255
///  - u - `(u* + 134) * 255 / 354`
///  - v - `(v* + 140) * 255 / 262`
#[inline(always)]
pub fn srgb_to_luv_pixel(rgb: &[u8]) -> [u8; 3] {
    let r = unsafe { SRGB_LINEAR_TBL[rgb[0] as usize] };
    let g = unsafe { SRGB_LINEAR_TBL[rgb[1] as usize] };
    let b = unsafe { SRGB_LINEAR_TBL[rgb[2] as usize] };
    let x = XYZ_MATRIX[0] * r + XYZ_MATRIX[1] * g + XYZ_MATRIX[2] * b;
    let y = XYZ_MATRIX[3] * r + XYZ_MATRIX[4] * g + XYZ_MATRIX[5] * b;
    let z = XYZ_MATRIX[6] * r + XYZ_MATRIX[7] * g + XYZ_MATRIX[8] * b;
    let l = if y > 0.008856 {
        116.0 * y.cbrt() - 16.0
    } else {
        903.3 * y
    };
    let d = 1.0 / (x + 15.0 * y + 3.0 * z).max(f32::EPSILON);
    let u = 13.0 * l * (4.0 * x * d - D65_U);
    let v = 13.0 * l * (9.0 * y * d - D65_V);
    [
        (l * 2.55).round().clamp(0.0, 255.0) as u8,
        ((u + 134.0) * (255.0 / 354.0)).round().clamp(0.0, 255.0) as u8,
        ((v + 140.0) * (255.0 / 262.0)).round().clamp(0.0, 255.0) as u8,
    ]
}
