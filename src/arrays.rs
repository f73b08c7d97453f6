use crate::common::split_length_to_ranges;
use crate::error::{Error, Result};
use crate::luv::srgb_to_luv_pixel;
use aligned_vec::{AVec, ConstAlign};
use image::RgbImage;
use multiversion::multiversion;
use rayon::current_num_threads;
use rayon::prelude::*;
use std::ops::{Index, IndexMut};

const ALIGN: usize = 64;

/// Bytes per pixel of a [`FeatureImage`]: L, u, v and one padding byte.
pub const FEATURE_STRIDE: usize = 4;

#[derive(Debug, Clone)]
pub struct Array2D<T> {
    pub data: AVec<T, ConstAlign<ALIGN>>,
    pub width: usize,
    pub height: usize,
}

impl<T> Array2D<T> {
    pub fn from_slice(data: &[T], width: usize, height: usize) -> Result<Self>
    where
        T: Clone,
    {
        if data.len() != width * height {
            return Err(Error::DimensionMismatch {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data: AVec::from_slice(ALIGN, data),
        })
    }

    pub fn from_fill(value: T, width: usize, height: usize) -> Self
    where
        T: Clone + Copy,
    {
        let data: AVec<T, ConstAlign<ALIGN>> =
            AVec::from_iter(ALIGN, (0..width * height).map(|_| value));
        Self {
            width,
            height,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get_index(&self, x: usize, y: usize) -> usize {
        debug_assert!(self.width > x);
        debug_assert!(self.height > y);
        self.width * y + x
    }

    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }
}

impl Array2D<bool> {
    /// Number of set pixels of a mask.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|m| **m).count()
    }
}

impl<T> Index<(usize, usize)> for Array2D<T> {
    type Output = T;
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.data[self.get_index(x, y)]
    }
}

impl<T> IndexMut<(usize, usize)> for Array2D<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        let idx = self.get_index(x, y);
        &mut self.data[idx]
    }
}

/// Packed 8-bit L*u*v* image with a padding byte per pixel.
///
/// This is the feature space the clustering runs in. Pixel position is not part of the feature.
#[derive(Debug, Clone)]
pub struct FeatureImage {
    pub luv_data: AVec<u8, ConstAlign<ALIGN>>,
    pub width: usize,
    pub height: usize,
}

impl FeatureImage {
    /// Converts packed RGB24 to packed L*u*v*, splitting rows between rayon threads.
    pub fn from_srgb(rgb_image: &[u8], width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage);
        }
        if rgb_image.len() != width * height * 3 {
            return Err(Error::DimensionMismatch {
                expected: width * height * 3,
                actual: rgb_image.len(),
            });
        }
        let mut luv_output: AVec<u8, ConstAlign<ALIGN>> =
            AVec::from_iter(ALIGN, (0..width * height * FEATURE_STRIDE).map(|_| 0u8));

        let ranges = split_length_to_ranges(height, current_num_threads());
        rayon::scope(|s| {
            let mut rgb_input: &[u8] = rgb_image;
            let mut data_output: &mut [u8] = luv_output.as_mut_slice();
            for rows in ranges {
                let (chunk_in, rest_in) = rgb_input.split_at(rows.len() * width * 3);
                rgb_input = rest_in;
                let (chunk_out, rest_out) =
                    data_output.split_at_mut(rows.len() * width * FEATURE_STRIDE);
                data_output = rest_out;
                s.spawn(move |_| convert_rows(chunk_in, chunk_out));
            }
        });
        Ok(Self {
            width,
            height,
            luv_data: luv_output,
        })
    }

    pub fn from_iter<I>(luv_iter: I, width: usize, height: usize) -> Result<Self>
    where
        I: IntoIterator<Item = [u8; 3]>,
    {
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage);
        }
        let luv_data: AVec<u8, ConstAlign<ALIGN>> = AVec::from_iter(
            ALIGN,
            luv_iter.into_iter().flat_map(|[l, u, v]| [l, u, v, 0]),
        );
        if luv_data.len() != width * height * FEATURE_STRIDE {
            return Err(Error::DimensionMismatch {
                expected: width * height,
                actual: luv_data.len() / FEATURE_STRIDE,
            });
        }
        Ok(Self {
            width,
            height,
            luv_data,
        })
    }

    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }

    #[inline(always)]
    pub fn get_index(&self, x: usize, y: usize) -> usize {
        debug_assert!(self.width > x);
        debug_assert!(self.height > y);
        (self.width * y + x) * FEATURE_STRIDE
    }

    #[inline(always)]
    pub fn get_pixel(&self, x: usize, y: usize) -> &[u8] {
        let idx = self.get_index(x, y);
        &self.luv_data[idx..idx + 3]
    }

    /// Iterates the L*u*v* triples in row-major pixel order.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.luv_data.chunks_exact(FEATURE_STRIDE).map(|p| &p[..3])
    }

    /// New owned copy with every pixel outside `mask` set to zero.
    pub fn masked(&self, mask: &Array2D<bool>) -> Result<Self> {
        if mask.len() != self.num_pixels() {
            return Err(Error::DimensionMismatch {
                expected: self.num_pixels(),
                actual: mask.len(),
            });
        }
        let mut luv_data = self.luv_data.clone();
        luv_data
            .as_mut_slice()
            .par_chunks_exact_mut(FEATURE_STRIDE)
            .zip(mask.as_slice().par_iter())
            .filter(|(_, keep)| !**keep)
            .for_each(|(pixel, _)| pixel.fill(0));
        Ok(Self {
            width: self.width,
            height: self.height,
            luv_data,
        })
    }
}

#[multiversion(targets = "simd")]
fn convert_rows(rgb_in: &[u8], luv_out: &mut [u8]) {
    for (rgb, luv) in rgb_in
        .chunks_exact(3)
        .zip(luv_out.chunks_exact_mut(FEATURE_STRIDE))
    {
        luv[..3].copy_from_slice(srgb_to_luv_pixel(rgb).as_slice());
    }
}

/// Decoded image: original colors for output plus their feature-space version for clustering.
///
/// Never mutated after construction. Masking produces a new image.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub colors: RgbImage,
    pub features: FeatureImage,
}

impl SourceImage {
    pub fn from_rgb(colors: RgbImage) -> Result<Self> {
        let features = FeatureImage::from_srgb(
            colors.as_raw(),
            colors.width() as usize,
            colors.height() as usize,
        )?;
        Ok(Self { colors, features })
    }

    pub fn width(&self) -> usize {
        self.features.width
    }

    pub fn height(&self) -> usize {
        self.features.height
    }

    /// Zeroes colors and features outside the mask. No cropping, dimensions are kept.
    pub fn masked(&self, mask: &Array2D<bool>) -> Result<Self> {
        let features = self.features.masked(mask)?;
        let mut colors = self.colors.clone();
        for (pixel, keep) in colors.pixels_mut().zip(mask.as_slice()) {
            if !*keep {
                pixel.0 = [0, 0, 0];
            }
        }
        Ok(Self { colors, features })
    }
}

#[cfg(test)]
mod tests {
    use super::{Array2D, FeatureImage, SourceImage, FEATURE_STRIDE};
    use crate::error::Error;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7) as u8, (y * 11) as u8, ((x + y) * 3) as u8])
        })
    }

    #[test]
    fn srgb_to_luv_test() {
        let img = gradient(37, 23);
        let conv_img = FeatureImage::from_srgb(img.as_raw(), 37, 23).unwrap();
        assert_eq!(conv_img.luv_data.len(), 37 * 23 * FEATURE_STRIDE);
        for i in 0..conv_img.luv_data.len() / FEATURE_STRIDE {
            assert_eq!(conv_img.luv_data[3 + i * FEATURE_STRIDE], 0);
        }
        for (x, y) in [(0, 0), (36, 0), (5, 22), (36, 22)] {
            let expected = crate::luv::srgb_to_luv_pixel(&img.get_pixel(x, y).0);
            assert_eq!(conv_img.get_pixel(x as usize, y as usize), expected.as_slice());
        }
    }

    #[test]
    fn srgb_to_luv_iter_test() {
        let img = gradient(16, 9);
        let convert_iter = img.as_raw().chunks_exact(3).map(crate::luv::srgb_to_luv_pixel);
        let conv_iter = FeatureImage::from_iter(convert_iter, 16, 9).unwrap();
        let conv_par = FeatureImage::from_srgb(img.as_raw(), 16, 9).unwrap();
        assert_eq!(conv_iter.luv_data.as_slice(), conv_par.luv_data.as_slice());
    }

    #[test]
    fn feature_image_rejects_bad_sizes() {
        assert!(matches!(
            FeatureImage::from_srgb(&[], 0, 4),
            Err(Error::EmptyImage)
        ));
        assert!(matches!(
            FeatureImage::from_srgb(&[0; 5], 1, 2),
            Err(Error::DimensionMismatch { expected: 6, .. })
        ));
        assert!(matches!(
            FeatureImage::from_iter([[1, 2, 3]; 3], 2, 2),
            Err(Error::DimensionMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn feature_image_pixels_skip_padding() {
        let img = gradient(12, 4);
        let conv_img = FeatureImage::from_srgb(img.as_raw(), 12, 4).unwrap();
        assert_eq!(conv_img.num_pixels(), 48);
        assert_eq!(conv_img.pixels().count(), 48);
        assert!(conv_img.pixels().all(|p| p.len() == 3));
    }

    #[test]
    fn masked_keeps_dimensions_and_zeroes_outside() {
        let source = SourceImage::from_rgb(gradient(6, 5)).unwrap();
        let mut mask = Array2D::from_fill(false, 6, 5);
        mask[(2, 3)] = true;
        mask[(5, 0)] = true;
        let masked = source.masked(&mask).unwrap();
        assert_eq!((masked.width(), masked.height()), (6, 5));
        assert_eq!(masked.colors.dimensions(), (6, 5));
        for y in 0..5 {
            for x in 0..6 {
                let color = masked.colors.get_pixel(x as u32, y as u32);
                if mask[(x, y)] {
                    assert_eq!(color, source.colors.get_pixel(x as u32, y as u32));
                    assert_eq!(masked.features.get_pixel(x, y), source.features.get_pixel(x, y));
                } else {
                    assert_eq!(color.0, [0, 0, 0]);
                    assert_eq!(masked.features.get_pixel(x, y), &[0, 0, 0]);
                }
            }
        }
        // the source stays untouched
        assert_ne!(source.colors.get_pixel(0, 4).0, [0, 0, 0]);
    }

    #[test]
    fn array2d_from_slice_checks_length() {
        assert!(Array2D::from_slice(&[1u32, 2, 3], 2, 2).is_err());
        let arr = Array2D::from_slice(&[1u32, 2, 3, 4], 2, 2).unwrap();
        assert_eq!(arr[(1, 1)], 4);
        assert_eq!(arr[(0, 1)], 3);
    }
}
