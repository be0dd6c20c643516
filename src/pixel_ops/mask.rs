use image::{ImageBuffer, Luma, Pixel, Primitive, Rgba};
use num_traits::AsPrimitive;

use crate::errors::{BgReplaceError, Result};
use crate::pixel_ops::{from_f32, get_max_value};

/// Scales the alpha channel of `image` by `mask`.
///
/// Mask value zero makes a pixel fully transparent, the mask maximum keeps the
/// pixel's own alpha. Colour channels are left untouched.
pub fn apply_alpha_mask<SI, SM>(
    image: &ImageBuffer<Rgba<SI>, Vec<SI>>,
    mask: &ImageBuffer<Luma<SM>, Vec<SM>>,
) -> Result<ImageBuffer<Rgba<SI>, Vec<SI>>>
where
    Rgba<SI>: Pixel<Subpixel = SI>,
    Luma<SM>: Pixel<Subpixel = SM>,
    SI: Primitive + AsPrimitive<f32> + 'static,
    SM: Primitive + AsPrimitive<f32> + 'static,
    f32: AsPrimitive<SI>,
{
    if image.dimensions() != mask.dimensions() {
        return Err(BgReplaceError::DimensionMismatch {
            expected: image.dimensions(),
            actual: mask.dimensions(),
        });
    }

    let sm_max: f32 = get_max_value::<SM>().as_();

    let processed_pixels = image
        .pixels()
        .zip(mask.pixels())
        .flat_map(|(image_pixel, mask_pixel)| {
            let Rgba([red, green, blue, alpha]) = *image_pixel;
            let Luma([weight]) = *mask_pixel;
            let weight = (weight.as_() / sm_max).clamp(0.0, 1.0);
            [red, green, blue, from_f32(alpha.as_() * weight)]
        })
        .collect::<Vec<SI>>();

    ImageBuffer::from_raw(image.width(), image.height(), processed_pixels).ok_or_else(|| {
        BgReplaceError::ImageProcessing {
            path: "unknown".to_string(),
            operation: "mask application".to_string(),
            source: "failed to create ImageBuffer from processed pixels".into(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, RgbaImage};

    #[test]
    fn test_mask_scales_alpha() -> Result<()> {
        let image = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 255]));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(0, 0, Luma([0]));
        mask.put_pixel(1, 0, Luma([255]));

        let masked = apply_alpha_mask(&image, &mask)?;
        assert_eq!(masked.get_pixel(0, 0), &Rgba([10, 20, 30, 0]));
        assert_eq!(masked.get_pixel(1, 0), &Rgba([10, 20, 30, 255]));
        Ok(())
    }

    #[test]
    fn test_float_mask() -> Result<()> {
        let image = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 200]));
        let mask = ImageBuffer::from_pixel(1, 1, Luma([0.5f32]));

        let masked = apply_alpha_mask(&image, &mask)?;
        assert_eq!(masked.get_pixel(0, 0), &Rgba([1, 2, 3, 100]));
        Ok(())
    }

    #[test]
    fn test_dimension_mismatch() {
        let image = RgbaImage::new(2, 2);
        let mask = GrayImage::new(3, 2);
        assert!(matches!(
            apply_alpha_mask(&image, &mask),
            Err(BgReplaceError::DimensionMismatch { .. })
        ));
    }
}
