use image::{ImageBuffer, Pixel, Primitive, Rgba};
use num_traits::AsPrimitive;

use crate::errors::{BgReplaceError, Result};
use crate::pixel_ops::{from_f32, get_max_value};

/// Porter-Duff "over": places `foreground` on top of `background`.
///
/// A transparent foreground pixel yields the background pixel unchanged and an
/// opaque one yields the foreground pixel unchanged. In between, each colour
/// channel is interpolated by the foreground alpha.
pub fn alpha_composite<S>(
    background: &ImageBuffer<Rgba<S>, Vec<S>>,
    foreground: &ImageBuffer<Rgba<S>, Vec<S>>,
) -> Result<ImageBuffer<Rgba<S>, Vec<S>>>
where
    Rgba<S>: Pixel<Subpixel = S>,
    S: Primitive + AsPrimitive<f32> + 'static,
    f32: AsPrimitive<S>,
{
    if background.dimensions() != foreground.dimensions() {
        return Err(BgReplaceError::DimensionMismatch {
            expected: background.dimensions(),
            actual: foreground.dimensions(),
        });
    }

    let max = get_max_value::<S>();
    let max_f32: f32 = max.as_();
    let zero = S::zero();

    let processed_pixels = background
        .pixels()
        .zip(foreground.pixels())
        .flat_map(|(&bg, &fg)| {
            let Rgba([fr, fg_, fb, fa]) = fg;
            if fa == max {
                return [fr, fg_, fb, fa];
            }
            if fa == zero {
                return bg.0;
            }

            let Rgba([br, bg_, bb, ba]) = bg;
            let fa = fa.as_() / max_f32;
            let ba = ba.as_() / max_f32;
            let out_a = fa + ba * (1.0 - fa);
            let blend = |f: S, b: S| -> S {
                from_f32((f.as_() * fa + b.as_() * ba * (1.0 - fa)) / out_a)
            };

            [
                blend(fr, br),
                blend(fg_, bg_),
                blend(fb, bb),
                from_f32(out_a * max_f32),
            ]
        })
        .collect::<Vec<S>>();

    ImageBuffer::from_raw(background.width(), background.height(), processed_pixels).ok_or_else(
        || BgReplaceError::ImageProcessing {
            path: "unknown".to_string(),
            operation: "alpha composite".to_string(),
            source: "failed to create ImageBuffer from processed pixels".into(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn checker(width: u32, height: u32, alpha: u8) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 40) as u8, (y * 40) as u8, ((x + y) * 20) as u8, alpha])
        })
    }

    #[test]
    fn test_opaque_foreground_wins() -> Result<()> {
        let background = RgbaImage::from_pixel(4, 3, Rgba([0, 128, 255, 255]));
        let foreground = checker(4, 3, 255);

        let result = alpha_composite(&background, &foreground)?;
        assert_eq!(result, foreground);
        Ok(())
    }

    #[test]
    fn test_transparent_foreground_shows_background() -> Result<()> {
        let background = checker(4, 3, 255);
        let foreground = RgbaImage::from_pixel(4, 3, Rgba([9, 9, 9, 0]));

        let result = alpha_composite(&background, &foreground)?;
        assert_eq!(result, background);
        Ok(())
    }

    #[test]
    fn test_half_alpha_interpolates() -> Result<()> {
        let background = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 200, 255]));
        let foreground = RgbaImage::from_pixel(1, 1, Rgba([255, 100, 0, 128]));

        let result = alpha_composite(&background, &foreground)?;
        let Rgba([r, g, b, a]) = *result.get_pixel(0, 0);
        assert_eq!(a, 255);
        assert_eq!(r, 128);
        assert_eq!(g, 50);
        assert_eq!(b, 100);
        Ok(())
    }

    #[test]
    fn test_dimension_mismatch() {
        let background = RgbaImage::new(2, 2);
        let foreground = RgbaImage::new(2, 3);
        assert!(alpha_composite(&background, &foreground).is_err());
    }
}
