use std::path::Path;

use crate::{
    errors::{BgReplaceError, Result},
    pixel_ops::apply_alpha_mask,
    traits::ImageSegmentationModel,
};
use image::{
    buffer::ConvertBuffer, imageops, imageops::FilterType, ImageBuffer, Luma, RgbImage, RgbaImage,
};
use ndarray::prelude::*;
use nshare::AsNdarray3;
use ort::value::TensorRef;
use ort::{
    execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{builder::SessionBuilder, Session},
};
use parking_lot::Mutex;
use tracing::debug;

/// Input resolution of the U²-Net family when the model declares a dynamic shape.
const DEFAULT_IMAGE_SIZE: u32 = 320;
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Salient object segmentation model (U²-Net style) run through ONNX Runtime.
pub struct Model {
    pub image_size: u32,
    input_name: String,
    output_name: String,
    session: Mutex<Session>,
}

impl Model {
    pub fn new(model_path: &Path, device_id: i32) -> Result<Self> {
        let mut session = SessionBuilder::new()
            .map_err(|e| BgReplaceError::Model {
                operation: "session builder initialization".to_string(),
                source: Box::new(e),
            })?
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])
            .map_err(|e| BgReplaceError::Model {
                operation: "execution provider registration".to_string(),
                source: Box::new(e),
            })?
            .with_memory_pattern(true)
            .map_err(|e| BgReplaceError::Model {
                operation: "memory pattern configuration".to_string(),
                source: Box::new(e),
            })?
            .commit_from_file(model_path)
            .map_err(|e| BgReplaceError::Model {
                operation: format!("model load: {}", model_path.display()),
                source: Box::new(e),
            })?;

        let input = session.inputs.first().ok_or_else(|| BgReplaceError::Model {
            operation: "model input lookup".to_string(),
            source: "model declares no inputs".into(),
        })?;
        let output = session.outputs.first().ok_or_else(|| BgReplaceError::Model {
            operation: "model output lookup".to_string(),
            source: "model declares no outputs".into(),
        })?;
        let input_name = input.name.clone();
        let output_name = output.name.clone();

        let image_size = input
            .input_type
            .tensor_shape()
            .and_then(|shape| shape.get(2).copied())
            .filter(|&size| size > 0)
            .map_or(DEFAULT_IMAGE_SIZE, |size| size as u32);
        debug!(%input_name, %output_name, image_size, "loaded segmentation model");

        // initialize model
        let data = Array4::<f32>::zeros((1, 3, image_size as usize, image_size as usize));
        session
            .run(ort::inputs![input_name.as_str() => TensorRef::from_array_view(&data)?])
            .map_err(|e| BgReplaceError::Model {
                operation: "warm-up run".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            image_size,
            input_name,
            output_name,
            session: Mutex::new(session),
        })
    }

    pub fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array4<f32>> {
        let mut binding = self.session.lock();
        let outputs = binding.run(ort::inputs![
            self.input_name.as_str() => TensorRef::from_array_view(&tensor.as_standard_layout())?
        ])?;
        Ok(outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()?
            .to_owned())
    }
}

impl ImageSegmentationModel for Model {
    fn segment_image(&self, img: &RgbaImage) -> Result<RgbaImage> {
        let rgb: RgbImage = img.convert();
        let tensor = preprocess(&rgb, self.image_size);
        let mask = self.predict(tensor.view())?;
        let mask = postprocess_mask(mask, img.width(), img.height())?;
        apply_alpha_mask(img, &mask)
    }
}

/// Resizes to the square model input and normalizes into an NCHW tensor.
///
/// Pixels are scaled by the brightest channel value in the image, then
/// standardized with the ImageNet mean and deviation.
pub fn preprocess(image: &RgbImage, image_size: u32) -> Array4<f32> {
    let image = imageops::resize(image, image_size, image_size, FilterType::Lanczos3);
    let max = f32::from(image.as_raw().iter().copied().max().unwrap_or(0).max(1));

    let mut tensor = image.as_ndarray3().mapv(|v| f32::from(v) / max);
    for (channel, mut plane) in tensor.outer_iter_mut().enumerate() {
        plane.mapv_inplace(|v| (v - MEAN[channel]) / STD[channel]);
    }

    tensor.insert_axis(Axis(0))
}

/// Turns the raw `[1, 1, h, w]` saliency output into a `[0, 1]` mask at the
/// original image size.
pub fn postprocess_mask(
    mask: Array4<f32>,
    width: u32,
    height: u32,
) -> Result<ImageBuffer<Luma<f32>, Vec<f32>>> {
    let mask = mask.index_axis_move(Axis(0), 0).index_axis_move(Axis(0), 0);
    let (mask_height, mask_width) = mask.dim();

    let (min, max) = mask
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = (max - min).max(f32::EPSILON);
    let normalized: Vec<f32> = mask.iter().map(|&v| (v - min) / range).collect();

    let mask = ImageBuffer::from_raw(mask_width as u32, mask_height as u32, normalized)
        .ok_or_else(|| BgReplaceError::Model {
            operation: "mask buffer creation".to_string(),
            source: "mask tensor does not match its declared shape".into(),
        })?;
    Ok(imageops::resize(&mask, width, height, FilterType::Lanczos3))
}
