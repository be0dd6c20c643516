use crate::errors::Result;
use image::RgbaImage;
use std::path::PathBuf;

/// Foreground extraction capability.
///
/// Implementations receive an RGBA image and return an RGBA image of the same
/// dimensions in which background pixels are transparent. The batch processor
/// only depends on this trait, so tests can swap the ONNX model for a mock.
pub trait ImageSegmentationModel: Send + Sync {
    fn segment_image(&self, img: &RgbaImage) -> Result<RgbaImage>;
}

/// Source of the single background image used for a run.
///
/// `None` means the user cancelled, which ends the run without an error.
pub trait BackgroundPicker {
    fn pick_background(&self) -> Option<PathBuf>;
}
