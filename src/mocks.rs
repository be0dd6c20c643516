use crate::errors::{BgReplaceError, Result};
use crate::traits::ImageSegmentationModel;
use image::{Rgba, RgbaImage};

/// What the mock does with every image it is handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Whole image is foreground: input returned as is.
    KeepAll,
    /// Whole image is background: every pixel made transparent.
    RemoveAll,
    /// Segmentation fails.
    Fail,
}

/// Segmentation model stand-in for tests.
#[derive(Debug, Clone)]
pub struct MockSegmentationModel {
    pub behavior: MockBehavior,
}

impl MockSegmentationModel {
    pub const fn new(behavior: MockBehavior) -> Self {
        Self { behavior }
    }
}

impl ImageSegmentationModel for MockSegmentationModel {
    fn segment_image(&self, img: &RgbaImage) -> Result<RgbaImage> {
        match self.behavior {
            MockBehavior::KeepAll => Ok(img.clone()),
            MockBehavior::RemoveAll => {
                let mut out = img.clone();
                out.pixels_mut().for_each(|Rgba(p)| p[3] = 0);
                Ok(out)
            }
            MockBehavior::Fail => Err(BgReplaceError::Model {
                operation: "mock segmentation".to_string(),
                source: "segmentation failed on purpose".into(),
            }),
        }
    }
}

/// Mock that keeps every pixel as foreground.
pub const fn create_mock_model() -> MockSegmentationModel {
    MockSegmentationModel::new(MockBehavior::KeepAll)
}
