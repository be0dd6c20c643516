use std::path::PathBuf;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Structured error types for the background replacement tool.
///
/// Variants fall into two groups. `NoImagesFound`, `BackgroundNotSelected` and
/// `BackgroundLoad` end a run before any image is touched. Everything else that
/// surfaces while handling a single image is recorded against that image and the
/// batch moves on.
#[derive(Error, Debug)]
pub enum BgReplaceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing error: {operation} failed (file: {path}): {source}")]
    ImageProcessing {
        path: String,
        operation: String,
        #[source]
        source: BoxError,
    },

    #[error("Model error: {operation} failed: {source}")]
    Model {
        operation: String,
        #[source]
        source: BoxError,
    },

    #[error("No images found in {dir:?}")]
    NoImagesFound { dir: PathBuf },

    #[error("No background selected")]
    BackgroundNotSelected,

    #[error("Error loading background {path:?}: {source}")]
    BackgroundLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Animated GIF is not supported: {path:?}")]
    AnimatedGif { path: PathBuf },

    #[error("Segmentation returned {actual:?}, expected {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

impl BgReplaceError {
    /// Whether this error ends the whole run rather than a single image.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoImagesFound { .. } | Self::BackgroundNotSelected | Self::BackgroundLoad { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BgReplaceError>;

/// Errors coming through anyhow carry no structure, so they become
/// configuration errors at the crate boundary.
impl From<anyhow::Error> for BgReplaceError {
    fn from(err: anyhow::Error) -> Self {
        BgReplaceError::Configuration {
            message: err.to_string(),
        }
    }
}

/// Fallback for I/O errors raised without path context. Call sites that know the
/// path should build `BgReplaceError::FileSystem` themselves.
impl From<std::io::Error> for BgReplaceError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

impl From<image::ImageError> for BgReplaceError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing {
            path: "unknown".to_string(),
            operation: "image processing".to_string(),
            source: Box::new(err),
        }
    }
}

impl From<ort::Error> for BgReplaceError {
    fn from(err: ort::Error) -> Self {
        Self::Model {
            operation: "ort operation".to_string(),
            source: Box::new(err),
        }
    }
}

/// Shape errors only happen while reshaping model tensors, so they are model errors.
impl From<ndarray::ShapeError> for BgReplaceError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Model {
            operation: "tensor shape conversion".to_string(),
            source: Box::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(BgReplaceError::BackgroundNotSelected.is_fatal());
        assert!(BgReplaceError::NoImagesFound { dir: "in".into() }.is_fatal());
        assert!(!BgReplaceError::AnimatedGif {
            path: "a.gif".into()
        }
        .is_fatal());
        assert!(!BgReplaceError::DimensionMismatch {
            expected: (1, 1),
            actual: (2, 2)
        }
        .is_fatal());
    }

    #[test]
    fn test_distinct_background_messages() {
        let not_selected = BgReplaceError::BackgroundNotSelected.to_string();
        let load = BgReplaceError::BackgroundLoad {
            path: "bg.png".into(),
            source: image::ImageError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "missing",
            )),
        }
        .to_string();

        assert_eq!(not_selected, "No background selected");
        assert!(load.starts_with("Error loading background"));
        assert!(load.contains("missing"));
    }

    #[test]
    fn test_messages_include_source_text() {
        let processing = BgReplaceError::ImageProcessing {
            path: "a.jpg".to_string(),
            operation: "image load".to_string(),
            source: "bad marker".into(),
        }
        .to_string();
        assert!(processing.contains("a.jpg"));
        assert!(processing.ends_with("bad marker"));

        let model = BgReplaceError::Model {
            operation: "inference".to_string(),
            source: "out of memory".into(),
        }
        .to_string();
        assert!(model.ends_with("out of memory"));
    }
}
