pub mod config;
pub mod errors;
pub mod model;
pub mod naming;
pub mod picker;
pub mod pixel_ops;
pub mod report;
pub mod traits;

pub mod mocks;

use image::codecs::gif::GifDecoder;
use image::{imageops, imageops::FilterType, AnimationDecoder, RgbaImage};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub use config::Config;
pub use errors::{BgReplaceError, Result};
pub use model::Model;
pub use naming::unique_output_path;
pub use picker::PresetPicker;
#[cfg(feature = "dialog")]
pub use picker::DialogPicker;
pub use report::{count_outputs, RunSummary};
pub use traits::*;

/// Extensions (lower-case) picked up from the input directory.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "tiff"];

pub fn is_supported_image_format(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Images directly inside `dir`, sorted and without duplicates.
pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut image_files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| BgReplaceError::FileSystem {
            path: dir.to_path_buf(),
            operation: "input directory scan".to_string(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() && is_supported_image_format(entry.path()) {
            image_files.push(entry.into_path());
        }
    }

    image_files.sort();
    image_files.dedup();
    Ok(image_files)
}

/// Whether the GIF at `path` holds more than one frame.
///
/// Files that cannot be decoded as GIF count as static; loading them later
/// reports the real error.
pub fn is_animated_gif(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let Ok(decoder) = GifDecoder::new(BufReader::new(file)) else {
        return false;
    };
    decoder
        .into_frames()
        .take(2)
        .filter(std::result::Result::is_ok)
        .count()
        > 1
}

/// Background scaled to `width` x `height`.
pub fn resize_background(background: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    imageops::resize(background, width, height, FilterType::CatmullRom)
}

pub fn load_background(path: &Path) -> Result<RgbaImage> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| BgReplaceError::BackgroundLoad {
            path: path.to_path_buf(),
            source,
        })
}

/// Replaces the background of every image in a directory, one image at a time.
pub struct BackgroundReplacer<M: ImageSegmentationModel> {
    model: M,
    config: Config,
}

impl<M: ImageSegmentationModel> BackgroundReplacer<M> {
    pub const fn new(model: M, config: Config) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the whole batch: discovery, background choice, per-image
    /// processing and the final output count.
    ///
    /// Returns early with `NoImagesFound`, `BackgroundNotSelected` or
    /// `BackgroundLoad`. Failures on individual images only bump
    /// `RunSummary::failed`.
    pub fn process_directory<P: BackgroundPicker>(&self, picker: &P) -> Result<RunSummary> {
        let input_path = &self.config.input_dir;
        if !input_path.is_dir() {
            return Err(BgReplaceError::FileSystem {
                path: input_path.clone(),
                operation: "input directory check".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "input directory does not exist",
                ),
            });
        }

        info!("Scanning for images in {}", input_path.display());
        let image_files = discover_images(input_path)?;
        if image_files.is_empty() {
            return Err(BgReplaceError::NoImagesFound {
                dir: input_path.clone(),
            });
        }

        let preview: Vec<_> = image_files
            .iter()
            .take(5)
            .filter_map(|p| p.file_name())
            .map(|name| name.to_string_lossy())
            .collect();
        info!("Found {} images: {}...", image_files.len(), preview.join(", "));

        let background_path = picker
            .pick_background()
            .ok_or(BgReplaceError::BackgroundNotSelected)?;
        let background = load_background(&background_path)?;

        let output_path = self.config.output_dir();
        fs::create_dir_all(&output_path).map_err(|e| BgReplaceError::FileSystem {
            path: output_path.clone(),
            operation: "output directory creation".to_string(),
            source: e,
        })?;

        info!("Background: {}", background_path.display());
        info!("Output: {}", output_path.display());
        info!("Processing: {} images", image_files.len());

        let mut summary = self.process_images(&image_files, &background, &output_path);
        summary.outputs_on_disk = count_outputs(&output_path, &self.config.output_extension())?;
        Ok(summary)
    }

    /// Processes `image_files` in order. Never fails as a whole: every error is
    /// logged and counted against its image.
    pub fn process_images(
        &self,
        image_files: &[PathBuf],
        background: &RgbaImage,
        output_dir: &Path,
    ) -> RunSummary {
        let pb = ProgressBar::new(image_files.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut summary = RunSummary {
            output_dir: output_dir.to_path_buf(),
            ..RunSummary::default()
        };

        for input_file in image_files {
            let file_name = input_file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            match self.process_single_image(input_file, background, output_dir) {
                Ok(saved) => {
                    let saved_name = saved.file_name().unwrap_or_default().to_string_lossy();
                    pb.suspend(|| info!("Saved: {saved_name}"));
                    summary.succeeded += 1;
                }
                Err(BgReplaceError::AnimatedGif { .. }) => {
                    pb.suspend(|| warn!("Skipping animated GIF: {file_name}"));
                    summary.failed += 1;
                }
                Err(e) => {
                    pb.suspend(|| warn!("Error on {file_name}: {e}"));
                    debug!("{:#?}", e);
                    summary.failed += 1;
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        summary
    }

    /// Composites one image over `background` and writes it to `output_dir`.
    /// Returns the path written.
    pub fn process_single_image(
        &self,
        input_file: &Path,
        background: &RgbaImage,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let extension = input_file
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let base_name = input_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        if extension == "gif" && is_animated_gif(input_file) {
            return Err(BgReplaceError::AnimatedGif {
                path: input_file.to_path_buf(),
            });
        }

        let img = image::open(input_file)
            .map_err(|e| BgReplaceError::ImageProcessing {
                path: input_file.display().to_string(),
                operation: "image load".to_string(),
                source: Box::new(e),
            })?
            .to_rgba8();
        let (width, height) = img.dimensions();

        let foreground = self.model.segment_image(&img)?;
        if foreground.dimensions() != (width, height) {
            return Err(BgReplaceError::DimensionMismatch {
                expected: (width, height),
                actual: foreground.dimensions(),
            });
        }

        let resized_background = resize_background(background, width, height);
        let result = pixel_ops::alpha_composite(&resized_background, &foreground)?;

        let output_file =
            unique_output_path(output_dir, &base_name, &self.config.output_extension());
        result
            .save_with_format(&output_file, self.config.output_format())
            .map_err(|e| BgReplaceError::ImageProcessing {
                path: output_file.display().to_string(),
                operation: "image save".to_string(),
                source: Box::new(e),
            })?;

        Ok(output_file)
    }
}

impl BackgroundReplacer<Model> {
    pub fn with_onnx_model(config: Config) -> Result<Self> {
        let model = Model::new(&config.model_path, config.device_id)?;
        Ok(Self::new(model, config))
    }
}
