use clap::{ArgAction, Parser};
use image::ImageFormat;
use std::path::PathBuf;

/// Output formats that store every pixel exactly.
const LOSSLESS_FORMATS: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Tiff, ImageFormat::Bmp];

#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Directory scanned (non-recursively) for images to process
    #[arg(short, long, default_value = ".")]
    pub input_dir: PathBuf,

    /// Where composites are written [default: <INPUT_DIR>/output]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Background image; a file dialog opens when omitted
    #[arg(short, long)]
    pub background: Option<PathBuf>,

    #[arg(short, long, default_value = "u2net.onnx")]
    pub model_path: PathBuf,

    #[arg(short, long, default_value = "png", value_parser = check_format)]
    pub format: String,

    #[arg(short, long, default_value_t = 0)]
    pub device_id: i32,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    /// Config for processing `input_dir` with every other option at its default.
    pub fn for_input_dir(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: None,
            background: None,
            model_path: PathBuf::from("u2net.onnx"),
            format: "png".to_string(),
            device_id: 0,
            verbose: 0,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.input_dir.join("output"))
    }

    pub fn output_format(&self) -> ImageFormat {
        ImageFormat::from_extension(&self.format).unwrap_or(ImageFormat::Png)
    }

    /// Lower-cased extension used both for writing and for counting outputs.
    pub fn output_extension(&self) -> String {
        self.format.to_lowercase()
    }
}

fn check_format(s: &str) -> Result<String, String> {
    let supported: Vec<_> = LOSSLESS_FORMATS
        .iter()
        .filter(|f| f.writing_enabled())
        .flat_map(|f| f.extensions_str())
        .map(|s| format!("`{}`", s))
        .collect();
    let supported_message = format!("Supported formats: {}", supported.join(", "));

    let format = ImageFormat::from_extension(s)
        .ok_or(format!("{} is not supported. {}", s, supported_message))?;
    if !LOSSLESS_FORMATS.contains(&format) || !format.writing_enabled() {
        return Err(format!("{} is not supported. {}", s, supported_message));
    }

    Ok(s.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_format_accepts_lossless() {
        assert_eq!(check_format("png").unwrap(), "png");
        assert_eq!(check_format("PNG").unwrap(), "png");
        assert_eq!(check_format("tiff").unwrap(), "tiff");
        assert_eq!(check_format("bmp").unwrap(), "bmp");
    }

    #[test]
    fn test_check_format_rejects_lossy_and_unknown() {
        assert!(check_format("jpg").is_err());
        assert!(check_format("gif").is_err());
        assert!(check_format("xyz").is_err());
    }

    #[test]
    fn test_default_output_dir_is_under_input() {
        let config = Config::for_input_dir("photos");
        assert_eq!(config.output_dir(), PathBuf::from("photos").join("output"));

        let config = Config {
            output_dir: Some("elsewhere".into()),
            ..Config::for_input_dir("photos")
        };
        assert_eq!(config.output_dir(), PathBuf::from("elsewhere"));
    }

    #[test]
    fn test_parse_from_args() {
        let config = Config::parse_from([
            "bg-replace-rs",
            "--input-dir",
            "in",
            "--background",
            "bg.jpg",
            "-vv",
        ]);
        assert_eq!(config.input_dir, PathBuf::from("in"));
        assert_eq!(config.background, Some(PathBuf::from("bg.jpg")));
        assert_eq!(config.format, "png");
        assert_eq!(config.output_format(), ImageFormat::Png);
        assert_eq!(config.verbose, 2);
    }
}
