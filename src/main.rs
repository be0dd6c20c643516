use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bg_replace_rs::{
    BackgroundPicker, BackgroundReplacer, BgReplaceError, Config, ImageSegmentationModel,
    PresetPicker,
};

fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.verbose)?;

    ensure!(
        config.model_path.exists(),
        "Model path does not exist: {}",
        config.model_path.display()
    );
    ensure!(
        config.input_dir.is_dir(),
        "Input directory does not exist: {}",
        config.input_dir.display()
    );

    let replacer = BackgroundReplacer::with_onnx_model(config.clone())
        .with_context(|| format!("Failed to load model: {}", config.model_path.display()))?;

    match &config.background {
        Some(path) => run(&replacer, &PresetPicker::new(path)),
        #[cfg(feature = "dialog")]
        None => run(&replacer, &bg_replace_rs::DialogPicker),
        #[cfg(not(feature = "dialog"))]
        None => {
            tracing::warn!("Built without the file dialog; pass --background");
            run(&replacer, &PresetPicker::cancelled())
        }
    }
}

fn run<M, P>(replacer: &BackgroundReplacer<M>, picker: &P) -> Result<()>
where
    M: ImageSegmentationModel,
    P: BackgroundPicker,
{
    match replacer.process_directory(picker) {
        Ok(summary) => {
            println!("\nDone!");
            println!("{summary}");
            Ok(())
        }
        Err(BgReplaceError::NoImagesFound { dir }) => {
            println!(
                "No images found. Tip: place images directly in {}",
                dir.display()
            );
            Ok(())
        }
        Err(BgReplaceError::BackgroundNotSelected) => {
            println!("No background selected. Exiting...");
            Ok(())
        }
        Err(BgReplaceError::BackgroundLoad { source, .. }) => {
            println!("Error loading background: {source}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// `RUST_LOG` wins over `-v`; without either only info and above is shown.
fn init_tracing(verbosity: u8) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
    Ok(())
}
