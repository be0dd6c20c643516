use std::path::PathBuf;

use crate::traits::BackgroundPicker;

/// Picker backed by a path given up front, usually from `--background`.
#[derive(Debug, Clone)]
pub struct PresetPicker {
    path: Option<PathBuf>,
}

impl PresetPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A picker that behaves like a cancelled dialog.
    pub const fn cancelled() -> Self {
        Self { path: None }
    }
}

impl BackgroundPicker for PresetPicker {
    fn pick_background(&self) -> Option<PathBuf> {
        self.path.clone()
    }
}

/// Native modal file dialog restricted to supported image types.
#[cfg(feature = "dialog")]
#[derive(Debug, Default, Clone, Copy)]
pub struct DialogPicker;

#[cfg(feature = "dialog")]
impl BackgroundPicker for DialogPicker {
    fn pick_background(&self) -> Option<PathBuf> {
        // GTK and the portal backend match filters case-sensitively.
        let extensions: Vec<String> = crate::IMAGE_EXTENSIONS
            .iter()
            .flat_map(|ext| [ext.to_string(), ext.to_uppercase()])
            .collect();

        rfd::FileDialog::new()
            .set_title("Select Background Image")
            .add_filter("Image files", extensions.as_slice())
            .pick_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_picker() {
        assert_eq!(
            PresetPicker::new("bg.png").pick_background(),
            Some(PathBuf::from("bg.png"))
        );
        assert_eq!(PresetPicker::cancelled().pick_background(), None);
    }
}
