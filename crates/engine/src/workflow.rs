//! The two point-and-click flows, expressed against [`Dialogs`] so they run
//! the same under a native UI, a terminal, or a test double.

use std::path::PathBuf;

use core_types::{ConversionRequest, ImageFormat, SaveOption, TiffCompression};
use tracing::info;

use crate::capabilities::{BackgroundRemover, Dialogs};
use crate::convert::ImageEngine;
use crate::{EngineError, Result};

/// How an interactive flow ended when nothing went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(PathBuf),
    /// The user declined a picker or prompt; nothing was written.
    Cancelled,
}

pub fn convert_interactive(
    engine: &ImageEngine,
    dialogs: &dyn Dialogs,
    input: Option<PathBuf>,
    format: &str,
) -> Result<Outcome> {
    let target: ImageFormat = format
        .parse()
        .map_err(|_| EngineError::InvalidFormat(format.to_string()))?;

    let Some(input) = input.or_else(|| dialogs.pick_open_path()) else {
        info!("Conversion cancelled: no input selected");
        return Ok(Outcome::Cancelled);
    };

    let spec = target.spec();
    let Some(output) = dialogs.pick_save_path(&format!(".{}", spec.extension), spec.filter_label)
    else {
        info!("Conversion cancelled: no destination selected");
        return Ok(Outcome::Cancelled);
    };

    let mut request = ConversionRequest::new(&input, target.name()).with_output(&output);
    if spec.accepts_option(SaveOption::Compression) {
        let Some(codec) = dialogs.prompt_choice(
            &format!("{target} compression"),
            &TiffCompression::NAMES,
        ) else {
            info!("Conversion cancelled: no compression chosen");
            return Ok(Outcome::Cancelled);
        };
        request = request.with_option(codec);
    }

    engine.convert(&request).map(Outcome::Completed)
}

pub fn remove_background_interactive(
    engine: &ImageEngine,
    dialogs: &dyn Dialogs,
    remover: &dyn BackgroundRemover,
    input: Option<PathBuf>,
) -> Result<Outcome> {
    let Some(input) = input.or_else(|| dialogs.pick_open_path()) else {
        info!("Background removal cancelled: no input selected");
        return Ok(Outcome::Cancelled);
    };

    let png = ImageFormat::Png.spec();
    let Some(output) = dialogs.pick_save_path(&format!(".{}", png.extension), png.filter_label)
    else {
        info!("Background removal cancelled: no destination selected");
        return Ok(Outcome::Cancelled);
    };

    engine
        .remove_background(&input, Some(&output), remover)
        .map(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RemovalError;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    #[derive(Default)]
    struct ScriptedDialogs {
        open: Option<PathBuf>,
        save: Option<PathBuf>,
        choice: Option<String>,
        calls: RefCell<Vec<String>>,
    }

    impl Dialogs for ScriptedDialogs {
        fn pick_open_path(&self) -> Option<PathBuf> {
            self.calls.borrow_mut().push("open".into());
            self.open.clone()
        }

        fn pick_save_path(&self, default_extension: &str, filter_label: &str) -> Option<PathBuf> {
            self.calls
                .borrow_mut()
                .push(format!("save {default_extension} {filter_label}"));
            self.save.clone()
        }

        fn prompt_choice(&self, prompt: &str, allowed: &[&str]) -> Option<String> {
            self.calls
                .borrow_mut()
                .push(format!("choice {prompt} [{}]", allowed.len()));
            self.choice.clone()
        }
    }

    fn sample_png(dir: &Path) -> PathBuf {
        let path = dir.join("sample.png");
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(6, 6, Rgba([9, 8, 7, 255])))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn invalid_format_is_rejected_before_any_dialog() {
        let dialogs = ScriptedDialogs::default();
        let err = convert_interactive(&ImageEngine::new(), &dialogs, None, "XCF").unwrap_err();
        assert!(matches!(err, EngineError::InvalidFormat(_)));
        assert!(dialogs.calls.borrow().is_empty());
    }

    #[test]
    fn declining_the_open_dialog_cancels() {
        let dialogs = ScriptedDialogs::default();
        let outcome = convert_interactive(&ImageEngine::new(), &dialogs, None, "png").unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(*dialogs.calls.borrow(), vec!["open".to_string()]);
    }

    #[test]
    fn declining_the_save_dialog_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = sample_png(dir.path());
        let dialogs = ScriptedDialogs::default();

        let outcome =
            convert_interactive(&ImageEngine::new(), &dialogs, Some(input.clone()), "JPG").unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(
            *dialogs.calls.borrow(),
            vec!["save .jpg JPEG files".to_string()]
        );
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn picked_paths_drive_the_conversion() {
        let dir = tempdir().unwrap();
        let input = sample_png(dir.path());
        let dialogs = ScriptedDialogs {
            open: Some(input),
            save: Some(dir.path().join("picked.gif")),
            ..Default::default()
        };

        let outcome = convert_interactive(&ImageEngine::new(), &dialogs, None, "gif").unwrap();
        assert_eq!(outcome, Outcome::Completed(dir.path().join("picked.gif")));
        assert!(dir.path().join("picked.gif").exists());
    }

    #[test]
    fn tiff_asks_for_a_codec() {
        let dir = tempdir().unwrap();
        let input = sample_png(dir.path());
        let dialogs = ScriptedDialogs {
            save: Some(dir.path().join("out.tiff")),
            choice: Some("packbits".into()),
            ..Default::default()
        };

        let outcome =
            convert_interactive(&ImageEngine::new(), &dialogs, Some(input), "TIFF").unwrap();
        assert!(matches!(outcome, Outcome::Completed(_)));
        assert_eq!(
            dialogs.calls.borrow().last().unwrap(),
            "choice TIFF compression [9]"
        );
        assert!(image::open(dir.path().join("out.tiff")).is_ok());
    }

    #[test]
    fn tiff_prompt_abort_cancels() {
        let dir = tempdir().unwrap();
        let input = sample_png(dir.path());
        let dialogs = ScriptedDialogs {
            save: Some(dir.path().join("out.tiff")),
            ..Default::default()
        };

        let outcome =
            convert_interactive(&ImageEngine::new(), &dialogs, Some(input), "tiff").unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(!dir.path().join("out.tiff").exists());
    }

    #[test]
    fn background_removal_uses_png_save_dialog() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("portrait.jpg");
        fs::write(&input, b"raw").unwrap();
        let dialogs = ScriptedDialogs {
            save: Some(dir.path().join("cutout.png")),
            ..Default::default()
        };
        let remover = |bytes: &[u8]| -> std::result::Result<Vec<u8>, RemovalError> {
            Ok(bytes.iter().rev().copied().collect())
        };

        let outcome =
            remove_background_interactive(&ImageEngine::new(), &dialogs, &remover, Some(input))
                .unwrap();
        assert_eq!(outcome, Outcome::Completed(dir.path().join("cutout.png")));
        assert_eq!(fs::read(dir.path().join("cutout.png")).unwrap(), b"war");
        assert_eq!(
            *dialogs.calls.borrow(),
            vec!["save .png PNG files".to_string()]
        );
    }

    #[test]
    fn background_removal_cancel_skips_remover() {
        let dialogs = ScriptedDialogs::default();
        let called = RefCell::new(false);
        let remover = |_: &[u8]| -> std::result::Result<Vec<u8>, RemovalError> {
            *called.borrow_mut() = true;
            Ok(Vec::new())
        };

        let outcome =
            remove_background_interactive(&ImageEngine::new(), &dialogs, &remover, None).unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(!*called.borrow());
    }
}
