use std::path::PathBuf;

pub type RemovalError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Opaque background removal: encoded image bytes in, encoded PNG bytes out.
pub trait BackgroundRemover {
    fn remove_background_bytes(&self, input: &[u8]) -> Result<Vec<u8>, RemovalError>;
}

impl<F> BackgroundRemover for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, RemovalError>,
{
    fn remove_background_bytes(&self, input: &[u8]) -> Result<Vec<u8>, RemovalError> {
        self(input)
    }
}

/// User-facing pickers and prompts provided by the UI layer.
///
/// Every method returns `None` when the user backs out.
pub trait Dialogs {
    fn pick_open_path(&self) -> Option<PathBuf>;

    /// `default_extension` includes the leading dot, e.g. `".png"`.
    fn pick_save_path(&self, default_extension: &str, filter_label: &str) -> Option<PathBuf>;

    /// Returns one of `allowed`, never anything else.
    fn prompt_choice(&self, prompt: &str, allowed: &[&str]) -> Option<String>;
}
