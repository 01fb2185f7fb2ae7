use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use engine::Dialogs;
use rfd::FileDialog;
use tracing::warn;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp", "tiff", "gif", "ico"];

/// Native file dialogs plus a terminal prompt for choices.
pub struct NativeDialogs {
    start_dir: Option<PathBuf>,
    default_format: Option<String>,
}

impl NativeDialogs {
    pub fn new(start_dir: Option<PathBuf>, default_format: Option<String>) -> Self {
        Self {
            start_dir,
            default_format,
        }
    }

    /// Ask for the target format, offering the last one used.
    pub fn prompt_format(&self, allowed: &[&str]) -> Option<String> {
        let default = self.format_default(allowed);
        ask_terminal("Target format", allowed, default.as_deref())
    }

    fn format_default(&self, allowed: &[&str]) -> Option<String> {
        self.default_format
            .as_deref()
            .and_then(|d| match_choice(d, allowed))
    }

    fn file_dialog(&self, title: &str) -> FileDialog {
        let dialog = FileDialog::new().set_title(title);
        match &self.start_dir {
            Some(dir) if dir.is_dir() => dialog.set_directory(dir),
            _ => dialog,
        }
    }
}

impl Dialogs for NativeDialogs {
    fn pick_open_path(&self) -> Option<PathBuf> {
        self.file_dialog("Select Image File")
            .add_filter("Image Files", IMAGE_EXTENSIONS)
            .add_filter("All Files", &["*"])
            .pick_file()
    }

    fn pick_save_path(&self, default_extension: &str, filter_label: &str) -> Option<PathBuf> {
        let extension = default_extension.trim_start_matches('.');
        let path = self
            .file_dialog("Save Image As...")
            .add_filter(filter_label, &[extension])
            .add_filter("All Files", &["*"])
            .save_file()?;

        // Some platforms return the bare name when the user types no extension.
        if path.extension().is_none() && !extension.is_empty() {
            Some(path.with_extension(extension))
        } else {
            Some(path)
        }
    }

    fn prompt_choice(&self, prompt: &str, allowed: &[&str]) -> Option<String> {
        ask_terminal(prompt, allowed, None)
    }
}

fn ask_terminal(prompt: &str, allowed: &[&str], default: Option<&str>) -> Option<String> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    prompt_loop(&mut stdin.lock(), &mut stdout, prompt, allowed, default)
}

/// Dialogs with some answers fixed up front (from command-line flags).
pub struct PresetDialogs<'a> {
    inner: &'a dyn Dialogs,
    output: Option<PathBuf>,
    choice: Option<String>,
}

impl<'a> PresetDialogs<'a> {
    pub fn new(inner: &'a dyn Dialogs, output: Option<PathBuf>, choice: Option<String>) -> Self {
        Self {
            inner,
            output,
            choice,
        }
    }
}

impl Dialogs for PresetDialogs<'_> {
    fn pick_open_path(&self) -> Option<PathBuf> {
        self.inner.pick_open_path()
    }

    fn pick_save_path(&self, default_extension: &str, filter_label: &str) -> Option<PathBuf> {
        self.output
            .clone()
            .or_else(|| self.inner.pick_save_path(default_extension, filter_label))
    }

    fn prompt_choice(&self, prompt: &str, allowed: &[&str]) -> Option<String> {
        if let Some(preset) = &self.choice {
            match match_choice(preset, allowed) {
                Some(choice) => return Some(choice),
                None => warn!("{preset:?} is not a valid answer for {prompt}; asking instead"),
            }
        }
        self.inner.prompt_choice(prompt, allowed)
    }
}

/// Ask until the answer names (or numbers) one of `allowed`. An empty answer
/// takes `default` when there is one; end of input gives `None`.
pub fn prompt_loop<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    prompt: &str,
    allowed: &[&str],
    default: Option<&str>,
) -> Option<String> {
    loop {
        for (i, value) in allowed.iter().enumerate() {
            writeln!(out, "  {}) {value}", i + 1).ok()?;
        }
        match default {
            Some(d) => write!(out, "{prompt} [{d}]: ").ok()?,
            None => write!(out, "{prompt}: ").ok()?,
        }
        out.flush().ok()?;

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }

        let answer = line.trim();
        if answer.is_empty() {
            if let Some(d) = default {
                return Some(d.to_string());
            }
            continue;
        }
        if let Some(choice) = match_choice(answer, allowed) {
            return Some(choice);
        }
        writeln!(out, "{answer:?} is not one of the allowed values.").ok()?;
    }
}

fn match_choice(answer: &str, allowed: &[&str]) -> Option<String> {
    let answer = answer.trim();
    if let Ok(n) = answer.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| allowed.get(i))
            .map(|v| v.to_string());
    }
    allowed
        .iter()
        .find(|v| v.eq_ignore_ascii_case(answer))
        .map(|v| v.to_string())
}
