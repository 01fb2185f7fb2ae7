mod cli;
mod dialogs;
mod remover;

use anyhow::{Context, Result};
use app_settings::AppSettings;
use clap::Parser;
use core_types::ImageFormat;
use engine::{
    convert_interactive, remove_background_interactive, EncodeSettings, EngineError, ImageEngine,
    Outcome,
};
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ConvertArgs, RemoveArgs};
use crate::dialogs::{NativeDialogs, PresetDialogs};
use crate::remover::CommandRemover;

const APP_TITLE: &str = "Recast";
const MENU_CONVERT: &str = "Convert Format";
const MENU_REMOVE: &str = "Remove Background";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = AppSettings::load().unwrap_or_else(|err| {
        warn!("Failed to load settings, using defaults: {err}");
        AppSettings::default()
    });

    let command = match cli.command {
        Some(command) => command,
        None => match choose_action() {
            Some(command) => command,
            None => return Ok(()), // user quit
        },
    };

    let quality = cli.jpeg_quality.unwrap_or(settings.jpeg_quality);
    let engine = ImageEngine::with_settings(EncodeSettings::with_jpeg_quality(quality));
    let native = NativeDialogs::new(
        settings.get_last_directory(),
        settings.default_format.clone(),
    );

    let (task, result) = match command {
        Command::Convert(args) => (
            "Conversion",
            run_convert(&engine, &native, &mut settings, args),
        ),
        Command::RemoveBg(args) => (
            "Background removal",
            run_remove(&engine, &native, &settings, args),
        ),
    };

    report(task, result, &mut settings, cli.quiet)
}

fn choose_action() -> Option<Command> {
    let choice = MessageDialog::new()
        .set_title(APP_TITLE)
        .set_description("What would you like to do?")
        .set_buttons(MessageButtons::YesNoCancelCustom(
            MENU_CONVERT.to_string(),
            MENU_REMOVE.to_string(),
            "Quit".to_string(),
        ))
        .show();

    match choice {
        MessageDialogResult::Custom(label) if label == MENU_CONVERT => {
            Some(Command::Convert(ConvertArgs::default()))
        }
        MessageDialogResult::Custom(label) if label == MENU_REMOVE => {
            Some(Command::RemoveBg(RemoveArgs::default()))
        }
        // Backends without custom labels answer with the plain button kinds.
        MessageDialogResult::Yes => Some(Command::Convert(ConvertArgs::default())),
        MessageDialogResult::No => Some(Command::RemoveBg(RemoveArgs::default())),
        _ => None,
    }
}

fn run_convert(
    engine: &ImageEngine,
    native: &NativeDialogs,
    settings: &mut AppSettings,
    args: ConvertArgs,
) -> std::result::Result<Outcome, EngineError> {
    let format = match args.format {
        Some(format) => format,
        None => match native.prompt_format(&ImageFormat::names()) {
            Some(format) => format,
            None => return Ok(Outcome::Cancelled),
        },
    };

    let dialogs = PresetDialogs::new(native, args.output, args.compression);
    let outcome = convert_interactive(engine, &dialogs, args.input, &format)?;
    if matches!(outcome, Outcome::Completed(_)) {
        if let Ok(parsed) = format.parse::<ImageFormat>() {
            settings.default_format = Some(parsed.name().to_string());
        }
    }
    Ok(outcome)
}

fn run_remove(
    engine: &ImageEngine,
    native: &NativeDialogs,
    settings: &AppSettings,
    args: RemoveArgs,
) -> std::result::Result<Outcome, EngineError> {
    let remover = CommandRemover::from_settings(&settings.remover);
    let dialogs = PresetDialogs::new(native, args.output, None);
    info!("Background removal uses {}", settings.remover.program);
    remove_background_interactive(engine, &dialogs, &remover, args.input)
}

fn report(
    task: &str,
    result: std::result::Result<Outcome, EngineError>,
    settings: &mut AppSettings,
    quiet: bool,
) -> Result<()> {
    match result {
        Ok(Outcome::Completed(path)) => {
            info!("{task} saved to {}", path.display());
            settings.remember_file(&path);
            if let Err(err) = settings.save() {
                warn!("Failed to save settings: {err}");
            }
            notify(
                quiet,
                MessageLevel::Info,
                "Success",
                &format!("{task} finished.\nSaved to {}", path.display()),
            );
            Ok(())
        }
        Ok(Outcome::Cancelled) => {
            info!("{task} cancelled");
            notify(quiet, MessageLevel::Info, "Cancelled", &format!("{task} cancelled."));
            Ok(())
        }
        Err(err) => {
            error!("{task} failed: {err}");
            notify(quiet, MessageLevel::Error, "Error", &err.to_string());
            Err(err).context(format!("{task} failed"))
        }
    }
}

fn notify(quiet: bool, level: MessageLevel, title: &str, text: &str) {
    if quiet {
        return;
    }
    MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(text)
        .set_buttons(MessageButtons::Ok)
        .show();
}
