use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "recast",
    version,
    about = "Convert an image to another format or strip its background"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// JPEG quality (1-100); overrides the stored setting
    #[arg(long, global = true, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: Option<u8>,

    /// Report the result on the terminal only, without message boxes
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert an image (PNG, JPEG, GIF, BMP, TIFF, WEBP, ICO)
    Convert(ConvertArgs),
    /// Remove the background and save the result as PNG
    #[command(name = "remove-bg")]
    RemoveBg(RemoveArgs),
}

#[derive(Debug, Default, Args)]
pub struct ConvertArgs {
    /// Source image; a file dialog opens when omitted
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Target format; prompted for when omitted
    #[arg(short, long)]
    pub format: Option<String>,

    /// Destination; a save dialog opens when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// TIFF compression codec (raw, none, packbits, tiff_lzw, ...)
    #[arg(short, long)]
    pub compression: Option<String>,
}

#[derive(Debug, Default, Args)]
pub struct RemoveArgs {
    /// Source image; a file dialog opens when omitted
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Destination PNG; a save dialog opens when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
