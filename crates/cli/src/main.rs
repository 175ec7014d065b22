//! CLI tool for building PowerPoint files from JSON deck descriptions.

mod deck;

use anyhow::{Context, Result};
use clap::Parser;
use deck::Deck;
use deck_pptx::{PptxWriter, WriteOptions};
use std::path::{Path, PathBuf};

/// Build a .pptx file from a JSON deck description.
#[derive(Parser, Debug)]
#[command(name = "deck-build")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Deck description (.json)
    input: PathBuf,

    /// Output PowerPoint file (.pptx)
    #[arg(short, long)]
    output: PathBuf,

    /// Replace the output file if it exists
    #[arg(long)]
    overwrite: bool,

    /// Do not open the result in the default viewer
    #[arg(long)]
    no_open: bool,

    /// Template presentation to merge the slides into
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn write_options(&self) -> WriteOptions {
        let mut options = WriteOptions::default()
            .with_overwrite(self.overwrite)
            .with_open_after_write(!self.no_open);
        if let Some(template) = &self.template {
            options = options.with_template(template);
        }
        options
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    build(&args.input, &args.output, &args.write_options())?;
    println!("{}", args.output.display());
    Ok(())
}

/// Read a deck description and write it as a presentation.
fn build(input: &Path, output: &Path, options: &WriteOptions) -> Result<()> {
    let deck = Deck::from_path(input)?;
    let base_dir = input.parent().unwrap_or_else(|| Path::new("."));
    let presentation = deck
        .into_presentation(base_dir)
        .with_context(|| format!("Failed to build deck from {}", input.display()))?;
    log::debug!("Built {} slide(s) from {}", presentation.len(), input.display());

    PptxWriter::new(options.clone())
        .write(output, &presentation)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_writes_package() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("deck.json");
        std::fs::write(
            &input,
            r#"{"title": "CLI", "slides": [
                {"title": "Hello", "shapes": [{"type": "text_box", "content": "world"}]}
            ]}"#,
        )
        .unwrap();
        let output = dir.path().join("deck.pptx");
        let options = WriteOptions::default().with_open_after_write(false);

        build(&input, &output, &options).unwrap();
        assert!(output.exists());

        let err = build(&input, &output, &options).unwrap_err();
        assert!(format!("{:#}", err).contains("already exists"));
    }

    #[test]
    fn test_args_map_to_options() {
        let args = Args::parse_from([
            "deck-build",
            "deck.json",
            "-o",
            "out.pptx",
            "--overwrite",
            "--no-open",
        ]);
        let options = args.write_options();
        assert!(options.overwrite());
        assert!(!options.open_after_write());
        assert!(options.template().is_none());
    }
}
