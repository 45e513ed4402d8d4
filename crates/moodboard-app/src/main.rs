//! Headless export runner.
//!
//! Usage: `moodboard <output.png> [backup.json] [WIDTHxHEIGHT]`
//!
//! Renders the persisted board (or a restored backup) to a flattened PNG at
//! the given canvas size (1920x1080 by default).

use kurbo::Size;
use moodboard_app::Workbench;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(output) = args.first().cloned() else {
        eprintln!("usage: moodboard <output.png> [backup.json] [WIDTHxHEIGHT]");
        return ExitCode::FAILURE;
    };
    let backup = args.get(1).cloned();
    let size = match args.get(2).map(String::as_str).map(parse_size) {
        Some(Some(size)) => size,
        Some(None) => {
            eprintln!("invalid size; expected WIDTHxHEIGHT, e.g. 1920x1080");
            return ExitCode::FAILURE;
        }
        None => Size::new(1920.0, 1080.0),
    };

    match pollster::block_on(run(&output, backup.as_deref(), size)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("moodboard: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    output: &str,
    backup: Option<&str>,
    size: Size,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut workbench = Workbench::open(size).await?;

    if let Some(path) = backup {
        let json = std::fs::read_to_string(path)?;
        let count = workbench.controller().restore_backup(&json).await?;
        log::info!("restored {count} items from {path}");
    }

    let png = workbench.export_png()?;
    std::fs::write(output, png)?;
    log::info!("wrote {output}");
    Ok(())
}

fn parse_size(value: &str) -> Option<Size> {
    let (w, h) = value.split_once('x')?;
    let width: f64 = w.parse().ok()?;
    let height: f64 = h.parse().ok()?;
    if width < 1.0 || height < 1.0 {
        return None;
    }
    Some(Size::new(width, height))
}
