// SPDX-License-Identifier: GPL-3.0-only

use clap::Parser;
use std::{fs, path::PathBuf};

use snipkit::{CaptureSettings, LoadedImage, Rect};

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about, long_about = None)]
struct Args {
    /// Image file to load
    input: PathBuf,
    /// Display-space crop rectangle as X,Y,WIDTH,HEIGHT; omit to send the
    /// whole image
    #[clap(short, long)]
    rect: Option<String>,
    /// Maximum preview width the rectangle coordinates are relative to
    #[clap(long)]
    display_width: Option<u32>,
    /// The directory to save the cropped image to
    #[clap(short, long)]
    save_dir: Option<PathBuf>,
    /// Print the result as a data URL instead of saving a file
    #[clap(long)]
    data_url: bool,
}

fn parse_rect(raw: &str) -> Result<Rect, String> {
    let fields: Vec<f32> = raw
        .split(',')
        .map(|field| field.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|err| format!("invalid rectangle '{raw}': {err}"))?;
    match fields[..] {
        [x, y, width, height] => Ok(Rect::new(x, y, width, height)),
        _ => Err(format!("expected X,Y,WIDTH,HEIGHT, got '{raw}'")),
    }
}

fn main() -> Result<(), String> {
    env_logger::init();
    let args = Args::parse();
    let settings = CaptureSettings::load();
    let display_width = args.display_width.unwrap_or(settings.max_display_width);

    let bytes = fs::read(&args.input)
        .map_err(|err| format!("failed to read {}: {err}", args.input.display()))?;
    let name = args.input.file_name().and_then(|n| n.to_str());
    let image = LoadedImage::from_bytes(&bytes, name, display_width)
        .map_err(|err| err.to_string())?;

    let rect = match &args.rect {
        Some(raw) => parse_rect(raw)?,
        // Zero-size rectangle: below the drag threshold, so the extractor
        // returns the full frame.
        None => Rect::default(),
    };
    let encoded = image.crop_to_source(rect).map_err(|err| err.to_string())?;

    if args.data_url {
        println!("{}", encoded.to_data_url());
        return Ok(());
    }

    let save_dir = args
        .save_dir
        .filter(|dir| dir.is_dir())
        .or_else(dirs::picture_dir)
        .ok_or_else(|| String::from("no save directory and no Pictures directory"))?;
    let date = chrono::Local::now();
    let filename = format!("Capture_{}.png", date.format("%Y-%m-%d_%H-%M-%S"));
    let path = save_dir.join(filename);
    fs::write(&path, &encoded.bytes)
        .map_err(|err| format!("failed to save {}: {err}", path.display()))?;

    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_arg_parses_four_fields() {
        assert_eq!(
            parse_rect("10, 10, 100, 60").unwrap(),
            Rect::new(10.0, 10.0, 100.0, 60.0)
        );
        assert!(parse_rect("10,10,100").is_err());
        assert!(parse_rect("a,b,c,d").is_err());
    }
}
