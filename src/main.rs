use clap::{ Arg, App };
use env_logger::Env;
use image::DynamicImage;
use log::info;

use std::error::Error;
use std::process;

use plate_ocr::PlateDetector;
use plate_ocr::config::DetectorConfig;
use plate_ocr::debug_dump::DebugDump;
use plate_ocr::utils;


fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let matches = App::new("plate-ocr")
                    .version(env!("CARGO_PKG_VERSION"))
                    .author("kingrong")
                    .about("Detect and OCR car number plate")
                    .arg(Arg::with_name("image")
                        .long("image")
                        .value_name("PATH")
                        .help("Path to input image")
                        .takes_value(true)
                        .required(true))
                    .arg(Arg::with_name("save")
                        .long("save")
                        .value_name("PATH")
                        .help("Path to save plate crop")
                        .takes_value(true)
                        .default_value("outputs/result.jpg"))
                    .arg(Arg::with_name("show")
                        .long("show")
                        .help("Show plate image"))
                    .arg(Arg::with_name("config")
                        .long("config")
                        .value_name("PATH")
                        .help("TOML file overriding detector thresholds")
                        .takes_value(true))
                    .arg(Arg::with_name("tessdata")
                        .long("tessdata")
                        .value_name("DIR")
                        .help("Tesseract data directory")
                        .takes_value(true))
                    .arg(Arg::with_name("lang")
                        .long("lang")
                        .value_name("CODE")
                        .help("Tesseract language [default: eng]")
                        .takes_value(true))
                    .arg(Arg::with_name("debug-dir")
                        .long("debug-dir")
                        .value_name("DIR")
                        .help("Write intermediate images to this directory")
                        .takes_value(true))
                    .get_matches();

    let image_path = matches.value_of("image").ok_or("image is required")?;
    let save_path = matches.value_of("save").ok_or("save path is required")?;
    utils::ensure_parent_dir(save_path)?;

    let mut config = match matches.value_of("config") {
        Some(path) => DetectorConfig::from_file(path)?,
        None => DetectorConfig::default(),
    };
    // command line wins over the [ocr] section
    if let Some(dir) = matches.value_of("tessdata") {
        config.ocr.data_path = Some(dir.into());
    }
    if let Some(lang) = matches.value_of("lang") {
        config.ocr.lang = lang.to_string();
    }

    let mut detector = PlateDetector::with_tesseract(config)?;
    if let Some(dir) = matches.value_of("debug-dir") {
        detector = detector.with_debug_dump(DebugDump::new(dir)?);
    }

    let result = detector.detect(image_path)?;
    match result.plate_image {
        Some(plate) => {
            plate.save(save_path)?;
            info!("plate crop written to {}", save_path);
            println!("Plate text: {}", result.text);
            if matches.is_present("show") {
                show_plate(&plate);
            }
        }
        None => println!("No plate detected."),
    }
    Ok(())
}

#[cfg(feature = "display-window")]
fn show_plate(plate: &DynamicImage) {
    utils::display_image("Plate", plate);
}

#[cfg(not(feature = "display-window"))]
fn show_plate(_plate: &DynamicImage) {
    log::warn!("--show needs the display-window feature, not showing the plate");
}
