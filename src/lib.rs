use image::DynamicImage;
use imageproc::rect::Rect;
use log::{ debug, info };

use std::path::Path;

use config::DetectorConfig;
use debug_dump::DebugDump;
use error::{ PlateError, PlateErrorKind };
use ocr::OcrEngine;

#[cfg(feature = "tesseract")]
use ocr::TesseractEngine;

pub mod config;
pub mod debug_dump;
pub mod error;
pub mod image_process;
pub mod ocr;
pub mod utils;


/// Outcome of one `detect` call. Empty when no plate was found.
#[derive(Debug, Clone, Default)]
pub struct DetectionResult {
    pub plate_image: Option<DynamicImage>,
    /// Plate location in the resized working image.
    pub bounding_box: Option<Rect>,
    /// Uppercase alphanumerics only.
    pub text: String,
}

impl DetectionResult {

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.plate_image.is_none()
    }
}

pub struct PlateDetector<E> {
    config: DetectorConfig,
    engine: E,
    debug_dump: Option<DebugDump>,
}

#[cfg(feature = "tesseract")]
impl PlateDetector<TesseractEngine> {

    /// Detector backed by Tesseract, initialized once from `config.ocr`.
    pub fn with_tesseract(config: DetectorConfig) -> Result<Self, PlateError> {
        config.validate()?;
        let engine = TesseractEngine::new(&config.ocr)?;
        Self::new(config, engine)
    }
}

impl<E: OcrEngine> PlateDetector<E> {

    pub fn new(config: DetectorConfig, engine: E) -> Result<Self, PlateError> {
        config.validate()?;
        Ok(Self { config, engine, debug_dump: None })
    }

    /// Write intermediate images of every run into `dump`.
    pub fn with_debug_dump(mut self, dump: DebugDump) -> Self {
        self.debug_dump = Some(dump);
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Load `image_path` and look for a plate in it.
    pub fn detect(&mut self, image_path: impl AsRef<Path>) -> Result<DetectionResult, PlateError> {
        let path = image_path.as_ref();
        let img = image::open(path).map_err(|source| {
            PlateErrorKind::ImageNotFound { path: path.to_path_buf(), source }
        })?;
        debug!("loaded {} ({}x{})", path.display(), img.width(), img.height());
        self.detect_image(&img)
    }

    pub fn detect_image(&mut self, img: &DynamicImage) -> Result<DetectionResult, PlateError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(PlateErrorKind::EmptyImage.into());
        }
        // crops are saved as jpeg, which has no alpha
        let img = DynamicImage::ImageRgb8(utils::resize_keep_aspect(img, self.config.working_width).to_rgb8());
        let stages = image_process::preprocess(&img, &self.config.preprocess)?;
        if let Some(dump) = &self.debug_dump {
            dump.save_stages(&stages)?;
        }

        let candidate = match image_process::locate_plate(&stages.dilated, &self.config.locator) {
            Some(candidate) => candidate,
            None => {
                info!("no plate found");
                return Ok(DetectionResult::empty());
            }
        };

        let plate = image_process::extract_plate(&img, &candidate.bounding_box);
        if let Some(dump) = &self.debug_dump {
            dump.save_color(debug_dump::PLATE, &plate)?;
        }
        let text = self.ocr_plate(&plate)?;
        info!("plate at {:?}: {:?}", candidate.bounding_box, text);

        Ok(DetectionResult {
            plate_image: Some(plate),
            bounding_box: Some(candidate.bounding_box),
            text,
        })
    }

    /// Binarize the cropped plate, run OCR and keep uppercase alphanumerics.
    /// An empty crop gives an empty string without touching the engine.
    pub fn ocr_plate(&mut self, plate: &DynamicImage) -> Result<String, PlateError> {
        if plate.width() == 0 || plate.height() == 0 {
            return Ok(String::new());
        }
        let binary = image_process::prepare_for_ocr(plate, &self.config.ocr_input);
        if let Some(dump) = &self.debug_dump {
            dump.save_gray(debug_dump::PLATE_BINARY, &binary)?;
        }
        let raw = self.engine.recognize(&binary)?;
        debug!("raw ocr output: {:?}", raw);
        Ok(utils::clean_plate_text(&raw))
    }
}
