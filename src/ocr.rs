//! Text recognition on a binarized plate.
//!
//! `OcrEngine` is what the detector talks to. The Tesseract implementation is
//! behind the `tesseract` feature since it links against libtesseract and
//! libleptonica.

use image::GrayImage;
use serde::Deserialize;

use std::path::PathBuf;

use crate::error::PlateError;

#[cfg(feature = "tesseract")]
use image::{ DynamicImage, ImageFormat };
#[cfg(feature = "tesseract")]
use leptess::{ LepTess, Variable };
#[cfg(feature = "tesseract")]
use log::debug;
#[cfg(feature = "tesseract")]
use std::io::Cursor;
#[cfg(feature = "tesseract")]
use crate::error::PlateErrorKind;

/// Characters a plate may contain.
pub const PLATE_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Assume a single uniform block of text.
pub const PSM_SINGLE_BLOCK: u8 = 6;

pub trait OcrEngine {
    /// Raw engine output for `image`, before any cleaning.
    fn recognize(&mut self, image: &GrayImage) -> Result<String, PlateError>;
}

impl<E: OcrEngine + ?Sized> OcrEngine for Box<E> {
    fn recognize(&mut self, image: &GrayImage) -> Result<String, PlateError> {
        (**self).recognize(image)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OcrConfig {
    /// Directory holding `<lang>.traineddata`. `None` uses the install default.
    pub data_path: Option<PathBuf>,
    pub lang: String,
    pub page_seg_mode: u8,
    pub whitelist: String,
    /// DPI reported to the engine, unset images are treated as 70 DPI.
    pub source_resolution: Option<i32>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            lang: "eng".to_string(),
            page_seg_mode: PSM_SINGLE_BLOCK,
            whitelist: PLATE_WHITELIST.to_string(),
            source_resolution: Some(300),
        }
    }
}

/// Tesseract through leptess. The engine is initialized once with the default
/// OCR engine mode (LSTM when available, legacy otherwise) and reused for
/// every call.
#[cfg(feature = "tesseract")]
pub struct TesseractEngine {
    tess: LepTess,
    source_resolution: Option<i32>,
}

#[cfg(feature = "tesseract")]
impl TesseractEngine {

    pub fn new(config: &OcrConfig) -> Result<Self, PlateError> {
        let data_path = config.data_path.as_ref().map(|p| p.to_string_lossy().into_owned());
        let mut tess = LepTess::new(data_path.as_deref(), &config.lang)
            .map_err(|e| PlateErrorKind::OcrInitError(format!("{} (lang {}, data path {:?})", e, config.lang, data_path)))?;
        tess.set_variable(Variable::TesseditPagesegMode, &config.page_seg_mode.to_string())
            .map_err(|e| PlateErrorKind::OcrInitError(format!("page segmentation mode: {}", e)))?;
        tess.set_variable(Variable::TesseditCharWhitelist, &config.whitelist)
            .map_err(|e| PlateErrorKind::OcrInitError(format!("whitelist: {}", e)))?;
        debug!("tesseract ready: lang {}, psm {}, whitelist {}", config.lang, config.page_seg_mode, config.whitelist);
        Ok(Self { tess, source_resolution: config.source_resolution })
    }
}

#[cfg(feature = "tesseract")]
impl OcrEngine for TesseractEngine {

    fn recognize(&mut self, image: &GrayImage) -> Result<String, PlateError> {
        // leptonica only reads encoded images from memory
        let mut png = Vec::new();
        DynamicImage::ImageLuma8(image.clone()).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        self.tess.set_image_from_mem(&png)
            .map_err(|e| PlateErrorKind::OcrError(e.to_string()))?;
        if let Some(dpi) = self.source_resolution {
            self.tess.set_source_resolution(dpi);
        }
        let text = self.tess.get_utf8_text()
            .map_err(|e| PlateErrorKind::OcrError(e.to_string()))?;
        Ok(text)
    }
}


#[cfg(test)]
mod test {

    use image::{ GrayImage, ImageBuffer, Luma };

    use std::error::Error;

    use super::{ OcrConfig, OcrEngine, PLATE_WHITELIST };
    use crate::error::PlateError;

    struct Echo(&'static str);

    impl OcrEngine for Echo {
        fn recognize(&mut self, _image: &GrayImage) -> Result<String, PlateError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn default_config_restricts_to_plate_characters() {
        let config = OcrConfig::default();
        assert_eq!(config.lang, "eng");
        assert_eq!(config.page_seg_mode, 6);
        assert_eq!(config.whitelist, PLATE_WHITELIST);
        assert!(PLATE_WHITELIST.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert_eq!(PLATE_WHITELIST.len(), 36);
    }

    #[test]
    fn config_reads_data_path() -> Result<(), Box<dyn Error>> {
        let config: OcrConfig = toml::from_str("data_path = \"/usr/share/tessdata\"\nlang = \"deu\"\n")?;
        assert_eq!(config.data_path.as_deref(), Some(std::path::Path::new("/usr/share/tessdata")));
        assert_eq!(config.lang, "deu");
        assert_eq!(config.whitelist, PLATE_WHITELIST);
        Ok(())
    }

    #[test]
    fn boxed_engines_delegate() -> Result<(), Box<dyn Error>> {
        let mut engine: Box<dyn OcrEngine> = Box::new(Echo("KA05"));
        let img: GrayImage = ImageBuffer::from_pixel(4, 4, Luma([255]));
        assert_eq!(engine.recognize(&img)?, "KA05");
        Ok(())
    }

    #[cfg(feature = "tesseract")]
    #[test]
    #[ignore = "needs tesseract and eng.traineddata installed"]
    fn tesseract_reads_blank_plate_as_empty() -> Result<(), Box<dyn Error>> {
        let mut engine = super::TesseractEngine::new(&OcrConfig::default())?;
        let img: GrayImage = ImageBuffer::from_pixel(600, 150, Luma([255]));
        assert!(engine.recognize(&img)?.trim().is_empty());
        Ok(())
    }
}
