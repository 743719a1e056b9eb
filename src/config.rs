//! Tuning constants for the detector.
//!
//! Every threshold the pipeline uses lives here with its default value. A TOML
//! file may override any subset of them:
//!
//! ```toml
//! working_width = 1200
//!
//! [locator]
//! min_aspect = 2.5
//!
//! [ocr]
//! page_seg_mode = 7
//! ```

use serde::Deserialize;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ PlateError, PlateErrorKind };
use crate::ocr::OcrConfig;

const DEFAULT_WORKING_WIDTH: u32 = 900;
/// Highest page segmentation mode tesseract knows (raw line).
const MAX_PAGE_SEG_MODE: u8 = 13;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Width every input image is resized to before edge detection.
    pub working_width: u32,
    pub preprocess: PreprocessConfig,
    pub locator: LocatorConfig,
    pub ocr_input: OcrInputConfig,
    pub ocr: OcrConfig,
}

/// Edge map construction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessConfig {
    pub bilateral_window: u32,
    pub bilateral_sigma_color: f32,
    pub bilateral_sigma_space: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Radius of the square structuring element, 2 gives a 5x5 square.
    pub dilate_radius: u8,
    pub dilate_iterations: u32,
}

/// Plate shape profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocatorConfig {
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_ratio: f64,
    pub min_vertices: usize,
    pub max_vertices: usize,
    /// Exclusive bounds on bounding box width / height.
    pub min_aspect: f64,
    pub max_aspect: f64,
}

/// Binarization of the cropped plate before it is handed to the OCR engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OcrInputConfig {
    pub target_width: u32,
    pub blur_sigma: f32,
    /// Adaptive threshold window is `2 * radius + 1` pixels wide.
    pub threshold_block_radius: u32,
    pub threshold_offset: i32,
    pub dilate_kernel: u8,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            working_width: DEFAULT_WORKING_WIDTH,
            preprocess: PreprocessConfig::default(),
            locator: LocatorConfig::default(),
            ocr_input: OcrInputConfig::default(),
            ocr: OcrConfig::default(),
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            bilateral_window: 11,
            bilateral_sigma_color: 17.0,
            bilateral_sigma_space: 17.0,
            canny_low: 50.0,
            canny_high: 200.0,
            dilate_radius: 2,
            dilate_iterations: 2,
        }
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            approx_epsilon_ratio: 0.03,
            min_vertices: 4,
            max_vertices: 6,
            min_aspect: 2.0,
            max_aspect: 6.0,
        }
    }
}

impl Default for OcrInputConfig {
    fn default() -> Self {
        Self {
            target_width: 600,
            // matches a 3x3 gaussian kernel
            blur_sigma: 0.8,
            threshold_block_radius: 15,
            threshold_offset: 5,
            dilate_kernel: 2,
        }
    }
}

impl DetectorConfig {

    /// Read a TOML file; fields it does not name keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PlateError> {
        let raw = fs::read_to_string(path)?;
        raw.parse()
    }

    /// Reject values the image operations would panic on or tesseract refuses.
    pub fn validate(&self) -> Result<(), PlateError> {
        let pre = &self.preprocess;
        let loc = &self.locator;
        let input = &self.ocr_input;
        if self.working_width == 0 || input.target_width == 0 {
            return invalid("resize widths must be positive");
        }
        if pre.bilateral_window == 0 {
            return invalid("bilateral_window must be positive");
        }
        if pre.canny_low > pre.canny_high {
            return invalid("canny_low must not exceed canny_high");
        }
        if !(loc.approx_epsilon_ratio > 0.0) {
            return invalid("approx_epsilon_ratio must be positive");
        }
        if loc.min_vertices > loc.max_vertices {
            return invalid("min_vertices must not exceed max_vertices");
        }
        if loc.min_aspect >= loc.max_aspect {
            return invalid("min_aspect must be below max_aspect");
        }
        if !(input.blur_sigma > 0.0) {
            return invalid("blur_sigma must be positive");
        }
        if input.threshold_block_radius == 0 || input.dilate_kernel == 0 {
            return invalid("threshold_block_radius and dilate_kernel must be positive");
        }
        if self.ocr.page_seg_mode > MAX_PAGE_SEG_MODE {
            return invalid("page_seg_mode must be between 0 and 13");
        }
        if self.ocr.whitelist.is_empty() {
            return invalid("whitelist must not be empty");
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> Result<(), PlateError> {
    Err(PlateErrorKind::InvalidConfig(msg.to_string()).into())
}

impl FromStr for DetectorConfig {
    type Err = PlateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: DetectorConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
