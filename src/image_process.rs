//! Edge map construction, plate localization and plate binarization.
//!
//! The locator is a greedy heuristic: contours are ranked by enclosed area and
//! the first one whose polygon approximation looks like a plate wins. There is
//! no scoring, so the ranking order is part of the behaviour.

use image::{ DynamicImage, GrayImage };
use imageproc::{ contours::{ self, Contour }, edges, filter, geometry, point::Point, rect::Rect };
use log::debug;

use std::cmp::Ordering;

use crate::config::{ LocatorConfig, OcrInputConfig, PreprocessConfig };
use crate::error::{ PlateError, PlateErrorKind };
use crate::utils;

/// Intermediate images of the edge pipeline, kept for debug dumps.
pub struct Preprocessed {
    /// Smoothed grayscale.
    pub gray: GrayImage,
    pub edged: GrayImage,
    pub dilated: GrayImage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlateCandidate {
    pub polygon: Vec<Point<i32>>,
    pub bounding_box: Rect,
}

/// grayscale -> bilateral filter -> canny -> square dilation
pub fn preprocess(img: &DynamicImage, config: &PreprocessConfig) -> Result<Preprocessed, PlateError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(PlateErrorKind::EmptyImage.into());
    }
    let gray = img.to_luma8();
    let gray = filter::bilateral_filter(&gray, config.bilateral_window,
        config.bilateral_sigma_color, config.bilateral_sigma_space);
    let edged = edges::canny(&gray, config.canny_low, config.canny_high);
    let dilated = utils::dilate_square(&edged, config.dilate_radius, config.dilate_iterations);
    Ok(Preprocessed { gray, edged, dilated })
}

/// Find the plate in a binary edge map.
/// Returns `None` when no contour matches the plate profile.
pub fn locate_plate(edge_map: &GrayImage, config: &LocatorConfig) -> Option<PlateCandidate> {
    let found: Vec<Contour<i32>> = contours::find_contours(edge_map);
    debug!("locator: {} contours", found.len());

    let mut ranked: Vec<(f64, Contour<i32>)> = found.into_iter().map(|contour| {
        (geometry::contour_area(&contour.points), contour)
    }).collect();
    // stable, so equal areas keep discovery order
    ranked.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    ranked.iter().enumerate().find_map(|(rank, (area, contour))| {
        let candidate = match_plate_profile(&contour.points, config)?;
        debug!("locator: accepted contour #{} (area {:.0}, {} vertices, box {:?})",
            rank, area, candidate.polygon.len(), candidate.bounding_box);
        Some(candidate)
    })
}

/// Check one contour against the plate profile: a closed polygon approximation
/// with an accepted vertex count and a bounding box aspect ratio strictly inside
/// `(min_aspect, max_aspect)`.
pub fn match_plate_profile(points: &[Point<i32>], config: &LocatorConfig) -> Option<PlateCandidate> {
    if points.len() < 3 {
        return None;
    }
    let perimeter = geometry::arc_length(points, true);
    let epsilon = config.approx_epsilon_ratio * perimeter;
    if !(epsilon > 0.0) {
        return None;
    }
    let polygon = geometry::approximate_polygon_dp(points, epsilon, true);
    if polygon.len() < config.min_vertices || polygon.len() > config.max_vertices {
        return None;
    }

    let bounding_box = bounding_rect(&polygon)?;
    let aspect = bounding_box.width() as f64 / bounding_box.height() as f64;
    if aspect > config.min_aspect && aspect < config.max_aspect {
        Some(PlateCandidate { polygon, bounding_box })
    } else {
        None
    }
}

/// Smallest axis-aligned rectangle containing every point, edges inclusive.
pub fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points.iter().skip(1) {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let width = (max_x - min_x + 1) as u32;
    let height = (max_y - min_y + 1) as u32;
    Some(Rect::at(min_x, min_y).of_size(width, height))
}

/// Crop `rect` out of `img`. The part of `rect` outside the image is dropped,
/// which may leave an empty image.
pub fn extract_plate(img: &DynamicImage, rect: &Rect) -> DynamicImage {
    let (img_w, img_h) = (img.width() as i64, img.height() as i64);
    let left = (rect.left() as i64).max(0).min(img_w);
    let top = (rect.top() as i64).max(0).min(img_h);
    let right = (rect.right() as i64 + 1).max(left).min(img_w);
    let bottom = (rect.bottom() as i64 + 1).max(top).min(img_h);
    img.crop_imm(left as u32, top as u32, (right - left) as u32, (bottom - top) as u32)
}

/// grayscale -> resize -> gaussian blur -> adaptive mean threshold -> dilation
///
/// The plate must not be empty.
pub fn prepare_for_ocr(plate: &DynamicImage, config: &OcrInputConfig) -> GrayImage {
    let gray = plate.to_luma8();
    let gray = utils::resize_gray_keep_aspect(&gray, config.target_width);
    let gray = filter::gaussian_blur_f32(&gray, config.blur_sigma);
    let binary = utils::adaptive_threshold_mean(&gray, config.threshold_block_radius, config.threshold_offset);
    utils::dilate_with_kernel(&binary, config.dilate_kernel)
}
