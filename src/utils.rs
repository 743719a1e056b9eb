use image::{ DynamicImage, GrayImage, ImageBuffer, Luma, imageops::{ self, FilterType } };
use imageproc::{ distance_transform::Norm, integral_image, morphology::{ self, Mask } };

use std::fs;
use std::io;
use std::path::Path;

#[cfg(feature = "display-window")]
use image::GenericImageView;

#[cfg(feature = "display-window")]
pub fn display_image(title: &str, image: &DynamicImage) {
    let (width, height) = image.dimensions();
    imageproc::window::display_image(title, &image.to_rgba8(), width, height);
}

/// (width, height) after scaling `dimensions` to `width`, aspect ratio kept.
/// Height is truncated but never drops below one pixel.
pub fn scaled_size(dimensions: (u32, u32), width: u32) -> (u32, u32) {
    let (w, h) = dimensions;
    if w == 0 {
        return (width, h);
    }
    let ratio = width as f64 / w as f64;
    let height = ((h as f64 * ratio) as u32).max(1);
    (width, height)
}

pub fn resize_keep_aspect(img: &DynamicImage, width: u32) -> DynamicImage {
    let (width, height) = scaled_size((img.width(), img.height()), width);
    img.resize_exact(width, height, FilterType::Triangle)
}

pub fn resize_gray_keep_aspect(img: &GrayImage, width: u32) -> GrayImage {
    let (width, height) = scaled_size(img.dimensions(), width);
    imageops::resize(img, width, height, FilterType::Triangle)
}

/// Binarize against the mean of the (2 * `block_radius` + 1) square block around
/// each pixel minus `offset`. Pixels strictly brighter than that go white.
/// The mean is rounded to the nearest integer before comparing. The block is
/// clipped at the image border.
pub fn adaptive_threshold_mean(image: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out: GrayImage = ImageBuffer::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }
    let integral = integral_image::integral_image::<_, u32>(image);

    for y in 0..height {
        let y_low = y.saturating_sub(block_radius);
        let y_high = (y + block_radius).min(height - 1);
        for x in 0..width {
            let x_low = x.saturating_sub(block_radius);
            let x_high = (x + block_radius).min(width - 1);

            let count = (y_high - y_low + 1) * (x_high - x_low + 1);
            let sum = integral_image::sum_image_pixels(&integral, x_low, y_low, x_high, y_high)[0];
            let mean = (sum as f64 / count as f64).round() as i32;

            let pixel = image.get_pixel(x, y)[0] as i32;
            if pixel > mean - offset {
                out.put_pixel(x, y, Luma([255]));
            }
        }
    }
    out
}

/// Dilate with a `radius` square structuring element, `iterations` times.
pub fn dilate_square(image: &GrayImage, radius: u8, iterations: u32) -> GrayImage {
    let mut out = image.clone();
    for _ in 0..iterations {
        morphology::dilate_mut(&mut out, Norm::LInf, radius);
    }
    out
}

/// Dilate once with a `size` x `size` all-ones kernel anchored at its center.
/// Even sizes anchor at the lower-right of the middle, so a 2x2 kernel grows
/// strokes right and down by one pixel.
pub fn dilate_with_kernel(image: &GrayImage, size: u8) -> GrayImage {
    let kernel: GrayImage = ImageBuffer::from_pixel(size as u32, size as u32, Luma([255]));
    let center = size / 2;
    let mask = Mask::from_image(&kernel, center, center);
    morphology::grayscale_dilate(image, &mask)
}

/// Keep alphanumerics only and upper-case them.
pub fn clean_plate_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// Create the directory `path` will be written into.
pub fn ensure_parent_dir(path: impl AsRef<Path>) -> io::Result<()> {
    match path.as_ref().parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}


#[cfg(test)]
mod test {

    use image::{ DynamicImage, GrayImage, ImageBuffer, Luma };

    use std::error::Error;

    use super::*;

    #[test]
    fn cleans_punctuation_whitespace_and_case() {
        assert_eq!(clean_plate_text("ab-12 cd!"), "AB12CD");
        assert_eq!(clean_plate_text("KA 05 MM 2341\n\x0c"), "KA05MM2341");
        assert_eq!(clean_plate_text(" .,-\n"), "");
    }

    #[test]
    fn scaled_size_keeps_aspect() {
        assert_eq!(scaled_size((1800, 1200), 900), (900, 600));
        assert_eq!(scaled_size((100, 25), 600), (600, 150));
        assert_eq!(scaled_size((3000, 1), 900), (900, 1));
    }

    #[test]
    fn resize_hits_target_width() {
        let img = DynamicImage::new_rgb8(450, 300);
        let resized = resize_keep_aspect(&img, 900);
        assert_eq!((resized.width(), resized.height()), (900, 600));

        let gray: GrayImage = ImageBuffer::new(120, 30);
        assert_eq!(resize_gray_keep_aspect(&gray, 600).dimensions(), (600, 150));
    }

    #[test]
    fn uniform_image_thresholds_to_white() {
        let img: GrayImage = ImageBuffer::from_pixel(40, 20, Luma([128]));
        let out = adaptive_threshold_mean(&img, 15, 5);
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn dark_stroke_on_bright_plate_thresholds_to_black() {
        let mut img: GrayImage = ImageBuffer::from_pixel(40, 40, Luma([220]));
        for y in 10..30 {
            img.put_pixel(20, y, Luma([30]));
        }
        let out = adaptive_threshold_mean(&img, 15, 5);
        assert_eq!(out.get_pixel(20, 20)[0], 0);
        assert_eq!(out.get_pixel(5, 5)[0], 255);
        assert_eq!(out.get_pixel(25, 20)[0], 255);
    }

    #[test]
    fn threshold_compares_against_rounded_mean() {
        // the block mean is 9.6, rounded to 10
        let mut img: GrayImage = ImageBuffer::from_pixel(5, 1, Luma([10]));
        img.put_pixel(0, 0, Luma([8]));
        let out = adaptive_threshold_mean(&img, 2, 0);
        assert_eq!(out.get_pixel(2, 0)[0], 0);
        assert_eq!(adaptive_threshold_mean(&img, 2, 1).get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn small_kernel_dilation_grows_a_pixel_to_a_block() {
        let mut img: GrayImage = ImageBuffer::new(10, 10);
        img.put_pixel(5, 5, Luma([255]));
        let out = dilate_with_kernel(&img, 2);
        assert_eq!(out.pixels().filter(|p| p[0] == 255).count(), 4);
        assert_eq!(out.get_pixel(5, 5)[0], 255);
    }

    #[test]
    fn square_dilation_accumulates_over_iterations() {
        let mut img: GrayImage = ImageBuffer::new(21, 21);
        img.put_pixel(10, 10, Luma([255]));
        let out = dilate_square(&img, 2, 2);
        assert_eq!(out.pixels().filter(|p| p[0] == 255).count(), 9 * 9);
        assert_eq!(out.get_pixel(6, 14)[0], 255);
        assert_eq!(out.get_pixel(5, 10)[0], 0);
    }

    #[test]
    fn parent_dir_is_created() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("outputs").join("nested").join("result.jpg");
        ensure_parent_dir(&target)?;
        assert!(target.parent().map(|p| p.is_dir()).unwrap_or(false));
        ensure_parent_dir("result.jpg")?;
        Ok(())
    }
}
