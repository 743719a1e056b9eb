//! Writes the intermediate images of one detection run to a directory.
//!
//! Only used when explicitly requested (`--debug-dir`); the normal detector
//! output stays the crop and the text.

use image::{ DynamicImage, GrayImage };
use log::debug;

use std::fs;
use std::path::{ Path, PathBuf };

use crate::error::PlateError;
use crate::image_process::Preprocessed;

pub const GRAY: &str = "gray.png";
pub const EDGED: &str = "edged.png";
pub const DILATED: &str = "dilated.png";
pub const PLATE: &str = "plate.png";
pub const PLATE_BINARY: &str = "plate_binary.png";

pub struct DebugDump {
    dir: PathBuf,
}

impl DebugDump {

    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PlateError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_stages(&self, stages: &Preprocessed) -> Result<(), PlateError> {
        self.save_gray(GRAY, &stages.gray)?;
        self.save_gray(EDGED, &stages.edged)?;
        self.save_gray(DILATED, &stages.dilated)?;
        Ok(())
    }

    pub fn save_gray(&self, name: &str, img: &GrayImage) -> Result<PathBuf, PlateError> {
        let path = self.dir.join(name);
        img.save(&path)?;
        debug!("debug dump: wrote {}", path.display());
        Ok(path)
    }

    pub fn save_color(&self, name: &str, img: &DynamicImage) -> Result<PathBuf, PlateError> {
        let path = self.dir.join(name);
        img.save(&path)?;
        debug!("debug dump: wrote {}", path.display());
        Ok(path)
    }
}


#[cfg(test)]
mod test {

    use image::{ DynamicImage, GrayImage, ImageBuffer, Luma };

    use std::error::Error;

    use super::*;

    #[test]
    fn writes_every_stage() -> Result<(), Box<dyn Error>> {
        let root = tempfile::tempdir()?;
        let dump = DebugDump::new(root.path().join("debug"))?;
        let blank: GrayImage = ImageBuffer::from_pixel(8, 8, Luma([0]));
        let stages = Preprocessed { gray: blank.clone(), edged: blank.clone(), dilated: blank };
        dump.save_stages(&stages)?;
        for name in &[GRAY, EDGED, DILATED] {
            assert!(dump.dir().join(name).is_file(), "{} missing", name);
        }

        let plate = dump.save_color(PLATE, &DynamicImage::new_rgb8(20, 5))?;
        let reread = image::open(plate)?;
        assert_eq!((reread.width(), reread.height()), (20, 5));
        Ok(())
    }
}
