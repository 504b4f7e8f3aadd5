use crate::geometry::AspectRatio;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Error, Debug)]
pub enum BackgroundError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("No background image available")]
    Empty,
}

/// A decoded background image.
pub struct BackgroundImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl BackgroundImage {
    pub fn load(path: &Path) -> Result<Self, BackgroundError> {
        let rgba_image = image::open(path)?.to_rgba8();
        let width = rgba_image.width();
        let height = rgba_image.height();
        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            rgba: rgba_image.into_raw(),
        })
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        AspectRatio::from_extent(self.width as f64, self.height as f64)
    }
}

/// The images found in the background folder and the one currently shown.
#[derive(Debug, Default)]
pub struct BackgroundImages {
    images: Vec<PathBuf>,
    index: usize,
}

impl BackgroundImages {
    /// Collect the jpg/jpeg/png files of `dir`, sorted by path.
    pub fn scan(dir: &Path) -> Result<Self, BackgroundError> {
        let mut images = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)));
            if is_image && path.is_file() {
                images.push(path);
            }
        }
        images.sort();
        info!("Found {} background images in {:?}", images.len(), dir);
        Ok(Self { images, index: 0 })
    }

    pub fn current(&self) -> Option<&Path> {
        self.images.get(self.index).map(PathBuf::as_path)
    }

    /// Point at image `index`; an index past the end wraps to the first
    /// image. Returns the index actually selected.
    pub fn select(&mut self, index: usize) -> usize {
        self.index = if index < self.images.len() { index } else { 0 };
        self.index
    }

    /// Step to the following image, wrapping around.
    pub fn advance(&mut self) -> usize {
        self.select(self.index + 1)
    }

    /// Decode the current image.
    pub fn load_current(&self) -> Result<BackgroundImage, BackgroundError> {
        let path = self.current().ok_or(BackgroundError::Empty)?;
        BackgroundImage::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn setup_test_dir() -> PathBuf {
        let test_dir = std::env::temp_dir().join(format!("test_background_{}", Uuid::new_v4()));
        fs::create_dir_all(&test_dir).unwrap();
        test_dir
    }

    fn cleanup_test_dir(test_dir: &Path) {
        let _ = fs::remove_dir_all(test_dir);
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbaImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let test_dir = setup_test_dir();
        write_png(&test_dir.join("b.png"), 4, 2);
        write_png(&test_dir.join("a.PNG"), 2, 2);
        fs::write(test_dir.join("notes.txt"), "not an image").unwrap();

        let images = BackgroundImages::scan(&test_dir).unwrap();
        assert_eq!(images.current(), Some(test_dir.join("a.PNG").as_path()));
        let mut images = images;
        assert_eq!(images.advance(), 1);
        assert_eq!(images.current(), Some(test_dir.join("b.png").as_path()));
        assert_eq!(images.advance(), 0);

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_select_wraps_out_of_range() {
        let test_dir = setup_test_dir();
        write_png(&test_dir.join("one.png"), 2, 2);
        write_png(&test_dir.join("two.png"), 2, 2);

        let mut images = BackgroundImages::scan(&test_dir).unwrap();
        assert_eq!(images.select(1), 1);
        assert_eq!(images.advance(), 0);
        assert_eq!(images.select(42), 0);

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_load_reports_aspect_ratio() {
        let test_dir = setup_test_dir();
        write_png(&test_dir.join("wide.png"), 16, 9);

        let images = BackgroundImages::scan(&test_dir).unwrap();
        let image = images.load_current().unwrap();
        assert_eq!((image.width, image.height), (16, 9));
        assert_eq!(image.rgba.len(), 16 * 9 * 4);
        assert_eq!(image.aspect_ratio().value(), 16.0 / 9.0);

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_empty_folder() {
        let test_dir = setup_test_dir();
        let images = BackgroundImages::scan(&test_dir).unwrap();
        assert_eq!(images.current(), None);
        assert!(matches!(images.load_current(), Err(BackgroundError::Empty)));

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let missing = std::env::temp_dir().join(format!("missing_{}", Uuid::new_v4()));
        assert!(matches!(
            BackgroundImages::scan(&missing),
            Err(BackgroundError::Io(_))
        ));
    }
}
