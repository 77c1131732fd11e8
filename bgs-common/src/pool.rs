use std::path::{Path, PathBuf};
use image::RgbaImage;
use walkdir::WalkDir;
use crate::error::{BgsError, ImageError};
use crate::geometry::MAX_MONITORS;
use crate::Result;

const SUPPORTED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// A decoded source image. Never mutated once loaded.
#[derive(Debug, Clone)]
pub struct SourceImage {
    path: PathBuf,
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(path: impl Into<PathBuf>, pixels: RgbaImage) -> Self {
        Self { path: path.into(), pixels }
    }

    pub fn open(path: &Path) -> std::result::Result<Self, ImageError> {
        let pixels = image::open(path)
            .map_err(|source| ImageError::Load {
                path: path.to_path_buf(),
                source,
            })?
            .into_rgba8();

        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(ImageError::Empty { path: path.to_path_buf() });
        }

        Ok(Self::new(path, pixels))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Images loaded once at startup and reused by every composite pass.
///
/// Always holds at least one image.
#[derive(Debug)]
pub struct ImagePool {
    images: Vec<SourceImage>,
}

impl ImagePool {
    /// Loads every path, expanding directories into the images they contain.
    ///
    /// A path that fails to load is logged and skipped. Only the first
    /// [`MAX_MONITORS`] images are kept since no pass can pick more.
    /// Returns [`BgsError::NoImages`] when nothing loaded.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let candidates = expand_paths(paths);
        let mut images = Vec::new();
        let mut ignored = 0;

        for path in &candidates {
            if images.len() == MAX_MONITORS {
                ignored += 1;
                continue;
            }
            match SourceImage::open(path) {
                Ok(image) => {
                    log::debug!("Loaded {:?} ({}x{})", path, image.width(), image.height());
                    images.push(image);
                }
                Err(e) => log::warn!("{}. Ignoring.", e),
            }
        }

        if ignored > 0 {
            log::info!("Ignoring {} images beyond the first {}", ignored, MAX_MONITORS);
        }

        Self::from_images(images)
    }

    /// Builds a pool from already decoded images, dropping empty ones.
    pub fn from_images(images: Vec<SourceImage>) -> Result<Self> {
        let images: Vec<SourceImage> = images
            .into_iter()
            .filter(|image| image.width() > 0 && image.height() > 0)
            .collect();

        if images.is_empty() {
            return Err(BgsError::NoImages);
        }

        log::info!("Loaded {} images", images.len());
        Ok(Self { images })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Image for monitor `index`, cycling through the pool.
    pub fn pick(&self, index: usize) -> &SourceImage {
        &self.images[index % self.images.len()]
    }
}

/// Expands directories to the supported image files below them, sorted.
/// Plain file paths are passed through untouched so that load errors are
/// reported against the name the user gave.
pub fn expand_paths<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut expanded = Vec::new();

    for path in paths.iter().map(AsRef::as_ref) {
        if !path.is_dir() {
            expanded.push(path.to_path_buf());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    log::warn!(
                        "{}",
                        ImageError::DirectoryRead {
                            path: path.to_path_buf(),
                            source,
                        }
                    );
                    continue;
                }
            };

            if entry.file_type().is_file() && is_supported(entry.path()) {
                found.push(entry.into_path());
            }
        }

        if found.is_empty() {
            log::warn!("No images found in directory: {:?}", path);
        }
        found.sort();
        expanded.extend(found);
    }

    expanded
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
            .save_with_format(path, image::ImageFormat::Png)
            .unwrap();
    }

    fn solid(width: u32, height: u32, value: u8) -> SourceImage {
        SourceImage::new(
            format!("solid-{value}"),
            RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255])),
        )
    }

    #[test]
    fn test_load_skips_failures() {
        let temp_dir = tempdir().unwrap();
        let good = temp_dir.path().join("good.png");
        write_png(&good, 4, 3);
        let garbage = temp_dir.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        let missing = temp_dir.path().join("missing.png");

        let pool = ImagePool::load(&[missing, garbage, good.clone()]).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.pick(0).path(), good.as_path());
        assert_eq!((pool.pick(0).width(), pool.pick(0).height()), (4, 3));
    }

    #[test]
    fn test_zero_images_is_fatal() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("missing.jpg");

        let result = ImagePool::load(&[missing]);
        assert!(matches!(result, Err(BgsError::NoImages)));

        let empty: [PathBuf; 0] = [];
        assert!(matches!(ImagePool::load(&empty), Err(BgsError::NoImages)));
    }

    #[test]
    fn test_pick_cycles() {
        let pool = ImagePool::from_images(vec![solid(2, 2, 1), solid(2, 2, 2), solid(2, 2, 3)]).unwrap();
        for k in 0..MAX_MONITORS {
            assert_eq!(pool.pick(k).path(), pool.pick(k + pool.len()).path());
        }
        assert_eq!(pool.pick(4).path(), Path::new("solid-2"));
    }

    #[test]
    fn test_directory_expansion_is_sorted_and_filtered() {
        let temp_dir = tempdir().unwrap();
        let nested = temp_dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        write_png(&temp_dir.path().join("b.png"), 1, 1);
        write_png(&nested.join("a.PNG"), 1, 1);
        std::fs::write(temp_dir.path().join("notes.txt"), b"hello").unwrap();

        let expanded = expand_paths(&[temp_dir.path()]);
        assert_eq!(expanded, vec![temp_dir.path().join("b.png"), nested.join("a.PNG")]);
    }

    #[test]
    fn test_load_caps_at_monitor_capacity() {
        let temp_dir = tempdir().unwrap();
        for i in 0..(MAX_MONITORS + 2) {
            write_png(&temp_dir.path().join(format!("{i:02}.png")), 1, 1);
        }

        let pool = ImagePool::load(&[temp_dir.path()]).unwrap();
        assert_eq!(pool.len(), MAX_MONITORS);
    }
}
