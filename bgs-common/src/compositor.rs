use image::imageops;
use image::RgbaImage;
use crate::color::FillColor;
use crate::error::BgsError;
use crate::geometry::{MonitorSet, ScreenSize};
use crate::layout::{self, LayoutMode, Placement};
use crate::pool::ImagePool;
use crate::Result;

pub use image::imageops::FilterType;

/// Everything about a composite pass that is fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub mode: LayoutMode,
    pub rotate: bool,
    pub fill: FillColor,
    pub filter: FilterType,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Scale,
            rotate: true,
            fill: FillColor::BLACK,
            filter: FilterType::Triangle,
        }
    }
}

/// Resampling filter by name, as written in the configuration file.
pub fn parse_filter(name: &str) -> Option<FilterType> {
    match name.to_ascii_lowercase().as_str() {
        "nearest" => Some(FilterType::Nearest),
        "triangle" => Some(FilterType::Triangle),
        "catmullrom" => Some(FilterType::CatmullRom),
        "gaussian" => Some(FilterType::Gaussian),
        "lanczos3" => Some(FilterType::Lanczos3),
        _ => None,
    }
}

/// The full virtual screen as one RGBA image. Built fresh for every pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Allocates a canvas of `size` filled with `fill`.
    pub fn filled(size: ScreenSize, fill: FillColor) -> Result<Self> {
        let alloc_error = || BgsError::CanvasAllocation {
            width: size.width,
            height: size.height,
        };

        let len = (size.width as usize)
            .checked_mul(size.height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .filter(|&len| len > 0)
            .ok_or_else(alloc_error)?;

        let mut buffer = Vec::new();
        buffer.try_reserve_exact(len).map_err(|_| alloc_error())?;
        let rgba = fill.to_rgba().0;
        buffer.extend(rgba.iter().copied().cycle().take(len));

        let image = RgbaImage::from_raw(size.width, size.height, buffer).ok_or_else(alloc_error)?;
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> ScreenSize {
        ScreenSize::new(self.width(), self.height())
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.image
    }
}

/// Composes one canvas for the whole screen.
///
/// Monitor `k` shows `pool.pick(k)`. Images are blended in monitor order, so
/// where destinations overlap the later monitor wins.
pub fn compose(
    screen: ScreenSize,
    monitors: &MonitorSet,
    pool: &ImagePool,
    settings: &RenderSettings,
) -> Result<Canvas> {
    let mut canvas = Canvas::filled(screen, settings.fill)?;
    log::info!(
        "Composing {}x{} background for {} monitors ({} mode)",
        screen.width,
        screen.height,
        monitors.len(),
        settings.mode
    );

    for (index, monitor) in monitors.iter().enumerate() {
        let source = pool.pick(index);
        let placement = layout::place(
            source.width(),
            source.height(),
            monitor,
            settings.mode,
            settings.rotate,
        );
        log::debug!(
            "Monitor {} {:?}: {:?} -> {:?}",
            index,
            monitor,
            source.path(),
            placement
        );

        let working = prepare(source.pixels(), &placement, settings.filter);
        imageops::overlay(
            &mut canvas.image,
            &working,
            i64::from(placement.dest_x),
            i64::from(placement.dest_y),
        );
    }

    Ok(canvas)
}

// Rotated, cropped and resampled copy of the source, ready to blend at the
// placement's destination.
fn prepare(source: &RgbaImage, placement: &Placement, filter: FilterType) -> RgbaImage {
    let mut working = if placement.rotated {
        imageops::rotate90(source)
    } else {
        source.clone()
    };

    let crop = placement.crop;
    if (crop.w, crop.h) != working.dimensions() {
        working = imageops::crop_imm(&working, crop.x, crop.y, crop.w, crop.h).to_image();
    }

    if (placement.dest_w, placement.dest_h) != working.dimensions() {
        working = imageops::resize(&working, placement.dest_w, placement.dest_h, filter);
    }

    working
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MonitorRect;
    use crate::pool::SourceImage;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const GREY: Rgba<u8> = Rgba([40, 40, 40, 255]);

    fn solid(name: &str, width: u32, height: u32, pixel: Rgba<u8>) -> SourceImage {
        SourceImage::new(name, RgbaImage::from_pixel(width, height, pixel))
    }

    fn settings(mode: LayoutMode, rotate: bool) -> RenderSettings {
        RenderSettings {
            mode,
            rotate,
            fill: FillColor::new(40, 40, 40),
            filter: FilterType::Nearest,
        }
    }

    #[test]
    fn test_canvas_is_filled() {
        let canvas = Canvas::filled(ScreenSize::new(3, 2), FillColor::new(1, 2, 3)).unwrap();
        assert!(canvas.pixels().pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
        assert_eq!(canvas.size(), ScreenSize::new(3, 2));
    }

    #[test]
    fn test_empty_canvas_is_an_allocation_error() {
        let result = Canvas::filled(ScreenSize::new(0, 1080), FillColor::BLACK);
        assert!(matches!(result, Err(BgsError::CanvasAllocation { width: 0, height: 1080 })));
    }

    #[test]
    fn test_center_leaves_fill_visible() {
        let screen = ScreenSize::new(10, 10);
        let monitors = MonitorSet::single(screen);
        let pool = ImagePool::from_images(vec![solid("red", 4, 2, RED)]).unwrap();

        let canvas = compose(screen, &monitors, &pool, &settings(LayoutMode::Center, false)).unwrap();
        assert_eq!(*canvas.pixels().get_pixel(0, 0), GREY);
        assert_eq!(*canvas.pixels().get_pixel(3, 4), RED);
        assert_eq!(*canvas.pixels().get_pixel(6, 5), RED);
        assert_eq!(*canvas.pixels().get_pixel(7, 5), GREY);
        assert_eq!(*canvas.pixels().get_pixel(3, 6), GREY);
    }

    #[test]
    fn test_scale_fills_one_axis() {
        let screen = ScreenSize::new(40, 20);
        let monitors = MonitorSet::single(screen);
        let pool = ImagePool::from_images(vec![solid("blue", 8, 8, BLUE)]).unwrap();

        let canvas = compose(screen, &monitors, &pool, &settings(LayoutMode::Scale, true)).unwrap();
        // 20x20 centred at x = 10
        assert_eq!(*canvas.pixels().get_pixel(9, 10), GREY);
        assert_eq!(*canvas.pixels().get_pixel(10, 0), BLUE);
        assert_eq!(*canvas.pixels().get_pixel(29, 19), BLUE);
        assert_eq!(*canvas.pixels().get_pixel(30, 10), GREY);
    }

    #[test]
    fn test_images_cycle_across_monitors() {
        let screen = ScreenSize::new(40, 10);
        let monitors = MonitorSet::resolve(
            screen,
            (0..4).map(|i| MonitorRect::new(i * 10, 0, 10, 10)).collect(),
        );
        let pool = ImagePool::from_images(vec![
            solid("red", 5, 5, RED),
            solid("green", 5, 5, GREEN),
        ])
        .unwrap();

        let canvas = compose(screen, &monitors, &pool, &settings(LayoutMode::Zoom, true)).unwrap();
        let colors: Vec<Rgba<u8>> = (0..4).map(|i| *canvas.pixels().get_pixel(i * 10 + 5, 5)).collect();
        assert_eq!(colors, vec![RED, GREEN, RED, GREEN]);
    }

    #[test]
    fn test_overlap_is_last_write_wins() {
        let screen = ScreenSize::new(20, 10);
        let monitors = MonitorSet::resolve(
            screen,
            vec![MonitorRect::new(0, 0, 10, 10), MonitorRect::new(5, 0, 10, 10)],
        );
        let pool = ImagePool::from_images(vec![
            solid("red", 10, 10, RED),
            solid("green", 10, 10, GREEN),
        ])
        .unwrap();

        let canvas = compose(screen, &monitors, &pool, &settings(LayoutMode::Zoom, true)).unwrap();
        assert_eq!(*canvas.pixels().get_pixel(2, 5), RED);
        assert_eq!(*canvas.pixels().get_pixel(7, 5), GREEN);
        assert_eq!(*canvas.pixels().get_pixel(17, 5), GREY);
    }

    #[test]
    fn test_transparent_pixels_show_fill() {
        let screen = ScreenSize::new(4, 4);
        let monitors = MonitorSet::single(screen);
        let pool = ImagePool::from_images(vec![solid("clear", 4, 4, Rgba([255, 255, 255, 0]))]).unwrap();

        let settings = RenderSettings {
            fill: FillColor::BLACK,
            ..settings(LayoutMode::Zoom, false)
        };

        let canvas = compose(screen, &monitors, &pool, &settings).unwrap();
        assert!(canvas.pixels().pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_portrait_monitor_rotates_landscape_image() {
        // Left half red, right half blue. Turned clockwise the red half ends
        // up on top.
        let mut pixels = RgbaImage::from_pixel(8, 4, BLUE);
        for y in 0..4 {
            for x in 0..4 {
                pixels.put_pixel(x, y, RED);
            }
        }
        let pool = ImagePool::from_images(vec![SourceImage::new("split", pixels)]).unwrap();

        let screen = ScreenSize::new(12, 8);
        let monitors = MonitorSet::resolve(
            screen,
            vec![MonitorRect::new(0, 0, 8, 4), MonitorRect::new(8, 0, 4, 8)],
        );

        let canvas = compose(screen, &monitors, &pool, &settings(LayoutMode::Scale, true)).unwrap();
        assert_eq!(*canvas.pixels().get_pixel(1, 1), RED);
        assert_eq!(*canvas.pixels().get_pixel(6, 1), BLUE);
        assert_eq!(*canvas.pixels().get_pixel(10, 1), RED);
        assert_eq!(*canvas.pixels().get_pixel(10, 6), BLUE);

        let unrotated = compose(screen, &monitors, &pool, &settings(LayoutMode::Scale, false)).unwrap();
        assert_ne!(canvas, unrotated);
    }

    #[test]
    fn test_compose_is_deterministic() {
        let screen = ScreenSize::new(64, 24);
        let monitors = MonitorSet::resolve(
            screen,
            vec![MonitorRect::new(0, 0, 40, 24), MonitorRect::new(40, 0, 24, 24)],
        );
        let mut gradient = RgbaImage::new(13, 7);
        for (x, y, pixel) in gradient.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 19) as u8, (y * 31) as u8, 128, 200]);
        }
        let pool = ImagePool::from_images(vec![SourceImage::new("gradient", gradient)]).unwrap();
        let settings = RenderSettings {
            filter: FilterType::Lanczos3,
            ..settings(LayoutMode::Zoom, true)
        };

        let first = compose(screen, &monitors, &pool, &settings).unwrap();
        let second = compose(screen, &monitors, &pool, &settings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter("Lanczos3"), Some(FilterType::Lanczos3));
        assert_eq!(parse_filter("catmullrom"), Some(FilterType::CatmullRom));
        assert_eq!(parse_filter("bicubic"), None);
    }
}
