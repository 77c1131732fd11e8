//! Per-monitor placement of a source image.
//!
//! [`place`] is pure: given the source dimensions, the monitor and the mode it
//! decides whether the image is turned 90 degrees, which part of it is used
//! and where it lands on the virtual screen.

use crate::geometry::{AspectClass, MonitorRect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an image is fitted onto a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Unscaled, centred on the monitor. May overflow or leave borders.
    Center,
    /// Fills the monitor exactly, cropping the overflowing axis.
    Zoom,
    /// Largest size that fits entirely inside the monitor.
    #[default]
    Scale,
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutMode::Center => write!(f, "center"),
            LayoutMode::Zoom => write!(f, "zoom"),
            LayoutMode::Scale => write!(f, "scale"),
        }
    }
}

impl FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "center" => Ok(LayoutMode::Center),
            "zoom" => Ok(LayoutMode::Zoom),
            "scale" => Ok(LayoutMode::Scale),
            other => Err(format!("unknown layout mode: {}", other)),
        }
    }
}

/// Region of the (possibly rotated) source image that gets drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crop {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Crop {
    fn full(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }
}

/// Result of laying out one image on one monitor.
///
/// `crop` is in the coordinates of the image after rotation. The destination
/// is in virtual-screen coordinates and is not clipped to the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub rotated: bool,
    pub crop: Crop,
    pub dest_x: i32,
    pub dest_y: i32,
    pub dest_w: u32,
    pub dest_h: u32,
}

/// True iff rotation is allowed and the monitor and image aspect classes
/// strictly disagree. A square on either side never rotates.
pub fn should_rotate(width: u32, height: u32, monitor: &MonitorRect, rotate: bool) -> bool {
    rotate
        && matches!(
            (monitor.aspect(), AspectClass::of(width, height)),
            (AspectClass::Wide, AspectClass::Tall) | (AspectClass::Tall, AspectClass::Wide)
        )
}

/// Lays out a `width`x`height` image on `monitor`.
///
/// Both image dimensions must be positive; the image pool never hands out
/// anything else.
pub fn place(
    width: u32,
    height: u32,
    monitor: &MonitorRect,
    mode: LayoutMode,
    rotate: bool,
) -> Placement {
    debug_assert!(width > 0 && height > 0, "degenerate {}x{} image", width, height);

    let rotated = should_rotate(width, height, monitor, rotate);
    let (w, h) = if rotated { (height, width) } else { (width, height) };

    let (crop, dest_w, dest_h) = match mode {
        LayoutMode::Center => (Crop::full(w, h), w, h),
        LayoutMode::Scale => {
            let (dest_w, dest_h) = scale_to_fit(w, h, monitor.w, monitor.h);
            (Crop::full(w, h), dest_w, dest_h)
        }
        LayoutMode::Zoom => (zoom_crop(w, h, monitor.w, monitor.h), monitor.w, monitor.h),
    };

    Placement {
        rotated,
        crop,
        dest_x: centered(monitor.x, monitor.w, dest_w),
        dest_y: centered(monitor.y, monitor.h, dest_h),
        dest_w,
        dest_h,
    }
}

fn centered(origin: i32, extent: u32, size: u32) -> i32 {
    let offset = (i64::from(extent) - i64::from(size)) / 2;
    (i64::from(origin) + offset) as i32
}

// factor = max(w / mw, h / mh); dest = (w, h) / factor, in integers so the
// bound edge lands exactly on the monitor edge.
fn scale_to_fit(w: u32, h: u32, mw: u32, mh: u32) -> (u32, u32) {
    let (w64, h64, mw64, mh64) = (u64::from(w), u64::from(h), u64::from(mw), u64::from(mh));
    if w64 * mh64 >= h64 * mw64 {
        (mw, ((h64 * mw64) / w64).max(1) as u32)
    } else {
        (((w64 * mh64) / h64).max(1) as u32, mh)
    }
}

// Centred region of the image with the monitor's aspect ratio. The axis with
// the larger source/monitor ratio is the one that gets cut.
fn zoom_crop(w: u32, h: u32, mw: u32, mh: u32) -> Crop {
    let (w64, h64, mw64, mh64) = (u64::from(w), u64::from(h), u64::from(mw), u64::from(mh));
    if w64 * mh64 > h64 * mw64 {
        let crop_w = ((h64 * mw64) / mh64).clamp(1, w64) as u32;
        Crop { x: (w - crop_w) / 2, y: 0, w: crop_w, h }
    } else {
        let crop_h = ((w64 * mh64) / mw64).clamp(1, h64) as u32;
        Crop { x: 0, y: (h - crop_h) / 2, w, h: crop_h }
    }
}
