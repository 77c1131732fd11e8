//! Seams between the engine and the windowing system.
//!
//! [`crate::x11::X11Display`] implements all three traits against a live X
//! server; tests use the recording mock in this module.

use crate::compositor::Canvas;
use crate::error::DisplayError;
use crate::geometry::{MonitorRect, ScreenSize};

pub type PixmapId = u32;

/// Where a canvas gets drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Root,
    Pixmap(PixmapId),
}

/// Root window properties through which root-background tools hand the
/// background pixmap over to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    RootPmap,
    EsetrootPmap,
}

impl Marker {
    pub const ALL: [Marker; 2] = [Marker::RootPmap, Marker::EsetrootPmap];

    pub fn name(self) -> &'static str {
        match self {
            Marker::RootPmap => "_XROOTPMAP_ID",
            Marker::EsetrootPmap => "ESETROOT_PMAP_ID",
        }
    }
}

/// Source of screen and monitor geometry.
pub trait GeometrySource {
    /// Current size of the virtual screen.
    fn screen_size(&self) -> ScreenSize;

    /// Per-output rectangles, empty when the display has no such information.
    fn output_rects(&self) -> Vec<MonitorRect>;

    /// Blocks until the root window changes size and returns the new size.
    fn wait_for_geometry_change(&mut self) -> Result<ScreenSize, DisplayError>;
}

/// Prior-owner handoff of the root background.
pub trait MarkerStore {
    fn read_marker(&self, marker: Marker) -> Result<Option<PixmapId>, DisplayError>;
    fn write_marker(&mut self, marker: Marker, pixmap: PixmapId) -> Result<(), DisplayError>;

    /// Frees every resource of the client that owns `pixmap`.
    fn release_owner(&mut self, pixmap: PixmapId) -> Result<(), DisplayError>;
}

/// Drawing onto the root window and its backing pixmap.
pub trait Surface: MarkerStore {
    fn create_pixmap(&mut self, size: ScreenSize) -> Result<PixmapId, DisplayError>;
    fn draw(&mut self, target: Target, canvas: &Canvas) -> Result<(), DisplayError>;

    /// Makes `pixmap` the persistent background of the root window.
    fn set_background(&mut self, pixmap: PixmapId) -> Result<(), DisplayError>;
    fn free_pixmap(&mut self, pixmap: PixmapId) -> Result<(), DisplayError>;
    fn flush(&mut self) -> Result<(), DisplayError>;
}
