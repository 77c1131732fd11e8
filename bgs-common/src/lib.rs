pub mod color;
pub mod compositor;
pub mod display;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod installer;
pub mod layout;
pub mod pool;
pub mod x11;

pub use color::FillColor;
pub use compositor::{compose, parse_filter, Canvas, FilterType, RenderSettings};
pub use display::{GeometrySource, Marker, MarkerStore, PixmapId, Surface, Target};
pub use engine::{run, EngineState, RunMode};
pub use error::{BgsError, ErrorReporting, Result};
pub use geometry::{MonitorRect, MonitorSet, ScreenSize, MAX_MONITORS};
pub use installer::{InstallOutcome, Installer};
pub use layout::{place, LayoutMode, Placement};
pub use pool::{ImagePool, SourceImage};
pub use x11::X11Display;
