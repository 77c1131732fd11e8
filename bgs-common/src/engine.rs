//! The reconfiguration loop: resolve geometry, compose, install, and in
//! persistent mode start over on every screen geometry change.

use crate::compositor::{self, RenderSettings};
use crate::display::{GeometrySource, Surface};
use crate::geometry::{MonitorSet, ScreenSize};
use crate::installer::{InstallOutcome, Installer};
use crate::pool::ImagePool;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Compose and install once, then return.
    #[default]
    Once,
    /// Keep recomposing on every geometry change until the connection ends.
    Persistent,
}

/// Geometry snapshot a pass works from. Replaced wholesale on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    pub screen: ScreenSize,
    pub monitors: MonitorSet,
}

impl EngineState {
    pub fn resolve<G: GeometrySource + ?Sized>(display: &G, screen: ScreenSize) -> Self {
        let monitors = MonitorSet::resolve(screen, display.output_rects());
        log::info!(
            "Screen {}x{} with {} monitors",
            screen.width,
            screen.height,
            monitors.len()
        );
        Self { screen, monitors }
    }
}

/// One compose + install pass. The canvas does not outlive the call.
pub fn render_pass<S: Surface + ?Sized>(
    state: &EngineState,
    pool: &ImagePool,
    settings: &RenderSettings,
    installer: &mut Installer,
    surface: &mut S,
) -> Result<InstallOutcome> {
    let canvas = compositor::compose(state.screen, &state.monitors, pool, settings)?;
    installer.install(surface, &canvas)
}

/// Runs the loop until it finishes (`Once`) or the display fails
/// (`Persistent`).
pub fn run<D>(display: &mut D, pool: &ImagePool, settings: &RenderSettings, mode: RunMode) -> Result<()>
where
    D: GeometrySource + Surface,
{
    let mut installer = Installer::new();
    let mut state = EngineState::resolve(&*display, display.screen_size());

    loop {
        render_pass(&state, pool, settings, &mut installer, display)?;
        if mode == RunMode::Once {
            return Ok(());
        }

        let screen = display.wait_for_geometry_change()?;
        log::info!("Screen geometry changed to {}x{}", screen.width, screen.height);
        state = EngineState::resolve(&*display, screen);
    }
}
