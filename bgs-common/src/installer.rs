use crate::compositor::Canvas;
use crate::display::{Marker, MarkerStore, PixmapId, Surface, Target};
use crate::error::DisplayError;
use crate::Result;

/// What a successful install left on the root window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallOutcome {
    pub pixmap: PixmapId,
    /// False when the handoff markers could not be published. The
    /// background itself is installed either way.
    pub markers_published: bool,
}

/// Pushes finished canvases to the root window.
///
/// Remembers the pixmap of the previous install so it can be freed once a
/// new one has replaced it.
#[derive(Debug, Default)]
pub struct Installer {
    current: Option<PixmapId>,
}

impl Installer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pixmap currently installed by this installer, if any.
    pub fn current(&self) -> Option<PixmapId> {
        self.current
    }

    pub fn install<S: Surface + ?Sized>(&mut self, surface: &mut S, canvas: &Canvas) -> Result<InstallOutcome> {
        let pixmap = surface.create_pixmap(canvas.size())?;
        let drawn = surface
            .draw(Target::Root, canvas)
            .and_then(|()| surface.draw(Target::Pixmap(pixmap), canvas));
        if let Err(e) = drawn {
            if let Err(free_err) = surface.free_pixmap(pixmap) {
                log::debug!("Could not free unused pixmap {:#x}: {}", pixmap, free_err);
            }
            return Err(e.into());
        }

        let markers_published = match hand_off(surface, pixmap, self.current) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not create atoms: {}", e);
                false
            }
        };

        surface.set_background(pixmap)?;
        if let Some(previous) = self.current.replace(pixmap) {
            log::debug!("Freeing previous background pixmap {:#x}", previous);
            surface.free_pixmap(previous)?;
        }
        surface.flush()?;

        log::info!("Installed {}x{} background", canvas.width(), canvas.height());
        Ok(InstallOutcome {
            pixmap,
            markers_published,
        })
    }
}

/// Takes the root background over from whoever published it last.
///
/// When both markers name the same pixmap, that pixmap belongs to a previous
/// root-background tool whose retained resources are released. Our own
/// previous pixmap is left to [`Installer::install`]. Both markers are then
/// rewritten to `pixmap`.
pub fn hand_off<S: MarkerStore + ?Sized>(
    store: &mut S,
    pixmap: PixmapId,
    own_previous: Option<PixmapId>,
) -> std::result::Result<(), DisplayError> {
    let prior = match (
        store.read_marker(Marker::RootPmap),
        store.read_marker(Marker::EsetrootPmap),
    ) {
        (Ok(Some(root)), Ok(Some(esetroot))) if root == esetroot => Some(root),
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("Could not read root pixmap markers: {}", e);
            None
        }
        _ => None,
    };

    if let Some(prior) = prior.filter(|&p| Some(p) != own_previous && p != pixmap) {
        log::debug!("Releasing previous background owner of pixmap {:#x}", prior);
        if let Err(e) = store.release_owner(prior) {
            log::warn!("Could not release previous background pixmap {:#x}: {}", prior, e);
        }
    }

    for marker in Marker::ALL {
        store.write_marker(marker, pixmap)?;
    }
    Ok(())
}
