//! X11 implementation of the display traits, on top of x11rb.

use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xinerama::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    AtomEnum, ChangeWindowAttributesAux, CloseDown, Colormap, ConnectionExt as _, CreateGCAux,
    EventMask, Format, Gcontext, ImageFormat, ImageOrder, Kill, PropMode, VisualClass, Window,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::color::FillColor;
use crate::compositor::Canvas;
use crate::display::{GeometrySource, Marker, MarkerStore, PixmapId, Surface, Target};
use crate::error::{BgsError, DisplayError};
use crate::geometry::{MonitorRect, ScreenSize};

// Fixed part of a PutImage request.
const PUT_IMAGE_HEADER: usize = 24;

/// Connection to an X server plus what we need to know about its root
/// window.
pub struct X11Display {
    conn: RustConnection,
    root: Window,
    depth: u8,
    colormap: Colormap,
    gc: Gcontext,
    screen: ScreenSize,
    rgb_shifts: (u32, u32, u32),
    byte_order: ImageOrder,
}

impl X11Display {
    /// Connects to `display_name` (or `$DISPLAY`) and subscribes to root
    /// window geometry changes.
    pub fn connect(display_name: Option<&str>) -> Result<Self, DisplayError> {
        let (conn, screen_num) = x11rb::connect(display_name)?;
        let setup = conn.setup();
        let screen = setup
            .roots
            .get(screen_num)
            .ok_or(DisplayError::Closed)?;

        let root = screen.root;
        let depth = screen.root_depth;
        let colormap = screen.default_colormap;
        let size = ScreenSize::new(screen.width_in_pixels.into(), screen.height_in_pixels.into());
        let byte_order = setup.image_byte_order;

        let visual = screen
            .allowed_depths
            .iter()
            .filter(|d| d.depth == depth)
            .flat_map(|d| d.visuals.iter())
            .find(|v| v.visual_id == screen.root_visual)
            .ok_or(DisplayError::MissingRootVisual(screen.root_visual))?;

        // Only 24 or 32-bit TrueColor
        if visual.class != VisualClass::TRUE_COLOR || (depth != 24 && depth != 32) {
            return Err(DisplayError::UnsupportedVisual {
                depth,
                class: u8::from(visual.class),
            });
        }
        check_pixmap_format(&setup.pixmap_formats, depth)?;
        let rgb_shifts = (
            visual.red_mask.trailing_zeros(),
            visual.green_mask.trailing_zeros(),
            visual.blue_mask.trailing_zeros(),
        );

        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY),
        )?
        .check()?;

        let gc = conn.generate_id()?;
        conn.create_gc(gc, root, &CreateGCAux::new())?;

        log::info!(
            "Connected to X screen {} ({}x{}, depth {})",
            screen_num,
            size.width,
            size.height,
            depth
        );

        Ok(Self {
            conn,
            root,
            depth,
            colormap,
            gc,
            screen: size,
            rgb_shifts,
            byte_order,
        })
    }

    /// Resolves a fill colour: hex literals locally, anything else through
    /// the server's colour database.
    pub fn resolve_color(&self, name: &str) -> crate::Result<FillColor> {
        if let Some(color) = FillColor::parse_hex(name) {
            return Ok(color);
        }

        let lookup = || -> Result<FillColor, DisplayError> {
            let reply = self
                .conn
                .lookup_color(self.colormap, name.trim().as_bytes())?
                .reply()?;
            Ok(FillColor::from_x11(reply.exact_red, reply.exact_green, reply.exact_blue))
        };

        lookup().map_err(|e| {
            log::debug!("LookupColor({:?}) failed: {}", name, e);
            BgsError::Color { name: name.to_string() }
        })
    }

    fn randr_monitors(&self) -> Result<Vec<MonitorRect>, DisplayError> {
        if self.conn.extension_information(randr::X11_EXTENSION_NAME)?.is_none() {
            return Ok(Vec::new());
        }

        let version = self.conn.randr_query_version(1, 5)?.reply()?;
        if (version.major_version, version.minor_version) < (1, 5) {
            return Ok(Vec::new());
        }

        let reply = self.conn.randr_get_monitors(self.root, true)?.reply()?;
        Ok(reply
            .monitors
            .iter()
            .map(|m| MonitorRect::new(m.x.into(), m.y.into(), m.width.into(), m.height.into()))
            .collect())
    }

    fn xinerama_screens(&self) -> Result<Vec<MonitorRect>, DisplayError> {
        if self.conn.extension_information(xinerama::X11_EXTENSION_NAME)?.is_none() {
            return Ok(Vec::new());
        }

        if self.conn.xinerama_is_active()?.reply()?.state == 0 {
            return Ok(Vec::new());
        }

        let reply = self.conn.xinerama_query_screens()?.reply()?;
        Ok(reply
            .screen_info
            .iter()
            .map(|s| MonitorRect::new(s.x_org.into(), s.y_org.into(), s.width.into(), s.height.into()))
            .collect())
    }

    fn intern(&self, marker: Marker, only_if_exists: bool) -> Result<Option<u32>, DisplayError> {
        let atom = self
            .conn
            .intern_atom(only_if_exists, marker.name().as_bytes())?
            .reply()?
            .atom;
        Ok((atom != x11rb::NONE).then_some(atom))
    }

    // Rows [y, y + rows) of the canvas as ZPixmap data in the server's
    // pixel layout.
    fn encode_rows(&self, canvas: &Canvas, y: u32, rows: u32) -> Vec<u8> {
        let (r_shift, g_shift, b_shift) = self.rgb_shifts;
        let width = canvas.width();
        let mut data = Vec::with_capacity(width as usize * rows as usize * 4);

        for row in y..y + rows {
            for x in 0..width {
                let [r, g, b, _] = canvas.pixels().get_pixel(x, row).0;
                let pixel = (u32::from(r) << r_shift) | (u32::from(g) << g_shift) | (u32::from(b) << b_shift);
                if self.byte_order == ImageOrder::LSB_FIRST {
                    data.extend_from_slice(&pixel.to_le_bytes());
                } else {
                    data.extend_from_slice(&pixel.to_be_bytes());
                }
            }
        }

        data
    }
}

// encode_rows writes one 32-bit word per pixel, so the server must store
// pixels of the root depth that way too.
fn check_pixmap_format(formats: &[Format], depth: u8) -> Result<(), DisplayError> {
    let bits_per_pixel = formats
        .iter()
        .find(|f| f.depth == depth)
        .map_or(0, |f| f.bits_per_pixel);

    if bits_per_pixel != 32 {
        return Err(DisplayError::UnsupportedPixelFormat { depth, bits_per_pixel });
    }
    Ok(())
}

impl Drop for X11Display {
    fn drop(&mut self) {
        let _ = self.conn.free_gc(self.gc);
        let _ = self.conn.flush();
    }
}

impl GeometrySource for X11Display {
    fn screen_size(&self) -> ScreenSize {
        self.screen
    }

    fn output_rects(&self) -> Vec<MonitorRect> {
        match self.randr_monitors() {
            Ok(rects) if !rects.is_empty() => return rects,
            Ok(_) => {}
            Err(e) => log::debug!("RandR monitor query failed: {}", e),
        }

        self.xinerama_screens().unwrap_or_else(|e| {
            log::debug!("Xinerama query failed: {}", e);
            Vec::new()
        })
    }

    fn wait_for_geometry_change(&mut self) -> Result<ScreenSize, DisplayError> {
        loop {
            match self.conn.wait_for_event()? {
                Event::ConfigureNotify(ev) if ev.window == self.root => {
                    self.screen = ScreenSize::new(ev.width.into(), ev.height.into());
                    return Ok(self.screen);
                }
                Event::Error(e) => log::debug!("Ignoring X error: {:?}", e),
                _ => {}
            }
        }
    }
}

impl MarkerStore for X11Display {
    fn read_marker(&self, marker: Marker) -> Result<Option<PixmapId>, DisplayError> {
        let Some(atom) = self.intern(marker, true)? else {
            return Ok(None);
        };

        let reply = self
            .conn
            .get_property(false, self.root, atom, AtomEnum::ANY, 0, 1)?
            .reply()?;
        if reply.type_ != u32::from(AtomEnum::PIXMAP) {
            return Ok(None);
        }

        Ok(reply
            .value32()
            .and_then(|mut values| values.next())
            .filter(|&id| id != 0))
    }

    fn write_marker(&mut self, marker: Marker, pixmap: PixmapId) -> Result<(), DisplayError> {
        let atom = self.intern(marker, false)?.ok_or_else(|| DisplayError::Atom {
            name: marker.name().to_string(),
        })?;

        self.conn
            .change_property32(PropMode::REPLACE, self.root, atom, AtomEnum::PIXMAP, &[pixmap])?
            .check()?;
        Ok(())
    }

    fn release_owner(&mut self, pixmap: PixmapId) -> Result<(), DisplayError> {
        // The owner may be long gone; a BadValue here is expected.
        self.conn.kill_client(pixmap)?.ignore_error();
        Ok(())
    }
}

impl Surface for X11Display {
    fn create_pixmap(&mut self, size: ScreenSize) -> Result<PixmapId, DisplayError> {
        let too_large = || DisplayError::CanvasTooLarge {
            width: size.width,
            height: size.height,
        };
        let width = u16::try_from(size.width).map_err(|_| too_large())?;
        let height = u16::try_from(size.height).map_err(|_| too_large())?;

        let pixmap = self.conn.generate_id()?;
        self.conn
            .create_pixmap(self.depth, pixmap, self.root, width, height)?
            .check()?;
        Ok(pixmap)
    }

    fn draw(&mut self, target: Target, canvas: &Canvas) -> Result<(), DisplayError> {
        let drawable = match target {
            Target::Root => self.root,
            Target::Pixmap(pixmap) => pixmap,
        };
        let too_large = || DisplayError::CanvasTooLarge {
            width: canvas.width(),
            height: canvas.height(),
        };
        let width = u16::try_from(canvas.width()).map_err(|_| too_large())?;
        i16::try_from(canvas.height()).map_err(|_| too_large())?;

        let row_bytes = usize::from(width) * 4;
        let max_rows = (self.conn.maximum_request_bytes().saturating_sub(PUT_IMAGE_HEADER) / row_bytes).max(1);

        let mut y = 0;
        while y < canvas.height() {
            let rows = (canvas.height() - y).min(max_rows as u32);
            let data = self.encode_rows(canvas, y, rows);
            self.conn.put_image(
                ImageFormat::Z_PIXMAP,
                drawable,
                self.gc,
                width,
                rows as u16,
                0,
                y as i16,
                0,
                self.depth,
                &data,
            )?;
            y += rows;
        }
        Ok(())
    }

    fn set_background(&mut self, pixmap: PixmapId) -> Result<(), DisplayError> {
        self.conn.kill_client(Kill::ALL_TEMPORARY)?;
        self.conn.set_close_down_mode(CloseDown::RETAIN_PERMANENT)?;
        self.conn
            .change_window_attributes(
                self.root,
                &ChangeWindowAttributesAux::new().background_pixmap(pixmap),
            )?
            .check()?;
        self.conn.clear_area(false, self.root, 0, 0, 0, 0)?;
        Ok(())
    }

    fn free_pixmap(&mut self, pixmap: PixmapId) -> Result<(), DisplayError> {
        self.conn.free_pixmap(pixmap)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.conn.flush()?;
        Ok(())
    }
}
