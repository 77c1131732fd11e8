//! Monitor geometry: the virtual screen and the ordered set of monitor
//! rectangles laid out on it.

/// Maximum number of monitors a composite pass covers. Rectangles reported
/// beyond this are dropped and counted in [`MonitorSet::discarded`].
pub const MAX_MONITORS: usize = 8;

/// Whether a rectangle is wider than tall, taller than wide, or square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectClass {
    Wide,
    Tall,
    Square,
}

impl AspectClass {
    pub fn of(width: u32, height: u32) -> Self {
        match width.cmp(&height) {
            std::cmp::Ordering::Greater => AspectClass::Wide,
            std::cmp::Ordering::Less => AspectClass::Tall,
            std::cmp::Ordering::Equal => AspectClass::Square,
        }
    }
}

/// Size of the virtual screen, i.e. the root window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One monitor in virtual-screen pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl MonitorRect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn aspect(&self) -> AspectClass {
        AspectClass::of(self.w, self.h)
    }
}

/// Ordered monitor rectangles from a single geometry resolution.
///
/// Never empty. Holds at most [`MAX_MONITORS`] entries; the order is the
/// order the display reported them in and drives image cycling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSet {
    rects: Vec<MonitorRect>,
    discarded: usize,
}

impl MonitorSet {
    /// Builds the set from the outputs the display reported.
    ///
    /// Zero-sized outputs are ignored. With no usable outputs the whole
    /// screen becomes a single monitor at the origin.
    pub fn resolve(screen: ScreenSize, outputs: Vec<MonitorRect>) -> Self {
        let mut rects: Vec<MonitorRect> = outputs
            .into_iter()
            .filter(|rect| rect.w > 0 && rect.h > 0)
            .collect();

        if rects.is_empty() {
            log::debug!(
                "No per-output geometry, using the whole {}x{} screen",
                screen.width,
                screen.height
            );
            return Self::single(screen);
        }

        let discarded = rects.len().saturating_sub(MAX_MONITORS);
        if discarded > 0 {
            log::warn!(
                "{} monitors reported, only the first {} are used ({} discarded)",
                rects.len(),
                MAX_MONITORS,
                discarded
            );
            rects.truncate(MAX_MONITORS);
        }

        Self { rects, discarded }
    }

    /// A single monitor covering the whole screen.
    pub fn single(screen: ScreenSize) -> Self {
        Self {
            rects: vec![MonitorRect::new(0, 0, screen.width, screen.height)],
            discarded: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Number of reported monitors dropped because of [`MAX_MONITORS`].
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MonitorRect> {
        self.rects.iter()
    }

    pub fn as_slice(&self) -> &[MonitorRect] {
        &self.rects
    }
}

impl<'a> IntoIterator for &'a MonitorSet {
    type Item = &'a MonitorRect;
    type IntoIter = std::slice::Iter<'a, MonitorRect>;

    fn into_iter(self) -> Self::IntoIter {
        self.rects.iter()
    }
}
