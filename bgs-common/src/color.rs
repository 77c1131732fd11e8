use std::fmt;

/// Opaque colour painted wherever no image covers the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl FillColor {
    pub const BLACK: FillColor = FillColor { red: 0, green: 0, blue: 0 };

    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parses `#RRGGBB`, `RRGGBB` or `#RGB`. Anything else is left for the
    /// display server's colour database.
    pub fn parse_hex(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        match hex.len() {
            6 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
            }
            3 if trimmed.starts_with('#') => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Self::new(channel(0)?, channel(1)?, channel(2)?))
            }
            _ => None,
        }
    }

    /// Converts a 16-bit-per-channel X colour to 8 bits per channel.
    pub fn from_x11(red: u16, green: u16, blue: u16) -> Self {
        Self::new((red >> 8) as u8, (green >> 8) as u8, (blue >> 8) as u8)
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.red, self.green, self.blue, 255])
    }
}

impl fmt::Display for FillColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}
