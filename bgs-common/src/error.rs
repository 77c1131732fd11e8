use std::path::PathBuf;
use thiserror::Error;

/// Main error type for bgs operations
#[derive(Error, Debug)]
pub enum BgsError {
    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No image to draw")]
    NoImages,

    #[error("Cannot allocate buffer of {width}x{height} pixels")]
    CanvasAllocation { width: u32, height: u32 },

    #[error("Cannot allocate color: {name}")]
    Color { name: String },
}

/// Display server errors
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("cannot open display: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),

    #[error("connection to the display server failed: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    #[error("display server request failed: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),

    #[error("display server request failed: {0}")]
    ReplyOrId(#[from] x11rb::errors::ReplyOrIdError),

    #[error("unsupported visual: {depth}-bit class {class}; expected 24/32-bit TrueColor")]
    UnsupportedVisual { depth: u8, class: u8 },

    #[error("unsupported pixel format: depth {depth} stored in {bits_per_pixel} bits per pixel; expected 32")]
    UnsupportedPixelFormat { depth: u8, bits_per_pixel: u8 },

    #[error("could not find root visual {0}")]
    MissingRootVisual(u32),

    #[error("canvas {width}x{height} does not fit the screen")]
    CanvasTooLarge { width: u32, height: u32 },

    #[error("could not intern atom {name}")]
    Atom { name: String },

    #[error("connection closed")]
    Closed,
}

/// Image loading errors
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Cannot load file {path:?}: {source}")]
    Load { path: PathBuf, source: image::ImageError },

    #[error("Image {path:?} has no pixels")]
    Empty { path: PathBuf },

    #[error("Failed to read directory: {path:?}")]
    DirectoryRead { path: PathBuf, source: walkdir::Error },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path:?}")]
    FileRead { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse TOML configuration: {message}")]
    TomlParse { message: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Could not determine config directory")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, BgsError>;

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlParse {
            message: err.to_string(),
        }
    }
}

// Error reporting utilities
pub trait ErrorReporting {
    fn log_error(&self, context: &str);
    fn user_friendly_message(&self) -> String;
}

impl ErrorReporting for BgsError {
    fn log_error(&self, context: &str) {
        log::error!("{}: {:?}", context, self);
    }

    fn user_friendly_message(&self) -> String {
        match self {
            BgsError::Display(DisplayError::Connect(_)) => "cannot open display".to_string(),
            BgsError::NoImages => "No image to draw".to_string(),
            BgsError::CanvasAllocation { .. } => "Cannot allocate buffer".to_string(),
            BgsError::Color { .. } => "Cannot allocate color".to_string(),
            BgsError::Config(ConfigError::FileRead { path, .. }) => {
                format!("Configuration file not readable: {:?}", path)
            }
            BgsError::Config(ConfigError::TomlParse { message }) => {
                format!("Invalid configuration format: {}", message.lines().next().unwrap_or(""))
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_fatal_messages_are_single_line() {
        let errors = [
            BgsError::NoImages,
            BgsError::CanvasAllocation { width: 1, height: 1 },
            BgsError::Color { name: "notacolor".to_string() },
            BgsError::Display(DisplayError::Closed),
        ];

        for error in errors {
            let message = error.user_friendly_message();
            assert!(!message.is_empty());
            assert!(!message.contains('\n'), "{message:?}");
        }
    }

    #[test]
    fn test_no_images_message() {
        assert_eq!(BgsError::NoImages.user_friendly_message(), "No image to draw");
    }

    #[test]
    fn test_color_message_hides_name() {
        let error = BgsError::Color { name: "chartreuse-ish".to_string() };
        assert_eq!(error.user_friendly_message(), "Cannot allocate color");
        assert!(error.to_string().contains("chartreuse-ish"));
    }

    #[test]
    fn test_config_error_user_friendly_message() {
        let error = ConfigError::FileRead {
            path: PathBuf::from("/nonexistent/config.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "File not found"),
        };
        let message = BgsError::Config(error).user_friendly_message();
        assert!(message.contains("Configuration file not readable"));
        assert!(message.contains("/nonexistent/config.toml"));
    }
}
