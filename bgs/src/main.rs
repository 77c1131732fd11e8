use anyhow::Result;
use bgs_common::{ErrorReporting, ImagePool, LayoutMode, X11Display};
use bgs_config::{Config, Overrides};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bgs")]
#[command(about = "Sets the X11 root window background, one image per monitor")]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,

    /// Center images without scaling
    #[arg(short = 'c', long, overrides_with = "zoom")]
    center: bool,

    /// Crop images so they fill their monitor
    #[arg(short = 'z', long, overrides_with = "center")]
    zoom: bool,

    /// Fill colour for uncovered areas (#RRGGBB or an X11 colour name)
    #[arg(short = 'C', long, value_name = "COLOR")]
    color: Option<String>,

    /// Never rotate images to match the monitor orientation
    #[arg(short = 'R', long)]
    no_rotate: bool,

    /// Keep running and redraw when the screen geometry changes
    #[arg(short = 'x', long)]
    persistent: bool,

    /// Configuration file to use instead of the default one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Image files or directories
    #[arg(value_name = "IMAGE")]
    images: Vec<PathBuf>,
}

impl Cli {
    fn overrides(self) -> Overrides {
        let mode = if self.zoom {
            Some(LayoutMode::Zoom)
        } else if self.center {
            Some(LayoutMode::Center)
        } else {
            None
        };

        Overrides {
            mode,
            rotate: self.no_rotate.then_some(false),
            persistent: self.persistent.then_some(true),
            fill_color: self.color,
            images: self.images,
        }
    }
}

fn fatal(e: impl Into<bgs_common::BgsError>) -> anyhow::Error {
    let e = e.into();
    e.log_error("Fatal error");
    anyhow::anyhow!("{}", e.user_friendly_message())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).map_err(fatal)?;
    let settings = config.apply(cli.overrides());

    // Images first, so a bad invocation fails without touching the display
    let pool = ImagePool::load(&settings.images).map_err(fatal)?;

    let mut display = X11Display::connect(None).map_err(fatal)?;
    let fill = display.resolve_color(&settings.fill_color).map_err(fatal)?;

    bgs_common::run(&mut display, &pool, &settings.render_settings(fill), settings.run_mode)
        .map_err(fatal)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Overrides {
        Cli::try_parse_from(std::iter::once("bgs").chain(args.iter().copied()))
            .unwrap()
            .overrides()
    }

    #[test]
    fn test_no_flags_override_nothing() {
        assert_eq!(parse(&[]), Overrides::default());
    }

    #[test]
    fn test_flags_map_to_overrides() {
        let overrides = parse(&["-z", "-R", "-x", "-C", "#336699", "a.png", "walls"]);
        assert_eq!(overrides.mode, Some(LayoutMode::Zoom));
        assert_eq!(overrides.rotate, Some(false));
        assert_eq!(overrides.persistent, Some(true));
        assert_eq!(overrides.fill_color.as_deref(), Some("#336699"));
        assert_eq!(overrides.images, vec![PathBuf::from("a.png"), PathBuf::from("walls")]);
    }

    #[test]
    fn test_last_mode_flag_wins() {
        assert_eq!(parse(&["-z", "-c"]).mode, Some(LayoutMode::Center));
        assert_eq!(parse(&["-c", "-z"]).mode, Some(LayoutMode::Zoom));
    }

    #[test]
    fn test_fatal_errors_use_fixed_messages() {
        assert_eq!(fatal(bgs_common::BgsError::NoImages).to_string(), "No image to draw");
        let closed = fatal(bgs_common::error::DisplayError::Closed).to_string();
        assert!(!closed.contains('\n'), "{closed:?}");
    }

    #[test]
    fn test_version_flag_is_lowercase_v() {
        let err = Cli::try_parse_from(["bgs", "-v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
