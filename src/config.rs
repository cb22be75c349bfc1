use std::{
    ffi::OsStr,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use frosttip_core::delay_from_millis;
use iced::Color;
use knuffel::{
    ast::{Literal, TypeName},
    decode::Context,
    errors::DecodeError,
    span::Spanned,
    traits::ErrorSpan,
};
use tracing::{error, info};

use crate::{APP_NAMESPACE, utils::notification};

pub const DEFAULT_CONFIG: &str = include_str!("../assets/default-config.kdl");

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    #[error("error reading {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error creating {}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] knuffel::Error),
}

#[derive(knuffel::Decode, Debug, Default)]
pub struct Config {
    #[knuffel(child, default)]
    pub tooltip: Tooltip,
    #[knuffel(child, default)]
    pub style: Style,
    #[knuffel(child, default)]
    pub left: Section,
    #[knuffel(child, default)]
    pub center: Section,
    #[knuffel(child, default)]
    pub right: Section,
}

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct Tooltip {
    /// Hover delay in milliseconds before the overlay shows. Negative values
    /// clamp to zero; there is no error channel for configuration here.
    #[knuffel(child, unwrap(argument), default = 0)]
    pub delay: i64,
}

impl Default for Tooltip {
    fn default() -> Self {
        Self { delay: 0 }
    }
}

impl Tooltip {
    pub fn delay(&self) -> Duration {
        delay_from_millis(self.delay)
    }
}

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct Style {
    #[knuffel(child, unwrap(argument), default = Self::default().background)]
    pub background: ConfigColor,
    #[knuffel(child, unwrap(argument), default = Self::default().text_color)]
    pub text_color: ConfigColor,
    #[knuffel(child, unwrap(argument), default = Self::default().border_radius)]
    pub border_radius: f32,
    #[knuffel(child, unwrap(argument), default = Self::default().padding)]
    pub padding: f32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            background: ConfigColor(Color::from_rgba(0.0, 0.0, 0.0, 0.85)),
            text_color: ConfigColor(Color::WHITE),
            border_radius: 4.0,
            padding: 7.0,
        }
    }
}

/// One column of demo triggers on the playground page.
#[derive(knuffel::Decode, Debug, Default)]
pub struct Section {
    #[knuffel(children(name = "label"))]
    pub labels: Vec<Label>,
}

#[derive(knuffel::Decode, Debug, Clone)]
pub struct Label {
    #[knuffel(argument)]
    pub text: String,
    /// Tooltip content shown while hovering this label.
    #[knuffel(child, unwrap(argument))]
    pub tip: String,
    /// Per-label override of the global hover delay, in milliseconds.
    #[knuffel(child, unwrap(argument))]
    pub delay: Option<i64>,
}

#[profiling::all_functions]
impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Self::parse(
            path.file_name()
                .and_then(OsStr::to_str)
                .unwrap_or("config.kdl"),
            &contents,
        )
    }

    pub fn parse(filename: &str, text: &str) -> Result<Self, ConfigError> {
        let config = knuffel::parse::<Self>(filename, text)?;
        info!("successfully parsed config");
        Ok(config)
    }

    /// Writes the default config on first run; an existing file is left
    /// untouched.
    pub fn create(path: &Path) -> Result<(), ConfigError> {
        let template = |source| ConfigError::Create {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(template)?;
        }

        let mut new_file = match File::options()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
        {
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Ok(());
            }
            other => other.map_err(template)?,
        };

        info!("writing default config to {}", path.display());
        new_file
            .write_all(DEFAULT_CONFIG.as_bytes())
            .map_err(template)
    }

    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        Self::create(path)?;
        Self::load(path)
    }

    pub fn init(cli_path: Option<PathBuf>) -> (Self, PathBuf) {
        let path = cli_path.unwrap_or_else(Self::default_path);

        let config = match Self::load_or_create(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("failed to parse config file, using default config");
                error!("{:?}", miette::Report::new(e));
                notification(
                    "Failed to parse config file, using the default config\nrun `frosttip validate` to see the errors",
                );
                Self::parse("default-config.kdl", DEFAULT_CONFIG)
                    .unwrap_or_default()
            }
        };

        (config, path)
    }

    pub fn validate(cli_path: Option<PathBuf>) -> bool {
        let path = cli_path.unwrap_or_else(Self::default_path);
        match Self::load(&path) {
            Ok(_) => {
                println!("{} parsed successfully", path.display());
                true
            }
            Err(e) => {
                eprintln!("{:?}", miette::Report::new(e));
                false
            }
        }
    }

    fn default_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").expect("$HOME should be set");
                PathBuf::from(home).join(".config")
            });

        config_dir
            .join(APP_NAMESPACE.to_lowercase())
            .join("config.kdl")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigColor(pub Color);

impl From<ConfigColor> for Color {
    fn from(color: ConfigColor) -> Self {
        color.0
    }
}

impl<S> knuffel::DecodeScalar<S> for ConfigColor
where
    S: ErrorSpan,
{
    fn type_check(
        type_name: &Option<Spanned<TypeName, S>>,
        ctx: &mut Context<S>,
    ) {
        if let Some(type_name) = &type_name {
            ctx.emit_error(DecodeError::unexpected(
                type_name,
                "type name",
                "no type name expected for this node",
            ));
        }
    }

    fn raw_decode(
        value: &Spanned<Literal, S>,
        _ctx: &mut Context<S>,
    ) -> Result<Self, DecodeError<S>> {
        match **value {
            Literal::String(ref s) => {
                let color = Color::parse(s).ok_or_else(|| {
                    DecodeError::conversion(value, "invalid hex literal")
                })?;
                Ok(ConfigColor(color))
            }
            _ => Err(DecodeError::conversion(value, "invalid hex literal")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_asset_parses() {
        let config = Config::parse("default-config.kdl", DEFAULT_CONFIG)
            .expect("shipped default config must parse");

        assert_eq!(config.tooltip.delay, 150);
        assert!(!config.left.labels.is_empty());
        assert!(!config.center.labels.is_empty());
        assert!(!config.right.labels.is_empty());
    }

    #[test]
    fn negative_delay_clamps_to_zero() {
        let config = Config::parse("test.kdl", "tooltip { delay -250 }")
            .expect("negative delay is clamped, not rejected");

        assert_eq!(config.tooltip.delay(), Duration::ZERO);
    }

    #[test]
    fn per_label_delay_overrides_the_global_one() {
        let config = Config::parse(
            "test.kdl",
            r#"
            tooltip { delay 150 }
            center {
                label "Build" {
                    tip "Compile the project"
                    delay 400
                }
            }
            "#,
        )
        .expect("config must parse");

        assert_eq!(config.center.labels[0].delay, Some(400));
        assert_eq!(config.center.labels[0].tip, "Compile the project");
    }

    #[test]
    fn hex_colors_decode_with_and_without_alpha() {
        let config = Config::parse(
            "test.kdl",
            r##"
            style {
                background "#11aabb"
                text-color "#11aabbcc"
            }
            "##,
        )
        .expect("config must parse");

        let background: Color = config.style.background.into();
        assert_eq!((background.r * 255.0).round() as u8, 0x11);
        assert_eq!((background.g * 255.0).round() as u8, 0xaa);
        assert_eq!((background.b * 255.0).round() as u8, 0xbb);
        assert_eq!(background.a, 1.0);

        let text: Color = config.style.text_color.into();
        assert_eq!((text.a * 255.0).round() as u8, 0xcc);
    }

    #[test]
    fn invalid_color_literal_is_a_diagnostic() {
        let result =
            Config::parse("test.kdl", r##"style { background "cyanish" }"##);
        assert!(result.is_err());
    }
}
