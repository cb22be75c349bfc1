use iced::{
    Background, Color, Theme, border,
    widget::container::{self, StyleFn},
};

use crate::config;

/// Overlay chrome from the configured style.
///
/// While the overlay is still measuring it has to be laid out without
/// flashing unplaced content, so everything draws fully transparent.
pub fn overlay_style(
    style: &config::Style,
    measuring: bool,
) -> StyleFn<'_, Theme> {
    if measuring {
        return Box::new(|_| container::Style {
            text_color: Some(Color::TRANSPARENT),
            ..Default::default()
        });
    }

    let appearance = container::Style {
        text_color: Some(style.text_color.into()),
        background: Some(Background::Color(style.background.into())),
        border: border::rounded(style.border_radius),
        ..Default::default()
    };
    Box::new(move |_| appearance)
}

/// The demo page's trigger chips.
pub fn chip(theme: &Theme) -> container::Style {
    let palette = theme.extended_palette();

    container::Style {
        background: Some(palette.background.weak.color.into()),
        border: border::rounded(4),
        ..Default::default()
    }
}
