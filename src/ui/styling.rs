// src/ui/styling.rs
//! Colors used by the reference widgets.
//!
//! All colors are RGB565. To convert from 8-bit RGB: R>>3, G>>2, B>>3

use embedded_graphics::pixelcolor::Rgb565;

/// Primary background color - very dark gray-blue
pub const COLOR_BACKGROUND: Rgb565 = Rgb565::new(18 >> 3, 23 >> 2, 24 >> 3);

/// Surface color - slightly lighter than background
pub const COLOR_SURFACE: Rgb565 = Rgb565::new(26 >> 3, 32 >> 2, 33 >> 3);

/// Border/stroke color - medium gray
pub const COLOR_STROKE: Rgb565 = Rgb565::new(43 >> 3, 55 >> 2, 57 >> 3);

/// Accent - bright teal-green
pub const COLOR_ACCENT: Rgb565 = Rgb565::new(95 >> 3, 185 >> 2, 141 >> 3);

/// Focus ring - warm orange
pub const COLOR_FOCUS: Rgb565 = Rgb565::new(200 >> 3, 145 >> 2, 85 >> 3);

pub const WHITE: Rgb565 = Rgb565::new(31, 63, 31);
pub const LIGHT_GRAY: Rgb565 = Rgb565::new(21, 42, 21);
pub const DARK_GRAY: Rgb565 = Rgb565::new(10, 20, 10);

/// Colors shared by a set of widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPalette {
    /// Interactive elements
    pub primary: Rgb565,
    pub background: Rgb565,
    /// Panels and disabled controls
    pub surface: Rgb565,
    pub text_primary: Rgb565,
    pub text_secondary: Rgb565,
    pub border: Rgb565,
    pub focus: Rgb565,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::dark()
    }
}

impl ColorPalette {
    /// Light text on dark backgrounds
    pub const fn dark() -> Self {
        Self {
            primary: COLOR_ACCENT,
            background: COLOR_BACKGROUND,
            surface: COLOR_SURFACE,
            text_primary: WHITE,
            text_secondary: LIGHT_GRAY,
            border: COLOR_STROKE,
            focus: COLOR_FOCUS,
        }
    }

    /// Dark text on light backgrounds
    pub const fn light() -> Self {
        Self {
            primary: COLOR_ACCENT,
            background: WHITE,
            surface: COLOR_SURFACE,
            text_primary: COLOR_BACKGROUND,
            text_secondary: DARK_GRAY,
            border: COLOR_STROKE,
            focus: COLOR_FOCUS,
        }
    }
}

/// Darken a color for a pressed state
pub fn darken(color: Rgb565) -> Rgb565 {
    use embedded_graphics::pixelcolor::RgbColor;

    Rgb565::new(
        color.r().saturating_sub(4),
        color.g().saturating_sub(8),
        color.b().saturating_sub(4),
    )
}
