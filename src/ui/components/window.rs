// src/ui/components/window.rs
//! Plain window: a container that paints its background.

use embedded_graphics::draw_target::Clipped;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, StyledDrawable};

use crate::ui::core::{DrawContext, Widget, WidgetKind};
use crate::ui::styling::ColorPalette;

pub struct Window {
    background: Rgb565,
    border: Option<Rgb565>,
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}

impl Window {
    pub const KIND: WidgetKind = WidgetKind::window("window");

    pub fn new() -> Self {
        Self {
            background: ColorPalette::default().background,
            border: None,
        }
    }

    pub fn with_background(mut self, color: Rgb565) -> Self {
        self.background = color;
        self
    }

    /// Draw a one pixel frame inside the bounds
    pub fn with_border(mut self, color: Rgb565) -> Self {
        self.border = Some(color);
        self
    }

    pub fn background(&self) -> Rgb565 {
        self.background
    }

    pub fn set_background(&mut self, color: Rgb565) {
        self.background = color;
    }
}

impl<D> Widget<D> for Window
where
    D: DrawTarget<Color = Rgb565> + 'static,
{
    fn kind(&self) -> WidgetKind {
        Self::KIND
    }

    fn draw(&self, target: &mut Clipped<'_, D>, ctx: &DrawContext) -> Result<(), D::Error> {
        target.fill_solid(&ctx.bounds, self.background)?;
        if let Some(border) = self.border {
            ctx.bounds
                .draw_styled(&PrimitiveStyle::with_stroke(border, 1), target)?;
        }
        Ok(())
    }
}
