// src/ui/components/button.rs
//! Push button that raises a notification when clicked

use embedded_graphics::draw_target::Clipped;
use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_6X10};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, RoundedRectangle};
use embedded_graphics::text::{Alignment as TextAlignment, Baseline, Text, TextStyleBuilder};
use log::warn;

use crate::ui::core::{DrawContext, EventOutcome, Widget, WidgetEvent, WidgetKind};
use crate::ui::styling::{ColorPalette, darken};

/// Longest label kept, in bytes
pub const MAX_LABEL_LEN: usize = 32;

/// Key codes that activate a focused button
const ACTIVATE_KEYS: [u32; 2] = ['\r' as u32, ' ' as u32];

pub struct Button {
    label: heapless::String<MAX_LABEL_LEN>,
    code: u16,
    pressed: bool,
    focused: bool,
    palette: ColorPalette,
    border_radius: u32,
}

impl Button {
    pub const KIND: WidgetKind = WidgetKind::leaf("button").with_focusable(true);

    /// Button showing `label` that notifies `code` when clicked
    pub fn new(label: &str, code: u16) -> Self {
        let mut button = Self {
            label: heapless::String::new(),
            code,
            pressed: false,
            focused: false,
            palette: ColorPalette::default(),
            border_radius: 8,
        };
        button.set_label(label);
        button
    }

    pub fn with_palette(mut self, palette: ColorPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_border_radius(mut self, radius: u32) -> Self {
        self.border_radius = radius;
        self
    }

    /// Replace the label, truncating at a character boundary if too long
    pub fn set_label(&mut self, label: &str) {
        self.label.clear();
        for ch in label.chars() {
            if self.label.push(ch).is_err() {
                warn!("Button label truncated to {} bytes", MAX_LABEL_LEN);
                break;
            }
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    fn colors(&self, disabled: bool) -> (Rgb565, Rgb565) {
        if disabled {
            (self.palette.surface, self.palette.text_secondary)
        } else if self.pressed {
            (darken(self.palette.primary), self.palette.text_primary)
        } else {
            (self.palette.primary, self.palette.text_primary)
        }
    }
}

impl<D> Widget<D> for Button
where
    D: DrawTarget<Color = Rgb565> + 'static,
{
    fn kind(&self) -> WidgetKind {
        Self::KIND
    }

    fn draw(&self, target: &mut Clipped<'_, D>, ctx: &DrawContext) -> Result<(), D::Error> {
        let (background, foreground) = self.colors(ctx.disabled);

        // Repaint the corners the rounded shape leaves uncovered
        target.fill_solid(&ctx.bounds, self.palette.background)?;

        let mut style = PrimitiveStyleBuilder::new().fill_color(background);
        if self.focused {
            style = style.stroke_color(self.palette.focus).stroke_width(2);
        }
        let corner_radius = Size::new(self.border_radius, self.border_radius);
        RoundedRectangle::with_equal_corners(ctx.bounds, corner_radius)
            .into_styled(style.build())
            .draw(target)?;

        let text_style = MonoTextStyle::new(&FONT_6X10, foreground);
        let layout = TextStyleBuilder::new()
            .alignment(TextAlignment::Center)
            .baseline(Baseline::Middle)
            .build();
        Text::with_text_style(&self.label, ctx.bounds.center(), text_style, layout).draw(target)?;

        Ok(())
    }

    fn on_event(&mut self, event: WidgetEvent) -> EventOutcome {
        match event {
            WidgetEvent::Press(_) => {
                self.pressed = true;
                EventOutcome::Redraw
            }
            WidgetEvent::Release(_) => {
                self.pressed = false;
                EventOutcome::Redraw
            }
            WidgetEvent::Click(_) => EventOutcome::Notify(self.code),
            WidgetEvent::Focus => {
                self.focused = true;
                EventOutcome::Redraw
            }
            WidgetEvent::Blur => {
                self.focused = false;
                EventOutcome::Redraw
            }
            WidgetEvent::Key(key) if key.pressed && ACTIVATE_KEYS.contains(&key.code) => {
                EventOutcome::Notify(self.code)
            }
            WidgetEvent::Move(_) | WidgetEvent::Key(_) => EventOutcome::Ignored,
        }
    }
}
