// src/ui/core.rs
//! Core UI traits and types shared by the widget tree, the input router and
//! widget implementations.

use core::any::Any;

use embedded_graphics::draw_target::Clipped;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use slotmap::new_key_type;

new_key_type! {
    /// Generational handle to a widget in the tree.
    ///
    /// Handles of destroyed widgets never alias a later widget; using one
    /// reports [`GuiError::InvalidHandle`](crate::error::GuiError::InvalidHandle).
    pub struct WidgetId;
}

/// Capability descriptor shared by every instance of a widget kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetKind {
    /// Human readable kind name, used in logs
    pub name: &'static str,
    /// Whether instances may own children
    pub container: bool,
    /// Whether pressing an instance moves keyboard focus to it
    pub focusable: bool,
    /// Whether instances must be placed inside a window
    pub needs_window: bool,
}

impl WidgetKind {
    /// Descriptor for top-level or nested windows
    pub const fn window(name: &'static str) -> Self {
        Self {
            name,
            container: true,
            focusable: false,
            needs_window: false,
        }
    }

    /// Descriptor for a leaf widget that lives inside a window
    pub const fn leaf(name: &'static str) -> Self {
        Self {
            name,
            container: false,
            focusable: false,
            needs_window: true,
        }
    }

    pub const fn with_focusable(mut self, focusable: bool) -> Self {
        self.focusable = focusable;
        self
    }

    pub const fn with_container(mut self, container: bool) -> Self {
        self.container = container;
        self
    }
}

/// A key press or release routed to the focused widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Unicode scalar or host-defined key code
    pub code: u32,
    pub pressed: bool,
}

/// A raw pointer sample as produced by a touch controller or mouse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSample {
    /// Display coordinates
    pub point: Point,
    pub pressed: bool,
    /// Milliseconds since boot when the sample was taken
    pub timestamp_ms: u32,
}

impl TouchSample {
    pub fn new(point: Point, pressed: bool, timestamp_ms: u32) -> Self {
        Self {
            point,
            pressed,
            timestamp_ms,
        }
    }
}

/// Raw input queued by the host for the next process pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    Touch(TouchSample),
    Key(KeyEvent),
}

/// Events delivered to a widget.
///
/// Pointer positions are relative to the widget's absolute top-left corner
/// and may lie outside the widget while a drag is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    /// Pointer went down on this widget, which is now active
    Press(Point),
    /// Pointer moved while this widget is active
    Move(Point),
    /// Pointer went up, ending the gesture
    Release(Point),
    /// Pointer went up inside the widget that received the press
    Click(Point),
    /// Widget became the keyboard target
    Focus,
    /// Widget stopped being the keyboard target
    Blur,
    /// Key input while focused
    Key(KeyEvent),
}

/// How a widget responded to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Event was not relevant to this widget
    Ignored,
    /// Event was consumed without visual change
    Handled,
    /// Event changed the widget's appearance; schedule a redraw
    Redraw,
    /// Event produced a notification for the host application
    Notify(u16),
}

/// Widget state passed to [`Widget::draw`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawContext {
    pub id: WidgetId,
    /// Absolute bounds of the widget
    pub bounds: Rectangle,
    /// Part of the bounds that is visible and being redrawn
    pub visible: Rectangle,
    /// Widget is the active (pressed) widget
    pub active: bool,
    /// Widget has keyboard focus
    pub focused: bool,
    pub disabled: bool,
}

/// Behaviour of a concrete widget kind.
///
/// Drawing goes through a [`Clipped`] view of the display so a widget can
/// draw its full absolute bounds and only the visible part reaches the
/// driver.
pub trait Widget<D>: Any
where
    D: DrawTarget<Color = Rgb565> + 'static,
{
    /// Capability descriptor for this widget's kind
    fn kind(&self) -> WidgetKind;

    /// Draw the widget at `ctx.bounds`
    fn draw(&self, target: &mut Clipped<'_, D>, ctx: &DrawContext) -> Result<(), D::Error>;

    /// React to an input or focus event
    fn on_event(&mut self, _event: WidgetEvent) -> EventOutcome {
        EventOutcome::Ignored
    }
}

/// Notification raised by a widget for the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub source: WidgetId,
    pub code: u16,
}
