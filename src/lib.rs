//! Hardware-independent GUI core for small displays.
//!
//! The crate keeps a tree of widgets, tracks which parts of the screen need
//! repainting, clips every draw to what is actually visible, routes touch
//! and key input to the right widget and runs millisecond software timers.
//! All of it is driven by one cooperative [`Gui::process`] call; the host
//! only publishes ticks and raw input through a [`GuiShared`].
//!
//! Drawing goes to any `embedded-graphics` `DrawTarget<Color = Rgb565>`.

#![no_std]

extern crate alloc;

pub mod clip;
pub mod config;
pub mod error;
pub mod framebuffer;
pub mod gui;
pub mod linked_list;
pub mod timer;
pub mod ui;

pub use clip::{ClipTracker, MAX_NESTING_DEPTH};
pub use config::GuiConfig;
pub use error::{GuiError, GuiResult};
pub use framebuffer::FrameBuffer;
pub use gui::{Gui, GuiShared, INPUT_QUEUE_CAPACITY};
pub use timer::{TimerCore, TimerId};
pub use ui::{EventOutcome, Notification, Widget, WidgetEvent, WidgetId, WidgetKind, WidgetTree};
