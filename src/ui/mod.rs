// src/ui/mod.rs
//! Widget system
//!
//! - [`core`]: widget trait, descriptors and event types
//! - [`tree`]: widget hierarchy, hit-testing and redraw
//! - [`router`]: raw pointer/key input to widget events
//! - [`components`]: reference window and button widgets

pub mod components;
pub mod core;
pub mod router;
pub mod styling;
pub mod tree;

pub use components::{Button, Window};
pub use self::core::{
    DrawContext, EventOutcome, KeyEvent, Notification, RawInput, TouchSample, Widget, WidgetEvent,
    WidgetId, WidgetKind,
};
pub use router::{InputRouter, TouchState};
pub use styling::ColorPalette;
pub use tree::WidgetTree;
