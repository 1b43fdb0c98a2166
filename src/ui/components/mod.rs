// src/ui/components/mod.rs
//! Reference widgets

pub mod button;
pub mod window;

pub use button::Button;
pub use window::Window;
