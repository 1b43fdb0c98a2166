//! Clip region tracking for drawing and hit-testing.
//!
//! A [`ClipTracker`] holds the rectangle outside of which nothing may be drawn
//! (or touched) during a tree walk. Entering a widget pushes its rectangle,
//! narrowing the region; leaving it pops back to the parent's region. An
//! empty region (`None`) means the subtree is completely clipped away.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::Vec;

use crate::error::{GuiError, GuiResult};

/// Deepest supported widget nesting, and therefore clip stack depth.
pub const MAX_NESTING_DEPTH: usize = 8;

/// Exclusive bottom-right corner of a rectangle.
fn far_corner(rect: &Rectangle) -> Point {
    rect.top_left + Point::new(rect.size.width as i32, rect.size.height as i32)
}

/// Overlap of two rectangles, or `None` when they share no positive area.
///
/// Rectangles that only touch along an edge or corner do not overlap, and a
/// zero-sized rectangle never overlaps anything. The result is symmetric.
pub fn intersect(a: &Rectangle, b: &Rectangle) -> Option<Rectangle> {
    let a_end = far_corner(a);
    let b_end = far_corner(b);

    let x1 = a.top_left.x.max(b.top_left.x);
    let y1 = a.top_left.y.max(b.top_left.y);
    let x2 = a_end.x.min(b_end.x);
    let y2 = a_end.y.min(b_end.y);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(Rectangle::new(
        Point::new(x1, y1),
        Size::new((x2 - x1) as u32, (y2 - y1) as u32),
    ))
}

/// Whether two rectangles share a positive-area region
pub fn overlaps(a: &Rectangle, b: &Rectangle) -> bool {
    intersect(a, b).is_some()
}

/// Current clip region plus a stack of saved regions for nested walks.
#[derive(Debug, Clone)]
pub struct ClipTracker {
    display: Rectangle,
    current: Option<Rectangle>,
    stack: Vec<Option<Rectangle>, MAX_NESTING_DEPTH>,
}

impl ClipTracker {
    /// Create a tracker whose full region is the display bounds
    pub fn new(display: Rectangle) -> Self {
        Self {
            display,
            current: intersect(&display, &display),
            stack: Vec::new(),
        }
    }

    /// Full display bounds
    pub fn display(&self) -> Rectangle {
        self.display
    }

    /// Active region, or `None` if everything is clipped away
    pub fn current(&self) -> Option<Rectangle> {
        self.current
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Number of regions saved by [`push`](Self::push)
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Replace the active region with `rect` limited to the display.
    ///
    /// The saved stack is not touched.
    pub fn set(&mut self, rect: Rectangle) {
        self.current = intersect(&self.display, &rect);
    }

    /// Overlap of `rect` with the active region
    pub fn intersect(&self, rect: &Rectangle) -> Option<Rectangle> {
        self.current.and_then(|current| intersect(&current, rect))
    }

    /// Whether `point` lies inside the active region
    pub fn contains(&self, point: Point) -> bool {
        self.current.is_some_and(|current| current.contains(point))
    }

    /// Restore the full display region and drop every saved region
    pub fn reset(&mut self) {
        self.stack.clear();
        self.current = intersect(&self.display, &self.display);
    }

    /// Save the active region and narrow it to its overlap with `rect`.
    ///
    /// Returns the new active region. Every successful push must be paired
    /// with a [`pop`](Self::pop).
    pub fn push(&mut self, rect: Rectangle) -> GuiResult<Option<Rectangle>> {
        self.stack
            .push(self.current)
            .map_err(|_| GuiError::ClipStackOverflow)?;
        self.current = self.intersect(&rect);
        Ok(self.current)
    }

    /// Restore the region saved by the matching [`push`](Self::push).
    pub fn pop(&mut self) -> Option<Rectangle> {
        match self.stack.pop() {
            Some(saved) => self.current = saved,
            None => debug_assert!(false, "clip pop without matching push"),
        }
        self.current
    }
}
