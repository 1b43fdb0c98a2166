// src/ui/router.rs
//! Input router: turns raw pointer and key samples into widget events.
//!
//! One pointer stream is tracked with a small state machine:
//!
//! ```text
//! Idle --pressed--> Pressed --pressed @ new pos--> Pressed (Move)
//!   ^                  |
//!   +----released------+ (Release, Click when still inside)
//! ```
//!
//! The widget hit by the initial press becomes the active widget and keeps
//! receiving the gesture until release, wherever the pointer goes.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::debug;

use crate::clip::ClipTracker;
use crate::ui::core::{KeyEvent, RawInput, TouchSample, WidgetEvent, WidgetId};
use crate::ui::tree::WidgetTree;

/// Pointer gesture state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchState {
    Idle,
    Pressed,
}

/// Routes raw input to widgets in a [`WidgetTree`].
#[derive(Debug, Clone)]
pub struct InputRouter {
    state: TouchState,
    previous: Option<TouchSample>,
    current: Option<TouchSample>,
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl InputRouter {
    pub const fn new() -> Self {
        Self {
            state: TouchState::Idle,
            previous: None,
            current: None,
        }
    }

    pub fn state(&self) -> TouchState {
        self.state
    }

    /// Most recent pointer sample
    pub fn current_sample(&self) -> Option<TouchSample> {
        self.current
    }

    /// Pointer sample before the most recent one
    pub fn previous_sample(&self) -> Option<TouchSample> {
        self.previous
    }

    /// Route one raw input. Returns the number of widget events delivered.
    ///
    /// `clip` is the hit-test tracker, independent of the drawing one.
    pub fn route<D>(
        &mut self,
        input: RawInput,
        tree: &mut WidgetTree<D>,
        clip: &mut ClipTracker,
    ) -> usize
    where
        D: DrawTarget<Color = Rgb565> + 'static,
    {
        match input {
            RawInput::Touch(sample) => self.route_touch(sample, tree, clip),
            RawInput::Key(key) => Self::route_key(key, tree),
        }
    }

    fn route_touch<D>(
        &mut self,
        sample: TouchSample,
        tree: &mut WidgetTree<D>,
        clip: &mut ClipTracker,
    ) -> usize
    where
        D: DrawTarget<Color = Rgb565> + 'static,
    {
        let last_point = self.current.map(|s| s.point);
        self.previous = self.current;
        self.current = Some(sample);

        match (self.state, sample.pressed) {
            (TouchState::Idle, true) => {
                self.state = TouchState::Pressed;
                self.press(sample.point, tree, clip)
            }
            (TouchState::Pressed, true) => {
                if last_point == Some(sample.point) {
                    return 0;
                }
                match tree.active() {
                    Some(active) => deliver(tree, active, sample.point, WidgetEvent::Move),
                    None => 0,
                }
            }
            (TouchState::Pressed, false) => {
                self.state = TouchState::Idle;
                self.release(sample.point, tree)
            }
            (TouchState::Idle, false) => 0,
        }
    }

    fn press<D>(&mut self, point: Point, tree: &mut WidgetTree<D>, clip: &mut ClipTracker) -> usize
    where
        D: DrawTarget<Color = Rgb565> + 'static,
    {
        let Some(hit) = tree.find_at(point, clip) else {
            debug!("Press at {:?} hit nothing", point);
            return 0;
        };

        tree.set_active(Some(hit));
        let mut delivered = deliver(tree, hit, point, WidgetEvent::Press);

        let focusable = tree.kind(hit).is_some_and(|k| k.focusable);
        if focusable && tree.focused() != Some(hit) {
            delivered += tree.set_focus(Some(hit)).unwrap_or(0);
        }
        delivered
    }

    fn release<D>(&mut self, point: Point, tree: &mut WidgetTree<D>) -> usize
    where
        D: DrawTarget<Color = Rgb565> + 'static,
    {
        let Some(active) = tree.active() else {
            return 0;
        };

        let mut delivered = deliver(tree, active, point, WidgetEvent::Release);
        let inside = tree
            .absolute_rect(active)
            .is_some_and(|bounds| bounds.contains(point));
        if inside {
            delivered += deliver(tree, active, point, WidgetEvent::Click);
        }

        tree.set_active(None);
        delivered
    }

    fn route_key<D>(key: KeyEvent, tree: &mut WidgetTree<D>) -> usize
    where
        D: DrawTarget<Color = Rgb565> + 'static,
    {
        match tree.focused() {
            Some(focused) if tree.accepts_input(focused) => {
                usize::from(tree.dispatch(focused, WidgetEvent::Key(key)).is_some())
            }
            Some(_) => {
                debug!("Key {:?} dropped, focused widget is hidden or disabled", key);
                0
            }
            None => {
                debug!("Key {:?} dropped, nothing focused", key);
                0
            }
        }
    }
}

/// Deliver a pointer event with `point` translated into widget coordinates
fn deliver<D>(
    tree: &mut WidgetTree<D>,
    id: WidgetId,
    point: Point,
    event: fn(Point) -> WidgetEvent,
) -> usize
where
    D: DrawTarget<Color = Rgb565> + 'static,
{
    let Some(bounds) = tree.absolute_rect(id) else {
        return 0;
    };
    let local = point - bounds.top_left;
    usize::from(tree.dispatch(id, event(local)).is_some())
}
