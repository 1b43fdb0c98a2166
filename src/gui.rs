//! GUI root: the host link and the cooperative process loop.
//!
//! [`GuiShared`] is the only state touched outside the GUI loop. It is
//! `const`-constructible so a board can keep it in a `static` and feed it
//! from a tick interrupt and a touch controller task:
//!
//! ```ignore
//! static GUI_LINK: GuiShared = GuiShared::new();
//!
//! // SysTick / timer interrupt
//! GUI_LINK.update_time(now_ms);
//! // touch controller task
//! GUI_LINK.push_touch(point, pressed).ok();
//!
//! let mut gui = Gui::new(&GUI_LINK, display, GuiConfig::default())?;
//! loop {
//!     if gui.process()? == 0 {
//!         // idle, sleep until the next interrupt
//!     }
//! }
//! ```

use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, info, warn};

use crate::clip::ClipTracker;
use crate::config::GuiConfig;
use crate::error::{GuiError, GuiResult};
use crate::timer::{TimerCore, TimerId};
use crate::ui::core::{KeyEvent, Notification, RawInput, TouchSample, Widget, WidgetId};
use crate::ui::router::InputRouter;
use crate::ui::tree::WidgetTree;

/// Raw inputs buffered between two `process` calls
pub const INPUT_QUEUE_CAPACITY: usize = 16;

/// State shared between the host (interrupts, driver tasks) and the GUI loop
pub struct GuiShared {
    time: AtomicU32,
    layer: AtomicU8,
    input: Channel<CriticalSectionRawMutex, RawInput, INPUT_QUEUE_CAPACITY>,
}

impl Default for GuiShared {
    fn default() -> Self {
        Self::new()
    }
}

impl GuiShared {
    pub const fn new() -> Self {
        Self {
            time: AtomicU32::new(0),
            layer: AtomicU8::new(0),
            input: Channel::new(),
        }
    }

    /// Publish the current time in milliseconds since boot.
    ///
    /// The counter may wrap; only differences are used.
    pub fn update_time(&self, now_ms: u32) {
        self.time.store(now_ms, Ordering::Release);
    }

    pub fn time(&self) -> u32 {
        self.time.load(Ordering::Acquire)
    }

    /// Queue a raw input for the next `process` call
    pub fn push_input(&self, input: RawInput) -> GuiResult<()> {
        self.input.try_send(input).map_err(|_| {
            warn!("Input queue full, dropping {:?}", input);
            GuiError::InputQueueFull
        })
    }

    /// Queue a pointer sample stamped with the current time
    pub fn push_touch(&self, point: Point, pressed: bool) -> GuiResult<()> {
        self.push_input(RawInput::Touch(TouchSample::new(point, pressed, self.time())))
    }

    pub fn push_key(&self, code: u32, pressed: bool) -> GuiResult<()> {
        self.push_input(RawInput::Key(KeyEvent { code, pressed }))
    }

    /// Number of inputs waiting
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// Record which framebuffer layer the display controller is showing
    pub fn confirm_active_layer(&self, layer: u8) {
        self.layer.store(layer, Ordering::Release);
    }

    pub fn active_layer(&self) -> u8 {
        self.layer.load(Ordering::Acquire)
    }

    fn next_input(&self) -> Option<RawInput> {
        self.input.try_receive().ok()
    }
}

/// One GUI instance bound to a display.
pub struct Gui<'a, D>
where
    D: DrawTarget<Color = Rgb565> + 'static,
{
    shared: &'a GuiShared,
    display: D,
    tree: WidgetTree<D>,
    timers: TimerCore<WidgetTree<D>>,
    router: InputRouter,
    draw_clip: ClipTracker,
    touch_clip: ClipTracker,
    last_tick: u32,
    config: GuiConfig,
}

impl<'a, D> Gui<'a, D>
where
    D: DrawTarget<Color = Rgb565> + 'static,
{
    /// Bind a GUI to `display`.
    ///
    /// Fails with `DriverUnavailable` for a zero-sized display and with
    /// `InvalidConfig` when `config` does not validate.
    pub fn new(shared: &'a GuiShared, display: D, config: GuiConfig) -> GuiResult<Self> {
        config.validate()?;

        let bounds = display.bounding_box();
        if bounds.is_zero_sized() {
            return Err(GuiError::DriverUnavailable);
        }

        info!(
            "GUI initialized: {}x{} display, {} widgets, {} timers",
            bounds.size.width, bounds.size.height, config.max_widgets, config.max_timers
        );

        Ok(Self {
            shared,
            display,
            tree: WidgetTree::new(config.max_widgets as usize),
            timers: TimerCore::new(config.max_timers as usize),
            router: InputRouter::new(),
            draw_clip: ClipTracker::new(bounds),
            touch_clip: ClipTracker::new(bounds),
            last_tick: shared.time(),
            config,
        })
    }

    /// Run one pass: age timers, route queued input, redraw.
    ///
    /// Returns the amount of work done (timers fired, events delivered,
    /// widgets drawn); zero means the GUI is idle.
    pub fn process(&mut self) -> Result<u32, D::Error> {
        let now = self.shared.time();
        let elapsed = now.wrapping_sub(self.last_tick);
        self.last_tick = now;

        let mut work = self.timers.advance(elapsed, &mut self.tree);

        for _ in 0..self.config.input_budget {
            let Some(input) = self.shared.next_input() else {
                break;
            };
            if self.config.touch_enabled {
                work += self.router.route(input, &mut self.tree, &mut self.touch_clip);
            } else {
                debug!("Input disabled, discarding {:?}", input);
            }
        }

        work += self.tree.redraw(&mut self.display, &mut self.draw_clip)?;
        Ok(u32::try_from(work).unwrap_or(u32::MAX))
    }

    /// Tear down the GUI and hand the display back
    pub fn release(self) -> D {
        info!("GUI released with {} widgets", self.tree.len());
        self.display
    }

    // -----------------------------------------------------------------------
    // Widgets
    // -----------------------------------------------------------------------

    /// See [`WidgetTree::create`]
    pub fn create_widget<W>(
        &mut self,
        parent: Option<WidgetId>,
        rect: Rectangle,
        widget: W,
    ) -> GuiResult<WidgetId>
    where
        W: Widget<D>,
    {
        self.tree.create(parent, rect, widget)
    }

    pub fn destroy_widget(&mut self, id: WidgetId) -> GuiResult<usize> {
        self.tree.destroy(id)
    }

    pub fn set_rect(&mut self, id: WidgetId, rect: Rectangle) -> GuiResult<()> {
        self.tree.set_rect(id, rect)
    }

    pub fn show(&mut self, id: WidgetId) -> GuiResult<()> {
        self.tree.show(id)
    }

    pub fn hide(&mut self, id: WidgetId) -> GuiResult<()> {
        self.tree.hide(id)
    }

    pub fn set_disabled(&mut self, id: WidgetId, disabled: bool) -> GuiResult<()> {
        self.tree.set_disabled(id, disabled)
    }

    pub fn bring_to_front(&mut self, id: WidgetId) -> GuiResult<()> {
        self.tree.bring_to_front(id)
    }

    pub fn invalidate(&mut self, id: WidgetId) -> GuiResult<()> {
        self.tree.invalidate(id)
    }

    /// Redraw everything on the next `process`
    pub fn invalidate_all(&mut self) {
        self.tree.invalidate_all();
    }

    /// Colour shown where no top-level window covers the display
    pub fn set_background(&mut self, color: Rgb565) {
        self.tree.set_background(color);
    }

    /// Topmost visible, enabled widget at `point`
    pub fn find_at(&mut self, point: Point) -> Option<WidgetId> {
        self.tree.find_at(point, &mut self.touch_clip)
    }

    pub fn active_widget(&self) -> Option<WidgetId> {
        self.tree.active()
    }

    pub fn focused_widget(&self) -> Option<WidgetId> {
        self.tree.focused()
    }

    pub fn previous_focused_widget(&self) -> Option<WidgetId> {
        self.tree.previous_focused()
    }

    pub fn previous_active_widget(&self) -> Option<WidgetId> {
        self.tree.previous_active()
    }

    pub fn set_focus(&mut self, id: Option<WidgetId>) -> GuiResult<usize> {
        self.tree.set_focus(id)
    }

    pub fn widget<W: Widget<D>>(&self, id: WidgetId) -> Option<&W> {
        self.tree.widget(id)
    }

    pub fn widget_mut<W: Widget<D>>(&mut self, id: WidgetId) -> Option<&mut W> {
        self.tree.widget_mut(id)
    }

    /// Oldest widget notification (button click, ...) not yet handled
    pub fn poll_notification(&mut self) -> Option<Notification> {
        self.tree.poll_notification()
    }

    pub fn tree(&self) -> &WidgetTree<D> {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut WidgetTree<D> {
        &mut self.tree
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    /// Create a running timer whose callback may edit the widget tree
    pub fn create_timer<F>(&mut self, period_ms: u32, one_shot: bool, callback: F) -> GuiResult<TimerId>
    where
        F: FnMut(TimerId, &mut TimerCore<WidgetTree<D>>, &mut WidgetTree<D>) + 'static,
    {
        self.timers.create(period_ms, one_shot, callback)
    }

    pub fn cancel_timer(&mut self, id: TimerId) -> GuiResult<()> {
        self.timers.cancel(id)
    }

    pub fn timers(&self) -> &TimerCore<WidgetTree<D>> {
        &self.timers
    }

    /// Start, stop or reschedule timers
    pub fn timers_mut(&mut self) -> &mut TimerCore<WidgetTree<D>> {
        &mut self.timers
    }

    // -----------------------------------------------------------------------
    // Display
    // -----------------------------------------------------------------------

    /// Layer last confirmed through [`GuiShared::confirm_active_layer`]
    pub fn active_layer(&self) -> u8 {
        self.shared.active_layer()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Direct access to the display; call `invalidate_all` after drawing
    /// over widgets.
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn config(&self) -> &GuiConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;
    use crate::ui::components::{Button, Window};

    fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
        Rectangle::new(Point::new(x, y), Size::new(w, h))
    }

    fn display() -> FrameBuffer {
        FrameBuffer::new(Size::new(320, 240))
    }

    #[test]
    fn test_zero_sized_display_rejected() {
        let shared = GuiShared::new();
        let result = Gui::new(&shared, FrameBuffer::new(Size::zero()), GuiConfig::default());

        assert!(matches!(result, Err(GuiError::DriverUnavailable)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let shared = GuiShared::new();
        let config = GuiConfig::default().with_max_widgets(0);

        assert!(matches!(
            Gui::new(&shared, display(), config),
            Err(GuiError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_empty_gui_is_idle() {
        let shared = GuiShared::new();
        let mut gui = Gui::new(&shared, display(), GuiConfig::default()).unwrap();

        assert_eq!(gui.process(), Ok(0));
        shared.update_time(1_000);
        assert_eq!(gui.process(), Ok(0));
    }

    #[test]
    fn test_first_process_draws_then_idles() {
        let shared = GuiShared::new();
        let mut gui = Gui::new(&shared, display(), GuiConfig::default()).unwrap();
        gui.create_widget(None, rect(0, 0, 320, 240), Window::new()).unwrap();
        gui.create_widget(None, rect(10, 10, 100, 30), Button::new("OK", 1))
            .unwrap();

        assert_eq!(gui.process(), Ok(2));
        assert_eq!(gui.process(), Ok(0));
    }

    #[test]
    fn test_input_queue_overflow() {
        let shared = GuiShared::new();
        for _ in 0..INPUT_QUEUE_CAPACITY {
            shared.push_key(1, true).unwrap();
        }

        assert_eq!(shared.push_key(1, true), Err(GuiError::InputQueueFull));
        assert_eq!(shared.pending_input(), INPUT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_input_budget_limits_drain() {
        let shared = GuiShared::new();
        let config = GuiConfig::default().with_input_budget(2);
        let mut gui = Gui::new(&shared, display(), config).unwrap();
        for _ in 0..5 {
            shared.push_key(1, true).unwrap();
        }

        gui.process().unwrap();
        assert_eq!(shared.pending_input(), 3);
    }

    #[test]
    fn test_disabled_input_is_discarded() {
        let shared = GuiShared::new();
        let config = GuiConfig::default().with_touch_enabled(false);
        let mut gui = Gui::new(&shared, display(), config).unwrap();
        gui.create_widget(None, rect(0, 0, 320, 240), Window::new()).unwrap();
        let button = gui
            .create_widget(None, rect(10, 10, 100, 30), Button::new("OK", 1))
            .unwrap();
        gui.process().unwrap();

        shared.push_touch(Point::new(20, 20), true).unwrap();
        assert_eq!(gui.process(), Ok(0));
        assert_eq!(gui.active_widget(), None);
        assert!(!gui.widget::<Button>(button).unwrap().is_pressed());
        assert_eq!(shared.pending_input(), 0);
    }

    #[test]
    fn test_tick_wraps_around() {
        let shared = GuiShared::new();
        shared.update_time(u32::MAX - 49);
        let mut gui = Gui::new(&shared, display(), GuiConfig::default()).unwrap();
        let timer = gui.create_timer(100, false, |_, _, _| {}).unwrap();

        shared.update_time(49);
        assert_eq!(gui.process(), Ok(0));
        assert_eq!(gui.timers().remaining(timer), Some(1));

        shared.update_time(50);
        assert_eq!(gui.process(), Ok(1));
        assert_eq!(gui.timers().remaining(timer), Some(100));
    }

    #[test]
    fn test_layer_confirmation() {
        let shared = GuiShared::new();
        let gui = Gui::new(&shared, display(), GuiConfig::default()).unwrap();

        shared.confirm_active_layer(1);
        assert_eq!(gui.active_layer(), 1);
    }

    #[test]
    fn test_release_returns_display() {
        let shared = GuiShared::new();
        let mut gui = Gui::new(&shared, display(), GuiConfig::default()).unwrap();
        gui.create_widget(
            None,
            rect(0, 0, 320, 240),
            Window::new().with_background(Rgb565::RED),
        )
        .unwrap();
        gui.process().unwrap();

        let fb = gui.release();
        assert_eq!(fb.pixel(Point::new(100, 100)), Some(Rgb565::RED));
    }
}
