//! Desktop simulator for the microgui widget core.
//!
//! Runs a small demo screen in an SDL2 window via
//! `embedded-graphics-simulator`. The GUI draws into a RAM framebuffer that
//! is flushed into the simulator display once per frame, the same way a
//! board would push it over SPI.
//!
//! # Key bindings
//!
//! | Key         | Action                            |
//! |-------------|-----------------------------------|
//! | Enter/Space | Activate the focused button       |
//! | Tab         | Move focus to the next button     |
//! | Q / Esc     | Quit                              |
//!
//! Mouse button and drag events are forwarded as touch samples.

use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window as SimWindow, sdl2::Keycode,
};
use log::{debug, error, info};

use microgui::ui::styling::{COLOR_ACCENT, DARK_GRAY};
use microgui::ui::{Button, Notification, Window};
use microgui::{FrameBuffer, Gui, GuiConfig, GuiResult, GuiShared, WidgetId, WidgetTree};

// ---------------------------------------------------------------------------
// Display constants
// ---------------------------------------------------------------------------

const DISPLAY_WIDTH_PX: u32 = 320;
const DISPLAY_HEIGHT_PX: u32 = 240;

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Indicator blink period.
const BLINK_PERIOD_MS: u32 = 500;

/// Link between the SDL event pump and the GUI loop.
static GUI_LINK: GuiShared = GuiShared::new();

// ---------------------------------------------------------------------------
// Demo screen
// ---------------------------------------------------------------------------

const CODE_DECREMENT: u16 = 1;
const CODE_INCREMENT: u16 = 2;
const CODE_RESET: u16 = 3;
const CODE_OPEN_POPUP: u16 = 4;
const CODE_CLOSE_POPUP: u16 = 5;

fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
    Rectangle::new(Point::new(x, y), Size::new(w, h))
}

/// Widgets and state of the demo screen.
struct Demo {
    counter: WidgetId,
    buttons: Vec<WidgetId>,
    popup: Option<WidgetId>,
    count: i32,
}

impl Demo {
    /// Build the main window: a panel with counter buttons, a popup
    /// launcher and a blinking indicator.
    fn build(gui: &mut Gui<'_, FrameBuffer>) -> GuiResult<Self> {
        let main = gui.create_widget(
            None,
            rect(0, 0, DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX),
            Window::new(),
        )?;

        let panel = gui.create_widget(
            Some(main),
            rect(10, 10, 300, 110),
            Window::new().with_border(DARK_GRAY),
        )?;
        let counter = gui.create_widget(Some(panel), rect(10, 10, 280, 36), Button::new("Count: 0", 0))?;
        gui.set_disabled(counter, true)?;

        let buttons = vec![
            gui.create_widget(Some(panel), rect(10, 60, 80, 36), Button::new("-", CODE_DECREMENT))?,
            gui.create_widget(Some(panel), rect(110, 60, 80, 36), Button::new("+", CODE_INCREMENT))?,
            gui.create_widget(Some(panel), rect(210, 60, 80, 36), Button::new("Reset", CODE_RESET))?,
            gui.create_widget(Some(main), rect(10, 140, 140, 36), Button::new("Popup", CODE_OPEN_POPUP))?,
        ];

        let indicator = gui.create_widget(
            Some(main),
            rect(280, 200, 20, 20),
            Window::new().with_background(DARK_GRAY),
        )?;
        let mut lit = false;
        gui.create_timer(
            BLINK_PERIOD_MS,
            false,
            move |_, _, tree: &mut WidgetTree<FrameBuffer>| {
                lit = !lit;
                if let Some(led) = tree.widget_mut::<Window>(indicator) {
                    led.set_background(if lit { COLOR_ACCENT } else { DARK_GRAY });
                }
                tree.invalidate(indicator).ok();
            },
        )?;

        Ok(Self {
            counter,
            buttons,
            popup: None,
            count: 0,
        })
    }

    fn on_notification(&mut self, gui: &mut Gui<'_, FrameBuffer>, note: Notification) -> GuiResult<()> {
        match note.code {
            CODE_DECREMENT => self.count -= 1,
            CODE_INCREMENT => self.count += 1,
            CODE_RESET => self.count = 0,
            CODE_OPEN_POPUP => return self.open_popup(gui),
            CODE_CLOSE_POPUP => {
                if let Some(popup) = self.popup.take() {
                    gui.destroy_widget(popup)?;
                }
                return Ok(());
            }
            other => {
                debug!("Unhandled notification {}", other);
                return Ok(());
            }
        }

        if let Some(label) = gui.widget_mut::<Button>(self.counter) {
            label.set_label(&format!("Count: {}", self.count));
        }
        gui.invalidate(self.counter)
    }

    fn open_popup(&mut self, gui: &mut Gui<'_, FrameBuffer>) -> GuiResult<()> {
        if let Some(popup) = self.popup {
            return gui.bring_to_front(popup);
        }

        let popup = gui.create_widget(
            None,
            rect(60, 70, 200, 100),
            Window::new().with_border(COLOR_ACCENT),
        )?;
        gui.create_widget(Some(popup), rect(50, 50, 100, 36), Button::new("Close", CODE_CLOSE_POPUP))?;
        self.popup = Some(popup);
        Ok(())
    }

    /// Focus the button after the focused one
    fn focus_next(&self, gui: &mut Gui<'_, FrameBuffer>) -> GuiResult<usize> {
        let next = match gui.focused_widget() {
            Some(current) => self
                .buttons
                .iter()
                .position(|&b| b == current)
                .map(|i| self.buttons[(i + 1) % self.buttons.len()]),
            None => None,
        };
        gui.set_focus(next.or(self.buttons.first().copied()))
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting microgui simulator");
    info!(
        "Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );
    info!("Keys: Enter/Space=Activate  Tab=Next  Q=Quit");

    let size = Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX);
    let mut gui = match Gui::new(&GUI_LINK, FrameBuffer::new(size), GuiConfig::default()) {
        Ok(gui) => gui,
        Err(e) => {
            error!("GUI init failed: {}", e);
            return;
        }
    };
    let mut demo = match Demo::build(&mut gui) {
        Ok(demo) => demo,
        Err(e) => {
            error!("Demo screen failed: {}", e);
            return;
        }
    };

    // SDL2 display and window
    let mut display = SimulatorDisplay::<Rgb565>::new(size);
    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = SimWindow::new("microgui Simulator", &output_settings);

    let start = Instant::now();
    let mut mouse_down = false;

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    let Ok(_) = gui.process();
    let Ok(()) = gui.display_mut().flush(&mut display);
    window.update(&display);

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = Instant::now();

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::Return => {
                        GUI_LINK.push_key('\r' as u32, true).ok();
                    }
                    Keycode::Space => {
                        GUI_LINK.push_key(' ' as u32, true).ok();
                    }
                    Keycode::Tab => {
                        if let Err(e) = demo.focus_next(&mut gui) {
                            error!("Focus change failed: {}", e);
                        }
                    }
                    _ => {}
                },

                SimulatorEvent::MouseButtonDown { point, .. } => {
                    mouse_down = true;
                    GUI_LINK.push_touch(point, true).ok();
                }
                SimulatorEvent::MouseMove { point } if mouse_down => {
                    GUI_LINK.push_touch(point, true).ok();
                }
                SimulatorEvent::MouseButtonUp { point, .. } => {
                    mouse_down = false;
                    GUI_LINK.push_touch(point, false).ok();
                }

                _ => {}
            }
        }

        // --- GUI pass -----------------------------------------------------
        GUI_LINK.update_time(start.elapsed().as_millis() as u32);
        let Ok(work) = gui.process();
        if work > 0 {
            debug!("Process pass did {} units of work", work);
        }

        while let Some(note) = gui.poll_notification() {
            if let Err(e) = demo.on_notification(&mut gui, note) {
                error!("Notification {} failed: {}", note.code, e);
            }
        }

        // --- Present ------------------------------------------------------
        let Ok(()) = gui.display_mut().flush(&mut display);
        window.update(&display);

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    let _ = gui.release();
    info!("Simulator exiting");
}
