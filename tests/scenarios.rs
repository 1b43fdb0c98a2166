//! End-to-end runs of the process loop against a RAM framebuffer.

use std::cell::Cell;
use std::rc::Rc;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use microgui::ui::{Button, Window};
use microgui::{FrameBuffer, Gui, GuiConfig, GuiError, GuiShared, WidgetTree};

fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
    Rectangle::new(Point::new(x, y), Size::new(w, h))
}

fn new_gui(shared: &GuiShared) -> Gui<'_, FrameBuffer> {
    Gui::new(shared, FrameBuffer::new(Size::new(320, 240)), GuiConfig::default())
        .expect("gui init")
}

#[test]
fn button_keeps_gesture_while_dragged_away() {
    let shared = GuiShared::new();
    let mut gui = new_gui(&shared);
    let window = gui.create_widget(None, rect(0, 0, 320, 240), Window::new()).unwrap();
    let button = gui
        .create_widget(None, rect(10, 10, 100, 30), Button::new("Go", 5))
        .unwrap();
    gui.process().unwrap();

    shared.push_touch(Point::new(15, 15), true).unwrap();
    gui.process().unwrap();
    assert_eq!(gui.active_widget(), Some(button));
    assert_eq!(gui.focused_widget(), Some(button));
    assert!(gui.widget::<Button>(button).unwrap().is_pressed());

    shared.push_touch(Point::new(200, 200), true).unwrap();
    gui.process().unwrap();
    assert_eq!(gui.active_widget(), Some(button));
    assert_eq!(gui.find_at(Point::new(200, 200)), Some(window));

    shared.push_touch(Point::new(200, 200), false).unwrap();
    gui.process().unwrap();
    assert_eq!(gui.active_widget(), None);
    assert!(!gui.widget::<Button>(button).unwrap().is_pressed());
    // Released outside the button: no click
    assert_eq!(gui.poll_notification(), None);
}

#[test]
fn button_click_reaches_host() {
    let shared = GuiShared::new();
    let mut gui = new_gui(&shared);
    gui.create_widget(None, rect(0, 0, 320, 240), Window::new()).unwrap();
    let button = gui
        .create_widget(None, rect(10, 10, 100, 30), Button::new("Go", 5))
        .unwrap();
    gui.process().unwrap();

    shared.push_touch(Point::new(50, 20), true).unwrap();
    shared.push_touch(Point::new(50, 20), false).unwrap();
    // Press, focus, release, click and the button redraw
    assert_eq!(gui.process(), Ok(5));

    let note = gui.poll_notification().unwrap();
    assert_eq!((note.source, note.code), (button, 5));
}

#[test]
fn periodic_timer_fires_per_elapsed_period() {
    let shared = GuiShared::new();
    let mut gui = new_gui(&shared);
    let count = Rc::new(Cell::new(0));
    let counter = count.clone();
    let timer = gui
        .create_timer(100, false, move |_, _, _| counter.set(counter.get() + 1))
        .unwrap();

    shared.update_time(250);
    assert_eq!(gui.process(), Ok(2));
    assert_eq!(count.get(), 2);
    assert_eq!(gui.timers().remaining(timer), Some(50));

    shared.update_time(300);
    assert_eq!(gui.process(), Ok(1));
    assert_eq!(gui.timers().remaining(timer), Some(100));
}

#[test]
fn timer_callback_edits_widgets() {
    let shared = GuiShared::new();
    let mut gui = new_gui(&shared);
    gui.create_widget(None, rect(0, 0, 320, 240), Window::new()).unwrap();
    let button = gui
        .create_widget(None, rect(10, 10, 100, 30), Button::new("0", 1))
        .unwrap();
    gui.process().unwrap();

    gui.create_timer(
        500,
        true,
        move |_, _, tree: &mut WidgetTree<FrameBuffer>| {
            if let Some(b) = tree.widget_mut::<Button>(button) {
                b.set_label("1");
            }
            tree.invalidate(button).ok();
        },
    )
    .unwrap();

    shared.update_time(499);
    assert_eq!(gui.process(), Ok(0));

    shared.update_time(500);
    // One firing plus one redraw
    assert_eq!(gui.process(), Ok(2));
    assert_eq!(gui.widget::<Button>(button).unwrap().label(), "1");
    assert!(gui.timers().is_empty());
}

#[test]
fn destroying_pressed_widget_ends_gesture_quietly() {
    let shared = GuiShared::new();
    let mut gui = new_gui(&shared);
    gui.create_widget(None, rect(0, 0, 320, 240), Window::new()).unwrap();
    let button = gui
        .create_widget(None, rect(10, 10, 100, 30), Button::new("X", 1))
        .unwrap();
    gui.process().unwrap();

    shared.push_touch(Point::new(15, 15), true).unwrap();
    gui.process().unwrap();
    assert_eq!(gui.active_widget(), Some(button));

    assert_eq!(gui.destroy_widget(button), Ok(1));
    assert_eq!(gui.active_widget(), None);
    assert_eq!(gui.focused_widget(), None);
    assert_eq!(gui.destroy_widget(button), Err(GuiError::InvalidHandle));

    shared.push_touch(Point::new(15, 15), false).unwrap();
    gui.process().unwrap();
    assert_eq!(gui.poll_notification(), None);
}

#[test]
fn idle_gui_does_no_work() {
    let shared = GuiShared::new();
    let mut gui = new_gui(&shared);
    gui.create_widget(None, rect(0, 0, 320, 240), Window::new()).unwrap();
    gui.process().unwrap();

    shared.update_time(10_000);
    assert_eq!(gui.process(), Ok(0));
}

#[test]
fn moving_window_repaints_uncovered_area() {
    let shared = GuiShared::new();
    let mut gui = new_gui(&shared);
    gui.create_widget(
        None,
        rect(0, 0, 320, 240),
        Window::new().with_background(Rgb565::BLUE),
    )
    .unwrap();
    let popup = gui
        .create_widget(
            None,
            rect(0, 0, 50, 50),
            Window::new().with_background(Rgb565::RED),
        )
        .unwrap();
    gui.process().unwrap();
    assert_eq!(gui.display().pixel(Point::new(10, 10)), Some(Rgb565::RED));

    gui.set_rect(popup, rect(100, 100, 50, 50)).unwrap();
    gui.process().unwrap();

    assert_eq!(gui.display().pixel(Point::new(10, 10)), Some(Rgb565::BLUE));
    assert_eq!(gui.display().pixel(Point::new(110, 110)), Some(Rgb565::RED));
}

#[test]
fn key_input_activates_focused_button() {
    let shared = GuiShared::new();
    let mut gui = new_gui(&shared);
    gui.create_widget(None, rect(0, 0, 320, 240), Window::new()).unwrap();
    let button = gui
        .create_widget(None, rect(10, 10, 100, 30), Button::new("OK", 8))
        .unwrap();
    gui.set_focus(Some(button)).unwrap();

    shared.push_key('\r' as u32, true).unwrap();
    gui.process().unwrap();

    assert_eq!(gui.poll_notification().map(|n| n.code), Some(8));
}

#[test]
fn disabled_or_hidden_button_ignores_keys() {
    let shared = GuiShared::new();
    let mut gui = new_gui(&shared);
    gui.create_widget(None, rect(0, 0, 320, 240), Window::new()).unwrap();
    let button = gui
        .create_widget(None, rect(10, 10, 100, 30), Button::new("OK", 8))
        .unwrap();
    gui.set_focus(Some(button)).unwrap();

    gui.set_disabled(button, true).unwrap();
    assert_eq!(gui.focused_widget(), None);
    assert_eq!(gui.previous_focused_widget(), Some(button));

    shared.push_key('\r' as u32, true).unwrap();
    gui.process().unwrap();
    assert_eq!(gui.poll_notification(), None);

    gui.set_disabled(button, false).unwrap();
    gui.set_focus(Some(button)).unwrap();
    gui.hide(button).unwrap();
    assert_eq!(gui.focused_widget(), None);

    shared.push_key('\r' as u32, true).unwrap();
    gui.process().unwrap();
    assert_eq!(gui.poll_notification(), None);
}
