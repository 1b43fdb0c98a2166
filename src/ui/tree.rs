// src/ui/tree.rs
//! Widget tree: ownership, geometry, visibility, hit-testing and redraw.
//!
//! Every widget lives in one slot map arena. Top-level windows are chained
//! in the root list; a container chains its children in its own list. List
//! order is z-order: later members draw over earlier ones and are hit first.
//!
//! The tree also owns the non-owning input references (active window, active
//! widget, focused widget) so that destroying a subtree clears them in the
//! same step, whoever triggers the destruction.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::Deque;
use log::{debug, warn};
use slotmap::SlotMap;

use crate::clip::{ClipTracker, MAX_NESTING_DEPTH, intersect, overlaps};
use crate::error::{GuiError, GuiResult};
use crate::linked_list::{Link, Linked, ListRoot};
use crate::ui::core::{
    DrawContext, EventOutcome, Notification, Widget, WidgetEvent, WidgetId, WidgetKind,
};
use crate::ui::styling::COLOR_BACKGROUND;

/// Notifications kept until the host polls them
pub const NOTIFICATION_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, Default)]
struct WidgetFlags {
    hidden: bool,
    disabled: bool,
    dirty: bool,
}

struct Node<D>
where
    D: DrawTarget<Color = Rgb565> + 'static,
{
    widget: Box<dyn Widget<D>>,
    kind: WidgetKind,
    /// Parent-relative bounds
    rect: Rectangle,
    /// Display bounds, kept in sync with every ancestor move
    abs: Rectangle,
    flags: WidgetFlags,
    parent: Option<WidgetId>,
    depth: usize,
    link: Link<WidgetId>,
    children: ListRoot<WidgetId>,
}

impl<D> Linked<WidgetId> for Node<D>
where
    D: DrawTarget<Color = Rgb565> + 'static,
{
    fn link(&self) -> &Link<WidgetId> {
        &self.link
    }

    fn link_mut(&mut self) -> &mut Link<WidgetId> {
        &mut self.link
    }
}

fn translate(rect: Rectangle, origin: Point) -> Rectangle {
    Rectangle::new(rect.top_left + origin, rect.size)
}

/// Smallest rectangle covering both `a` and `b`
fn union(a: Rectangle, b: Rectangle) -> Rectangle {
    let (a_end, b_end) = (a.top_left + a.size, b.top_left + b.size);
    let top_left = Point::new(a.top_left.x.min(b.top_left.x), a.top_left.y.min(b.top_left.y));
    let end = Point::new(a_end.x.max(b_end.x), a_end.y.max(b_end.y));
    Rectangle::new(top_left, Size::new((end.x - top_left.x) as u32, (end.y - top_left.y) as u32))
}

/// Hierarchy of widgets with dirty tracking.
pub struct WidgetTree<D>
where
    D: DrawTarget<Color = Rgb565> + 'static,
{
    nodes: SlotMap<WidgetId, Node<D>>,
    roots: ListRoot<WidgetId>,
    capacity: usize,
    active_window: Option<WidgetId>,
    active: Option<WidgetId>,
    previous_active: Option<WidgetId>,
    focused: Option<WidgetId>,
    previous_focused: Option<WidgetId>,
    full_redraw: bool,
    /// Display area uncovered by top-level windows since the last pass
    exposed: Option<Rectangle>,
    background: Rgb565,
    notifications: Deque<Notification, NOTIFICATION_CAPACITY>,
}

impl<D> WidgetTree<D>
where
    D: DrawTarget<Color = Rgb565> + 'static,
{
    /// Create an empty tree holding at most `capacity` widgets
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(capacity),
            roots: ListRoot::new(),
            capacity,
            active_window: None,
            active: None,
            previous_active: None,
            focused: None,
            previous_focused: None,
            full_redraw: true,
            exposed: None,
            background: COLOR_BACKGROUND,
            notifications: Deque::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Creation and destruction
    // -----------------------------------------------------------------------

    /// Insert a widget with parent-relative bounds `rect`.
    ///
    /// Without an explicit parent a window kind becomes a new top-level
    /// window (and the active window); any other kind is placed in the
    /// active window.
    pub fn create<W>(
        &mut self,
        parent: Option<WidgetId>,
        rect: Rectangle,
        widget: W,
    ) -> GuiResult<WidgetId>
    where
        W: Widget<D>,
    {
        let kind = widget.kind();

        let parent = match parent {
            Some(parent) => Some(parent),
            None if kind.needs_window => Some(self.active_window.ok_or(GuiError::NoActiveWindow)?),
            None => None,
        };

        let (origin, depth) = match parent {
            Some(parent) => {
                let node = self.nodes.get(parent).ok_or(GuiError::InvalidHandle)?;
                if !node.kind.container {
                    return Err(GuiError::NotAContainer);
                }
                (node.abs.top_left, node.depth + 1)
            }
            None => (Point::zero(), 1),
        };

        if depth > MAX_NESTING_DEPTH {
            return Err(GuiError::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        if self.nodes.len() >= self.capacity {
            return Err(GuiError::AllocationFailed);
        }

        let id = self.nodes.insert(Node {
            widget: Box::new(widget),
            kind,
            rect,
            abs: translate(rect, origin),
            flags: WidgetFlags {
                dirty: true,
                ..WidgetFlags::default()
            },
            parent,
            depth,
            link: Link::new(),
            children: ListRoot::new(),
        });

        match parent {
            Some(parent) => {
                self.with_children(parent, |children, nodes| children.push_back(nodes, id));
            }
            None => {
                self.roots.push_back(&mut self.nodes, id);
                self.active_window = Some(id);
            }
        }

        debug!("Widget created: {} at {:?}", kind.name, rect);
        Ok(id)
    }

    /// Destroy a widget and its whole subtree, children first.
    ///
    /// Returns the number of widgets removed. Active, focused and
    /// active-window references into the subtree are cleared.
    pub fn destroy(&mut self, id: WidgetId) -> GuiResult<usize> {
        let node = self.nodes.get(id).ok_or(GuiError::InvalidHandle)?;
        let parent = node.parent;
        let exposed = node.abs;
        let was_visible = self.is_visible(id);

        match parent {
            Some(parent) => {
                self.with_children(parent, |children, nodes| children.remove(nodes, id));
            }
            None => {
                self.roots.remove(&mut self.nodes, id);
            }
        }

        let doomed = self.subtree_post_order(id);
        for &victim in &doomed {
            if self.active == Some(victim) {
                debug!("Active widget destroyed, clearing reference");
                self.active = None;
            }
            if self.focused == Some(victim) {
                self.focused = None;
            }
            if self.previous_active == Some(victim) {
                self.previous_active = None;
            }
            if self.previous_focused == Some(victim) {
                self.previous_focused = None;
            }
            if self.active_window == Some(victim) {
                self.active_window = None;
            }
            if let Some(node) = self.nodes.remove(victim) {
                debug!("Widget destroyed: {}", node.kind.name);
            }
        }

        if self.active_window.is_none() {
            self.active_window = self.roots.last();
        }
        if was_visible {
            self.expose(parent, exposed);
        }
        Ok(doomed.len())
    }

    /// Keys of `id`'s subtree with every child before its parent
    fn subtree_post_order(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut order = Vec::new();
        let mut stack = alloc::vec![(id, false)];

        while let Some((key, expanded)) = stack.pop() {
            if expanded {
                order.push(key);
                continue;
            }
            stack.push((key, true));
            if let Some(node) = self.nodes.get(key) {
                for child in node.children.iter(&self.nodes).rev() {
                    stack.push((child, false));
                }
            }
        }
        order
    }

    /// Run `f` on `parent`'s child list, writing the edited list back
    fn with_children<R>(
        &mut self,
        parent: WidgetId,
        f: impl FnOnce(&mut ListRoot<WidgetId>, &mut SlotMap<WidgetId, Node<D>>) -> R,
    ) -> Option<R> {
        let mut children = self.nodes.get(parent)?.children;
        let result = f(&mut children, &mut self.nodes);
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children = children;
        }
        Some(result)
    }

    // -----------------------------------------------------------------------
    // Geometry, visibility and z-order
    // -----------------------------------------------------------------------

    /// Move or resize a widget; `rect` is relative to its parent.
    pub fn set_rect(&mut self, id: WidgetId, rect: Rectangle) -> GuiResult<()> {
        let node = self.nodes.get_mut(id).ok_or(GuiError::InvalidHandle)?;
        if node.rect == rect {
            return Ok(());
        }
        let parent = node.parent;
        let old_abs = node.abs;
        node.rect = rect;
        node.flags.dirty = true;

        let origin = match parent {
            Some(parent) => self.nodes[parent].abs.top_left,
            None => Point::zero(),
        };
        self.update_absolute(id, origin);

        if self.is_visible(id) {
            self.expose(parent, old_abs);
        }
        Ok(())
    }

    /// Recompute absolute bounds of `id` and all of its descendants
    fn update_absolute(&mut self, id: WidgetId, origin: Point) {
        let mut stack = alloc::vec![(id, origin)];

        while let Some((key, origin)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            node.abs = translate(node.rect, origin);
            let (children, child_origin) = (node.children, node.abs.top_left);
            for child in children.iter(&self.nodes) {
                stack.push((child, child_origin));
            }
        }
    }

    pub fn show(&mut self, id: WidgetId) -> GuiResult<()> {
        let node = self.nodes.get_mut(id).ok_or(GuiError::InvalidHandle)?;
        if node.flags.hidden {
            node.flags.hidden = false;
            node.flags.dirty = true;
        }
        Ok(())
    }

    /// Hide a widget and its subtree; the area it covered is redrawn.
    ///
    /// Focus held inside the subtree is dropped with a `Blur`.
    pub fn hide(&mut self, id: WidgetId) -> GuiResult<()> {
        let visible = self.is_visible(id);
        let node = self.nodes.get_mut(id).ok_or(GuiError::InvalidHandle)?;
        if node.flags.hidden {
            return Ok(());
        }
        node.flags.hidden = true;
        let (parent, abs) = (node.parent, node.abs);

        self.drop_focus_within(id);
        if visible {
            self.expose(parent, abs);
        }
        Ok(())
    }

    /// Disabled widgets (and their subtrees) receive neither touch nor key
    /// input. Disabling drops focus held inside the subtree.
    pub fn set_disabled(&mut self, id: WidgetId, disabled: bool) -> GuiResult<()> {
        let node = self.nodes.get_mut(id).ok_or(GuiError::InvalidHandle)?;
        if node.flags.disabled == disabled {
            return Ok(());
        }
        node.flags.disabled = disabled;
        node.flags.dirty = true;

        if disabled {
            self.drop_focus_within(id);
        }
        Ok(())
    }

    /// Clear focus if it lies in `id`'s subtree
    fn drop_focus_within(&mut self, id: WidgetId) {
        if self.focused.is_some_and(|focused| self.is_within(focused, id)) {
            debug!("Focused widget can no longer take input, clearing focus");
            self.set_focus(None).ok();
        }
    }

    /// Whether `id` is `ancestor` or one of its descendants
    fn is_within(&self, id: WidgetId, ancestor: WidgetId) -> bool {
        let mut cursor = Some(id);
        while let Some(key) = cursor {
            if key == ancestor {
                return true;
            }
            cursor = self.nodes.get(key).and_then(|n| n.parent);
        }
        false
    }

    /// Raise a widget above its siblings
    pub fn bring_to_front(&mut self, id: WidgetId) -> GuiResult<()> {
        let node = self.nodes.get_mut(id).ok_or(GuiError::InvalidHandle)?;
        node.flags.dirty = true;
        let parent = node.parent;
        match parent {
            Some(parent) => {
                self.with_children(parent, |children, nodes| children.move_to_back(nodes, id));
            }
            None => {
                self.roots.move_to_back(&mut self.nodes, id);
            }
        }
        Ok(())
    }

    /// Schedule a widget for redraw on the next pass
    pub fn invalidate(&mut self, id: WidgetId) -> GuiResult<()> {
        self.nodes.get_mut(id).ok_or(GuiError::InvalidHandle)?.flags.dirty = true;
        Ok(())
    }

    /// Schedule every widget for redraw on the next pass
    pub fn invalidate_all(&mut self) {
        self.full_redraw = true;
    }

    /// Colour painted where no top-level window covers the display
    pub fn set_background(&mut self, color: Rgb565) {
        self.background = color;
        self.full_redraw = true;
    }

    pub fn background(&self) -> Rgb565 {
        self.background
    }

    /// Area `abs` of `parent` was uncovered and must be repainted.
    fn expose(&mut self, parent: Option<WidgetId>, abs: Rectangle) {
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(parent) => parent.flags.dirty = true,
            None => {
                // Whatever lies beneath a top-level window is unknown
                debug!("Top-level area {:?} exposed, full redraw", abs);
                self.exposed = Some(match self.exposed {
                    Some(area) => union(area, abs),
                    None => abs,
                });
                self.full_redraw = true;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, id: WidgetId) -> Option<WidgetKind> {
        self.nodes.get(id).map(|n| n.kind)
    }

    /// Parent-relative bounds
    pub fn rect(&self, id: WidgetId) -> Option<Rectangle> {
        self.nodes.get(id).map(|n| n.rect)
    }

    /// Display bounds
    pub fn absolute_rect(&self, id: WidgetId) -> Option<Rectangle> {
        self.nodes.get(id).map(|n| n.abs)
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of `id` bottom to top
    pub fn children(&self, id: WidgetId) -> impl DoubleEndedIterator<Item = WidgetId> + '_ {
        let list = self
            .nodes
            .get(id)
            .map(|n| n.children)
            .unwrap_or_default();
        list.iter(&self.nodes)
    }

    /// Top-level windows bottom to top
    pub fn roots(&self) -> impl DoubleEndedIterator<Item = WidgetId> + '_ {
        self.roots.iter(&self.nodes)
    }

    /// Whether the widget and all of its ancestors are shown
    pub fn is_visible(&self, id: WidgetId) -> bool {
        let mut cursor = Some(id);
        while let Some(key) = cursor {
            match self.nodes.get(key) {
                Some(node) if !node.flags.hidden => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn is_hidden(&self, id: WidgetId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.flags.hidden)
    }

    pub fn is_disabled(&self, id: WidgetId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.flags.disabled)
    }

    pub fn is_dirty(&self, id: WidgetId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.flags.dirty)
    }

    /// Whether the widget is visible and neither it nor an ancestor is
    /// disabled
    pub fn accepts_input(&self, id: WidgetId) -> bool {
        let mut cursor = Some(id);
        while let Some(key) = cursor {
            match self.nodes.get(key) {
                Some(node) if !node.flags.hidden && !node.flags.disabled => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Borrow the concrete widget state
    pub fn widget<W: Widget<D>>(&self, id: WidgetId) -> Option<&W> {
        let widget: &dyn Any = &*self.nodes.get(id)?.widget;
        widget.downcast_ref::<W>()
    }

    /// Mutably borrow the concrete widget state.
    ///
    /// Call [`invalidate`](Self::invalidate) after changing anything visible.
    pub fn widget_mut<W: Widget<D>>(&mut self, id: WidgetId) -> Option<&mut W> {
        let widget: &mut dyn Any = &mut *self.nodes.get_mut(id)?.widget;
        widget.downcast_mut::<W>()
    }

    // -----------------------------------------------------------------------
    // Input references
    // -----------------------------------------------------------------------

    /// Window that receives new widgets created without a parent
    pub fn active_window(&self) -> Option<WidgetId> {
        self.active_window
    }

    pub fn set_active_window(&mut self, id: WidgetId) -> GuiResult<()> {
        let node = self.nodes.get(id).ok_or(GuiError::InvalidHandle)?;
        if !node.kind.container {
            return Err(GuiError::NotAContainer);
        }
        self.active_window = Some(id);
        Ok(())
    }

    /// Widget currently holding a press gesture
    pub fn active(&self) -> Option<WidgetId> {
        self.active
    }

    /// Widget that held the gesture before the current one, if it still exists
    pub fn previous_active(&self) -> Option<WidgetId> {
        self.previous_active
    }

    pub(crate) fn set_active(&mut self, id: Option<WidgetId>) {
        let id = id.filter(|&id| self.nodes.contains_key(id));
        if self.active != id {
            self.previous_active = self.active;
            self.active = id;
        }
    }

    /// Widget receiving key input
    pub fn focused(&self) -> Option<WidgetId> {
        self.focused
    }

    /// Widget that held focus before the current one, if it still exists
    pub fn previous_focused(&self) -> Option<WidgetId> {
        self.previous_focused
    }

    /// Move keyboard focus, delivering `Blur` then `Focus`.
    ///
    /// Returns the number of events delivered.
    pub fn set_focus(&mut self, id: Option<WidgetId>) -> GuiResult<usize> {
        if let Some(id) = id
            && !self.nodes.contains_key(id)
        {
            return Err(GuiError::InvalidHandle);
        }
        if self.focused == id {
            return Ok(0);
        }

        let mut delivered = 0;
        self.previous_focused = self.focused;
        if let Some(previous) = self.focused.take()
            && self.dispatch(previous, WidgetEvent::Blur).is_some()
        {
            delivered += 1;
        }
        self.focused = id;
        if let Some(id) = id
            && self.dispatch(id, WidgetEvent::Focus).is_some()
        {
            delivered += 1;
        }
        Ok(delivered)
    }

    // -----------------------------------------------------------------------
    // Events and notifications
    // -----------------------------------------------------------------------

    /// Deliver `event` to a widget and apply the outcome.
    ///
    /// Returns `None` if the widget no longer exists.
    pub fn dispatch(&mut self, id: WidgetId, event: WidgetEvent) -> Option<EventOutcome> {
        let node = self.nodes.get_mut(id)?;
        let outcome = node.widget.on_event(event);

        match outcome {
            EventOutcome::Redraw => node.flags.dirty = true,
            EventOutcome::Notify(code) => {
                node.flags.dirty = true;
                let notification = Notification { source: id, code };
                if self.notifications.is_full() {
                    warn!("Notification queue full, dropping oldest");
                    self.notifications.pop_front();
                }
                self.notifications.push_back(notification).ok();
            }
            EventOutcome::Ignored | EventOutcome::Handled => {}
        }
        Some(outcome)
    }

    /// Oldest notification not yet seen by the host
    pub fn poll_notification(&mut self) -> Option<Notification> {
        self.notifications.pop_front()
    }

    // -----------------------------------------------------------------------
    // Hit-testing
    // -----------------------------------------------------------------------

    /// Topmost visible, enabled widget at `point`.
    ///
    /// Roots and siblings are searched last-inserted first and the deepest
    /// match wins. A widget only counts where it is not clipped away by an
    /// ancestor. `clip` is the hit-test tracker and is reset first.
    pub fn find_at(&self, point: Point, clip: &mut ClipTracker) -> Option<WidgetId> {
        clip.reset();
        if !clip.contains(point) {
            return None;
        }
        self.roots
            .iter(&self.nodes)
            .rev()
            .find_map(|root| self.hit_node(root, point, clip))
    }

    fn hit_node(&self, id: WidgetId, point: Point, clip: &mut ClipTracker) -> Option<WidgetId> {
        let node = self.nodes.get(id)?;
        if node.flags.hidden || node.flags.disabled {
            return None;
        }

        let visible = match clip.push(node.abs) {
            Ok(visible) => visible,
            Err(err) => {
                warn!("Hit-test skipped {}: {}", node.kind.name, err);
                return None;
            }
        };

        let hit = if visible.is_some_and(|v| v.contains(point)) {
            node.children
                .iter(&self.nodes)
                .rev()
                .find_map(|child| self.hit_node(child, point, clip))
                .or(Some(id))
        } else {
            None
        };

        clip.pop();
        hit
    }

    // -----------------------------------------------------------------------
    // Redraw
    // -----------------------------------------------------------------------

    /// Draw every widget that needs it and return how many were drawn.
    ///
    /// A visible widget is drawn when it is dirty, when a full redraw is
    /// pending, or when it overlaps something already drawn in this pass
    /// (a repainted container or a lower sibling covering it).
    ///
    /// Display area uncovered by a top-level window is filled with the
    /// background first. A driver error schedules a full redraw, so the
    /// next pass repaints whatever this one left unfinished.
    pub fn redraw(&mut self, display: &mut D, clip: &mut ClipTracker) -> Result<usize, D::Error> {
        clip.reset();
        let full = core::mem::take(&mut self.full_redraw);
        let mut damage = Vec::new();
        let mut drawn = 0;

        if let Some(area) = self.exposed.take()
            && let Some(area) = intersect(&area, &clip.display())
        {
            if let Err(err) = display.fill_solid(&area, self.background) {
                self.exposed = Some(area);
                self.full_redraw = true;
                return Err(err);
            }
            damage.push(area);
        }

        let mut cursor = self.roots.first();
        while let Some(id) = cursor {
            cursor = ListRoot::next_of(&self.nodes, id);
            match self.redraw_node(id, display, clip, full, &mut damage) {
                Ok(count) => drawn += count,
                Err(err) => {
                    warn!("Redraw aborted by the display driver, full redraw scheduled");
                    clip.reset();
                    self.full_redraw = true;
                    return Err(err);
                }
            }
        }

        if drawn > 0 {
            debug!("Redrawn {} widgets", drawn);
        }
        Ok(drawn)
    }

    fn redraw_node(
        &mut self,
        id: WidgetId,
        display: &mut D,
        clip: &mut ClipTracker,
        full: bool,
        damage: &mut Vec<Rectangle>,
    ) -> Result<usize, D::Error> {
        let (active, focused) = (self.active, self.focused);
        let Some(node) = self.nodes.get_mut(id) else {
            return Ok(0);
        };
        if node.flags.hidden {
            return Ok(0);
        }

        let visible = match clip.push(node.abs) {
            Ok(Some(visible)) => visible,
            Ok(None) => {
                clip.pop();
                return Ok(0);
            }
            Err(err) => {
                warn!("Redraw skipped {}: {}", node.kind.name, err);
                return Ok(0);
            }
        };

        let mut drawn = 0;
        let needs_draw = full || node.flags.dirty || damage.iter().any(|d| overlaps(d, &visible));
        if needs_draw {
            let ctx = DrawContext {
                id,
                bounds: node.abs,
                visible,
                active: active == Some(id),
                focused: focused == Some(id),
                disabled: node.flags.disabled,
            };
            let result = node.widget.draw(&mut display.clipped(&visible), &ctx);
            if let Err(err) = result {
                clip.pop();
                return Err(err);
            }
            node.flags.dirty = false;
            damage.push(visible);
            drawn += 1;
        }

        let mut cursor = node.children.first();
        while let Some(child) = cursor {
            cursor = ListRoot::next_of(&self.nodes, child);
            match self.redraw_node(child, display, clip, full, damage) {
                Ok(count) => drawn += count,
                Err(err) => {
                    clip.pop();
                    return Err(err);
                }
            }
        }

        clip.pop();
        Ok(drawn)
    }
}
