//! Software timers advanced by elapsed milliseconds.
//!
//! Timers live in a slot map and are chained in creation order through an
//! intrusive list. [`TimerCore::advance`] ages every running timer and fires
//! the ones that expire, in list order. Callbacks get mutable access to the
//! core itself (to cancel or reschedule any timer, including the one firing)
//! and to a caller-supplied context, which is the widget tree inside
//! [`Gui`](crate::gui::Gui).

use alloc::boxed::Box;
use alloc::vec::Vec;
use log::debug;
use slotmap::{SlotMap, new_key_type};

use crate::error::{GuiError, GuiResult};
use crate::linked_list::{Link, Linked, ListRoot};

new_key_type! {
    /// Generational handle to a software timer
    pub struct TimerId;
}

/// Callback invoked each time a timer expires
pub type TimerCallback<C> = Box<dyn FnMut(TimerId, &mut TimerCore<C>, &mut C)>;

struct Timer<C> {
    period: u32,
    remaining: u32,
    one_shot: bool,
    running: bool,
    /// `None` only while the callback is executing
    callback: Option<TimerCallback<C>>,
    link: Link<TimerId>,
}

impl<C> Linked<TimerId> for Timer<C> {
    fn link(&self) -> &Link<TimerId> {
        &self.link
    }

    fn link_mut(&mut self) -> &mut Link<TimerId> {
        &mut self.link
    }
}

/// Collection of software countdown and periodic timers.
pub struct TimerCore<C> {
    timers: SlotMap<TimerId, Timer<C>>,
    list: ListRoot<TimerId>,
    capacity: usize,
}

impl<C> TimerCore<C> {
    /// Create an empty core that holds at most `capacity` timers
    pub fn new(capacity: usize) -> Self {
        Self {
            timers: SlotMap::with_capacity_and_key(capacity),
            list: ListRoot::new(),
            capacity,
        }
    }

    /// Create a running timer that first expires after `period_ms`.
    ///
    /// One-shot timers are removed once they fire; periodic timers reload to
    /// their period and need a non-zero one.
    pub fn create<F>(&mut self, period_ms: u32, one_shot: bool, callback: F) -> GuiResult<TimerId>
    where
        F: FnMut(TimerId, &mut TimerCore<C>, &mut C) + 'static,
    {
        if !one_shot && period_ms == 0 {
            return Err(GuiError::ZeroPeriod);
        }
        if self.timers.len() >= self.capacity {
            return Err(GuiError::AllocationFailed);
        }

        let id = self.timers.insert(Timer {
            period: period_ms,
            remaining: period_ms,
            one_shot,
            running: true,
            callback: Some(Box::new(callback)),
            link: Link::new(),
        });
        self.list.push_back(&mut self.timers, id);
        debug!("Timer created: period {} ms, one-shot {}", period_ms, one_shot);
        Ok(id)
    }

    /// Remove a timer; it will never fire again
    pub fn cancel(&mut self, id: TimerId) -> GuiResult<()> {
        if !self.list.remove(&mut self.timers, id) {
            return Err(GuiError::InvalidHandle);
        }
        self.timers.remove(id);
        debug!("Timer canceled");
        Ok(())
    }

    /// Resume aging a stopped timer from its remaining time
    pub fn start(&mut self, id: TimerId) -> GuiResult<()> {
        self.timer_mut(id)?.running = true;
        Ok(())
    }

    /// Pause a timer; it keeps its remaining time
    pub fn stop(&mut self, id: TimerId) -> GuiResult<()> {
        self.timer_mut(id)?.running = false;
        Ok(())
    }

    /// Reload the countdown to the full period and start the timer
    pub fn reset(&mut self, id: TimerId) -> GuiResult<()> {
        let timer = self.timer_mut(id)?;
        timer.remaining = timer.period;
        timer.running = true;
        Ok(())
    }

    /// Change the period and restart the countdown from it
    pub fn set_period(&mut self, id: TimerId, period_ms: u32) -> GuiResult<()> {
        let timer = self.timer_mut(id)?;
        if !timer.one_shot && period_ms == 0 {
            return Err(GuiError::ZeroPeriod);
        }
        timer.period = period_ms;
        timer.remaining = period_ms;
        Ok(())
    }

    /// Milliseconds until the timer next fires
    pub fn remaining(&self, id: TimerId) -> Option<u32> {
        self.timers.get(id).map(|t| t.remaining)
    }

    pub fn period(&self, id: TimerId) -> Option<u32> {
        self.timers.get(id).map(|t| t.period)
    }

    pub fn is_running(&self, id: TimerId) -> bool {
        self.timers.get(id).is_some_and(|t| t.running)
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    fn timer_mut(&mut self, id: TimerId) -> GuiResult<&mut Timer<C>> {
        self.timers.get_mut(id).ok_or(GuiError::InvalidHandle)
    }

    /// Age every running timer by `elapsed_ms` and fire the expired ones.
    ///
    /// Returns the number of callbacks invoked. Timers are visited in list
    /// (creation) order; a periodic timer may fire several times in one call
    /// and carries the leftover time into its next countdown. Timers created
    /// by a callback are not aged until the next call.
    pub fn advance(&mut self, elapsed_ms: u32, ctx: &mut C) -> usize {
        if elapsed_ms == 0 || self.list.is_empty() {
            return 0;
        }

        let snapshot: Vec<TimerId> = self.list.iter(&self.timers).collect();
        let mut fired = 0;

        for id in snapshot {
            let mut left = elapsed_ms;

            loop {
                // Canceled or stopped by an earlier callback in this pass
                let Some(timer) = self.timers.get_mut(id) else {
                    break;
                };
                if !timer.running {
                    break;
                }
                if left < timer.remaining {
                    timer.remaining -= left;
                    break;
                }
                left -= timer.remaining;

                if timer.one_shot {
                    self.list.remove(&mut self.timers, id);
                    if let Some(mut timer) = self.timers.remove(id)
                        && let Some(callback) = timer.callback.as_mut()
                    {
                        callback(id, self, ctx);
                        fired += 1;
                    }
                    break;
                }

                timer.remaining = timer.period;
                let Some(mut callback) = timer.callback.take() else {
                    break;
                };
                callback(id, self, ctx);
                fired += 1;

                match self.timers.get_mut(id) {
                    Some(timer) => timer.callback = Some(callback),
                    None => break,
                }
            }
        }

        if fired > 0 {
            debug!("Timers fired: {}", fired);
        }
        fired
    }
}
