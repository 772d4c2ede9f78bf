//! Frame-driven timers.
//!
//! Nothing in here reads a clock: every helper is advanced with the frame's
//! `dt` in seconds, so delayed work stays in step with the render loop and can
//! be driven deterministically.

const EPSILON: f32 = 1e-6;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer<C> {
    id: TimerId,
    /// Seconds until due; negative once overdue.
    remaining: f32,
    cue: C,
}

/// One-shot timers that hand back their cue once due.
#[derive(Debug)]
pub struct Timers<C> {
    pending: Vec<Timer<C>>,
    next_id: u64,
}

impl<C> Default for Timers<C> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_id: 0,
        }
    }
}

impl<C> Timers<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, delay: f32, cue: C) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push(Timer {
            id,
            remaining: delay.max(0.0),
            cue,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        before != self.pending.len()
    }

    pub fn cancel_where(&mut self, predicate: impl Fn(&C) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|t| !predicate(&t.cue));
        before - self.pending.len()
    }

    /// Returns the cues that became due, earliest first. Timers due at the
    /// same moment keep their scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<C> {
        let dt = dt.max(0.0);
        for timer in self.pending.iter_mut() {
            timer.remaining -= dt;
        }
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|t| t.remaining <= EPSILON);
        self.pending = pending;
        // stable sort keeps the insertion order for equal due times
        due.sort_by(|a, b| a.remaining.total_cmp(&b.remaining));
        due.into_iter().map(|t| t.cue).collect()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_scheduled(&self, predicate: impl Fn(&C) -> bool) -> bool {
        self.pending.iter().any(|t| predicate(&t.cue))
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Collapses bursts of calls into one edge.
///
/// Each call restarts the wait window. With `leading` the first call of a
/// burst fires right away; with `trailing` the burst fires once the window
/// closes (only if it wasn't already fired on the leading edge alone).
#[derive(Debug, Clone)]
pub struct Debounce {
    wait: f32,
    leading: bool,
    trailing: bool,
    remaining: Option<f32>,
    pending_trailing: bool,
}

impl Debounce {
    /// Trailing-edge only.
    pub fn new(wait: f32) -> Self {
        Self::with_edges(wait, false, true)
    }

    pub fn with_edges(wait: f32, leading: bool, trailing: bool) -> Self {
        Self {
            wait: wait.max(0.0),
            leading,
            trailing,
            remaining: None,
            pending_trailing: false,
        }
    }

    /// Returns `true` if the leading edge fires now.
    pub fn call(&mut self) -> bool {
        let idle = self.remaining.is_none();
        self.remaining = Some(self.wait);
        if idle && self.leading {
            self.pending_trailing = false;
            true
        } else {
            self.pending_trailing = self.trailing;
            false
        }
    }

    /// Returns `true` if the trailing edge fired during this step.
    pub fn advance(&mut self, dt: f32) -> bool {
        let Some(remaining) = self.remaining else {
            return false;
        };
        let remaining = remaining - dt;
        if remaining > EPSILON {
            self.remaining = Some(remaining);
            return false;
        }
        self.remaining = None;
        std::mem::take(&mut self.pending_trailing)
    }

    pub fn cancel(&mut self) {
        self.remaining = None;
        self.pending_trailing = false;
    }

    pub fn is_pending(&self) -> bool {
        self.remaining.is_some()
    }
}

/// Fires at most once per interval; calls inside an open window coalesce into
/// one trailing fire when it closes.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: f32,
    window: Option<f32>,
    pending: bool,
}

impl Throttle {
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(0.0),
            window: None,
            pending: false,
        }
    }

    /// Returns `true` if the call fires immediately.
    pub fn call(&mut self) -> bool {
        if self.window.is_none() {
            self.window = Some(self.interval);
            true
        } else {
            self.pending = true;
            false
        }
    }

    /// Returns `true` if a coalesced call fired during this step.
    pub fn advance(&mut self, dt: f32) -> bool {
        let Some(window) = self.window else {
            return false;
        };
        let window = window - dt;
        if window > EPSILON {
            self.window = Some(window);
            return false;
        }
        if std::mem::take(&mut self.pending) {
            self.window = Some(self.interval);
            true
        } else {
            self.window = None;
            false
        }
    }

    pub fn cancel(&mut self) {
        self.window = None;
        self.pending = false;
    }
}
