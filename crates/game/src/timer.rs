/// Tolerance for comparing simulation timestamps.
pub const TIME_EPSILON: f32 = 1e-4;

/// Monotonic simulation clock, in seconds.
pub trait Clock {
    fn now(&self) -> f32;
}

/// Manually advanced clock. The tick loop owns it; tests drive it directly.
#[derive(Debug, Default)]
pub struct SimClock {
    elapsed: f32,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    pub fn set(&mut self, t: f32) {
        self.elapsed = t;
    }
}

impl Clock for SimClock {
    fn now(&self) -> f32 {
        self.elapsed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct ScheduledTimer {
    handle: TimerHandle,
    period: f32,
    next_due: f32,
}

/// Poll-driven repeating timers. `poll` is called once per simulation tick
/// and reports which timers came due; each timer fires at most once per
/// poll, so a stalled loop catches up without bursting.
#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: Vec<ScheduledTimer>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_repeating(&mut self, period: f32, initial_delay: f32, now: f32) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.push(ScheduledTimer {
            handle,
            period,
            next_due: now + initial_delay.max(0.0),
        });
        handle
    }

    /// Takes effect immediately: a cancelled timer never fires again, even
    /// if it was already due.
    pub fn cancel(&mut self, handle: TimerHandle) {
        self.timers.retain(|t| t.handle != handle);
    }

    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    pub fn poll(&mut self, now: f32) -> Vec<TimerHandle> {
        let mut due = Vec::new();
        for timer in &mut self.timers {
            if now + TIME_EPSILON >= timer.next_due {
                due.push(timer.handle);
                timer.next_due += timer.period;
                if timer.next_due + TIME_EPSILON <= now {
                    // Fell more than a full period behind; re-anchor instead
                    // of queueing make-up firings.
                    timer.next_due = now + timer.period;
                }
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_initial_delay_then_every_period() {
        let mut timers = TimerQueue::new();
        let handle = timers.schedule_repeating(0.1, 0.05, 0.0);

        assert!(timers.poll(0.0).is_empty());
        assert_eq!(timers.poll(0.05), vec![handle]);
        assert!(timers.poll(0.1).is_empty());
        assert_eq!(timers.poll(0.15), vec![handle]);
    }

    #[test]
    fn zero_initial_delay_fires_immediately() {
        let mut timers = TimerQueue::new();
        let handle = timers.schedule_repeating(0.1, 0.0, 0.0);
        assert_eq!(timers.poll(0.0), vec![handle]);
    }

    #[test]
    fn at_most_one_firing_per_poll() {
        let mut timers = TimerQueue::new();
        let handle = timers.schedule_repeating(0.1, 0.0, 0.0);

        // A long stall yields a single firing, then resumes on period.
        assert_eq!(timers.poll(1.0), vec![handle]);
        assert!(timers.poll(1.05).is_empty());
        assert_eq!(timers.poll(1.1), vec![handle]);
    }

    #[test]
    fn cancel_is_immediate() {
        let mut timers = TimerQueue::new();
        let handle = timers.schedule_repeating(0.1, 0.0, 0.0);
        timers.cancel(handle);

        assert!(!timers.is_scheduled(handle));
        assert!(timers.poll(1.0).is_empty());
    }
}
