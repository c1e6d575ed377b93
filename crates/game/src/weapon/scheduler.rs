use crate::timer::{TimerHandle, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireState {
    Idle,
    Firing,
}

/// Drives periodic shot attempts while the trigger is held. The scheduler
/// only owns timing; it never resolves a shot itself.
#[derive(Debug, Default)]
pub struct FireScheduler {
    timer: Option<TimerHandle>,
}

impl FireScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FireState {
        if self.timer.is_some() {
            FireState::Firing
        } else {
            FireState::Idle
        }
    }

    pub fn is_firing(&self) -> bool {
        self.timer.is_some()
    }

    /// Idle -> Firing. The first shot is delayed so that toggling the
    /// trigger cannot bank up extra shots:
    /// `first_delay = max(0, last_fire_time + min_interval - now)`.
    /// Re-entrant while already firing is a no-op.
    pub fn start_firing(
        &mut self,
        timers: &mut TimerQueue,
        now: f32,
        last_fire_time: f32,
        min_interval: f32,
    ) {
        if self.timer.is_some() {
            return;
        }
        let first_delay = (last_fire_time + min_interval - now).max(0.0);
        self.timer = Some(timers.schedule_repeating(min_interval, first_delay, now));
    }

    /// Firing -> Idle. Cancels the pending invocation immediately; a no-op
    /// from Idle.
    pub fn stop_firing(&mut self, timers: &mut TimerQueue) {
        if let Some(handle) = self.timer.take() {
            timers.cancel(handle);
        }
    }

    /// Whether a due timer handle belongs to this trigger.
    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.timer == Some(handle)
    }
}
