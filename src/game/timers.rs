//! Per-snake countdown counters.
//!
//! Every ability keeps its cooldowns and durations here instead of in
//! dedicated fields. All counters decay together once per tick and never go
//! below zero.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    DashCooldown,
    TrapCooldown,
    DashActive,
}

impl Timer {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        match self {
            Timer::DashCooldown => 0,
            Timer::TrapCooldown => 1,
            Timer::DashActive => 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timers {
    counters: [u32; Timer::COUNT],
}

impl Timers {
    pub fn get(&self, timer: Timer) -> u32 {
        self.counters[timer.index()]
    }

    pub fn set(&mut self, timer: Timer, ticks: u32) {
        self.counters[timer.index()] = ticks;
    }

    pub fn is_ready(&self, timer: Timer) -> bool {
        self.get(timer) == 0
    }

    pub fn is_active(&self, timer: Timer) -> bool {
        self.get(timer) > 0
    }

    pub fn decay(&mut self) {
        for counter in &mut self.counters {
            *counter = counter.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_floors_at_zero() {
        let mut timers = Timers::default();
        timers.set(Timer::DashActive, 1);
        timers.set(Timer::TrapCooldown, 3);

        timers.decay();
        timers.decay();

        assert_eq!(timers.get(Timer::DashActive), 0);
        assert_eq!(timers.get(Timer::TrapCooldown), 1);
        assert_eq!(timers.get(Timer::DashCooldown), 0);
        assert!(timers.is_ready(Timer::DashCooldown));
        assert!(timers.is_active(Timer::TrapCooldown));
    }

    #[test]
    fn counters_are_independent() {
        let mut timers = Timers::default();
        timers.set(Timer::DashCooldown, 35);
        assert!(timers.is_ready(Timer::TrapCooldown));
        assert!(!timers.is_active(Timer::DashActive));
    }
}
