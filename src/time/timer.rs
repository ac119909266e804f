use super::SharedClock;

/// Real-time stopwatch with an optional limit
pub struct Timer {
    clock: SharedClock,
    start_ms: u64,
    /// `None` means no limit is set
    limit_ms: Option<i64>,
}

impl Timer {
    /// Start a timer at the clock's current time
    pub fn new(clock: SharedClock) -> Self {
        let start_ms = clock.now_ms();
        Self {
            clock,
            start_ms,
            limit_ms: None,
        }
    }

    pub fn reset(&mut self) {
        self.start_ms = self.clock.now_ms();
    }

    pub fn elapsed_real_ms(&self) -> i64 {
        self.clock.now_ms().saturating_sub(self.start_ms) as i64
    }

    /// Whether more than `ms` have passed since the last reset
    pub fn is_past_real_ms(&self, ms: i64) -> bool {
        self.elapsed_real_ms() > ms
    }

    /// Square wave with the given half period: false for the first
    /// `period_ms`, true for the next, and so on. Non-positive periods are
    /// always false.
    pub fn alternate_real(&self, period_ms: i64) -> bool {
        if period_ms <= 0 {
            return false;
        }
        self.elapsed_real_ms() % (period_ms * 2) > period_ms
    }

    pub fn set_real_time_limit_ms(&mut self, limit_ms: i64) {
        self.limit_ms = Some(limit_ms);
    }

    pub fn clear_real_time_limit(&mut self) {
        self.limit_ms = None;
    }

    pub fn real_time_limit_ms(&self) -> Option<i64> {
        self.limit_ms
    }

    /// Milliseconds until the limit, negative once past it. Without a limit
    /// this is 0.
    pub fn left_till_real_time_limit_ms(&self) -> i64 {
        match self.limit_ms {
            Some(limit) => limit - self.elapsed_real_ms(),
            None => 0,
        }
    }

    /// A zero limit counts as already past, no limit as never past
    pub fn is_past_real_time_limit(&self) -> bool {
        match self.limit_ms {
            None => false,
            Some(0) => true,
            Some(limit) => self.elapsed_real_ms() > limit,
        }
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("elapsed_ms", &self.elapsed_real_ms())
            .field("limit_ms", &self.limit_ms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;

    #[test]
    fn test_elapsed_and_reset() {
        let clock = ManualClock::new();
        let mut timer = Timer::new(clock.shared());
        clock.advance(120);
        assert_eq!(timer.elapsed_real_ms(), 120);
        assert!(timer.is_past_real_ms(100));
        assert!(!timer.is_past_real_ms(120));
        timer.reset();
        assert_eq!(timer.elapsed_real_ms(), 0);
    }

    #[test]
    fn test_alternate_real_phases() {
        let clock = ManualClock::new();
        let timer = Timer::new(clock.shared());
        assert!(!timer.alternate_real(50));
        clock.set(50);
        assert!(!timer.alternate_real(50));
        clock.set(51);
        assert!(timer.alternate_real(50));
        clock.set(99);
        assert!(timer.alternate_real(50));
        clock.set(100);
        assert!(!timer.alternate_real(50));
        assert!(!timer.alternate_real(0));
        assert!(!timer.alternate_real(-5));
    }

    #[test]
    fn test_time_limit() {
        let clock = ManualClock::new();
        let mut timer = Timer::new(clock.shared());
        assert!(!timer.is_past_real_time_limit());
        assert_eq!(timer.left_till_real_time_limit_ms(), 0);

        timer.set_real_time_limit_ms(500);
        clock.advance(200);
        assert_eq!(timer.left_till_real_time_limit_ms(), 300);
        assert!(!timer.is_past_real_time_limit());
        clock.advance(301);
        assert!(timer.is_past_real_time_limit());
        assert_eq!(timer.left_till_real_time_limit_ms(), -1);

        timer.set_real_time_limit_ms(0);
        timer.reset();
        assert!(timer.is_past_real_time_limit());
    }
}
