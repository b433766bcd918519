use std::time::{Duration, Instant};

/// Fixed-period trigger polled by the host loop. Fires at most once per
/// poll; beats missed while the loop was busy are dropped, not queued.
pub struct Ticker {
    interval: Duration,
    next_at: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Ticker { interval, next_at: None }
    }

    pub fn start(&mut self, now: Instant) {
        self.next_at = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_at = None;
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.next_at.is_some()
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_at {
            Some(at) if at <= now => {
                let next = at + self.interval;
                self.next_at = Some(if next <= now { now + self.interval } else { next });
                true
            },
            _ => false,
        }
    }

    /// How long the loop may wait before the next beat is due.
    pub fn time_left(&self, now: Instant) -> Option<Duration> {
        self.next_at.map(|at| at.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_50: Duration = Duration::from_millis(50);

    #[test]
    fn test_stopped_never_fires() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(MS_50);
        assert!(!ticker.is_running());
        assert!(!ticker.poll(t0 + Duration::from_secs(10)));
        assert_eq!(ticker.time_left(t0), None);
    }

    #[test]
    fn test_fires_every_interval() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(MS_50);
        ticker.start(t0);

        assert!(!ticker.poll(t0 + Duration::from_millis(49)));
        assert!(ticker.poll(t0 + MS_50));
        assert!(!ticker.poll(t0 + Duration::from_millis(60)));
        assert!(ticker.poll(t0 + Duration::from_millis(100)));
        assert_eq!(ticker.time_left(t0 + Duration::from_millis(120)), Some(Duration::from_millis(30)));
    }

    #[test]
    fn test_missed_beats_collapse() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(MS_50);
        ticker.start(t0);

        assert!(ticker.poll(t0 + Duration::from_millis(500)));
        assert!(!ticker.poll(t0 + Duration::from_millis(510)));
        assert!(ticker.poll(t0 + Duration::from_millis(550)));
    }

    #[test]
    fn test_stop_and_restart() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(MS_50);
        ticker.start(t0);
        ticker.stop();
        assert!(!ticker.poll(t0 + MS_50));

        ticker.start(t0 + MS_50);
        assert!(ticker.is_running());
        assert!(!ticker.poll(t0 + MS_50));
        assert!(ticker.poll(t0 + 2 * MS_50));
    }
}
