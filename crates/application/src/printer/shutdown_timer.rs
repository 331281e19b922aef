use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

// Cap for delays too large to add to the clock, about thirty years
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Single inactivity timer of a power manager
///
/// The current deadline is published on a watch channel; the auto-shutdown
/// task sleeps until it and re-reads it whenever it changes. `None` means
/// disarmed.
pub struct ShutdownTimer {
    delay: Duration,
    deadline: watch::Sender<Option<Instant>>,
}

impl ShutdownTimer {
    pub fn new(delay: Duration) -> (Self, watch::Receiver<Option<Instant>>) {
        let (deadline, rx) = watch::channel(None);
        (Self { delay, deadline }, rx)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)arm to fire `delay` from now, superseding any previous deadline
    pub fn arm(&self) -> Instant {
        let now = Instant::now();
        let at = now
            .checked_add(self.delay)
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.deadline.send_replace(Some(at));
        at
    }

    pub fn disarm(&self) {
        self.deadline.send_replace(None);
    }

    pub fn deadline(&self) -> Option<Instant> {
        *self.deadline.borrow()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline().is_some()
    }

    /// Armed and the deadline has passed
    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.deadline(), Some(at) if at <= now)
    }
}
