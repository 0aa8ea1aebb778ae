use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const RESTART_GRACE: Duration = Duration::from_millis(4000);

/// Expiry instants for streams that were restarted recently.
///
/// Entries are only ever overwritten, never pruned; once an expiry passes the
/// entry simply stops mattering to the classifier.
#[derive(Debug, Clone, Default)]
pub struct RestartGrace {
    until: HashMap<String, Instant>,
}

impl RestartGrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful restart of `name` at `now`.
    pub fn arm(&mut self, name: &str, now: Instant) -> Instant {
        let until = now + RESTART_GRACE;
        self.until.insert(name.to_string(), until);
        until
    }

    pub fn expiry(&self, name: &str) -> Option<Instant> {
        self.until.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(grace: &RestartGrace, name: &str, now: Instant) -> bool {
        grace.expiry(name).is_some_and(|until| now < until)
    }

    #[test]
    fn grace_lasts_exactly_four_seconds() {
        let mut grace = RestartGrace::new();
        let t0 = Instant::now();
        grace.arm("ch1", t0);

        assert!(active(&grace, "ch1", t0));
        assert!(active(&grace, "ch1", t0 + Duration::from_millis(3999)));
        assert!(!active(&grace, "ch1", t0 + Duration::from_millis(4000)));
        assert!(!active(&grace, "ch2", t0));
    }

    #[test]
    fn rearming_extends_the_window() {
        let mut grace = RestartGrace::new();
        let t0 = Instant::now();
        grace.arm("ch1", t0);
        let later = t0 + Duration::from_millis(3000);
        grace.arm("ch1", later);

        assert!(active(&grace, "ch1", t0 + Duration::from_millis(6999)));
        assert_eq!(grace.expiry("ch1"), Some(later + RESTART_GRACE));
    }

    #[test]
    fn expired_entries_are_kept_but_inert() {
        let mut grace = RestartGrace::new();
        let t0 = Instant::now();
        grace.arm("ch1", t0);
        let after = t0 + Duration::from_secs(60);

        assert!(grace.expiry("ch1").is_some());
        assert!(!active(&grace, "ch1", after));
    }
}
