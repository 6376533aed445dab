use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    browser::{domain::extract_domain, TabEvent},
    utils::clock::Clock,
};

/// Accrued time per domain since the last flush, in milliseconds.
pub type Ledger = HashMap<String, u64>;

/// The single open (tab, domain) interval currently being accounted.
#[derive(Debug)]
struct Session {
    tab_id: i64,
    domain: String,
    started_at: DateTime<Utc>,
}

/// Turns tab transitions into accrued time per domain. At most one session is
/// open at a time, and every transition closes the previous session into the
/// ledger before a new one starts, so no interval is counted twice or dropped.
pub struct TimeTracker {
    session: Option<Session>,
    ledger: Ledger,
    clock: Box<dyn Clock>,
}

impl TimeTracker {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            session: None,
            ledger: Ledger::new(),
            clock,
        }
    }

    /// Opens a session for `domain` on `tab_id`. An already open session is
    /// closed into the ledger first, so switching never loses time.
    pub fn start_tracking(&mut self, tab_id: i64, domain: String) {
        self.stop_tracking();
        debug!("Tracking {domain} on tab {tab_id}");
        self.session = Some(Session {
            tab_id,
            domain,
            started_at: self.clock.time(),
        });
    }

    /// Closes the open session, adding its elapsed time to the ledger. A
    /// second call without an intervening start is a no-op.
    pub fn stop_tracking(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        // A clock anomaly can make the difference negative, count nothing
        // rather than subtract.
        let elapsed = (self.clock.time() - session.started_at)
            .num_milliseconds()
            .max(0) as u64;
        if elapsed == 0 {
            // A session closed in the same instant it opened (a flush right
            // after a switch, or a clamped anomaly) must not mint a dead key.
            return;
        }
        debug!("Accruing {elapsed}ms to {}", session.domain);
        *self.ledger.entry(session.domain).or_insert(0) += elapsed;
    }

    /// Applies one tab event from the extension. Unresolvable urls stop the
    /// current session and leave the tracker idle, they never fail.
    pub fn handle_event(&mut self, event: &TabEvent) {
        match event {
            TabEvent::Activated { tab_id, url } => {
                self.stop_tracking();
                if let Some(domain) = extract_domain(url) {
                    self.start_tracking(*tab_id, domain);
                }
            }
            TabEvent::UrlChanged { tab_id, url } => {
                // Background tabs can navigate freely, only the tracked tab
                // matters.
                if !matches!(&self.session, Some(session) if session.tab_id == *tab_id) {
                    return;
                }
                self.stop_tracking();
                if let Some(domain) = extract_domain(url) {
                    self.start_tracking(*tab_id, domain);
                }
            }
        }
    }

    /// Closes the open session and hands out the ledger, leaving it empty.
    pub fn take_ledger(&mut self) -> Ledger {
        self.stop_tracking();
        std::mem::take(&mut self.ledger)
    }

    /// Reopens a session for the tab the browser reports as active, if its
    /// url resolves to a domain. Used after a flush.
    pub fn resume(&mut self, tab_id: i64, url: &str) {
        if let Some(domain) = extract_domain(url) {
            self.start_tracking(tab_id, domain);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{browser::TabEvent, utils::clock::testing::ManualClock};

    use super::TimeTracker;

    fn tracker() -> (TimeTracker, ManualClock) {
        let clock = ManualClock::start_of_test();
        (TimeTracker::new(Box::new(clock.clone())), clock)
    }

    #[test]
    fn accrues_elapsed_time_on_stop() {
        let (mut tracker, clock) = tracker();
        tracker.start_tracking(1, "github.com".into());
        clock.advance_ms(1500);
        tracker.stop_tracking();

        assert_eq!(tracker.take_ledger(), [("github.com".into(), 1500)].into());
    }

    #[test]
    fn stop_without_session_is_a_noop() {
        let (mut tracker, clock) = tracker();
        tracker.start_tracking(1, "github.com".into());
        clock.advance_ms(1000);
        tracker.stop_tracking();
        clock.advance_ms(1000);
        tracker.stop_tracking();

        assert_eq!(tracker.take_ledger(), [("github.com".into(), 1000)].into());
    }

    #[test]
    fn switching_tabs_closes_the_previous_session() {
        let (mut tracker, clock) = tracker();
        tracker.handle_event(&TabEvent::Activated {
            tab_id: 1,
            url: "https://github.com/rust-lang".into(),
        });
        clock.advance_ms(1000);
        tracker.handle_event(&TabEvent::Activated {
            tab_id: 2,
            url: "https://facebook.com".into(),
        });
        clock.advance_ms(500);

        assert_eq!(
            tracker.take_ledger(),
            [("github.com".into(), 1000), ("facebook.com".into(), 500)].into()
        );
    }

    #[test]
    fn time_splits_across_repeated_visits_without_gaps() {
        let (mut tracker, clock) = tracker();
        tracker.start_tracking(1, "github.com".into());
        clock.advance_ms(300);
        tracker.start_tracking(2, "youtube.com".into());
        clock.advance_ms(200);
        tracker.start_tracking(1, "github.com".into());
        clock.advance_ms(700);
        tracker.stop_tracking();

        assert_eq!(
            tracker.take_ledger(),
            [("github.com".into(), 1000), ("youtube.com".into(), 200)].into()
        );
    }

    #[test]
    fn url_change_on_tracked_tab_switches_domain() {
        let (mut tracker, clock) = tracker();
        tracker.handle_event(&TabEvent::Activated {
            tab_id: 1,
            url: "https://github.com".into(),
        });
        clock.advance_ms(400);
        tracker.handle_event(&TabEvent::UrlChanged {
            tab_id: 1,
            url: "https://reddit.com/r/rust".into(),
        });
        clock.advance_ms(600);
        tracker.stop_tracking();

        assert_eq!(
            tracker.take_ledger(),
            [("github.com".into(), 400), ("reddit.com".into(), 600)].into()
        );
    }

    #[test]
    fn url_change_on_other_tab_is_ignored() {
        let (mut tracker, clock) = tracker();
        tracker.handle_event(&TabEvent::Activated {
            tab_id: 1,
            url: "https://github.com".into(),
        });
        clock.advance_ms(400);
        tracker.handle_event(&TabEvent::UrlChanged {
            tab_id: 9,
            url: "https://reddit.com".into(),
        });
        clock.advance_ms(600);
        tracker.stop_tracking();

        assert_eq!(tracker.take_ledger(), [("github.com".into(), 1000)].into());
    }

    #[test]
    fn navigating_to_an_internal_page_goes_idle() {
        let (mut tracker, clock) = tracker();
        tracker.handle_event(&TabEvent::Activated {
            tab_id: 1,
            url: "https://github.com".into(),
        });
        clock.advance_ms(250);
        tracker.handle_event(&TabEvent::UrlChanged {
            tab_id: 1,
            url: "chrome://extensions".into(),
        });
        clock.advance_ms(10_000);
        tracker.stop_tracking();

        // The idle stretch on the internal page accrues to nothing.
        assert_eq!(tracker.take_ledger(), [("github.com".into(), 250)].into());
    }

    #[test]
    fn clock_going_backwards_accrues_nothing() {
        let (mut tracker, clock) = tracker();
        tracker.start_tracking(1, "github.com".into());
        clock.rewind_ms(5000);
        tracker.stop_tracking();

        assert_eq!(tracker.take_ledger(), [].into());
    }

    #[test]
    fn instantly_closed_session_leaves_no_ledger_entry() {
        let (mut tracker, clock) = tracker();
        tracker.start_tracking(1, "github.com".into());
        clock.advance_ms(1000);
        // The new session is closed again before any time passes.
        tracker.start_tracking(2, "facebook.com".into());

        assert_eq!(tracker.take_ledger(), [("github.com".into(), 1000)].into());
    }

    #[test]
    fn take_ledger_flushes_the_open_session_and_clears() {
        let (mut tracker, clock) = tracker();
        tracker.start_tracking(1, "github.com".into());
        clock.advance_ms(1000);

        assert_eq!(tracker.take_ledger(), [("github.com".into(), 1000)].into());
        // Nothing accrued since, the second snapshot is empty.
        assert_eq!(tracker.take_ledger(), [].into());
    }
}
