//! Pure `primary_up` / `standby_notified` state machine. Kept free of sockets and
//! timers so the two transition rules can be unit-tested directly.

/// What the monitor should do in response to a probe outcome, decided by
/// [`MonitorState::observe_probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No transition; nothing to do.
    None,
    /// `primary_up` just flipped true → false and the standby has not yet been
    /// notified for this outage: send `"activate"`.
    SendActivate,
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorState {
    primary_up: bool,
    standby_notified: bool,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            primary_up: true,
            standby_notified: false,
        }
    }
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary_up(&self) -> bool {
        self.primary_up
    }

    pub fn standby_notified(&self) -> bool {
        self.standby_notified
    }

    /// Feed in the result of one probe round and get back what the caller should
    /// do next.
    pub fn observe_probe(&mut self, success: bool) -> Action {
        let was_up = self.primary_up;
        self.primary_up = success;

        if was_up && !success {
            if !self.standby_notified {
                return Action::SendActivate;
            }
        } else if !was_up && success {
            // Primary came back: future outages can re-trigger activation.
            self.standby_notified = false;
        }

        Action::None
    }

    /// Call once the `"activate"` send has been acknowledged by the standby.
    pub fn mark_standby_notified(&mut self) {
        self.standby_notified = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_up_and_unnotified() {
        let state = MonitorState::new();
        assert!(state.primary_up());
        assert!(!state.standby_notified());
    }

    #[test]
    fn failure_transition_triggers_activate_once() {
        let mut state = MonitorState::new();
        assert_eq!(state.observe_probe(false), Action::SendActivate);
        assert!(!state.primary_up());
        state.mark_standby_notified();

        // Repeated failures do not re-trigger while still down.
        assert_eq!(state.observe_probe(false), Action::None);
        assert!(state.standby_notified());
    }

    #[test]
    fn recovery_resets_notified_flag() {
        let mut state = MonitorState::new();
        state.observe_probe(false);
        state.mark_standby_notified();

        assert_eq!(state.observe_probe(true), Action::None);
        assert!(state.primary_up());
        assert!(!state.standby_notified());
    }

    #[test]
    fn second_outage_after_recovery_triggers_activate_again() {
        let mut state = MonitorState::new();
        state.observe_probe(false);
        state.mark_standby_notified();
        state.observe_probe(true);

        assert_eq!(state.observe_probe(false), Action::SendActivate);
    }

    #[test]
    fn steady_state_up_never_activates() {
        let mut state = MonitorState::new();
        for _ in 0..5 {
            assert_eq!(state.observe_probe(true), Action::None);
        }
    }

    #[test]
    fn activate_not_resent_if_never_acknowledged() {
        // standby_notified is only set once the send is actually acknowledged. If
        // the send fails, the caller should simply not call mark_standby_notified,
        // and the next failed probe will retry.
        let mut state = MonitorState::new();
        assert_eq!(state.observe_probe(false), Action::SendActivate);
        // Caller's send failed; does not call mark_standby_notified.
        assert_eq!(state.observe_probe(false), Action::None);
        // primary_up is already false so no new transition fires even though
        // standby was never actually notified. This is the one gap the spec
        // leaves to the transport: a send failure during an outage is retried
        // implicitly only once the primary recovers and fails again.
    }
}
