//! Sustain gate — hysteresis between the policy engine and commits
//!
//! A candidate decision must remain the policy engine's answer for its
//! sustain window before it is committed. Any contradicting observation
//! clears the pending state, so a transient spike or dip never moves the
//! partition sets.

use std::time::Duration;

use crate::tasklist::policy::Decision;

#[derive(Debug, Clone)]
struct Pending {
    decision: Decision,
    since: Duration,
}

/// Hysteresis gate over scaling decisions
#[derive(Debug, Default)]
pub struct SustainGate {
    pending: Option<Pending>,
}

impl SustainGate {
    /// Create an empty gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a candidate through the gate.
    ///
    /// Returns the candidate once it has been pending for at least
    /// `sustain`; otherwise `NoOp`. A zero sustain commits immediately.
    /// `NoOp` candidates and candidates that contradict the pending
    /// decision clear the gate; the contradicting candidate has to be
    /// re-proposed on a later tick to start its own window.
    pub fn admit(&mut self, now: Duration, candidate: Decision, sustain: Duration) -> Decision {
        if candidate.is_noop() {
            self.pending = None;
            return Decision::NoOp;
        }

        if sustain.is_zero() {
            self.pending = None;
            return candidate;
        }

        match &self.pending {
            None => {
                self.pending = Some(Pending {
                    decision: candidate,
                    since: now,
                });
                Decision::NoOp
            }
            Some(pending) if pending.decision != candidate => {
                self.pending = None;
                Decision::NoOp
            }
            Some(pending) if now.saturating_sub(pending.since) >= sustain => {
                self.pending = None;
                candidate
            }
            Some(_) => Decision::NoOp,
        }
    }

    /// Drop any pending decision
    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// The decision currently waiting out its sustain window, if any
    pub fn pending(&self) -> Option<&Decision> {
        self.pending.as_ref().map(|p| &p.decision)
    }
}
