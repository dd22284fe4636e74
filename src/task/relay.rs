//! Per-run talkback relay for operators that start more than one run.
//!
//! `flat_map` and `and_map` hand their sink a single START whose talkback is
//! a relay. Inner runs attach their own talkbacks to it as they start, and a
//! CANCEL from downstream is fanned out to every talkback still attached.

use crate::task::signal::{SignalKind, Talkback};
use log::trace;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

enum RelayState {
    Live(Vec<Talkback>),
    Finished,
    Cancelled,
}

pub(crate) struct Relay {
    name: &'static str,
    state: Mutex<RelayState>,
}

impl Relay {
    pub(crate) fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            state: Mutex::new(RelayState::Live(Vec::new())),
        })
    }

    fn lock(&self) -> MutexGuard<'_, RelayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Talkback to hand downstream with START.
    pub(crate) fn talkback(self: &Arc<Self>) -> Talkback {
        let relay = Arc::clone(self);
        Talkback::new(move |kind| {
            if kind == SignalKind::Cancel {
                relay.cancel();
            }
        })
    }

    /// Track an inner run's talkback alongside the ones already attached.
    pub(crate) fn attach(&self, talkback: Talkback) {
        self.install(talkback, false);
    }

    /// Track an inner run's talkback, dropping the ones attached before it.
    pub(crate) fn replace(&self, talkback: Talkback) {
        self.install(talkback, true);
    }

    fn install(&self, talkback: Talkback, exclusive: bool) {
        let late = {
            let mut state = self.lock();
            match &mut *state {
                RelayState::Live(live) => {
                    if exclusive {
                        live.clear();
                    }
                    live.push(talkback);
                    None
                }
                RelayState::Finished => None,
                RelayState::Cancelled => Some(talkback),
            }
        };
        // An inner run that starts after downstream cancelled is stopped at once.
        if let Some(talkback) = late {
            trace!("{}: cancelling run started after cancel", self.name);
            talkback.cancel();
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        matches!(*self.lock(), RelayState::Cancelled)
    }

    /// Claim the right to emit the terminal signal.
    ///
    /// Returns `false` if the run was cancelled or already finished.
    pub(crate) fn finish(&self) -> bool {
        let mut state = self.lock();
        match &*state {
            RelayState::Live(_) => {
                *state = RelayState::Finished;
                true
            }
            RelayState::Finished | RelayState::Cancelled => false,
        }
    }

    fn cancel(&self) {
        let live = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, RelayState::Cancelled) {
                RelayState::Live(live) => live,
                previous => {
                    *state = previous;
                    return;
                }
            }
        };
        trace!("{}: cancel reaching {} run(s)", self.name, live.len());
        for talkback in live {
            talkback.cancel();
        }
    }
}
