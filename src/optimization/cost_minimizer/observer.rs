//! cost_minimizer::observer — best-iterate recording and iteration hooks.
//!
//! Purpose
//! -------
//! Attach a lightweight argmin observer to every run so that (a) the best
//! parameter vector seen so far survives a backend abort and (b) user code
//! can follow progress through an [`IterationHook`] without any global
//! state in the solver loop.
//!
//! Invariants & assumptions
//! ------------------------
//! - The observer is registered with `ObserverMode::Always`; it sees the
//!   initial state and every completed iteration.
//! - The shared [`BestIterate`] slot only ever moves to a finite cost that
//!   is not worse than the one it holds.
//! - A hook shared by consecutive runs ([`OffsetHook`]) sees one continuous
//!   iteration count.
use crate::optimization::cost_minimizer::{
    traits::IterationHook,
    types::{Cost, LbfgsState, Theta},
};
use argmin::core::{Error, KV, State, observers::Observe};
use std::sync::{Arc, Mutex};

/// Best parameter vector and cost recorded during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct BestIterate {
    pub theta: Theta,
    pub cost: Cost,
    pub iteration: u64,
}

/// Shared slot written by [`RunObserver`] and read back by the runner.
pub type BestSlot = Arc<Mutex<Option<BestIterate>>>;

/// Argmin observer that records the best iterate and forwards to a hook.
pub struct RunObserver {
    best: BestSlot,
    hook: Option<Box<dyn IterationHook>>,
}

impl RunObserver {
    pub fn new(best: BestSlot, hook: Option<Box<dyn IterationHook>>) -> Self {
        Self { best, hook }
    }

    fn record(&mut self, state: &LbfgsState) {
        let Some(theta) = state.get_best_param() else {
            return;
        };
        let cost = state.get_best_cost();
        if !cost.is_finite() {
            return;
        }
        let iteration = state.get_iter();
        let mut slot = match self.best.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let improves = slot.as_ref().is_none_or(|b| cost <= b.cost);
        if improves {
            *slot = Some(BestIterate { theta: theta.clone(), cost, iteration });
        }
    }
}

impl Observe<LbfgsState> for RunObserver {
    fn observe_init(&mut self, _name: &str, state: &LbfgsState, _kv: &KV) -> Result<(), Error> {
        self.record(state);
        Ok(())
    }

    fn observe_iter(&mut self, state: &LbfgsState, _kv: &KV) -> Result<(), Error> {
        self.record(state);
        if let (Some(hook), Some(theta)) = (self.hook.as_mut(), state.get_best_param()) {
            hook.on_iteration(state.get_iter(), theta, state.get_best_cost());
        }
        Ok(())
    }
}

/// Hook shared by the consecutive runs of one minimization.
pub type SharedHook = Arc<Mutex<Box<dyn IterationHook>>>;

/// Forwards to a [`SharedHook`], shifting iteration numbers by the
/// iterations completed in earlier runs.
pub struct OffsetHook {
    inner: SharedHook,
    offset: u64,
}

impl OffsetHook {
    pub fn new(inner: SharedHook, offset: u64) -> Self {
        Self { inner, offset }
    }
}

impl IterationHook for OffsetHook {
    fn on_iteration(&mut self, iteration: u64, best_theta: &Theta, best_cost: Cost) {
        let mut hook = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        hook.on_iteration(self.offset + iteration, best_theta, best_cost);
    }
}

/// Read the recorded best iterate, tolerating a poisoned lock.
pub fn take_best(best: &BestSlot) -> Option<BestIterate> {
    match best.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}
