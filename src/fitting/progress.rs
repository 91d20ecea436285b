//! fitting::progress — periodic error decomposition during the joint run.
//!
//! The joint optimizer calls an [`IterationHook`] after every iteration;
//! [`ProgressHook`] turns every `interval`-th call into a [`SweepProgress`]
//! and hands it to the user callback, or logs it at `info` level when no
//! callback was given.
use crate::{
    fitting::sweep::{SweepData, SweepObjective},
    optimization::cost_minimizer::{Cost, IterationHook, Theta},
};
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

/// Error decomposition of the best iterate at a given iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepProgress {
    pub iteration: u64,
    pub fidelity: f64,
    pub barrier: f64,
    pub continuity: f64,
    pub total: f64,
}

/// User callback receiving progress reports.
pub type ProgressCallback = Box<dyn FnMut(&SweepProgress) + Send>;

pub struct ProgressHook {
    objective: SweepObjective,
    data: Arc<SweepData>,
    interval: u64,
    callback: Option<ProgressCallback>,
}

impl ProgressHook {
    /// `interval` is clamped to at least one iteration.
    pub fn new(
        objective: SweepObjective, data: Arc<SweepData>, interval: u64,
        callback: Option<ProgressCallback>,
    ) -> Self {
        Self { objective, data, interval: interval.max(1), callback }
    }
}

impl IterationHook for ProgressHook {
    fn on_iteration(&mut self, iteration: u64, best_theta: &Theta, best_cost: Cost) {
        if iteration % self.interval != 0 {
            return;
        }
        let terms = match self.objective.decompose(best_theta, &self.data) {
            Ok(terms) => terms,
            Err(err) => {
                debug!("iteration {iteration}: no decomposition for best iterate ({err})");
                return;
            }
        };
        let progress = SweepProgress {
            iteration,
            fidelity: terms.fidelity,
            barrier: terms.barrier,
            continuity: terms.continuity,
            total: best_cost,
        };
        match self.callback.as_mut() {
            Some(callback) => callback(&progress),
            None => info!(
                "iteration {}: fidelity {:.6e}, barrier {:.6e}, continuity {:.6e}, total {:.6e}",
                progress.iteration,
                progress.fidelity,
                progress.barrier,
                progress.continuity,
                progress.total
            ),
        }
    }
}
