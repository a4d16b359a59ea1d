//! Physical invariants of a system snapshot and their drift over a run.
//!
//! Energy is always summed directly over all pairs, whichever solver drives
//! the integration, so Barnes–Hut runs are measured against the exact
//! potential.

use super::forces::potential_energy;
use super::params::SimulationConfig;
use super::states::{NVec3, SystemState};

/// Below this magnitude a baseline is treated as zero and drift is reported
/// as an absolute difference instead of a relative one.
const ZERO_BASELINE: f64 = 1e-12;

/// Invariants of one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Invariants {
    pub kinetic: f64,
    pub potential: f64,
    pub center_of_mass: NVec3,
    pub momentum: NVec3,
    pub angular_momentum: NVec3,
}

impl Invariants {
    pub fn measure(state: &SystemState, config: &SimulationConfig) -> Self {
        let total_mass = state.total_mass();

        let mut kinetic = 0.0;
        let mut weighted = NVec3::zeros();
        let mut momentum = NVec3::zeros();
        let mut angular_momentum = NVec3::zeros();
        for b in &state.bodies {
            kinetic += b.kinetic_energy();
            weighted += b.m * b.x;
            momentum += b.momentum();
            angular_momentum += b.x.cross(&b.momentum());
        }

        let center_of_mass = if total_mass > 0.0 { weighted / total_mass } else { NVec3::zeros() };

        Self {
            kinetic,
            potential: potential_energy(&state.bodies, config.g, config.softening),
            center_of_mass,
            momentum,
            angular_momentum,
        }
    }

    pub fn energy(&self) -> f64 {
        self.kinetic + self.potential
    }
}

/// Drift of each invariant relative to the first recorded sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Drift {
    /// Signed, `(E - E0) / |E0|`
    pub energy: f64,
    pub center_of_mass: f64,
    pub momentum: f64,
    pub angular_momentum: f64,
}

impl Drift {
    fn between(baseline: &Invariants, current: &Invariants) -> Self {
        Self {
            energy: relative_drift(baseline.energy(), current.energy()),
            center_of_mass: relative_drift_vec(&baseline.center_of_mass, &current.center_of_mass),
            momentum: relative_drift_vec(&baseline.momentum, &current.momentum),
            angular_momentum: relative_drift_vec(&baseline.angular_momentum, &current.angular_momentum),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticSample {
    pub step: usize,
    pub time: f64,
    pub invariants: Invariants,
    pub drift: Drift,
}

/// Per-recorded-step diagnostics of one run.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticHistory {
    samples: Vec<DiagnosticSample>,
}

impl DiagnosticHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Measure `state` and append it. The first sample becomes the baseline.
    pub fn record(&mut self, step: usize, state: &SystemState, config: &SimulationConfig) -> &DiagnosticSample {
        let invariants = Invariants::measure(state, config);
        let drift = match self.samples.first() {
            Some(first) => Drift::between(&first.invariants, &invariants),
            None => Drift::default(),
        };

        self.samples.push(DiagnosticSample {
            step,
            time: state.t,
            invariants,
            drift,
        });
        &self.samples[self.samples.len() - 1]
    }

    pub fn samples(&self) -> &[DiagnosticSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&DiagnosticSample> {
        self.samples.last()
    }

    pub fn steps(&self) -> Vec<usize> {
        self.samples.iter().map(|s| s.step).collect()
    }

    pub fn energy(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.invariants.energy()).collect()
    }

    pub fn energy_drift(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.drift.energy).collect()
    }

    pub fn center_of_mass_drift(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.drift.center_of_mass).collect()
    }

    pub fn momentum_drift(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.drift.momentum).collect()
    }

    pub fn angular_momentum_drift(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.drift.angular_momentum).collect()
    }
}

pub fn relative_drift(baseline: f64, current: f64) -> f64 {
    let diff = current - baseline;
    if baseline.abs() > ZERO_BASELINE {
        diff / baseline.abs()
    } else {
        diff
    }
}

pub fn relative_drift_vec(baseline: &NVec3, current: &NVec3) -> f64 {
    let diff = (current - baseline).norm();
    let scale = baseline.norm();
    if scale > ZERO_BASELINE {
        diff / scale
    } else {
        diff
    }
}
