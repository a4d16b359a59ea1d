//! Numerical and physical parameters for a run
//!
//! `SimulationConfig` holds runtime settings:
//! - step size `dt` and number of steps,
//! - softening length and gravitational constant `g`,
//! - Barnes–Hut opening angle `theta` and octree depth limit,
//! - diagnostics / frame recording switches and cadence

use crate::error::SimError;

/// Default opening angle for the Barnes–Hut solver.
pub const DEFAULT_THETA: f64 = 0.7;

/// Default octree depth limit. A cube at this depth is `2^-32` of the root size.
pub const DEFAULT_MAX_TREE_DEPTH: u32 = 32;

/// Total simulated time above which a run is flagged as likely slow or unstable
pub const LONG_RUN_TIME: f64 = 50.0;

/// Step count above which a run is flagged as likely slow
pub const LONG_RUN_STEPS: usize = 100_000;

/// Record something every `every` steps (1-based step count).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cadence {
    pub enabled: bool,
    pub every: usize,
}

impl Cadence {
    pub fn off() -> Self {
        Self { enabled: false, every: 1 }
    }

    pub fn every(every: usize) -> Self {
        Self { enabled: true, every }
    }

    /// `step` is the number of steps completed so far.
    pub fn matches(&self, step: usize) -> bool {
        self.enabled && self.every > 0 && step % self.every == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub dt: f64, // time step
    pub timesteps: usize, // number of steps in a run
    pub softening: f64, // softening length (not squared)
    pub theta: f64, // opening angle, barnes-hut only
    pub g: f64, // gravitational constant
    pub max_tree_depth: u32, // octree subdivision limit
    pub diagnostics: Cadence,
    pub frames: Cadence,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.002,
            timesteps: 2000,
            softening: 1e-3,
            theta: DEFAULT_THETA,
            g: 1.0,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            diagnostics: Cadence::off(),
            frames: Cadence::off(),
        }
    }
}

impl SimulationConfig {
    pub fn new(dt: f64, timesteps: usize, softening: f64) -> Self {
        Self {
            dt,
            timesteps,
            softening,
            ..Self::default()
        }
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_g(mut self, g: f64) -> Self {
        self.g = g;
        self
    }

    pub fn with_diagnostics(mut self, every: usize) -> Self {
        self.diagnostics = Cadence::every(every);
        self
    }

    pub fn with_frames(mut self, every: usize) -> Self {
        self.frames = Cadence::every(every);
        self
    }

    pub fn total_time(&self) -> f64 {
        self.dt * self.timesteps as f64
    }

    /// Reject anything the run loop cannot safely start with. Octree
    /// settings are checked separately by [`Self::validate_tree`].
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimError::config("dt", format!("must be positive and finite, got {}", self.dt)));
        }
        if self.timesteps == 0 {
            return Err(SimError::config("timesteps", "must be greater than zero"));
        }
        if !self.softening.is_finite() || self.softening < 0.0 {
            return Err(SimError::config(
                "softening",
                format!("must be non-negative and finite, got {}", self.softening),
            ));
        }
        if !self.g.is_finite() || self.g <= 0.0 {
            return Err(SimError::config("g", format!("must be positive and finite, got {}", self.g)));
        }
        if self.diagnostics.enabled && self.diagnostics.every == 0 {
            return Err(SimError::config("diagnostics.every", "must be at least 1"));
        }
        if self.frames.enabled && self.frames.every == 0 {
            return Err(SimError::config("frames.every", "must be at least 1"));
        }
        Ok(())
    }

    /// Octree settings, only read by the Barnes–Hut solver.
    pub fn validate_tree(&self) -> Result<(), SimError> {
        if !self.theta.is_finite() || self.theta <= 0.0 {
            return Err(SimError::config("theta", format!("must be positive and finite, got {}", self.theta)));
        }
        if self.max_tree_depth == 0 {
            return Err(SimError::config("max_tree_depth", "must be at least 1"));
        }
        Ok(())
    }
}
