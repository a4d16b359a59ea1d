//! Simulation driver
//!
//! Owns the configuration, the integrator/solver pair, the current state,
//! the diagnostic history and the frame buffer, and runs the fixed-length
//! step loop.

use log::{debug, info, warn};

use crate::error::SimError;
use super::diagnostics::DiagnosticHistory;
use super::forces::Solver;
use super::integrator::Integrator;
use super::params::{SimulationConfig, LONG_RUN_STEPS, LONG_RUN_TIME};
use super::states::{NVec3, SystemState};

/// Position-only snapshot of every body after a step.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub step: usize,
    pub time: f64,
    pub positions: Vec<NVec3>,
}

#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    integrator: Integrator,
    solver: Solver,
    state: SystemState,
    diagnostics: DiagnosticHistory,
    frames: Vec<Frame>,
    steps_taken: usize,
    finished: bool,
}

impl Simulation {
    /// Validate the configuration and initial bodies and set up a run.
    pub fn new(
        state: SystemState,
        config: SimulationConfig,
        integrator: Integrator,
        solver: Solver,
    ) -> Result<Self, SimError> {
        config.validate()?;
        if solver == Solver::BarnesHut {
            config.validate_tree()?;
        }
        validate_bodies(&state)?;

        if config.total_time() > LONG_RUN_TIME {
            warn!(
                "total simulated time = {:.2}, this may be slow or unstable",
                config.total_time()
            );
        }
        if config.timesteps > LONG_RUN_STEPS {
            warn!("steps = {}, this may take a long time to run", config.timesteps);
        }

        Ok(Self {
            config,
            integrator,
            solver,
            state,
            diagnostics: DiagnosticHistory::new(),
            frames: Vec::new(),
            steps_taken: 0,
            finished: false,
        })
    }

    /// Run exactly `config.timesteps` steps.
    ///
    /// The first failing step aborts the run; the state stays at the last
    /// completed step. A simulation runs once: after it finishes or aborts,
    /// `run` returns [`SimError::AlreadyRun`].
    pub fn run(&mut self) -> Result<(), SimError> {
        if self.finished {
            return Err(SimError::AlreadyRun);
        }
        self.finished = true;

        info!(
            "running {} bodies for {} steps (dt = {}, solver = {}, integrator = {})",
            self.state.len(),
            self.config.timesteps,
            self.config.dt,
            self.solver.name(),
            self.integrator.name(),
        );

        while self.steps_taken < self.config.timesteps {
            if let Err(e) = self.advance() {
                warn!("aborted after {} of {} steps: {e}", self.steps_taken, self.config.timesteps);
                return Err(e);
            }
        }

        match self.diagnostics.last() {
            Some(last) => info!(
                "finished at t = {:.4}, energy = {:.6e}, relative energy drift = {:.3e}",
                self.state.t,
                last.invariants.energy(),
                last.drift.energy,
            ),
            None => info!("finished at t = {:.4}", self.state.t),
        }

        Ok(())
    }

    /// One step, followed by any diagnostics / frame capture due after it.
    fn advance(&mut self) -> Result<(), SimError> {
        let solver = self.solver;
        let config = &self.config;
        let next = self
            .integrator
            .step(&self.state, config, |bodies| solver.accelerations(bodies, config))?;

        self.state = next;
        self.steps_taken += 1;
        let step = self.steps_taken;

        if self.config.diagnostics.matches(step) {
            let sample = self.diagnostics.record(step, &self.state, &self.config);
            debug!(
                "step {step}: energy = {:.6e}, drift = {:.3e}",
                sample.invariants.energy(),
                sample.drift.energy
            );
        }

        if self.config.frames.matches(step) {
            self.frames.push(Frame {
                step,
                time: self.state.t,
                positions: self.state.positions(),
            });
            debug!("step {step}: recorded frame {}", self.frames.len());
        }

        Ok(())
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn into_state(self) -> SystemState {
        self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn integrator(&self) -> Integrator {
        self.integrator
    }

    pub fn solver(&self) -> Solver {
        self.solver
    }

    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Recorded frames, or [`SimError::NoFrames`] if none were captured.
    pub fn frames(&self) -> Result<&[Frame], SimError> {
        if self.frames.is_empty() {
            return Err(SimError::NoFrames);
        }
        Ok(&self.frames)
    }

    /// Recorded diagnostics, or [`SimError::NoDiagnostics`] if none were captured.
    pub fn diagnostics(&self) -> Result<&DiagnosticHistory, SimError> {
        if self.diagnostics.is_empty() {
            return Err(SimError::NoDiagnostics);
        }
        Ok(&self.diagnostics)
    }
}

fn validate_bodies(state: &SystemState) -> Result<(), SimError> {
    for (index, b) in state.bodies.iter().enumerate() {
        let reason = if !b.m.is_finite() || b.m <= 0.0 {
            format!("mass must be positive and finite, got {}", b.m)
        } else if !b.x.iter().all(|c| c.is_finite()) {
            "position is not finite".to_string()
        } else if !b.v.iter().all(|c| c.is_finite()) {
            "velocity is not finite".to_string()
        } else {
            continue;
        };
        return Err(SimError::InvalidBody { index, reason });
    }
    Ok(())
}
