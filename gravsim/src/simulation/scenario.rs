//! Build a ready-to-run simulation from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! consumed by the driver:
//! - runtime parameters (`SimulationConfig`)
//! - system state (`SystemState` with bodies at t = 0)
//! - integrator and solver choice

use crate::configuration::config::{BodyConfig, ScenarioConfig};
use crate::error::SimError;
use crate::simulation::engine::Simulation;
use crate::simulation::forces::Solver;
use crate::simulation::integrator::Integrator;
use crate::simulation::params::SimulationConfig;
use crate::simulation::states::{Body, SystemState};

#[derive(Debug, Clone)]
pub struct Scenario {
    pub config: SimulationConfig,
    pub integrator: Integrator,
    pub solver: Solver,
    pub system: SystemState,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Self {
        // Bodies: map `BodyConfig` -> runtime `Body`
        let bodies: Vec<Body> = cfg
            .bodies
            .iter()
            .map(|bc: &BodyConfig| Body::new(bc.m, bc.x, bc.v))
            .collect();

        let p_cfg = cfg.parameters;
        let e_cfg = cfg.engine;
        let config = SimulationConfig {
            dt: p_cfg.dt,
            timesteps: p_cfg.timesteps,
            softening: p_cfg.softening,
            theta: e_cfg.theta,
            g: p_cfg.g,
            max_tree_depth: e_cfg.max_tree_depth,
            diagnostics: p_cfg.diagnostics.into(),
            frames: p_cfg.frames.into(),
        };

        Self {
            config,
            integrator: e_cfg.integrator.into(),
            solver: e_cfg.solver.into(),
            system: SystemState::new(bodies),
        }
    }

    /// Validate and hand over to the driver.
    pub fn into_simulation(self) -> Result<Simulation, SimError> {
        Simulation::new(self.system, self.config, self.integrator, self.solver)
    }
}
