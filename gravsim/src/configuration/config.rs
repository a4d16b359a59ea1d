//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – integrator, solver and Barnes–Hut options
//! - [`ParametersConfig`] – step size, run length, softening, G, recording
//! - [`BodyConfig`]       – initial state for each body
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   integrator: leapfrog    # or "euler"
//!   solver: barnes_hut      # or "direct"
//!   theta: 0.5              # optional, default 0.7
//!   max_tree_depth: 32      # optional
//!
//! parameters:
//!   dt: 0.002
//!   timesteps: 4000
//!   softening: 1.0e-3
//!   G: 1.0                  # optional, default 1.0
//!   diagnostics:            # optional, off by default
//!     enabled: true
//!     every: 10
//!   frames:                 # optional, off by default
//!     enabled: true
//!     every: 5
//!
//! bodies:
//!   - m: 1.0
//!     x: [-0.5, 0.0, 0.0]
//!     v: [0.0, -0.7071, 0.0]
//!   - m: 1.0
//!     x: [0.5, 0.0, 0.0]
//!     v: [0.0, 0.7071, 0.0]
//! ```
//!
//! [`crate::Scenario`] maps this configuration into the runtime types.

use serde::Deserialize;

use crate::simulation::forces::Solver;
use crate::simulation::integrator::Integrator;
use crate::simulation::params::{Cadence, DEFAULT_MAX_TREE_DEPTH, DEFAULT_THETA};

/// `integrator: "euler"` or `integrator: "leapfrog"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorConfig {
    #[serde(rename = "euler")] // explicit first order, energy drifts
    Euler,

    #[serde(rename = "leapfrog")] // kick-drift-kick, symplectic
    Leapfrog,
}

impl From<IntegratorConfig> for Integrator {
    fn from(cfg: IntegratorConfig) -> Self {
        match cfg {
            IntegratorConfig::Euler => Integrator::Euler,
            IntegratorConfig::Leapfrog => Integrator::Leapfrog,
        }
    }
}

/// `solver: "direct"` or `solver: "barnes_hut"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverConfig {
    #[serde(rename = "direct")] // exact N^2 summation
    Direct,

    #[serde(rename = "barnes_hut", alias = "barneshut")] // octree approximation
    BarnesHut,
}

impl From<SolverConfig> for Solver {
    fn from(cfg: SolverConfig) -> Self {
        match cfg {
            SolverConfig::Direct => Solver::Direct,
            SolverConfig::BarnesHut => Solver::BarnesHut,
        }
    }
}

/// High-level engine configuration
#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    pub integrator: IntegratorConfig, // time integrator
    pub solver: SolverConfig, // force evaluation
    #[serde(default = "default_theta")]
    pub theta: f64, // opening angle, ignored by the direct solver
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: u32, // octree subdivision limit
}

/// Recording switch + cadence for diagnostics or frames
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct CadenceConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_every")]
    pub every: usize,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self { enabled: false, every: default_every() }
    }
}

impl From<CadenceConfig> for Cadence {
    fn from(cfg: CadenceConfig) -> Self {
        Cadence { enabled: cfg.enabled, every: cfg.every }
    }
}

/// Numerical and physical parameters for a scenario
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub dt: f64, // time step size
    pub timesteps: usize, // number of steps
    pub softening: f64, // softening length, keeps close encounters finite
    #[serde(rename = "G", default = "default_g")]
    pub g: f64, // gravitational constant
    #[serde(default)]
    pub diagnostics: CadenceConfig,
    #[serde(default)]
    pub frames: CadenceConfig,
}

/// Initial state of a single body
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub m: f64, // mass
    pub x: [f64; 3], // initial position
    #[serde(default)]
    pub v: [f64; 3], // initial velocity, at rest if omitted
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    pub parameters: ParametersConfig,
    pub bodies: Vec<BodyConfig>,
}

impl ScenarioConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }

    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }
}

fn default_theta() -> f64 {
    DEFAULT_THETA
}

fn default_max_tree_depth() -> u32 {
    DEFAULT_MAX_TREE_DEPTH
}

fn default_g() -> f64 {
    1.0
}

fn default_every() -> usize {
    1
}
