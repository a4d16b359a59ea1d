pub mod configuration;
pub mod error;
pub mod simulation;

pub use error::SimError;

pub use simulation::barnes_hut::{NodeContents, Octree, OctreeNode};
pub use simulation::diagnostics::{DiagnosticHistory, DiagnosticSample, Drift, Invariants};
pub use simulation::engine::{Frame, Simulation};
pub use simulation::forces::{direct_accelerations, potential_energy, Solver};
pub use simulation::integrator::Integrator;
pub use simulation::params::{Cadence, SimulationConfig};
pub use simulation::scenario::Scenario;
pub use simulation::states::{Body, NVec3, SystemState};

pub use configuration::config::{
    BodyConfig, CadenceConfig, EngineConfig, IntegratorConfig, ParametersConfig, ScenarioConfig,
    SolverConfig,
};
