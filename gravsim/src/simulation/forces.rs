//! Force / acceleration evaluation for the n-body engine
//!
//! Direct O(N^2) Newtonian gravity with a softened kernel, and the
//! [`Solver`] switch between it and the Barnes–Hut octree

use crate::error::SimError;
use crate::simulation::barnes_hut::Octree;
use crate::simulation::params::SimulationConfig;
use crate::simulation::states::{Body, NVec3};

/// Direct Newtonian gravity with softening
///
/// Returns one acceleration per body, in body order
pub fn direct_accelerations(bodies: &[Body], g: f64, softening: f64) -> Vec<NVec3> {
    let n = bodies.len();
    let mut out = vec![NVec3::zeros(); n];
    let soft2 = softening * softening;

    // Loop over each unordered pair (i, j) with i < j
    for i in 0..n {
        let bi = &bodies[i];
        for j in (i + 1)..n {
            let bj = &bodies[j];

            // r points from i to j: i is pulled along +r, j along -r
            let r = bj.x - bi.x;

            // d2 = |r|^2 + softening^2
            let d2 = r.dot(&r) + soft2;

            // coincident bodies without softening: no defined direction, skip
            if d2 == 0.0 {
                continue;
            }

            // coef = G / |r_soft|^3
            let inv_r = d2.sqrt().recip();
            let coef = g * inv_r * inv_r * inv_r;

            // a_i +=  G * m_j * r / |r_soft|^3
            // a_j += -G * m_i * r / |r_soft|^3
            out[i] += coef * bj.m * r;
            out[j] -= coef * bi.m * r;
        }
    }

    out
}

/// Softened pairwise potential energy, summed directly over all pairs
pub fn potential_energy(bodies: &[Body], g: f64, softening: f64) -> f64 {
    let soft2 = softening * softening;
    let mut pe = 0.0;
    for (i, bi) in bodies.iter().enumerate() {
        for bj in &bodies[i + 1..] {
            let r = bj.x - bi.x;
            let d2 = r.dot(&r) + soft2;
            if d2 == 0.0 {
                continue;
            }
            pe -= g * bi.m * bj.m / d2.sqrt();
        }
    }
    pe
}

/// Which force evaluation backs a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    /// Exact pairwise sum
    Direct,
    /// Octree approximation, opening angle taken from `SimulationConfig::theta`
    BarnesHut,
}

impl Solver {
    /// Accelerations for every body under `config` (G, softening, theta).
    ///
    /// A non-finite result is an error, never handed back to the integrator.
    pub fn accelerations(&self, bodies: &[Body], config: &SimulationConfig) -> Result<Vec<NVec3>, SimError> {
        let acc = match self {
            Solver::Direct => direct_accelerations(bodies, config.g, config.softening),
            Solver::BarnesHut => {
                // fresh tree every call, positions have moved since the last one
                let tree = Octree::build(bodies, config.max_tree_depth);
                (0..bodies.len())
                    .map(|i| tree.acceleration_on(i, config.theta, config.softening, config.g))
                    .collect()
            }
        };

        check_finite(&acc)?;
        Ok(acc)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Solver::Direct => "direct",
            Solver::BarnesHut => "barnes_hut",
        }
    }
}

fn check_finite(acc: &[NVec3]) -> Result<(), SimError> {
    match acc.iter().position(|a| !a.iter().all(|c| c.is_finite())) {
        Some(body) => Err(SimError::NonFiniteAcceleration { body }),
        None => Ok(()),
    }
}
