//! Core state types for the N-body simulation.
//!
//! - `Body` is one point mass (position `x`, velocity `v`, mass `m`)
//! - `SystemState` is the ordered list of bodies plus the current time `t`
//!
//! Body order is preserved 1:1 across steps: body `k` of the next state is
//! the successor of body `k` of the current one.

use nalgebra::Vector3;
pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    pub m: f64, // mass
}

impl Body {
    pub fn new(m: f64, x: [f64; 3], v: [f64; 3]) -> Self {
        Self {
            x: x.into(),
            v: v.into(),
            m,
        }
    }

    /// Same mass and position, different velocity.
    pub fn with_velocity(&self, v: NVec3) -> Self {
        Self { v, ..*self }
    }

    pub fn momentum(&self) -> NVec3 {
        self.m * self.v
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.m * self.v.norm_squared()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemState {
    pub bodies: Vec<Body>, // collection of bodies, order is stable
    pub t: f64, // time
}

impl SystemState {
    pub fn new(bodies: Vec<Body>) -> Self {
        Self { bodies, t: 0.0 }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.m).sum()
    }

    /// Position-only snapshot, in body order.
    pub fn positions(&self) -> Vec<NVec3> {
        self.bodies.iter().map(|b| b.x).collect()
    }
}
