//! Fixed-step time integrators for the N-body system
//!
//! Both integrators take the current state and an acceleration function
//! and return the next state; the input state is never touched.

use crate::error::SimError;
use super::params::SimulationConfig;
use super::states::{Body, NVec3, SystemState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integrator {
    /// Explicit forward Euler, first order, not symplectic
    Euler,
    /// Kick-drift-kick leapfrog (velocity Verlet), second order, symplectic
    Leapfrog,
}

impl Integrator {
    /// Advance `state` by one step of `config.dt`.
    ///
    /// `accel_fn` maps a body slice to one acceleration per body; only the
    /// positions of the bodies it is handed may influence the result.
    pub fn step<F>(&self, state: &SystemState, config: &SimulationConfig, accel_fn: F) -> Result<SystemState, SimError>
    where
        F: FnMut(&[Body]) -> Result<Vec<NVec3>, SimError>,
    {
        match self {
            Integrator::Euler => euler_step(state, config.dt, accel_fn),
            Integrator::Leapfrog => leapfrog_step(state, config.dt, accel_fn),
        }
    }

    /// Force evaluations per step
    pub fn evaluations_per_step(&self) -> usize {
        match self {
            Integrator::Euler => 1,
            Integrator::Leapfrog => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Integrator::Euler => "euler",
            Integrator::Leapfrog => "leapfrog",
        }
    }
}

/// One explicit Euler step. Both updates read pre-step values only:
/// x_n+1 = x_n + dt v_n
/// v_n+1 = v_n + dt a(x_n)
fn euler_step<F>(state: &SystemState, dt: f64, mut accel_fn: F) -> Result<SystemState, SimError>
where
    F: FnMut(&[Body]) -> Result<Vec<NVec3>, SimError>,
{
    let a = accel_fn(&state.bodies)?;
    debug_assert_eq!(a.len(), state.bodies.len());

    let bodies = state
        .bodies
        .iter()
        .zip(a.iter())
        .map(|(b, a)| Body {
            x: b.x + dt * b.v,
            v: b.v + dt * *a,
            m: b.m,
        })
        .collect();

    Ok(SystemState { bodies, t: state.t + dt })
}

/// One kick-drift-kick leapfrog step, two force evaluations.
fn leapfrog_step<F>(state: &SystemState, dt: f64, mut accel_fn: F) -> Result<SystemState, SimError>
where
    F: FnMut(&[Body]) -> Result<Vec<NVec3>, SimError>,
{
    let half_dt = 0.5 * dt;

    // a_n from x_n
    let a_old = accel_fn(&state.bodies)?;
    debug_assert_eq!(a_old.len(), state.bodies.len());

    // Kick: v_n+1/2 = v_n + (dt/2) a_n
    // Drift: x_n+1 = x_n + dt v_n+1/2
    let drifted: Vec<Body> = state
        .bodies
        .iter()
        .zip(a_old.iter())
        .map(|(b, a)| {
            let v_half = b.v + half_dt * *a;
            Body {
                x: b.x + dt * v_half,
                v: v_half,
                m: b.m,
            }
        })
        .collect();

    // a_n+1 from x_n+1
    let a_new = accel_fn(&drifted)?;

    // Second kick: v_n+1 = v_n+1/2 + (dt/2) a_n+1
    let bodies = drifted
        .iter()
        .zip(a_new.iter())
        .map(|(b, a)| b.with_velocity(b.v + half_dt * *a))
        .collect();

    Ok(SystemState { bodies, t: state.t + dt })
}
