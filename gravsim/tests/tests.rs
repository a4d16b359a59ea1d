use gravsim::simulation::barnes_hut::{octant, ROOT};
use gravsim::{
    direct_accelerations, potential_energy, Body, Integrator, NVec3, NodeContents, Octree, SimError,
    SimulationConfig, Solver, SystemState,
};

use approx::assert_relative_eq;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

/// Build a simple 2-body system separated along x-axis
pub fn two_body_system(dist: f64, m1: f64, m2: f64) -> SystemState {
    SystemState::new(vec![
        Body::new(m1, [-dist / 2.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
        Body::new(m2, [dist / 2.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
    ])
}

/// Seeded random cluster inside a ball of radius `radius`
pub fn random_cluster(n: usize, seed: u64, radius: f64) -> Vec<Body> {
    let mut rng = ChaChaRng::seed_from_u64(seed);
    let mut bodies = Vec::with_capacity(n);
    while bodies.len() < n {
        let x = NVec3::new(
            rng.gen_range(-radius..radius),
            rng.gen_range(-radius..radius),
            rng.gen_range(-radius..radius),
        );
        if x.norm() > radius {
            continue;
        }
        let v = NVec3::new(
            rng.gen_range(-0.05..0.05),
            rng.gen_range(-0.05..0.05),
            rng.gen_range(-0.05..0.05),
        );
        bodies.push(Body { x, v, m: rng.gen_range(1e-3..1e-2) });
    }
    bodies
}

/// Largest per-body discrepancy, scaled by the mean direct acceleration
fn max_scaled_error(direct: &[NVec3], approx: &[NVec3]) -> f64 {
    let scale = direct.iter().map(|a| a.norm()).sum::<f64>() / direct.len() as f64;
    direct
        .iter()
        .zip(approx)
        .map(|(d, b)| (d - b).norm() / scale)
        .fold(0.0, f64::max)
}

fn barnes_hut_accelerations(bodies: &[Body], theta: f64, softening: f64) -> Vec<NVec3> {
    let config = SimulationConfig::new(0.001, 1, softening).with_theta(theta);
    Solver::BarnesHut.accelerations(bodies, &config).expect("finite accelerations")
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let sys = two_body_system(1.0, 2.0, 3.0);
    let acc = direct_accelerations(&sys.bodies, 0.1, 0.0);

    let net = acc[0] * sys.bodies[0].m + acc[1] * sys.bodies[1].m;

    assert!(net.norm() < 1e-12, "Net momentum not zero: {:?}", net);
}

#[test]
fn gravity_points_toward_other_body() {
    let sys = two_body_system(2.0, 1.0, 1.0);
    let acc = direct_accelerations(&sys.bodies, 0.1, 0.0);

    let dx = sys.bodies[1].x - sys.bodies[0].x;

    assert!(acc[0].dot(&dx) > 0.0, "Acceleration is not toward second body");
    assert!(acc[1].dot(&dx) < 0.0, "Acceleration is not toward first body");
}

#[test]
fn gravity_inverse_square_law() {
    let sys_r = two_body_system(1.0, 1.0, 1.0);
    let sys_2r = two_body_system(2.0, 1.0, 1.0);

    let acc_r = direct_accelerations(&sys_r.bodies, 0.1, 0.0);
    let acc_2r = direct_accelerations(&sys_2r.bodies, 0.1, 0.0);

    let ratio = acc_r[0].norm() / acc_2r[0].norm();

    assert!((ratio - 4.0).abs() < 1e-3, "Expected ~4x, got {}", ratio);
}

#[test]
fn gravity_magnitude_matches_newton() {
    let bodies = vec![
        Body::new(1.0, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
        Body::new(2.0, [3.0, 4.0, 0.0], [0.0, 0.0, 0.0]),
    ];
    let acc = direct_accelerations(&bodies, 1.0, 0.0);

    // |a| = G m_b / r^2 = 2 / 25, along (0.6, 0.8)
    assert_relative_eq!(acc[0].x, 0.048, max_relative = 1e-12);
    assert_relative_eq!(acc[0].y, 0.064, max_relative = 1e-12);
    assert_eq!(acc[0].z, 0.0);
}

#[test]
fn gravity_softening_prevents_blowup() {
    let sys = two_body_system(1e-9, 1.0, 1.0);
    let acc = direct_accelerations(&sys.bodies, 0.1, 0.3);

    assert!(acc[0].norm() < 1e9, "Softening failed; acceleration too large");
}

#[test]
fn gravity_coincident_bodies_without_softening_feel_nothing() {
    let bodies = vec![
        Body::new(1.0, [1.0, 1.0, 1.0], [0.0, 0.0, 0.0]),
        Body::new(1.0, [1.0, 1.0, 1.0], [0.0, 0.0, 0.0]),
    ];
    let acc = direct_accelerations(&bodies, 1.0, 0.0);

    assert_eq!(acc[0], NVec3::zeros());
    assert_eq!(acc[1], NVec3::zeros());
    assert_eq!(potential_energy(&bodies, 1.0, 0.0), 0.0);
}

#[test]
fn gravity_potential_energy_of_pair() {
    let sys = two_body_system(2.0, 2.0, 3.0);

    assert_relative_eq!(potential_energy(&sys.bodies, 1.0, 0.0), -3.0, max_relative = 1e-12);
    // softened: -G m1 m2 / sqrt(r^2 + eps^2)
    assert_relative_eq!(
        potential_energy(&sys.bodies, 1.0, 1.5),
        -6.0 / 2.5,
        max_relative = 1e-12
    );
}

#[test]
fn solver_rejects_non_finite_accelerations() {
    let sys = two_body_system(1e-160, 1.0, 1.0);
    let config = SimulationConfig::new(0.001, 1, 0.0);

    for solver in [Solver::Direct, Solver::BarnesHut] {
        let err = solver.accelerations(&sys.bodies, &config).unwrap_err();
        assert!(
            matches!(err, SimError::NonFiniteAcceleration { .. }),
            "{}: unexpected {:?}",
            solver.name(),
            err
        );
    }
}

// ==================================================================================
// Barnes-hut tests
// ==================================================================================

#[test]
fn octree_root_mass_is_insertion_order_independent() {
    let bodies = random_cluster(300, 7, 3.0);
    let expected: f64 = bodies.iter().map(|b| b.m).sum();
    let expected_com = bodies.iter().fold(NVec3::zeros(), |acc, b| acc + b.m * b.x) / expected;

    let mut shuffled = bodies.clone();
    shuffled.shuffle(&mut ChaChaRng::seed_from_u64(99));

    let tree = Octree::build(&bodies, 32);
    let tree_shuffled = Octree::build(&shuffled, 32);

    assert_relative_eq!(tree.total_mass(), expected, max_relative = 1e-12);
    assert_relative_eq!(tree_shuffled.total_mass(), expected, max_relative = 1e-12);
    assert!((tree.center_of_mass() - expected_com).norm() < 1e-10);
    assert!((tree_shuffled.center_of_mass() - expected_com).norm() < 1e-10);
}

#[test]
fn octree_single_body_is_a_leaf_with_no_self_force() {
    let bodies = vec![Body::new(2.5, [1.0, -2.0, 0.5], [0.0, 0.0, 0.0])];
    let tree = Octree::build(&bodies, 32);

    assert_eq!(tree.nodes().len(), 1);
    assert_eq!(tree.root().contents, NodeContents::Leaf(0));
    assert_eq!(tree.root().com, bodies[0].x);
    assert_eq!(tree.acceleration_on(0, 0.5, 0.0, 1.0), NVec3::zeros());
}

#[test]
fn octree_splits_leaf_into_octants() {
    let bodies = vec![
        Body::new(1.0, [-1.0, -1.0, -1.0], [0.0, 0.0, 0.0]),
        Body::new(3.0, [1.0, 1.0, 1.0], [0.0, 0.0, 0.0]),
    ];
    let tree = Octree::build(&bodies, 32);
    let nodes = tree.nodes();

    let children = match &tree.root().contents {
        NodeContents::Internal(children) => *children,
        other => panic!("root should be internal, got {:?}", other),
    };
    assert_eq!(nodes.len(), 9);
    assert_eq!(nodes[children[0]].contents, NodeContents::Leaf(0));
    assert_eq!(nodes[children[7]].contents, NodeContents::Leaf(1));
    assert_eq!(octant(&tree.root().center, &bodies[1].x), 7);

    // children are half the size, offset a quarter of the parent's edge
    let root = tree.root();
    for &c in &children {
        assert_relative_eq!(nodes[c].half_size, 0.5 * root.half_size, max_relative = 1e-15);
        assert!(root.contains(&nodes[c]));
    }

    // com weighted toward the heavier body
    assert_relative_eq!(root.mass, 4.0);
    assert_relative_eq!(root.com.x, 0.5, max_relative = 1e-12);
}

#[test]
fn octree_internal_mass_is_sum_of_children() {
    let bodies = random_cluster(200, 3, 2.0);
    let tree = Octree::build(&bodies, 32);
    let nodes = tree.nodes();

    for node in nodes {
        match &node.contents {
            NodeContents::Internal(children) => {
                let sum: f64 = children.iter().map(|&c| nodes[c].mass).sum();
                assert_relative_eq!(node.mass, sum, max_relative = 1e-12);
            }
            NodeContents::Leaf(i) => {
                assert_eq!(node.mass, bodies[*i].m);
                assert_eq!(node.com, bodies[*i].x);
                let offset = bodies[*i].x - node.center;
                assert!(offset.iter().all(|d| d.abs() <= node.half_size));
            }
            NodeContents::Empty => assert_eq!(node.mass, 0.0),
            NodeContents::Aggregate(_) => panic!("no aggregates expected for distinct bodies"),
        }
    }
}

#[test]
fn octree_coincident_bodies_hit_depth_limit() {
    let mut bodies: Vec<Body> = (0..10)
        .map(|_| Body::new(1.0, [1.0, 1.0, 1.0], [0.0, 0.0, 0.0]))
        .collect();
    bodies.push(Body::new(1.0, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]));

    let tree = Octree::build(&bodies, 8);

    assert!(tree.depth() <= 8);
    assert_relative_eq!(tree.total_mass(), 11.0);

    let aggregate = tree
        .nodes()
        .iter()
        .find_map(|n| match &n.contents {
            NodeContents::Aggregate(members) => Some((n, members.clone())),
            _ => None,
        })
        .expect("coincident bodies should end up aggregated");
    assert_eq!(aggregate.1, (0..10).collect::<Vec<_>>());
    assert_relative_eq!(aggregate.0.mass, 10.0);

    let config = SimulationConfig::new(0.001, 1, 0.01);
    let acc = Solver::BarnesHut.accelerations(&bodies, &config).expect("finite");
    // the lone body at the origin is pulled toward the aggregate
    assert!(acc[10].x > 0.0 && acc[10].y > 0.0 && acc[10].z > 0.0);
}

#[test]
fn octree_coincident_members_match_direct_without_softening() {
    // non-dyadic coordinates, so a center of mass rebuilt by subtraction would not land exactly
    let bodies = vec![
        Body::new(1.0, [0.1, 0.7, 0.3], [0.0, 0.0, 0.0]),
        Body::new(1.0, [0.1, 0.7, 0.3], [0.0, 0.0, 0.0]),
        Body::new(1.0, [0.1, 0.7, 0.3], [0.0, 0.0, 0.0]),
        Body::new(1.0, [5.0, 5.0, 5.0], [0.0, 0.0, 0.0]),
    ];
    let direct = direct_accelerations(&bodies, 1.0, 0.0);
    let bh = barnes_hut_accelerations(&bodies, 0.7, 0.0);

    for (d, b) in direct.iter().zip(&bh) {
        assert!(d.norm() < 1.0);
        assert!((d - b).norm() <= 1e-12 * d.norm(), "direct {:?} vs tree {:?}", d, b);
    }
}

#[test]
fn octree_theta_zero_matches_direct() {
    let bodies = random_cluster(200, 11, 3.0);
    let direct = direct_accelerations(&bodies, 1.0, 0.01);
    let bh = barnes_hut_accelerations(&bodies, 0.0, 0.01);

    for (d, b) in direct.iter().zip(&bh) {
        assert!((d - b).norm() <= 1e-10 * d.norm().max(1e-12), "direct {:?} vs tree {:?}", d, b);
    }
}

#[test]
fn octree_error_shrinks_with_theta() {
    let bodies = random_cluster(500, 42, 3.0);
    let direct = direct_accelerations(&bodies, 1.0, 0.01);

    let err_07 = max_scaled_error(&direct, &barnes_hut_accelerations(&bodies, 0.7, 0.01));
    let err_04 = max_scaled_error(&direct, &barnes_hut_accelerations(&bodies, 0.4, 0.01));
    let err_01 = max_scaled_error(&direct, &barnes_hut_accelerations(&bodies, 0.1, 0.01));

    assert!(err_07 < 0.2, "theta 0.7 error too large: {err_07}");
    assert!(err_01 < 0.02, "theta 0.1 error too large: {err_01}");
    assert!(err_01 < err_04 && err_04 < err_07, "errors: {err_01} {err_04} {err_07}");
}

#[test]
fn octree_smaller_theta_never_coarser() {
    let bodies = random_cluster(200, 5, 3.0);
    let tree = Octree::build(&bodies, 32);
    let nodes = tree.nodes();

    for i in (0..bodies.len()).step_by(17) {
        let coarse = tree.interaction_list(i, 0.9, 0.01);
        let fine = tree.interaction_list(i, 0.3, 0.01);

        assert!(fine.len() >= coarse.len());
        for &f in &fine {
            assert!(
                coarse.iter().any(|&c| nodes[c].contains(&nodes[f])),
                "node {f} for body {i} is not under any coarse node"
            );
        }
    }
}

#[test]
fn octree_root_index_is_zero() {
    let bodies = random_cluster(20, 1, 1.0);
    let tree = Octree::build(&bodies, 32);
    assert_eq!(tree.nodes()[ROOT].mass, tree.total_mass());
}

// ==================================================================================
// Integrator tests
// ==================================================================================

fn constant_accel(a: NVec3) -> impl FnMut(&[Body]) -> Result<Vec<NVec3>, SimError> {
    move |bodies| Ok(vec![a; bodies.len()])
}

fn single_body_state() -> SystemState {
    SystemState::new(vec![Body::new(1.0, [0.0, 0.0, 0.0], [1.0, 2.0, 0.0])])
}

#[test]
fn leapfrog_exact_under_constant_acceleration() {
    let state = single_body_state();
    let config = SimulationConfig::new(0.1, 1, 0.0);

    let next = Integrator::Leapfrog
        .step(&state, &config, constant_accel(NVec3::new(0.0, -1.0, 0.0)))
        .unwrap();

    // x = v0 t + a t^2 / 2, v = v0 + a t
    let b = next.bodies[0];
    assert_relative_eq!(b.x.x, 0.1, max_relative = 1e-12);
    assert_relative_eq!(b.x.y, 0.195, max_relative = 1e-12);
    assert_relative_eq!(b.v.x, 1.0, max_relative = 1e-12);
    assert_relative_eq!(b.v.y, 1.9, max_relative = 1e-12);
    assert_relative_eq!(next.t, 0.1);
}

#[test]
fn euler_uses_pre_step_velocity() {
    let state = single_body_state();
    let config = SimulationConfig::new(0.1, 1, 0.0);

    let next = Integrator::Euler
        .step(&state, &config, constant_accel(NVec3::new(0.0, -1.0, 0.0)))
        .unwrap();

    let b = next.bodies[0];
    assert_relative_eq!(b.x.x, 0.1, max_relative = 1e-12);
    assert_relative_eq!(b.x.y, 0.2, max_relative = 1e-12);
    assert_relative_eq!(b.v.y, 1.9, max_relative = 1e-12);
}

#[test]
fn integrators_evaluate_forces_expected_number_of_times() {
    let state = two_body_system(1.0, 1.0, 1.0);
    let config = SimulationConfig::new(0.01, 1, 0.0);

    for integrator in [Integrator::Euler, Integrator::Leapfrog] {
        let mut calls = 0;
        integrator
            .step(&state, &config, |bodies| {
                calls += 1;
                Ok(direct_accelerations(bodies, 1.0, 0.0))
            })
            .unwrap();
        assert_eq!(calls, integrator.evaluations_per_step());
    }
}

#[test]
fn leapfrog_second_kick_uses_drifted_positions() {
    let state = two_body_system(1.0, 1.0, 1.0);
    let config = SimulationConfig::new(0.01, 1, 0.0);

    let mut seen = Vec::new();
    let next = Integrator::Leapfrog
        .step(&state, &config, |bodies| {
            seen.push(bodies[0].x);
            Ok(direct_accelerations(bodies, 1.0, 0.0))
        })
        .unwrap();

    assert_eq!(seen[0], state.bodies[0].x);
    assert_eq!(seen[1], next.bodies[0].x);
}

#[test]
fn integrator_step_leaves_input_untouched() {
    let state = two_body_system(1.0, 1.0, 1.0);
    let before = state.clone();
    let config = SimulationConfig::new(0.01, 1, 0.0);

    let next = Integrator::Leapfrog
        .step(&state, &config, |bodies| Ok(direct_accelerations(bodies, 1.0, 0.0)))
        .unwrap();

    assert_eq!(state, before);
    assert_eq!(next.len(), state.len());
    assert_eq!(next.bodies[1].m, state.bodies[1].m);
}

#[test]
fn integrator_propagates_force_errors() {
    let state = two_body_system(1.0, 1.0, 1.0);
    let config = SimulationConfig::new(0.01, 1, 0.0);

    for integrator in [Integrator::Euler, Integrator::Leapfrog] {
        let err = integrator
            .step(&state, &config, |_| Err(SimError::NonFiniteAcceleration { body: 1 }))
            .unwrap_err();
        assert_eq!(err, SimError::NonFiniteAcceleration { body: 1 });
    }
}
