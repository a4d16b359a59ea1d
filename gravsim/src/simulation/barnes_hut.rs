//! # Barnes–Hut Octree (3D)
//!
//! Approximates gravitational acceleration in an `N`-body system by
//! replacing distant groups of bodies with a single pseudo-body at their
//! center of mass. This takes the `O(N²)` all-pairs sum down toward
//! `O(N log N)`.
//!
//! - Space is recursively subdivided into 8 cubic octants.
//! - Every node stores its cube (center + half-size), the total mass of its
//!   subtree and the mass-weighted center of mass (COM).
//! - A node is empty, a leaf holding one body, internal with exactly 8
//!   children, or an aggregate at the depth limit holding several bodies.
//!
//! Nodes live in one arena (`Vec<OctreeNode>`) and refer to each other by
//! index. Insertion and force queries are both loops over that arena, so a
//! pathological body layout cannot blow the call stack.
//!
//! The tree borrows the body slice it was built from and is meant to be
//! thrown away after the step that built it.

use crate::simulation::states::{Body, NVec3};

/// Index of the root node in [`Octree::nodes`]
pub const ROOT: usize = 0;

/// Fraction added to the root half-size so bodies on the bounding box
/// boundary sit strictly inside the root cube
const ROOT_MARGIN: f64 = 1e-3;

/// What a node holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NodeContents {
    #[default]
    Empty,
    /// Exactly one body, by index into the source slice
    Leaf(usize),
    /// Exactly 8 children, one per octant (see [`octant`] for the layout)
    Internal([usize; 8]),
    /// Bodies that reached the depth limit; treated as one point mass
    Aggregate(Vec<usize>),
}

/// A single octree node.
#[derive(Debug, Clone)]
pub struct OctreeNode {
    pub center: NVec3,
    pub half_size: f64,
    pub mass: f64,
    pub com: NVec3,
    pub depth: u32,
    pub contents: NodeContents,
}

impl OctreeNode {
    fn new(center: NVec3, half_size: f64, depth: u32) -> Self {
        Self {
            center,
            half_size,
            mass: 0.0,
            com: NVec3::zeros(),
            depth,
            contents: NodeContents::Empty,
        }
    }

    /// Edge length of the node's cube
    pub fn size(&self) -> f64 {
        2.0 * self.half_size
    }

    /// Running mass-weighted average:
    /// `M' = M + m`, `com' = (com * M + x * m) / M'`
    fn accumulate(&mut self, x: NVec3, m: f64) {
        if self.mass == 0.0 {
            self.com = x;
            self.mass = m;
        } else {
            let total = self.mass + m;
            self.com = (self.com * self.mass + x * m) / total;
            self.mass = total;
        }
    }

    /// True if point `p` lies inside this node's cube (boundary included).
    pub fn encloses(&self, p: &NVec3) -> bool {
        (p - self.center).iter().all(|d| d.abs() <= self.half_size)
    }

    /// True if this node's cube fully contains `other`'s cube, up to rounding
    /// in the child centers.
    pub fn contains(&self, other: &OctreeNode) -> bool {
        let slack = self.half_size - other.half_size;
        let tol = 1e-9 * self.half_size;
        slack >= 0.0 && (other.center - self.center).iter().all(|d| d.abs() <= slack + tol)
    }
}

/// A 3D Barnes–Hut octree built over one snapshot of bodies.
pub struct Octree<'a> {
    bodies: &'a [Body],
    nodes: Vec<OctreeNode>,
    max_depth: u32,
}

impl<'a> Octree<'a> {
    /// Build a tree over `bodies`.
    ///
    /// The root is a cube enclosing every body with a small margin. Bodies
    /// are inserted one at a time in slice order; aggregates are updated
    /// on the way down, never recomputed in a separate pass.
    ///
    /// # Parameters
    /// - `bodies`    : snapshot to index; the tree refers to bodies by slice index
    /// - `max_depth` : deepest level that may still be subdivided; a leaf at
    ///   this depth receiving another body becomes an aggregate instead
    pub fn build(bodies: &'a [Body], max_depth: u32) -> Self {
        let (center, half_size) = root_cube(bodies);
        let mut tree = Self {
            bodies,
            nodes: vec![OctreeNode::new(center, half_size, 0)],
            max_depth,
        };

        for i in 0..bodies.len() {
            tree.insert(i);
        }

        tree
    }

    pub fn nodes(&self) -> &[OctreeNode] {
        &self.nodes
    }

    pub fn root(&self) -> &OctreeNode {
        &self.nodes[ROOT]
    }

    pub fn total_mass(&self) -> f64 {
        self.root().mass
    }

    pub fn center_of_mass(&self) -> NVec3 {
        self.root().com
    }

    /// Deepest level any node sits at.
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Net acceleration on body `body_idx` due to every other body in the tree.
    ///
    /// Starting at the root, a node is used as a single point mass at its
    /// COM when it is a leaf (or aggregate), or when
    /// `size / sqrt(d² + softening²) < theta` and its cube does not hold the
    /// body. Otherwise its non-empty children are visited. The body's own
    /// leaf contributes nothing, and an aggregate holding the body is
    /// summed member by member without it.
    ///
    /// # Parameters
    /// - `body_idx`  : index of the target body in the slice the tree was built from
    /// - `theta`     : opening angle; smaller is more accurate, `0` is exact
    /// - `softening` : softening length, same kernel as the direct solver
    /// - `g`         : gravitational constant
    pub fn acceleration_on(&self, body_idx: usize, theta: f64, softening: f64, g: f64) -> NVec3 {
        let pos = self.bodies[body_idx].x;
        let soft2 = softening * softening;
        let mut acc = NVec3::zeros();

        self.for_each_interaction(body_idx, theta, softening, |_, mass, com| {
            let r = com - pos;
            let d2 = r.dot(&r) + soft2;
            let inv_r = d2.sqrt().recip();
            acc += g * mass * inv_r * inv_r * inv_r * r;
        });

        acc
    }

    /// Nodes treated as point masses when evaluating body `body_idx`.
    ///
    /// An aggregate holding the body appears once per other member.
    pub fn interaction_list(&self, body_idx: usize, theta: f64, softening: f64) -> Vec<usize> {
        let mut list = Vec::new();
        self.for_each_interaction(body_idx, theta, softening, |idx, _, _| list.push(idx));
        list
    }

    // helpers ==============================================================================

    /// Insert body `body_idx`, walking down from the root.
    ///
    /// - empty node      -> becomes a leaf holding the body
    /// - leaf node       -> split into 8 octants, the resident body moves into
    ///   its octant, and the walk continues with the new body
    /// - internal node   -> walk into the octant containing the body
    /// - aggregate node  -> body joins the aggregate
    ///
    /// Every node visited on the way has its mass / COM updated with the
    /// new body. A resident body moved out of a split leaf is already
    /// counted in that leaf, so only the child it lands in is updated.
    fn insert(&mut self, body_idx: usize) {
        let bodies = self.bodies;
        let body = &bodies[body_idx];
        let max_depth = self.max_depth;
        let mut node_idx = ROOT;

        loop {
            let node = &mut self.nodes[node_idx];
            node.accumulate(body.x, body.m);
            let center = node.center;

            match std::mem::take(&mut node.contents) {
                NodeContents::Empty => {
                    node.contents = NodeContents::Leaf(body_idx);
                    return;
                }
                NodeContents::Aggregate(mut members) => {
                    members.push(body_idx);
                    node.contents = NodeContents::Aggregate(members);
                    return;
                }
                NodeContents::Internal(children) => {
                    node.contents = NodeContents::Internal(children);
                    node_idx = children[octant(&center, &body.x)];
                }
                NodeContents::Leaf(resident) => {
                    if node.depth >= max_depth {
                        log::trace!("octree depth limit reached at node {node_idx}, aggregating bodies");
                        node.contents = NodeContents::Aggregate(vec![resident, body_idx]);
                        return;
                    }

                    let children = self.subdivide(node_idx);
                    let moved = &bodies[resident];
                    let child = &mut self.nodes[children[octant(&center, &moved.x)]];
                    child.accumulate(moved.x, moved.m);
                    child.contents = NodeContents::Leaf(resident);

                    node_idx = children[octant(&center, &body.x)];
                }
            }
        }
    }

    /// Split a node into 8 empty child octants.
    ///
    /// Each child has half the parent's half-size and is centered a quarter
    /// of the parent's edge length away from the parent center along every
    /// axis. The parent becomes internal.
    fn subdivide(&mut self, node_idx: usize) -> [usize; 8] {
        let parent = &self.nodes[node_idx];
        let (center, quarter, depth) = (parent.center, 0.5 * parent.half_size, parent.depth + 1);

        let mut children = [0usize; 8];
        for (k, slot) in children.iter_mut().enumerate() {
            let offset = NVec3::new(
                if k & 1 == 0 { -quarter } else { quarter },
                if k & 2 == 0 { -quarter } else { quarter },
                if k & 4 == 0 { -quarter } else { quarter },
            );
            *slot = self.nodes.len();
            self.nodes.push(OctreeNode::new(center + offset, quarter, depth));
        }

        self.nodes[node_idx].contents = NodeContents::Internal(children);
        children
    }

    /// Walk the tree for body `body_idx`, calling `f(node, mass, com)` for
    /// every node accepted as a point mass.
    ///
    /// The opening test is evaluated per visited node, so far clusters are
    /// taken whole and near structure is resolved down to leaves.
    fn for_each_interaction<F>(&self, body_idx: usize, theta: f64, softening: f64, mut f: F)
    where
        F: FnMut(usize, f64, NVec3),
    {
        let target = &self.bodies[body_idx];
        let soft2 = softening * softening;
        let mut stack = vec![ROOT];

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if node.mass == 0.0 {
                continue;
            }

            let (mass, com) = match &node.contents {
                NodeContents::Empty => continue,
                NodeContents::Leaf(i) if *i == body_idx => continue,
                NodeContents::Aggregate(members) if members.contains(&body_idx) => {
                    // every other member on its own, skipping exact coincidences like the direct sum
                    for &m in members.iter().filter(|&&m| m != body_idx) {
                        let other = &self.bodies[m];
                        let r = other.x - target.x;
                        if r.dot(&r) + soft2 > 0.0 {
                            f(idx, other.m, other.x);
                        }
                    }
                    continue;
                }
                _ => (node.mass, node.com),
            };

            let r = com - target.x;
            let d2 = r.dot(&r) + soft2;
            let dist = d2.sqrt();

            if let NodeContents::Internal(children) = &node.contents {
                // a cube holding the target is always opened, its COM includes the target's own mass
                if dist == 0.0 || node.size() / dist >= theta || node.encloses(&target.x) {
                    // too close: open it. reversed so octant 0 is visited first
                    stack.extend(children.iter().rev().filter(|&&c| self.nodes[c].mass > 0.0));
                    continue;
                }
            }

            // coincident point mass without softening has no direction
            if d2 > 0.0 {
                f(idx, mass, com);
            }
        }
    }
}

// helpers ===========================================================================

/// Cube enclosing all bodies: center of the bounding box, half-size of its
/// longest half-extent plus a margin.
fn root_cube(bodies: &[Body]) -> (NVec3, f64) {
    if bodies.is_empty() {
        return (NVec3::zeros(), 1.0);
    }

    let mut min = NVec3::repeat(f64::INFINITY);
    let mut max = NVec3::repeat(f64::NEG_INFINITY);
    for b in bodies {
        min = min.inf(&b.x);
        max = max.sup(&b.x);
    }

    let center = (min + max) * 0.5;
    let half = ((max - min) * 0.5).max();

    // all bodies at one point: any positive cube will do
    let half = if half > 0.0 { half * (1.0 + ROOT_MARGIN) } else { 1.0 };
    (center, half)
}

/// Octant index of point `p` relative to a node centered at `center`.
///
/// - Bit 0 (value 1): x >= center.x
/// - Bit 1 (value 2): y >= center.y
/// - Bit 2 (value 4): z >= center.z
///
/// Matches the child layout produced by subdivision.
pub fn octant(center: &NVec3, p: &NVec3) -> usize {
    let mut idx = 0;
    if p.x >= center.x {
        idx |= 1;
    }
    if p.y >= center.y {
        idx |= 2;
    }
    if p.z >= center.z {
        idx |= 4;
    }
    idx
}
