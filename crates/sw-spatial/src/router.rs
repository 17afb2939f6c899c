//! Routing trait and the shade-biased A* implementation.
//!
//! # Pluggability
//!
//! `sw-mobility` and `sw-sim` call routing through the [`Router`] trait, so a
//! different search (plain Dijkstra, contraction hierarchies) can be swapped
//! in without touching steering or the orchestrator.
//!
//! # Cost model
//!
//! ```text
//! edge cost = length * max(0.2, 1 - bias * shade)
//! heuristic = euclid(node, goal) * max(0.2, 1 - bias)
//! ```
//!
//! Shade is at most 1, so every edge costs at least `length * max(0.2, 1 - bias)`
//! and the scaled heuristic never overestimates.  At `bias = 0` it is plain
//! Euclidean distance and the search is shortest-by-length.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use glam::Vec3;

use sw_core::{EdgeId, NodeId};

use crate::error::{SpatialError, SpatialResult};
use crate::graph::RoadGraph;

/// Lower bound on the per-length cost factor.
pub const MIN_COST_FACTOR: f32 = 0.2;

/// Cost factor for an edge with `shade` under `bias`.
#[inline]
pub fn cost_factor(bias: f32, shade: f32) -> f32 {
    (1.0 - bias * shade).max(MIN_COST_FACTOR)
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// A node-to-node path through the road graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub nodes:  Vec<NodeId>,
    pub edges:  Vec<EdgeId>,
    /// Node positions in travel order.
    pub points: Vec<Vec3>,
    /// Shade-weighted cost.
    pub cost:   f32,
    /// Geometric length.
    pub length: f32,
}

impl Route {
    /// `true` if start and goal were the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    /// Polyline running exactly from `start` to `goal`.
    ///
    /// The graph path runs node to node; the exact endpoints are prepended
    /// and appended when they lie farther than `tolerance` from its ends.
    pub fn anchored(&self, start: Vec3, goal: Vec3, tolerance: f32) -> Vec<Vec3> {
        let mut out = Vec::with_capacity(self.points.len() + 2);
        if self.points.first().is_none_or(|p| p.distance(start) > tolerance) {
            out.push(start);
        }
        out.extend_from_slice(&self.points);
        if self.points.last().is_none_or(|p| p.distance(goal) > tolerance) {
            out.push(goal);
        }
        out
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`; with the `parallel` feature agents
/// replan from Rayon workers sharing one router.
pub trait Router: Send + Sync {
    /// Compute a route from `from` to `to`.
    ///
    /// `from == to` is a single-node route, not an error.
    fn route(&self, graph: &RoadGraph, from: NodeId, to: NodeId, shade_bias: f32) -> SpatialResult<Route>;
}

// ── ShadeAStarRouter ──────────────────────────────────────────────────────────

/// A* over the road graph with shade-discounted edge costs.
#[derive(Copy, Clone, Debug, Default)]
pub struct ShadeAStarRouter;

impl Router for ShadeAStarRouter {
    fn route(&self, graph: &RoadGraph, from: NodeId, to: NodeId, shade_bias: f32) -> SpatialResult<Route> {
        astar(graph, from, to, shade_bias.clamp(0.0, 1.0))
    }
}

/// Snap `start` and `goal` onto the graph, then route between the nodes
/// nearest to the snapped points.
pub fn find_path<R: Router + ?Sized>(
    router: &R,
    graph: &RoadGraph,
    start: Vec3,
    goal: Vec3,
    shade_bias: f32,
) -> SpatialResult<Route> {
    let from = graph
        .snap(start)
        .and_then(|s| graph.nearest_node(s.point))
        .ok_or(SpatialError::Unsnappable)?;
    let to = graph
        .snap(goal)
        .and_then(|s| graph.nearest_node(s.point))
        .ok_or(SpatialError::Unsnappable)?;
    router.route(graph, from, to, shade_bias)
}

// ── A* internals ──────────────────────────────────────────────────────────────

/// Total-ordered `f32` for the priority queue.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Cost(f32);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

fn astar(graph: &RoadGraph, from: NodeId, to: NodeId, bias: f32) -> SpatialResult<Route> {
    let start = graph.node_pos(from).ok_or(SpatialError::NodeNotFound(from))?;
    let goal = graph.node_pos(to).ok_or(SpatialError::NodeNotFound(to))?;
    if from == to {
        return Ok(Route { nodes: vec![from], edges: vec![], points: vec![start], cost: 0.0, length: 0.0 });
    }

    let h_scale = (1.0 - bias).max(MIN_COST_FACTOR);
    let heuristic = |p: Vec3| p.distance(goal) * h_scale;

    let n = graph.node_count();
    // g[v] = best known cost to reach v.
    let mut g = vec![f32::INFINITY; n];
    // prev_edge[v] = edge that reached v; EdgeId::INVALID for unreached nodes.
    let mut prev_edge = vec![EdgeId::INVALID; n];
    let mut closed = vec![false; n];

    g[from.index()] = 0.0;

    // Min-heap on (f, node).  Secondary key NodeId makes ties deterministic.
    let mut heap: BinaryHeap<Reverse<(Cost, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((Cost(heuristic(start)), from)));

    while let Some(Reverse((_, node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(graph, &prev_edge, from, to, g[to.index()]));
        }
        if closed[node.index()] {
            continue;
        }
        closed[node.index()] = true;

        let cost = g[node.index()];
        for (neighbor, edge) in graph.neighbors(node) {
            if closed[neighbor.index()] {
                continue;
            }
            let new_cost = cost + edge.length * cost_factor(bias, edge.shade);
            if new_cost < g[neighbor.index()] {
                g[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge.id;
                let pos = graph.nodes[neighbor.index()].pos;
                heap.push(Reverse((Cost(new_cost + heuristic(pos)), neighbor)));
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(graph: &RoadGraph, prev_edge: &[EdgeId], from: NodeId, to: NodeId, cost: f32) -> Route {
    let mut nodes = vec![to];
    let mut edges = Vec::new();
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        edges.push(e);
        cur = graph.edges[e.index()].other(cur);
        nodes.push(cur);
    }
    nodes.reverse();
    edges.reverse();
    let points: Vec<Vec3> = nodes.iter().map(|n| graph.nodes[n.index()].pos).collect();
    let length = edges.iter().map(|e| graph.edges[e.index()].length).sum();
    Route { nodes, edges, points, cost, length }
}

// ── Heat-adaptive shade preference ────────────────────────────────────────────

/// Maps air temperature to a shade bias: hotter days favour shade more.
///
/// ```text
/// bias = clamp(base + range * clamp((T - cool_c) / (hot_c - cool_c), 0, 1), 0, 1)
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ShadePreference {
    pub base:   f32,
    pub range:  f32,
    pub cool_c: f32,
    pub hot_c:  f32,
}

impl Default for ShadePreference {
    fn default() -> Self {
        Self { base: 0.25, range: 0.25, cool_c: 15.0, hot_c: 45.0 }
    }
}

impl ShadePreference {
    pub fn bias_for_temperature(&self, temp_c: f32) -> f32 {
        let span = self.hot_c - self.cool_c;
        let norm = if span > f32::EPSILON && temp_c.is_finite() {
            ((temp_c - self.cool_c) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (self.base + self.range * norm).clamp(0.0, 1.0)
    }
}
