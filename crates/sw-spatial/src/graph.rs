//! Road graph: node and edge arenas plus shade scores.
//!
//! # Data layout
//!
//! Nodes and edges live in two parallel `Vec`s and refer to each other by
//! index (`NodeId`, `EdgeId`).  Edges are undirected; [`RoadEdge::other`]
//! gives the far end from either side.
//!
//! ```text
//! nodes[n].edges  → [EdgeId, ...]        incident edges
//! edges[e].a / .b → NodeId               endpoints, a != b
//! edges[e].shade  → f32 in [0, 1]        fraction of samples in shadow
//! ```
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over node positions serves both the merge lookup
//! during construction and `nearest_node` queries afterwards.  Edge snapping
//! is a linear scan; graphs at this scale have a few hundred edges.
//!
//! # Shade
//!
//! Shade scores are the only part of the graph that changes after
//! construction.  [`RoadGraph::recompute_shade`] re-walks every edge with a
//! new light direction without touching topology.

use glam::{Vec2, Vec3};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use tracing::{debug, info};

use sw_core::{EdgeId, NodeId};
use sw_world::{HitFilter, ObstacleQuery, Ray};

use crate::curve::RoadCurve;

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f32; 3],
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f32; 3]) -> f32 {
        Vec3::from_array(self.point).distance_squared(Vec3::from_array(*point))
    }
}

// ── Parameters ────────────────────────────────────────────────────────────────

/// Shadow-ray sampling along an edge.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ShadeSampler {
    /// Sample points per edge, at offsets `(i + 0.5) / samples`.
    pub samples:      u32,
    /// Height above the road each shadow ray starts from.
    pub ray_height:   f32,
    /// Occluders farther than this along the ray are ignored.
    pub max_distance: f32,
}

impl Default for ShadeSampler {
    fn default() -> Self {
        Self { samples: 6, ray_height: 0.3, max_distance: 200.0 }
    }
}

impl ShadeSampler {
    /// Fraction of sample points on segment `a`–`b` hidden from the sun.
    ///
    /// A sun at or below the horizon shades everything.
    pub fn score<W: ObstacleQuery + ?Sized>(&self, a: Vec3, b: Vec3, world: &W, light_dir: Vec3) -> f32 {
        if self.samples == 0 {
            return 0.0;
        }
        if light_dir.y <= 0.0 {
            return 1.0;
        }
        let n = self.samples;
        let shaded = (0..n)
            .filter(|i| {
                let t = (*i as f32 + 0.5) / n as f32;
                let origin = a.lerp(b, t) + Vec3::Y * self.ray_height;
                Ray::new(origin, light_dir)
                    .is_some_and(|ray| world.occluded(&ray, self.max_distance, HitFilter::Any))
            })
            .count();
        shaded as f32 / n as f32
    }
}

/// Graph construction parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GraphParams {
    /// Points closer than this resolve to the same node.
    pub merge_epsilon:  f32,
    /// Target spacing between samples along a curve.
    pub sample_spacing: f32,
    /// Minimum samples per curve.
    pub min_samples:    usize,
    pub shade:          ShadeSampler,
}

impl Default for GraphParams {
    fn default() -> Self {
        Self { merge_epsilon: 0.5, sample_spacing: 2.0, min_samples: 2, shade: ShadeSampler::default() }
    }
}

impl GraphParams {
    /// `max(min_samples, ceil(length / spacing) + 1)`.
    pub fn sample_count(&self, length: f32) -> usize {
        let by_length = if self.sample_spacing > 0.0 && length.is_finite() {
            (length / self.sample_spacing).ceil() as usize + 1
        } else {
            0
        };
        by_length.max(self.min_samples).max(2)
    }
}

// ── Graph elements ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct RoadNode {
    pub id:    NodeId,
    pub pos:   Vec3,
    pub edges: Vec<EdgeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoadEdge {
    pub id:     EdgeId,
    pub a:      NodeId,
    pub b:      NodeId,
    /// Literal geometry: `[pos(a), pos(b)]`.
    pub points: [Vec3; 2],
    pub length: f32,
    /// Fraction of samples in shadow at the last shade pass.
    pub shade:  f32,
}

impl RoadEdge {
    /// The endpoint that is not `node`.
    #[inline]
    pub fn other(&self, node: NodeId) -> NodeId {
        if node == self.a { self.b } else { self.a }
    }
}

/// Nearest point on the graph to a query point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Snap {
    pub edge:     EdgeId,
    pub point:    Vec3,
    /// Position along the edge from `a` (0) to `b` (1).
    pub t:        f32,
    pub distance: f32,
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Undirected road graph with per-edge shade scores.
///
/// Do not construct directly; use [`RoadGraphBuilder`].
pub struct RoadGraph {
    pub nodes:     Vec<RoadNode>,
    pub edges:     Vec<RoadEdge>,
    /// Light direction used by the last shade pass.
    pub light_dir: Vec3,
    sampler:       ShadeSampler,
    spatial_idx:   RTree<NodeEntry>,
}

impl RoadGraph {
    /// A graph with no nodes.  Every query on it returns `None`.
    pub fn empty() -> Self {
        RoadGraphBuilder::new(GraphParams::default()).finish()
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&RoadNode> {
        self.nodes.get(id.index())
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> Option<&RoadEdge> {
        self.edges.get(id.index())
    }

    #[inline]
    pub fn node_pos(&self, id: NodeId) -> Option<Vec3> {
        self.node(id).map(|n| n.pos)
    }

    /// The edge joining `a` and `b`, in either direction.
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.node(a)?
            .edges
            .iter()
            .copied()
            .find(|e| self.edges[e.index()].other(a) == b)
    }

    /// `(neighbour, edge)` pairs around `node`.
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &RoadEdge)> + '_ {
        self.node(node)
            .into_iter()
            .flat_map(|n| n.edges.iter())
            .map(move |e| {
                let edge = &self.edges[e.index()];
                (edge.other(node), edge)
            })
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nearest node to `point`; `None` only for an empty graph.
    pub fn nearest_node(&self, point: Vec3) -> Option<NodeId> {
        self.spatial_idx.nearest_neighbor(&point.to_array()).map(|e| e.id)
    }

    /// Project `point` onto the nearest edge (clamped to the segment).
    pub fn snap(&self, point: Vec3) -> Option<Snap> {
        if !point.is_finite() {
            return None;
        }
        let mut best: Option<Snap> = None;
        for edge in &self.edges {
            let [a, b] = edge.points;
            let ab = b - a;
            let len2 = ab.length_squared();
            let t = if len2 > f32::EPSILON { ((point - a).dot(ab) / len2).clamp(0.0, 1.0) } else { 0.0 };
            let on_edge = a + ab * t;
            let distance = on_edge.distance(point);
            if best.is_none_or(|s| distance < s.distance) {
                best = Some(Snap { edge: edge.id, point: on_edge, t, distance });
            }
        }
        best
    }

    // ── Shade ─────────────────────────────────────────────────────────────

    pub fn shade_sampler(&self) -> ShadeSampler {
        self.sampler
    }

    /// Rescore every edge for a new light direction.  Topology is untouched.
    pub fn recompute_shade<W: ObstacleQuery + ?Sized>(&mut self, world: &W, light_dir: Vec3) {
        let sampler = self.sampler;
        for edge in &mut self.edges {
            edge.shade = sampler.score(edge.points[0], edge.points[1], world, light_dir);
        }
        self.light_dir = light_dir;
        debug!(edges = self.edges.len(), ?light_dir, "shade scores recomputed");
    }

    /// Overwrite one edge's shade score (clamped to `[0, 1]`).
    pub fn set_shade(&mut self, edge: EdgeId, shade: f32) {
        if let Some(e) = self.edges.get_mut(edge.index()) {
            e.shade = shade.clamp(0.0, 1.0);
        }
    }

    /// Length-weighted mean shade score over all edges.
    pub fn mean_shade(&self) -> f32 {
        let (sum, len) = self
            .edges
            .iter()
            .fold((0.0_f32, 0.0_f32), |(s, l), e| (s + e.shade * e.length, l + e.length));
        if len > 0.0 { sum / len } else { 0.0 }
    }
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`RoadGraph`] from curves or explicit segments, then call
/// [`build`](Self::build).
///
/// # Example
///
/// ```
/// use glam::Vec3;
/// use sw_spatial::{GraphParams, RoadCurve, RoadGraphBuilder};
/// use sw_world::OpenSky;
///
/// let mut b = RoadGraphBuilder::new(GraphParams::default());
/// b.add_curve(&RoadCurve::new([Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)]));
/// let graph = b.build(&OpenSky, Vec3::Y);
/// assert_eq!(graph.node_count(), 3); // samples every 2 units
/// assert_eq!(graph.edge_count(), 2);
/// ```
pub struct RoadGraphBuilder {
    params:              GraphParams,
    nodes:               Vec<RoadNode>,
    edges:               Vec<RoadEdge>,
    spatial_idx:         RTree<NodeEntry>,
    rejected_loops:      usize,
    rejected_duplicates: usize,
}

impl RoadGraphBuilder {
    pub fn new(params: GraphParams) -> Self {
        Self {
            params,
            nodes: Vec::new(),
            edges: Vec::new(),
            spatial_idx: RTree::new(),
            rejected_loops: 0,
            rejected_duplicates: 0,
        }
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Return the node within `merge_epsilon` of `pos`, creating one if none.
    ///
    /// Merging is greedy against nodes that already exist: two points more
    /// than `merge_epsilon` apart still resolve to one node when both lie
    /// within `merge_epsilon` of an earlier node.  Only a pair looked up on
    /// its own is guaranteed to stay apart.
    pub fn find_or_create(&mut self, pos: Vec3) -> NodeId {
        let key = pos.to_array();
        let eps2 = self.params.merge_epsilon * self.params.merge_epsilon;
        if let Some(hit) = self.spatial_idx.nearest_neighbor(&key) {
            if hit.distance_2(&key) <= eps2 {
                return hit.id;
            }
        }
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(RoadNode { id, pos, edges: Vec::new() });
        self.spatial_idx.insert(NodeEntry { point: key, id });
        id
    }

    /// Connect two positions with an edge.
    ///
    /// Returns `None` when both resolve to the same node or the pair is
    /// already connected.
    pub fn add_segment(&mut self, from: Vec3, to: Vec3) -> Option<EdgeId> {
        if !from.is_finite() || !to.is_finite() {
            return None;
        }
        let a = self.find_or_create(from);
        let b = self.find_or_create(to);
        if a == b {
            self.rejected_loops += 1;
            return None;
        }
        let duplicate = self.nodes[a.index()]
            .edges
            .iter()
            .any(|e| self.edges[e.index()].other(a) == b);
        if duplicate {
            self.rejected_duplicates += 1;
            return None;
        }
        let (pa, pb) = (self.nodes[a.index()].pos, self.nodes[b.index()].pos);
        let id = EdgeId::from_index(self.edges.len());
        self.edges.push(RoadEdge { id, a, b, points: [pa, pb], length: pa.distance(pb), shade: 0.0 });
        self.nodes[a.index()].edges.push(id);
        self.nodes[b.index()].edges.push(id);
        Some(id)
    }

    /// Sample `curve` and chain its samples into edges.  Returns the number
    /// of edges added; curves with fewer than two points add none.
    ///
    /// The curve is not split where it crosses others; use
    /// [`add_curves`](Self::add_curves) for a whole network.
    pub fn add_curve(&mut self, curve: &RoadCurve) -> usize {
        self.add_curve_at(curve, &[])
    }

    /// Add a road network.  Curves that cross, or where one ends on another
    /// within `merge_epsilon`, share a node at the junction.
    pub fn add_curves(&mut self, curves: &[&RoadCurve]) -> usize {
        let (junctions, stations) = find_junctions(curves, self.params.merge_epsilon);
        // Junction nodes go in first so nearby samples merge into them.
        for p in &junctions {
            self.find_or_create(*p);
        }
        let added = curves
            .iter()
            .zip(&stations)
            .map(|(curve, extra)| self.add_curve_at(curve, extra))
            .sum();
        debug!(curves = curves.len(), junctions = junctions.len(), "road junctions split");
        added
    }

    fn add_curve_at(&mut self, curve: &RoadCurve, extra: &[f32]) -> usize {
        if curve.len() < 2 {
            return 0;
        }
        let samples = curve.sample_with_stations(self.params.sample_count(curve.length()), extra);
        samples
            .windows(2)
            .filter_map(|pair| self.add_segment(pair[0], pair[1]))
            .count()
    }

    /// Score every edge's shade and produce the graph.
    pub fn build<W: ObstacleQuery + ?Sized>(self, world: &W, light_dir: Vec3) -> RoadGraph {
        let (loops, dups) = (self.rejected_loops, self.rejected_duplicates);
        let mut graph = self.finish();
        graph.recompute_shade(world, light_dir);
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            rejected_self_loops = loops,
            rejected_duplicates = dups,
            mean_shade = graph.mean_shade(),
            "road graph built"
        );
        graph
    }

    fn finish(self) -> RoadGraph {
        RoadGraph {
            nodes: self.nodes,
            edges: self.edges,
            light_dir: Vec3::ZERO,
            sampler: self.params.shade,
            spatial_idx: self.spatial_idx,
        }
    }
}

impl RoadGraph {
    /// Build a graph from every walkable curve of a road layer.
    pub fn from_curves<'a, W: ObstacleQuery + ?Sized>(
        curves: impl IntoIterator<Item = &'a RoadCurve>,
        params: GraphParams,
        world: &W,
        light_dir: Vec3,
    ) -> RoadGraph {
        let curves: Vec<&RoadCurve> = curves.into_iter().collect();
        let mut builder = RoadGraphBuilder::new(params);
        builder.add_curves(&curves);
        builder.build(world, light_dir)
    }
}

// ── Junctions ─────────────────────────────────────────────────────────────────

/// Crossings and T-junctions between distinct curves, on the ground plane.
///
/// Returns the junction points and, per curve, the arc lengths at which it
/// must be sampled to pass through them.  A curve end that stops within
/// `tolerance` of another curve counts as a T-junction.  Pairs whose padded
/// bounds do not overlap are skipped.
fn find_junctions(curves: &[&RoadCurve], tolerance: f32) -> (Vec<Vec3>, Vec<Vec<f32>>) {
    let mut points = Vec::new();
    let mut stations = vec![Vec::new(); curves.len()];
    let bounds: Vec<Option<(Vec2, Vec2)>> = curves.iter().map(|c| ground_bounds(c, tolerance)).collect();

    for i in 0..curves.len() {
        for j in (i + 1)..curves.len() {
            let (Some((lo_i, hi_i)), Some((lo_j, hi_j))) = (bounds[i], bounds[j]) else {
                continue;
            };
            if lo_i.cmpgt(hi_j).any() || lo_j.cmpgt(hi_i).any() {
                continue;
            }
            for (a0, a1, sa) in curves[i].segments() {
                for (b0, b1, sb) in curves[j].segments() {
                    if let Some((t, u)) = crossing(a0, a1, b0, b1) {
                        points.push(a0.lerp(a1, t));
                        stations[i].push(sa + t * a0.distance(a1));
                        stations[j].push(sb + u * b0.distance(b1));
                    }
                }
            }
            for (from, onto) in [(i, j), (j, i)] {
                let pts = curves[from].points();
                for end in [pts[0], pts[pts.len() - 1]] {
                    for (b0, b1, sb) in curves[onto].segments() {
                        let (u, dist) = project_on_ground(end, b0, b1);
                        if dist <= tolerance {
                            points.push(b0.lerp(b1, u));
                            stations[onto].push(sb + u * b0.distance(b1));
                        }
                    }
                }
            }
        }
    }
    (points, stations)
}

#[inline]
fn ground(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Padded XZ bounds; `None` for curves that cannot produce an edge.
fn ground_bounds(curve: &RoadCurve, pad: f32) -> Option<(Vec2, Vec2)> {
    if curve.len() < 2 {
        return None;
    }
    let (lo, hi) = curve.points().iter().fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(lo, hi), p| (lo.min(ground(*p)), hi.max(ground(*p))),
    );
    Some((lo - Vec2::splat(pad), hi + Vec2::splat(pad)))
}

/// Segment parameters `(t, u)` where `a0–a1` and `b0–b1` cross.  Parallel
/// and degenerate segments never cross.
fn crossing(a0: Vec3, a1: Vec3, b0: Vec3, b1: Vec3) -> Option<(f32, f32)> {
    const SLACK: f32 = 1e-5;
    let (p, r) = (ground(a0), ground(a1) - ground(a0));
    let (q, s) = (ground(b0), ground(b1) - ground(b0));
    let denom = r.perp_dot(s);
    if denom.abs() <= 1e-6 * r.length() * s.length() {
        return None;
    }
    let qp = q - p;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;
    let inside = |v: f32| (-SLACK..=1.0 + SLACK).contains(&v);
    (inside(t) && inside(u)).then(|| (t.clamp(0.0, 1.0), u.clamp(0.0, 1.0)))
}

/// Clamped parameter of `p` projected onto `b0–b1`, and its ground distance.
fn project_on_ground(p: Vec3, b0: Vec3, b1: Vec3) -> (f32, f32) {
    let (a, d) = (ground(b0), ground(b1) - ground(b0));
    let len2 = d.length_squared();
    let u = if len2 > 0.0 { ((ground(p) - a).dot(d) / len2).clamp(0.0, 1.0) } else { 0.0 };
    (u, ground(p).distance(a + d * u))
}
