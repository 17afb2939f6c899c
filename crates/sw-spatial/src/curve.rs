//! Piecewise-linear road curves.

use glam::Vec3;

/// A polyline parametrised by arc length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoadCurve {
    points:     Vec<Vec3>,
    /// `cumulative[i]` = arc length from `points[0]` to `points[i]`.
    cumulative: Vec<f32>,
}

impl RoadCurve {
    /// Build a curve, dropping non-finite points.
    pub fn new(points: impl IntoIterator<Item = Vec3>) -> Self {
        let points: Vec<Vec3> = points.into_iter().filter(|p| p.is_finite()).collect();
        let mut cumulative = Vec::with_capacity(points.len());
        let mut acc = 0.0_f32;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                acc += p.distance(points[i - 1]);
            }
            cumulative.push(acc);
        }
        Self { points, cumulative }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Point at normalised arc length `u ∈ [0, 1]` (clamped).
    pub fn point_at(&self, u: f32) -> Option<Vec3> {
        let first = *self.points.first()?;
        let total = self.length();
        if total <= f32::EPSILON {
            return Some(first);
        }
        let s = u.clamp(0.0, 1.0) * total;
        // First vertex whose cumulative length reaches `s`.
        let hi = self.cumulative.partition_point(|c| *c < s).clamp(1, self.points.len() - 1);
        let lo = hi - 1;
        let seg = self.cumulative[hi] - self.cumulative[lo];
        let t = if seg > f32::EPSILON { (s - self.cumulative[lo]) / seg } else { 0.0 };
        Some(self.points[lo].lerp(self.points[hi], t))
    }

    /// `n` points evenly spaced by arc length, both ends included.
    ///
    /// Curves with fewer than two points are returned as-is.
    pub fn sample(&self, n: usize) -> Vec<Vec3> {
        if self.points.len() < 2 {
            return self.points.clone();
        }
        let n = n.max(2);
        (0..n)
            .filter_map(|i| self.point_at(i as f32 / (n - 1) as f32))
            .collect()
    }

    /// Even samples merged with the curve's own vertices, in arc-length order.
    ///
    /// Corners are kept so roads that cross at a shared vertex still meet
    /// in the graph.
    pub fn sample_with_vertices(&self, n: usize) -> Vec<Vec3> {
        self.sample_with_stations(n, &[])
    }

    /// Like [`sample_with_vertices`](Self::sample_with_vertices), plus a point
    /// at every arc length in `extra` (clamped to the curve).
    pub fn sample_with_stations(&self, n: usize, extra: &[f32]) -> Vec<Vec3> {
        if self.points.len() < 2 {
            return self.points.clone();
        }
        let total = self.length();
        let n = n.max(2);
        let mut stations: Vec<f32> = (0..n).map(|i| total * i as f32 / (n - 1) as f32).collect();
        stations.extend_from_slice(&self.cumulative);
        stations.extend(extra.iter().filter(|s| s.is_finite()).map(|s| s.clamp(0.0, total)));
        stations.sort_by(f32::total_cmp);
        stations.dedup_by(|a, b| (*a - *b).abs() <= 1e-4);
        stations
            .into_iter()
            .filter_map(|s| {
                if total <= f32::EPSILON {
                    self.points.first().copied()
                } else {
                    self.point_at(s / total)
                }
            })
            .collect()
    }

    /// Straight pieces as `(start, end, arc length at start)`.
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3, f32)> + '_ {
        self.points
            .windows(2)
            .zip(&self.cumulative)
            .map(|(w, s)| (w[0], w[1], *s))
    }
}
