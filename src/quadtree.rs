/*
 * QuadTree Module
 *
 * Point quadtree over agent positions, rebuilt from scratch every step.
 * Nodes live in a flat arena and reference their four children by index,
 * which keeps the whole tree in one allocation and makes the debug overlay a
 * plain slice walk.
 *
 * Each node holds up to `capacity` points before it splits into NW/NE/SW/SE
 * quadrants. Points already held by a node stay there after the split, so a
 * point lives in exactly one node on its root-to-leaf path.
 *
 * Coincident points would otherwise split forever, so nodes at `max_depth`
 * stop subdividing and keep accepting points past capacity.
 */

use glam::DVec2;
use tracing::warn;

use crate::geometry::Rect;

pub const DEFAULT_MAX_DEPTH: usize = 16;

/// A stored point: the agent's slot in the world's agent vector plus its
/// position at build time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadPoint {
    pub index: usize,
    pub position: DVec2,
}

impl QuadPoint {
    pub fn new(index: usize, position: DVec2) -> Self {
        Self { index, position }
    }
}

#[derive(Debug, Clone)]
struct Node {
    boundary: Rect,
    depth: usize,
    points: Vec<QuadPoint>,
    // NW, NE, SW, SE
    children: Option<[usize; 4]>,
}

impl Node {
    fn new(boundary: Rect, depth: usize) -> Self {
        Self {
            boundary,
            depth,
            points: Vec::new(),
            children: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuadTree {
    nodes: Vec<Node>,
    capacity: usize,
    max_depth: usize,
    len: usize,
    overflow_reported: bool,
}

/// Boundary-inclusive point-in-rectangle test
#[inline]
pub fn contains(rect: &Rect, point: DVec2) -> bool {
    rect.contains(point)
}

/// Boundary-inclusive AABB overlap test
#[inline]
pub fn intersects(a: &Rect, b: &Rect) -> bool {
    a.intersects(b)
}

impl QuadTree {
    /// Panics on a zero capacity: that is a construction bug, not a runtime state.
    pub fn new(boundary: Rect, capacity: usize, max_depth: usize) -> Self {
        assert!(capacity > 0, "quadtree capacity must be at least 1");
        Self {
            nodes: vec![Node::new(boundary, 0)],
            capacity,
            max_depth,
            len: 0,
            overflow_reported: false,
        }
    }

    /// Build a tree holding `points`; points outside `boundary` are skipped
    pub fn build<I>(boundary: Rect, capacity: usize, max_depth: usize, points: I) -> Self
    where
        I: IntoIterator<Item = QuadPoint>,
    {
        let mut tree = Self::new(boundary, capacity, max_depth);
        for point in points {
            tree.insert(point);
        }
        tree
    }

    pub fn boundary(&self) -> Rect {
        self.nodes[0].boundary
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total stored points
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest node level reached (root is 0)
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Every node boundary, root first, for the debug overlay
    pub fn boundaries(&self) -> Vec<Rect> {
        self.nodes.iter().map(|n| n.boundary).collect()
    }

    /// Returns false when the point lies outside the root boundary
    pub fn insert(&mut self, point: QuadPoint) -> bool {
        self.insert_at(0, point)
    }

    fn insert_at(&mut self, node: usize, point: QuadPoint) -> bool {
        if !self.nodes[node].boundary.contains(point.position) {
            return false;
        }

        let at_depth_cap = self.nodes[node].depth >= self.max_depth;
        if self.nodes[node].points.len() < self.capacity || at_depth_cap {
            if at_depth_cap && self.nodes[node].points.len() >= self.capacity && !self.overflow_reported {
                warn!(
                    depth = self.nodes[node].depth,
                    capacity = self.capacity,
                    "quadtree depth cap reached, leaf holding more points than capacity"
                );
                self.overflow_reported = true;
            }
            self.nodes[node].points.push(point);
            self.len += 1;
            return true;
        }

        let children = match self.nodes[node].children {
            Some(children) => children,
            None => self.subdivide(node),
        };

        for child in children {
            if self.insert_at(child, point) {
                return true;
            }
        }

        // Quadrant edges are computed in floating point and can miss a point
        // sitting on the parent's outer edge by one ulp; keep it here.
        self.nodes[node].points.push(point);
        self.len += 1;
        true
    }

    fn subdivide(&mut self, node: usize) -> [usize; 4] {
        let Rect { x, y, w, h } = self.nodes[node].boundary;
        let depth = self.nodes[node].depth + 1;
        let (qw, qh) = (w / 4.0, h / 4.0);
        let (cw, ch) = (w / 2.0, h / 2.0);

        let quadrants = [
            Rect::new(x - qw, y - qh, cw, ch),
            Rect::new(x + qw, y - qh, cw, ch),
            Rect::new(x - qw, y + qh, cw, ch),
            Rect::new(x + qw, y + qh, cw, ch),
        ];

        let first = self.nodes.len();
        for quadrant in quadrants {
            self.nodes.push(Node::new(quadrant, depth));
        }
        let children = [first, first + 1, first + 2, first + 3];
        self.nodes[node].children = Some(children);
        children
    }

    /// Append every stored point inside `range` to `out`
    pub fn query(&self, range: &Rect, out: &mut Vec<QuadPoint>) {
        self.query_node(0, range, out);
    }

    fn query_node(&self, node: usize, range: &Rect, out: &mut Vec<QuadPoint>) {
        let n = &self.nodes[node];
        if !n.boundary.intersects(range) {
            return;
        }
        out.extend(n.points.iter().filter(|p| range.contains(p.position)));
        if let Some(children) = n.children {
            for child in children {
                self.query_node(child, range, out);
            }
        }
    }

    /// All stored points in node order
    pub fn points(&self) -> impl Iterator<Item = &QuadPoint> {
        self.nodes.iter().flat_map(|n| n.points.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{RandomSource, SeededRandom};

    fn random_points(rng: &mut SeededRandom, n: usize, size: f64) -> Vec<QuadPoint> {
        (0..n)
            .map(|i| QuadPoint::new(i, DVec2::new(rng.next() * size, rng.next() * size)))
            .collect()
    }

    fn domain(size: f64) -> Rect {
        Rect::new(size / 2.0, size / 2.0, size, size)
    }

    #[test]
    fn rejects_points_outside_boundary() {
        let mut qt = QuadTree::new(domain(10.0), 4, DEFAULT_MAX_DEPTH);
        assert!(!qt.insert(QuadPoint::new(0, DVec2::new(11.0, 5.0))));
        assert!(qt.insert(QuadPoint::new(1, DVec2::new(10.0, 10.0))));
        assert_eq!(qt.len(), 1);
    }

    #[test]
    fn full_query_returns_every_point_once() {
        let mut rng = SeededRandom::new(11);
        for capacity in [1, 2, 4, 7, 32] {
            for n in [0, 1, 5, 50, 400] {
                let points = random_points(&mut rng, n, 100.0);
                let qt = QuadTree::build(domain(100.0), capacity, DEFAULT_MAX_DEPTH, points);
                assert_eq!(qt.len(), n);

                let mut found = Vec::new();
                qt.query(&domain(100.0), &mut found);
                let mut ids: Vec<usize> = found.iter().map(|p| p.index).collect();
                ids.sort_unstable();
                ids.dedup();
                assert_eq!(found.len(), n, "capacity {capacity}, n {n}");
                assert_eq!(ids, (0..n).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn query_matches_brute_force() {
        let mut rng = SeededRandom::new(5);
        let points = random_points(&mut rng, 300, 64.0);
        let qt = QuadTree::build(domain(64.0), 3, DEFAULT_MAX_DEPTH, points.clone());

        for _ in 0..50 {
            let range = Rect::new(
                rng.next() * 64.0,
                rng.next() * 64.0,
                rng.next() * 30.0,
                rng.next() * 30.0,
            );
            let mut found = Vec::new();
            qt.query(&range, &mut found);
            let mut got: Vec<usize> = found.iter().map(|p| p.index).collect();
            got.sort_unstable();

            let expected: Vec<usize> = points
                .iter()
                .filter(|p| range.contains(p.position))
                .map(|p| p.index)
                .collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn point_on_quadrant_edge_stored_once() {
        let mut qt = QuadTree::new(domain(8.0), 1, DEFAULT_MAX_DEPTH);
        qt.insert(QuadPoint::new(0, DVec2::new(1.0, 1.0)));
        qt.insert(QuadPoint::new(1, DVec2::new(4.0, 4.0)));
        assert_eq!(qt.points().filter(|p| p.index == 1).count(), 1);

        let mut found = Vec::new();
        qt.query(&domain(8.0), &mut found);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn subdivides_once_per_node() {
        let mut qt = QuadTree::new(domain(8.0), 1, DEFAULT_MAX_DEPTH);
        qt.insert(QuadPoint::new(0, DVec2::new(1.0, 1.0)));
        qt.insert(QuadPoint::new(1, DVec2::new(7.0, 1.0)));
        assert_eq!(qt.node_count(), 5);
        qt.insert(QuadPoint::new(2, DVec2::new(1.0, 7.0)));
        qt.insert(QuadPoint::new(3, DVec2::new(7.0, 7.0)));
        assert_eq!(qt.node_count(), 5);
    }

    #[test]
    fn coincident_points_stop_at_depth_cap() {
        let max_depth = 6;
        let p = DVec2::new(3.3, 3.3);
        let qt = QuadTree::build(
            domain(10.0),
            1,
            max_depth,
            (0..100).map(|i| QuadPoint::new(i, p)),
        );
        assert_eq!(qt.len(), 100);
        assert_eq!(qt.depth(), max_depth);

        let mut found = Vec::new();
        qt.query(&Rect::around(p, 0.01), &mut found);
        assert_eq!(found.len(), 100);
    }

    #[test]
    fn free_functions_agree_with_rect_methods() {
        let r = Rect::new(0.0, 0.0, 4.0, 4.0);
        assert!(contains(&r, DVec2::new(2.0, -2.0)));
        assert!(intersects(&r, &Rect::new(4.0, 4.0, 4.0, 4.0)));
        assert!(!intersects(&r, &Rect::new(5.0, 0.0, 1.0, 1.0)));
    }
}
