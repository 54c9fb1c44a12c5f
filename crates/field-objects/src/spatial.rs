//! Nearest-neighbour index over grid cell centres.
//!
//! A 2-D k-d tree in (lat, lon) degree space. Distances are plain Euclidean
//! in degrees, not geodesic. The tree is built once with median splits and
//! never modified afterwards.

/// A static 2-D k-d tree mapping points back to caller-supplied ids.
#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<[f64; 2]>,
    ids: Vec<usize>,
}

#[derive(Debug, Clone)]
struct KdNode {
    /// Index into `points`/`ids`
    point_idx: usize,
    left: Option<usize>,
    right: Option<usize>,
    /// 0 = lat, 1 = lon
    split_dim: usize,
}

impl KdTree {
    /// Build a tree from `(id, [lat, lon])` pairs.
    ///
    /// Points with a non-finite coordinate are skipped. Returns `None` if no
    /// finite point remains.
    pub fn build(entries: impl IntoIterator<Item = (usize, [f64; 2])>) -> Option<Self> {
        let (ids, points): (Vec<usize>, Vec<[f64; 2]>) = entries
            .into_iter()
            .filter(|(_, p)| p[0].is_finite() && p[1].is_finite())
            .unzip();

        if points.is_empty() {
            return None;
        }

        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());
        Self::build_recursive(&points, &mut indices, 0, &mut nodes);

        Some(Self { nodes, points, ids })
    }

    fn build_recursive(
        points: &[[f64; 2]],
        indices: &mut [usize],
        depth: usize,
        nodes: &mut Vec<KdNode>,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }

        let split_dim = depth % 2;
        indices.sort_by(|&a, &b| points[a][split_dim].total_cmp(&points[b][split_dim]));

        let median = indices.len() / 2;
        let point_idx = indices[median];

        let node_idx = nodes.len();
        nodes.push(KdNode {
            point_idx,
            left: None,
            right: None,
            split_dim,
        });

        let (left_indices, right_part) = indices.split_at_mut(median);
        let right_indices = &mut right_part[1..];

        let left = Self::build_recursive(points, left_indices, depth + 1, nodes);
        let right = Self::build_recursive(points, right_indices, depth + 1, nodes);

        nodes[node_idx].left = left;
        nodes[node_idx].right = right;

        Some(node_idx)
    }

    /// Find the id of the nearest point and its squared distance.
    ///
    /// The search starts from the root, so a query whose distances are all
    /// NaN or infinite still returns an indexed point.
    pub fn nearest(&self, query: [f64; 2]) -> (usize, f64) {
        let root = self.nodes[0].point_idx;
        let mut best = (root, distance_squared(query, self.points[root]));
        self.nearest_recursive(0, query, &mut best);
        (self.ids[best.0], best.1)
    }

    fn nearest_recursive(&self, node_idx: usize, query: [f64; 2], best: &mut (usize, f64)) {
        let node = &self.nodes[node_idx];
        let point = self.points[node.point_idx];

        let dist_sq = distance_squared(query, point);
        // Ties resolve to the lowest id so lookups are deterministic.
        if dist_sq < best.1 || (dist_sq == best.1 && self.ids[node.point_idx] < self.ids[best.0]) {
            *best = (node.point_idx, dist_sq);
        }

        let diff = query[node.split_dim] - point[node.split_dim];
        let (first, second) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(first_idx) = first {
            self.nearest_recursive(first_idx, query, best);
        }

        if let Some(second_idx) = second {
            if diff * diff <= best.1 {
                self.nearest_recursive(second_idx, query, best);
            }
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[inline]
fn distance_squared(a: [f64; 2], b: [f64; 2]) -> f64 {
    let d0 = a[0] - b[0];
    let d1 = a[1] - b[1];
    d0 * d0 + d1 * d1
}
