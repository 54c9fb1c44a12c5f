//! Connected component labeling using union-find.
//!
//! Classic two-pass scheme: the first raster pass hands out provisional
//! labels and records equivalences between touching labels, the second pass
//! resolves every cell to its root and renumbers roots `1..=n` in the order
//! their first cell is met. Label ids are therefore ordered by each
//! component's first cell in row-major order.

use serde::{Deserialize, Serialize};

use crate::error::FieldObjectsError;
use crate::types::Grid2D;

/// Neighbourhood used to decide which cells touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connectivity {
    /// Only up/down/left/right neighbours.
    Four,
    /// Diagonal neighbours as well.
    #[default]
    Eight,
}

impl Connectivity {
    /// Already-visited neighbours in a row-major scan, as (row, col) offsets.
    fn prior_neighbours(self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &[(-1, 0), (0, -1)],
            Connectivity::Eight => &[(-1, -1), (-1, 0), (-1, 1), (0, -1)],
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Connectivity::Four => 4,
            Connectivity::Eight => 8,
        }
    }
}

impl TryFrom<u8> for Connectivity {
    type Error = FieldObjectsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Connectivity::Four),
            8 => Ok(Connectivity::Eight),
            other => Err(FieldObjectsError::InvalidConnectivity(other)),
        }
    }
}

/// A 2-D label map from connected component analysis.
///
/// Background cells hold 0; component cells hold their 1-based label.
#[derive(Debug, Clone)]
pub struct LabelMap {
    labels: Grid2D<u32>,
    num_labels: usize,
}

impl LabelMap {
    /// Label the `true` cells of `mask`.
    pub fn from_mask(mask: &Grid2D<bool>, connectivity: Connectivity) -> Self {
        let (height, width) = mask.shape();
        let mut provisional = vec![0u32; width * height];
        let mut uf = UnionFind::new();

        for row in 0..height {
            for col in 0..width {
                if !mask.at(row, col) {
                    continue;
                }

                let mut current = 0u32;
                for &(dr, dc) in connectivity.prior_neighbours() {
                    let r = row as isize + dr;
                    let c = col as isize + dc;
                    if r < 0 || c < 0 || c >= width as isize {
                        continue;
                    }
                    let neighbour = provisional[r as usize * width + c as usize];
                    if neighbour == 0 {
                        continue;
                    }
                    if current == 0 {
                        current = neighbour;
                    } else if neighbour != current {
                        uf.union(current, neighbour);
                    }
                }

                if current == 0 {
                    current = uf.make_set();
                }
                provisional[row * width + col] = current;
            }
        }

        let num_labels = uf.flatten_labels(&mut provisional);
        let labels = Grid2D::from_fn(height, width, |r, c| provisional[r * width + c]);

        Self { labels, num_labels }
    }

    /// Number of components found.
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    pub fn labels(&self) -> &Grid2D<u32> {
        &self.labels
    }

    /// Flat row-major cell indices of every component, indexed by `label - 1`.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut components = vec![Vec::new(); self.num_labels];
        for (idx, &label) in self.labels.as_slice().iter().enumerate() {
            if label > 0 {
                components[(label - 1) as usize].push(idx);
            }
        }
        components
    }
}

#[derive(Debug)]
struct UnionFind {
    parent: Vec<u32>,
    next_label: u32,
}

impl UnionFind {
    fn new() -> Self {
        Self {
            parent: Vec::with_capacity(256),
            next_label: 1,
        }
    }

    #[inline]
    fn make_set(&mut self) -> u32 {
        let label = self.next_label;
        self.parent.push(label);
        self.next_label += 1;
        label
    }

    /// Find root with iterative path compression (two-pass).
    fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        while self.parent[(root - 1) as usize] != root {
            root = self.parent[(root - 1) as usize];
        }

        let mut current = label;
        while current != root {
            let next = self.parent[(current - 1) as usize];
            self.parent[(current - 1) as usize] = root;
            current = next;
        }

        root
    }

    /// Merge two sets; the smaller label becomes the root.
    fn union(&mut self, a: u32, b: u32) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let (smaller, larger) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[(larger - 1) as usize] = smaller;
        }
    }

    /// Rewrite provisional labels to sequential `1..=n` in first-seen order.
    fn flatten_labels(&mut self, labels: &mut [u32]) -> usize {
        if self.parent.is_empty() {
            return 0;
        }

        let mut label_map = vec![0u32; self.parent.len() + 1];
        let mut num_labels = 0u32;

        for label in labels.iter_mut() {
            if *label == 0 {
                continue;
            }
            let root = self.find(*label) as usize;
            if label_map[root] == 0 {
                num_labels += 1;
                label_map[root] = num_labels;
            }
            *label = label_map[root];
        }

        num_labels as usize
    }
}
