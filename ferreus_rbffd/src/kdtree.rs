/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides a simple KD-tree implementation for nearest-neighbour queries on stencil centers.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::{Mat, Row, RowRef};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Nearest-neighbour queries over a fixed point set.
pub trait SpatialIndex {
    /// Returns up to `k` `(index, distance)` pairs, closest first.
    fn k_nearest(&self, query: RowRef<f64>, k: usize) -> Vec<(usize, f64)>;

    /// Queries every row of `queries`, returning `(indices, distances)` with one
    /// row per query. Missing neighbours are padded with `usize::MAX` and `+inf`.
    fn k_nearest_batch(&self, queries: &Mat<f64>, k: usize) -> (Mat<usize>, Mat<f64>) {
        let n = queries.nrows();
        let mut ids = Mat::<usize>::from_fn(n, k, |_, _| usize::MAX);
        let mut dists = Mat::<f64>::from_fn(n, k, |_, _| f64::INFINITY);

        for i in 0..n {
            for (j, (id, dist)) in self.k_nearest(queries.row(i), k).into_iter().enumerate() {
                ids[(i, j)] = id;
                dists[(i, j)] = dist;
            }
        }
        (ids, dists)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PointRowWithId {
    coords: Row<f64>,
    id: usize,
}

impl PointRowWithId {
    fn new(coords: RowRef<f64>, id: usize) -> Self {
        Self {
            coords: coords.to_owned(),
            id,
        }
    }

    fn distance_sq(&self, other: RowRef<f64>) -> f64 {
        self.coords
            .iter()
            .zip(other.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum()
    }
}

/// A node in the KDTree
#[derive(Debug)]
struct Node {
    point: PointRowWithId,
    left: Option<usize>,
    right: Option<usize>,
}

#[derive(Debug, PartialEq)]
struct Neighbour {
    distance_sq: f64,
    id: usize,
}

impl Eq for Neighbour {}

impl PartialOrd for Neighbour {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbour {
    // Farthest on top, so the heap root is the neighbour to evict.
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_sq
            .partial_cmp(&other.distance_sq)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// The KDTree structure
#[derive(Debug)]
pub struct KDTree {
    nodes: Vec<Node>,
    dim: usize,
}

impl KDTree {
    /// Constructs a new KDTree from a Mat of points.
    ///
    /// # Panics
    /// If `points` has no columns.
    pub fn new(points: &Mat<f64>) -> Self {
        assert!(points.ncols() > 0, "a KDTree needs at least one dimension");
        let mut rows: Vec<PointRowWithId> = (0..points.nrows())
            .map(|i| PointRowWithId::new(points.row(i), i))
            .collect();

        let mut tree = KDTree {
            nodes: Vec::with_capacity(rows.len()),
            dim: points.ncols(),
        };
        tree.build_tree(&mut rows, 0);
        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recursively builds the KDTree and stores nodes in a flat vector.
    fn build_tree(&mut self, points: &mut [PointRowWithId], depth: usize) -> Option<usize> {
        if points.is_empty() {
            return None;
        }

        let axis = depth % self.dim.max(1);

        points.sort_by(|a, b| {
            a.coords[axis]
                .partial_cmp(&b.coords[axis])
                .unwrap_or(Ordering::Equal)
        });

        let mid = points.len() / 2;

        let node_index = self.nodes.len();
        self.nodes.push(Node {
            point: points[mid].clone(),
            left: None,
            right: None,
        });

        self.nodes[node_index].left = self.build_tree(&mut points[..mid], depth + 1);
        self.nodes[node_index].right = self.build_tree(&mut points[mid + 1..], depth + 1);

        Some(node_index)
    }

    fn k_nearest_impl(
        &self,
        node_index: usize,
        target: RowRef<f64>,
        k: usize,
        depth: usize,
        heap: &mut BinaryHeap<Neighbour>,
    ) {
        let node = &self.nodes[node_index];
        let dist_sq = node.point.distance_sq(target);

        let candidate = Neighbour {
            distance_sq: dist_sq,
            id: node.point.id,
        };
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }

        let axis = depth % self.dim.max(1);
        let diff = target[axis] - node.point.coords[axis];

        let (near_idx, far_idx) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near_idx {
            self.k_nearest_impl(near, target, k, depth + 1, heap);
        }

        if let Some(far) = far_idx {
            let crosses_plane = heap
                .peek()
                .map_or(true, |worst| diff * diff <= worst.distance_sq);
            if heap.len() < k || crosses_plane {
                self.k_nearest_impl(far, target, k, depth + 1, heap);
            }
        }
    }
}

impl SpatialIndex for KDTree {
    fn k_nearest(&self, query: RowRef<f64>, k: usize) -> Vec<(usize, f64)> {
        assert_eq!(query.ncols(), self.dim, "query dimension must match the tree");
        if k == 0 || self.nodes.is_empty() {
            return Vec::new();
        }

        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.k_nearest_impl(0, query, k, 0, &mut heap);

        heap.into_sorted_vec()
            .into_iter()
            .map(|n| (n.id, n.distance_sq.sqrt()))
            .collect()
    }
}
