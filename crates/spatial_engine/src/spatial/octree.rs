//! Octree spatial partitioning structure
//!
//! Indexes payloads by their bounding boxes. A payload is stored in the
//! deepest node whose bounds fully contain its box, so large payloads stay
//! high in the tree and small ones sink towards the leaves.
//!
//! Nodes live in a flat arena owned by the [`Octree`]; children always have
//! larger [`NodeId`]s than their parent. Tree-wide settings live in
//! [`OctreeConfig`] on the tree itself rather than on individual nodes.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::foundation::math::{Transform, Vec3};
use crate::physics::collision::Ray;
use crate::spatial::AABB;

/// Deepest tree a configuration may ask for
pub const MAX_OCTREE_DEPTH: u32 = 16;

/// Configuration for octree behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Maximum subdivision depth; nodes at this depth never split
    pub max_depth: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self { max_depth: 8 }
    }
}

impl OctreeConfig {
    /// Set the maximum subdivision depth
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth > MAX_OCTREE_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "octree max_depth {} exceeds {}",
                self.max_depth, MAX_OCTREE_DEPTH
            )));
        }
        Ok(())
    }
}

/// Index of a node inside its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The root node of every tree
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Reusable traversal stack for tree queries
///
/// Keep one around per call site and pass it to the `*_with` query
/// methods; after the first few queries it stops allocating.
#[derive(Debug, Default)]
pub struct QueryStack {
    nodes: Vec<NodeId>,
}

impl QueryStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode<T> {
    /// Bounds of this node in the tree's local space
    pub aabb: AABB,

    /// Payloads stored at this node
    pub data: Vec<T>,

    children: Vec<NodeId>,

    depth: u32,
}

impl<T> OctreeNode<T> {
    fn new(aabb: AABB, depth: u32) -> Self {
        Self {
            aabb,
            data: Vec::new(),
            children: Vec::new(),
            depth,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Child node ids (8 while building, possibly fewer after pruning)
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Depth in the tree (0 = root)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Bounds of the 8 octants of this node
    ///
    /// Octant `i` is offset by the half diagonal along x when bit 0 is set,
    /// along y for bit 1 and along z for bit 2.
    pub fn octant_bounds(&self) -> [AABB; 8] {
        let half_diagonal = (self.aabb.max - self.aabb.min) * 0.5;
        std::array::from_fn(|i| {
            let offset = Vec3::new(
                if i & 1 != 0 { half_diagonal.x } else { 0.0 },
                if i & 2 != 0 { half_diagonal.y } else { 0.0 },
                if i & 4 != 0 { half_diagonal.z } else { 0.0 },
            );
            let min = self.aabb.min + offset;
            AABB::new(min, min + half_diagonal)
        })
    }
}

/// Octree over payloads of type `T` (triangle indices by default)
#[derive(Debug, Clone)]
pub struct Octree<T = u32> {
    nodes: Vec<OctreeNode<T>>,
    config: OctreeConfig,
}

impl<T: Copy> Octree<T> {
    /// Create a new octree covering `aabb`
    pub fn new(aabb: AABB, config: OctreeConfig) -> Self {
        Self {
            nodes: vec![OctreeNode::new(aabb, 0)],
            config,
        }
    }

    /// Create a new octree with the default configuration
    pub fn with_bounds(aabb: AABB) -> Self {
        Self::new(aabb, OctreeConfig::default())
    }

    /// Tree-wide configuration
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Root node
    pub fn root(&self) -> &OctreeNode<T> {
        &self.nodes[NodeId::ROOT.index()]
    }

    /// Root bounds
    pub fn aabb(&self) -> &AABB {
        &self.root().aabb
    }

    /// Look up a node by id
    pub fn node(&self, id: NodeId) -> Option<&OctreeNode<T>> {
        self.nodes.get(id.index())
    }

    /// Drop every node and start over with new root bounds
    ///
    /// Keeps the arena's capacity so rebuilds don't reallocate.
    pub fn reset(&mut self, aabb: AABB) {
        self.nodes.clear();
        self.nodes.push(OctreeNode::new(aabb, 0));
    }

    /// Clear the octree, keeping the root bounds
    pub fn clear(&mut self) {
        let aabb = *self.aabb();
        self.reset(aabb);
    }

    /// Insert `payload` with bounds `aabb`
    ///
    /// Returns `false` and stores nothing if the root does not fully
    /// contain `aabb`.
    pub fn insert(&mut self, aabb: &AABB, payload: T) -> bool {
        self.insert_at(NodeId::ROOT, aabb, payload, 0)
    }

    fn insert_at(&mut self, id: NodeId, aabb: &AABB, payload: T, level: u32) -> bool {
        let node = &self.nodes[id.index()];
        if !node.aabb.contains(aabb) {
            return false;
        }

        if level < self.config.max_depth {
            if node.is_leaf() {
                // Only split when one of the new octants would take the payload
                let octants = node.octant_bounds();
                if let Some(octant) = octants.iter().position(|c| c.contains(aabb)) {
                    let first = self.nodes.len();
                    self.nodes.extend(octants.iter().map(|c| OctreeNode::new(*c, level + 1)));
                    self.nodes[id.index()].children = (first..first + 8)
                        .map(|i| NodeId(i as u32))
                        .collect();
                    return self.insert_at(NodeId((first + octant) as u32), aabb, payload, level + 1);
                }
            } else {
                for i in 0..self.nodes[id.index()].children.len() {
                    let child = self.nodes[id.index()].children[i];
                    if self.insert_at(child, aabb, payload, level + 1) {
                        return true;
                    }
                }
            }
        }

        self.nodes[id.index()].data.push(payload);
        true
    }

    /// Split a leaf into its 8 octants. No-op on internal nodes.
    pub fn subdivide(&mut self, id: NodeId) {
        let node = &self.nodes[id.index()];
        if !node.is_leaf() {
            return;
        }

        let depth = node.depth + 1;
        let octants = node.octant_bounds();
        let first = self.nodes.len();
        self.nodes.extend(octants.iter().map(|c| OctreeNode::new(*c, depth)));
        self.nodes[id.index()].children = (first..first + 8).map(|i| NodeId(i as u32)).collect();
    }

    /// Append every payload stored in a node overlapping `aabb` to `result`
    pub fn aabb_query(&self, aabb: &AABB, result: &mut Vec<T>) {
        let mut stack = QueryStack::new();
        self.aabb_query_with(aabb, &mut stack, result);
    }

    /// [`Octree::aabb_query`] with a caller-owned traversal stack
    pub fn aabb_query_with(&self, aabb: &AABB, stack: &mut QueryStack, result: &mut Vec<T>) {
        stack.nodes.clear();
        stack.nodes.push(NodeId::ROOT);

        while let Some(id) = stack.nodes.pop() {
            let node = &self.nodes[id.index()];
            if node.aabb.overlaps(aabb) {
                result.extend_from_slice(&node.data);
            }
            // Children tile their parent, so there is nothing to pre-check
            stack.nodes.extend_from_slice(&node.children);
        }
    }

    /// Query with the bounds of a world-space ray segment
    ///
    /// `tree_transform` places the tree in the world; the ray's box is moved
    /// into tree space before querying.
    pub fn ray_query(&self, ray: &Ray, tree_transform: &Transform, result: &mut Vec<T>) {
        let mut stack = QueryStack::new();
        self.ray_query_with(ray, tree_transform, &mut stack, result);
    }

    /// [`Octree::ray_query`] with a caller-owned traversal stack
    pub fn ray_query_with(
        &self,
        ray: &Ray,
        tree_transform: &Transform,
        stack: &mut QueryStack,
        result: &mut Vec<T>,
    ) {
        let local = ray.aabb().to_local_frame(tree_transform);
        self.aabb_query_with(&local, stack, result);
    }

    /// Prune leaves that hold no payloads, bottom-up
    ///
    /// Meant to run once after a bulk build. Internal nodes may end up with
    /// fewer than 8 children.
    pub fn remove_empty_nodes(&mut self) {
        let before = self.nodes.len();

        // Children sit after their parent in the arena, so walking backwards
        // visits every child before its parent.
        for i in (0..self.nodes.len()).rev() {
            let mut children = std::mem::take(&mut self.nodes[i].children);
            children.retain(|c| {
                let child = &self.nodes[c.index()];
                !(child.data.is_empty() && child.children.is_empty())
            });
            self.nodes[i].children = children;
        }

        self.compact();
        log::trace!("Octree prune: {} -> {} nodes", before, self.nodes.len());
    }

    /// Rebuild the arena with only the nodes reachable from the root
    fn compact(&mut self) {
        let mut order = vec![NodeId::ROOT];
        let mut cursor = 0;
        while cursor < order.len() {
            let id = order[cursor];
            order.extend_from_slice(&self.nodes[id.index()].children);
            cursor += 1;
        }

        if order.len() == self.nodes.len() {
            return;
        }

        let mut remap = vec![NodeId::ROOT; self.nodes.len()];
        for (new_index, old) in order.iter().enumerate() {
            remap[old.index()] = NodeId(new_index as u32);
        }

        let mut old_nodes = std::mem::take(&mut self.nodes);
        self.nodes = order
            .iter()
            .map(|old| {
                let mut node = std::mem::replace(
                    &mut old_nodes[old.index()],
                    OctreeNode::new(AABB::default(), 0),
                );
                for child in &mut node.children {
                    *child = remap[child.index()];
                }
                node
            })
            .collect();
    }

    /// Number of nodes in the tree (root included)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of stored payloads
    pub fn payload_count(&self) -> usize {
        self.nodes.iter().map(|n| n.data.len()).sum()
    }

    /// Deepest node depth
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// All leaf nodes (for visualization)
    pub fn leaves(&self) -> impl Iterator<Item = &OctreeNode<T>> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn cube(min: f32, max: f32) -> AABB {
        AABB::new(Vec3::new(min, min, min), Vec3::new(max, max, max))
    }

    fn unit_box_at(x: f32, y: f32, z: f32) -> AABB {
        AABB::new(Vec3::new(x, y, z), Vec3::new(x + 1.0, y + 1.0, z + 1.0))
    }

    #[test]
    fn test_octree_basic_insertion() {
        let mut octree: Octree<u32> = Octree::with_bounds(cube(-100.0, 100.0));

        assert!(octree.insert(&unit_box_at(0.0, 0.0, 0.0), 7));
        assert_eq!(octree.payload_count(), 1);
    }

    #[test]
    fn test_insert_outside_root_is_rejected() {
        let mut octree: Octree<u32> = Octree::with_bounds(cube(0.0, 4.0));

        assert!(!octree.insert(&unit_box_at(3.5, 0.0, 0.0), 1));
        assert_eq!(octree.payload_count(), 0);
        assert_eq!(octree.node_count(), 1);
    }

    #[test]
    fn test_query_finds_overlapping_and_ignores_outside() {
        let mut octree: Octree<u32> = Octree::with_bounds(cube(0.0, 8.0));
        octree.insert(&unit_box_at(1.0, 1.0, 1.0), 42);

        let mut result = Vec::new();
        octree.aabb_query(&AABB::new(Vec3::new(1.5, 1.5, 1.5), Vec3::new(3.0, 3.0, 3.0)), &mut result);
        assert_eq!(result, vec![42]);

        result.clear();
        octree.aabb_query(&cube(20.0, 30.0), &mut result);
        assert!(result.is_empty());
    }

    #[test]
    fn test_disjoint_unit_cubes_roundtrip() {
        let config = OctreeConfig::default().with_max_depth(2);
        let mut boxes = Vec::new();
        for x in 0..4 {
            for y in 0..4 {
                for z in 0..4 {
                    boxes.push(unit_box_at(x as f32, y as f32, z as f32));
                }
            }
        }

        for reversed in [false, true] {
            let mut octree = Octree::new(cube(0.0, 4.0), config.clone());
            let order: Vec<usize> = if reversed {
                (0..boxes.len()).rev().collect()
            } else {
                (0..boxes.len()).collect()
            };
            for i in order {
                assert!(octree.insert(&boxes[i], i as u32));
            }

            let mut result = Vec::new();
            octree.aabb_query(&cube(0.0, 4.0), &mut result);

            let distinct: HashSet<u32> = result.iter().copied().collect();
            assert_eq!(result.len(), boxes.len());
            assert_eq!(distinct.len(), boxes.len());
            assert_eq!(octree.depth(), 2);
        }
    }

    #[test]
    fn test_straddling_payload_does_not_leave_split_behind() {
        let mut octree: Octree<u32> = Octree::with_bounds(cube(0.0, 8.0));

        // Crosses the root's center on every axis: no octant can hold it
        assert!(octree.insert(&cube(3.0, 5.0), 1));
        assert!(octree.root().is_leaf());
        assert_eq!(octree.root().data, vec![1]);
        assert_eq!(octree.node_count(), 1);
    }

    #[test]
    fn test_existing_children_are_kept() {
        let mut octree: Octree<u32> = Octree::with_bounds(cube(0.0, 8.0));
        octree.insert(&unit_box_at(0.0, 0.0, 0.0), 1);
        assert_eq!(octree.root().children().len(), 8);

        octree.insert(&cube(3.0, 5.0), 2);
        assert_eq!(octree.root().children().len(), 8);
        assert_eq!(octree.root().data, vec![2]);
    }

    #[test]
    fn test_max_depth_zero_never_splits() {
        let mut octree = Octree::new(cube(0.0, 8.0), OctreeConfig::default().with_max_depth(0));
        octree.insert(&unit_box_at(0.0, 0.0, 0.0), 1u32);
        octree.insert(&unit_box_at(6.0, 6.0, 6.0), 2u32);

        assert!(octree.root().is_leaf());
        assert_eq!(octree.root().data, vec![1, 2]);
    }

    #[test]
    fn test_subdivide_tiles_parent() {
        let mut octree: Octree<u32> = Octree::with_bounds(cube(0.0, 2.0));
        octree.subdivide(NodeId::ROOT);

        let children = octree.root().children().to_vec();
        assert_eq!(children.len(), 8);

        let mut union = octree.node(children[0]).unwrap().aabb;
        for id in &children {
            let child = octree.node(*id).unwrap();
            assert_eq!(child.depth(), 1);
            assert_eq!(child.aabb.max - child.aabb.min, Vec3::new(1.0, 1.0, 1.0));
            union.extend(&child.aabb);
        }
        assert_eq!(union, cube(0.0, 2.0));
    }

    #[test]
    fn test_remove_empty_nodes_prunes_and_keeps_payloads() {
        let mut octree: Octree<u32> = Octree::with_bounds(cube(0.0, 8.0));
        octree.insert(&unit_box_at(0.0, 0.0, 0.0), 1);
        octree.insert(&unit_box_at(6.5, 6.5, 6.5), 2);
        let before = octree.node_count();

        octree.remove_empty_nodes();

        assert!(octree.node_count() < before);
        assert_eq!(octree.root().children().len(), 2);
        assert!(octree.leaves().all(|leaf| !leaf.data.is_empty()));

        let mut result = Vec::new();
        octree.aabb_query(&cube(0.0, 8.0), &mut result);
        result.sort_unstable();
        assert_eq!(result, vec![1, 2]);
    }

    #[test]
    fn test_remove_empty_nodes_on_empty_tree() {
        let mut octree: Octree<u32> = Octree::with_bounds(cube(0.0, 8.0));
        octree.remove_empty_nodes();

        assert_eq!(octree.node_count(), 1);
    }

    #[test]
    fn test_query_stack_is_reusable() {
        let mut octree: Octree<u32> = Octree::with_bounds(cube(0.0, 8.0));
        octree.insert(&unit_box_at(0.0, 0.0, 0.0), 1);
        octree.insert(&unit_box_at(6.0, 0.0, 0.0), 2);

        let mut stack = QueryStack::new();
        let mut result = Vec::new();
        octree.aabb_query_with(&unit_box_at(0.0, 0.0, 0.0), &mut stack, &mut result);
        assert_eq!(result, vec![1]);

        result.clear();
        octree.aabb_query_with(&unit_box_at(6.0, 0.0, 0.0), &mut stack, &mut result);
        assert_eq!(result, vec![2]);
    }

    #[test]
    fn test_ray_query_moves_ray_into_tree_space() {
        let mut octree: Octree<u32> = Octree::with_bounds(cube(0.0, 8.0));
        octree.insert(&unit_box_at(1.0, 1.0, 1.0), 5);

        // Tree placed 100 units along x
        let frame = Transform::from_position(Vec3::new(100.0, 0.0, 0.0));
        let ray = Ray::new(Vec3::new(101.5, 1.5, 10.0), Vec3::new(101.5, 1.5, -10.0));

        let mut result = Vec::new();
        octree.ray_query(&ray, &frame, &mut result);
        assert_eq!(result, vec![5]);

        result.clear();
        octree.ray_query(&ray, &Transform::identity(), &mut result);
        assert!(result.is_empty());
    }

    #[test]
    fn test_config_validate() {
        assert!(OctreeConfig::default().validate().is_ok());
        assert!(OctreeConfig::default().with_max_depth(MAX_OCTREE_DEPTH + 1).validate().is_err());
    }

    #[test]
    fn test_clear_keeps_bounds() {
        let mut octree: Octree<u32> = Octree::with_bounds(cube(0.0, 8.0));
        octree.insert(&unit_box_at(0.0, 0.0, 0.0), 1);
        octree.clear();

        assert_eq!(octree.node_count(), 1);
        assert_eq!(octree.payload_count(), 0);
        assert_eq!(*octree.aabb(), cube(0.0, 8.0));
    }
}
