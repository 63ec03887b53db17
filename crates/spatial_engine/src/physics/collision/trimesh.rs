//! Indexed triangle mesh collider
//!
//! Geometry is stored unscaled in the mesh's local frame, exactly as the
//! asset layer produced it. A componentwise `scale` is applied on read, so
//! normals and the local AABB are in scaled units while the triangle
//! octree indexes the raw, unscaled triangles.

use thiserror::Error;

use crate::foundation::math::{Transform, Vec3};
use crate::spatial::{Octree, OctreeConfig, QueryStack, AABB};

/// Errors raised when mesh buffers do not describe a triangle mesh
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Vertex buffer length is not a multiple of 3
    #[error("vertex buffer holds {0} floats, expected xyz triples")]
    VertexCountNotTriples(usize),

    /// Index buffer length is not a multiple of 3
    #[error("index buffer holds {0} indices, expected whole triangles")]
    IndexCountNotTriangles(usize),

    /// An index points past the end of the vertex buffer
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending index
        index: u32,
        /// Number of vertices it was checked against
        vertex_count: usize,
    },
}

/// Triangle mesh collider with cached face normals and a triangle octree
///
/// After one or more [`Trimesh::add_mesh`] calls the mesh is dirty and
/// [`Trimesh::finalize`] must run before it is queried again.
#[derive(Debug, Clone)]
pub struct Trimesh {
    vertices: Vec<f32>,
    indices: Vec<u32>,
    normals: Vec<f32>,
    scale: Vec3,
    aabb: AABB,
    tree: Octree<u32>,
    dirty: bool,
}

impl Trimesh {
    /// Build a mesh from flat xyz vertices and triangle indices
    pub fn new(vertices: Vec<f32>, indices: Vec<u32>) -> Result<Self, MeshError> {
        Self::with_config(vertices, indices, &OctreeConfig::default())
    }

    /// Build a mesh whose triangle octree uses `config`
    pub fn with_config(
        vertices: Vec<f32>,
        indices: Vec<u32>,
        config: &OctreeConfig,
    ) -> Result<Self, MeshError> {
        validate_buffers(&vertices, &indices)?;

        let mut mesh = Self {
            vertices,
            indices,
            normals: Vec::new(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            aabb: AABB::default(),
            tree: Octree::new(AABB::default(), config.clone()),
            dirty: false,
        };
        mesh.update_normals();
        mesh.update_aabb();
        mesh.update_tree();
        Ok(mesh)
    }

    /// An empty mesh, to be grown with [`Trimesh::add_mesh`]
    pub fn empty(config: &OctreeConfig) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            normals: Vec::new(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            aabb: AABB::default(),
            tree: Octree::new(AABB::default(), config.clone()),
            dirty: false,
        }
    }

    /// Append geometry; `indices` address `vertices`, not the whole mesh
    ///
    /// Leaves the mesh dirty until [`Trimesh::finalize`] runs.
    pub fn add_mesh(&mut self, vertices: &[f32], indices: &[u32]) -> Result<(), MeshError> {
        validate_buffers(vertices, indices)?;

        let base = u32::try_from(self.vertex_count()).map_err(|_| MeshError::IndexOutOfRange {
            index: u32::MAX,
            vertex_count: self.vertex_count(),
        })?;
        self.vertices.extend_from_slice(vertices);
        self.indices.extend(indices.iter().map(|i| i + base));
        self.dirty = true;
        Ok(())
    }

    /// Re-derive normals, bounds and the tree after a batch of appends
    pub fn finalize(&mut self) {
        if !self.dirty {
            return;
        }

        self.update_normals();
        self.update_aabb();
        self.update_tree();
        self.dirty = false;
        log::debug!(
            "Trimesh finalized: {} vertices, {} triangles",
            self.vertex_count(),
            self.triangle_count()
        );
    }

    /// Whether appended geometry is still waiting for [`Trimesh::finalize`]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Change the componentwise scale and re-derive everything that depends on it
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.update_normals();
        self.update_aabb();
        self.update_tree();
    }

    /// Recompute one face normal per triangle from the scaled vertices
    ///
    /// The normal is `normalize((v2 - v1) x (v1 - v0))`. Degenerate
    /// triangles keep a zero normal.
    pub fn update_normals(&mut self) {
        self.normals.clear();
        self.normals.reserve(self.indices.len());

        for triangle in 0..self.triangle_count() {
            let [v0, v1, v2] = self.triangle_vertices(triangle);
            let n = (v2 - v1).cross(&(v1 - v0));
            let length = n.magnitude();
            let n = if length > 0.0 { n / length } else { n };
            self.normals.extend_from_slice(&[n.x, n.y, n.z]);
        }
    }

    /// Bounds of all scaled vertices in the local frame
    pub fn compute_local_aabb(&self) -> AABB {
        let mut aabb = AABB::default();
        let mut vertices = (0..self.vertex_count()).map(|i| self.get_vertex(i));
        if let Some(first) = vertices.next() {
            aabb.set(first, first);
            for v in vertices {
                aabb.min = aabb.min.inf(&v);
                aabb.max = aabb.max.sup(&v);
            }
        }
        aabb
    }

    /// Refresh the cached local bounds
    pub fn update_aabb(&mut self) {
        self.aabb = self.compute_local_aabb();
    }

    /// Rebuild the triangle octree from scratch
    ///
    /// The root is the unscaled vertex bounds (the local AABB with the scale
    /// divided out), computed directly from the raw vertices so that every
    /// triangle box fits without rounding drift.
    pub fn update_tree(&mut self) {
        let root = AABB::from_points(&self.vertices);
        self.tree.reset(root);

        let mut dropped = 0usize;
        for triangle in 0..self.triangle_count() {
            let [a, b, c] = self.unscaled_triangle_vertices(triangle);
            let bounds = AABB::new(a.inf(&b).inf(&c), a.sup(&b).sup(&c));
            if !self.tree.insert(&bounds, triangle as u32) {
                dropped += 1;
            }
        }
        self.tree.remove_empty_nodes();

        if dropped > 0 {
            log::warn!("Trimesh tree rebuild dropped {} non-finite triangles", dropped);
        }
        log::debug!(
            "Trimesh tree rebuilt: {} triangles in {} nodes",
            self.triangle_count(),
            self.tree.node_count()
        );
    }

    /// Triangles whose tree node overlaps `aabb` (given in scaled local units)
    pub fn get_triangles_in_aabb(&self, aabb: &AABB, result: &mut Vec<u32>) {
        let mut stack = QueryStack::new();
        self.get_triangles_in_aabb_with(aabb, &mut stack, result);
    }

    /// [`Trimesh::get_triangles_in_aabb`] with a caller-owned traversal stack
    pub fn get_triangles_in_aabb_with(
        &self,
        aabb: &AABB,
        stack: &mut QueryStack,
        result: &mut Vec<u32>,
    ) {
        let a = aabb.min.component_div(&self.scale);
        let b = aabb.max.component_div(&self.scale);
        let unscaled = AABB::new(a.inf(&b), a.sup(&b));
        self.tree.aabb_query_with(&unscaled, stack, result);
    }

    /// Vertex `i` with the mesh scale applied
    pub fn get_vertex(&self, i: usize) -> Vec3 {
        self.get_unscaled_vertex(i).component_mul(&self.scale)
    }

    /// Vertex `i` as stored
    pub fn get_unscaled_vertex(&self, i: usize) -> Vec3 {
        let v = &self.vertices[i * 3..i * 3 + 3];
        Vec3::new(v[0], v[1], v[2])
    }

    /// Vertex `i` scaled and placed in the world by `frame`
    pub fn get_world_vertex(&self, i: usize, frame: &Transform) -> Vec3 {
        frame.point_to_world(&self.get_vertex(i))
    }

    /// Cached face normal of triangle `i`
    pub fn get_normal(&self, i: usize) -> Vec3 {
        let n = &self.normals[i * 3..i * 3 + 3];
        Vec3::new(n[0], n[1], n[2])
    }

    /// The three scaled vertices of triangle `i`, in index order
    pub fn triangle_vertices(&self, i: usize) -> [Vec3; 3] {
        let t = &self.indices[i * 3..i * 3 + 3];
        [
            self.get_vertex(t[0] as usize),
            self.get_vertex(t[1] as usize),
            self.get_vertex(t[2] as usize),
        ]
    }

    fn unscaled_triangle_vertices(&self, i: usize) -> [Vec3; 3] {
        let t = &self.indices[i * 3..i * 3 + 3];
        [
            self.get_unscaled_vertex(t[0] as usize),
            self.get_unscaled_vertex(t[1] as usize),
            self.get_unscaled_vertex(t[2] as usize),
        ]
    }

    /// Radius of the origin-centered sphere enclosing every scaled vertex
    pub fn bounding_sphere_radius(&self) -> f32 {
        (0..self.vertex_count())
            .map(|i| self.get_vertex(i).magnitude_squared())
            .fold(0.0_f32, f32::max)
            .sqrt()
    }

    /// Tight world bounds, transforming every vertex through `frame`
    pub fn calculate_world_aabb(&self, frame: &Transform) -> AABB {
        let mut aabb = AABB::default();
        let mut vertices = (0..self.vertex_count()).map(|i| self.get_world_vertex(i, frame));
        if let Some(first) = vertices.next() {
            aabb.set(first, first);
            for v in vertices {
                aabb.min = aabb.min.inf(&v);
                aabb.max = aabb.max.sup(&v);
            }
        }
        aabb
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flat unscaled vertex buffer
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    /// Flat triangle index buffer
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Flat per-triangle normal buffer
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    /// Componentwise scale
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Local bounds in scaled units
    pub fn aabb(&self) -> &AABB {
        &self.aabb
    }

    /// Octree over unscaled triangle bounds
    pub fn tree(&self) -> &Octree<u32> {
        &self.tree
    }
}

fn validate_buffers(vertices: &[f32], indices: &[u32]) -> Result<(), MeshError> {
    if vertices.len() % 3 != 0 {
        return Err(MeshError::VertexCountNotTriples(vertices.len()));
    }
    if indices.len() % 3 != 0 {
        return Err(MeshError::IndexCountNotTriangles(indices.len()));
    }

    let vertex_count = vertices.len() / 3;
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(MeshError::IndexOutOfRange { index, vertex_count });
    }
    Ok(())
}
