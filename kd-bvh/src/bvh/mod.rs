// src/bvh/mod.rs
pub mod order;
pub mod pack;
pub mod partition;

use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::primitives::{AABB, Triangle};
use crate::vertex_buffer::VertexBuffer;
use glam::Vec3;
use log::debug;

pub use pack::{NO_INDEX, PackedNode, PackedRecord, PackedTree};

/// Stable handle into the hierarchy arena. Once a node is pushed its
/// handle never changes for the rest of the build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Leaf or internal node; both share this shape until packing.
#[derive(Clone, Copy, Debug)]
pub struct HierarchyNode {
    pub aabb: AABB,
    pub center: Vec3,
    /// Set for leaves only.
    pub primitive: Option<u32>,
    /// `(left, right)`, set for internal nodes only. Left is visited first.
    pub children: Option<(NodeId, NodeId)>,
    pub parent: Option<NodeId>,

    // linearization
    pub visit_order: Option<u32>,
    pub next: Option<NodeId>,

    pub primitive_area: f32,
    pub left_area: f32,
    pub right_area: f32,
}

impl HierarchyNode {
    pub fn leaf(primitive: u32, triangle: &Triangle) -> Self {
        let aabb = triangle.aabb();
        Self {
            aabb,
            center: aabb.center(),
            primitive: Some(primitive),
            children: None,
            parent: None,
            visit_order: None,
            next: None,
            primitive_area: triangle.area(),
            left_area: 0.0,
            right_area: 0.0,
        }
    }

    pub fn internal(aabb: AABB, left: NodeId, right: NodeId) -> Self {
        Self {
            aabb,
            center: aabb.center(),
            primitive: None,
            children: Some((left, right)),
            parent: None,
            visit_order: None,
            next: None,
            primitive_area: 0.0,
            left_area: 0.0,
            right_area: 0.0,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Append-only arena of hierarchy nodes plus the triangles they wrap.
///
/// Leaves occupy `0..primitive_count` (in partition order, not input
/// order), internal nodes follow in creation order.
#[derive(Clone, Debug)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
    triangles: Vec<Triangle>,
    root: NodeId,
    depth: usize,
}

impl Hierarchy {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &HierarchyNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn primitive_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub fn internal_count(&self) -> usize {
        self.nodes.len() - self.leaf_count()
    }

    /// Longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Handles sorted by visit order. Empty before linearization.
    pub fn ordered(&self) -> Vec<NodeId> {
        let mut ordered = vec![None; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            match node.visit_order {
                Some(order) => ordered[order as usize] = Some(NodeId(i as u32)),
                None => return Vec::new(),
            }
        }
        ordered.into_iter().flatten().collect()
    }

    pub fn pack(&self) -> PackedTree {
        pack::pack(self)
    }

    /// Walks the arena and checks the structural invariants the packer
    /// and downstream traversal rely on.
    pub fn validate(&self) -> Result<(), BuildError> {
        let fail = |msg: String| -> Result<(), BuildError> { Err(BuildError::InvariantViolation(msg)) };
        let n = self.triangles.len();

        if self.leaf_count() != n || self.internal_count() + 1 != n {
            return fail(format!(
                "{} leaves and {} internal nodes for {} primitives",
                self.leaf_count(),
                self.internal_count(),
                n
            ));
        }

        if self.node(self.root).parent.is_some() {
            return fail("root has a parent".to_string());
        }

        let mut seen_primitive = vec![false; n];
        let mut seen_order = vec![false; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            let id = NodeId(i as u32);

            match node.visit_order {
                Some(order) if (order as usize) < seen_order.len() && !seen_order[order as usize] => {
                    seen_order[order as usize] = true;
                }
                _ => return fail(format!("node {i} has no unique visit order")),
            }

            if let Some((left, right)) = node.children {
                let l = self.node(left);
                let r = self.node(right);
                if l.parent != Some(id) || r.parent != Some(id) {
                    return fail(format!("children of node {i} do not point back to it"));
                }
                if node.aabb != l.aabb.union(&r.aabb) {
                    return fail(format!("node {i} box is not the union of its children"));
                }
                if node.primitive.is_some() {
                    return fail(format!("internal node {i} carries a primitive"));
                }
            } else {
                match node.primitive {
                    Some(p) if (p as usize) < n && !seen_primitive[p as usize] => {
                        seen_primitive[p as usize] = true;
                    }
                    _ => return fail(format!("leaf {i} has no unique primitive")),
                }
            }

            if let Some(parent) = node.parent {
                let listed = self
                    .node(parent)
                    .children
                    .is_some_and(|(l, r)| l == id || r == id);
                if !listed {
                    return fail(format!("parent of node {i} does not list it"));
                }
            } else if id != self.root {
                return fail(format!("node {i} is detached from the root"));
            }
        }

        // Skip pointers always move forward in visit order, so every chain
        // terminates.
        for (i, node) in self.nodes.iter().enumerate() {
            if let (Some(next), Some(order)) = (node.next, node.visit_order) {
                let target = self.node(next).visit_order.unwrap_or(0);
                if target <= order {
                    return fail(format!("skip pointer of node {i} does not move forward"));
                }
            }
        }

        Ok(())
    }
}

/// Entry point: turns a triangle soup into a packed stackless hierarchy.
#[derive(Clone, Copy, Debug, Default)]
pub struct KdTree {
    config: BuildConfig,
}

impl KdTree {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, vertices: &VertexBuffer, indices: &[u32]) -> Result<PackedTree, BuildError> {
        let packed = match self.build_hierarchy(vertices, indices)? {
            Some(hierarchy) => hierarchy.pack(),
            None => PackedTree::default(),
        };
        debug!(
            "packed {} records ({} nodes, {} primitives)",
            packed.len(),
            packed.node_count(),
            packed.primitive_count()
        );
        Ok(packed)
    }

    /// Builds and linearizes the hierarchy without packing it. `None` for
    /// an empty index buffer.
    pub fn build_hierarchy(
        &self,
        vertices: &VertexBuffer,
        indices: &[u32],
    ) -> Result<Option<Hierarchy>, BuildError> {
        let triangles = gather_triangles(vertices, indices)?;
        if triangles.is_empty() {
            return Ok(None);
        }

        let n = triangles.len();
        check_tag_range(n)?;

        let mut nodes: Vec<HierarchyNode> = triangles
            .iter()
            .enumerate()
            .map(|(i, tri)| HierarchyNode::leaf(i as u32, tri))
            .collect();
        nodes.reserve(n - 1);

        let built = partition::build(&mut nodes, self.config.max_depth)?;
        order::linearize(&mut nodes, built.root);

        let hierarchy = Hierarchy {
            nodes,
            triangles,
            root: built.root,
            depth: built.depth,
        };
        debug!(
            "built hierarchy: {} primitives, {} nodes, depth {}",
            n,
            hierarchy.len(),
            hierarchy.depth()
        );

        if self.config.validate {
            hierarchy.validate()?;
        }
        Ok(Some(hierarchy))
    }
}

/// The largest leaf tag, `(n - 1) + 2 * (2n - 1)`, must stay below the
/// wire sentinel.
fn check_tag_range(n: usize) -> Result<(), BuildError> {
    if n == 0 {
        return Ok(());
    }
    let node_count = 2 * n as u64 - 1;
    let largest_tag = (n - 1) as u64 + 2 * node_count;
    if largest_tag >= NO_INDEX as u64 {
        return Err(BuildError::TooManyPrimitives { count: n });
    }
    Ok(())
}

fn gather_triangles(vertices: &VertexBuffer, indices: &[u32]) -> Result<Vec<Triangle>, BuildError> {
    if indices.len() % 3 != 0 {
        return Err(BuildError::IndexCountNotMultipleOfThree {
            count: indices.len(),
        });
    }

    let mut triangles = Vec::with_capacity(indices.len() / 3);
    for (triangle, tri) in indices.chunks_exact(3).enumerate() {
        let mut v = [Vec3::ZERO; 3];
        for (slot, &index) in v.iter_mut().zip(tri) {
            let p = vertices
                .position(index)
                .ok_or(BuildError::VertexOutOfRange {
                    triangle,
                    index,
                    vertex_count: vertices.len(),
                })?;
            if !p.is_finite() {
                return Err(BuildError::NonFiniteVertex { triangle, index });
            }
            *slot = p;
        }
        triangles.push(Triangle::new(v[0], v[1], v[2]));
    }
    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use glam::vec3;

    fn two_triangles() -> Geometry {
        let mut geom = Geometry::new();
        geom.add_triangle(vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0));
        geom.add_triangle(vec3(5.0, 0.0, 0.0), vec3(6.0, 0.0, 0.0), vec3(5.0, 1.0, 0.0));
        geom
    }

    #[test]
    fn leaf_tags_stop_short_of_the_sentinel() {
        // largest tag 4_294_967_292
        assert_eq!(check_tag_range(858_993_459), Ok(()));
        assert_eq!(
            check_tag_range(858_993_460),
            Err(BuildError::TooManyPrimitives { count: 858_993_460 })
        );
        assert_eq!(check_tag_range(1), Ok(()));
    }

    #[test]
    fn rejects_ragged_index_buffer() {
        let geom = two_triangles();
        let err = KdTree::default()
            .build(&geom.vertex_buffer(), &geom.indices[..4])
            .unwrap_err();
        assert_eq!(err, BuildError::IndexCountNotMultipleOfThree { count: 4 });
    }

    #[test]
    fn rejects_out_of_range_vertex() {
        let geom = two_triangles();
        let err = KdTree::default()
            .build(&geom.vertex_buffer(), &[0, 1, 42])
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::VertexOutOfRange {
                triangle: 0,
                index: 42,
                vertex_count: 6
            }
        );
    }

    #[test]
    fn rejects_nan_positions() {
        let data = [0.0, 0.0, 0.0, 0.0, f32::NAN, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let vb = VertexBuffer::from_floats(&data, 4).unwrap();
        let err = KdTree::default().build(&vb, &[0, 1, 2]).unwrap_err();
        assert_eq!(err, BuildError::NonFiniteVertex { triangle: 0, index: 1 });
    }

    #[test]
    fn empty_input_yields_nothing() {
        let geom = Geometry::new();
        let tree = KdTree::default();
        assert!(tree.build_hierarchy(&geom.vertex_buffer(), &[]).unwrap().is_none());
        assert!(tree.build(&geom.vertex_buffer(), &[]).unwrap().is_empty());
    }

    #[test]
    fn two_triangles_share_one_parent() {
        let geom = two_triangles();
        let hierarchy = KdTree::default()
            .build_hierarchy(&geom.vertex_buffer(), &geom.indices)
            .unwrap()
            .unwrap();

        assert_eq!(hierarchy.len(), 3);
        assert_eq!(hierarchy.root(), NodeId(2));
        assert_eq!(hierarchy.depth(), 1);

        let root = hierarchy.node(hierarchy.root());
        let (left, right) = root.children.unwrap();
        assert_eq!(root.aabb, hierarchy.node(left).aabb.union(&hierarchy.node(right).aabb));
        assert_eq!(root.aabb.min, Vec3::ZERO);
        assert_eq!(root.aabb.max, vec3(6.0, 1.0, 0.0));
        assert!(hierarchy.validate().is_ok());
    }

    #[test]
    fn validate_catches_broken_union() {
        let geom = two_triangles();
        let mut hierarchy = KdTree::default()
            .build_hierarchy(&geom.vertex_buffer(), &geom.indices)
            .unwrap()
            .unwrap();
        let root = hierarchy.root();
        hierarchy.nodes[root.index()].aabb.max.x += 1.0;
        assert!(matches!(
            hierarchy.validate(),
            Err(BuildError::InvariantViolation(_))
        ));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut geom = Geometry::new();
        geom.add_box(Vec3::ONE);
        let tree = KdTree::new(BuildConfig::default().with_max_depth(1));
        let err = tree.build(&geom.vertex_buffer(), &geom.indices).unwrap_err();
        assert_eq!(err, BuildError::DepthLimitExceeded { limit: 1 });
    }

    #[test]
    fn ordered_lists_every_node_once() {
        let mut geom = Geometry::new();
        geom.add_box(Vec3::ONE);
        let hierarchy = KdTree::default()
            .build_hierarchy(&geom.vertex_buffer(), &geom.indices)
            .unwrap()
            .unwrap();
        let ordered = hierarchy.ordered();
        assert_eq!(ordered.len(), hierarchy.len());
        assert_eq!(ordered[0], hierarchy.root());
        for (visit, id) in ordered.iter().enumerate() {
            assert_eq!(hierarchy.node(*id).visit_order, Some(visit as u32));
        }
    }
}
